use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client as HttpClient, StatusCode};

use super::auth::{self, AuthenticatedSession, ServiceAccountKey, READONLY_SCOPE};
use super::error::{AuthError, InspectionError};
use super::types::{api_error_message, CoverageState, InspectRequest, InspectResponse};
use crate::audit::site::SiteRoot;

const DEFAULT_BASE_URL: &str = "https://searchconsole.googleapis.com";
const DEFAULT_LANGUAGE: &str = "es";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct IndexClientConfig {
    pub base_url: String,
    pub language_code: String,
    pub timeout: Duration,
}

impl Default for IndexClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            language_code: DEFAULT_LANGUAGE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl IndexClientConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(base) = std::env::var("GSC_API_BASE_URL") {
            cfg.base_url = base;
        }
        if let Ok(timeout) = std::env::var("GSC_TIMEOUT_SECS") {
            if let Ok(parsed) = timeout.parse::<u64>() {
                cfg.timeout = Duration::from_secs(parsed);
            }
        }
        cfg
    }
}

/// Remote index-status lookups. `inspect` reports every failure as an
/// `InspectionError` value so one bad URL cannot abort a batch.
#[async_trait]
pub trait IndexStatusClient: Send + Sync {
    async fn authenticate(&self, credential: &str) -> Result<AuthenticatedSession, AuthError>;

    async fn inspect(
        &self,
        session: &AuthenticatedSession,
        site: &SiteRoot,
        url: &str,
    ) -> Result<CoverageState, InspectionError>;
}

/// Search Console URL Inspection API over HTTPS.
#[derive(Clone)]
pub struct SearchConsoleClient {
    http: HttpClient,
    cfg: IndexClientConfig,
}

impl SearchConsoleClient {
    pub fn new(cfg: IndexClientConfig) -> anyhow::Result<Self> {
        let http = HttpClient::builder().timeout(cfg.timeout).build()?;
        Ok(Self { http, cfg })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/urlInspection/index:inspect", self.cfg.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl IndexStatusClient for SearchConsoleClient {
    async fn authenticate(&self, credential: &str) -> Result<AuthenticatedSession, AuthError> {
        let key = ServiceAccountKey::from_json(credential)?;
        auth::exchange_token(&self.http, &key, READONLY_SCOPE).await
    }

    async fn inspect(
        &self,
        session: &AuthenticatedSession,
        site: &SiteRoot,
        url: &str,
    ) -> Result<CoverageState, InspectionError> {
        if session.is_expired(Utc::now()) {
            return Err(InspectionError::SessionExpired);
        }

        let body = InspectRequest {
            inspection_url: url,
            site_url: site.as_str(),
            language_code: &self.cfg.language_code,
        };
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(session.access_token())
            .json(&body)
            .send()
            .await
            .map_err(InspectionError::from_reqwest)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(InspectionError::from_reqwest)?;

        if !status.is_success() {
            let message = api_error_message(&bytes);
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => InspectionError::Unauthorized { status, message },
                StatusCode::TOO_MANY_REQUESTS => InspectionError::QuotaExceeded(message),
                _ => InspectionError::Api { status, message },
            });
        }

        let parsed: InspectResponse =
            serde_json::from_slice(&bytes).map_err(|e| InspectionError::Decode(e.to_string()))?;
        parsed.coverage_state().ok_or(InspectionError::MissingCoverageState)
    }
}
