use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;

use super::auth::AuthenticatedSession;
use super::client::IndexStatusClient;
use super::error::{AuthError, InspectionError};
use super::types::CoverageState;
use crate::audit::site::SiteRoot;

/// Scripted stand-in for the Search Console API. Unscripted URLs report
/// `INDEXED`.
#[derive(Debug, Default)]
pub struct MockIndexClient {
    replies: Mutex<HashMap<String, Result<CoverageState, InspectionError>>>,
    delays: Mutex<HashMap<String, Duration>>,
    reject_auth: Mutex<Option<String>>,
    auth_calls: Mutex<usize>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockIndexClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, url: &str, reply: Result<CoverageState, InspectionError>) {
        self.replies.lock().unwrap().insert(url.to_string(), reply);
    }

    pub fn state(&self, url: &str, state: &str) {
        self.reply(url, Ok(CoverageState::new(state)));
    }

    pub fn delay(&self, url: &str, by: Duration) {
        self.delays.lock().unwrap().insert(url.to_string(), by);
    }

    pub fn reject_auth(&self, message: &str) {
        *self.reject_auth.lock().unwrap() = Some(message.to_string());
    }

    pub fn auth_calls(&self) -> usize {
        *self.auth_calls.lock().unwrap()
    }

    /// `(site, url)` pairs in the order inspections started.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn inspected_urls(&self) -> Vec<String> {
        self.calls().into_iter().map(|(_, url)| url).collect()
    }
}

#[async_trait]
impl IndexStatusClient for MockIndexClient {
    async fn authenticate(&self, credential: &str) -> Result<AuthenticatedSession, AuthError> {
        *self.auth_calls.lock().unwrap() += 1;
        if credential.trim().is_empty() {
            return Err(AuthError::MalformedCredential("empty".into()));
        }
        if let Some(message) = self.reject_auth.lock().unwrap().clone() {
            return Err(AuthError::Rejected { status: StatusCode::UNAUTHORIZED, message });
        }
        Ok(AuthenticatedSession::new("mock-token", Utc::now() + chrono::Duration::hours(1)))
    }

    async fn inspect(
        &self,
        _session: &AuthenticatedSession,
        site: &SiteRoot,
        url: &str,
    ) -> Result<CoverageState, InspectionError> {
        self.calls.lock().unwrap().push((site.as_str().to_string(), url.to_string()));
        let delay = self.delays.lock().unwrap().get(url).copied();
        if let Some(by) = delay {
            tokio::time::sleep(by).await;
        }
        self.replies
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Ok(CoverageState::new(CoverageState::INDEXED)))
    }
}
