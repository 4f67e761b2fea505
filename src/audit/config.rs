use std::time::Duration;

use chrono::NaiveDateTime;
use serde::Serialize;
use url::Url;

use super::error::ValidationError;
use crate::gsc::CoverageState;

/// Hard cap on inspections per run; protects the per-key API quota.
pub const DEFAULT_MAX_CANDIDATES: usize = 50;
pub const MAX_CONCURRENCY: usize = 5;

/// Minimum age, in whole days, before a URL is expected to be indexed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ThresholdDays(u32);

impl ThresholdDays {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 30;

    pub fn new(days: u32) -> Result<Self, ValidationError> {
        if (Self::MIN..=Self::MAX).contains(&days) {
            Ok(ThresholdDays(days))
        } else {
            Err(ValidationError::ThresholdOutOfRange(days))
        }
    }

    pub fn days(self) -> u32 { self.0 }

    pub fn as_duration(self) -> chrono::Duration { chrono::Duration::days(i64::from(self.0)) }
}

impl Default for ThresholdDays {
    fn default() -> Self { ThresholdDays(3) }
}

/// clap value parser for `--days`
pub fn parse_threshold(s: &str) -> Result<ThresholdDays, String> {
    let days: u32 = s.trim().parse().map_err(|_| format!("`{s}` is not a whole number of days"))?;
    ThresholdDays::new(days).map_err(|e| e.to_string())
}

/// Everything one audit run needs. Owned by the caller and passed in.
#[derive(Clone, Debug)]
pub struct AuditConfig {
    pub sitemap_url: String,
    /// Raw service-account JSON key.
    pub credential: Option<String>,
    pub threshold: ThresholdDays,
    pub max_candidates: usize,
    pub concurrency: usize,
    /// Minimum spacing between the starts of two inspection calls.
    pub min_delay: Duration,
    /// Verified Search Console property; derived from the sitemap when absent.
    pub site_url: Option<String>,
    /// Coverage states that count as indexed.
    pub indexed_states: Vec<String>,
    /// Reference instant for staleness; `None` means now.
    pub as_of: Option<NaiveDateTime>,
}

impl AuditConfig {
    pub fn new(sitemap_url: impl Into<String>, credential: Option<String>) -> Self {
        Self {
            sitemap_url: sitemap_url.into(),
            credential,
            threshold: ThresholdDays::default(),
            max_candidates: DEFAULT_MAX_CANDIDATES,
            concurrency: 1,
            min_delay: Duration::ZERO,
            site_url: None,
            indexed_states: vec![CoverageState::INDEXED.to_string()],
            as_of: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.credential.as_deref().is_none_or(|c| c.trim().is_empty()) {
            return Err(ValidationError::MissingCredential);
        }
        self.validate_source()
    }

    /// Checks that do not need a credential (used by plan mode).
    pub fn validate_source(&self) -> Result<(), ValidationError> {
        let raw = self.sitemap_url.trim();
        if raw.is_empty() {
            return Err(ValidationError::MissingSitemapUrl);
        }
        match Url::parse(raw) {
            Ok(u) if matches!(u.scheme(), "http" | "https") && u.host_str().is_some() => {}
            _ => return Err(ValidationError::InvalidSitemapUrl(raw.to_string())),
        }
        if self.max_candidates == 0 {
            return Err(ValidationError::ZeroMaxCandidates);
        }
        if !(1..=MAX_CONCURRENCY).contains(&self.concurrency) {
            return Err(ValidationError::ConcurrencyOutOfRange(self.concurrency));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> AuditConfig {
        AuditConfig::new("https://example.com/sitemap.xml", Some("{}".into()))
    }

    #[test]
    fn threshold_bounds() {
        assert!(ThresholdDays::new(0).is_err());
        assert_eq!(ThresholdDays::new(1).unwrap().days(), 1);
        assert_eq!(ThresholdDays::new(30).unwrap().days(), 30);
        assert_eq!(ThresholdDays::new(31), Err(ValidationError::ThresholdOutOfRange(31)));
        assert_eq!(ThresholdDays::default().days(), 3);
    }

    #[test]
    fn threshold_parser_reports_reason() {
        assert_eq!(parse_threshold("7").unwrap().days(), 7);
        assert!(parse_threshold("seven").unwrap_err().contains("whole number"));
        assert!(parse_threshold("45").unwrap_err().contains("between 1 and 30"));
    }

    #[test]
    fn valid_config_passes() {
        assert_eq!(cfg().validate(), Ok(()));
    }

    #[test]
    fn missing_credential_fails_first() {
        let mut c = cfg();
        c.credential = Some("   ".into());
        c.sitemap_url = String::new();
        assert_eq!(c.validate(), Err(ValidationError::MissingCredential));
        c.credential = None;
        assert_eq!(c.validate(), Err(ValidationError::MissingCredential));
    }

    #[test]
    fn sitemap_url_must_be_absolute_http() {
        let mut c = cfg();
        c.sitemap_url = " ".into();
        assert_eq!(c.validate(), Err(ValidationError::MissingSitemapUrl));
        c.sitemap_url = "ftp://example.com/sitemap.xml".into();
        assert!(matches!(c.validate(), Err(ValidationError::InvalidSitemapUrl(_))));
        c.sitemap_url = "/sitemap.xml".into();
        assert!(matches!(c.validate(), Err(ValidationError::InvalidSitemapUrl(_))));
    }

    #[test]
    fn cap_and_concurrency_bounds() {
        let mut c = cfg();
        c.max_candidates = 0;
        assert_eq!(c.validate(), Err(ValidationError::ZeroMaxCandidates));
        c.max_candidates = 10;
        c.concurrency = 6;
        assert_eq!(c.validate(), Err(ValidationError::ConcurrencyOutOfRange(6)));
        c.concurrency = 0;
        assert_eq!(c.validate(), Err(ValidationError::ConcurrencyOutOfRange(0)));
    }
}
