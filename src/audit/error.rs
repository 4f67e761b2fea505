use crate::gsc::AuthError;
use crate::sitemap::error::FetchError;

/// Bad or missing input, caught before any network traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingCredential,
    MissingSitemapUrl,
    InvalidSitemapUrl(String),
    ThresholdOutOfRange(u32),
    ZeroMaxCandidates,
    ConcurrencyOutOfRange(usize),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use super::config::{ThresholdDays, MAX_CONCURRENCY};
        match self {
            ValidationError::MissingCredential => write!(f, "upload the service-account JSON key first (--credentials or GSC_CREDENTIALS)"),
            ValidationError::MissingSitemapUrl => write!(f, "a sitemap URL is required"),
            ValidationError::InvalidSitemapUrl(url) => write!(f, "not an absolute http(s) URL: {url}"),
            ValidationError::ThresholdOutOfRange(days) => {
                write!(f, "threshold must be between {} and {} days, got {days}", ThresholdDays::MIN, ThresholdDays::MAX)
            }
            ValidationError::ZeroMaxCandidates => write!(f, "the candidate cap must be at least 1"),
            ValidationError::ConcurrencyOutOfRange(n) => write!(f, "concurrency must be between 1 and {MAX_CONCURRENCY}, got {n}"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors that abort an audit run. Per-URL failures are not here; they
/// become report rows.
#[derive(Debug)]
pub enum AuditError {
    Validation(ValidationError),
    Fetch(FetchError),
    Auth(AuthError),
    Report(std::io::Error),
}

impl AuditError {
    /// What the user should check next.
    pub fn guidance(&self) -> &'static str {
        match self {
            AuditError::Validation(_) => "Check the command-line arguments and try again.",
            AuditError::Fetch(_) => "Make sure the sitemap URL is correct and publicly reachable.",
            AuditError::Auth(_) => {
                "Make sure the service-account email has access to this Search Console property and the JSON key is current."
            }
            AuditError::Report(_) => "Check that the report destination is writable.",
        }
    }
}

impl std::fmt::Display for AuditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditError::Validation(e) => write!(f, "invalid input: {e}"),
            AuditError::Fetch(e) => write!(f, "sitemap error: {e}"),
            AuditError::Auth(e) => write!(f, "authentication failed: {e}"),
            AuditError::Report(e) => write!(f, "could not write report: {e}"),
        }
    }
}

impl std::error::Error for AuditError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AuditError::Validation(e) => Some(e),
            AuditError::Fetch(e) => Some(e),
            AuditError::Auth(e) => Some(e),
            AuditError::Report(e) => Some(e),
        }
    }
}

impl From<ValidationError> for AuditError {
    fn from(e: ValidationError) -> Self { AuditError::Validation(e) }
}

impl From<FetchError> for AuditError {
    fn from(e: FetchError) -> Self { AuditError::Fetch(e) }
}

impl From<AuthError> for AuditError {
    fn from(e: AuthError) -> Self { AuditError::Auth(e) }
}

impl From<std::io::Error> for AuditError {
    fn from(e: std::io::Error) -> Self { AuditError::Report(e) }
}
