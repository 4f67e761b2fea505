use reqwest::StatusCode;

/// Failures while turning a service-account key into a bearer token.
/// Any of these aborts the audit before the first inspection.
#[derive(Debug)]
pub enum AuthError {
    MalformedCredential(String),
    Signing(String),
    Http(String),
    Timeout,
    Rejected { status: StatusCode, message: String },
    Decode(String),
}

impl AuthError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() { AuthError::Timeout } else { AuthError::Http(err.to_string()) }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MalformedCredential(msg) => write!(f, "credential is not a service-account key: {msg}"),
            AuthError::Signing(msg) => write!(f, "could not sign token request with the private key: {msg}"),
            AuthError::Http(msg) => write!(f, "token endpoint unreachable: {msg}"),
            AuthError::Timeout => write!(f, "token request timed out"),
            AuthError::Rejected { status, message } => write!(f, "credential rejected ({status}): {message}"),
            AuthError::Decode(msg) => write!(f, "unexpected token response: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Failure of a single URL inspection. Recorded as a report row, never
/// propagated past the audit loop.
#[derive(Debug, Clone, PartialEq)]
pub enum InspectionError {
    Http(String),
    Timeout,
    SessionExpired,
    Unauthorized { status: StatusCode, message: String },
    QuotaExceeded(String),
    Api { status: StatusCode, message: String },
    Decode(String),
    MissingCoverageState,
}

impl InspectionError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() { InspectionError::Timeout } else { InspectionError::Http(err.to_string()) }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            InspectionError::Timeout => true,
            InspectionError::Http(_) => true,
            InspectionError::QuotaExceeded(_) => true,
            InspectionError::Api { status, .. } => status.is_server_error(),
            InspectionError::SessionExpired
            | InspectionError::Unauthorized { .. }
            | InspectionError::Decode(_)
            | InspectionError::MissingCoverageState => false,
        }
    }
}

impl std::fmt::Display for InspectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InspectionError::Http(msg) => write!(f, "http error: {msg}"),
            InspectionError::Timeout => write!(f, "request timed out"),
            InspectionError::SessionExpired => write!(f, "access token expired"),
            InspectionError::Unauthorized { status, message } => write!(f, "not authorized ({status}): {message}"),
            InspectionError::QuotaExceeded(msg) => write!(f, "quota exceeded: {msg}"),
            InspectionError::Api { status, message } => write!(f, "api error {status}: {message}"),
            InspectionError::Decode(msg) => write!(f, "decode error: {msg}"),
            InspectionError::MissingCoverageState => write!(f, "response carried no coverageState"),
        }
    }
}

impl std::error::Error for InspectionError {}
