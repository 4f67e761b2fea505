use serde::{Deserialize, Serialize};

/// The index-coverage classification reported for a URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CoverageState(String);

impl CoverageState {
    pub const INDEXED: &'static str = "INDEXED";

    pub fn new(state: impl Into<String>) -> Self { CoverageState(state.into()) }

    pub fn as_str(&self) -> &str { &self.0 }

    /// True when the state matches one of `indexed` (case-insensitive).
    pub fn is_indexed_by(&self, indexed: &[String]) -> bool {
        indexed.iter().any(|s| s.eq_ignore_ascii_case(&self.0))
    }
}

impl std::fmt::Display for CoverageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(&self.0) }
}

// Wire types for POST /v1/urlInspection/index:inspect
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InspectRequest<'a> {
    pub inspection_url: &'a str,
    pub site_url: &'a str,
    pub language_code: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InspectResponse {
    pub inspection_result: Option<InspectionResultBody>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InspectionResultBody {
    pub index_status_result: Option<IndexStatusResult>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IndexStatusResult {
    pub coverage_state: Option<String>,
}

impl InspectResponse {
    pub(crate) fn coverage_state(self) -> Option<CoverageState> {
        self.inspection_result?
            .index_status_result?
            .coverage_state
            .filter(|s| !s.trim().is_empty())
            .map(CoverageState)
    }
}

// Google APIs wrap failures as {"error": {"code", "message", "status"}}
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

pub(crate) fn api_error_message(bytes: &[u8]) -> String {
    match serde_json::from_slice::<ApiErrorEnvelope>(bytes) {
        Ok(env) => match env.error.status {
            Some(status) if !env.error.message.is_empty() => format!("{status}: {}", env.error.message),
            Some(status) => status,
            None => env.error.message,
        },
        Err(_) => String::from_utf8_lossy(bytes).trim().chars().take(200).collect(),
    }
}
