use std::borrow::Cow;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::select::AuditCandidate;
use super::site::SiteRoot;
use crate::gsc::{CoverageState, InspectionError};
use crate::sitemap::types::LoadStats;

/// Outcome of inspecting one candidate.
#[derive(Clone, Debug, PartialEq)]
pub struct InspectionResult {
    pub url: String,
    pub published_at: NaiveDateTime,
    pub coverage: Result<CoverageState, InspectionError>,
}

impl InspectionResult {
    pub fn new(candidate: &AuditCandidate, coverage: Result<CoverageState, InspectionError>) -> Self {
        Self { url: candidate.url().to_string(), published_at: candidate.published_at(), coverage }
    }

    pub fn is_error(&self) -> bool { self.coverage.is_err() }

    pub fn is_indexed(&self, indexed_states: &[String]) -> bool {
        matches!(&self.coverage, Ok(state) if state.is_indexed_by(indexed_states))
    }

    /// Coverage state, or `Error: <message>` for failed inspections.
    pub fn status(&self) -> Cow<'_, str> {
        match &self.coverage {
            Ok(state) => Cow::Borrowed(state.as_str()),
            Err(err) => Cow::Owned(format!("Error: {err}")),
        }
    }
}

/// Serialized view of a report row.
#[derive(Debug, Serialize)]
pub struct ReportRow<'a> {
    pub url: &'a str,
    pub published_at: NaiveDateTime,
    pub status: Cow<'a, str>,
    pub error: bool,
}

/// Non-indexed and failed inspections, in candidate order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AuditReport {
    rows: Vec<InspectionResult>,
    cancelled: bool,
}

impl AuditReport {
    pub(crate) fn new(rows: Vec<InspectionResult>, cancelled: bool) -> Self { Self { rows, cancelled } }

    pub fn rows(&self) -> &[InspectionResult] { &self.rows }

    pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    pub fn len(&self) -> usize { self.rows.len() }

    /// True when the run stopped early; rows cover only what finished.
    pub fn is_partial(&self) -> bool { self.cancelled }

    pub fn view(&self) -> Vec<ReportRow<'_>> {
        self.rows
            .iter()
            .map(|r| ReportRow { url: &r.url, published_at: r.published_at, status: r.status(), error: r.is_error() })
            .collect()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AuditSummary {
    pub entries: usize,
    pub skipped: usize,
    pub stale: usize,
    pub candidates: usize,
    pub inspected: usize,
    pub indexed: usize,
    pub problems: usize,
    pub errors: usize,
    pub cancelled: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditState {
    Idle,
    Loading,
    Filtering,
    Inspecting,
    Reporting,
    Done,
    Failed,
}

impl AuditState {
    pub fn name(&self) -> &'static str {
        match self {
            AuditState::Idle => "idle",
            AuditState::Loading => "loading",
            AuditState::Filtering => "filtering",
            AuditState::Inspecting => "inspecting",
            AuditState::Reporting => "reporting",
            AuditState::Done => "done",
            AuditState::Failed => "failed",
        }
    }
}

#[derive(Debug)]
pub struct AuditOutcome {
    pub site: SiteRoot,
    pub report: AuditReport,
    pub summary: AuditSummary,
}

/// What an `--apply` run would inspect.
#[derive(Debug, Serialize)]
pub struct AuditPlan {
    pub site: SiteRoot,
    pub load: LoadStats,
    pub stale: usize,
    pub candidates: Vec<AuditCandidate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn result(coverage: Result<CoverageState, InspectionError>) -> InspectionResult {
        InspectionResult {
            url: "https://a.com/x".into(),
            published_at: NaiveDateTime::parse_from_str("2024-05-01 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap(),
            coverage,
        }
    }

    #[test]
    fn status_prefixes_errors() {
        let err = result(Err(InspectionError::Api { status: StatusCode::BAD_REQUEST, message: "bad".into() }));
        assert_eq!(err.status(), "Error: api error 400 Bad Request: bad");
        assert!(err.is_error());
        assert!(!err.is_indexed(&["INDEXED".to_string()]));

        let ok = result(Ok(CoverageState::new("INDEXED")));
        assert_eq!(ok.status(), "INDEXED");
        assert!(ok.is_indexed(&["INDEXED".to_string()]));
    }
}
