use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Audit;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Validate, Load, Filter, Plan, Authenticate, Inspect, Report }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Validate => "validate",
        Phase::Load => "load",
        Phase::Filter => "filter",
        Phase::Plan => "plan",
        Phase::Authenticate => "authenticate",
        Phase::Inspect => "inspect",
        Phase::Report => "report",
    }}
    fn span(&self) -> Span { match self {
        Phase::Validate => info_span!("validate"),
        Phase::Load => info_span!("load"),
        Phase::Filter => info_span!("filter"),
        Phase::Plan => info_span!("plan"),
        Phase::Authenticate => info_span!("authenticate"),
        Phase::Inspect => info_span!("inspect"),
        Phase::Report => info_span!("report"),
    }}
}

impl OpMarker for Audit {
    const NAME: &'static str = "audit";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("audit") }
}
