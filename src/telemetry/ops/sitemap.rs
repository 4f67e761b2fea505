use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Sitemap;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Fetch, Parse, Filter }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self { Phase::Fetch => "fetch", Phase::Parse => "parse", Phase::Filter => "filter" } }
    fn span(&self) -> Span { match self { Phase::Fetch => info_span!("fetch"), Phase::Parse => info_span!("parse"), Phase::Filter => info_span!("filter") } }
}

impl OpMarker for Sitemap {
    const NAME: &'static str = "sitemap";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("sitemap") }
}
