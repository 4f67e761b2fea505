use anyhow::Result;
use serde::Serialize;
use std::marker::PhantomData;
use tracing::{info, debug, warn, error, Span};

use crate::audit::types::AuditSummary;
use crate::output::config::OutputConfig;
use crate::output::types::{Envelope, Meta};
use crate::output::Emitter;
use crate::sitemap::types::LoadStats;

pub trait PhaseSpan {
    fn name(&self) -> &'static str;
    fn span(&self) -> Span;
}

pub trait OpMarker {
    const NAME: &'static str;
    type Phase: PhaseSpan;
    fn root_span() -> Span;
}

pub struct LogCtx<O: OpMarker> {
    pub(crate) json: bool,
    pub(crate) _marker: PhantomData<O>,
}

impl<O: OpMarker> LogCtx<O> {
    fn op_name(&self) -> &'static str { O::NAME }

    pub fn root_span(&self) -> Span { O::root_span() }

    pub fn root_span_kv<'a, T>(&self, fields: T) -> Span
    where
        T: IntoIterator<Item = (&'a str, String)>,
    {
        let span = self.root_span();
        let details = kv_to_string(fields);
        if details.is_empty() {
            info!(op = %self.op_name(), "start");
        } else {
            info!(op = %self.op_name(), details = %details, "start");
        }
        span
    }

    pub fn span(&self, ph: &O::Phase) -> Span { ph.span() }

    pub fn span_kv<'a, T>(&self, ph: &O::Phase, fields: T) -> Span
    where
        T: IntoIterator<Item = (&'a str, String)>,
    {
        let span = self.span(ph);
        let details = kv_to_string(fields);
        if details.is_empty() {
            debug!(op = %self.op_name(), phase = ph.name(), "span_start");
        } else {
            debug!(op = %self.op_name(), phase = ph.name(), details = %details, "span_start");
        }
        span
    }

    pub fn info(&self, msg: impl AsRef<str>) { if self.json { info!(op = %self.op_name(), "{}", msg.as_ref()); } else { info!("{}", msg.as_ref()); } }
    pub fn debug(&self, msg: impl AsRef<str>) { if self.json { debug!(op = %self.op_name(), "{}", msg.as_ref()); } else { debug!("{}", msg.as_ref()); } }
    pub fn warn(&self, msg: impl AsRef<str>) { if self.json { warn!(op = %self.op_name(), "{}", msg.as_ref()); } else { warn!("{}", msg.as_ref()); } }
    pub fn error(&self, msg: impl AsRef<str>) { if self.json { error!(op = %self.op_name(), "{}", msg.as_ref()); } else { error!("{}", msg.as_ref()); } }

    pub fn info_kv<'a, D>(&self, msg: &str, kv: D)
    where
        D: IntoIterator<Item = (&'a str, String)>,
    {
        if self.json { let details = kv_to_string(kv); info!(op = %self.op_name(), details = %details, "{}", msg); }
        else { info!("{}", msg); }
    }

    pub fn warn_kv<'a, D>(&self, msg: &str, kv: D)
    where
        D: IntoIterator<Item = (&'a str, String)>,
    {
        if self.json { let details = kv_to_string(kv); warn!(op = %self.op_name(), details = %details, "{}", msg); }
        else { warn!("{} {}", msg, kv_to_string(kv)); }
    }

    /// Sitemap parse counters; skipped entries are warnings, never failures.
    pub fn load_stats(&self, stats: &LoadStats) {
        if self.json {
            info!(op = %self.op_name(), entries = stats.entries, bad_loc = stats.bad_loc, missing_lastmod = stats.missing_lastmod, bad_lastmod = stats.bad_lastmod, "sitemap_loaded");
        } else {
            info!("🗺️  Sitemap loaded — entries={} skipped={}", stats.entries, stats.skipped());
        }
        if stats.bad_lastmod > 0 {
            warn!("⚠️  {} entr(ies) with unparseable lastmod were excluded", stats.bad_lastmod);
        }
        if stats.missing_lastmod > 0 {
            warn!("⚠️  {} entr(ies) without lastmod were excluded", stats.missing_lastmod);
        }
        if stats.bad_loc > 0 {
            warn!("⚠️  {} entr(ies) with a missing or invalid <loc> were excluded", stats.bad_loc);
        }
    }

    pub fn plan<T: Serialize>(&self, plan: &T) -> Result<()> {
        let env = Envelope::plan(self.op_name(), plan, None)?;
        Emitter::from_env(OutputConfig::from_env()).emit(&env)?;
        Ok(())
    }

    pub fn result<T: Serialize>(&self, result: &T, meta: Option<Meta>) -> Result<()> {
        let env = Envelope::result(self.op_name(), result, meta)?;
        Emitter::from_env(OutputConfig::from_env()).emit(&env)?;
        Ok(())
    }
}

// Audit-only helpers
impl LogCtx<crate::telemetry::ops::audit::Audit> {
    pub fn progress(&self, completed: usize, total: usize, url: &str, status: &str) {
        if self.json { info!(op = %self.op_name(), completed, total, url, status, "inspected"); }
        else { info!("🔎 [{}/{}] {} → {}", completed, total, url, status); }
    }

    pub fn summary(&self, s: &AuditSummary) {
        if self.json {
            info!(op = %self.op_name(), candidates = s.candidates, inspected = s.inspected, indexed = s.indexed, problems = s.problems, errors = s.errors, cancelled = s.cancelled, "audit_summary");
        } else {
            info!("📊 Audit totals — candidates={} inspected={} indexed={} problems={} errors={}{}",
                s.candidates, s.inspected, s.indexed, s.problems, s.errors,
                if s.cancelled { " (cancelled)" } else { "" });
        }
    }
}

fn kv_to_string<'a, T>(kv: T) -> String
where
    T: IntoIterator<Item = (&'a str, String)>,
{
    let mut parts: Vec<String> = Vec::new();
    for (k, v) in kv { parts.push(format!("{}={}", k, v)); }
    parts.join(" ")
}
