use chrono::NaiveDateTime;
use serde::Serialize;

use super::config::ThresholdDays;
use crate::sitemap::types::SitemapEntry;

/// A sitemap entry chosen for inspection. Read-only once selected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuditCandidate {
    entry: SitemapEntry,
}

impl AuditCandidate {
    pub fn url(&self) -> &str { &self.entry.url }

    pub fn published_at(&self) -> NaiveDateTime { self.entry.last_modified }
}

fn is_stale(entry: &SitemapEntry, cutoff: NaiveDateTime) -> bool {
    entry.last_modified < cutoff
}

/// Entries last modified strictly before `now - threshold`, in sitemap
/// order, truncated to `max_count`.
pub fn select(
    entries: &[SitemapEntry],
    threshold: ThresholdDays,
    max_count: usize,
    now: NaiveDateTime,
) -> Vec<AuditCandidate> {
    let cutoff = now - threshold.as_duration();
    entries
        .iter()
        .filter(|e| is_stale(e, cutoff))
        .take(max_count)
        .map(|e| AuditCandidate { entry: e.clone() })
        .collect()
}

/// How many entries are stale before the cap is applied.
pub fn count_stale(entries: &[SitemapEntry], threshold: ThresholdDays, now: NaiveDateTime) -> usize {
    let cutoff = now - threshold.as_duration();
    entries.iter().filter(|e| is_stale(e, cutoff)).count()
}
