use chrono::NaiveDateTime;
use serde::Serialize;

/// One `<url>` record that survived parsing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SitemapEntry {
    pub url: String,
    /// Naive UTC; any offset in the source has already been applied.
    pub last_modified: NaiveDateTime,
}

/// Counters for `<url>` records that were dropped while parsing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    pub entries: usize,
    pub bad_loc: usize,
    pub missing_lastmod: usize,
    pub bad_lastmod: usize,
}

impl LoadStats {
    pub fn skipped(&self) -> usize { self.bad_loc + self.missing_lastmod + self.bad_lastmod }
}

#[derive(Clone, Debug, Default)]
pub struct LoadedSitemap {
    pub entries: Vec<SitemapEntry>,
    pub stats: LoadStats,
}
