use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use reqwest::Client;
use serde::Serialize;
use tracing::Instrument;

use crate::audit::config::{parse_threshold, ThresholdDays};
use crate::audit::select::{count_stale, select};
use crate::telemetry;
use crate::telemetry::ops::sitemap::Phase as SitemapPhase;
use crate::util::time::parse_as_of;

pub mod error;
mod fetch;
mod parse;
pub mod types;

use error::FetchError;
use types::{LoadStats, LoadedSitemap};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Downloads one sitemap document and parses it into entries.
#[derive(Clone)]
pub struct SitemapLoader {
    client: Client,
}

impl SitemapLoader {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("gscw/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_default_timeout() -> Result<Self> {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub async fn load(&self, url: &str) -> Result<LoadedSitemap, FetchError> {
        let log = telemetry::sitemap();
        let xml = fetch::fetch_sitemap(&self.client, url)
            .instrument(log.span_kv(&SitemapPhase::Fetch, [("url", url.to_string())]))
            .await?;
        let _s = log.span(&SitemapPhase::Parse).entered();
        parse::parse_urlset(&xml)
    }
}

/// gscw sitemap: show what the loader and staleness filter see
#[derive(Args, Debug)]
pub struct SitemapCmd {
    #[arg(long)] pub sitemap: String,
    #[arg(long, value_parser = parse_threshold, default_value = "3")] pub days: ThresholdDays,
    /// Reference instant: `YYYY-MM-DD`, RFC3339, or `Nd` (N days ago)
    #[arg(long)] pub as_of: Option<String>,
    /// Number of stale entries to list
    #[arg(long, default_value_t = 10)] pub limit: usize,
}

#[derive(Serialize)]
struct SitemapReport<'a> {
    url: &'a str,
    stats: LoadStats,
    threshold_days: u32,
    stale: usize,
    sample: Vec<crate::audit::select::AuditCandidate>,
}

pub async fn run(args: SitemapCmd) -> Result<()> {
    let log = telemetry::sitemap();
    let _g = log.root_span_kv([
        ("sitemap", args.sitemap.clone()),
        ("days", args.days.days().to_string()),
        ("as_of", format!("{:?}", args.as_of)),
    ]).entered();

    let now = match args.as_of.as_deref() {
        Some(raw) => parse_as_of(raw).ok_or_else(|| anyhow::anyhow!("unrecognised --as-of value: {raw}"))?,
        None => Utc::now().naive_utc(),
    };

    let loader = SitemapLoader::with_default_timeout()?;
    let loaded = loader.load(&args.sitemap).await?;
    log.load_stats(&loaded.stats);

    let _f = log.span(&SitemapPhase::Filter).entered();
    let stale = count_stale(&loaded.entries, args.days, now);
    let sample = select(&loaded.entries, args.days, args.limit, now);
    log.info(format!("🕰️  {} of {} entries older than {} day(s)", stale, loaded.entries.len(), args.days.days()));
    for c in &sample {
        log.info(format!("  {} lastmod={}", c.url(), c.published_at()));
    }
    if stale > sample.len() { log.info(format!("  ... ({} more)", stale - sample.len())); }

    if telemetry::config::json_mode() {
        let report = SitemapReport { url: &args.sitemap, stats: loaded.stats, threshold_days: args.days.days(), stale, sample };
        log.result(&report, None)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn loads_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<urlset><url><loc>https://a.com/1</loc><lastmod>2024-01-01</lastmod></url></urlset>",
            ))
            .mount(&server)
            .await;

        let loader = SitemapLoader::with_default_timeout().unwrap();
        let got = loader.load(&format!("{}/sitemap.xml", server.uri())).await.unwrap();
        assert_eq!(got.entries.len(), 1);
        assert_eq!(got.stats.entries, 1);
    }

    #[tokio::test]
    async fn http_errors_are_fetch_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(404)).mount(&server).await;

        let loader = SitemapLoader::with_default_timeout().unwrap();
        match loader.load(&format!("{}/missing.xml", server.uri())).await {
            Err(FetchError::Status { status, .. }) => assert_eq!(status.as_u16(), 404),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
