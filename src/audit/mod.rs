use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::gsc::{CoverageState, IndexClientConfig, IndexStatusClient, SearchConsoleClient};
use crate::output::types::Meta;
use crate::report::{CsvFileSink, CsvHeader, CsvSink, NullSink, ReportSink};
use crate::sitemap::SitemapLoader;
use crate::telemetry;
use crate::util::time::parse_as_of;

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod progress;
mod rate_limiter;
pub mod select;
pub mod site;
pub mod types;

use config::{parse_threshold, AuditConfig, ThresholdDays};
use orchestrator::AuditOrchestrator;
use site::SiteRoot;
use types::{AuditSummary, ReportRow};

/// gscw audit: find sitemap URLs older than the threshold that Google has not indexed
#[derive(Args, Debug)]
pub struct AuditCmd {
    #[arg(long)] pub sitemap: String,
    /// Service-account JSON key; falls back to GSC_CREDENTIALS
    #[arg(long)] pub credentials: Option<PathBuf>,
    #[arg(long, value_parser = parse_threshold, default_value = "3")] pub days: ThresholdDays,
    /// Inspect at most this many stale URLs, in sitemap order
    #[arg(long, default_value_t = config::DEFAULT_MAX_CANDIDATES)] pub max: usize,
    #[arg(long, default_value_t = 1)] pub concurrency: usize,
    /// Minimum spacing between inspection calls, in milliseconds
    #[arg(long, default_value_t = 0)] pub min_delay_ms: u64,
    /// Search Console property (e.g. `sc-domain:example.com`); derived from the sitemap when omitted
    #[arg(long)] pub site_url: Option<String>,
    #[arg(long, default_value = "es")] pub language: String,
    /// Coverage state counted as indexed; repeatable
    #[arg(long = "indexed-state", default_values_t = [CoverageState::INDEXED.to_string()])] pub indexed_states: Vec<String>,
    #[arg(long)] pub as_of: Option<String>,
    /// Write the report as CSV (`-` for stdout)
    #[arg(long)] pub csv: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = CsvHeader::Es)] pub header: CsvHeader,
    #[arg(long, default_value_t = false)] pub apply: bool, // default is plan-only; use --apply to inspect
    #[arg(long, default_value_t = 10)] pub plan_limit: usize, // candidates listed in plan mode
}

#[derive(Serialize)]
struct AuditResult<'a> {
    site: &'a SiteRoot,
    summary: &'a AuditSummary,
    rows: Vec<ReportRow<'a>>,
}

pub async fn run(args: AuditCmd) -> Result<()> {
    let started = Instant::now();
    let log = telemetry::audit();
    let _g = log.root_span_kv([
        ("sitemap", args.sitemap.clone()),
        ("days", args.days.days().to_string()),
        ("max", args.max.to_string()),
        ("concurrency", args.concurrency.to_string()),
        ("apply", args.apply.to_string()),
    ]).entered();

    let cfg = build_config(&args, telemetry::config::json_mode())?;
    let client_cfg = IndexClientConfig { language_code: args.language.clone(), ..IndexClientConfig::from_env() };
    let client: Arc<dyn IndexStatusClient> = Arc::new(SearchConsoleClient::new(client_cfg)?);
    let loader = SitemapLoader::with_default_timeout()?;
    let mut orch = AuditOrchestrator::new(loader, client);

    if !args.apply {
        let plan = match orch.plan(&cfg).await {
            Ok(plan) => plan,
            Err(e) => {
                log.error(format!("❌ {e}"));
                log.warn(e.guidance());
                return Err(e.into());
            }
        };
        log.info(format!(
            "📝 Audit plan — site={} stale={} candidates={} threshold={}d",
            plan.site, plan.stale, plan.candidates.len(), cfg.threshold.days()
        ));
        for c in plan.candidates.iter().take(args.plan_limit) {
            log.info(format!("  {} lastmod={}", c.url(), c.published_at()));
        }
        if plan.candidates.len() > args.plan_limit {
            log.info(format!("  ... ({} more)", plan.candidates.len() - args.plan_limit));
        }
        log.info("   Use --apply to inspect.");
        if telemetry::config::json_mode() { log.plan(&plan)?; }
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            telemetry::audit().warn("⏹️  interrupt received; finishing in-flight inspections");
            watcher.cancel();
        }
    });

    let mut orch = orch
        .with_cancellation(cancel)
        .with_progress(|p| telemetry::audit().debug(format!("progress {:.0}%", p.fraction() * 100.0)));

    let mut sink = open_sink(args.csv.as_deref(), args.header);
    let outcome = match orch.run(&cfg, sink.as_mut()).await {
        Ok(outcome) => outcome,
        Err(e) => {
            log.error(format!("❌ {e}"));
            log.warn(e.guidance());
            return Err(e.into());
        }
    };

    if outcome.report.is_empty() {
        log.info("✅ all candidate URLs are indexed");
    } else {
        log.warn(format!("🚨 {} URL(s) need attention", outcome.report.len()));
        for row in outcome.report.rows() {
            log.warn(format!("  {} published={} status={}", row.url, row.published_at, row.status()));
        }
    }
    if let Some(path) = &args.csv {
        log.info_kv("💾 report written", [("path", path.display().to_string()), ("rows", outcome.report.len().to_string())]);
    }

    if telemetry::config::json_mode() {
        let result = AuditResult { site: &outcome.site, summary: &outcome.summary, rows: outcome.report.view() };
        log.result(&result, Some(Meta::elapsed_since(started)))?;
    }
    Ok(())
}

fn build_config(args: &AuditCmd, json: bool) -> Result<AuditConfig> {
    if json && args.csv.as_deref().is_some_and(is_stdout) {
        anyhow::bail!("--csv - and --json both write to stdout; pass a file path to --csv");
    }
    let credential = match args.credentials.clone().or_else(|| std::env::var_os("GSC_CREDENTIALS").map(PathBuf::from)) {
        Some(path) => Some(
            std::fs::read_to_string(&path).with_context(|| format!("reading credential file {}", path.display()))?,
        ),
        None => None,
    };
    let as_of = match args.as_of.as_deref() {
        Some(raw) => Some(parse_as_of(raw).ok_or_else(|| anyhow::anyhow!("unrecognised --as-of value: {raw}"))?),
        None => None,
    };

    let mut cfg = AuditConfig::new(args.sitemap.clone(), credential);
    cfg.threshold = args.days;
    cfg.max_candidates = args.max;
    cfg.concurrency = args.concurrency;
    cfg.min_delay = Duration::from_millis(args.min_delay_ms);
    cfg.site_url = args.site_url.clone();
    cfg.indexed_states = args.indexed_states.clone();
    cfg.as_of = as_of;
    Ok(cfg)
}

fn is_stdout(path: &Path) -> bool { path.as_os_str() == "-" }

// Nothing is opened here; a file is written only when a finished report is delivered.
fn open_sink(csv: Option<&Path>, header: CsvHeader) -> Box<dyn ReportSink> {
    match csv {
        Some(path) if is_stdout(path) => Box::new(CsvSink::new(io::stdout(), header)),
        Some(path) => Box::new(CsvFileSink::new(path, header)),
        None => Box::new(NullSink),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::gsc::mock::MockIndexClient;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        audit: AuditCmd,
    }

    fn parse(extra: &[&str]) -> AuditCmd {
        let mut argv = vec!["gscw", "--sitemap", "https://example.com/sitemap.xml"];
        argv.extend_from_slice(extra);
        Cli::try_parse_from(argv).unwrap().audit
    }

    #[test]
    fn csv_on_stdout_conflicts_with_json() {
        let args = parse(&["--csv", "-"]);
        let err = build_config(&args, true).unwrap_err();
        assert!(err.to_string().contains("--csv -"));
        assert!(build_config(&args, false).is_ok());
        assert!(build_config(&parse(&["--csv", "report.csv"]), true).is_ok());
    }

    #[test]
    fn flags_map_onto_config() {
        let args = parse(&["--days", "7", "--max", "20", "--concurrency", "3", "--min-delay-ms", "250",
            "--site-url", "sc-domain:example.com", "--indexed-state", "INDEXED", "--indexed-state", "Submitted and indexed"]);
        let cfg = build_config(&args, false).unwrap();
        assert_eq!(cfg.threshold.days(), 7);
        assert_eq!(cfg.max_candidates, 20);
        assert_eq!(cfg.concurrency, 3);
        assert_eq!(cfg.min_delay, Duration::from_millis(250));
        assert_eq!(cfg.site_url.as_deref(), Some("sc-domain:example.com"));
        assert_eq!(cfg.indexed_states, vec!["INDEXED".to_string(), "Submitted and indexed".to_string()]);
    }

    #[tokio::test]
    async fn aborted_run_leaves_previous_report_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(404)).mount(&server).await;

        let path = std::env::temp_dir().join(format!("gscw-previous-{}.csv", uuid::Uuid::new_v4()));
        let previous = "URL,Publicado,Estado GSC\nhttps://example.com/old,2024-05-01 00:00:00,EXCLUDED\n";
        std::fs::write(&path, previous).unwrap();

        let mut sink = open_sink(Some(&path), CsvHeader::Es);
        let mock = Arc::new(MockIndexClient::new());
        let client: Arc<dyn IndexStatusClient> = mock.clone();
        let mut orch = AuditOrchestrator::new(SitemapLoader::with_default_timeout().unwrap(), client);
        let cfg = AuditConfig::new(format!("{}/sitemap.xml", server.uri()), Some("{}".into()));

        let err = orch.run(&cfg, sink.as_mut()).await.unwrap_err();
        assert!(matches!(err, error::AuditError::Fetch(_)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), previous);
        std::fs::remove_file(&path).unwrap();
    }
}
