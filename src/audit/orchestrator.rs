use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use futures::{future, stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::config::AuditConfig;
use super::error::AuditError;
use super::progress::{Progress, ProgressFn};
use super::rate_limiter::RateLimiter;
use super::select::{count_stale, select, AuditCandidate};
use super::site::SiteRoot;
use super::types::{AuditOutcome, AuditPlan, AuditReport, AuditState, AuditSummary, InspectionResult};
use crate::gsc::{AuthenticatedSession, IndexStatusClient};
use crate::report::ReportSink;
use crate::sitemap::types::LoadedSitemap;
use crate::sitemap::SitemapLoader;
use crate::telemetry;
use crate::telemetry::ops::audit::Phase as AuditPhase;

/// Drives one audit: load, filter, inspect, report. Each run owns its
/// session, candidates and report; nothing is shared between runs.
pub struct AuditOrchestrator {
    loader: SitemapLoader,
    client: Arc<dyn IndexStatusClient>,
    progress: Option<ProgressFn>,
    cancel: CancellationToken,
    state: AuditState,
}

impl AuditOrchestrator {
    pub fn new(loader: SitemapLoader, client: Arc<dyn IndexStatusClient>) -> Self {
        Self { loader, client, progress: None, cancel: CancellationToken::new(), state: AuditState::Idle }
    }

    /// Called after every inspection with a strictly increasing `completed`.
    pub fn with_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(Progress) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(f));
        self
    }

    /// Cancelling stops new inspections from starting; finished ones are
    /// still reported.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn state(&self) -> AuditState { self.state }

    fn transition(&mut self, next: AuditState) {
        telemetry::audit().debug(format!("state {} → {}", self.state.name(), next.name()));
        self.state = next;
    }

    fn fail(&mut self, err: impl Into<AuditError>) -> AuditError {
        self.transition(AuditState::Failed);
        err.into()
    }

    /// Load and filter only. Makes no inspection calls and needs no credential.
    pub async fn plan(&mut self, cfg: &AuditConfig) -> Result<AuditPlan, AuditError> {
        let log = telemetry::audit();
        self.state = AuditState::Idle;
        if let Err(e) = cfg.validate_source() {
            return Err(self.fail(e));
        }
        let site = match resolve_site(cfg) {
            Ok(site) => site,
            Err(e) => return Err(self.fail(e)),
        };
        let loaded = self.load(cfg).await?;

        self.transition(AuditState::Filtering);
        let now = reference_now(cfg);
        let _s = log.span(&AuditPhase::Plan).entered();
        let plan = AuditPlan {
            site,
            load: loaded.stats,
            stale: count_stale(&loaded.entries, cfg.threshold, now),
            candidates: select(&loaded.entries, cfg.threshold, cfg.max_candidates, now),
        };
        self.transition(AuditState::Done);
        Ok(plan)
    }

    pub async fn run(&mut self, cfg: &AuditConfig, sink: &mut dyn ReportSink) -> Result<AuditOutcome, AuditError> {
        let log = telemetry::audit();
        self.state = AuditState::Idle;

        let validated = {
            let _s = log.span(&AuditPhase::Validate).entered();
            cfg.validate().and_then(|_| resolve_site(cfg))
        };
        let site = match validated {
            Ok(site) => site,
            Err(e) => return Err(self.fail(e)),
        };
        let credential = cfg.credential.clone().unwrap_or_default();

        let loaded = self.load(cfg).await?;

        self.transition(AuditState::Filtering);
        let now = reference_now(cfg);
        let (stale, candidates) = {
            let _s = log.span_kv(&AuditPhase::Filter, [("now", now.to_string())]).entered();
            (count_stale(&loaded.entries, cfg.threshold, now), select(&loaded.entries, cfg.threshold, cfg.max_candidates, now))
        };
        log.info(format!(
            "🔍 {} candidate URL(s) older than {} day(s); inspecting against {}",
            candidates.len(), cfg.threshold.days(), site
        ));
        if stale > candidates.len() {
            log.warn(format!("⚠️  {} stale URL(s) left for a later run (cap={})", stale - candidates.len(), cfg.max_candidates));
        }

        let mut summary = AuditSummary {
            entries: loaded.stats.entries,
            skipped: loaded.stats.skipped(),
            stale,
            candidates: candidates.len(),
            ..AuditSummary::default()
        };

        let (rows, cancelled) = if candidates.is_empty() {
            (Vec::new(), false)
        } else {
            let authed = self
                .client
                .authenticate(&credential)
                .instrument(log.span(&AuditPhase::Authenticate))
                .await;
            let session = match authed {
                Ok(session) => session,
                Err(e) => return Err(self.fail(e)),
            };
            log.debug(format!("🔑 session valid until {}", session.expires_at()));
            self.transition(AuditState::Inspecting);
            self.inspect_all(&session, &site, &candidates, cfg)
                .instrument(log.span_kv(&AuditPhase::Inspect, [("concurrency", cfg.concurrency.to_string())]))
                .await
        };

        self.transition(AuditState::Reporting);
        summary.inspected = rows.len();
        summary.errors = rows.iter().filter(|r| r.is_error()).count();
        summary.indexed = rows.iter().filter(|r| r.is_indexed(&cfg.indexed_states)).count();
        summary.cancelled = cancelled;

        let problems: Vec<InspectionResult> = rows.into_iter().filter(|r| !r.is_indexed(&cfg.indexed_states)).collect();
        summary.problems = problems.len();
        let report = AuditReport::new(problems, cancelled);

        let delivered = {
            let _s = log.span(&AuditPhase::Report).entered();
            sink.deliver(&report, &summary)
        };
        if let Err(e) = delivered {
            return Err(self.fail(e));
        }
        log.summary(&summary);
        self.transition(AuditState::Done);
        Ok(AuditOutcome { site, report, summary })
    }

    async fn load(&mut self, cfg: &AuditConfig) -> Result<LoadedSitemap, AuditError> {
        let log = telemetry::audit();
        self.transition(AuditState::Loading);
        let loaded = self
            .loader
            .load(cfg.sitemap_url.trim())
            .instrument(log.span_kv(&AuditPhase::Load, [("sitemap", cfg.sitemap_url.clone())]))
            .await;
        match loaded {
            Ok(loaded) => {
                log.load_stats(&loaded.stats);
                Ok(loaded)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Inspects candidates with at most `cfg.concurrency` calls in flight.
    /// Returns results in candidate order and whether the run was cut short.
    async fn inspect_all(
        &self,
        session: &AuthenticatedSession,
        site: &SiteRoot,
        candidates: &[AuditCandidate],
        cfg: &AuditConfig,
    ) -> (Vec<InspectionResult>, bool) {
        let log = telemetry::audit();
        let total = candidates.len();
        let limiter = RateLimiter::new(cfg.concurrency, cfg.min_delay);
        let limiter = &limiter;
        let client = self.client.as_ref();
        let cancel = &self.cancel;

        // take_while is polled before each new call starts, so a cancel
        // lands between inspections
        let mut in_flight = stream::iter(candidates.iter().enumerate())
            .take_while(|_| future::ready(!cancel.is_cancelled()))
            .map(move |(idx, candidate)| async move {
                let _permit = limiter.acquire().await;
                let coverage = client.inspect(session, site, candidate.url()).await;
                (idx, InspectionResult::new(candidate, coverage))
            })
            .buffer_unordered(cfg.concurrency.max(1));

        let mut finished: Vec<(usize, InspectionResult)> = Vec::with_capacity(total);
        while let Some((idx, result)) = in_flight.next().await {
            if let Err(err) = &result.coverage {
                log.warn_kv("⚠️  inspection failed", [
                    ("url", result.url.clone()),
                    ("error", err.to_string()),
                    ("retryable", err.is_retryable().to_string()),
                ]);
            }
            let completed = finished.len() + 1;
            log.progress(completed, total, &result.url, &result.status());
            finished.push((idx, result));
            if let Some(cb) = &self.progress {
                (**cb)(Progress { completed, total });
            }
        }
        drop(in_flight);

        let cancelled = finished.len() < total;
        if cancelled {
            log.warn(format!("⏹️  cancelled after {} of {} inspection(s); reporting partial results", finished.len(), total));
        }
        finished.sort_by_key(|(idx, _)| *idx);
        (finished.into_iter().map(|(_, r)| r).collect(), cancelled)
    }
}

fn resolve_site(cfg: &AuditConfig) -> Result<SiteRoot, super::error::ValidationError> {
    match cfg.site_url.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(property) => Ok(SiteRoot::explicit(property)),
        None => SiteRoot::from_sitemap_url(&cfg.sitemap_url),
    }
}

fn reference_now(cfg: &AuditConfig) -> NaiveDateTime {
    cfg.as_of.unwrap_or_else(|| Utc::now().naive_utc())
}
