use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{error, info};

use crate::config::Config;
use crate::digest;
use crate::http::Fetcher;
use crate::listing;
use crate::notify::{self, Notifier};
use crate::probe;
use crate::sync::{self, CodeListing, Store};

/// Outcome of one digest cycle, as returned to whoever triggered it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub success: bool,
    pub companies_found: usize,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub degraded_codes: Vec<String>,
    pub emails_sent: usize,
    pub emails_failed: usize,
}

impl CycleReport {
    fn failed(message: String) -> Self {
        CycleReport {
            success: false,
            companies_found: 0,
            timestamp: Utc::now(),
            message,
            degraded_codes: Vec::new(),
            emails_sent: 0,
            emails_failed: 0,
        }
    }
}

/// Everything one cycle needs, built once by the caller and passed in.
pub struct Pipeline {
    pub cfg: Config,
    pub fetcher: Arc<dyn Fetcher>,
    pub store: Arc<dyn Store>,
    pub notifier: Arc<dyn Notifier>,
}

impl Pipeline {
    /// Probe, fetch, dedup, persist and notify. Errors end up in the report.
    ///
    /// Two cycles over the same store must not overlap, or a company can be
    /// announced twice; callers serialise runs.
    pub async fn run_cycle(&self, progress: bool) -> CycleReport {
        info!("Starting company digest cycle");
        match self.try_cycle(progress).await {
            Ok(report) => {
                info!("Digest cycle completed: {}", report.message);
                report
            }
            Err(e) => {
                error!("Digest cycle failed: {:#}", e);
                CycleReport::failed(format!("{:#}", e))
            }
        }
    }

    async fn try_cycle(&self, progress: bool) -> Result<CycleReport> {
        // Snapshot everything read from the store up front; the upsert is the
        // last store call of the cycle.
        let codes = self.store.category_codes()?;
        let known = self.store.known_ids()?;
        let recipients = self.store.recipients()?;
        info!(
            "{} category code(s) to scrape, {} companies already saved",
            codes.len(),
            known.len()
        );

        let pb = if progress {
            let pb = ProgressBar::new(codes.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
                    .progress_chars("=> "),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let cfg = &self.cfg;
        let fetcher = self.fetcher.as_ref();
        let bar = &pb;
        let listings: Vec<CodeListing> = stream::iter(codes)
            .map(move |code| async move {
                bar.set_message(code.code.clone());
                let pages = probe::max_page(fetcher, cfg, &code.code).await;
                let listing = listing::fetch_listing(fetcher, cfg, &code.code, pages, cfg.enrich).await;
                bar.inc(1);
                CodeListing { code, listing }
            })
            .buffered(cfg.code_concurrency.max(1))
            .collect()
            .await;
        pb.finish_and_clear();

        let selection = sync::sync(self.store.as_ref(), &listings, &known, cfg.include_degraded)?;
        let found = selection.new_records.len();
        info!("Total new companies found: {}", found);

        let message = digest::aggregate(&selection.new_records).render(Local::now());
        let delivery = notify::deliver(self.notifier.as_ref(), &recipients, &message).await;

        let mut summary = format!("Digest sent with {} new companies", found);
        if delivery.failed > 0 {
            summary.push_str(&format!(" ({} delivery failure(s))", delivery.failed));
        }
        if !selection.skipped_codes.is_empty() {
            summary.push_str(&format!(
                "; sample data ignored for code(s) {}",
                selection.skipped_codes.join(", ")
            ));
        }

        Ok(CycleReport {
            success: true,
            companies_found: found,
            timestamp: Utc::now(),
            message: summary,
            degraded_codes: selection.skipped_codes,
            emails_sent: delivery.sent,
            emails_failed: delivery.failed,
        })
    }
}

/// Shared-secret check for externally triggered cycles. No secret, no check.
pub fn authorize(authorization: Option<&str>, secret: Option<&str>) -> bool {
    match secret {
        None => true,
        Some(s) => authorization == Some(format!("Bearer {}", s).as_str()),
    }
}

// ── Tests ──
