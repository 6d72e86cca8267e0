use futures::future::join_all;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::Config;
use crate::enrich;
use crate::error::FetchError;
use crate::fallback;
use crate::http::Fetcher;
use crate::model::{Listing, PageReport, PageSource, ParseOutcome};
use crate::parser::{self, Site};

/// Fetch pages `1..=page_count` of the listing for one category code.
pub async fn fetch_listing(
    fetcher: &dyn Fetcher,
    cfg: &Config,
    code: &str,
    page_count: u32,
    enrich: bool,
) -> Listing {
    let pages: Vec<u32> = (1..=page_count.clamp(1, cfg.page_limit())).collect();
    fetch_pages(fetcher, cfg, code, &pages, enrich).await
}

/// Fetch the given listing pages concurrently and concatenate them in page order.
///
/// A page that cannot be fetched is replaced by its slice of the sample dataset.
/// When no page yields a single live record, the whole result is the sample
/// dataset for the requested pages. Either case sets `degraded`, and every
/// substituted record carries `sample`.
pub async fn fetch_pages(
    fetcher: &dyn Fetcher,
    cfg: &Config,
    code: &str,
    pages: &[u32],
    enrich: bool,
) -> Listing {
    let site = Site {
        origin: cfg.origin.clone(),
        region: cfg.region.clone(),
    };
    let timeout = cfg.listing_timeout();

    info!("Fetching {} page(s) for code {}", pages.len(), code);
    let responses = join_all(pages.iter().map(|&page| {
        let url = cfg.listing_url(code, page);
        async move { (page, fetcher.get(&url, timeout).await) }
    }))
    .await;

    let parsed: Vec<(u32, Result<ParseOutcome, FetchError>)> = responses
        .into_par_iter()
        .map(|(page, res)| (page, res.map(|body| parser::parse_listing(&body, page, &site))))
        .collect();

    let mut records = Vec::new();
    let mut reports = Vec::with_capacity(parsed.len());
    let mut live = 0usize;
    let mut degraded = false;

    for (page, result) in parsed {
        match result {
            Ok(outcome) => {
                live += outcome.records.len();
                reports.push(PageReport {
                    page,
                    source: PageSource::Live(outcome.source_format),
                    records: outcome.records.len(),
                });
                records.extend(outcome.records);
            }
            Err(e) => {
                if e.is_timeout() {
                    warn!("Page {} for code {} timed out, using sample data", page, code);
                } else {
                    warn!("Page {} for code {} failed ({}), using sample data", page, code, e);
                }
                let sample = fallback::sample_page(page);
                reports.push(PageReport {
                    page,
                    source: PageSource::FetchFailed,
                    records: sample.len(),
                });
                records.extend(sample);
                degraded = true;
            }
        }
    }

    if live == 0 {
        warn!("No live companies for code {}, returning sample data", code);
        records = pages.iter().flat_map(|&p| fallback::sample_page(p)).collect();
        for report in reports.iter_mut() {
            if let PageSource::Live(_) = report.source {
                report.source = PageSource::Fallback;
                report.records = fallback::sample_page(report.page).len();
            }
        }
        degraded = true;
    }

    if enrich && live > 0 {
        records = enrich::enrich_all(fetcher, records, cfg.detail_timeout()).await;
    }

    info!(
        "Code {}: {} companies ({} live){}",
        code,
        records.len(),
        live,
        if degraded { " [degraded]" } else { "" }
    );

    Listing {
        records,
        degraded,
        pages: reports,
    }
}

// ── Tests ──
