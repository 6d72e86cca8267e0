use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::http::Fetcher;
use crate::model::{CompanyRecord, Enrichment};
use crate::parser::extract::detail;

const DETAIL_CONCURRENCY: usize = 4;

/// Fetch one detail page and extract its optional fields.
/// Any failure yields an empty enrichment.
pub async fn enrich_one(fetcher: &dyn Fetcher, url: &str, timeout: Duration) -> Enrichment {
    match fetcher.get(url, timeout).await {
        Ok(html) => {
            let e = detail::extract(&html);
            if e.is_empty() {
                debug!("Detail {}: no known sections", url);
            }
            e
        }
        Err(e) => {
            warn!("Detail fetch failed for {}: {}", url, e);
            Enrichment::default()
        }
    }
}

/// Enrich records with a bounded number of detail fetches in flight.
/// Order is preserved; records without a detail link pass through untouched.
pub async fn enrich_all(
    fetcher: &dyn Fetcher,
    records: Vec<CompanyRecord>,
    timeout: Duration,
) -> Vec<CompanyRecord> {
    stream::iter(records)
        .map(|record| async move {
            match record.detail_url.clone() {
                Some(url) => {
                    let e = enrich_one(fetcher, &url, timeout).await;
                    record.with_enrichment(e)
                }
                None => record,
            }
        })
        .buffered(DETAIL_CONCURRENCY)
        .collect()
        .await
}

// ── Tests ──
