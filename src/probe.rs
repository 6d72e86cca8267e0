use tracing::{info, warn};

use crate::config::Config;
use crate::http::Fetcher;
use crate::parser;

/// Highest page number, from 1, whose listing still carries real company data.
///
/// Pages are probed one at a time with a pause in between. The first page that
/// fails to load or has no complete row ends the probe. Never returns 0.
pub async fn max_page(fetcher: &dyn Fetcher, cfg: &Config, code: &str) -> u32 {
    let limit = cfg.page_limit();
    let mut max_page = 1;

    for page in 1..=limit {
        if page > 1 {
            tokio::time::sleep(cfg.probe_delay()).await;
        }

        let url = cfg.listing_url(code, page);
        let has_data = match fetcher.get(&url, cfg.probe_timeout()).await {
            Ok(body) => parser::has_real_data(&body),
            Err(e) => {
                warn!("Probe of page {} for code {} failed: {}", page, code, e);
                false
            }
        };

        if !has_data {
            info!("Page {} has no real data - stopping", page);
            break;
        }
        info!("Page {} has real data", page);
        max_page = page;
    }

    info!("Max page for code {}: {}", code, max_page);
    max_page
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::FakeFetcher;

    fn listing() -> String {
        std::fs::read_to_string("tests/fixtures/listing.html").unwrap()
    }

    #[tokio::test]
    async fn stops_at_first_empty_page() {
        let cfg = Config::for_tests();
        let fetcher = FakeFetcher::new()
            .body(&cfg.listing_url("A", 1), &listing())
            .body(&cfg.listing_url("A", 2), &listing())
            .body(&cfg.listing_url("A", 3), &listing())
            .body(&cfg.listing_url("A", 4), "<html>Inga träffar</html>")
            .body(&cfg.listing_url("A", 5), &listing());

        assert_eq!(max_page(&fetcher, &cfg, "A").await, 3);
        let requested = fetcher.requests();
        assert_eq!(requested.len(), 4);
        assert!(!requested.contains(&cfg.listing_url("A", 5)));
    }

    #[tokio::test]
    async fn first_page_failure_still_yields_one() {
        let cfg = Config::for_tests();
        let fetcher = FakeFetcher::new().status(&cfg.listing_url("A", 1), 503);
        assert_eq!(max_page(&fetcher, &cfg, "A").await, 1);
    }

    #[tokio::test]
    async fn fetch_error_keeps_last_good_page() {
        let cfg = Config::for_tests();
        let fetcher = FakeFetcher::new()
            .body(&cfg.listing_url("A", 1), &listing())
            .status(&cfg.listing_url("A", 2), 500);
        assert_eq!(max_page(&fetcher, &cfg, "A").await, 1);
    }

    #[tokio::test]
    async fn never_probes_past_ceiling() {
        let mut cfg = Config::for_tests();
        let mut fetcher = FakeFetcher::new();
        for page in 1..=12 {
            fetcher = fetcher.body(&cfg.listing_url("A", page), &listing());
        }
        assert_eq!(max_page(&fetcher, &cfg, "A").await, 10);
        assert_eq!(fetcher.requests().len(), 10);

        cfg.max_pages = 2;
        let fetcher = FakeFetcher::new()
            .body(&cfg.listing_url("A", 1), &listing())
            .body(&cfg.listing_url("A", 2), &listing())
            .body(&cfg.listing_url("A", 3), &listing());
        assert_eq!(max_page(&fetcher, &cfg, "A").await, 2);
    }
}
