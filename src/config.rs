use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

/// Never probe or fetch beyond this page, whatever the configuration says.
pub const PAGE_CEILING: u32 = 10;

/// Runtime configuration. Every flag falls back to an environment variable.
#[derive(Args, Debug, Clone)]
pub struct Config {
    /// SQLite database path
    #[arg(long, env = "REGISTRY_DB", default_value = "data/registry.sqlite", global = true)]
    pub db_path: PathBuf,

    /// Registry origin used for listing queries and detail links
    #[arg(long, env = "REGISTRY_ORIGIN", default_value = "https://www.allabolag.se", global = true)]
    pub origin: String,

    /// Region filter; also the default location of a company
    #[arg(long, env = "REGISTRY_REGION", default_value = "Skåne", global = true)]
    pub region: String,

    /// Highest page the prober may reach (capped at 10)
    #[arg(long, env = "REGISTRY_MAX_PAGES", default_value_t = PAGE_CEILING, global = true)]
    pub max_pages: u32,

    #[arg(long, env = "REGISTRY_PROBE_DELAY_MS", default_value_t = 300, global = true)]
    pub probe_delay_ms: u64,

    #[arg(long, env = "REGISTRY_LISTING_TIMEOUT_SECS", default_value_t = 10, global = true)]
    pub listing_timeout_secs: u64,

    #[arg(long, env = "REGISTRY_DETAIL_TIMEOUT_SECS", default_value_t = 15, global = true)]
    pub detail_timeout_secs: u64,

    #[arg(long, env = "REGISTRY_PROBE_TIMEOUT_SECS", default_value_t = 10, global = true)]
    pub probe_timeout_secs: u64,

    /// Fetch detail pages for every listed company
    #[arg(long, env = "REGISTRY_ENRICH", global = true)]
    pub enrich: bool,

    /// Let sample data from a failed listing into dedup, storage and the digest
    #[arg(long, env = "REGISTRY_INCLUDE_DEGRADED", global = true)]
    pub include_degraded: bool,

    /// Category codes fetched at the same time during a digest cycle
    #[arg(long, env = "REGISTRY_CODE_CONCURRENCY", default_value_t = 1, global = true)]
    pub code_concurrency: usize,

    /// Shared secret expected as `Authorization: Bearer <secret>` by the trigger endpoint
    #[arg(long, env = "CRON_SECRET", hide_env_values = true, global = true)]
    pub cron_secret: Option<String>,

    /// MailerSend API key; digests are only logged when absent
    #[arg(long, env = "MAILERSEND_API_KEY", hide_env_values = true, global = true)]
    pub mailersend_api_key: Option<String>,

    #[arg(long, env = "MAILERSEND_FROM_EMAIL", default_value = "noreply@companyscraper.com", global = true)]
    pub from_email: String,
}

impl Config {
    pub fn page_limit(&self) -> u32 {
        self.max_pages.clamp(1, PAGE_CEILING)
    }

    pub fn probe_delay(&self) -> Duration {
        Duration::from_millis(self.probe_delay_ms)
    }

    pub fn listing_timeout(&self) -> Duration {
        Duration::from_secs(self.listing_timeout_secs)
    }

    pub fn detail_timeout(&self) -> Duration {
        Duration::from_secs(self.detail_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Listing query URL for one category code and page.
    pub fn listing_url(&self, code: &str, page: u32) -> String {
        let base = format!("{}/nystartade", self.origin.trim_end_matches('/'));
        let page = page.to_string();
        match reqwest::Url::parse_with_params(
            &base,
            &[("location", self.region.as_str()), ("proffIndustryCode", code), ("page", &page)],
        ) {
            Ok(url) => url.to_string(),
            // Unparseable origin: leave it to the fetcher to report.
            Err(_) => format!(
                "{}?location={}&proffIndustryCode={}&page={}",
                base,
                urlencoding::encode(&self.region),
                urlencoding::encode(code),
                page
            ),
        }
    }
}

#[cfg(test)]
impl Config {
    /// Defaults with no delays, no secrets and no mail delivery.
    pub fn for_tests() -> Self {
        Config {
            db_path: PathBuf::from("unused.sqlite"),
            origin: "https://registry.test".to_string(),
            region: "Skåne".to_string(),
            max_pages: PAGE_CEILING,
            probe_delay_ms: 0,
            listing_timeout_secs: 1,
            detail_timeout_secs: 1,
            probe_timeout_secs: 1,
            enrich: false,
            include_degraded: false,
            code_concurrency: 1,
            cron_secret: None,
            mailersend_api_key: None,
            from_email: "noreply@test".to_string(),
        }
    }
}
