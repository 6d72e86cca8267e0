use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use tracing::debug;

use crate::error::FetchError;

/// Some registry pages reject requests without a browser identity.
const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// GET a URL and return its body. Non-success statuses are errors.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str, timeout: Duration) -> Result<String, FetchError>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        let client = reqwest::Client::builder().default_headers(headers).build()?;
        Ok(HttpFetcher { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let start = Instant::now();
        let response = self.client.get(url).timeout(timeout).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        debug!(
            "GET {} -> {} ({} bytes, {} ms)",
            url,
            status.as_u16(),
            body.len(),
            start.elapsed().as_millis()
        );
        Ok(body)
    }
}

#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    enum Canned {
        Body(String),
        Status(u16),
    }

    /// In-memory upstream. Unknown URLs answer 404. Every request is recorded.
    #[derive(Default)]
    pub struct FakeFetcher {
        routes: HashMap<String, Canned>,
        requests: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn body(mut self, url: &str, body: &str) -> Self {
            self.routes.insert(url.to_string(), Canned::Body(body.to_string()));
            self
        }

        pub fn status(mut self, url: &str, status: u16) -> Self {
            self.routes.insert(url.to_string(), Canned::Status(status));
            self
        }

        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for FakeFetcher {
        async fn get(&self, url: &str, _timeout: Duration) -> Result<String, FetchError> {
            self.requests.lock().unwrap().push(url.to_string());
            match self.routes.get(url) {
                Some(Canned::Body(b)) => Ok(b.clone()),
                Some(Canned::Status(s)) => Err(FetchError::Status(*s)),
                None => Err(FetchError::Status(404)),
            }
        }
    }
}
