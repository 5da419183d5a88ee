// src/common/net.rs
//! Document fetcher.
//!
//! The pipeline only needs "URL in, markup text out", so that is the whole
//! [`Fetch`] contract. No caching and no retries; pacing lives in the scheduler.

use reqwest::blocking::Client;
use reqwest::header::{self, HeaderMap, HeaderValue};

use crate::config::options::SourceOptions;
use crate::error::FetchError;

/// Anything that can turn a URL into markup. Shared by reference across
/// worker threads, hence `Sync`.
pub trait Fetch: Send + Sync {
    fn get(&self, url: &str) -> Result<String, FetchError>;
}

/// Blocking HTTP(S) fetcher sending a fixed browser-like identification.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(source: &SourceOptions) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(&source.user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static("Mozilla/5.0"));
        headers.insert(header::USER_AGENT, agent);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(source.timeout)
            .build()
            .map_err(|source_err| FetchError::Request {
                url: source.base_url.clone(),
                source: source_err,
            })?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn get(&self, url: &str) -> Result<String, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|source| FetchError::Request { url: s!(url), source })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status { url: s!(url), status: status.as_u16() });
        }
        resp.text().map_err(|source| FetchError::Request { url: s!(url), source })
    }
}
