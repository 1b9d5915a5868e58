//! HTTP implementation of the FeedFetcher port.
//!
//! Issues conditional GETs with `If-None-Match` / `If-Modified-Since` built
//! from the subscription's cached validators. A `304` short-circuits without
//! touching the body; any other non-2xx status is a fetch failure.

use std::time::Duration;

use async_trait::async_trait;
use calbridge_core::{FeedFetcher, FetchOutcome};
use calbridge_domain::{CalBridgeError, Result};
use reqwest::header::{ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use reqwest::{Method, StatusCode};
use tracing::{debug, instrument};

use super::client::HttpClient;
use crate::errors::InfraError;

/// Conditional ICS fetcher backed by [`HttpClient`].
pub struct HttpFeedFetcher {
    client: HttpClient,
}

impl HttpFeedFetcher {
    /// Create a fetcher with the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = HttpClient::builder()
            .timeout(timeout)
            .user_agent(concat!("calbridge/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Wrap an existing client (used by tests).
    pub fn with_client(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    #[instrument(skip(self, etag, last_modified))]
    async fn fetch_feed(
        &self,
        url: &str,
        etag: Option<&str>,
        last_modified: Option<&str>,
    ) -> Result<FetchOutcome> {
        let mut builder = self.client.request(Method::GET, url);
        if let Some(etag) = etag {
            builder = builder.header(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = last_modified {
            builder = builder.header(IF_MODIFIED_SINCE, last_modified);
        }

        let response = self.client.send(builder).await?;
        let status = response.status();

        if status == StatusCode::NOT_MODIFIED {
            debug!(url, "feed not modified");
            return Ok(FetchOutcome::NotModified);
        }

        if !status.is_success() {
            return Err(CalBridgeError::FetchFailed(format!(
                "{url} answered HTTP {status}"
            )));
        }

        let etag = header_value(&response, ETAG);
        let last_modified = header_value(&response, LAST_MODIFIED);

        let body = response.text().await.map_err(InfraError::from)?;
        debug!(url, bytes = body.len(), "fetched feed body");

        Ok(FetchOutcome::Fetched { body, etag, last_modified })
    }
}

fn header_value(response: &reqwest::Response, name: reqwest::header::HeaderName) -> Option<String> {
    response.headers().get(name).and_then(|value| value.to_str().ok()).map(str::to_string)
}
