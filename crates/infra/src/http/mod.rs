//! HTTP client and feed fetching.

pub mod client;
pub mod feed_fetcher;

pub use client::HttpClient;
pub use feed_fetcher::HttpFeedFetcher;
