use async_trait::async_trait;
use thiserror::Error;

/// Capability to GET a page and return its rendered HTML.
///
/// Both the paginator and the detail enricher go through this port, so tests
/// can substitute canned pages for the network.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchFailure>;
}

#[derive(Clone, Debug)]
pub struct FetchedPage {
    /// The URL that was requested, used to resolve relative links.
    pub url: String,
    pub body: String,
}

/// Why a page could not be fetched. Never fatal to a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    #[error("request failed: {0}")]
    Request(String),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("failed to read response body: {0}")]
    Body(String),
}
