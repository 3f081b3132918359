use crate::app::ports::{FetchFailure, FetchedPage, Fetcher};
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Production [`Fetcher`] backed by a shared `reqwest::Client`.
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

fn classify(err: reqwest::Error) -> FetchFailure {
    if err.is_timeout() {
        FetchFailure::Timeout
    } else {
        FetchFailure::Request(err.to_string())
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<FetchedPage, FetchFailure> {
        debug!("HTTP GET request to: {}", url);
        let resp = self.client.get(url).send().await.map_err(classify)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status.as_u16()));
        }
        let body = resp.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchFailure::Timeout
            } else {
                FetchFailure::Body(e.to_string())
            }
        })?;
        debug!("HTTP response: status={}, size={} bytes", status.as_u16(), body.len());
        Ok(FetchedPage {
            url: url.to_string(),
            body,
        })
    }
}
