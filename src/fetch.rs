//! Retrieval of the aggregated CSV for the trainer stage.
//!
//! The trainer accepts either a local path or an http(s) URL; the HTTP side
//! sits behind [`HttpClient`] so tests can substitute a stub.

use anyhow::{Context, Result};
use async_trait::async_trait;

#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response>;
}

pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new() -> Self {
        Self(reqwest::Client::new())
    }
}

impl Default for BasicClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}

pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?;
    Ok(resp.bytes().await?.to_vec())
}

/// Loads the aggregated CSV from a local file path or over HTTP.
///
/// A failure here is fatal for a training run: no partial model is
/// meaningful without the data.
pub async fn load_source(source: &str) -> Result<Vec<u8>> {
    if source.starts_with("http") {
        let client = BasicClient::new();
        fetch_bytes(&client, source)
            .await
            .with_context(|| format!("fetching aggregated CSV from {source}"))
    } else {
        std::fs::read(source).with_context(|| format!("reading aggregated CSV {source}"))
    }
}
