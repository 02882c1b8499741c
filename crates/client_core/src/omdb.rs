use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use shared::{
    domain::{ImdbId, MovieDetails, MovieSummary, QueryKey},
    error::FetchError,
    protocol::{decode_envelope, SearchPage},
};
use tracing::{debug, warn};

use crate::fetcher::Fetcher;

pub const DEFAULT_OMDB_URL: &str = "https://www.omdbapi.com";

const TRANSPORT_FAILURE: &str = "something went wrong with fetching movies";

/// Thin OMDb HTTP client. Cloning shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct OmdbClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl OmdbClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_http(Client::new(), base_url, api_key)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build OMDb http client")?;
        Ok(Self::with_http(http, base_url, api_key))
    }

    pub fn with_http(http: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            api_key: api_key.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn search(&self, query: &QueryKey) -> Result<Vec<MovieSummary>, FetchError> {
        let page: SearchPage = self.get_json("s", query.as_str()).await?;
        debug!(
            query = %query,
            results = page.search.len(),
            total = page.total_results.as_deref().unwrap_or("0"),
            "omdb: search page received"
        );
        Ok(page.search)
    }

    pub async fn details(&self, imdb_id: &ImdbId) -> Result<MovieDetails, FetchError> {
        self.get_json("i", imdb_id.as_str()).await
    }

    async fn get_json<T: DeserializeOwned>(&self, param: &str, value: &str) -> Result<T, FetchError> {
        let response = self
            .http
            .get(format!("{}/", self.base_url))
            .query(&[("apikey", self.api_key.as_str()), (param, value)])
            .send()
            .await
            .map_err(|e| FetchError::transport(format!("{TRANSPORT_FAILURE}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), param, value, "omdb: request rejected");
            return Err(FetchError::transport(format!(
                "{TRANSPORT_FAILURE} (status {status})"
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| FetchError::transport(format!("{TRANSPORT_FAILURE}: {e}")))?;
        decode_envelope(body)
    }
}

/// Search-by-title fetcher.
#[derive(Debug, Clone)]
pub struct MovieSearch {
    client: OmdbClient,
}

impl MovieSearch {
    pub fn new(client: OmdbClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for MovieSearch {
    type Payload = Vec<MovieSummary>;

    async fn fetch(&self, key: &QueryKey) -> Result<Self::Payload, FetchError> {
        self.client.search(key).await
    }
}

/// Fetches one title's details; the key is an IMDb id.
#[derive(Debug, Clone)]
pub struct MovieDetailsFetch {
    client: OmdbClient,
}

impl MovieDetailsFetch {
    pub fn new(client: OmdbClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for MovieDetailsFetch {
    type Payload = MovieDetails;

    async fn fetch(&self, key: &QueryKey) -> Result<Self::Payload, FetchError> {
        self.client.details(&ImdbId::from(key)).await
    }
}

#[cfg(test)]
#[path = "tests/omdb_tests.rs"]
mod tests;
