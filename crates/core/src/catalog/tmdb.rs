//! TMDB (The Movie Database) API client.
//!
//! TMDB requires an API key for access.
//! Rate limits are generous (around 40 requests per second).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::types::CatalogRecord;
use super::{CatalogError, MetadataCatalog};
use crate::config::TmdbConfig;

const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// TMDB API client.
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    /// Create a new TMDB client.
    pub fn new(config: &TmdbConfig) -> Result<Self, CatalogError> {
        if config.api_key.trim().is_empty() {
            return Err(CatalogError::NotConfigured(
                "TMDB API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_secs)))
            .build()?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl MetadataCatalog for TmdbClient {
    fn name(&self) -> &str {
        "tmdb"
    }

    async fn search_movies(
        &self,
        query: &str,
        year: Option<u32>,
    ) -> Result<Vec<CatalogRecord>, CatalogError> {
        let url = format!("{}/search/movie", self.base_url);

        debug!("TMDB movie search: query='{}', year={:?}", query, year);

        let mut request = self.client.get(&url).query(&[
            ("api_key", self.api_key.as_str()),
            ("query", query),
            ("include_adult", "false"),
        ]);

        if let Some(y) = year {
            request = request.query(&[("primary_release_year", y.to_string())]);
        }

        let response = request.send().await?;

        let status = response.status();
        if status == 401 {
            return Err(CatalogError::NotConfigured(
                "Invalid TMDB API key".to_string(),
            ));
        }
        if status == 429 {
            return Err(CatalogError::RateLimitExceeded);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let search_result: TmdbSearchResponse = response.json().await.map_err(|e| {
            CatalogError::ParseError(format!("Failed to parse movie search response: {}", e))
        })?;

        debug!(
            "TMDB returned {} result(s) for '{}'",
            search_result.results.len(),
            query
        );

        Ok(search_result.results.into_iter().map(Into::into).collect())
    }
}

// ============================================================================
// TMDB API response types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse {
    results: Vec<TmdbMovieResult>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieResult {
    id: u64,
    title: String,
    original_title: Option<String>,
    release_date: Option<String>,
    #[serde(default)]
    popularity: Option<f64>,
}

impl From<TmdbMovieResult> for CatalogRecord {
    fn from(r: TmdbMovieResult) -> Self {
        CatalogRecord {
            id: r.id,
            year: CatalogRecord::year_from_date(r.release_date.as_deref()),
            original_title: r.original_title.filter(|t| *t != r.title),
            title: r.title,
            popularity: r.popularity.unwrap_or(0.0),
        }
    }
}
