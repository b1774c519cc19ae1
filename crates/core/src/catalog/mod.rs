//! Metadata catalog integration and film resolution.
//!
//! A [`MetadataCatalog`] answers title searches; the [`CatalogResolver`]
//! turns parsed descriptors into resolved films by querying the catalog with
//! a few fallback strategies and filtering the candidates by year, popularity
//! and title similarity.

mod rate_limiter;
mod resolver;
pub mod similarity;
mod tmdb;
mod types;

pub use rate_limiter::{RateLimiter, TokenBucket};
pub use resolver::CatalogResolver;
pub use tmdb::TmdbClient;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when querying the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing API key, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

/// A searchable film catalog.
#[async_trait]
pub trait MetadataCatalog: Send + Sync {
    /// Returns the name of this catalog implementation.
    fn name(&self) -> &str;

    /// Search for movies by title, optionally narrowed to a release year.
    ///
    /// Results are returned in the catalog's own relevance order.
    async fn search_movies(
        &self,
        query: &str,
        year: Option<u32>,
    ) -> Result<Vec<CatalogRecord>, CatalogError>;
}
