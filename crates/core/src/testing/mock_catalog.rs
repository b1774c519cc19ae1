//! Mock metadata catalog for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::similarity::normalize_title;
use crate::catalog::{CatalogError, CatalogRecord, MetadataCatalog};

/// A recorded catalog query for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedQuery {
    pub query: String,
    pub year: Option<u32>,
}

/// Mock implementation of the MetadataCatalog trait.
///
/// A record is returned when its normalized title contains the normalized
/// query, in the order the records were set. The year is recorded but does
/// not narrow the results, so tests see every candidate the resolver has to
/// filter.
///
/// # Example
///
/// ```rust,ignore
/// use filmsort_core::testing::{MockCatalog, fixtures};
///
/// let catalog = MockCatalog::new();
/// catalog.set_movies(vec![fixtures::record(949, "Heat", Some(1995), 40.0)]).await;
///
/// let results = catalog.search_movies("heat", Some(1995)).await?;
/// assert_eq!(results.len(), 1);
/// ```
#[derive(Debug)]
pub struct MockCatalog {
    movies: Arc<RwLock<Vec<CatalogRecord>>>,
    /// Return every movie for any query.
    match_all: Arc<RwLock<bool>>,
    queries: Arc<RwLock<Vec<RecordedQuery>>>,
    /// If set, the next search will fail with this error.
    next_error: Arc<RwLock<Option<CatalogError>>>,
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCatalog {
    /// Create a new empty mock catalog.
    pub fn new() -> Self {
        Self {
            movies: Arc::new(RwLock::new(Vec::new())),
            match_all: Arc::new(RwLock::new(false)),
            queries: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Add a movie.
    pub async fn add_movie(&self, movie: CatalogRecord) {
        self.movies.write().await.push(movie);
    }

    /// Replace all movies.
    pub async fn set_movies(&self, movies: Vec<CatalogRecord>) {
        *self.movies.write().await = movies;
    }

    pub async fn set_match_all(&self, match_all: bool) {
        *self.match_all.write().await = match_all;
    }

    /// Get all recorded queries.
    pub async fn recorded_queries(&self) -> Vec<RecordedQuery> {
        self.queries.read().await.clone()
    }

    /// Clear recorded queries.
    pub async fn clear_recorded(&self) {
        self.queries.write().await.clear();
    }

    /// Set an error to be returned on the next search.
    pub async fn set_next_error(&self, error: CatalogError) {
        *self.next_error.write().await = Some(error);
    }

    /// Clear the next error.
    pub async fn clear_next_error(&self) {
        *self.next_error.write().await = None;
    }
}

#[async_trait]
impl MetadataCatalog for MockCatalog {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search_movies(
        &self,
        query: &str,
        year: Option<u32>,
    ) -> Result<Vec<CatalogRecord>, CatalogError> {
        self.queries.write().await.push(RecordedQuery {
            query: query.to_string(),
            year,
        });

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        let movies = self.movies.read().await;
        if *self.match_all.read().await {
            return Ok(movies.clone());
        }

        let wanted = normalize_title(query);
        Ok(movies
            .iter()
            .filter(|m| normalize_title(&m.title).contains(&wanted))
            .cloned()
            .collect())
    }
}
