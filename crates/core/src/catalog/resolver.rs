//! Resolution of parsed films against the catalog.

use futures::stream::{self, Stream, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::rate_limiter::RateLimiter;
use super::similarity::{strip_articles, title_similarity};
use super::types::{CatalogMatch, CatalogRecord, Resolution, ResolvedFilm, SkipReason};
use super::MetadataCatalog;
use crate::config::LookupConfig;
use crate::metrics;
use crate::parser::FilmDescriptor;

/// Resolves descriptors to catalog matches.
///
/// Candidates are evaluated in catalog order and the first one that passes
/// every filter is accepted; there is no re-ranking.
pub struct CatalogResolver {
    catalog: Option<Arc<dyn MetadataCatalog>>,
    config: LookupConfig,
    limiter: Option<RateLimiter>,
}

impl CatalogResolver {
    pub fn new(catalog: Option<Arc<dyn MetadataCatalog>>, config: LookupConfig) -> Self {
        let limiter = (config.requests_per_minute > 0)
            .then(|| RateLimiter::new(config.requests_per_minute));
        Self {
            catalog,
            config,
            limiter,
        }
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    /// Queries to try in order: title + year, title without leading article
    /// + year, then title alone.
    fn query_plan(descriptor: &FilmDescriptor) -> Vec<(String, Option<u32>)> {
        let mut plan: Vec<(String, Option<u32>)> = Vec::new();
        let title = descriptor.title.clone();
        let stripped = strip_articles(&title);

        plan.push((title.clone(), descriptor.year));
        if !stripped.is_empty() && stripped != title {
            plan.push((stripped, descriptor.year));
        }
        if descriptor.year.is_some() {
            plan.push((title, None));
        }
        plan
    }

    /// Similarity of a candidate to the parsed title (best of its titles).
    fn similarity(descriptor: &FilmDescriptor, record: &CatalogRecord) -> f64 {
        let primary = title_similarity(&descriptor.title, &record.title);
        let original = record
            .original_title
            .as_deref()
            .map(|t| title_similarity(&descriptor.title, t))
            .unwrap_or(0.0);
        primary.max(original)
    }

    /// Index and similarity of the first acceptable candidate.
    pub fn select(
        &self,
        descriptor: &FilmDescriptor,
        candidates: &[CatalogRecord],
    ) -> Option<(usize, f64)> {
        candidates.iter().enumerate().find_map(|(idx, record)| {
            // a candidate without a release year deviates by nothing
            if let (Some(year), Some(record_year)) = (descriptor.year, record.year) {
                if record_year.abs_diff(year) > self.config.max_year_diff {
                    debug!(
                        "Rejecting '{}' ({}): year too far from {}",
                        record.title, record_year, year
                    );
                    return None;
                }
            }

            if record.popularity < self.config.min_popularity {
                debug!(
                    "Rejecting '{}': popularity {} below {}",
                    record.title, record.popularity, self.config.min_popularity
                );
                return None;
            }

            let similarity = Self::similarity(descriptor, record);
            if self.config.strict && similarity < self.config.min_title_similarity {
                debug!(
                    "Rejecting '{}': similarity {:.2} below {:.2}",
                    record.title, similarity, self.config.min_title_similarity
                );
                return None;
            }

            Some((idx, similarity))
        })
    }

    /// Similarity of an alternate, for operator overrides.
    pub fn similarity_of(&self, descriptor: &FilmDescriptor, record: &CatalogRecord) -> f64 {
        Self::similarity(descriptor, record)
    }

    /// Resolve a single film. Never fails: lookup errors leave the film
    /// unresolved with the error recorded.
    pub async fn resolve(&self, descriptor: FilmDescriptor) -> ResolvedFilm {
        let Some(catalog) = self.catalog.as_ref() else {
            return skipped(descriptor, SkipReason::NoCatalog);
        };

        if !self.config.force_lookup {
            if descriptor.is_tv_show {
                return skipped(descriptor, SkipReason::TvShow);
            }
            if descriptor.year.is_none() {
                return skipped(descriptor, SkipReason::NoYear);
            }
        }

        let mut seen: Vec<CatalogRecord> = Vec::new();

        for (query, year) in Self::query_plan(&descriptor) {
            if let Some(limiter) = &self.limiter {
                limiter.acquire().await;
            }

            let records = match catalog.search_movies(&query, year).await {
                Ok(records) => records,
                Err(e) => {
                    warn!(
                        "Lookup failed for '{}' via {}: {}",
                        descriptor.title,
                        catalog.name(),
                        e
                    );
                    metrics::CATALOG_LOOKUPS.with_label_values(&["failed"]).inc();
                    let mut film = ResolvedFilm::unresolved(descriptor, Resolution::Failed);
                    film.alternates = seen;
                    film.lookup_error = Some(e.to_string());
                    return film;
                }
            };

            for record in records {
                if !seen.iter().any(|r| r.id == record.id) {
                    seen.push(record);
                }
            }

            if let Some((idx, similarity)) = self.select(&descriptor, &seen) {
                let record = seen.remove(idx);
                info!(
                    "Matched '{}' to '{}' ({:?}), similarity {:.2}",
                    descriptor.title, record.title, record.year, similarity
                );
                metrics::CATALOG_LOOKUPS.with_label_values(&["matched"]).inc();
                return ResolvedFilm {
                    descriptor,
                    matched: Some(CatalogMatch::from_record(&record, similarity)),
                    alternates: seen,
                    resolution: Resolution::Matched,
                    lookup_error: None,
                };
            }
        }

        debug!("No acceptable match for '{}'", descriptor.title);
        metrics::CATALOG_LOOKUPS.with_label_values(&["no_match"]).inc();
        let mut film = ResolvedFilm::unresolved(descriptor, Resolution::NoMatch);
        film.alternates = seen;
        film
    }

    /// Resolve a batch concurrently, at most `max_concurrent` lookups in
    /// flight. Results come back in input order.
    pub fn resolve_all(
        &self,
        descriptors: Vec<FilmDescriptor>,
    ) -> impl Stream<Item = ResolvedFilm> + '_ {
        let limit = self.config.max_concurrent.max(1);
        stream::iter(descriptors)
            .map(move |descriptor| self.resolve(descriptor))
            .buffered(limit)
    }
}

fn skipped(descriptor: FilmDescriptor, reason: SkipReason) -> ResolvedFilm {
    debug!("Skipping lookup for '{}': {:?}", descriptor.title, reason);
    metrics::CATALOG_LOOKUPS.with_label_values(&["skipped"]).inc();
    ResolvedFilm::unresolved(descriptor, Resolution::Skipped(reason))
}
