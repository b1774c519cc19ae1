//! Types for catalog lookups and resolution results.

use serde::{Deserialize, Serialize};

use crate::parser::FilmDescriptor;

/// A film as listed by the metadata catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    /// Catalog identifier (TMDB movie ID).
    pub id: u64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    /// Release year, when the catalog knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(default)]
    pub popularity: f64,
}

impl CatalogRecord {
    /// Extract the year from a `YYYY-MM-DD` release date.
    pub fn year_from_date(date: Option<&str>) -> Option<u32> {
        date.and_then(|d| d.get(..4)).and_then(|y| y.parse().ok())
    }
}

/// The accepted catalog match for a film.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogMatch {
    pub catalog_id: u64,
    pub canonical_title: String,
    pub canonical_year: Option<u32>,
    pub popularity: f64,
    /// Title similarity to the parsed title, 0.0-1.0.
    pub similarity: f64,
}

impl CatalogMatch {
    pub fn from_record(record: &CatalogRecord, similarity: f64) -> Self {
        Self {
            catalog_id: record.id,
            canonical_title: record.title.clone(),
            canonical_year: record.year,
            popularity: record.popularity,
            similarity,
        }
    }
}

/// Why a film was not looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoYear,
    TvShow,
    NoCatalog,
}

/// Outcome of resolving a film against the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "reason")]
pub enum Resolution {
    /// A candidate survived the filters.
    Matched,
    /// The catalog answered but nothing qualified.
    NoMatch,
    /// No lookup was made.
    Skipped(SkipReason),
    /// The lookup itself failed; the film continues unresolved.
    Failed,
    /// The operator chose naming from the parsed descriptor.
    Offline,
}

/// A descriptor plus what the catalog had to say about it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedFilm {
    pub descriptor: FilmDescriptor,
    pub matched: Option<CatalogMatch>,
    /// Other candidates, in catalog order.
    pub alternates: Vec<CatalogRecord>,
    pub resolution: Resolution,
    /// Non-fatal lookup failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup_error: Option<String>,
}

impl ResolvedFilm {
    /// A film named from its descriptor only.
    pub fn unresolved(descriptor: FilmDescriptor, resolution: Resolution) -> Self {
        Self {
            descriptor,
            matched: None,
            alternates: Vec::new(),
            resolution,
            lookup_error: None,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.matched.is_some()
    }

    /// Canonical title when matched, parsed title otherwise.
    pub fn title(&self) -> &str {
        self.matched
            .as_ref()
            .map(|m| m.canonical_title.as_str())
            .unwrap_or(&self.descriptor.title)
    }

    /// Canonical year when matched, parsed year otherwise.
    pub fn year(&self) -> Option<u32> {
        self.matched
            .as_ref()
            .and_then(|m| m.canonical_year)
            .or(self.descriptor.year)
    }

    /// Accept an alternate instead of the current match.
    pub fn choose_alternate(&mut self, index: usize, similarity: f64) -> bool {
        let Some(record) = self.alternates.get(index).cloned() else {
            return false;
        };
        self.alternates.remove(index);
        self.matched = Some(CatalogMatch::from_record(&record, similarity));
        self.resolution = Resolution::Matched;
        true
    }

    /// Drop the match and name from the descriptor.
    pub fn force_offline(&mut self) {
        self.matched = None;
        self.resolution = Resolution::Offline;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_year_from_date() {
        assert_eq!(CatalogRecord::year_from_date(Some("1999-03-31")), Some(1999));
        assert_eq!(CatalogRecord::year_from_date(Some("")), None);
        assert_eq!(CatalogRecord::year_from_date(None), None);
    }

    #[test]
    fn test_resolved_film_prefers_canonical_identity() {
        let descriptor = fixtures::descriptor("Matrix", Some(1998));
        let mut film = ResolvedFilm::unresolved(descriptor, Resolution::NoMatch);
        assert_eq!(film.title(), "Matrix");
        assert_eq!(film.year(), Some(1998));

        film.alternates = vec![fixtures::record(603, "The Matrix", Some(1999), 80.0)];
        assert!(film.choose_alternate(0, 0.9));
        assert_eq!(film.title(), "The Matrix");
        assert_eq!(film.year(), Some(1999));
        assert!(film.alternates.is_empty());

        film.force_offline();
        assert_eq!(film.title(), "Matrix");
        assert_eq!(film.resolution, Resolution::Offline);
    }
}
