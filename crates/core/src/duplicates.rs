//! Run-scoped view of the destination trees and duplicate detection.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::catalog::similarity::normalize_title;
use crate::catalog::ResolvedFilm;
use crate::parser::FilmParser;
use crate::placer::{DUP_SUFFIX, PARTIAL_SUFFIX};
use crate::quality::{Media, Quality};

/// A video file already present in a destination tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingFilm {
    pub path: PathBuf,
    pub title: String,
    pub year: Option<u32>,
    pub edition: Option<String>,
    pub quality: Quality,
    pub media: Media,
    #[serde(default)]
    pub proper: bool,
    pub part: Option<u32>,
    pub size_bytes: u64,
}

impl ExistingFilm {
    /// Entry for a file just placed for `film`.
    pub fn placed(film: &ResolvedFilm, path: PathBuf, part: Option<u32>, size_bytes: u64) -> Self {
        Self {
            path,
            title: film.title().to_string(),
            year: film.year(),
            edition: film.descriptor.edition.clone(),
            quality: film.descriptor.quality,
            media: film.descriptor.media,
            proper: film.descriptor.proper,
            part,
            size_bytes,
        }
    }

    fn key(&self) -> (String, Option<u32>) {
        (normalize_title(&self.title), self.year)
    }
}

/// How an existing copy relates to an incoming film.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    SameQuality,
    /// The incoming copy is of a higher tier.
    UpgradeCandidate,
    /// The incoming copy is of a lower tier.
    DowngradeCandidate,
    /// A different part of the same film, or a lone part next to a
    /// complete copy. Never compared.
    Distinct,
}

/// An existing copy of the incoming film.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateCandidate {
    pub existing: ExistingFilm,
    pub relationship: Relationship,
    /// The existing file sits at a path the incoming film would be written to.
    pub same_path: bool,
    /// Size to weigh against the incoming film: every part in the existing
    /// file's folder when a complete film meets a multi-part copy, otherwise
    /// the file itself.
    pub film_size_bytes: u64,
}

/// Films present in the destination trees, owned by a single run.
///
/// Seeded once from disk, then updated after every transfer so films placed
/// earlier in the run are seen as duplicates of later ones.
#[derive(Debug, Clone, Default)]
pub struct DestinationState {
    entries: Vec<ExistingFilm>,
}

impl DestinationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every video file under the destination roots. Transfer artifacts
    /// (`.partial~`, `.dup~`) are never entries.
    pub fn seed(parser: &FilmParser, roots: &[PathBuf]) -> Self {
        let mut state = Self::new();

        for root in roots {
            if !root.is_dir() {
                continue;
            }
            let walker = WalkDir::new(root)
                .min_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| !parser.is_system_name(&e.file_name().to_string_lossy()));

            for entry in walker.filter_map(Result::ok) {
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.path();
                let name = entry.file_name().to_string_lossy();
                if name.ends_with(PARTIAL_SUFFIX) || name.ends_with(DUP_SUFFIX) {
                    continue;
                }
                if !parser.is_video_path(path) {
                    continue;
                }

                let parsed = parser.parse_existing(path, root);
                state.entries.push(ExistingFilm {
                    path: path.to_path_buf(),
                    title: parsed.title,
                    year: parsed.year,
                    edition: parsed.edition,
                    quality: parsed.quality,
                    media: parsed.media,
                    proper: parsed.proper,
                    part: parsed.part,
                    size_bytes: entry.metadata().map(|m| m.len()).unwrap_or(0),
                });
            }
        }

        info!("Found {} existing film file(s) in destinations", state.entries.len());
        state
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ExistingFilm] {
        &self.entries
    }

    /// Add or refresh the entry for a path.
    pub fn record(&mut self, entry: ExistingFilm) {
        self.remove(&entry.path);
        debug!("Recording {} in destination state", entry.path.display());
        self.entries.push(entry);
    }

    /// Forget the entry for a path.
    pub fn remove(&mut self, path: &Path) {
        self.entries.retain(|e| e.path != path);
    }

    /// Existing copies of `film`: same normalized title and year, and the
    /// same edition unless `ignore_edition`.
    pub fn find_duplicates(
        &self,
        film: &ResolvedFilm,
        planned: &[PathBuf],
        ignore_edition: bool,
    ) -> Vec<DuplicateCandidate> {
        let key = (normalize_title(film.title()), film.year());
        let descriptor = &film.descriptor;

        self.entries
            .iter()
            .filter(|e| e.key() == key)
            .filter(|e| ignore_edition || same_edition(&e.edition, &descriptor.edition))
            .filter(|e| e.path != descriptor.path)
            .map(|e| DuplicateCandidate {
                existing: e.clone(),
                relationship: relationship(descriptor.quality, descriptor.part, e),
                same_path: planned.iter().any(|p| p == &e.path),
                film_size_bytes: self.film_size(e, descriptor.part),
            })
            .collect()
    }

    /// Size of the film `entry` belongs to, as seen by an incoming copy
    /// that is itself a part (`Some`) or complete (`None`).
    fn film_size(&self, entry: &ExistingFilm, incoming_part: Option<u32>) -> u64 {
        if incoming_part.is_some() || entry.part.is_none() {
            return entry.size_bytes;
        }
        let key = entry.key();
        let folder = entry.path.parent();
        self.entries
            .iter()
            .filter(|e| e.part.is_some() && e.path.parent() == folder && e.key() == key)
            .map(|e| e.size_bytes)
            .sum()
    }
}

fn same_edition(a: &Option<String>, b: &Option<String>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => normalize_title(a) == normalize_title(b),
        (None, None) => true,
        _ => false,
    }
}

fn relationship(quality: Quality, part: Option<u32>, existing: &ExistingFilm) -> Relationship {
    match (part, existing.part) {
        (Some(incoming), Some(other)) if incoming != other => return Relationship::Distinct,
        // one part says nothing about a complete copy
        (Some(_), None) => return Relationship::Distinct,
        _ => {}
    }
    match quality.tier().cmp(&existing.quality.tier()) {
        std::cmp::Ordering::Equal => Relationship::SameQuality,
        std::cmp::Ordering::Greater => Relationship::UpgradeCandidate,
        std::cmp::Ordering::Less => Relationship::DowngradeCandidate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::quality::QualityMap;
    use crate::testing::fixtures;
    use std::fs;
    use tempfile::TempDir;

    fn existing(title: &str, year: u32, quality: Quality) -> ExistingFilm {
        ExistingFilm {
            path: PathBuf::from(format!("/films/{} ({}) {}.mkv", title, year, quality)),
            title: title.to_string(),
            year: Some(year),
            edition: None,
            quality,
            media: Media::Unknown,
            proper: false,
            part: None,
            size_bytes: 100,
        }
    }

    fn incoming(title: &str, year: u32, quality: Quality) -> ResolvedFilm {
        let mut descriptor = fixtures::descriptor(title, Some(year));
        descriptor.quality = quality;
        fixtures::resolved(descriptor)
    }

    #[test]
    fn test_relationships_by_tier() {
        let mut state = DestinationState::new();
        state.record(existing("Heat", 1995, Quality::Hd720));

        let dups = state.find_duplicates(&incoming("heat", 1995, Quality::Hd1080), &[], false);
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].relationship, Relationship::UpgradeCandidate);

        let dups = state.find_duplicates(&incoming("Heat", 1995, Quality::Sd), &[], false);
        assert_eq!(dups[0].relationship, Relationship::DowngradeCandidate);

        // unknown behaves as SD
        let mut state = DestinationState::new();
        state.record(existing("Heat", 1995, Quality::Sd));
        let dups = state.find_duplicates(&incoming("Heat", 1995, Quality::Unknown), &[], false);
        assert_eq!(dups[0].relationship, Relationship::SameQuality);
    }

    #[test]
    fn test_year_and_title_must_match() {
        let mut state = DestinationState::new();
        state.record(existing("Heat", 1986, Quality::Hd720));
        state.record(existing("Heat Wave", 1995, Quality::Hd720));
        let dups = state.find_duplicates(&incoming("Heat", 1995, Quality::Hd720), &[], false);
        assert!(dups.is_empty());
    }

    #[test]
    fn test_edition_mismatch_excluded_unless_ignored() {
        let mut state = DestinationState::new();
        let mut cut = existing("Aliens", 1986, Quality::Hd1080);
        cut.edition = Some("Special Edition".to_string());
        state.record(cut);

        let film = incoming("Aliens", 1986, Quality::Hd1080);
        assert!(state.find_duplicates(&film, &[], false).is_empty());
        assert_eq!(state.find_duplicates(&film, &[], true).len(), 1);
    }

    #[test]
    fn test_different_parts_are_distinct() {
        let mut state = DestinationState::new();
        let mut part1 = existing("Heat", 1995, Quality::Sd);
        part1.part = Some(1);
        state.record(part1);

        let mut film = incoming("Heat", 1995, Quality::Sd);
        film.descriptor.part = Some(2);
        let dups = state.find_duplicates(&film, &[], false);
        assert_eq!(dups[0].relationship, Relationship::Distinct);
    }

    #[test]
    fn test_lone_part_never_weighed_against_complete_copy() {
        let mut state = DestinationState::new();
        state.record(existing("Heat", 1995, Quality::Hd1080));

        let mut film = incoming("Heat", 1995, Quality::Hd1080);
        film.descriptor.part = Some(1);
        let dups = state.find_duplicates(&film, &[], false);
        assert_eq!(dups[0].relationship, Relationship::Distinct);
    }

    #[test]
    fn test_complete_film_weighed_against_all_existing_parts() {
        let mut state = DestinationState::new();
        for part in [1, 2] {
            let mut entry = existing("Heat", 1995, Quality::Hd1080);
            entry.path = PathBuf::from(format!("/films/Heat (1995)/Heat (1995) - Part {}.mkv", part));
            entry.part = Some(part);
            entry.size_bytes = 3_000;
            state.record(entry);
        }

        let whole = incoming("Heat", 1995, Quality::Hd1080);
        let dups = state.find_duplicates(&whole, &[], false);
        assert_eq!(dups.len(), 2);
        assert!(dups.iter().all(|d| d.relationship == Relationship::SameQuality));
        assert!(dups.iter().all(|d| d.film_size_bytes == 6_000));

        let mut part = incoming("Heat", 1995, Quality::Hd1080);
        part.descriptor.part = Some(2);
        let dups = state.find_duplicates(&part, &[], false);
        let same = dups.iter().find(|d| d.existing.part == Some(2)).unwrap();
        assert_eq!(same.relationship, Relationship::SameQuality);
        assert_eq!(same.film_size_bytes, 3_000);
    }

    #[test]
    fn test_same_path_flag_and_record_remove() {
        let mut state = DestinationState::new();
        let entry = existing("Heat", 1995, Quality::Hd720);
        let path = entry.path.clone();
        state.record(entry.clone());
        state.record(entry);
        assert_eq!(state.len(), 1);

        let dups = state.find_duplicates(
            &incoming("Heat", 1995, Quality::Hd720),
            std::slice::from_ref(&path),
            false,
        );
        assert!(dups[0].same_path);

        state.remove(&path);
        assert!(state.is_empty());
    }

    #[test]
    fn test_seed_skips_transfer_artifacts() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        let dir = root.join("Heat (1995)");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("Heat (1995) Bluray-1080p.mkv"), "x").unwrap();
        fs::write(dir.join("Heat (1995) Bluray-2160p.mkv.partial~"), "x").unwrap();
        fs::write(dir.join("Heat (1995) Bluray-720p.mkv.dup~"), "x").unwrap();
        fs::write(dir.join("Heat (1995).nfo"), "x").unwrap();

        let parser =
            FilmParser::with_settings(ParserConfig::default(), QualityMap::default()).unwrap();
        let state = DestinationState::seed(&parser, &[root]);

        assert_eq!(state.len(), 1);
        let entry = &state.entries()[0];
        assert_eq!(entry.title, "Heat");
        assert_eq!(entry.year, Some(1995));
        assert_eq!(entry.quality, Quality::Hd1080);
        assert_eq!(entry.media, Media::Bluray);
    }
}
