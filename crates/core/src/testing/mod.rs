//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the external seams (catalog,
//! library notifier, operator review), allowing whole runs to be tested
//! without network access or a terminal.
//!
//! # Example
//!
//! ```rust,ignore
//! use filmsort_core::testing::{fixtures, MockCatalog, MockNotifier};
//!
//! let catalog = MockCatalog::new();
//! catalog.set_movies(vec![fixtures::record(949, "Heat", Some(1995), 40.0)]).await;
//!
//! let config = fixtures::config_for(&incoming, &library);
//! let organizer = FilmOrganizer::new(config, Some(Arc::new(catalog)))?;
//! ```

mod mock_catalog;
mod mock_notifier;
mod scripted_reviewer;

pub use mock_catalog::{MockCatalog, RecordedQuery};
pub use mock_notifier::MockNotifier;
pub use scripted_reviewer::ScriptedReviewer;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    use crate::catalog::{CatalogRecord, Resolution, ResolvedFilm, SkipReason};
    use crate::config::{
        Config, DestinationsConfig, DuplicatesConfig, LookupConfig, ParserConfig, RenameConfig,
        RunConfig, TransferConfig,
    };
    use crate::parser::{FilmDescriptor, VideoFile};
    use crate::quality::{Media, Quality, QualityMap};

    /// Create a descriptor for a single-file film with reasonable defaults.
    ///
    /// The path is `/incoming/<Title>.<year>.mkv` and the file is 1 GiB of
    /// unknown quality and media.
    pub fn descriptor(title: &str, year: Option<u32>) -> FilmDescriptor {
        let stem = match year {
            Some(y) => format!("{}.{}", title.replace(' ', "."), y),
            None => title.replace(' ', "."),
        };
        let path = PathBuf::from(format!("/incoming/{}.mkv", stem));
        let size_bytes = 1024 * 1024 * 1024;

        FilmDescriptor {
            video_files: vec![VideoFile {
                path: path.clone(),
                size_bytes,
                part: None,
            }],
            path,
            title: title.to_string(),
            year,
            edition: None,
            quality: Quality::Unknown,
            media: Media::Unknown,
            hdr: false,
            proper: false,
            part: None,
            is_video: true,
            is_dir: false,
            is_tv_show: false,
            size_bytes,
            extras: Vec::new(),
            ignored: None,
        }
    }

    /// Create a catalog record.
    pub fn record(id: u64, title: &str, year: Option<u32>, popularity: f64) -> CatalogRecord {
        CatalogRecord {
            id,
            title: title.to_string(),
            original_title: None,
            year,
            popularity,
        }
    }

    /// An unresolved film named from its descriptor.
    pub fn resolved(descriptor: FilmDescriptor) -> ResolvedFilm {
        let resolution = if descriptor.year.is_some() {
            Resolution::NoMatch
        } else {
            Resolution::Skipped(SkipReason::NoYear)
        };
        ResolvedFilm::unresolved(descriptor, resolution)
    }

    pub fn video(path: &str, size_bytes: u64, part: Option<u32>) -> VideoFile {
        VideoFile {
            path: PathBuf::from(path),
            size_bytes,
            part,
        }
    }

    /// A configuration organizing `source` into the single root `destination`,
    /// with no size minimums and no catalog or Plex settings.
    pub fn config_for(source: &Path, destination: &Path) -> Config {
        Config {
            sources: vec![source.to_path_buf()],
            destinations: DestinationsConfig {
                default: Some(destination.to_path_buf()),
                tiers: QualityMap::default(),
            },
            rename: RenameConfig::default(),
            parser: ParserConfig::default(),
            min_filesize: QualityMap::default(),
            lookup: LookupConfig::default(),
            tmdb: None,
            duplicates: DuplicatesConfig::default(),
            transfer: TransferConfig::default(),
            plex: None,
            run: RunConfig::default(),
        }
    }
}
