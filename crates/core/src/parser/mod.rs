//! Path descriptor parser.
//!
//! Turns a raw path (file or film folder) into a [`FilmDescriptor`] using
//! nothing but the path text and file sizes. Parsing never fails: a name the
//! heuristics cannot make sense of still yields a descriptor, titled with the
//! cleaned raw name and without a year.
//!
//! # Example
//!
//! ```ignore
//! use filmsort_core::parser::FilmParser;
//!
//! let parser = FilmParser::new(&config)?;
//! let parsed = parser.parse_name("The.Thing.1982.1080p.BluRay.x264");
//! assert_eq!(parsed.title, "The Thing");
//! assert_eq!(parsed.year, Some(1982));
//! ```

mod name;
mod patterns;
mod scan;
mod types;

pub use patterns::{MAX_YEAR, MIN_YEAR};
pub use types::{FilmDescriptor, IgnoreReason, VideoFile};

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::config::{Config, ParserConfig};
use crate::quality::{Media, Quality, QualityMap};
use patterns::Patterns;

/// Errors raised while building a parser.
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// OS and NAS housekeeping entries that are never films.
const SYSTEM_NAMES: &[&str] = &[".ds_store", "thumbs.db", "desktop.ini", "@eadir", ".appledouble"];

/// Everything that can be learned from a single name.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    pub title: String,
    pub year: Option<u32>,
    pub edition: Option<String>,
    pub quality: Quality,
    pub media: Media,
    pub hdr: bool,
    pub proper: bool,
    pub part: Option<u32>,
    pub is_tv_show: bool,
}

/// Parses names and paths into film descriptors.
#[derive(Debug)]
pub struct FilmParser {
    config: ParserConfig,
    /// Minimum sizes in MiB.
    min_filesize: QualityMap<u64>,
    patterns: Patterns,
}

impl FilmParser {
    pub fn new(config: &Config) -> Result<Self, ParserError> {
        Self::with_settings(config.parser.clone(), config.min_filesize.clone())
    }

    pub fn with_settings(
        config: ParserConfig,
        min_filesize: QualityMap<u64>,
    ) -> Result<Self, ParserError> {
        let patterns = Patterns::compile(&config)?;
        Ok(Self {
            config,
            min_filesize,
            patterns,
        })
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse a bare name (no extension handling, no filesystem access).
    pub fn parse_name(&self, raw: &str) -> ParsedName {
        let name = name::strip_prefix(raw.trim(), &self.config.strip_prefixes);

        let quality = self.patterns.quality(name);
        let media = self.patterns.media(name);
        let hdr = self.patterns.hdr(name);
        let proper = self.patterns.proper(name);
        let edition = self.patterns.edition(name);
        let tv = self.patterns.tv(name);

        let marker = [
            quality.map(|q| q.start),
            media.map(|m| m.start),
            edition.map(|e| e.start),
            hdr.map(|h| h.start),
            proper.map(|p| p.start),
        ]
        .into_iter()
        .flatten()
        .min();

        let year = self.patterns.year(name, marker);

        // With a year, part markers only count after it ("Part 2" before a
        // year belongs to the title).
        let part = match year {
            Some(y) => self.patterns.part(&name[y.end..]),
            None => self.patterns.part(name),
        };

        let title_end = match year {
            Some(y) => y.start,
            None => [marker, part.map(|p| p.start), tv]
                .into_iter()
                .flatten()
                .min()
                .unwrap_or(name.len()),
        };

        let raw_title = &name[..title_end];
        let edition_text = edition
            .filter(|e| e.end <= title_end)
            .map(|e| &name[e.start..e.end]);

        let mut title = name::clean_title(raw_title, edition_text, &self.config);
        if title.is_empty() {
            title = name::clean_title(name, None, &self.config);
        }

        let parsed = ParsedName {
            title,
            year: year.map(|y| y.value),
            edition: edition.map(|e| e.value.to_string()),
            quality: quality.map(|q| q.value).unwrap_or_default(),
            media: media.map(|m| m.value).unwrap_or_default(),
            hdr: hdr.is_some(),
            proper: proper.is_some(),
            part: part.map(|p| p.value),
            is_tv_show: tv.is_some(),
        };
        debug!(name = %raw, title = %parsed.title, year = ?parsed.year, "Parsed name");
        parsed
    }

    fn has_extension(&self, path: &Path, list: &[String]) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        list.iter()
            .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }

    pub fn is_video_path(&self, path: &Path) -> bool {
        self.has_extension(path, &self.config.video_exts)
    }

    pub fn is_extra_path(&self, path: &Path) -> bool {
        self.has_extension(path, &self.config.extra_exts)
    }

    /// Name contains a configured ignore marker.
    pub fn is_ignored_name(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.config
            .ignore_strings
            .iter()
            .any(|s| !s.is_empty() && lower.contains(&s.to_lowercase()))
    }

    pub fn is_system_name(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        SYSTEM_NAMES.contains(&lower.as_str()) || lower.starts_with("._")
    }

    /// Minimum size in bytes for the given tier.
    pub fn min_size_bytes(&self, quality: Quality) -> u64 {
        self.min_filesize.get(quality).saturating_mul(1024 * 1024)
    }

    /// Name used for parsing: file names lose known extensions only.
    fn parse_stem(&self, path: &Path) -> String {
        let file_name = file_name_lossy(path);
        if self.is_video_path(path) || self.is_extra_path(path) {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or(file_name)
        } else {
            file_name
        }
    }

    /// Parse a file or film folder.
    pub fn parse(&self, path: &Path) -> FilmDescriptor {
        let name = file_name_lossy(path);
        let is_dir = path.is_dir();

        if self.is_system_name(&name) {
            let parsed = self.parse_name(&name);
            return self.descriptor(
                path,
                parsed,
                is_dir,
                Vec::new(),
                Vec::new(),
                Some(IgnoreReason::SystemFile),
            );
        }

        if is_dir {
            self.parse_dir(path, &name)
        } else {
            self.parse_file(path)
        }
    }

    fn parse_file(&self, path: &Path) -> FilmDescriptor {
        let stem = self.parse_stem(path);
        let parsed = self.parse_name(&stem);
        let size_bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let is_video = self.is_video_path(path);

        let video_files = if is_video {
            vec![VideoFile {
                path: path.to_path_buf(),
                size_bytes,
                part: parsed.part,
            }]
        } else {
            Vec::new()
        };
        let extras = if is_video {
            scan::sibling_extras(self, path, &stem)
        } else {
            Vec::new()
        };

        let ignored = if self.is_ignored_name(&file_name_lossy(path)) {
            Some(IgnoreReason::IgnoredString)
        } else if !is_video {
            Some(IgnoreReason::NotVideo)
        } else if size_bytes < self.min_size_bytes(parsed.quality) {
            Some(IgnoreReason::TooSmall)
        } else if parsed.title.is_empty() {
            Some(IgnoreReason::Unparseable)
        } else {
            None
        };

        self.descriptor(path, parsed, false, video_files, extras, ignored)
    }

    fn parse_dir(&self, path: &Path, dir_name: &str) -> FilmDescriptor {
        let listing = scan::list_dir_media(self, path);
        let release = scan::release_files(self, &listing.videos);
        let folder = self.parse_name(dir_name);

        let Some(primary) = release.first() else {
            let ignored = if self.is_ignored_name(dir_name) {
                IgnoreReason::IgnoredString
            } else {
                IgnoreReason::NoVideoFiles
            };
            return self.descriptor(
                path,
                folder,
                true,
                Vec::new(),
                listing.extras,
                Some(ignored),
            );
        };

        let file = self.parse_name(&self.parse_stem(&primary.path));
        let parsed = merge_names(folder, file);
        let primary_size = primary.size_bytes;

        let ignored = if self.is_ignored_name(dir_name) {
            Some(IgnoreReason::IgnoredString)
        } else if primary_size < self.min_size_bytes(parsed.quality) {
            Some(IgnoreReason::TooSmall)
        } else if parsed.title.is_empty() {
            Some(IgnoreReason::Unparseable)
        } else {
            None
        };

        self.descriptor(path, parsed, true, release, listing.extras, ignored)
    }

    fn descriptor(
        &self,
        path: &Path,
        parsed: ParsedName,
        is_dir: bool,
        video_files: Vec<VideoFile>,
        extras: Vec<PathBuf>,
        ignored: Option<IgnoreReason>,
    ) -> FilmDescriptor {
        let ignored =
            ignored.or_else(|| parsed.title.is_empty().then_some(IgnoreReason::Unparseable));
        let title = if parsed.title.is_empty() {
            file_name_lossy(path)
        } else {
            parsed.title
        };
        FilmDescriptor {
            path: path.to_path_buf(),
            title,
            year: parsed.year,
            edition: parsed.edition,
            quality: parsed.quality,
            media: parsed.media,
            hdr: parsed.hdr,
            proper: parsed.proper,
            part: if is_dir { None } else { parsed.part },
            is_video: !video_files.is_empty(),
            is_dir,
            is_tv_show: parsed.is_tv_show,
            size_bytes: video_files.iter().map(|f| f.size_bytes).sum(),
            video_files,
            extras,
            ignored,
        }
    }

    /// Discover candidate film roots under the given source trees.
    pub fn discover(&self, sources: &[PathBuf]) -> Vec<PathBuf> {
        scan::discover(self, sources)
    }

    /// Identity of a video already in a destination tree. The file name is
    /// completed from its folder name unless the folder is the root.
    pub fn parse_existing(&self, path: &Path, root: &Path) -> ParsedName {
        let file = self.parse_name(&self.parse_stem(path));
        let part = file.part;
        match path.parent() {
            Some(parent) if parent != root => {
                let mut merged = merge_names(self.parse_name(&file_name_lossy(parent)), file);
                merged.part = part;
                merged
            }
            _ => file,
        }
    }
}

/// Combine what a folder name and its primary file name say.
///
/// The folder is authoritative when it carries a year or quality; otherwise
/// the file name is. Gaps are filled from the other side.
fn merge_names(folder: ParsedName, file: ParsedName) -> ParsedName {
    let folder_first = folder.year.is_some() || folder.quality != Quality::Unknown;
    let (mut base, other) = if folder_first { (folder, file) } else { (file, folder) };

    if base.year.is_none() {
        base.year = other.year;
    }
    if base.quality == Quality::Unknown {
        base.quality = other.quality;
    }
    if base.media == Media::Unknown {
        base.media = other.media;
    }
    if base.edition.is_none() {
        base.edition = other.edition;
    }
    base.hdr = base.hdr || other.hdr;
    base.proper = base.proper || other.proper;
    base.is_tv_show = base.is_tv_show || other.is_tv_show;
    if base.title.is_empty() {
        base.title = other.title;
    }
    base
}

pub(crate) fn file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
