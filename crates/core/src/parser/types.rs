//! Film descriptor types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::quality::{Media, Quality};

/// Why a path never proceeds past parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// Name contains a configured ignore marker (e.g. `sample`).
    IgnoredString,
    /// OS or NAS housekeeping entry.
    SystemFile,
    /// File extension is not in the video allow-list.
    NotVideo,
    /// Directory without any qualifying video file.
    NoVideoFiles,
    /// Smaller than the minimum size for its tier.
    TooSmall,
    /// Nothing resembling a title could be extracted.
    Unparseable,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            IgnoreReason::IgnoredString => "name contains an ignored string",
            IgnoreReason::SystemFile => "system file",
            IgnoreReason::NotVideo => "not a video file",
            IgnoreReason::NoVideoFiles => "no video files found",
            IgnoreReason::TooSmall => "file is below the minimum size",
            IgnoreReason::Unparseable => "could not determine a title",
        };
        f.write_str(text)
    }
}

/// A video file belonging to a film.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoFile {
    pub path: PathBuf,
    pub size_bytes: u64,
    /// Part index for multi-file releases (`cd1`, `part2`, ...).
    pub part: Option<u32>,
}

/// Identity of a film derived from its path text and size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmDescriptor {
    /// The file or folder this film was discovered as.
    pub path: PathBuf,
    pub title: String,
    pub year: Option<u32>,
    pub edition: Option<String>,
    pub quality: Quality,
    pub media: Media,
    pub hdr: bool,
    /// Released as a `PROPER` fix of an earlier release.
    pub proper: bool,
    pub part: Option<u32>,
    pub is_video: bool,
    pub is_dir: bool,
    pub is_tv_show: bool,
    /// Total size of the release's video files.
    pub size_bytes: u64,
    /// Video files that make up the release, largest first.
    pub video_files: Vec<VideoFile>,
    /// Subtitles and other files that travel with the film.
    pub extras: Vec<PathBuf>,
    pub ignored: Option<IgnoreReason>,
}

impl FilmDescriptor {
    pub fn is_ignored(&self) -> bool {
        self.ignored.is_some()
    }

    /// The largest video file, if any.
    pub fn primary_file(&self) -> Option<&VideoFile> {
        self.video_files.first()
    }

    /// Short human readable identity, e.g. `Heat (1995) [1080p Bluray]`.
    pub fn display_name(&self) -> String {
        let mut name = self.title.clone();
        if let Some(year) = self.year {
            name.push_str(&format!(" ({})", year));
        }
        name.push_str(&format!(" [{} {}]", self.quality, self.media));
        name
    }
}
