use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::quality::{Quality, QualityMap};

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Source trees scanned for films.
    pub sources: Vec<PathBuf>,
    pub destinations: DestinationsConfig,
    #[serde(default)]
    pub rename: RenameConfig,
    #[serde(default)]
    pub parser: ParserConfig,
    /// Minimum file size per tier, in MiB.
    #[serde(default)]
    pub min_filesize: QualityMap<u64>,
    #[serde(default)]
    pub lookup: LookupConfig,
    #[serde(default)]
    pub tmdb: Option<TmdbConfig>,
    #[serde(default)]
    pub duplicates: DuplicatesConfig,
    #[serde(default)]
    pub transfer: TransferConfig,
    #[serde(default)]
    pub plex: Option<PlexConfig>,
    #[serde(default)]
    pub run: RunConfig,
}

impl Config {
    /// Minimum size in bytes for a film of the given quality.
    pub fn min_size_bytes(&self, quality: Quality) -> u64 {
        self.min_filesize.get(quality).saturating_mul(1024 * 1024)
    }
}

/// Destination roots per quality tier.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DestinationsConfig {
    /// Fallback for tiers without their own destination.
    #[serde(default)]
    pub default: Option<PathBuf>,
    #[serde(flatten)]
    pub tiers: QualityMap<Option<PathBuf>>,
}

impl DestinationsConfig {
    /// Destination root for a film of the given quality.
    pub fn for_quality(&self, quality: Quality) -> Option<&Path> {
        self.tiers
            .get(quality)
            .as_deref()
            .or(self.default.as_deref())
    }

    /// All distinct destination roots.
    pub fn roots(&self) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = Vec::new();
        let candidates = [
            self.tiers.sd.as_ref(),
            self.tiers.hd720.as_ref(),
            self.tiers.hd1080.as_ref(),
            self.tiers.uhd2160.as_ref(),
            self.default.as_ref(),
        ];
        for path in candidates.into_iter().flatten() {
            if !roots.contains(path) {
                roots.push(path.clone());
            }
        }
        roots
    }
}

/// Naming templates.
///
/// Tokens are written in braces; any other characters inside the braces are
/// only emitted when the token has a value, e.g. `{(year)}` or `{ - edition}`.
/// Available tokens: `title`, `title-the`, `year`, `edition`, `quality`,
/// `media`, `proper`, `hdr`, `part`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenameConfig {
    #[serde(default = "default_file_pattern")]
    pub file_pattern: String,
    #[serde(default = "default_folder_pattern")]
    pub folder_pattern: String,
    /// Place each film in its own folder.
    #[serde(default = "default_true")]
    pub use_folders: bool,
    /// Rename films where they are instead of filing them into the
    /// destinations. Duplicate checking is off in this mode.
    #[serde(default)]
    pub rename_only: bool,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            file_pattern: default_file_pattern(),
            folder_pattern: default_folder_pattern(),
            use_folders: true,
            rename_only: false,
        }
    }
}

fn default_file_pattern() -> String {
    "{title} {(year)} {[edition]} {media-}{quality} {proper} {hdr} {part}".to_string()
}

fn default_folder_pattern() -> String {
    "{title} {(year)}".to_string()
}

/// An ordered edition rule: `pattern` is matched case-insensitively at word
/// boundaries, the first matching rule wins.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EditionRule {
    pub pattern: String,
    pub name: String,
}

impl EditionRule {
    fn new(pattern: &str, name: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            name: name.to_string(),
        }
    }
}

/// Path parsing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ParserConfig {
    #[serde(default = "default_video_exts")]
    pub video_exts: Vec<String>,
    /// Files that travel with a film (subtitles etc).
    #[serde(default = "default_extra_exts")]
    pub extra_exts: Vec<String>,
    /// Names containing any of these markers are ignored.
    #[serde(default = "default_ignore_strings")]
    pub ignore_strings: Vec<String>,
    /// Release-group tags stripped from the start of a name.
    #[serde(default = "default_strip_prefixes")]
    pub strip_prefixes: Vec<String>,
    /// Dotted tokens kept verbatim, e.g. `S.W.A.T.`.
    #[serde(default = "default_keep_period")]
    pub keep_period: Vec<String>,
    #[serde(default = "default_always_upper")]
    pub always_upper: Vec<String>,
    #[serde(default = "default_always_lower")]
    pub always_lower: Vec<String>,
    #[serde(default = "default_editions")]
    pub editions: Vec<EditionRule>,
    /// Video files at least this fraction of the largest file in a folder
    /// belong to the same release.
    #[serde(default = "default_multi_file_ratio")]
    pub multi_file_ratio: f64,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            video_exts: default_video_exts(),
            extra_exts: default_extra_exts(),
            ignore_strings: default_ignore_strings(),
            strip_prefixes: default_strip_prefixes(),
            keep_period: default_keep_period(),
            always_upper: default_always_upper(),
            always_lower: default_always_lower(),
            editions: default_editions(),
            multi_file_ratio: default_multi_file_ratio(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_video_exts() -> Vec<String> {
    strings(&[".mkv", ".mp4", ".m4v", ".avi"])
}

fn default_extra_exts() -> Vec<String> {
    strings(&[".srt", ".sub", ".idx"])
}

fn default_ignore_strings() -> Vec<String> {
    strings(&["sample", "@eaDir", "_UNPACK_", "_FAILED_"])
}

fn default_strip_prefixes() -> Vec<String> {
    strings(&["[ www.Speed.cd ] - ", "[ www.torrenting.com ] - ", "www.torrenting.com - "])
}

fn default_keep_period() -> Vec<String> {
    strings(&["S.W.A.T.", "L.A.", "D.C.", "E.T.", "U.S.", "O.C."])
}

fn default_always_upper() -> Vec<String> {
    strings(&["II", "III", "IV", "VI", "VII", "VIII", "IX", "XI", "XII", "XIII", "XIV", "XV", "XVI", "JFK", "OSS", "UK", "USA", "FBI", "CIA", "DOA", "THX", "TRON", "NYC", "3D"])
}

fn default_always_lower() -> Vec<String> {
    strings(&["a", "an", "and", "as", "at", "but", "by", "for", "from", "in", "into", "nor", "of", "on", "or", "the", "to", "vs", "with"])
}

fn default_editions() -> Vec<EditionRule> {
    vec![
        EditionRule::new(r"extended[\s._-]*director'?[\s._-]?s[\s._-]*cut", "Extended Director's Cut"),
        EditionRule::new(r"special[\s._-]*edition", "Special Edition"),
        EditionRule::new(r"director'?[\s._-]?s[\s._-]*cut", "Director's Cut"),
        EditionRule::new(r"collector'?[\s._-]?s[\s._-]*edition", "Collector's Edition"),
        EditionRule::new(r"theatrical[\s._-]*cut", "Theatrical Cut"),
        EditionRule::new(r"ultimate[\s._-]*edition", "Ultimate Edition"),
        EditionRule::new(r"final[\s._-]*cut", "Final Cut"),
        EditionRule::new(r"unrated", "Unrated"),
        EditionRule::new(r"remastered", "Remastered"),
        EditionRule::new(r"extended", "Extended"),
        EditionRule::new(r"imax", "IMAX"),
        EditionRule::new(r"criterion", "Criterion"),
    ]
}

fn default_multi_file_ratio() -> f64 {
    0.5
}

/// Catalog lookup thresholds.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LookupConfig {
    /// Reject candidates below `min_title_similarity`.
    #[serde(default = "default_true")]
    pub strict: bool,
    #[serde(default = "default_min_title_similarity")]
    pub min_title_similarity: f64,
    #[serde(default = "default_max_year_diff")]
    pub max_year_diff: u32,
    #[serde(default)]
    pub min_popularity: f64,
    /// Look up films without a year or that look like TV shows.
    #[serde(default)]
    pub force_lookup: bool,
    /// Ask the operator to confirm matches and duplicate actions.
    #[serde(default)]
    pub interactive: bool,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// 0 disables pacing.
    #[serde(default)]
    pub requests_per_minute: u32,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            strict: true,
            min_title_similarity: default_min_title_similarity(),
            max_year_diff: default_max_year_diff(),
            min_popularity: 0.0,
            force_lookup: false,
            interactive: false,
            max_concurrent: default_max_concurrent(),
            requests_per_minute: 0,
        }
    }
}

fn default_min_title_similarity() -> f64 {
    0.5
}

fn default_max_year_diff() -> u32 {
    1
}

fn default_max_concurrent() -> usize {
    4
}

/// TMDB catalog configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TmdbConfig {
    pub api_key: String,
    /// Base URL (default: https://api.themoviedb.org/3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

/// Duplicate detection and upgrade policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DuplicatesConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Replace identically named files at the destination.
    #[serde(default)]
    pub force_overwrite: bool,
    /// Treat different editions of a film as duplicates.
    #[serde(default)]
    pub ignore_edition: bool,
    /// Incoming files smaller than the existing one by more than this win
    /// an equal-tier, equal-media comparison.
    #[serde(default)]
    pub size_tolerance_bytes: u64,
    /// Tiers each existing tier may be upgraded to.
    #[serde(default = "default_upgrade_table")]
    pub upgrade_table: QualityMap<Vec<Quality>>,
}

impl Default for DuplicatesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            force_overwrite: false,
            ignore_edition: false,
            size_tolerance_bytes: 0,
            upgrade_table: default_upgrade_table(),
        }
    }
}

fn default_upgrade_table() -> QualityMap<Vec<Quality>> {
    QualityMap {
        sd: vec![Quality::Hd720, Quality::Hd1080, Quality::Uhd2160],
        hd720: vec![Quality::Hd1080, Quality::Uhd2160],
        hd1080: Vec::new(),
        uhd2160: Vec::new(),
    }
}

/// Checksum algorithm for copy verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumType {
    Sha256,
    Md5,
}

/// Transfer behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransferConfig {
    /// Copy and verify even when a rename would do. The source is removed
    /// once the copy is committed.
    #[serde(default)]
    pub always_copy: bool,
    /// Verify copies with a checksum in addition to the size check.
    #[serde(default)]
    pub verify_checksum: Option<ChecksumType>,
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    /// Delete non-media leftovers from a film folder once its videos moved.
    #[serde(default = "default_true")]
    pub remove_unwanted_files: bool,
    #[serde(default = "default_true")]
    pub cleanup_empty_dirs: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            always_copy: false,
            verify_checksum: None,
            buffer_size: default_buffer_size(),
            remove_unwanted_files: true,
            cleanup_empty_dirs: true,
        }
    }
}

fn default_buffer_size() -> usize {
    8 * 1024 * 1024 // 8 MB
}

/// Plex library notification
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlexConfig {
    /// Plex server URL (e.g., "http://localhost:32400")
    pub base_url: String,
    pub token: String,
    /// Library sections (by name or id) refreshed after films of a tier
    /// were placed.
    #[serde(default)]
    pub sections: PlexSections,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

/// Plex library section per quality tier.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlexSections {
    #[serde(default)]
    pub default: Option<String>,
    #[serde(flatten)]
    pub tiers: QualityMap<Option<String>>,
}

impl PlexSections {
    /// Section to refresh for a film of the given quality.
    pub fn for_quality(&self, quality: Quality) -> Option<&str> {
        self.tiers
            .get(quality)
            .as_deref()
            .or(self.default.as_deref())
    }
}

/// Per-run switches, usually set from the command line.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RunConfig {
    /// Go through the motions without touching the filesystem.
    #[serde(default)]
    pub test: bool,
    #[serde(default)]
    pub debug: bool,
    /// Suppress notifications.
    #[serde(default)]
    pub quiet: bool,
    /// Process at most this many films (0 = all).
    #[serde(default)]
    pub limit: usize,
}

fn default_true() -> bool {
    true
}

/// Sanitized config for display (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub sources: Vec<PathBuf>,
    pub destinations: DestinationsConfig,
    pub rename: RenameConfig,
    pub lookup: LookupConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb: Option<SanitizedTmdbConfig>,
    pub duplicates: DuplicatesConfig,
    pub transfer: TransferConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plex: Option<SanitizedPlexConfig>,
    pub run: RunConfig,
}

/// Sanitized TMDB config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTmdbConfig {
    pub base_url: Option<String>,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
}

/// Sanitized Plex config (token hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedPlexConfig {
    pub base_url: String,
    pub token_configured: bool,
    pub sections: PlexSections,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            sources: config.sources.clone(),
            destinations: config.destinations.clone(),
            rename: config.rename.clone(),
            lookup: config.lookup.clone(),
            tmdb: config.tmdb.as_ref().map(|t| SanitizedTmdbConfig {
                base_url: t.base_url.clone(),
                api_key_configured: !t.api_key.is_empty(),
                timeout_secs: t.timeout_secs,
            }),
            duplicates: config.duplicates.clone(),
            transfer: config.transfer.clone(),
            plex: config.plex.as_ref().map(|p| SanitizedPlexConfig {
                base_url: p.base_url.clone(),
                token_configured: !p.token.is_empty(),
                sections: p.sections.clone(),
            }),
            run: config.run.clone(),
        }
    }
}
