//! Types for the placer module.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Suffix of a copy that has not been verified and committed yet.
pub const PARTIAL_SUFFIX: &str = ".partial~";

/// Suffix of an existing file moved aside during the final rename.
pub const DUP_SUFFIX: &str = ".dup~";

/// What a planned file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Video,
    /// Subtitle or other file travelling with the film.
    Extra,
}

/// A single file to place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedFile {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub size_bytes: u64,
    pub kind: FileKind,
}

/// Where every file of a film goes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmPlan {
    /// Destination root the film is placed under.
    pub root: PathBuf,
    /// Folder receiving the film's files (the root itself without folders).
    pub directory: PathBuf,
    /// Video files first, largest first, then extras.
    pub files: Vec<PlannedFile>,
}

/// A placement job for one film.
#[derive(Debug, Clone)]
pub struct TransferJob {
    pub plan: FilmPlan,
    /// Existing duplicates to remove once the incoming files are committed.
    pub replace: Vec<PathBuf>,
    /// Overwrite an existing file at the destination path.
    pub force_overwrite: bool,
}

impl TransferJob {
    /// Whether an existing file at `destination` may be replaced.
    pub fn may_overwrite(&self, destination: &Path) -> bool {
        self.force_overwrite || self.replace.iter().any(|p| p == destination)
    }
}

/// Final status of a single file transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Moved,
    Copied,
    Skipped,
    Failed,
}

/// Why a transfer was skipped or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferIssue {
    SourceMissing,
    SamePath,
    DestinationExists,
    VerificationFailed,
    IoError,
    /// An earlier file of the same film failed.
    NotAttempted,
}

impl std::fmt::Display for TransferIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            TransferIssue::SourceMissing => "source missing",
            TransferIssue::SamePath => "source and destination are the same",
            TransferIssue::DestinationExists => "destination exists",
            TransferIssue::VerificationFailed => "verification failed",
            TransferIssue::IoError => "I/O error",
            TransferIssue::NotAttempted => "not attempted",
        };
        f.write_str(text)
    }
}

/// Outcome of placing one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferResult {
    pub status: TransferStatus,
    pub kind: FileKind,
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Test mode: nothing was changed on disk.
    pub as_if: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<TransferIssue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub size_bytes: u64,
}

impl TransferResult {
    pub(crate) fn new(file: &PlannedFile, status: TransferStatus, as_if: bool) -> Self {
        Self {
            status,
            kind: file.kind,
            source: file.source.clone(),
            destination: file.destination.clone(),
            as_if,
            issue: None,
            detail: None,
            size_bytes: file.size_bytes,
        }
    }

    pub(crate) fn with_issue(mut self, issue: TransferIssue, detail: Option<String>) -> Self {
        self.issue = Some(issue);
        self.detail = detail;
        self
    }

    pub fn is_transferred(&self) -> bool {
        matches!(self.status, TransferStatus::Moved | TransferStatus::Copied)
    }
}

/// Everything the placer did for one film.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilmTransfer {
    pub results: Vec<TransferResult>,
    /// Existing duplicates removed after the commit.
    pub replaced: Vec<PathBuf>,
}

impl FilmTransfer {
    fn videos(&self) -> impl Iterator<Item = &TransferResult> {
        self.results.iter().filter(|r| r.kind == FileKind::Video)
    }

    /// Every video file was moved or copied.
    pub fn all_videos_transferred(&self) -> bool {
        let mut videos = self.videos().peekable();
        videos.peek().is_some() && videos.all(|r| r.is_transferred())
    }

    pub fn any_video_failed(&self) -> bool {
        self.videos().any(|r| r.status == TransferStatus::Failed)
    }
}

/// Artifacts found in destination trees at the start of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    /// `.partial~` files removed.
    pub partials_removed: Vec<PathBuf>,
    /// `.dup~` files renamed back to their canonical path.
    pub dups_restored: Vec<PathBuf>,
    /// `.dup~` files left alone because the canonical path exists.
    pub dups_left: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planned(kind: FileKind) -> PlannedFile {
        PlannedFile {
            source: PathBuf::from("/src/heat.mkv"),
            destination: PathBuf::from("/dst/Heat (1995).mkv"),
            size_bytes: 10,
            kind,
        }
    }

    #[test]
    fn test_may_overwrite() {
        let job = TransferJob {
            plan: FilmPlan {
                root: PathBuf::from("/dst"),
                directory: PathBuf::from("/dst"),
                files: vec![planned(FileKind::Video)],
            },
            replace: vec![PathBuf::from("/dst/Heat (1995).mkv")],
            force_overwrite: false,
        };
        assert!(job.may_overwrite(Path::new("/dst/Heat (1995).mkv")));
        assert!(!job.may_overwrite(Path::new("/dst/Other.mkv")));
    }

    #[test]
    fn test_film_transfer_video_status() {
        let moved = TransferResult::new(&planned(FileKind::Video), TransferStatus::Moved, false);
        let extra_failed =
            TransferResult::new(&planned(FileKind::Extra), TransferStatus::Failed, false);
        let transfer = FilmTransfer {
            results: vec![moved, extra_failed],
            replaced: Vec::new(),
        };
        assert!(transfer.all_videos_transferred());
        assert!(!transfer.any_video_failed());
        assert!(!FilmTransfer::default().all_videos_transferred());
    }
}
