//! Types for the processor module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use crate::catalog::{CatalogMatch, Resolution};
use crate::placer::{SweepReport, TransferResult};
use crate::quality::Quality;

/// Terminal status of a film in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilmStatus {
    Moved,
    Copied,
    /// Left in place: duplicate verdict, reviewer, destination exists, abort.
    Skipped,
    /// Never a film: see the descriptor's ignore reason.
    Ignored,
    Failed,
}

impl FilmStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilmStatus::Moved => "moved",
            FilmStatus::Copied => "copied",
            FilmStatus::Skipped => "skipped",
            FilmStatus::Ignored => "ignored",
            FilmStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for FilmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one discovered film.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilmOutcome {
    /// Path the film was discovered at.
    pub path: PathBuf,
    /// Display name, e.g. `Heat (1995) [1080p Bluray]`.
    pub title: String,
    pub status: FilmStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<Quality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched: Option<CatalogMatch>,
    /// Folder the film was (or would be) placed in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transfers: Vec<TransferResult>,
    /// Existing copies removed in favour of this film.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replaced: Vec<PathBuf>,
}

impl FilmOutcome {
    pub(crate) fn new(path: PathBuf, title: String, status: FilmStatus) -> Self {
        Self {
            path,
            title,
            status,
            reason: None,
            quality: None,
            resolution: None,
            matched: None,
            destination: None,
            transfers: Vec::new(),
            replaced: Vec::new(),
        }
    }

    pub(crate) fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// A non-fatal error attached to a film.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmError {
    pub path: PathBuf,
    pub message: String,
}

/// Everything a run did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Nothing was changed on disk.
    pub test_mode: bool,
    /// One entry per discovered film, in discovery order.
    pub outcomes: Vec<FilmOutcome>,
    /// Artifacts found in the destination trees at the start of the run.
    pub sweep: SweepReport,
    pub sections_notified: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_error: Option<String>,
    pub errors: Vec<FilmError>,
    /// Empty source folders removed after the run.
    pub empty_dirs_removed: usize,
    /// Whether the run was aborted before every film was handled.
    pub aborted: bool,
}

impl RunReport {
    pub(crate) fn start(test_mode: bool) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            started_at: now,
            finished_at: now,
            test_mode,
            outcomes: Vec::new(),
            sweep: SweepReport::default(),
            sections_notified: Vec::new(),
            notify_error: None,
            errors: Vec::new(),
            empty_dirs_removed: 0,
            aborted: false,
        }
    }

    /// Number of films with the given status.
    pub fn count(&self, status: FilmStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    /// Films that were moved or copied.
    pub fn transferred(&self) -> usize {
        self.count(FilmStatus::Moved) + self.count(FilmStatus::Copied)
    }

    pub fn outcome_for(&self, path: &std::path::Path) -> Option<&FilmOutcome> {
        self.outcomes.iter().find(|o| o.path == path)
    }

    /// One-line summary, e.g. `3 moved, 0 copied, 1 skipped, 2 ignored, 0 failed`.
    pub fn summary(&self) -> String {
        [
            FilmStatus::Moved,
            FilmStatus::Copied,
            FilmStatus::Skipped,
            FilmStatus::Ignored,
            FilmStatus::Failed,
        ]
        .iter()
        .map(|s| format!("{} {}", self.count(*s), s))
        .collect::<Vec<_>>()
        .join(", ")
    }
}
