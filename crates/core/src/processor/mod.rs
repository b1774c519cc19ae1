//! Run driver.
//!
//! The [`FilmOrganizer`] owns a run from discovery to notification:
//! - discovery and parsing of the source trees
//! - concurrent catalog resolution, bounded by `lookup.max_concurrent`
//! - duplicate scanning, upgrade decisions and transfers, one film at a time
//!   against a single run-scoped destination state
//! - source cleanup and library notification
//!
//! # Example
//!
//! ```ignore
//! use filmsort_core::processor::FilmOrganizer;
//!
//! let organizer = FilmOrganizer::new(config, Some(catalog))?;
//! let control = organizer.control();
//! // control.abort() from a signal handler stops new lookups and transfers
//! let report = organizer.run().await?;
//! println!("{}", report.summary());
//! ```

mod organizer;
mod types;

pub use organizer::FilmOrganizer;
pub use types::{FilmError, FilmOutcome, FilmStatus, RunReport};

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::ConfigError;
use crate::parser::ParserError;

/// Errors that stop a run before any film is touched.
#[derive(Debug, thiserror::Error)]
pub enum OrganizeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Parser(#[from] ParserError),

    #[error("Destination root does not exist: {}", .0.display())]
    DestinationMissing(PathBuf),
}

/// Handle for stopping a run from outside.
///
/// Aborting stops new lookups and new transfers; a transfer already in
/// progress completes.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    aborted: Arc<AtomicBool>,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}
