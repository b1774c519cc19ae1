//! Placer module for moving films into their destination folders.
//!
//! # Features
//!
//! - Atomic renames when source and destination share a filesystem
//! - Copy fallback through `<dest>.partial~` with size and optional checksum
//!   verification
//! - Existing files moved aside to `<dest>.dup~` during the final rename and
//!   restored on failure
//! - Replaced duplicates removed only after the incoming file is committed
//! - Sweeping of orphaned artifacts and cleanup of emptied source folders
//! - Test mode that reports what would happen without touching the disk
//!
//! # Example
//!
//! ```ignore
//! use filmsort_core::placer::{FsPlacer, TransferJob};
//!
//! let placer = FsPlacer::new(config.transfer.clone(), config.run.test);
//! let transfer = placer.execute(&TransferJob { plan, replace: vec![], force_overwrite: false }).await;
//! println!("{} files placed", transfer.results.iter().filter(|r| r.is_transferred()).count());
//! ```

mod error;
mod fs_placer;
mod types;

pub use error::PlacerError;
pub use fs_placer::{with_suffix, FsPlacer};
pub use types::{
    FileKind, FilmPlan, FilmTransfer, PlannedFile, SweepReport, TransferIssue, TransferJob,
    TransferResult, TransferStatus, DUP_SUFFIX, PARTIAL_SUFFIX,
};
