//! Error types for the placer module.

use std::path::PathBuf;
use thiserror::Error;

use super::types::TransferIssue;

/// Errors that can occur while placing a file.
#[derive(Debug, Error)]
pub enum PlacerError {
    /// Source file not found.
    #[error("Source file not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Failed to create destination directory.
    #[error("Failed to create directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to copy file.
    #[error("Failed to copy file from {source} to {destination}")]
    CopyFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to move/rename file.
    #[error("Failed to move file from {source} to {destination}")]
    MoveFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Copied size differs from the source.
    #[error("Size mismatch for {path}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// Checksum verification failed.
    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// Failed to calculate checksum.
    #[error("Failed to calculate checksum for {path}")]
    ChecksumCalculationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to delete a file or folder during cleanup.
    #[error("Failed to clean up {path}: {source}")]
    CleanupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlacerError {
    /// Creates a copy failed error.
    pub fn copy_failed(source: PathBuf, destination: PathBuf, error: std::io::Error) -> Self {
        Self::CopyFailed {
            source,
            destination,
            error,
        }
    }

    /// Creates a move failed error.
    pub fn move_failed(source: PathBuf, destination: PathBuf, error: std::io::Error) -> Self {
        Self::MoveFailed {
            source,
            destination,
            error,
        }
    }

    /// Reason code reported on the transfer result.
    pub fn issue(&self) -> TransferIssue {
        match self {
            Self::SourceNotFound { .. } => TransferIssue::SourceMissing,
            Self::SizeMismatch { .. } | Self::ChecksumMismatch { .. } => {
                TransferIssue::VerificationFailed
            }
            _ => TransferIssue::IoError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_mapping() {
        let err = PlacerError::SizeMismatch {
            path: PathBuf::from("/a"),
            expected: 2,
            actual: 1,
        };
        assert_eq!(err.issue(), TransferIssue::VerificationFailed);
        let err = PlacerError::SourceNotFound {
            path: PathBuf::from("/a"),
        };
        assert_eq!(err.issue(), TransferIssue::SourceMissing);
        let err = PlacerError::CleanupFailed {
            path: PathBuf::from("/films/Heat (1995).mkv"),
            source: std::io::Error::other("busy"),
        };
        assert_eq!(err.issue(), TransferIssue::IoError);
        assert_eq!(err.to_string(), "Failed to clean up /films/Heat (1995).mkv: busy");
        let err = PlacerError::Io(std::io::Error::other("boom"));
        assert_eq!(err.issue(), TransferIssue::IoError);
    }
}
