//! Media library notification.
//!
//! After a run places films, the configured library sections are asked to
//! rescan. Notification is fire-and-forget: failures are logged by the
//! caller and never fail the run.

mod plex;

pub use plex::PlexNotifier;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from library notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notifier not configured: {0}")]
    NotConfigured(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Unknown library section: {0}")]
    UnknownSection(String),

    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for NotifyError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NotifyError::Timeout
        } else {
            NotifyError::Http(e.to_string())
        }
    }
}

/// Something that can be told to rescan library sections.
#[async_trait]
pub trait LibraryNotifier: Send + Sync {
    /// Name of the notifier, for logs.
    fn name(&self) -> &str;

    /// Refresh the given sections. Returns the sections actually refreshed.
    async fn notify(&self, sections: &[String]) -> Result<Vec<String>, NotifyError>;
}

/// Notifier used when no media server is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl LibraryNotifier for NoopNotifier {
    fn name(&self) -> &str {
        "none"
    }

    async fn notify(&self, _sections: &[String]) -> Result<Vec<String>, NotifyError> {
        Ok(Vec::new())
    }
}
