//! Mock library notifier for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::notify::{LibraryNotifier, NotifyError};

/// Notifier that records every call.
#[derive(Debug, Default)]
pub struct MockNotifier {
    calls: Arc<RwLock<Vec<Vec<String>>>>,
    next_error: Arc<RwLock<Option<NotifyError>>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sections passed to each `notify` call, in call order.
    pub async fn calls(&self) -> Vec<Vec<String>> {
        self.calls.read().await.clone()
    }

    /// Set an error to be returned on the next call.
    pub async fn set_next_error(&self, error: NotifyError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl LibraryNotifier for MockNotifier {
    fn name(&self) -> &str {
        "mock"
    }

    async fn notify(&self, sections: &[String]) -> Result<Vec<String>, NotifyError> {
        self.calls.write().await.push(sections.to_vec());
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        Ok(sections.to_vec())
    }
}
