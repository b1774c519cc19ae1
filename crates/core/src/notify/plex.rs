//! Plex Media Server library refresh.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{LibraryNotifier, NotifyError};
use crate::config::PlexConfig;

/// Plex notifier.
///
/// Sections may be configured by id or by title; titles are resolved once
/// through `/library/sections` and cached.
pub struct PlexNotifier {
    client: Client,
    base_url: String,
    token: String,
    section_keys: Arc<RwLock<Option<HashMap<String, String>>>>,
}

impl PlexNotifier {
    pub fn new(config: &PlexConfig) -> Result<Self, NotifyError> {
        if config.base_url.trim().is_empty() {
            return Err(NotifyError::NotConfigured(
                "Plex base URL is required".to_string(),
            ));
        }
        if config.token.trim().is_empty() {
            return Err(NotifyError::NotConfigured(
                "Plex token is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_secs)))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            section_keys: Arc::new(RwLock::new(None)),
        })
    }

    async fn get(&self, endpoint: &str) -> Result<reqwest::Response, NotifyError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(&[("X-Plex-Token", self.token.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 401 {
            return Err(NotifyError::AuthenticationFailed(
                "Invalid Plex token".to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::ApiError {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }
        Ok(response)
    }

    /// Section title (lowercased) and id, to key.
    async fn load_section_keys(&self) -> Result<HashMap<String, String>, NotifyError> {
        if let Some(keys) = self.section_keys.read().await.as_ref() {
            return Ok(keys.clone());
        }

        let listing: PlexSectionsResponse = self
            .get("/library/sections")
            .await?
            .json()
            .await
            .map_err(|e| NotifyError::Http(format!("Failed to parse sections: {}", e)))?;

        let keys = section_key_map(&listing.media_container.directories);
        debug!("Plex reports {} library section(s)", listing.media_container.directories.len());

        *self.section_keys.write().await = Some(keys.clone());
        Ok(keys)
    }
}

fn section_key_map(directories: &[PlexDirectory]) -> HashMap<String, String> {
    let mut keys = HashMap::new();
    for dir in directories {
        keys.insert(dir.key.clone(), dir.key.clone());
        keys.insert(dir.title.to_lowercase(), dir.key.clone());
    }
    keys
}

#[async_trait]
impl LibraryNotifier for PlexNotifier {
    fn name(&self) -> &str {
        "plex"
    }

    async fn notify(&self, sections: &[String]) -> Result<Vec<String>, NotifyError> {
        if sections.is_empty() {
            return Ok(Vec::new());
        }

        let keys = self.load_section_keys().await?;
        let mut refreshed = Vec::new();

        for section in sections {
            let key = keys
                .get(section)
                .or_else(|| keys.get(&section.to_lowercase()))
                .ok_or_else(|| NotifyError::UnknownSection(section.clone()))?;

            self.get(&format!(
                "/library/sections/{}/refresh",
                urlencoding::encode(key)
            ))
            .await?;

            info!("Requested Plex refresh of section '{}'", section);
            refreshed.push(section.clone());
        }

        Ok(refreshed)
    }
}

// ============================================================================
// Plex API response types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct PlexSectionsResponse {
    #[serde(rename = "MediaContainer")]
    media_container: PlexMediaContainer,
}

#[derive(Debug, Deserialize)]
struct PlexMediaContainer {
    #[serde(rename = "Directory", default)]
    directories: Vec<PlexDirectory>,
}

#[derive(Debug, Deserialize)]
struct PlexDirectory {
    key: String,
    title: String,
}
