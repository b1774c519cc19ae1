use regex_lite::Regex;

use super::{types::Config, ConfigError};

/// Validate configuration
///
/// Rejects anything that would make a run unsafe or ambiguous. Nothing is
/// processed when this fails.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.sources.is_empty() {
        return Err(invalid("at least one source is required"));
    }

    let tiers = &config.destinations.tiers;
    let all_tiers_set = tiers.sd.is_some()
        && tiers.hd720.is_some()
        && tiers.hd1080.is_some()
        && tiers.uhd2160.is_some();
    if config.destinations.default.is_none() && !all_tiers_set && !config.rename.rename_only {
        return Err(invalid(
            "destinations.default is required unless every quality tier has a destination",
        ));
    }

    for source in &config.sources {
        if config.destinations.roots().iter().any(|d| d == source) {
            return Err(invalid(&format!(
                "source {} is also a destination",
                source.display()
            )));
        }
    }

    let lookup = &config.lookup;
    if !(0.0..=1.0).contains(&lookup.min_title_similarity) {
        return Err(invalid("lookup.min_title_similarity must be between 0 and 1"));
    }
    if !lookup.min_popularity.is_finite() || lookup.min_popularity < 0.0 {
        return Err(invalid("lookup.min_popularity must be a non-negative number"));
    }
    if lookup.max_concurrent == 0 {
        return Err(invalid("lookup.max_concurrent cannot be 0"));
    }

    let ratio = config.parser.multi_file_ratio;
    if !(ratio > 0.0 && ratio <= 1.0) {
        return Err(invalid("parser.multi_file_ratio must be in (0, 1]"));
    }
    for rule in &config.parser.editions {
        if rule.name.trim().is_empty() {
            return Err(invalid(&format!(
                "edition pattern '{}' has an empty name",
                rule.pattern
            )));
        }
        Regex::new(&format!(r"(?i)\b(?:{})\b", rule.pattern)).map_err(|e| {
            invalid(&format!("edition pattern '{}' is invalid: {}", rule.pattern, e))
        })?;
    }

    if config.rename.file_pattern.trim().is_empty() {
        return Err(invalid("rename.file_pattern cannot be empty"));
    }
    if config.rename.use_folders && config.rename.folder_pattern.trim().is_empty() {
        return Err(invalid("rename.folder_pattern cannot be empty"));
    }

    if config.transfer.buffer_size == 0 {
        return Err(invalid("transfer.buffer_size cannot be 0"));
    }

    if let Some(tmdb) = &config.tmdb {
        if tmdb.api_key.trim().is_empty() {
            return Err(invalid("tmdb.api_key cannot be empty"));
        }
    }
    if let Some(plex) = &config.plex {
        if plex.base_url.trim().is_empty() {
            return Err(invalid("plex.base_url cannot be empty"));
        }
    }

    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}
