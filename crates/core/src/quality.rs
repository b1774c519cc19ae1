//! Resolution tiers and media sources.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Resolution tier of a release.
///
/// `Unknown` behaves as `Sd` wherever a per-tier table is consulted
/// (destination, minimum size, upgrade table), see [`Quality::tier`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Quality {
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
    #[serde(rename = "SD", alias = "sd")]
    Sd,
    #[serde(rename = "720p")]
    Hd720,
    #[serde(rename = "1080p")]
    Hd1080,
    #[serde(rename = "2160p")]
    Uhd2160,
}

impl Quality {
    /// The tier used for table lookups and comparisons.
    pub fn tier(self) -> Quality {
        match self {
            Quality::Unknown => Quality::Sd,
            other => other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Quality::Unknown => "unknown",
            Quality::Sd => "SD",
            Quality::Hd720 => "720p",
            Quality::Hd1080 => "1080p",
            Quality::Uhd2160 => "2160p",
        }
    }

    /// Label rendered into file names; unknown renders as nothing.
    pub fn label(self) -> Option<&'static str> {
        match self {
            Quality::Unknown => None,
            other => Some(other.as_str()),
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sd" | "576p" | "480p" => Ok(Quality::Sd),
            "720p" | "720" => Ok(Quality::Hd720),
            "1080p" | "1080" | "1080i" => Ok(Quality::Hd1080),
            "2160p" | "2160" | "4k" | "uhd" => Ok(Quality::Uhd2160),
            "unknown" | "" => Ok(Quality::Unknown),
            other => Err(format!("unknown quality: {}", other)),
        }
    }
}

/// Media source of a release.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Media {
    #[serde(rename = "Bluray")]
    Bluray,
    #[serde(rename = "WEB-DL")]
    WebDl,
    #[serde(rename = "HDTV")]
    Hdtv,
    #[serde(rename = "DVD")]
    Dvd,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl Media {
    /// Rank used by the upgrade decision: Bluray > WEB-DL > HDTV > DVD > unknown.
    pub fn rank(self) -> u8 {
        match self {
            Media::Bluray => 4,
            Media::WebDl => 3,
            Media::Hdtv => 2,
            Media::Dvd => 1,
            Media::Unknown => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Media::Bluray => "Bluray",
            Media::WebDl => "WEB-DL",
            Media::Hdtv => "HDTV",
            Media::Dvd => "DVD",
            Media::Unknown => "unknown",
        }
    }

    pub fn label(self) -> Option<&'static str> {
        match self {
            Media::Unknown => None,
            other => Some(other.as_str()),
        }
    }
}

impl fmt::Display for Media {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value per resolution tier, keyed in TOML as `SD`, `720p`, `1080p`, `2160p`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityMap<T> {
    #[serde(rename = "SD", alias = "sd", default)]
    pub sd: T,
    #[serde(rename = "720p", alias = "hd720", default)]
    pub hd720: T,
    #[serde(rename = "1080p", alias = "hd1080", default)]
    pub hd1080: T,
    #[serde(rename = "2160p", alias = "uhd2160", default)]
    pub uhd2160: T,
}

impl<T> QualityMap<T> {
    /// Value for the tier of `quality` (unknown reads the SD entry).
    pub fn get(&self, quality: Quality) -> &T {
        match quality.tier() {
            Quality::Hd720 => &self.hd720,
            Quality::Hd1080 => &self.hd1080,
            Quality::Uhd2160 => &self.uhd2160,
            _ => &self.sd,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_quality_uses_sd_tier() {
        assert_eq!(Quality::Unknown.tier(), Quality::Sd);
        assert!(Quality::Hd1080.tier() > Quality::Hd720.tier());
        assert!(Quality::Unknown.tier() < Quality::Hd720);
    }

    #[test]
    fn test_media_rank_order() {
        assert!(Media::Bluray.rank() > Media::WebDl.rank());
        assert!(Media::WebDl.rank() > Media::Hdtv.rank());
        assert!(Media::Hdtv.rank() > Media::Dvd.rank());
        assert!(Media::Dvd.rank() > Media::Unknown.rank());
    }

    #[test]
    fn test_quality_from_str() {
        assert_eq!("4K".parse::<Quality>().unwrap(), Quality::Uhd2160);
        assert_eq!("480p".parse::<Quality>().unwrap(), Quality::Sd);
        assert!("8k".parse::<Quality>().is_err());
    }

    #[test]
    fn test_quality_map_lookup() {
        let map = QualityMap {
            sd: 1,
            hd720: 2,
            hd1080: 3,
            uhd2160: 4,
        };
        assert_eq!(*map.get(Quality::Unknown), 1);
        assert_eq!(*map.get(Quality::Hd1080), 3);
    }

    #[test]
    fn test_quality_map_deserializes_tier_keys() {
        let map: QualityMap<Vec<Quality>> = toml::from_str(
            r#"
"SD" = ["720p", "1080p"]
"720p" = ["1080p"]
"#,
        )
        .unwrap();
        assert_eq!(map.sd, vec![Quality::Hd720, Quality::Hd1080]);
        assert!(map.hd1080.is_empty());
    }
}
