//! Compiled token patterns and the year heuristic.

use regex_lite::Regex;

use super::ParserError;
use crate::config::ParserConfig;
use crate::quality::{Media, Quality};

const QUALITY: &str = r"(?i)(?:^|[^a-z0-9])(2160p|4k|uhd|1080[pi]?|720p?|576p|480p)(?:[^a-z0-9]|$)";
const MEDIA: &str = r"(?i)(?:^|[^a-z0-9])(?:(blu-?ray|bdremux|bdrip|brrip)|(web-?dl|webrip)|(hdtv)|(dvdrip|dvd))(?:[^a-z0-9]|$)";
const HDR: &str = r"(?i)(?:^|[^a-z0-9])(hdr10\+?|hdr|dolby[ ._-]?vision|dovi|dv)(?:[^a-z0-9]|$)";
const PROPER: &str = r"(?i)(?:^|[^a-z0-9])(proper)(?:[^a-z0-9]|$)";
const PART: &str = r"(?i)(?:^|[^a-z0-9])(?:cd|disc|disk|part|pt)[ ._-]?(\d{1,2})(?:[^a-z0-9]|$)";
const TV: &str = r"(?i)(?:^|[^a-z0-9])(?:s\d{1,2}[ ._-]?e\d{1,3}|\d{1,2}x\d{2})(?:[^a-z0-9]|$)";
const DIGITS: &str = r"\d+";

pub const MIN_YEAR: u32 = 1921;
pub const MAX_YEAR: u32 = 2159;

/// A token located in a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Located<T> {
    pub value: T,
    pub start: usize,
    pub end: usize,
}

/// Patterns compiled once per parser.
#[derive(Debug)]
pub struct Patterns {
    quality: Regex,
    media: Regex,
    hdr: Regex,
    proper: Regex,
    part: Regex,
    tv: Regex,
    digits: Regex,
    editions: Vec<(Regex, String)>,
}

fn compile(pattern: &str) -> Result<Regex, ParserError> {
    Regex::new(pattern).map_err(|e| ParserError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

impl Patterns {
    pub fn compile(config: &ParserConfig) -> Result<Self, ParserError> {
        let editions = config
            .editions
            .iter()
            .map(|rule| {
                compile(&format!(r"(?i)\b(?:{})\b", rule.pattern)).map(|rx| (rx, rule.name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            quality: compile(QUALITY)?,
            media: compile(MEDIA)?,
            hdr: compile(HDR)?,
            proper: compile(PROPER)?,
            part: compile(PART)?,
            tv: compile(TV)?,
            digits: compile(DIGITS)?,
            editions,
        })
    }

    pub fn quality(&self, name: &str) -> Option<Located<Quality>> {
        let caps = self.quality.captures(name)?;
        let token = caps.get(1)?;
        let value = match token.as_str().to_ascii_lowercase().as_str() {
            "2160p" | "4k" | "uhd" => Quality::Uhd2160,
            "576p" | "480p" => Quality::Sd,
            t if t.starts_with("1080") => Quality::Hd1080,
            t if t.starts_with("720") => Quality::Hd720,
            _ => Quality::Unknown,
        };
        Some(Located {
            value,
            start: token.start(),
            end: token.end(),
        })
    }

    pub fn media(&self, name: &str) -> Option<Located<Media>> {
        let caps = self.media.captures(name)?;
        let groups = [Media::Bluray, Media::WebDl, Media::Hdtv, Media::Dvd];
        groups.iter().enumerate().find_map(|(idx, media)| {
            caps.get(idx + 1).map(|m| Located {
                value: *media,
                start: m.start(),
                end: m.end(),
            })
        })
    }

    pub fn hdr(&self, name: &str) -> Option<Located<()>> {
        let caps = self.hdr.captures(name)?;
        let token = caps.get(1)?;
        Some(Located {
            value: (),
            start: token.start(),
            end: token.end(),
        })
    }

    /// A `PROPER` re-release marker.
    pub fn proper(&self, name: &str) -> Option<Located<()>> {
        let token = self.proper.captures(name)?.get(1)?;
        Some(Located {
            value: (),
            start: token.start(),
            end: token.end(),
        })
    }

    pub fn part(&self, name: &str) -> Option<Located<u32>> {
        let caps = self.part.captures(name)?;
        let whole = caps.get(0)?;
        let value = caps.get(1)?.as_str().parse().ok()?;
        Some(Located {
            value,
            start: whole.start(),
            end: whole.end(),
        })
    }

    /// Offset of an episode marker (`S01E02`, `1x02`), if any.
    pub fn tv(&self, name: &str) -> Option<usize> {
        self.tv.find(name).map(|m| m.start())
    }

    /// First edition rule (in declaration order) that matches.
    pub fn edition(&self, name: &str) -> Option<Located<&str>> {
        self.editions.iter().find_map(|(rx, edition)| {
            rx.find(name).map(|m| Located {
                value: edition.as_str(),
                start: m.start(),
                end: m.end(),
            })
        })
    }

    /// All plausible release years in `name`, in order of appearance.
    ///
    /// A year is a standalone run of exactly four digits within
    /// [`MIN_YEAR`]..=[`MAX_YEAR`] that does not open the name and is not
    /// glued to a letter (`BT2020`, `2010s`).
    pub fn year_candidates(&self, name: &str) -> Vec<Located<u32>> {
        let bytes = name.as_bytes();
        self.digits
            .find_iter(name)
            .filter(|m| m.len() == 4 && m.start() > 0)
            .filter(|m| !bytes[m.start() - 1].is_ascii_alphabetic())
            .filter(|m| bytes.get(m.end()).map_or(true, |b| !b.is_ascii_alphabetic()))
            .filter_map(|m| {
                let value: u32 = m.as_str().parse().ok()?;
                (MIN_YEAR..=MAX_YEAR).contains(&value).then_some(Located {
                    value,
                    start: m.start(),
                    end: m.end(),
                })
            })
            .collect()
    }

    /// Pick the release year.
    ///
    /// The last candidate that sits before the first release marker
    /// (`marker`, the offset of the earliest quality/media/edition/HDR token)
    /// wins; without such a candidate the last candidate overall is used.
    pub fn year(&self, name: &str, marker: Option<usize>) -> Option<Located<u32>> {
        let candidates = self.year_candidates(name);
        let before_marker = marker.and_then(|pos| {
            candidates
                .iter()
                .rev()
                .find(|c| c.end <= pos)
                .copied()
        });
        before_marker.or_else(|| candidates.last().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> Patterns {
        Patterns::compile(&ParserConfig::default()).unwrap()
    }

    #[test]
    fn test_quality_tokens() {
        let p = patterns();
        assert_eq!(p.quality("Heat.1995.1080p.BluRay").unwrap().value, Quality::Hd1080);
        assert_eq!(p.quality("Heat 1995 4K HDR").unwrap().value, Quality::Uhd2160);
        assert_eq!(p.quality("Heat.1995.720.HDTV").unwrap().value, Quality::Hd720);
        assert_eq!(p.quality("Heat.1995.480p.DVDRip").unwrap().value, Quality::Sd);
        assert!(p.quality("Heat.1995.DVDRip").is_none());
        // resolution glued to other text is not a token
        assert!(p.quality("x1080pz").is_none());
    }

    #[test]
    fn test_media_tokens() {
        let p = patterns();
        assert_eq!(p.media("Heat.1995.1080p.BluRay").unwrap().value, Media::Bluray);
        assert_eq!(p.media("Heat.1995.1080p.BDRemux").unwrap().value, Media::Bluray);
        assert_eq!(p.media("Heat 1995 WEB-DL").unwrap().value, Media::WebDl);
        assert_eq!(p.media("Heat 1995 WEBRip").unwrap().value, Media::WebDl);
        assert_eq!(p.media("Heat.1995.HDTV").unwrap().value, Media::Hdtv);
        assert_eq!(p.media("Heat.1995.DVDRip").unwrap().value, Media::Dvd);
        assert!(p.media("Heat.1995").is_none());
    }

    #[test]
    fn test_hdr_and_part_tokens() {
        let p = patterns();
        assert!(p.hdr("Dune.2021.2160p.HDR10.WEB-DL").is_some());
        assert!(p.hdr("Dune.2021.2160p.Dolby.Vision").is_some());
        assert!(p.hdr("Dune.2021.1080p").is_none());
        assert!(p.proper("Heat.1995.1080p.PROPER.BluRay").is_some());
        assert!(p.proper("Heat.1995.1080p.proper").is_some());
        assert!(p.proper("Improper.Conduct.1994.720p").is_none());
        assert_eq!(p.part("Heat.1995.cd2.avi").unwrap().value, 2);
        assert_eq!(p.part("Heat 1995 Part 1").unwrap().value, 1);
        assert!(p.part("Heat 1995").is_none());
    }

    #[test]
    fn test_tv_detection() {
        let p = patterns();
        assert_eq!(p.tv("Show.S01E02.720p"), Some(4));
        assert!(p.tv("Show 1x02 HDTV").is_some());
        assert!(p.tv("Heat.1995.1080p").is_none());
    }

    #[test]
    fn test_year_candidates_exclude_resolutions_and_glued_digits() {
        let p = patterns();
        let years: Vec<u32> = p
            .year_candidates("Movie.BT2020.1920x1080.2160p.2012")
            .iter()
            .map(|c| c.value)
            .collect();
        assert_eq!(years, vec![2012]);
    }

    #[test]
    fn test_year_never_at_start() {
        let p = patterns();
        assert_eq!(p.year("2012.2009.1080p", None).unwrap().value, 2009);
        assert!(p.year("2012", None).is_none());
    }

    #[test]
    fn test_year_prefers_last_candidate_before_marker() {
        let p = patterns();
        let name = "Blade.Runner.2049.2017.1080p.BluRay.2019";
        let marker = p.quality(name).map(|q| q.start);
        assert_eq!(p.year(name, marker).unwrap().value, 2017);
    }

    #[test]
    fn test_year_falls_back_to_last_overall() {
        let p = patterns();
        assert_eq!(p.year("Some.Film.1999.2003", None).unwrap().value, 2003);
        // candidates only after the marker
        let name = "Film.1080p.2004";
        let marker = p.quality(name).map(|q| q.start);
        assert_eq!(p.year(name, marker).unwrap().value, 2004);
    }

    #[test]
    fn test_edition_first_rule_wins() {
        let p = patterns();
        let found = p.edition("Aliens.1986.extended.director.s.cut.1080p").unwrap();
        assert_eq!(found.value, "Extended Director's Cut");
        let found = p.edition("Aliens.1986.Extended.Directors.Cut.1080p").unwrap();
        assert_eq!(found.value, "Extended Director's Cut");
        let found = p.edition("Blade.Runner.1982.Director's.Cut.1080p").unwrap();
        assert_eq!(found.value, "Director's Cut");
        let found = p.edition("Blade.Runner.1982.director.s.cut").unwrap();
        assert_eq!(found.value, "Director's Cut");
        let found = p.edition("Aliens.1986.Extended.1080p").unwrap();
        assert_eq!(found.value, "Extended");
    }
}
