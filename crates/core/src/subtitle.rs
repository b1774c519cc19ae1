//! Subtitle language detection.
//!
//! Release groups tag subtitles in many ways: `heat.english.srt`,
//! `heat.eng.srt`, `heat.english-sdh.srt`, `heat.portuguese-br.srt`. These are
//! normalized to the ISO 639-1 form media servers expect, e.g. `en`, `en.sdh`
//! or `pt-br`.

use std::path::Path;

/// File extensions treated as subtitles.
const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "sub", "idx", "ass", "ssa", "vtt"];

/// Qualifiers kept as their own dotted segment.
const FLAGS: &[&str] = &["sdh", "forced", "cc"];

/// ISO 639-1 code followed by the names and ISO 639-2 codes that map to it.
const LANGUAGES: &[(&str, &[&str])] = &[
    ("ar", &["arabic", "ara"]),
    ("bg", &["bulgarian", "bul"]),
    ("cs", &["czech", "cze", "ces"]),
    ("da", &["danish", "dan"]),
    ("de", &["german", "ger", "deu"]),
    ("el", &["greek", "gre", "ell"]),
    ("en", &["english", "eng"]),
    ("es", &["spanish", "spa", "castilian"]),
    ("et", &["estonian", "est"]),
    ("fi", &["finnish", "fin"]),
    ("fr", &["french", "fre", "fra"]),
    ("he", &["hebrew", "heb"]),
    ("hi", &["hindi", "hin"]),
    ("hr", &["croatian", "hrv"]),
    ("hu", &["hungarian", "hun"]),
    ("id", &["indonesian", "ind"]),
    ("is", &["icelandic", "ice", "isl"]),
    ("it", &["italian", "ita"]),
    ("ja", &["japanese", "jpn"]),
    ("ko", &["korean", "kor"]),
    ("lt", &["lithuanian", "lit"]),
    ("lv", &["latvian", "lav"]),
    ("nl", &["dutch", "dut", "nld", "flemish"]),
    ("no", &["norwegian", "nor", "nob"]),
    ("pl", &["polish", "pol"]),
    ("pt", &["portuguese", "por"]),
    ("ro", &["romanian", "rum", "ron"]),
    ("ru", &["russian", "rus"]),
    ("sk", &["slovak", "slo", "slk"]),
    ("sl", &["slovenian", "slv"]),
    ("sr", &["serbian", "srp"]),
    ("sv", &["swedish", "swe"]),
    ("th", &["thai", "tha"]),
    ("tr", &["turkish", "tur"]),
    ("uk", &["ukrainian", "ukr"]),
    ("vi", &["vietnamese", "vie"]),
    ("zh", &["chinese", "chi", "zho"]),
];

/// Language tag found in a subtitle file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleLanguage {
    /// ISO 639-1 code.
    pub code: &'static str,
    /// Regional variant such as `br` in `portuguese-br`.
    pub region: Option<String>,
    /// `sdh`, `forced` and `cc` markers, in the order they appeared.
    pub flags: Vec<String>,
}

impl SubtitleLanguage {
    /// Dotted tag inserted before the extension, e.g. `en.sdh` or `pt-br`.
    pub fn tag(&self) -> String {
        let mut tag = self.code.to_string();
        if let Some(region) = &self.region {
            tag.push('-');
            tag.push_str(region);
        }
        for flag in &self.flags {
            tag.push('.');
            tag.push_str(flag);
        }
        tag
    }
}

pub fn is_subtitle(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|ext| SUBTITLE_EXTENSIONS.contains(&ext.as_str()))
}

fn language_code(word: &str) -> Option<&'static str> {
    LANGUAGES
        .iter()
        .find(|(code, names)| *code == word || names.contains(&word))
        .map(|(code, _)| *code)
}

/// Detect the language from the trailing dotted segments of `text`, which is a
/// file stem or the part of it after the video's name. Returns `None` when the
/// last segments are not language or flag markers.
pub fn detect(text: &str) -> Option<SubtitleLanguage> {
    let mut flags = Vec::new();
    let segments = text
        .split(['.', '_', ' '])
        .filter(|s| !s.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>();

    for segment in segments.iter().rev() {
        if FLAGS.contains(&segment.as_str()) {
            flags.insert(0, segment.clone());
            continue;
        }

        let (word, qualifier) = match segment.split_once('-') {
            Some((word, qualifier)) => (word, Some(qualifier)),
            None => (segment.as_str(), None),
        };
        let code = language_code(word)?;

        let mut language = SubtitleLanguage {
            code,
            region: None,
            flags: Vec::new(),
        };
        match qualifier {
            Some(q) if FLAGS.contains(&q) => language.flags.push(q.to_string()),
            Some(q) if !q.is_empty() => language.region = Some(q.to_string()),
            _ => {}
        }
        language.flags.extend(flags);
        return Some(language);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(text: &str) -> Option<String> {
        detect(text).map(|l| l.tag())
    }

    #[test]
    fn test_detect_names_and_codes() {
        assert_eq!(tag(".english"), Some("en".to_string()));
        assert_eq!(tag(".eng"), Some("en".to_string()));
        assert_eq!(tag(".en"), Some("en".to_string()));
        assert_eq!(tag(".French"), Some("fr".to_string()));
        assert_eq!(tag("Heat.1995.1080p.BluRay.x264-Group.dutch"), Some("nl".to_string()));
    }

    #[test]
    fn test_detect_flags_and_regions() {
        assert_eq!(tag(".english-sdh"), Some("en.sdh".to_string()));
        assert_eq!(tag(".english-forced"), Some("en.forced".to_string()));
        assert_eq!(tag(".en.forced"), Some("en.forced".to_string()));
        assert_eq!(tag(".portuguese-br"), Some("pt-br".to_string()));
        assert_eq!(tag(".spanish-lat"), Some("es-lat".to_string()));
    }

    #[test]
    fn test_detect_nothing_without_language() {
        assert_eq!(tag(""), None);
        assert_eq!(tag("Heat.1995.1080p"), None);
        assert_eq!(tag(".forced"), None);
    }

    #[test]
    fn test_is_subtitle() {
        assert!(is_subtitle(Path::new("/src/heat.SRT")));
        assert!(is_subtitle(Path::new("/src/heat.idx")));
        assert!(!is_subtitle(Path::new("/src/heat.nfo")));
        assert!(!is_subtitle(Path::new("/src/heat")));
    }
}
