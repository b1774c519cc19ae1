//! Destination naming from rename templates.
//!
//! Templates use `{token}` placeholders. Characters inside the braces around
//! a token are kept only when the token has a value, so `{(year)}` renders as
//! `(1995)` or disappears entirely. `\{` and `\}` produce literal braces.

use std::path::{Path, PathBuf};

use crate::catalog::ResolvedFilm;
use crate::config::{DestinationsConfig, RenameConfig};
use crate::parser::file_name_lossy;
use crate::placer::{FileKind, FilmPlan, PlannedFile};
use crate::subtitle;

/// Token names, longest first so `title-the` wins over `title`.
const TOKENS: &[&str] = &[
    "title-the",
    "edition",
    "quality",
    "title",
    "media",
    "proper",
    "year",
    "part",
    "hdr",
];

const ILLEGAL: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Values available to a template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameFields {
    pub title: String,
    pub year: Option<u32>,
    pub edition: Option<String>,
    pub quality: Option<String>,
    pub media: Option<String>,
    pub hdr: bool,
    pub proper: bool,
    pub part: Option<u32>,
}

impl NameFields {
    /// Fields for a film, canonical values first.
    pub fn for_film(film: &ResolvedFilm, part: Option<u32>) -> Self {
        let descriptor = &film.descriptor;
        Self {
            title: film.title().to_string(),
            year: film.year(),
            edition: descriptor.edition.clone(),
            quality: descriptor.quality.label().map(str::to_string),
            media: descriptor.media.label().map(str::to_string),
            hdr: descriptor.hdr,
            proper: descriptor.proper,
            part,
        }
    }

    fn value(&self, token: &str) -> Option<String> {
        match token {
            "title" => non_empty(self.title.clone()),
            "title-the" => non_empty(title_the(&self.title)),
            "year" => self.year.map(|y| y.to_string()),
            "edition" => self.edition.clone().and_then(non_empty),
            "quality" => self.quality.clone(),
            "media" => self.media.clone(),
            "hdr" => self.hdr.then(|| "HDR".to_string()),
            "proper" => self.proper.then(|| "PROPER".to_string()),
            "part" => self.part.map(|p| format!("Part {}", p)),
            _ => None,
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    (!s.trim().is_empty()).then_some(s)
}

/// `The Matrix` becomes `Matrix, The`.
pub fn title_the(title: &str) -> String {
    match title.get(..4) {
        Some(head) if head.eq_ignore_ascii_case("the ") && title.len() > 4 => {
            format!("{}, {}", &title[4..], &title[..3])
        }
        _ => title.to_string(),
    }
}

/// Render a template with the given values.
pub fn render(template: &str, fields: &NameFields) -> String {
    let mut out = String::with_capacity(template.len() + fields.title.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if matches!(chars.peek(), Some('{') | Some('}')) => {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            '{' => {
                let mut group = String::new();
                let mut closed = false;
                while let Some(inner) = chars.next() {
                    match inner {
                        '\\' if matches!(chars.peek(), Some('{') | Some('}')) => {
                            if let Some(escaped) = chars.next() {
                                group.push(escaped);
                            }
                        }
                        '}' => {
                            closed = true;
                            break;
                        }
                        other => group.push(other),
                    }
                }
                if closed {
                    out.push_str(&render_group(&group, fields));
                } else {
                    out.push('{');
                    out.push_str(&group);
                }
            }
            other => out.push(other),
        }
    }

    // a group like `{media-}` dangles when nothing follows it
    collapse_whitespace(&strip_illegal(&out))
        .trim_end_matches(&['-', ' '][..])
        .to_string()
}

fn render_group(group: &str, fields: &NameFields) -> String {
    let lower = group.to_ascii_lowercase();
    let Some((token, pos)) = TOKENS
        .iter()
        .find_map(|token| lower.find(token).map(|pos| (*token, pos)))
    else {
        return format!("{{{}}}", group);
    };

    match fields.value(token) {
        Some(value) => format!(
            "{}{}{}",
            &group[..pos],
            value,
            &group[pos + token.len()..]
        ),
        None => String::new(),
    }
}

/// Replace characters that are not allowed in file names. A character between
/// two words becomes a dash (`Face/Off` → `Face-Off`), elsewhere a space.
pub fn strip_illegal(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    chars
        .iter()
        .enumerate()
        .map(|(idx, c)| {
            if !ILLEGAL.contains(c) {
                return *c;
            }
            let before = idx.checked_sub(1).and_then(|i| chars.get(i));
            let after = chars.get(idx + 1);
            let joins_words = before.is_some_and(|b| !b.is_whitespace())
                && after.is_some_and(|a| !a.is_whitespace());
            if joins_words {
                '-'
            } else {
                ' '
            }
        })
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Builds destination paths for resolved films.
#[derive(Debug, Clone)]
pub struct Namer {
    rename: RenameConfig,
    destinations: DestinationsConfig,
}

impl Namer {
    pub fn new(rename: RenameConfig, destinations: DestinationsConfig) -> Self {
        Self {
            rename,
            destinations,
        }
    }

    /// Folder name for a film.
    pub fn folder_name(&self, film: &ResolvedFilm) -> String {
        render(&self.rename.folder_pattern, &NameFields::for_film(film, None))
    }

    /// File name (without extension) for one part of a film.
    pub fn file_name(&self, film: &ResolvedFilm, part: Option<u32>) -> String {
        let fields = NameFields::for_film(film, part);
        let mut name = render(&self.rename.file_pattern, &fields);
        if let Some(part) = part {
            // keep parts apart even when the pattern has no part token
            if !self.rename.file_pattern.to_ascii_lowercase().contains("part") {
                name = format!("{} - Part {}", name, part);
            }
        }
        name
    }

    /// Plan where every file of a film goes. `None` when no destination
    /// root covers the film's quality. In rename-only mode the root is the
    /// folder the film was found in.
    pub fn plan(&self, film: &ResolvedFilm) -> Option<FilmPlan> {
        let descriptor = &film.descriptor;
        let root = if self.rename.rename_only {
            descriptor.path.parent()?.to_path_buf()
        } else {
            self.destinations.for_quality(descriptor.quality)?.to_path_buf()
        };
        let dir = if self.rename.use_folders {
            root.join(self.folder_name(film))
        } else {
            root.clone()
        };

        let multi_part = descriptor.video_files.len() > 1;
        let mut files = Vec::new();
        let mut primary_base: Option<(String, String)> = None;

        for video in &descriptor.video_files {
            let part = if multi_part { video.part } else { descriptor.part };
            let base = self.file_name(film, part);
            let destination = dir.join(with_extension(&base, &video.path));
            if primary_base.is_none() {
                primary_base = Some((stem_lossy(&video.path), base.clone()));
            }
            files.push(PlannedFile {
                source: video.path.clone(),
                destination,
                size_bytes: video.size_bytes,
                kind: FileKind::Video,
            });
        }

        if let Some((source_stem, base)) = &primary_base {
            for extra in &descriptor.extras {
                let name = extra_name(extra, source_stem, base);
                files.push(PlannedFile {
                    source: extra.clone(),
                    destination: dir.join(name),
                    size_bytes: std::fs::metadata(extra).map(|m| m.len()).unwrap_or(0),
                    kind: FileKind::Extra,
                });
            }
        }

        Some(FilmPlan {
            root,
            directory: dir,
            files,
        })
    }
}

fn stem_lossy(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn with_extension(base: &str, source: &Path) -> String {
    match source.extension() {
        Some(ext) => format!("{}.{}", base, ext.to_string_lossy().to_lowercase()),
        None => base.to_string(),
    }
}

/// Extras named after the video keep their suffix (`heat.nfo` →
/// `<base>.nfo`); others keep their own name. Subtitles with a recognizable
/// language are renamed to `<base>.<lang>.<ext>` either way.
fn extra_name(extra: &Path, video_stem: &str, base: &str) -> String {
    let name = file_name_lossy(extra);
    let named_after_video = !video_stem.is_empty()
        && name
            .get(..video_stem.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(video_stem));

    if subtitle::is_subtitle(extra) {
        let stem = stem_lossy(extra);
        let tagged = if named_after_video {
            stem.get(video_stem.len()..).unwrap_or_default()
        } else {
            stem.as_str()
        };
        if let Some(language) = subtitle::detect(tagged) {
            return with_extension(&format!("{}.{}", base, language.tag()), extra);
        }
    }

    if named_after_video {
        format!("{}{}", base, &name[video_stem.len()..])
    } else {
        name
    }
}

/// Paths that would be produced for a film, used to spot same-path duplicates.
pub fn planned_destinations(plan: &FilmPlan) -> Vec<PathBuf> {
    plan.files
        .iter()
        .filter(|f| f.kind == FileKind::Video)
        .map(|f| f.destination.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::{Media, Quality};
    use crate::testing::fixtures;

    fn fields() -> NameFields {
        NameFields {
            title: "Heat".to_string(),
            year: Some(1995),
            edition: None,
            quality: Some("1080p".to_string()),
            media: Some("Bluray".to_string()),
            hdr: false,
            proper: false,
            part: None,
        }
    }

    #[test]
    fn test_render_default_file_pattern() {
        let rename = RenameConfig::default();
        assert_eq!(render(&rename.file_pattern, &fields()), "Heat (1995) Bluray-1080p");
    }

    #[test]
    fn test_render_drops_wrapping_for_missing_values() {
        let mut f = fields();
        f.year = None;
        f.media = None;
        f.edition = Some("Director's Cut".to_string());
        assert_eq!(
            render("{title} {(year)} {[edition]} {media-}{quality}", &f),
            "Heat [Director's Cut] 1080p"
        );
    }

    #[test]
    fn test_render_trims_dangling_separator() {
        let mut f = fields();
        f.quality = None;
        f.media = Some("DVD".to_string());
        assert_eq!(render("{title} {(year)} {media-}{quality}", &f), "Heat (1995) DVD");
    }

    #[test]
    fn test_render_proper_marker() {
        let mut f = fields();
        let pattern = RenameConfig::default().file_pattern;
        f.proper = true;
        assert_eq!(render(&pattern, &f), "Heat (1995) Bluray-1080p PROPER");
    }

    #[test]
    fn test_render_title_the_and_escapes() {
        let mut f = fields();
        f.title = "The Matrix".to_string();
        assert_eq!(render("{title-the} \\{x\\}", &f), "Matrix, The {x}");
    }

    #[test]
    fn test_render_strips_illegal_characters() {
        let mut f = fields();
        f.title = "Face/Off".to_string();
        assert_eq!(render("{title}", &f), "Face-Off");
        f.title = "Mission: Impossible".to_string();
        assert_eq!(render("{title}", &f), "Mission Impossible");
    }

    #[test]
    fn test_render_unknown_group_is_literal() {
        assert_eq!(render("{title} {foo}", &fields()), "Heat {foo}");
    }

    #[test]
    fn test_plan_places_film_under_tier_root() {
        let mut film = fixtures::resolved(fixtures::descriptor("Heat", Some(1995)));
        film.descriptor.quality = Quality::Hd1080;
        film.descriptor.media = Media::Bluray;
        film.descriptor.video_files = vec![fixtures::video("/src/Heat.1995/heat.MKV", 100, None)];
        film.descriptor.extras = vec![PathBuf::from("/src/Heat.1995/heat.en.srt")];

        let mut destinations = DestinationsConfig::default();
        destinations.default = Some(PathBuf::from("/films"));
        destinations.tiers.hd1080 = Some(PathBuf::from("/films-hd"));

        let plan = Namer::new(RenameConfig::default(), destinations)
            .plan(&film)
            .unwrap();
        assert_eq!(plan.root, PathBuf::from("/films-hd"));
        assert_eq!(
            plan.files[0].destination,
            PathBuf::from("/films-hd/Heat (1995)/Heat (1995) Bluray-1080p.mkv")
        );
        assert_eq!(
            plan.files[1].destination,
            PathBuf::from("/films-hd/Heat (1995)/Heat (1995) Bluray-1080p.en.srt")
        );
    }

    #[test]
    fn test_subtitle_languages_are_normalized() {
        let base = "Heat (1995) Bluray-1080p";
        let name = |p: &str| extra_name(Path::new(p), "Heat.1995.1080p.BluRay", base);
        assert_eq!(
            name("/src/Heat.1995.1080p.BluRay.english-sdh.srt"),
            "Heat (1995) Bluray-1080p.en.sdh.srt"
        );
        assert_eq!(
            name("/src/Heat.1995.1080p.BluRay.portuguese-br.SRT"),
            "Heat (1995) Bluray-1080p.pt-br.srt"
        );
        assert_eq!(name("/src/Subs/French.srt"), "Heat (1995) Bluray-1080p.fr.srt");
        assert_eq!(name("/src/Heat.1995.1080p.BluRay.srt"), "Heat (1995) Bluray-1080p.srt");
        assert_eq!(name("/src/Heat.1995.1080p.BluRay.nfo"), "Heat (1995) Bluray-1080p.nfo");
        assert_eq!(name("/src/notes.txt"), "notes.txt");
    }

    #[test]
    fn test_plan_numbers_parts() {
        let mut film = fixtures::resolved(fixtures::descriptor("Heat", Some(1995)));
        film.descriptor.video_files = vec![
            fixtures::video("/src/heat.cd1.avi", 100, Some(1)),
            fixtures::video("/src/heat.cd2.avi", 90, Some(2)),
        ];
        let mut destinations = DestinationsConfig::default();
        destinations.default = Some(PathBuf::from("/films"));
        let rename = RenameConfig {
            use_folders: false,
            ..RenameConfig::default()
        };

        let plan = Namer::new(rename, destinations).plan(&film).unwrap();
        assert_eq!(plan.files[0].destination, PathBuf::from("/films/Heat (1995) Part 1.avi"));
        assert_eq!(plan.files[1].destination, PathBuf::from("/films/Heat (1995) Part 2.avi"));
    }

    #[test]
    fn test_plan_rename_only_stays_in_source() {
        let mut film = fixtures::resolved(fixtures::descriptor("Heat", Some(1995)));
        film.descriptor.path = PathBuf::from("/downloads/Heat.1995.1080p");
        film.descriptor.is_dir = true;
        film.descriptor.quality = Quality::Hd1080;
        film.descriptor.video_files =
            vec![fixtures::video("/downloads/Heat.1995.1080p/heat.mkv", 100, None)];
        let rename = RenameConfig {
            rename_only: true,
            ..RenameConfig::default()
        };

        let plan = Namer::new(rename, DestinationsConfig::default())
            .plan(&film)
            .unwrap();
        assert_eq!(plan.root, PathBuf::from("/downloads"));
        assert_eq!(
            plan.files[0].destination,
            PathBuf::from("/downloads/Heat (1995)/Heat (1995) 1080p.mkv")
        );
    }

    #[test]
    fn test_plan_without_covering_root() {
        let film = fixtures::resolved(fixtures::descriptor("Heat", Some(1995)));
        let namer = Namer::new(RenameConfig::default(), DestinationsConfig::default());
        assert!(namer.plan(&film).is_none());
    }
}
