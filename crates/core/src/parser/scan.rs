//! Filesystem discovery of film candidates.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::{file_name_lossy, FilmParser, VideoFile};

/// Video and extra files found under a film folder.
pub(super) struct DirListing {
    pub videos: Vec<VideoFile>,
    pub extras: Vec<PathBuf>,
}

/// Walk a film folder and collect qualifying video files and extras.
pub(super) fn list_dir_media(parser: &FilmParser, dir: &Path) -> DirListing {
    let mut listing = DirListing {
        videos: Vec::new(),
        extras: Vec::new(),
    };

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !parser.is_system_name(&e.file_name().to_string_lossy()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Failed to read entry under {}: {}", dir.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if parser.is_video_path(path) {
            if parser.is_ignored_name(&entry.file_name().to_string_lossy()) {
                debug!("Skipping ignored video {}", path.display());
                continue;
            }
            let size_bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);
            listing.videos.push(VideoFile {
                path: path.to_path_buf(),
                size_bytes,
                part: None,
            });
        } else if parser.is_extra_path(path) {
            listing.extras.push(path.to_path_buf());
        }
    }

    listing
}

/// Select the files that make up the release, largest first.
///
/// A file belongs to the release when it is at least `multi_file_ratio` of
/// the largest file, or carries a part marker. Several release files without
/// markers are numbered by name.
pub(super) fn release_files(parser: &FilmParser, videos: &[VideoFile]) -> Vec<VideoFile> {
    let Some(largest) = videos.iter().map(|v| v.size_bytes).max() else {
        return Vec::new();
    };
    let threshold = largest as f64 * parser.config.multi_file_ratio;

    let mut release: Vec<VideoFile> = videos
        .iter()
        .map(|v| {
            let stem = v
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            VideoFile {
                part: parser.parse_name(&stem).part,
                ..v.clone()
            }
        })
        .filter(|v| v.size_bytes as f64 >= threshold || v.part.is_some())
        .collect();

    if release.len() > 1 && release.iter().all(|v| v.part.is_none()) {
        release.sort_by(|a, b| a.path.cmp(&b.path));
        for (idx, file) in release.iter_mut().enumerate() {
            file.part = Some(idx as u32 + 1);
        }
    }

    release.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes).then(a.path.cmp(&b.path)));
    release
}

/// Extras next to a loose video file that share its stem.
pub(super) fn sibling_extras(parser: &FilmParser, video: &Path, stem: &str) -> Vec<PathBuf> {
    let Some(parent) = video.parent() else {
        return Vec::new();
    };
    let stem = stem.to_lowercase();

    WalkDir::new(parent)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| parser.is_extra_path(e.path()))
        .filter(|e| e.file_name().to_string_lossy().to_lowercase().starts_with(&stem))
        .map(|e| e.into_path())
        .collect()
}

/// Direct children of a directory, sorted by name.
fn children(parser: &FilmParser, dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by(|a, b| {
            a.file_name()
                .to_ascii_lowercase()
                .cmp(&b.file_name().to_ascii_lowercase())
        })
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Failed to read entry under {}: {}", dir.display(), e);
                None
            }
        })
        .filter(|e| !parser.is_system_name(&e.file_name().to_string_lossy()))
        .map(|e| e.into_path())
        .collect()
}

/// A folder holding several different films rather than one release.
///
/// Folders named with a year are film folders. Otherwise a folder is a
/// container when its children name at least two different years.
fn is_container(parser: &FilmParser, dir: &Path) -> bool {
    let name = file_name_lossy(dir);
    if !parser.patterns.year_candidates(&name).is_empty() {
        return false;
    }

    let years: HashSet<u32> = children(parser, dir)
        .iter()
        .filter(|child| child.is_dir() || parser.is_video_path(child))
        .filter_map(|child| {
            let stem = if child.is_dir() {
                file_name_lossy(child)
            } else {
                parser.parse_stem(child)
            };
            parser.parse_name(&stem).year
        })
        .collect();

    years.len() > 1
}

fn collect(parser: &FilmParser, path: PathBuf, out: &mut Vec<PathBuf>) {
    if path.is_dir() {
        if is_container(parser, &path) {
            debug!("Descending into container folder {}", path.display());
            for child in children(parser, &path) {
                collect(parser, child, out);
            }
            return;
        }
    } else if parser.is_extra_path(&path) {
        // extras travel with their video
        return;
    }
    out.push(path);
}

/// Candidate film roots under the given sources, in name order per source.
pub(super) fn discover(parser: &FilmParser, sources: &[PathBuf]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for source in sources {
        if !source.is_dir() {
            warn!("Source {} is not a directory, skipping", source.display());
            continue;
        }
        for child in children(parser, source) {
            collect(parser, child, &mut found);
        }
    }
    debug!("Discovered {} candidate(s)", found.len());
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::quality::QualityMap;
    use std::fs;
    use tempfile::TempDir;

    fn parser() -> FilmParser {
        FilmParser::with_settings(ParserConfig::default(), QualityMap::default()).unwrap()
    }

    fn write(path: &Path, size: usize) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, vec![0u8; size]).unwrap();
    }

    #[test]
    fn test_discover_files_and_folders() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(&root.join("Heat.1995.1080p.mkv"), 10);
        write(&root.join("Heat.1995.1080p.srt"), 1);
        write(&root.join("Alien (1979)/alien.720p.mkv"), 10);
        write(&root.join(".DS_Store"), 1);

        let found = parser().discover(&[root.to_path_buf()]);
        assert_eq!(found.len(), 2);
        assert!(found.contains(&root.join("Alien (1979)")));
        assert!(found.contains(&root.join("Heat.1995.1080p.mkv")));
    }

    #[test]
    fn test_discover_descends_into_containers() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(&root.join("new/Heat.1995.mkv"), 10);
        write(&root.join("new/Alien.1979/alien.mkv"), 10);

        let found = parser().discover(&[root.to_path_buf()]);
        assert_eq!(found.len(), 2);
        assert!(found.contains(&root.join("new/Heat.1995.mkv")));
        assert!(found.contains(&root.join("new/Alien.1979")));
    }

    #[test]
    fn test_release_files_groups_parts_and_drops_small_extras() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("Heat.1995");
        write(&dir.join("heat.cd1.avi"), 100);
        write(&dir.join("heat.cd2.avi"), 90);
        write(&dir.join("featurette.avi"), 5);
        write(&dir.join("heat.sample.avi"), 50);

        let p = parser();
        let listing = list_dir_media(&p, &dir);
        assert_eq!(listing.videos.len(), 3);
        let release = release_files(&p, &listing.videos);
        assert_eq!(release.len(), 2);
        assert_eq!(release[0].part, Some(1));
        assert_eq!(release[1].part, Some(2));
    }

    #[test]
    fn test_parse_dir_descriptor() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("Heat (1995)");
        write(&dir.join("heat.1080p.bluray.mkv"), 100);
        write(&dir.join("heat.en.srt"), 1);
        write(&dir.join("info.nfo"), 1);

        let film = parser().parse(&dir);
        assert!(film.is_dir);
        assert!(film.ignored.is_none());
        assert_eq!(film.title, "Heat");
        assert_eq!(film.year, Some(1995));
        assert_eq!(film.quality, crate::quality::Quality::Hd1080);
        assert_eq!(film.size_bytes, 100);
        assert_eq!(film.extras.len(), 1);
    }

    #[test]
    fn test_parse_dir_without_videos_is_ignored() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("Heat (1995)");
        write(&dir.join("info.nfo"), 1);

        let film = parser().parse(&dir);
        assert_eq!(film.ignored, Some(super::super::IgnoreReason::NoVideoFiles));
    }

    #[test]
    fn test_parse_file_applies_min_size() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("Heat.1995.720p.mkv");
        write(&file, 10);
        let mut min = QualityMap::default();
        min.hd720 = 1;
        let p = FilmParser::with_settings(ParserConfig::default(), min).unwrap();
        assert_eq!(p.parse(&file).ignored, Some(super::super::IgnoreReason::TooSmall));
    }

    #[test]
    fn test_parse_non_video_file_is_ignored() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("Heat.1995.txt");
        write(&file, 10);
        assert_eq!(parser().parse(&file).ignored, Some(super::super::IgnoreReason::NotVideo));
    }
}
