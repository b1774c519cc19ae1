//! Organizer lifecycle integration tests.
//!
//! These tests run the organizer over real temporary directories with a mock
//! catalog and notifier:
//! - Moving matched and unmatched films into the library
//! - Renaming films in place
//! - Test mode leaving the filesystem untouched
//! - Ignored entries, run limits and aborts
//! - Lookup failures staying local to a film
//! - Library notification

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use filmsort_core::{
    catalog::{CatalogError, MetadataCatalog, Resolution},
    config::{Config, PlexConfig, PlexSections},
    placer::TransferStatus,
    processor::{FilmOrganizer, FilmStatus},
    review::MatchChoice,
    testing::{fixtures, MockCatalog, MockNotifier, ScriptedReviewer},
};

/// Source and library directories plus a mock catalog.
struct TestHarness {
    source: TempDir,
    library: TempDir,
    catalog: Arc<MockCatalog>,
}

impl TestHarness {
    async fn new() -> Self {
        let catalog = Arc::new(MockCatalog::new());
        catalog
            .set_movies(vec![
                fixtures::record(949, "Heat", Some(1995), 40.0),
                fixtures::record(348, "Alien", Some(1979), 60.0),
            ])
            .await;
        Self {
            source: TempDir::new().expect("Failed to create source dir"),
            library: TempDir::new().expect("Failed to create library dir"),
            catalog,
        }
    }

    fn config(&self) -> Config {
        fixtures::config_for(self.source.path(), self.library.path())
    }

    fn organizer(&self, config: Config) -> FilmOrganizer {
        let catalog = Arc::clone(&self.catalog) as Arc<dyn MetadataCatalog>;
        FilmOrganizer::new(config, Some(catalog)).expect("Failed to create organizer")
    }

    fn add_source(&self, relative: &str, size: usize) -> PathBuf {
        write(&self.source.path().join(relative), size)
    }

    fn library_path(&self, relative: &str) -> PathBuf {
        self.library.path().join(relative)
    }
}

fn write(path: &Path, size: usize) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, vec![7u8; size]).unwrap();
    path.to_path_buf()
}

#[tokio::test]
async fn test_moves_matched_film_into_library() {
    let h = TestHarness::new().await;
    let source = h.add_source("Heat.1995.1080p.BluRay.x264-GRP.mkv", 2048);

    let report = h.organizer(h.config()).run().await.unwrap();

    let expected = h.library_path("Heat (1995)/Heat (1995) Bluray-1080p.mkv");
    assert!(expected.exists(), "film should be in the library");
    assert!(!source.exists(), "source should be gone after a move");
    assert_eq!(fs::metadata(&expected).unwrap().len(), 2048);

    let outcome = report.outcome_for(&source).unwrap();
    assert_eq!(outcome.status, FilmStatus::Moved);
    assert_eq!(outcome.resolution, Some(Resolution::Matched));
    assert_eq!(outcome.matched.as_ref().unwrap().catalog_id, 949);
    assert_eq!(outcome.transfers[0].status, TransferStatus::Moved);
    assert!(!report.test_mode);
    assert!(report.errors.is_empty());
}

#[tokio::test]
async fn test_film_folder_moves_with_extras_and_leaves_nothing_behind() {
    let h = TestHarness::new().await;
    h.add_source("Alien.1979.720p.BluRay/alien.1979.720p.bluray.mkv", 4096);
    h.add_source("Alien.1979.720p.BluRay/alien.1979.720p.bluray.en.srt", 10);
    h.add_source("Alien.1979.720p.BluRay/RARBG.txt", 10);

    let report = h.organizer(h.config()).run().await.unwrap();
    assert_eq!(report.count(FilmStatus::Moved), 1);

    assert!(h
        .library_path("Alien (1979)/Alien (1979) Bluray-720p.mkv")
        .exists());
    assert!(h
        .library_path("Alien (1979)/Alien (1979) Bluray-720p.en.srt")
        .exists());
    assert!(!h.source.path().join("Alien.1979.720p.BluRay").exists());
    assert!(h.source.path().exists(), "source roots are never removed");
}

#[tokio::test]
async fn test_rename_only_keeps_film_in_source() {
    let h = TestHarness::new().await;
    h.add_source("Alien.1979.720p.BluRay/alien.1979.720p.bluray.mkv", 4096);
    h.add_source("Alien.1979.720p.BluRay/alien.1979.720p.bluray.english-forced.srt", 10);
    write(&h.library_path("Alien (1979)/Alien (1979) Bluray-720p.mkv"), 10);
    let mut config = h.config();
    config.rename.rename_only = true;

    let report = h.organizer(config).run().await.unwrap();
    assert_eq!(report.count(FilmStatus::Moved), 1);

    let renamed = h.source.path().join("Alien (1979)");
    assert!(renamed.join("Alien (1979) Bluray-720p.mkv").exists());
    assert!(renamed.join("Alien (1979) Bluray-720p.en.forced.srt").exists());
    assert!(!h.source.path().join("Alien.1979.720p.BluRay").exists());
    assert_eq!(
        fs::metadata(h.library_path("Alien (1979)/Alien (1979) Bluray-720p.mkv"))
            .unwrap()
            .len(),
        10,
        "library copies are not duplicates in rename-only mode"
    );
}

#[tokio::test]
async fn test_test_mode_makes_no_changes() {
    let h = TestHarness::new().await;
    let source = h.add_source("Heat.1995.1080p.BluRay.mkv", 2048);
    let mut config = h.config();
    config.run.test = true;

    let report = h.organizer(config).run().await.unwrap();

    assert!(report.test_mode);
    assert!(source.exists());
    assert_eq!(fs::read_dir(h.library.path()).unwrap().count(), 0);

    let outcome = report.outcome_for(&source).unwrap();
    assert_eq!(outcome.status, FilmStatus::Moved);
    assert!(outcome.transfers.iter().all(|t| t.as_if));
    assert_eq!(
        outcome.transfers[0].destination,
        h.library_path("Heat (1995)/Heat (1995) Bluray-1080p.mkv")
    );
}

#[tokio::test]
async fn test_unmatched_film_is_named_offline() {
    let h = TestHarness::new().await;
    let source = h.add_source("Obscure.Short.2003.DVDRip.avi", 100);

    let report = h.organizer(h.config()).run().await.unwrap();

    let outcome = report.outcome_for(&source).unwrap();
    assert_eq!(outcome.status, FilmStatus::Moved);
    assert_eq!(outcome.resolution, Some(Resolution::NoMatch));
    assert!(h
        .library_path("Obscure Short (2003)/Obscure Short (2003) DVD.avi")
        .exists());
}

#[tokio::test]
async fn test_ignored_entries_are_reported_and_left_alone() {
    let h = TestHarness::new().await;
    let sample = h.add_source("Heat.1995.sample.mkv", 10);
    let notes = h.add_source("notes.txt", 10);
    let empty = h.source.path().join("Empty.Folder.2001");
    fs::create_dir_all(&empty).unwrap();

    let mut config = h.config();
    config.transfer.cleanup_empty_dirs = false;
    let report = h.organizer(config).run().await.unwrap();

    assert_eq!(report.count(FilmStatus::Ignored), 3);
    assert!(sample.exists());
    assert!(notes.exists());
    assert!(report
        .outcome_for(&empty)
        .unwrap()
        .reason
        .as_deref()
        .unwrap()
        .contains("no video files"));
    assert!(h.catalog.recorded_queries().await.is_empty());
}

#[tokio::test]
async fn test_limit_skips_the_rest() {
    let h = TestHarness::new().await;
    h.add_source("Alien.1979.mkv", 10);
    h.add_source("Heat.1995.mkv", 10);
    let mut config = h.config();
    config.run.limit = 1;

    let report = h.organizer(config).run().await.unwrap();

    assert_eq!(report.count(FilmStatus::Moved), 1);
    assert_eq!(report.count(FilmStatus::Skipped), 1);
    let skipped = report
        .outcomes
        .iter()
        .find(|o| o.status == FilmStatus::Skipped)
        .unwrap();
    assert_eq!(skipped.reason.as_deref(), Some("run limit reached"));
}

#[tokio::test]
async fn test_abort_leaves_every_film_untouched() {
    let h = TestHarness::new().await;
    let heat = h.add_source("Heat.1995.mkv", 10);
    let alien = h.add_source("Alien.1979.mkv", 10);

    let organizer = h.organizer(h.config());
    organizer.control().abort();
    let report = organizer.run().await.unwrap();

    assert!(report.aborted);
    assert_eq!(report.count(FilmStatus::Skipped), 2);
    assert!(heat.exists());
    assert!(alien.exists());
    assert!(h.catalog.recorded_queries().await.is_empty());
}

#[tokio::test]
async fn test_lookup_failure_degrades_single_film() {
    let h = TestHarness::new().await;
    let source = h.add_source("Heat.1995.720p.WEB-DL.mkv", 10);
    h.catalog
        .set_next_error(CatalogError::RateLimitExceeded)
        .await;

    let report = h.organizer(h.config()).run().await.unwrap();

    let outcome = report.outcome_for(&source).unwrap();
    assert_eq!(outcome.resolution, Some(Resolution::Failed));
    assert_eq!(outcome.status, FilmStatus::Moved);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].message.contains("Lookup failed"));
    assert!(h
        .library_path("Heat (1995)/Heat (1995) WEB-DL-720p.mkv")
        .exists());
}

#[tokio::test]
async fn test_invalid_config_fails_closed() {
    let h = TestHarness::new().await;
    let source = h.add_source("Heat.1995.mkv", 10);
    let mut config = h.config();
    config.lookup.min_title_similarity = -0.5;

    let catalog = Arc::clone(&h.catalog) as Arc<dyn MetadataCatalog>;
    assert!(FilmOrganizer::new(config, Some(catalog)).is_err());
    assert!(source.exists());
}

#[tokio::test]
async fn test_missing_destination_root_is_fatal() {
    let h = TestHarness::new().await;
    let source = h.add_source("Heat.1995.mkv", 10);
    let mut config = h.config();
    config.destinations.default = Some(h.library.path().join("missing"));

    let result = h.organizer(config).run().await;
    assert!(result.is_err());
    assert!(source.exists());
}

#[tokio::test]
async fn test_reviewer_can_skip_or_pick_an_alternate() {
    let h = TestHarness::new().await;
    h.catalog
        .set_movies(vec![
            fixtures::record(1, "Heat", Some(1995), 40.0),
            fixtures::record(2, "Heat Wave", Some(1995), 5.0),
        ])
        .await;
    let alien = h.add_source("Alien.1979.mkv", 10);
    let heat = h.add_source("Heat.1995.mkv", 10);

    let reviewer = Arc::new(ScriptedReviewer::new());
    // discovery order: Alien, Heat
    reviewer.push_match_choice(MatchChoice::Skip).await;
    reviewer.push_match_choice(MatchChoice::PickAlternate(0)).await;

    let report = h
        .organizer(h.config())
        .with_reviewer(reviewer.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(report.outcome_for(&alien).unwrap().status, FilmStatus::Skipped);
    assert!(alien.exists());

    let outcome = report.outcome_for(&heat).unwrap();
    assert_eq!(outcome.matched.as_ref().unwrap().catalog_id, 2);
    assert!(h.library_path("Heat Wave (1995)/Heat Wave (1995).mkv").exists());
    assert_eq!(reviewer.match_reviews().await.len(), 2);
}

#[tokio::test]
async fn test_notifies_sections_of_placed_tiers() {
    let h = TestHarness::new().await;
    h.add_source("Heat.1995.2160p.BluRay.mkv", 10);
    h.add_source("Alien.1979.1080p.BluRay.mkv", 10);

    let mut sections = PlexSections::default();
    sections.default = Some("Movies".to_string());
    sections.tiers.uhd2160 = Some("Movies 4K".to_string());
    let mut config = h.config();
    config.plex = Some(PlexConfig {
        base_url: "http://localhost:32400".to_string(),
        token: "token".to_string(),
        sections,
        timeout_secs: 5,
    });

    let notifier = Arc::new(MockNotifier::new());
    let report = h
        .organizer(config.clone())
        .with_notifier(notifier.clone())
        .run()
        .await
        .unwrap();

    let calls = notifier.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0], vec!["Movies".to_string(), "Movies 4K".to_string()]);
    assert_eq!(report.sections_notified.len(), 2);

    // quiet runs never notify
    h.add_source("Heat.Wave.2012.720p.mkv", 10);
    config.run.quiet = true;
    let quiet = Arc::new(MockNotifier::new());
    h.organizer(config)
        .with_notifier(quiet.clone())
        .run()
        .await
        .unwrap();
    assert!(quiet.calls().await.is_empty());
}
