//! Film organizer implementation.

use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogResolver, MetadataCatalog, ResolvedFilm};
use crate::config::{validate_config, Config};
use crate::duplicates::{DestinationState, ExistingFilm};
use crate::metrics;
use crate::naming::{planned_destinations, Namer};
use crate::notify::{LibraryNotifier, NoopNotifier};
use crate::parser::{FilmDescriptor, FilmParser};
use crate::placer::{FileKind, FilmTransfer, FsPlacer, TransferJob, TransferStatus};
use crate::review::{AutoReviewer, MatchChoice, Reviewer};
use crate::upgrade::{decide, verdict, Verdict};

use super::types::{FilmError, FilmOutcome, FilmStatus, RunReport};
use super::{OrganizeError, RunControl};

/// Drives a run over the configured sources.
pub struct FilmOrganizer {
    config: Config,
    parser: FilmParser,
    resolver: CatalogResolver,
    namer: Namer,
    placer: FsPlacer,
    reviewer: Arc<dyn Reviewer>,
    notifier: Arc<dyn LibraryNotifier>,
    control: RunControl,
}

impl FilmOrganizer {
    /// Build an organizer. Fails closed on invalid configuration.
    pub fn new(
        config: Config,
        catalog: Option<Arc<dyn MetadataCatalog>>,
    ) -> Result<Self, OrganizeError> {
        validate_config(&config)?;
        let parser = FilmParser::new(&config)?;

        let mut transfer = config.transfer.clone();
        if config.rename.rename_only {
            transfer.always_copy = false;
        }

        Ok(Self {
            resolver: CatalogResolver::new(catalog, config.lookup.clone()),
            namer: Namer::new(config.rename.clone(), config.destinations.clone()),
            placer: FsPlacer::new(transfer, config.run.test)
                .with_library_roots(config.destinations.roots()),
            parser,
            reviewer: Arc::new(AutoReviewer),
            notifier: Arc::new(NoopNotifier),
            control: RunControl::new(),
            config,
        })
    }

    /// Use a reviewer other than the automatic one.
    pub fn with_reviewer(mut self, reviewer: Arc<dyn Reviewer>) -> Self {
        self.reviewer = reviewer;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn LibraryNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Handle for aborting the run.
    pub fn control(&self) -> RunControl {
        self.control.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run over every configured source.
    pub async fn run(&self) -> Result<RunReport, OrganizeError> {
        let test_mode = self.config.run.test;
        let roots = if self.config.rename.rename_only {
            Vec::new()
        } else {
            self.config.destinations.roots()
        };
        for root in &roots {
            if !root.is_dir() {
                return Err(OrganizeError::DestinationMissing(root.clone()));
            }
        }

        let mut report = RunReport::start(test_mode);
        info!(
            "Starting run {}{}",
            report.run_id,
            if test_mode { " (test mode)" } else { "" }
        );

        let mut eligible = Vec::new();
        for path in self.parser.discover(&self.config.sources) {
            let descriptor = self.parser.parse(&path);
            match descriptor.ignored {
                Some(reason) => {
                    debug!("Ignoring {}: {}", path.display(), reason);
                    self.finish(
                        &mut report,
                        FilmOutcome::new(path, descriptor.display_name(), FilmStatus::Ignored)
                            .with_reason(reason.to_string()),
                    );
                }
                None => eligible.push(descriptor),
            }
        }

        let limit = self.config.run.limit;
        if limit > 0 && eligible.len() > limit {
            info!("Limiting run to {} of {} film(s)", limit, eligible.len());
            for descriptor in eligible.split_off(limit) {
                self.finish(
                    &mut report,
                    FilmOutcome::new(
                        descriptor.path.clone(),
                        descriptor.display_name(),
                        FilmStatus::Skipped,
                    )
                    .with_reason("run limit reached"),
                );
            }
        }
        info!("Processing {} film(s)", eligible.len());

        if !test_mode {
            report.sweep = self.placer.sweep_orphans(&roots).await;
        }
        let mut state = DestinationState::seed(&self.parser, &roots);

        let pending: Vec<(PathBuf, String)> = eligible
            .iter()
            .map(|d| (d.path.clone(), d.display_name()))
            .collect();
        let mut handled = 0;

        if !self.control.is_aborted() {
            let resolved = self.resolver.resolve_all(eligible);
            futures::pin_mut!(resolved);

            while let Some(film) = resolved.next().await {
                if self.control.is_aborted() {
                    break;
                }
                if let Some(error) = &film.lookup_error {
                    report.errors.push(FilmError {
                        path: film.descriptor.path.clone(),
                        message: format!("Lookup failed: {}", error),
                    });
                }
                let outcome = self.process_film(film, &mut state).await;
                if outcome.status == FilmStatus::Failed {
                    report.errors.push(FilmError {
                        path: outcome.path.clone(),
                        message: outcome.reason.clone().unwrap_or_default(),
                    });
                }
                self.finish(&mut report, outcome);
                handled += 1;
            }
        }

        if handled < pending.len() {
            warn!(
                "Run aborted, {} film(s) left untouched",
                pending.len() - handled
            );
            report.aborted = true;
            for (path, title) in pending.into_iter().skip(handled) {
                self.finish(
                    &mut report,
                    FilmOutcome::new(path, title, FilmStatus::Skipped).with_reason("run aborted"),
                );
            }
        }

        if self.config.transfer.cleanup_empty_dirs {
            report.empty_dirs_removed = self.placer.cleanup_empty_dirs(&self.config.sources);
        }

        self.notify(&mut report).await;

        report.finished_at = chrono::Utc::now();
        info!("Run {} finished: {}", report.run_id, report.summary());
        Ok(report)
    }

    fn finish(&self, report: &mut RunReport, outcome: FilmOutcome) {
        metrics::FILMS_PROCESSED
            .with_label_values(&[outcome.status.as_str()])
            .inc();
        report.outcomes.push(outcome);
    }

    /// Review, name, check duplicates, decide and transfer one film.
    async fn process_film(&self, mut film: ResolvedFilm, state: &mut DestinationState) -> FilmOutcome {
        match self.reviewer.review_match(&film).await {
            MatchChoice::Accept => {}
            MatchChoice::PickAlternate(index) => {
                let similarity = film
                    .alternates
                    .get(index)
                    .map(|record| self.resolver.similarity_of(&film.descriptor, record));
                match similarity {
                    Some(similarity) => {
                        film.choose_alternate(index, similarity);
                    }
                    None => warn!("No alternate #{} for {}", index, film.descriptor.display_name()),
                }
            }
            MatchChoice::ForceOffline => film.force_offline(),
            MatchChoice::Skip => return outcome(&film, FilmStatus::Skipped).with_reason("skipped by reviewer"),
        }

        let Some(plan) = self.namer.plan(&film) else {
            return outcome(&film, FilmStatus::Failed).with_reason(format!(
                "no destination configured for {}",
                film.descriptor.quality
            ));
        };
        let directory = plan.directory.clone();

        let planned = planned_destinations(&plan);
        let duplicates = if self.config.rename.rename_only {
            Vec::new()
        } else {
            state.find_duplicates(&film, &planned, self.config.duplicates.ignore_edition)
        };
        let mut decisions = decide(&film.descriptor, &duplicates, &self.config.duplicates);

        if !duplicates.is_empty() {
            let choice = self
                .reviewer
                .review_duplicates(&film, &duplicates, &decisions)
                .await;
            match choice.apply(&duplicates, &decisions) {
                Some(reviewed) => decisions = reviewed,
                None => {
                    return outcome(&film, FilmStatus::Skipped).with_reason("skipped by reviewer")
                }
            }
        }

        let replace = match verdict(&duplicates, &decisions) {
            Verdict::Proceed => Vec::new(),
            Verdict::Transfer { replace } => replace,
            Verdict::Skip { reason } => {
                info!("Skipping {}: {}", film.descriptor.display_name(), reason);
                let mut skipped = outcome(&film, FilmStatus::Skipped).with_reason(reason);
                skipped.destination = Some(directory);
                return skipped;
            }
        };

        let job = TransferJob {
            plan,
            replace,
            force_overwrite: self.config.duplicates.force_overwrite,
        };
        let transfer = self.placer.execute(&job).await;
        self.update_state(state, &film, &transfer);

        let (status, reason) = film_status(&transfer);
        if transfer.all_videos_transferred() && film.descriptor.is_dir && !self.placer.is_test_mode() {
            let parser = &self.parser;
            self.placer
                .cleanup_film_source(&film.descriptor.path, &self.config.sources, |p| {
                    parser.is_video_path(p) || parser.is_extra_path(p)
                })
                .await;
        }

        let mut result = outcome(&film, status);
        result.reason = reason;
        result.destination = Some(directory);
        result.transfers = transfer.results;
        result.replaced = transfer.replaced;
        result
    }

    /// Films placed in this run become existing films for the rest of it.
    fn update_state(&self, state: &mut DestinationState, film: &ResolvedFilm, transfer: &FilmTransfer) {
        for path in &transfer.replaced {
            state.remove(path);
        }
        let multi_part = film.descriptor.video_files.len() > 1;
        for result in transfer
            .results
            .iter()
            .filter(|r| r.kind == FileKind::Video && r.is_transferred())
        {
            let part = if multi_part {
                part_of(&film.descriptor, &result.source)
            } else {
                film.descriptor.part
            };
            state.record(ExistingFilm::placed(
                film,
                result.destination.clone(),
                part,
                result.size_bytes,
            ));
        }
    }

    /// Refresh the library sections of every tier that received a film.
    async fn notify(&self, report: &mut RunReport) {
        if self.config.run.test || self.config.run.quiet {
            return;
        }
        let Some(plex) = &self.config.plex else {
            return;
        };

        let mut sections: Vec<String> = Vec::new();
        for outcome in &report.outcomes {
            if !matches!(outcome.status, FilmStatus::Moved | FilmStatus::Copied) {
                continue;
            }
            let Some(quality) = outcome.quality else {
                continue;
            };
            if let Some(section) = plex.sections.for_quality(quality) {
                if !sections.iter().any(|s| s == section) {
                    sections.push(section.to_string());
                }
            }
        }
        if sections.is_empty() {
            return;
        }

        match self.notifier.notify(&sections).await {
            Ok(refreshed) => report.sections_notified = refreshed,
            Err(e) => {
                warn!("{} notification failed: {}", self.notifier.name(), e);
                report.notify_error = Some(e.to_string());
            }
        }
    }
}

fn outcome(film: &ResolvedFilm, status: FilmStatus) -> FilmOutcome {
    let mut outcome = FilmOutcome::new(
        film.descriptor.path.clone(),
        film.descriptor.display_name(),
        status,
    );
    outcome.quality = Some(film.descriptor.quality);
    outcome.resolution = Some(film.resolution);
    outcome.matched = film.matched.clone();
    outcome
}

fn part_of(descriptor: &FilmDescriptor, source: &Path) -> Option<u32> {
    descriptor
        .video_files
        .iter()
        .find(|v| v.path == source)
        .and_then(|v| v.part)
}

/// Film status from its video transfers, with a reason unless it was placed.
fn film_status(transfer: &FilmTransfer) -> (FilmStatus, Option<String>) {
    let mut videos = transfer.results.iter().filter(|r| r.kind == FileKind::Video);

    if transfer.all_videos_transferred() {
        let copied = videos.any(|r| r.status == TransferStatus::Copied);
        return if copied {
            (FilmStatus::Copied, None)
        } else {
            (FilmStatus::Moved, None)
        };
    }

    let Some(first) = videos.find(|r| !r.is_transferred()) else {
        return (FilmStatus::Failed, Some("no video files to place".to_string()));
    };
    let reason = match (&first.issue, &first.detail) {
        (_, Some(detail)) => detail.clone(),
        (Some(issue), None) => format!("{}: {}", issue, first.destination.display()),
        (None, None) => format!("{:?}", first.status),
    };
    if transfer.any_video_failed() {
        (FilmStatus::Failed, Some(reason))
    } else {
        (FilmStatus::Skipped, Some(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placer::{TransferIssue, TransferResult};

    fn result(status: TransferStatus, issue: Option<TransferIssue>) -> TransferResult {
        TransferResult {
            status,
            kind: FileKind::Video,
            source: PathBuf::from("/in/heat.mkv"),
            destination: PathBuf::from("/out/Heat (1995).mkv"),
            as_if: false,
            issue,
            detail: None,
            size_bytes: 1,
        }
    }

    #[test]
    fn test_film_status_from_transfers() {
        let moved = FilmTransfer {
            results: vec![result(TransferStatus::Moved, None)],
            replaced: Vec::new(),
        };
        assert_eq!(film_status(&moved), (FilmStatus::Moved, None));

        let copied = FilmTransfer {
            results: vec![
                result(TransferStatus::Moved, None),
                result(TransferStatus::Copied, None),
            ],
            replaced: Vec::new(),
        };
        assert_eq!(film_status(&copied).0, FilmStatus::Copied);

        let exists = FilmTransfer {
            results: vec![result(
                TransferStatus::Skipped,
                Some(TransferIssue::DestinationExists),
            )],
            replaced: Vec::new(),
        };
        let (status, reason) = film_status(&exists);
        assert_eq!(status, FilmStatus::Skipped);
        assert!(reason.unwrap().starts_with("destination exists"));

        let failed = FilmTransfer {
            results: vec![result(TransferStatus::Failed, Some(TransferIssue::IoError))],
            replaced: Vec::new(),
        };
        assert_eq!(film_status(&failed).0, FilmStatus::Failed);
        assert_eq!(film_status(&FilmTransfer::default()).0, FilmStatus::Failed);
    }

    #[test]
    fn test_part_of_matches_source() {
        let mut descriptor = crate::testing::fixtures::descriptor("Heat", Some(1995));
        descriptor.video_files = vec![
            crate::testing::fixtures::video("/in/Heat/heat.cd1.avi", 10, Some(1)),
            crate::testing::fixtures::video("/in/Heat/heat.cd2.avi", 9, Some(2)),
        ];
        assert_eq!(part_of(&descriptor, Path::new("/in/Heat/heat.cd2.avi")), Some(2));
        assert_eq!(part_of(&descriptor, Path::new("/in/other.avi")), None);
    }
}
