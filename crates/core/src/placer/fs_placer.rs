//! File system placer implementation.

use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::error::PlacerError;
use super::types::{
    FileKind, FilmTransfer, PlannedFile, SweepReport, TransferIssue, TransferJob, TransferResult,
    TransferStatus, DUP_SUFFIX, PARTIAL_SUFFIX,
};
use crate::config::{ChecksumType, TransferConfig};
use crate::metrics;

/// Streaming hasher for the configured checksum type.
enum Hasher {
    Sha256(Sha256),
    Md5(md5::Context),
}

impl Hasher {
    fn new(checksum_type: ChecksumType) -> Self {
        match checksum_type {
            ChecksumType::Sha256 => Hasher::Sha256(Sha256::new()),
            ChecksumType::Md5 => Hasher::Md5(md5::Context::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Sha256(h) => h.update(data),
            Hasher::Md5(c) => c.consume(data),
        }
    }

    fn finish(self) -> String {
        match self {
            Hasher::Sha256(h) => format!("{:x}", h.finalize()),
            Hasher::Md5(c) => format!("{:x}", c.compute()),
        }
    }
}

/// `path` with `suffix` appended to its file name.
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// File system based placer.
///
/// Files are renamed into place when source and destination share a volume.
/// Otherwise, or with `always_copy`, they are copied to `<dest>.partial~`,
/// verified, renamed into place and only then removed from the source. An
/// existing file at the destination is moved aside to `<dest>.dup~` for the
/// final rename and restored if that rename fails.
pub struct FsPlacer {
    config: TransferConfig,
    test_mode: bool,
    /// Destination roots; a replaced duplicate's folder is only removed
    /// below the root that holds it.
    library_roots: Vec<PathBuf>,
}

impl FsPlacer {
    pub fn new(config: TransferConfig, test_mode: bool) -> Self {
        Self {
            config,
            test_mode,
            library_roots: Vec::new(),
        }
    }

    pub fn with_library_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.library_roots = roots;
        self
    }

    /// The deepest library root containing `path`.
    fn library_root_of(&self, path: &Path) -> Option<&Path> {
        self.library_roots
            .iter()
            .filter(|root| path.starts_with(root))
            .max_by_key(|root| root.components().count())
            .map(PathBuf::as_path)
    }

    pub fn is_test_mode(&self) -> bool {
        self.test_mode
    }

    /// Attempts to move a file atomically (rename).
    async fn try_atomic_move(source: &Path, destination: &Path) -> Result<bool, std::io::Error> {
        match fs::rename(source, destination).await {
            Ok(()) => Ok(true),
            Err(e) => {
                // Cross-filesystem moves fail with EXDEV (18 on Linux)
                if e.kind() == std::io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) {
                    Ok(false)
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Copies a file, hashing the source stream when a checksum is wanted.
    /// The copy is synced to disk before returning.
    async fn copy_file(
        &self,
        source: &Path,
        destination: &Path,
        checksum: Option<ChecksumType>,
    ) -> Result<(u64, Option<String>), PlacerError> {
        let source_file = File::open(source).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PlacerError::SourceNotFound {
                    path: source.to_path_buf(),
                }
            } else {
                PlacerError::Io(e)
            }
        })?;

        let dest_file = File::create(destination).await.map_err(|e| {
            PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;

        let mut reader = BufReader::with_capacity(self.config.buffer_size, source_file);
        let mut writer = BufWriter::with_capacity(self.config.buffer_size, dest_file);
        let mut hasher = checksum.map(Hasher::new);

        let mut total_bytes = 0u64;
        let mut buffer = vec![0u8; self.config.buffer_size];

        loop {
            let bytes_read = reader.read(&mut buffer).await.map_err(|e| {
                PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
            })?;

            if bytes_read == 0 {
                break;
            }

            if let Some(ref mut h) = hasher {
                h.update(&buffer[..bytes_read]);
            }

            writer.write_all(&buffer[..bytes_read]).await.map_err(|e| {
                PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
            })?;

            total_bytes += bytes_read as u64;
        }

        writer.flush().await.map_err(|e| {
            PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;
        writer.into_inner().sync_all().await.map_err(|e| {
            PlacerError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;

        Ok((total_bytes, hasher.map(Hasher::finish)))
    }

    /// Calculates the checksum of a file using the specified algorithm.
    async fn calculate_checksum(
        &self,
        path: &Path,
        checksum_type: ChecksumType,
    ) -> Result<String, PlacerError> {
        let file = File::open(path)
            .await
            .map_err(|e| PlacerError::ChecksumCalculationFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        let mut reader = BufReader::with_capacity(self.config.buffer_size, file);
        let mut buffer = vec![0u8; self.config.buffer_size];
        let mut hasher = Hasher::new(checksum_type);

        loop {
            let bytes_read = reader.read(&mut buffer).await.map_err(|e| {
                PlacerError::ChecksumCalculationFailed {
                    path: path.to_path_buf(),
                    source: e,
                }
            })?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }
        Ok(hasher.finish())
    }

    /// Creates parent directories for a path.
    async fn ensure_parent_dirs(&self, path: &Path) -> Result<(), PlacerError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    PlacerError::DirectoryCreationFailed {
                        path: parent.to_path_buf(),
                        source: e,
                    }
                })?;
            }
        }
        Ok(())
    }

    /// Move an existing destination aside. Returns the `.dup~` path if one was made.
    async fn move_aside(&self, destination: &Path) -> Result<Option<PathBuf>, PlacerError> {
        if !destination.exists() {
            return Ok(None);
        }
        let aside = with_suffix(destination, DUP_SUFFIX);
        fs::rename(destination, &aside)
            .await
            .map_err(|e| PlacerError::move_failed(destination.to_path_buf(), aside.clone(), e))?;
        Ok(Some(aside))
    }

    async fn restore_aside(&self, aside: Option<PathBuf>, destination: &Path) {
        if let Some(aside) = aside {
            if let Err(e) = fs::rename(&aside, destination).await {
                warn!(
                    "Failed to restore {} to {}: {}",
                    aside.display(),
                    destination.display(),
                    e
                );
            }
        }
    }

    async fn drop_aside(&self, aside: Option<PathBuf>) {
        if let Some(aside) = aside {
            if let Err(e) = fs::remove_file(&aside).await {
                warn!("Failed to remove {}: {}", aside.display(), e);
            }
        }
    }

    /// Rename a source into place. `Ok(false)` when source and destination
    /// are on different volumes.
    async fn move_into_place(&self, source: &Path, destination: &Path) -> Result<bool, PlacerError> {
        let aside = self.move_aside(destination).await?;
        match Self::try_atomic_move(source, destination).await {
            Ok(true) => {
                self.drop_aside(aside).await;
                Ok(true)
            }
            Ok(false) => {
                self.restore_aside(aside, destination).await;
                Ok(false)
            }
            Err(e) => {
                self.restore_aside(aside, destination).await;
                Err(PlacerError::move_failed(
                    source.to_path_buf(),
                    destination.to_path_buf(),
                    e,
                ))
            }
        }
    }

    /// Rename a verified copy into place.
    async fn commit(&self, staged: &Path, destination: &Path) -> Result<(), PlacerError> {
        let aside = self.move_aside(destination).await?;
        if let Err(e) = fs::rename(staged, destination).await {
            self.restore_aside(aside, destination).await;
            return Err(PlacerError::move_failed(
                staged.to_path_buf(),
                destination.to_path_buf(),
                e,
            ));
        }
        self.drop_aside(aside).await;
        Ok(())
    }

    async fn copy_verified(&self, source: &Path, partial: &Path) -> Result<(), PlacerError> {
        let expected = fs::metadata(source)
            .await
            .map_err(|_| PlacerError::SourceNotFound {
                path: source.to_path_buf(),
            })?
            .len();

        let (written, source_hash) = self
            .copy_file(source, partial, self.config.verify_checksum)
            .await?;
        let actual = fs::metadata(partial).await?.len();
        if written != expected || actual != expected {
            return Err(PlacerError::SizeMismatch {
                path: partial.to_path_buf(),
                expected,
                actual,
            });
        }

        if let (Some(checksum_type), Some(expected)) = (self.config.verify_checksum, source_hash) {
            let actual = self.calculate_checksum(partial, checksum_type).await?;
            if actual != expected {
                return Err(PlacerError::ChecksumMismatch {
                    path: partial.to_path_buf(),
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Copy, verify and commit, then remove the source.
    async fn copy_into_place(&self, source: &Path, destination: &Path) -> Result<(), PlacerError> {
        let partial = with_suffix(destination, PARTIAL_SUFFIX);

        let staged = match self.copy_verified(source, &partial).await {
            Ok(()) => self.commit(&partial, destination).await,
            Err(e) => Err(e),
        };
        if let Err(e) = staged {
            if partial.exists() {
                if let Err(cleanup) = fs::remove_file(&partial).await {
                    warn!("Failed to remove {}: {}", partial.display(), cleanup);
                }
            }
            return Err(e);
        }

        if let Err(e) = fs::remove_file(source).await {
            warn!(
                "Copied {} but failed to remove the source: {}",
                source.display(),
                e
            );
        }
        Ok(())
    }

    async fn transfer(&self, file: &PlannedFile) -> Result<TransferStatus, PlacerError> {
        self.ensure_parent_dirs(&file.destination).await?;

        if !self.config.always_copy
            && self
                .move_into_place(&file.source, &file.destination)
                .await?
        {
            return Ok(TransferStatus::Moved);
        }

        debug!(
            "Copying {} to {}",
            file.source.display(),
            file.destination.display()
        );
        self.copy_into_place(&file.source, &file.destination).await?;
        Ok(TransferStatus::Copied)
    }

    /// Place a single file.
    pub async fn place_file(&self, file: &PlannedFile, overwrite: bool) -> TransferResult {
        if !file.source.exists() {
            return TransferResult::new(file, TransferStatus::Failed, self.test_mode)
                .with_issue(TransferIssue::SourceMissing, None);
        }
        if file.source == file.destination {
            debug!("{} is already in place", file.source.display());
            return TransferResult::new(file, TransferStatus::Skipped, self.test_mode)
                .with_issue(TransferIssue::SamePath, None);
        }
        if file.destination.exists() && !overwrite {
            info!(
                "Not replacing existing {}",
                file.destination.display()
            );
            return TransferResult::new(file, TransferStatus::Skipped, self.test_mode)
                .with_issue(TransferIssue::DestinationExists, None);
        }

        if self.test_mode {
            let status = if self.config.always_copy {
                TransferStatus::Copied
            } else {
                TransferStatus::Moved
            };
            info!(
                "[test] Would place {} at {}",
                file.source.display(),
                file.destination.display()
            );
            return TransferResult::new(file, status, true);
        }

        let started = Instant::now();
        match self.transfer(file).await {
            Ok(status) => {
                let mode = if status == TransferStatus::Moved {
                    "move"
                } else {
                    "copy"
                };
                metrics::BYTES_TRANSFERRED
                    .with_label_values(&[mode])
                    .inc_by(file.size_bytes);
                metrics::TRANSFER_DURATION
                    .with_label_values(&[mode])
                    .observe(started.elapsed().as_secs_f64());
                info!(
                    "{} {} to {}",
                    if status == TransferStatus::Moved { "Moved" } else { "Copied" },
                    file.source.display(),
                    file.destination.display()
                );
                TransferResult::new(file, status, false)
            }
            Err(e) => {
                warn!("Failed to place {}: {}", file.source.display(), e);
                TransferResult::new(file, TransferStatus::Failed, false)
                    .with_issue(e.issue(), Some(e.to_string()))
            }
        }
    }

    /// Place every file of a film, then remove the duplicates it replaces.
    ///
    /// Files after a video that was not placed are not attempted, and
    /// duplicates are only removed when every video file was placed.
    pub async fn execute(&self, job: &TransferJob) -> FilmTransfer {
        let mut transfer = FilmTransfer::default();
        let mut stopped = false;

        for file in &job.plan.files {
            if stopped {
                transfer.results.push(
                    TransferResult::new(file, TransferStatus::Skipped, self.test_mode)
                        .with_issue(TransferIssue::NotAttempted, None),
                );
                continue;
            }
            let result = self
                .place_file(file, job.may_overwrite(&file.destination))
                .await;
            if file.kind == FileKind::Video && !result.is_transferred() {
                stopped = true;
            }
            transfer.results.push(result);
        }

        if transfer.all_videos_transferred() {
            for existing in &job.replace {
                if transfer.results.iter().any(|r| &r.destination == existing) {
                    // replaced in place by the commit
                    transfer.replaced.push(existing.clone());
                    continue;
                }
                let root = self
                    .library_root_of(existing)
                    .unwrap_or(job.plan.root.as_path());
                match self.remove_replaced(existing, root).await {
                    Ok(()) => transfer.replaced.push(existing.clone()),
                    Err(e) => warn!("Replaced duplicate kept: {}", e),
                }
            }
            if !self.test_mode {
                metrics::DUPLICATES_REPLACED.inc_by(transfer.replaced.len() as u64);
            }
        }

        transfer
    }

    /// Remove a replaced duplicate, then its folder when that is left empty
    /// and lies below `root`.
    async fn remove_replaced(&self, existing: &Path, root: &Path) -> Result<(), PlacerError> {
        if self.test_mode {
            info!("[test] Would remove replaced {}", existing.display());
            return Ok(());
        }
        fs::remove_file(existing)
            .await
            .map_err(|e| PlacerError::CleanupFailed {
                path: existing.to_path_buf(),
                source: e,
            })?;
        info!("Removed replaced duplicate {}", existing.display());

        if let Some(parent) = existing.parent() {
            if parent != root && parent.starts_with(root) {
                match fs::remove_dir(parent).await {
                    Ok(()) => debug!("Removed empty folder {}", parent.display()),
                    Err(e) => debug!("Keeping folder {}: {}", parent.display(), e),
                }
            }
        }
        Ok(())
    }

    /// Remove orphaned `.partial~` copies and restore `.dup~` files whose
    /// canonical path is missing.
    pub async fn sweep_orphans(&self, roots: &[PathBuf]) -> SweepReport {
        let mut report = SweepReport::default();

        for root in roots {
            let orphans: Vec<PathBuf> = WalkDir::new(root)
                .min_depth(1)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| {
                    let name = p.to_string_lossy();
                    name.ends_with(PARTIAL_SUFFIX) || name.ends_with(DUP_SUFFIX)
                })
                .collect();

            for orphan in orphans {
                let name = orphan.to_string_lossy().into_owned();
                if let Some(canonical) = name.strip_suffix(PARTIAL_SUFFIX) {
                    debug!("Orphaned partial copy for {}", canonical);
                    if !self.test_mode {
                        if let Err(e) = fs::remove_file(&orphan).await {
                            warn!("Failed to remove {}: {}", orphan.display(), e);
                            continue;
                        }
                    }
                    report.partials_removed.push(orphan);
                } else if let Some(canonical) = name.strip_suffix(DUP_SUFFIX) {
                    let canonical = PathBuf::from(canonical);
                    if canonical.exists() {
                        warn!(
                            "Leaving {}: {} exists",
                            orphan.display(),
                            canonical.display()
                        );
                        report.dups_left.push(orphan);
                        continue;
                    }
                    if !self.test_mode {
                        if let Err(e) = fs::rename(&orphan, &canonical).await {
                            warn!("Failed to restore {}: {}", orphan.display(), e);
                            continue;
                        }
                    }
                    report.dups_restored.push(canonical);
                }
            }
        }

        if !report.partials_removed.is_empty() || !report.dups_restored.is_empty() {
            info!(
                "Swept {} partial copies, restored {} set-aside files",
                report.partials_removed.len(),
                report.dups_restored.len()
            );
        }
        report
    }

    /// Tidy a film folder whose videos were all placed: delete files that are
    /// not media, then empty folders. Source roots are never removed.
    pub async fn cleanup_film_source(
        &self,
        film_dir: &Path,
        sources: &[PathBuf],
        is_media: impl Fn(&Path) -> bool,
    ) -> usize {
        if self.test_mode || !film_dir.is_dir() {
            return 0;
        }
        let mut removed = 0;

        if self.config.remove_unwanted_files {
            let unwanted: Vec<PathBuf> = WalkDir::new(film_dir)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| !is_media(p))
                .collect();
            for path in unwanted {
                match fs::remove_file(&path).await {
                    Ok(()) => {
                        debug!("Removed unwanted {}", path.display());
                        removed += 1;
                    }
                    Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
                }
            }
        }

        remove_empty_dirs(film_dir, sources);
        removed
    }

    /// Remove empty folders under the source roots. Returns how many went.
    pub fn cleanup_empty_dirs(&self, sources: &[PathBuf]) -> usize {
        if self.test_mode || !self.config.cleanup_empty_dirs {
            return 0;
        }
        sources
            .iter()
            .filter(|s| s.is_dir())
            .map(|s| remove_empty_dirs(s, sources))
            .sum()
    }
}

/// Remove empty folders under `dir` (and `dir` itself), deepest first,
/// never touching a path in `protected`.
fn remove_empty_dirs(dir: &Path, protected: &[PathBuf]) -> usize {
    let dirs: Vec<PathBuf> = WalkDir::new(dir)
        .contents_first(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_dir())
        .map(|e| e.into_path())
        .filter(|p| !protected.iter().any(|root| root == p))
        .collect();

    dirs.iter()
        .filter(|d| match std::fs::remove_dir(d) {
            Ok(()) => {
                debug!("Removed empty folder {}", d.display());
                true
            }
            Err(_) => false,
        })
        .count()
}
