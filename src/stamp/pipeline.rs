//! The stamping pipeline.
//!
//! # Overview
//!
//! [`Stamper`] walks a tree and, for every candidate file:
//!
//! 1. computes the digest of its contents,
//! 2. reads the stored digest from the attribute store,
//! 3. decides staleness,
//! 4. when stale, runs the regenerator and, only if that succeeds,
//!    writes the new digest back.
//!
//! Each file yields a tagged [`FileOutcome`]. Per-file failures become
//! `Skipped` and never stop the walk; a configuration-level attribute
//! failure becomes `Fatal` and aborts the whole run.
//!
//! # Concurrency
//!
//! With `jobs == 1` (the default) files are processed sequentially while the
//! walk is in progress. With more jobs the walk is collected first and
//! files are fanned out over a bounded rayon pool; every path is owned by
//! exactly one worker and reports are returned in walk order either way.
//!
//! # Example
//!
//! ```no_run
//! use hashstamp::regen::NoopRegenerator;
//! use hashstamp::stamp::{Stamper, StamperConfig};
//! use hashstamp::store::XattrStore;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let stamper = Stamper::new(
//!     StamperConfig::default(),
//!     Arc::new(XattrStore::new()),
//!     Arc::new(NoopRegenerator),
//! );
//! let report = stamper.run(Path::new("/usr/lib/python3")).unwrap();
//! println!("{} added, {} updated", report.summary.added, report.summary.updated);
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use super::{
    Action, FileOutcome, FileReport, RunMode, RunReport, RunSummary, SkipReason, StampError,
    Verdict,
};
use crate::error::chain_message;
use crate::regen::Regenerator;
use crate::scanner::{FileEntry, HashAlgorithm, Hasher, ScanError, Walker, WalkerConfig};
use crate::store::{AttributeStore, DEFAULT_ATTR_NAME};

/// Configuration for a [`Stamper`].
#[derive(Debug, Clone)]
pub struct StamperConfig {
    /// Name of the attribute holding the digest.
    pub attr_name: String,
    /// Digest algorithm.
    pub algorithm: HashAlgorithm,
    /// Candidate file selection.
    pub walker: WalkerConfig,
    /// Number of worker threads. 1 means sequential.
    pub jobs: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for StamperConfig {
    fn default() -> Self {
        Self {
            attr_name: DEFAULT_ATTR_NAME.to_string(),
            algorithm: HashAlgorithm::default(),
            walker: WalkerConfig::default(),
            jobs: 1,
            shutdown_flag: None,
        }
    }
}

impl StamperConfig {
    /// Set the attribute name.
    #[must_use]
    pub fn with_attr_name(mut self, name: impl Into<String>) -> Self {
        self.attr_name = name.into();
        self
    }

    /// Set the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker(mut self, walker: WalkerConfig) -> Self {
        self.walker = walker;
        self
    }

    /// Set the worker count (at least 1).
    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Drives the walk → digest → compare → regenerate → write pipeline.
pub struct Stamper {
    config: StamperConfig,
    hasher: Hasher,
    store: Arc<dyn AttributeStore>,
    regenerator: Arc<dyn Regenerator>,
}

impl std::fmt::Debug for Stamper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stamper")
            .field("config", &self.config)
            .field("store", &"<store>")
            .field("regenerator", &"<regenerator>")
            .finish()
    }
}

impl Stamper {
    /// Create a new stamper.
    #[must_use]
    pub fn new(
        config: StamperConfig,
        store: Arc<dyn AttributeStore>,
        regenerator: Arc<dyn Regenerator>,
    ) -> Self {
        Self {
            hasher: Hasher::new(config.algorithm),
            config,
            store,
            regenerator,
        }
    }

    /// Process every candidate file under `root`, regenerating stale files
    /// and advancing their stored digest.
    ///
    /// # Errors
    ///
    /// Returns [`StampError`] for an unusable root or an attribute namespace
    /// that the filesystem does not support. Per-file failures are reported
    /// in the returned [`RunReport`] instead.
    pub fn run(&self, root: &Path) -> Result<RunReport, StampError> {
        self.execute(root, RunMode::Stamp)
    }

    /// Report staleness under `root` without regenerating or writing.
    ///
    /// # Errors
    ///
    /// Same as [`Stamper::run`].
    pub fn verify(&self, root: &Path) -> Result<RunReport, StampError> {
        self.execute(root, RunMode::Verify)
    }

    fn execute(&self, root: &Path, mode: RunMode) -> Result<RunReport, StampError> {
        let start = Instant::now();
        let root =
            std::path::absolute(root).map_err(|e| StampError::Root(ScanError::from_io(root, e)))?;

        let mut walker = Walker::new(&root, self.config.walker.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }
        walker.validate_root().map_err(StampError::Root)?;

        if let Err(e) = self.store.check_support(&root, &self.config.attr_name) {
            if e.is_fatal() {
                return Err(e.into());
            }
            log::debug!("Attribute support check on {} inconclusive: {}", root.display(), e);
        }

        log::debug!(
            "{:?} pass over {} ({}, attribute {}, {} job(s))",
            mode,
            root.display(),
            self.config.algorithm,
            self.config.attr_name,
            self.config.jobs
        );

        let files = if self.config.jobs <= 1 {
            self.process_sequential(&walker, mode)?
        } else {
            self.process_parallel(&walker, mode)?
        };

        let mut summary = RunSummary::from_reports(&files, start.elapsed());
        summary.interrupted |= self.config.is_shutdown_requested();

        log::debug!(
            "Processed {} files: {} unchanged, {} added, {} updated, {} skipped in {:.2?}",
            summary.scanned,
            summary.unchanged,
            summary.added,
            summary.updated,
            summary.skipped,
            summary.duration
        );

        Ok(RunReport {
            mode,
            root,
            algorithm: self.config.algorithm,
            attr_name: self.config.attr_name.clone(),
            files,
            summary,
        })
    }

    /// Process entries as the walk yields them, stopping at the first fatal error.
    fn process_sequential(
        &self,
        walker: &Walker,
        mode: RunMode,
    ) -> Result<Vec<FileReport>, StampError> {
        let mut files = Vec::new();
        for entry in walker.walk() {
            let report = self.process_entry(entry, mode);
            match report.outcome {
                FileOutcome::Fatal(err) => return Err(err.into()),
                outcome => files.push(FileReport { outcome, ..report }),
            }
        }
        Ok(files)
    }

    /// Process entries on a bounded pool. A fatal error stops workers from
    /// picking up further files.
    fn process_parallel(
        &self,
        walker: &Walker,
        mode: RunMode,
    ) -> Result<Vec<FileReport>, StampError> {
        let entries: Vec<Result<FileEntry, ScanError>> = walker.walk().collect();
        log::debug!(
            "Dispatching {} entries to {} workers",
            entries.len(),
            self.config.jobs
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.jobs)
            .build()?;
        let aborted = AtomicBool::new(false);

        let reports: Vec<FileReport> = pool.install(|| {
            entries
                .into_par_iter()
                .map(|entry| {
                    if aborted.load(Ordering::SeqCst) {
                        if let Ok(file) = entry {
                            return FileReport {
                                path: file.path,
                                outcome: FileOutcome::Skipped(SkipReason::Interrupted),
                                digest: None,
                            };
                        }
                    }
                    let report = self.process_entry(entry, mode);
                    if matches!(report.outcome, FileOutcome::Fatal(_)) {
                        aborted.store(true, Ordering::SeqCst);
                    }
                    report
                })
                .collect()
        });

        let mut files = Vec::with_capacity(reports.len());
        for report in reports {
            match report.outcome {
                FileOutcome::Fatal(err) => return Err(err.into()),
                outcome => files.push(FileReport { outcome, ..report }),
            }
        }
        Ok(files)
    }

    fn process_entry(&self, entry: Result<FileEntry, ScanError>, mode: RunMode) -> FileReport {
        match entry {
            Ok(file) => {
                let (outcome, digest) = self.process_file(&file.path, mode);
                FileReport {
                    path: file.path,
                    outcome,
                    digest,
                }
            }
            Err(e) => FileReport {
                path: e.path().to_path_buf(),
                outcome: FileOutcome::Skipped(SkipReason::Walk(e)),
                digest: None,
            },
        }
    }

    /// Run one file through the pipeline.
    fn process_file(&self, path: &Path, mode: RunMode) -> (FileOutcome, Option<String>) {
        if self.config.is_shutdown_requested() {
            return (FileOutcome::Skipped(SkipReason::Interrupted), None);
        }

        let digest = match self.hasher.digest_file(path) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("Skipping {}: {}", path.display(), chain_message(&e));
                return (FileOutcome::Skipped(SkipReason::Read(e)), None);
            }
        };
        let hex = Some(digest.as_hex().to_string());

        let stored = match self.store.get(path, &self.config.attr_name) {
            Ok(value) => value,
            Err(e) if e.is_fatal() => return (FileOutcome::Fatal(e), hex),
            Err(e) => {
                log::warn!("Skipping {}: {}", path.display(), chain_message(&e));
                return (FileOutcome::Skipped(SkipReason::ReadAttribute(e)), hex);
            }
        };

        let verdict = Verdict::decide(stored.as_deref(), &digest);
        if !verdict.is_stale() {
            log::trace!("Unchanged: {}", path.display());
            return (FileOutcome::Processed(Action::Unchanged), hex);
        }
        let action = Action::from(verdict);

        if mode == RunMode::Verify {
            log::debug!("Stale ({:?}): {}", verdict, path.display());
            return (FileOutcome::Processed(action), hex);
        }

        if let Err(e) = self.regenerator.regenerate(path) {
            log::warn!("Skipping {}: {}", path.display(), chain_message(&e));
            return (FileOutcome::Skipped(SkipReason::Regenerate(e)), hex);
        }

        match self
            .store
            .set(path, &self.config.attr_name, digest.as_bytes())
        {
            Ok(()) => {
                log::debug!("{:?} digest {} on {}", action, digest, path.display());
                (FileOutcome::Processed(action), hex)
            }
            Err(e) if e.is_fatal() => (FileOutcome::Fatal(e), hex),
            Err(e) => {
                log::warn!("Skipping {}: {}", path.display(), chain_message(&e));
                (FileOutcome::Skipped(SkipReason::WriteAttribute(e)), hex)
            }
        }
    }
}
