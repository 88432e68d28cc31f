//! Walks the original tree and compares every entry with its incremental
//! counterpart on a bounded pool of blocking workers.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::adapter::{ClassFileDisassembler, Disassembler};
use crate::classify::{TreeEntry, UnitKind};
use crate::compare::{Comparator, ComparisonOutcome, Divergence, Side};
use crate::config::DiffConfig;
use crate::error::{DiffError, DiffResult};
use crate::normalize::NormalizedText;
use crate::recorder::DiffRecorder;
use crate::report::{DiffReport, ReportBuilder};

/// Depth, below the original root, of directories logged as progress.
const PROGRESS_DEPTH: usize = 2;

/// The tree differencing engine.
#[derive(Debug)]
pub struct DiffEngine {
    config: DiffConfig,
    comparator: Arc<Comparator>,
}

/// Result of one dispatched entry.
struct EntryResult {
    outcome: ComparisonOutcome,
    detail: Option<String>,
    failures: usize,
}

/// Per-run state shared by all workers.
struct Worker {
    comparator: Arc<Comparator>,
    recorder: Option<DiffRecorder>,
    original: PathBuf,
    incremental: PathBuf,
}

impl DiffEngine {
    /// An engine that disassembles with the built-in class-file textifier.
    pub fn new(config: DiffConfig) -> Self {
        Self::with_disassembler(config, Arc::new(ClassFileDisassembler))
    }

    pub fn with_disassembler(config: DiffConfig, disassembler: Arc<dyn Disassembler>) -> Self {
        let comparator = Arc::new(Comparator::new(disassembler, config.disassembly_options()));
        Self { config, comparator }
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Compare every file under `original` with the file at the same
    /// relative path under `incremental`.
    ///
    /// Files that exist only under `incremental` are never visited. The
    /// diagnostics directory, when configured, is recreated before the walk.
    pub async fn run(&self, original: &Path, incremental: &Path) -> DiffResult<DiffReport> {
        for root in [original, incremental] {
            if !root.is_dir() {
                return Err(DiffError::NotADirectory(root.to_path_buf()));
            }
        }

        let recorder = match &self.config.diagnostics_dir {
            Some(dir) => Some(DiffRecorder::create(dir)?),
            None => None,
        };
        let worker = Arc::new(Worker {
            comparator: Arc::clone(&self.comparator),
            recorder,
            original: original.to_path_buf(),
            incremental: incremental.to_path_buf(),
        });

        let root = original.to_path_buf();
        let entries = tokio::task::spawn_blocking(move || enumerate(&root)).await??;
        info!(entries = entries.len(), "enumerated original tree");

        let semaphore = Arc::new(Semaphore::new(self.config.workers.max(1)));
        let mut tasks = JoinSet::new();
        let mut builder = ReportBuilder::new();

        for (ordinal, entry) in entries.iter().enumerate() {
            builder.visit(entry.kind);
            if entry.kind == UnitKind::Opaque && !self.config.compare_other_files {
                continue;
            }
            let permit = Arc::clone(&semaphore).acquire_owned().await?;
            let worker = Arc::clone(&worker);
            let entry = entry.clone();
            tasks.spawn_blocking(move || {
                let _permit = permit;
                let result = std::panic::catch_unwind(AssertUnwindSafe(|| worker.process(&entry)))
                    .unwrap_or_else(|payload| EntryResult::panicked(&entry, payload.as_ref()));
                (ordinal, result)
            });
        }

        let mut results = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            results.push(joined?);
        }
        results.sort_by_key(|(ordinal, _)| *ordinal);

        let (entries, results) = if worker.recorder.is_some() {
            let worker = Arc::clone(&worker);
            tokio::task::spawn_blocking(move || {
                worker.record_all(&entries, &results);
                (entries, results)
            })
            .await?
        } else {
            (entries, results)
        };

        for (ordinal, result) in results {
            let entry = &entries[ordinal];
            builder.add_disassembly_failures(result.failures);
            builder.record(&entry.relative_path, entry.kind, &result.outcome, result.detail);
        }

        let report = builder.finish();
        info!(
            files = report.files_visited,
            compiled_units = report.compiled_units_visited,
            differing = report.differing_units.len(),
            "diff complete"
        );
        Ok(report)
    }
}

/// Every non-directory entry under `root`, relative to it, in file name
/// order.
fn enumerate(root: &Path) -> DiffResult<Vec<TreeEntry>> {
    let mut entries = Vec::new();
    for item in WalkDir::new(root).sort_by_file_name() {
        let item = item.map_err(|source| DiffError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if item.file_type().is_dir() {
            if item.depth() == PROGRESS_DEPTH {
                info!(dir = %item.path().display(), "scanning");
            }
            continue;
        }
        if let Ok(relative) = item.path().strip_prefix(root) {
            entries.push(TreeEntry::new(relative));
        }
    }
    Ok(entries)
}

impl EntryResult {
    /// A comparison that panicked counts as differing for its entry.
    fn panicked(entry: &TreeEntry, payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        let reason = format!("comparison panicked: {message}");
        warn!(path = %entry.relative_path.display(), %reason, "worker panicked");
        let divergence = match entry.kind {
            UnitKind::Compiled => {
                let text = NormalizedText::from_failure(&reason);
                Divergence::Compiled {
                    original: text.clone(),
                    incremental: text,
                }
            }
            UnitKind::Opaque => Divergence::Opaque,
        };
        Self {
            outcome: ComparisonOutcome::Differing(divergence),
            detail: Some(reason),
            failures: 0,
        }
    }
}

impl Worker {
    /// Write diagnostics for differing compiled units in walk order, so the
    /// unit that keeps a shared file name does not depend on scheduling.
    fn record_all(&self, entries: &[TreeEntry], results: &[(usize, EntryResult)]) {
        let Some(recorder) = &self.recorder else {
            return;
        };
        for (ordinal, result) in results {
            let ComparisonOutcome::Differing(Divergence::Compiled {
                original: original_text,
                incremental: incremental_text,
            }) = &result.outcome
            else {
                continue;
            };
            let entry = &entries[*ordinal];
            let path = &entry.relative_path;
            let name = entry.file_name();
            match recorder.record(
                &name,
                &self.original.join(path),
                &self.incremental.join(path),
                original_text,
                incremental_text,
            ) {
                Ok(true) => {}
                Ok(false) => warn!(unit = %name, path = %path.display(), "diagnostics already recorded under this name"),
                Err(e) => warn!(error = %e, "failed to record diagnostics"),
            }
        }
    }

    fn process(&self, entry: &TreeEntry) -> EntryResult {
        let path = &entry.relative_path;
        let original = self.original.join(path);
        let incremental = self.incremental.join(path);

        if !incremental.exists() {
            warn!(path = %path.display(), "missing in incremental build");
            return EntryResult {
                outcome: ComparisonOutcome::Missing,
                detail: None,
                failures: 0,
            };
        }

        let comparison = self
            .comparator
            .compare_paths(entry.kind, &original, &incremental);
        for failure in &comparison.failures {
            let side = match failure.side {
                Side::Original => "original",
                Side::Incremental => "incremental",
            };
            warn!(path = %path.display(), side, reason = %failure.reason, "could not disassemble");
        }

        debug!(path = %path.display(), identical = comparison.outcome.is_identical(), "compared");
        let detail = (!comparison.failures.is_empty()).then(|| {
            comparison
                .failures
                .iter()
                .map(|f| f.reason.as_str())
                .collect::<Vec<_>>()
                .join("; ")
        });
        EntryResult {
            failures: comparison.failures.len(),
            outcome: comparison.outcome,
            detail,
        }
    }
}
