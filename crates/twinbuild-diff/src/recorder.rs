//! Persists artifacts of differing compiled units for inspection.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use similar::TextDiff;
use tracing::debug;

use crate::error::{RecordError, RecordResult};
use crate::normalize::NormalizedText;

/// Subdirectory holding the raw class file copies.
pub const CLASSES_DIR: &str = "classes";

/// Writes per-unit diagnostics into a directory that is wiped on creation.
///
/// Artifacts are keyed by file name. The first differing unit with a given
/// name claims it for the run; later ones are skipped.
#[derive(Debug)]
pub struct DiffRecorder {
    root: PathBuf,
    classes: PathBuf,
    claimed: Mutex<HashSet<String>>,
}

fn prepare(path: &Path) -> impl FnOnce(std::io::Error) -> RecordError + '_ {
    move |source| RecordError::Prepare {
        path: path.to_path_buf(),
        source,
    }
}

fn write(path: PathBuf, contents: &[u8]) -> RecordResult<()> {
    std::fs::write(&path, contents).map_err(|source| RecordError::Write { path, source })
}

fn copy(from: &Path, to: PathBuf) -> RecordResult<()> {
    std::fs::copy(from, &to)
        .map(|_| ())
        .map_err(|source| RecordError::Write { path: to, source })
}

impl DiffRecorder {
    /// Delete `dir` if present, then recreate it with its `classes`
    /// subdirectory.
    pub fn create(dir: impl Into<PathBuf>) -> RecordResult<Self> {
        let root = dir.into();
        match std::fs::remove_dir_all(&root) {
            Ok(()) => debug!(dir = %root.display(), "cleared diagnostics directory"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(prepare(&root)(e)),
        }
        let classes = root.join(CLASSES_DIR);
        std::fs::create_dir_all(&classes).map_err(prepare(&classes))?;
        Ok(Self {
            root,
            classes,
            claimed: Mutex::new(HashSet::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write both canonical texts, a unified diff of them and copies of both
    /// raw files. Returns `Ok(false)` when `name` was already recorded.
    pub fn record(
        &self,
        name: &str,
        original: &Path,
        incremental: &Path,
        original_text: &NormalizedText,
        incremental_text: &NormalizedText,
    ) -> RecordResult<bool> {
        {
            let mut claimed = self.claimed.lock().unwrap_or_else(|e| e.into_inner());
            if !claimed.insert(name.to_string()) {
                return Ok(false);
            }
        }

        write(self.root.join(format!("{name}.o.txt")), original_text.as_str().as_bytes())?;
        write(self.root.join(format!("{name}.i.txt")), incremental_text.as_str().as_bytes())?;
        write(
            self.root.join(format!("{name}.diff")),
            unified_diff(name, original_text, incremental_text).as_bytes(),
        )?;
        copy(original, self.classes.join(format!("{name}.o.class")))?;
        copy(incremental, self.classes.join(format!("{name}.i.class")))?;
        debug!(unit = name, "recorded diagnostics");
        Ok(true)
    }
}

/// Unified diff of two canonical texts with three lines of context.
pub fn unified_diff(name: &str, original: &NormalizedText, incremental: &NormalizedText) -> String {
    TextDiff::from_lines(original.as_str(), incremental.as_str())
        .unified_diff()
        .context_radius(3)
        .header(&format!("{name}.o.txt"), &format!("{name}.i.txt"))
        .to_string()
}
