//! Splits tree entries into compiled units and opaque files.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// File extension of a compiled unit.
pub const COMPILED_UNIT_EXTENSION: &str = "class";

/// How an entry is compared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// Disassembled, normalized, then compared as text.
    Compiled,
    /// Compared byte for byte.
    Opaque,
}

/// Classify a path by its final segment. Matching is case-sensitive.
pub fn classify(path: &Path) -> UnitKind {
    match path.extension() {
        Some(ext) if ext == COMPILED_UNIT_EXTENSION => UnitKind::Compiled,
        _ => UnitKind::Opaque,
    }
}

/// A file found under the original root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEntry {
    /// Path relative to the root it was found under.
    pub relative_path: PathBuf,
    pub kind: UnitKind,
}

impl TreeEntry {
    pub fn new(relative_path: impl Into<PathBuf>) -> Self {
        let relative_path = relative_path.into();
        let kind = classify(&relative_path);
        Self {
            relative_path,
            kind,
        }
    }

    /// Final path segment, used to name diagnostics.
    pub fn file_name(&self) -> String {
        self.relative_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_files_are_compiled_units() {
        assert_eq!(classify(Path::new("a/b/C.class")), UnitKind::Compiled);
        assert_eq!(classify(Path::new("C$1.class")), UnitKind::Compiled);
    }

    #[test]
    fn everything_else_is_opaque() {
        for p in ["META-INF/MANIFEST.MF", "a/C.CLASS", "a/C.class.bak", "class", "a/.class/x"] {
            assert_eq!(classify(Path::new(p)), UnitKind::Opaque, "{p}");
        }
    }

    #[test]
    fn entry_keeps_file_name() {
        let entry = TreeEntry::new("p/q/Main.class");
        assert_eq!(entry.kind, UnitKind::Compiled);
        assert_eq!(entry.file_name(), "Main.class");
    }
}
