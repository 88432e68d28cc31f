//! Turns a command-line input into a directory to walk.

use std::fs::File;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::info;
use zip::ZipArchive;

use crate::error::{ArchiveError, ArchiveResult};

/// Extensions, compared case-insensitively, that are extracted.
pub const ARCHIVE_EXTENSIONS: [&str; 2] = ["zip", "jar"];

/// One side of a comparison, resolved to a directory.
///
/// An extracted archive lives in a temporary directory that is removed
/// when the root is dropped.
#[derive(Debug)]
pub struct ArtifactRoot {
    path: PathBuf,
    source: PathBuf,
    extracted: Option<TempDir>,
}

impl ArtifactRoot {
    /// Directory to walk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The input the root was resolved from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn is_extracted(&self) -> bool {
        self.extracted.is_some()
    }
}

/// Whether `path` names a zip or jar archive.
pub fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| ARCHIVE_EXTENSIONS.iter().any(|a| e.eq_ignore_ascii_case(a)))
}

/// Resolve `input` to an [`ArtifactRoot`]: directories are used in place,
/// archives are extracted into a fresh temporary directory.
pub fn resolve(input: &Path) -> ArchiveResult<ArtifactRoot> {
    if !input.exists() {
        return Err(ArchiveError::NotFound(input.to_path_buf()));
    }
    let source = input.canonicalize().map_err(ArchiveError::io(input))?;

    if source.is_dir() {
        return Ok(ArtifactRoot {
            path: source.clone(),
            source,
            extracted: None,
        });
    }
    if !source.is_file() || !is_archive(&source) {
        return Err(ArchiveError::Unsupported(input.to_path_buf()));
    }

    let dir = tempfile::Builder::new()
        .prefix("twinbuild-")
        .tempdir()
        .map_err(ArchiveError::io(std::env::temp_dir()))?;
    extract(&source, dir.path())?;
    info!(archive = %source.display(), into = %dir.path().display(), "extracted");

    Ok(ArtifactRoot {
        path: dir.path().to_path_buf(),
        source,
        extracted: Some(dir),
    })
}

fn extract(archive: &Path, dest: &Path) -> ArchiveResult<()> {
    let file = File::open(archive).map_err(ArchiveError::io(archive))?;
    let to_extract_error = |source| ArchiveError::Extract {
        path: archive.to_path_buf(),
        source,
    };
    let mut zip = ZipArchive::new(file).map_err(to_extract_error)?;
    zip.extract(dest).map_err(to_extract_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::pack_directory;

    #[test]
    fn recognizes_archive_extensions() {
        assert!(is_archive(Path::new("build/orig.zip")));
        assert!(is_archive(Path::new("lib/app.JAR")));
        assert!(!is_archive(Path::new("classes")));
        assert!(!is_archive(Path::new("notes.txt")));
    }

    #[test]
    fn directory_is_used_in_place() {
        let tmp = tempfile::tempdir().unwrap();
        let root = resolve(tmp.path()).unwrap();
        assert!(!root.is_extracted());
        assert_eq!(root.path(), tmp.path().canonicalize().unwrap());
    }

    #[test]
    fn archive_is_extracted_and_cleaned_up() {
        let tmp = tempfile::tempdir().unwrap();
        let tree = tmp.path().join("tree");
        std::fs::create_dir_all(tree.join("p")).unwrap();
        std::fs::write(tree.join("p/A.class"), [0xCA, 0xFE]).unwrap();
        let jar = tmp.path().join("build.jar");
        pack_directory(&tree, &jar).unwrap();

        let root = resolve(&jar).unwrap();
        assert!(root.is_extracted());
        assert_eq!(root.source(), jar.canonicalize().unwrap());
        let extracted = root.path().to_path_buf();
        assert_eq!(std::fs::read(extracted.join("p/A.class")).unwrap(), [0xCA, 0xFE]);

        drop(root);
        assert!(!extracted.exists());
    }

    #[test]
    fn missing_input_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let err = resolve(&tmp.path().join("nope.zip")).unwrap_err();
        assert!(matches!(err, ArchiveError::NotFound(_)));
    }

    #[test]
    fn plain_file_is_unsupported() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("notes.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(matches!(resolve(&file), Err(ArchiveError::Unsupported(_))));
    }

    #[test]
    fn corrupt_archive_fails_to_extract() {
        let tmp = tempfile::tempdir().unwrap();
        let zip = tmp.path().join("broken.zip");
        std::fs::write(&zip, b"definitely not a zip").unwrap();
        assert!(matches!(resolve(&zip), Err(ArchiveError::Extract { .. })));
    }
}
