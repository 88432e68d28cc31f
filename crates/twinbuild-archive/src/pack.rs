use std::fs::File;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{ArchiveError, ArchiveResult};

/// Zip the contents of `dir` into `dest`, entries in file name order.
/// Returns the number of files written.
pub fn pack_directory(dir: &Path, dest: &Path) -> ArchiveResult<usize> {
    let file = File::create(dest).map_err(ArchiveError::io(dest))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let to_pack_error = |source| ArchiveError::Pack {
        path: dest.to_path_buf(),
        source,
    };

    let mut files = 0;
    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|source| ArchiveError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        let Ok(relative) = entry.path().strip_prefix(dir) else {
            continue;
        };
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if entry.file_type().is_dir() {
            writer
                .add_directory(format!("{name}/"), options)
                .map_err(to_pack_error)?;
        } else {
            writer.start_file(name, options).map_err(to_pack_error)?;
            let mut input = File::open(entry.path()).map_err(ArchiveError::io(entry.path()))?;
            std::io::copy(&mut input, &mut writer).map_err(ArchiveError::io(entry.path()))?;
            files += 1;
        }
    }

    writer.finish().map_err(to_pack_error)?;
    debug!(dir = %dir.display(), dest = %dest.display(), files, "packed directory");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zip::ZipArchive;

    #[test]
    fn packs_in_name_order() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("diff");
        std::fs::create_dir_all(dir.join("classes")).unwrap();
        std::fs::write(dir.join("B.class.o.txt"), "b").unwrap();
        std::fs::write(dir.join("A.class.o.txt"), "a").unwrap();
        std::fs::write(dir.join("classes/A.class.o.class"), [1]).unwrap();
        let dest = tmp.path().join("diff.zip");

        assert_eq!(pack_directory(&dir, &dest).unwrap(), 3);

        let mut archive = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["A.class.o.txt", "B.class.o.txt", "classes/", "classes/A.class.o.class"]
        );
    }

    #[test]
    fn empty_directory_packs_to_empty_archive() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("empty");
        std::fs::create_dir(&dir).unwrap();
        let dest = tmp.path().join("empty.zip");
        assert_eq!(pack_directory(&dir, &dest).unwrap(), 0);
        assert_eq!(ZipArchive::new(File::open(&dest).unwrap()).unwrap().len(), 0);
    }
}
