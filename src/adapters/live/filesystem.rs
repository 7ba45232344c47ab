//! Live filesystem adapter using `std::fs` and `walkdir`.

use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::ports::filesystem::FileSystem;

/// Live filesystem adapter backed by real disk I/O.
pub struct LiveFileSystem;

impl FileSystem for LiveFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        std::fs::write(path, contents)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::copy(from, to).map(|_| ())
    }

    fn list_files(&self, root: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(root).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(io::Error::from(e)),
                Err(e) => {
                    tracing::warn!("skipping unreadable path: {e}");
                    continue;
                }
            };
            if entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == extension)
            {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_matching_files_recursively() {
        let dir = std::env::temp_dir().join("docfill_live_fs_list");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("pkg/sub")).unwrap();
        std::fs::write(dir.join("b.py"), "").unwrap();
        std::fs::write(dir.join("a.py"), "").unwrap();
        std::fs::write(dir.join("notes.txt"), "").unwrap();
        std::fs::write(dir.join("pkg/sub/c.py"), "").unwrap();
        std::fs::create_dir_all(dir.join("looks_like.py")).unwrap();

        let files = LiveFileSystem.list_files(&dir, "py").unwrap();
        let names: Vec<_> =
            files.iter().map(|p| p.strip_prefix(&dir).unwrap().to_path_buf()).collect();
        assert_eq!(
            names,
            vec![PathBuf::from("a.py"), PathBuf::from("b.py"), PathBuf::from("pkg/sub/c.py")]
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn copy_and_write_round_trip() {
        let dir = std::env::temp_dir().join("docfill_live_fs_copy");
        std::fs::create_dir_all(&dir).unwrap();
        let original = dir.join("m.py");
        let backup = dir.join("m.py.bak");

        LiveFileSystem.write(&original, "x = 1\n").unwrap();
        LiveFileSystem.copy(&original, &backup).unwrap();
        assert_eq!(LiveFileSystem.read_to_string(&backup).unwrap(), "x = 1\n");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_entries_below_root_are_skipped() {
        let dir = std::env::temp_dir().join("docfill_live_fs_skip");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("pkg")).unwrap();
        std::fs::write(dir.join("pkg/a.py"), "").unwrap();
        std::fs::write(dir.join("z.py"), "").unwrap();
        std::os::unix::fs::symlink(&dir, dir.join("pkg/loop")).unwrap();
        std::os::unix::fs::symlink(dir.join("gone.py"), dir.join("dangling.py")).unwrap();

        let files = LiveFileSystem.list_files(&dir, "py").unwrap();
        assert_eq!(files, vec![dir.join("pkg/a.py"), dir.join("z.py")]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = std::env::temp_dir().join("docfill_live_fs_missing_root");
        let _ = std::fs::remove_dir_all(&dir);
        assert!(LiveFileSystem.list_files(&dir, "py").is_err());
    }
}
