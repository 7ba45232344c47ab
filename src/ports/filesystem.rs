//! Filesystem port for file I/O operations.

use std::io;
use std::path::{Path, PathBuf};

/// Provides filesystem access for reading, writing and enumerating files.
///
/// Abstracting the filesystem lets the pipeline be tested in memory and
/// lets tests observe exactly which files were touched.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or is not valid UTF-8.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Writes the given contents to a file, creating or overwriting it.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails (permissions, disk full, etc.).
    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;

    /// Copies `from` to `to`, overwriting `to`.
    ///
    /// # Errors
    ///
    /// Returns an error if `from` cannot be read or `to` cannot be written.
    fn copy(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Lists regular files under `root` (recursively) whose extension is
    /// `extension`, sorted by path. Entries below `root` that cannot be read
    /// are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` itself cannot be traversed.
    fn list_files(&self, root: &Path, extension: &str) -> io::Result<Vec<PathBuf>>;
}
