//! Filesystem port for file I/O operations.

use std::path::{Path, PathBuf};

/// Boxed error type returned by filesystem operations.
pub type FsError = Box<dyn std::error::Error + Send + Sync>;

/// Provides filesystem access for reading, writing, and discovering files.
///
/// Abstracting the filesystem lets the materialization stages run against
/// an in-memory tree in tests without touching the real disk.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or is not valid UTF-8.
    fn read_to_string(&self, path: &Path) -> Result<String, FsError>;

    /// Reads the raw bytes of a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be read.
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, FsError>;

    /// Writes the given contents to a file, creating parent directories and
    /// overwriting any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails (permissions, disk full, etc.).
    fn write(&self, path: &Path, contents: &str) -> Result<(), FsError>;

    /// Returns `true` if an entry exists at the path. A dangling symlink
    /// counts as existing.
    fn exists(&self, path: &Path) -> bool;

    /// Returns `true` if the path exists and is a regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// Resolves `path` to an absolute path with every symlink followed.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist or cannot be resolved.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf, FsError>;

    /// Recursively lists every regular file under `root`, sorted. Entries
    /// beneath `root` that cannot be read are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` itself cannot be traversed.
    fn list_files(&self, root: &Path) -> Result<Vec<PathBuf>, FsError>;
}
