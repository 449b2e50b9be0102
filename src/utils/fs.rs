//! File system helpers used by the project environment
//!
//! Thin wrappers over `std::fs` that log what they touch.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Utility struct for file system operations
#[derive(Debug)]
pub struct FileSystemUtils;

impl FileSystemUtils {
    /// Create a new file system utilities instance
    pub fn new() -> Self {
        Self
    }

    /// Walk from `start` towards the file system root and return the first
    /// directory that contains a file named `file_name`.
    #[instrument(skip(self))]
    pub fn find_upwards<P: AsRef<Path> + std::fmt::Debug>(
        &self,
        start: P,
        file_name: &str,
    ) -> Option<PathBuf> {
        let mut current = Some(start.as_ref());

        while let Some(dir) = current {
            let candidate = dir.join(file_name);
            if self.is_file(&candidate) {
                debug!("Found {} in {}", file_name, dir.display());
                return Some(dir.to_path_buf());
            }
            current = dir.parent();
        }

        debug!("No {} found above {}", file_name, start.as_ref().display());
        None
    }

    /// Read a small marker file and return its trimmed contents, or `None`
    /// if it does not exist or is empty.
    #[instrument(skip(self))]
    pub fn read_marker<P: AsRef<Path> + std::fmt::Debug>(&self, path: P) -> io::Result<Option<String>> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => {
                let content = content.trim();
                Ok((!content.is_empty()).then(|| content.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Marker does not exist: {}", path.display());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Read file contents as string
    #[instrument(skip(self))]
    pub fn read_file_to_string<P: AsRef<Path> + std::fmt::Debug>(&self, path: P) -> io::Result<String> {
        let path = path.as_ref();
        debug!("Reading file: {}", path.display());
        fs::read_to_string(path)
    }

    /// Check if a path exists and is a file
    pub fn is_file<P: AsRef<Path>>(&self, path: P) -> bool {
        path.as_ref().is_file()
    }

    /// Check if a path exists and is a directory
    pub fn is_dir<P: AsRef<Path>>(&self, path: P) -> bool {
        path.as_ref().is_dir()
    }
}

impl Default for FileSystemUtils {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_upwards_from_nested_directory() {
        let temp_dir = TempDir::new().unwrap();
        let fs_utils = FileSystemUtils::new();

        fs::write(temp_dir.path().join("Machinefile"), "").unwrap();
        let nested = temp_dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let found = fs_utils.find_upwards(&nested, "Machinefile").unwrap();
        assert_eq!(found, temp_dir.path());
    }

    #[test]
    fn test_find_upwards_ignores_directories_with_that_name() {
        let temp_dir = TempDir::new().unwrap();
        let fs_utils = FileSystemUtils::new();

        fs::create_dir(temp_dir.path().join("Machinefile-not-here")).unwrap();
        assert!(fs_utils
            .find_upwards(temp_dir.path(), "Machinefile-not-here")
            .is_none());
    }

    #[test]
    fn test_read_marker() {
        let temp_dir = TempDir::new().unwrap();
        let fs_utils = FileSystemUtils::new();

        let missing = temp_dir.path().join("id");
        assert_eq!(fs_utils.read_marker(&missing).unwrap(), None);

        fs::write(&missing, "  \n").unwrap();
        assert_eq!(fs_utils.read_marker(&missing).unwrap(), None);

        fs::write(&missing, "abc-123\n").unwrap();
        assert_eq!(fs_utils.read_marker(&missing).unwrap().as_deref(), Some("abc-123"));
    }

    #[test]
    fn test_is_file_and_is_dir() {
        let temp_dir = TempDir::new().unwrap();
        let fs_utils = FileSystemUtils::new();

        let file_path = temp_dir.path().join("test.txt");
        fs::write(&file_path, "content").unwrap();

        assert!(fs_utils.is_file(&file_path));
        assert!(!fs_utils.is_dir(&file_path));
        assert!(fs_utils.is_dir(temp_dir.path()));
        assert!(!fs_utils.is_file("nonexistent"));
    }
}
