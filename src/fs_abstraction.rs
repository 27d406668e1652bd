//! Filesystem abstraction layer for testability
//!
//! Every file gatewatch touches (network lists, the label database, the
//! rendered page and the table state) goes through the [`FileSystem`] trait,
//! so the engine and its loaders can be exercised against a mock in tests.

use std::io::{self, Write};
use std::path::Path;

#[cfg(test)]
use mockall::automock;

/// Permissions given to published files: external viewers (the web server
/// serving the page) must be able to read them.
const PUBLISHED_MODE: u32 = 0o644;

/// Trait abstracting filesystem operations for dependency injection.
///
/// # Example (testing)
/// ```ignore
/// use gatewatch::fs_abstraction::MockFileSystem;
///
/// let mut mock_fs = MockFileSystem::new();
/// mock_fs.expect_read_to_string()
///     .returning(|_| Ok("10.0.0.0/8\n".to_string()));
/// ```
#[cfg_attr(test, automock)]
pub trait FileSystem: Send + Sync {
    /// Read file contents as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Replace a file's contents atomically.
    ///
    /// Readers see either the previous document or the new one, never a
    /// partially written file.
    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Check if a path exists.
    fn exists(&self, path: &Path) -> bool;
}

/// Real filesystem implementation using std::fs.
#[derive(Default, Clone, Copy)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    /// Uses the tempfile + rename pattern. The temporary file lives in the
    /// target's directory so the rename never crosses filesystems.
    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        use tempfile::NamedTempFile;

        let parent_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp_file = NamedTempFile::new_in(parent_dir)?;

        temp_file.write_all(contents)?;
        temp_file.as_file().sync_all()?;
        temp_file
            .as_file()
            .set_permissions(std::fs::Permissions::from_mode(PUBLISHED_MODE))?;

        temp_file.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

static REAL_FS: RealFileSystem = RealFileSystem;

/// Get a reference to the global real filesystem instance.
pub fn real_fs() -> &'static RealFileSystem {
    &REAL_FS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;
    use tempfile::TempDir;

    #[test]
    fn test_real_fs_write_atomic_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("page.html");

        let fs = RealFileSystem;
        fs.write_atomic(&file_path, b"<html></html>").unwrap();

        assert_eq!(fs.read_to_string(&file_path).unwrap(), "<html></html>");
    }

    #[test]
    fn test_real_fs_write_atomic_replaces_content() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("page.html");

        let fs = RealFileSystem;
        fs.write_atomic(&file_path, b"first version, quite long")
            .unwrap();
        fs.write_atomic(&file_path, b"second").unwrap();

        assert_eq!(fs.read_to_string(&file_path).unwrap(), "second");
    }

    #[test]
    fn test_real_fs_write_atomic_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("page.html");

        let fs = RealFileSystem;
        fs.write_atomic(&file_path, b"one").unwrap();
        fs.write_atomic(&file_path, b"two").unwrap();

        let entries: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_real_fs_write_atomic_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("page.html");

        RealFileSystem.write_atomic(&file_path, b"x").unwrap();

        let metadata = std::fs::metadata(&file_path).unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, 0o644);
    }

    #[test]
    fn test_real_fs_write_atomic_missing_dir() {
        let fs = RealFileSystem;
        let result = fs.write_atomic(Path::new("/nonexistent/dir/page.html"), b"x");
        assert!(result.is_err());
    }

    #[test]
    fn test_real_fs_create_dir_all() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir.path().join("a/b/c");

        let fs = RealFileSystem;
        assert!(!fs.exists(&nested_path));
        fs.create_dir_all(&nested_path).unwrap();
        assert!(fs.exists(&nested_path));
    }

    #[test]
    fn test_real_fs_read_nonexistent() {
        let fs = RealFileSystem;
        let result = fs.read_to_string(Path::new("/nonexistent/path/file.txt"));
        assert_eq!(result.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_real_fs_static_instance() {
        assert!(!real_fs().exists(Path::new("/nonexistent/path")));
    }

    #[test]
    fn test_mock_fs_error_simulation() {
        let mut mock = MockFileSystem::new();
        mock.expect_write_atomic().returning(|_, _| {
            Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "access denied",
            ))
        });

        let result = mock.write_atomic(Path::new("/any/path"), b"data");
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::PermissionDenied);
    }
}
