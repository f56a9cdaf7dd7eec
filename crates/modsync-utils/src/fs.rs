use std::{fs, io::Write, path::Path};

use tempfile::NamedTempFile;

use crate::error::{FileSystemError, FileSystemResult};

/// Creates a directory structure if it doesn't exist.
///
/// If the directory already exists, this function does nothing. If the path
/// exists but is not a directory, this function returns an error.
///
/// # Errors
///
/// * [`FileSystemError::Directory`] if the directory could not be created.
/// * [`FileSystemError::NotADirectory`] if the path exists but is not a directory.
pub fn ensure_dir_exists<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    let path = path.as_ref();
    if !path.exists() {
        fs::create_dir_all(path).map_err(|err| {
            FileSystemError::Directory {
                path: path.to_path_buf(),
                action: "create",
                source: err,
            }
        })?;
    } else if !path.is_dir() {
        return Err(FileSystemError::NotADirectory {
            path: path.to_path_buf(),
        });
    }

    Ok(())
}

/// Writes `content` to `path` through a temporary file in the same directory.
///
/// The destination either keeps its previous content or holds the complete new
/// content; a partially written file is never visible at `path`.
///
/// # Errors
///
/// * [`FileSystemError::Directory`] if the parent directory cannot be created.
/// * [`FileSystemError::File`] if writing or renaming the temporary file fails.
pub fn write_atomic<P: AsRef<Path>>(path: P, content: &[u8]) -> FileSystemResult<()> {
    let path = path.as_ref();
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    ensure_dir_exists(parent)?;

    let file_error = |action, err| {
        FileSystemError::File {
            path: path.to_path_buf(),
            action,
            source: err,
        }
    };

    let mut tmp = NamedTempFile::new_in(parent).map_err(|err| file_error("create", err))?;
    tmp.write_all(content)
        .map_err(|err| file_error("write", err))?;
    tmp.as_file()
        .sync_all()
        .map_err(|err| file_error("sync", err))?;
    tmp.persist(path)
        .map_err(|err| file_error("persist", err.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_ensure_dir_exists() {
        let dir = tempdir().unwrap();
        let new_dir = dir.path().join("a/b/c");
        ensure_dir_exists(&new_dir).unwrap();
        assert!(new_dir.is_dir());

        ensure_dir_exists(&new_dir).unwrap();
    }

    #[test]
    fn test_ensure_dir_exists_file_collision() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("file.txt");
        fs::write(&file_path, "hello").unwrap();
        assert!(matches!(
            ensure_dir_exists(&file_path),
            Err(FileSystemError::NotADirectory { .. })
        ));
    }

    #[test]
    fn test_write_atomic_creates_parents_and_replaces() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("nested/dir/file.yaml");

        write_atomic(&target, b"first").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"first");

        write_atomic(&target, b"second").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"second");

        let leftovers = fs::read_dir(target.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
