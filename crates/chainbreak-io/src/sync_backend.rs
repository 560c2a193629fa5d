//! Synchronous I/O backend using `std::fs`.

use std::fs;
use std::path::Path;

use crate::IoError;
use crate::backend::IoBackend;

/// Reads files via `std::fs::read`.
#[derive(Debug, Default)]
pub struct SyncBackend;

impl SyncBackend {
    /// Creates a new synchronous I/O backend.
    pub fn new() -> Self {
        Self
    }
}

impl IoBackend for SyncBackend {
    fn read_all(&self, path: &Path) -> Result<Vec<u8>, IoError> {
        fs::read(path).map_err(|source| IoError::Read {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.dat");
        fs::write(&path, b"hello world").unwrap();

        let backend = SyncBackend::new();
        let data = backend.read_all(&path).unwrap();
        assert_eq!(data, b"hello world");
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.dat");

        let backend = SyncBackend::new();
        assert!(backend.read_all(&path).is_err());
    }
}
