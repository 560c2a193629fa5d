//! I/O backend trait.
//!
//! A single-method abstraction over reading a whole file into memory. This
//! is all the crate needs: keychain files and unlock files are read once,
//! in full, and handed off to `chainbreak-format`/`chainbreak` as byte
//! slices. There are no positional reads, no writes, no Direct I/O — those
//! belong to a storage engine, not a forensic reader.

use std::path::Path;

use crate::IoError;

/// Reads whole files into memory.
pub trait IoBackend: Send + Sync {
    /// Reads an entire file into memory.
    fn read_all(&self, path: &Path) -> Result<Vec<u8>, IoError>;
}
