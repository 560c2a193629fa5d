//! Errors the facade surfaces to callers.
//!
//! Only *structural* failures reach here. A wrong password, an unreadable
//! unlock file, a missing wrapping key, or any other cryptographic or
//! credential failure is not an error — it degrades the affected record (or
//! the whole keychain) to a locked state instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainbreakError {
    #[error(transparent)]
    Format(#[from] chainbreak_format::FormatError),
}
