//! Structural parse errors.
//!
//! Only out-of-bounds reads and malformed containers land here. Wrong
//! passwords and other cryptographic failures are not errors — see
//! `chainbreak-crypto` for why — and a resolver that cannot make sense of
//! one attribute degrades to an empty value rather than aborting the whole
//! record.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("read of {len} bytes at offset {offset} exceeds buffer of {buffer_len} bytes")]
    OutOfBounds {
        offset: usize,
        len: usize,
        buffer_len: usize,
    },

    #[error("table {table_id} not present in this keychain")]
    TableNotFound { table_id: String },
}
