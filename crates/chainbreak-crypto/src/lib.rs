//! # chainbreak-crypto
//!
//! Cryptographic primitives for recovering plaintext out of a legacy Apple
//! keychain: the 3DES-CBC block cipher, PBKDF2-HMAC-SHA1 master key
//! derivation, and the two-stage CMS-style key unwrap used for symmetric
//! keys, private keys, and the DB blob's own wrapping key.
//!
//! Every function here that can fail on a wrong password returns `Option`,
//! not `Result` — see [`tdes::tdes_cbc_decrypt`] for why. Key material that
//! flows through this crate is wrapped in [`zeroize::Zeroizing`] so it is
//! scrubbed from memory when dropped.

mod kdf;
mod tdes;
mod unwrap;
mod wrapping_key_map;

pub use kdf::derive_master_key;
pub use tdes::tdes_cbc_decrypt;
pub use unwrap::{
    decrypt_item_secret, recover_wrapping_key, unwrap_private_key, unwrap_symmetric_key,
    MAGIC_CMS_IV,
};
pub use wrapping_key_map::{SsgpKey, WrappingKeyMap};
