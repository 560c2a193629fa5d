//! The three ways a caller can supply an unlock credential.
//!
//! Each variant resolves to a 24-byte *master key* candidate by a different
//! path — PBKDF2 derivation, a plain hex decode, or parsing an unlock-file's
//! embedded master key — but none of them is the DB wrapping key itself:
//! [`crate::Keychain::unlock`] still has to decrypt the DB blob with
//! whichever master key came out of resolution before it has a usable
//! wrapping key. A credential that cannot be resolved (bad hex, unreadable
//! unlock file) is not a structural error — it is indistinguishable from a
//! wrong password and leaves the keychain locked, per the facade's failure
//! semantics.

use std::path::{Path, PathBuf};

use chainbreak_format::{ByteReader, Decode, UnlockBlob};
use chainbreak_io::IoBackend;

/// An unlock credential, in whichever form the caller happened to have it.
#[derive(Debug, Clone)]
pub enum Credential {
    /// The keychain's plaintext user password. Fed through PBKDF2-HMAC-SHA1
    /// against the DB blob's salt to derive the master key.
    Password(String),
    /// A hex-encoded 24-byte master key, already recovered by some other
    /// means (e.g. extracted from memory or an earlier unlock). Still has to
    /// be run through the DB-blob decrypt, the same as a password-derived
    /// master key — it skips PBKDF2, not the DB blob.
    HexKey(String),
    /// Path to an "unlock file": a small container whose `MasterKey` field
    /// is the keychain's master key directly, bypassing PBKDF2 entirely (but
    /// not the DB-blob decrypt that follows it).
    UnlockFile(PathBuf),
}

/// The resolved form of a [`Credential`]: either a plaintext password (still
/// needing PBKDF2 to become a master key) or an already-derived master key.
/// Either way, a DB-blob decrypt still stands between this and a usable
/// wrapping key.
pub(crate) enum Resolved {
    Password(String),
    WrappingKey([u8; 24]),
}

impl Credential {
    pub(crate) fn resolve(&self) -> Option<Resolved> {
        match self {
            Credential::Password(password) => Some(Resolved::Password(password.clone())),
            Credential::HexKey(hex_str) => {
                let bytes = hex::decode(hex_str)
                    .inspect_err(|err| tracing::warn!(%err, "hex key is not valid hex"))
                    .ok()?;
                if bytes.len() != 24 {
                    tracing::warn!(len = bytes.len(), "hex key did not decode to 24 bytes");
                    return None;
                }
                let mut key = [0u8; 24];
                key.copy_from_slice(&bytes);
                Some(Resolved::WrappingKey(key))
            }
            Credential::UnlockFile(path) => read_unlock_file(path).map(Resolved::WrappingKey),
        }
    }
}

fn read_unlock_file(path: &Path) -> Option<[u8; 24]> {
    let backend = chainbreak_io::SyncBackend::new();
    let bytes = backend
        .read_all(path)
        .inspect_err(|err| tracing::warn!(path = %path.display(), %err, "could not read unlock file"))
        .ok()?;
    let reader = ByteReader::new(&bytes);
    UnlockBlob::decode(&reader, 0)
        .inspect_err(|_| tracing::warn!(path = %path.display(), "unlock file is too short to contain a master key"))
        .ok()
        .map(|blob| blob.master_key)
}
