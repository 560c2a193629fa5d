//! The `Keychain` state machine: `Unopened -> Opened (locked) -> Opened (unlocked)`.

use chainbreak_crypto::{derive_master_key, recover_wrapping_key, WrappingKeyMap};
use chainbreak_format::{
    build_appleshare_password, build_generic_password, build_internet_password, build_private_key,
    build_public_key, build_wrapping_key_map, build_x509_certificate, AppleShareRecord, DbBlob,
    Decode, GenericPasswordRecord, InternetPasswordRecord, KeyRecord, KeychainFile,
    X509CertificateRecord,
};
use chainbreak_types::TableId;
use zeroize::Zeroizing;

use crate::credential::{Credential, Resolved};
use crate::error::ChainbreakError;
use crate::hash::KeychainPasswordHash;

enum State {
    Locked,
    Unlocked {
        db_key: [u8; 24],
        wrapping_keys: WrappingKeyMap,
    },
}

/// A parsed keychain file, either still locked or unlocked with a credential.
///
/// Opening never requires a credential — the container structure, table
/// directory, and the password hash are all available on a locked keychain.
/// Only the per-item secrets and private-key material need [`Keychain::unlock`].
pub struct Keychain {
    file: KeychainFile,
    state: State,
}

impl Keychain {
    /// Parses `data` as a keychain file. A bad or missing `"kych"` signature
    /// is a warning (see [`KeychainFile::load`]), not a failure here — the
    /// returned handle starts locked either way.
    pub fn open(data: Vec<u8>) -> Result<Self, ChainbreakError> {
        let file = KeychainFile::load(data)?;
        Ok(Self {
            file,
            state: State::Locked,
        })
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.state, State::Locked)
    }

    pub fn signature_valid(&self) -> bool {
        self.file.signature_valid
    }

    /// Applies a credential and attempts to transition to unlocked.
    ///
    /// Idempotent: calling this again with a new credential re-derives the
    /// wrapping key and rebuilds the wrapping-key map from scratch. A
    /// credential that fails to recover the DB key, or recovers it but
    /// unwraps zero symmetric keys, leaves the keychain locked — this is not
    /// an error, since a wrong password is expected input, not a bug.
    pub fn unlock(&mut self, credential: &Credential) -> &mut Self {
        let Some(db_key) = self.recover_db_key(credential) else {
            tracing::warn!("credential did not recover a usable database key; keychain stays locked");
            self.state = State::Locked;
            return self;
        };

        let wrapping_keys = self.build_wrapping_keys(&db_key);
        if wrapping_keys.is_empty() {
            tracing::warn!("database key recovered but no symmetric keys unwrapped; keychain stays locked");
            self.state = State::Locked;
            return self;
        }

        tracing::info!(count = wrapping_keys.len(), "keychain unlocked");
        self.state = State::Unlocked { db_key, wrapping_keys };
        self
    }

    /// Every credential kind — password, hex key, or unlock-file master key —
    /// is only ever a *master key* candidate: recovering the actual DB
    /// wrapping key still requires decrypting the DB blob with it, exactly
    /// as the password path does. A hex key or unlock-file key is never the
    /// wrapping key itself.
    fn recover_db_key(&self, credential: &Credential) -> Option<[u8; 24]> {
        let resolved = credential.resolve()?;
        let db_blob = self
            .db_blob()
            .inspect_err(|err| tracing::warn!(%err, "could not locate database blob"))
            .ok()?;

        let master_key = match resolved {
            Resolved::Password(password) => derive_master_key(password.as_bytes(), &db_blob.salt),
            Resolved::WrappingKey(key) => Zeroizing::new(key),
        };

        let ciphertext = self.db_blob_ciphertext(&db_blob);
        recover_wrapping_key(&master_key, &db_blob.iv, ciphertext).map(|key| *key)
    }

    fn db_blob(&self) -> Result<DbBlob, ChainbreakError> {
        let addr = self.file.db_blob_addr(TableId::METADATA.as_u32())?;
        let blob = DbBlob::decode(&self.file.reader(), addr)?;
        Ok(blob)
    }

    /// The DB blob's ciphertext range. Returns an empty slice if the range is
    /// malformed (end before start, or reaching past the file) rather than
    /// erroring — a corrupt DB blob degrades to "no key recoverable", the
    /// same as any other wrong-password outcome.
    fn db_blob_ciphertext<'a>(&'a self, blob: &DbBlob) -> &'a [u8] {
        let addr = match self.file.db_blob_addr(TableId::METADATA.as_u32()) {
            Ok(addr) => addr,
            Err(_) => return &[],
        };
        let start = addr + blob.start_crypto_blob as usize;
        let end = addr + blob.total_length as usize;
        let len = end.checked_sub(start).unwrap_or(0);
        self.file.reader().slice(start, len).unwrap_or(&[])
    }

    fn build_wrapping_keys(&self, db_key: &[u8; 24]) -> WrappingKeyMap {
        let reader = self.file.reader();
        match self.file.table(TableId::SYMMETRIC_KEY.as_u32()) {
            Ok(table) => build_wrapping_key_map(&reader, &table.record_offsets, db_key),
            Err(err) => {
                tracing::warn!(%err, "no symmetric key table in this keychain");
                WrappingKeyMap::new()
            }
        }
    }

    fn records(&self, table_id: TableId) -> Vec<usize> {
        match self.file.table(table_id.as_u32()) {
            Ok(table) => table.record_offsets,
            Err(err) => {
                tracing::warn!(%err, table = %table_id, "table not present");
                Vec::new()
            }
        }
    }

    fn wrapping_keys(&self) -> &WrappingKeyMap {
        static EMPTY: std::sync::OnceLock<WrappingKeyMap> = std::sync::OnceLock::new();
        match &self.state {
            State::Unlocked { wrapping_keys, .. } => wrapping_keys,
            State::Locked => EMPTY.get_or_init(WrappingKeyMap::new),
        }
    }

    fn db_key(&self) -> Option<&[u8; 24]> {
        match &self.state {
            State::Unlocked { db_key, .. } => Some(db_key),
            State::Locked => None,
        }
    }

    pub fn generic_passwords(&self) -> Vec<GenericPasswordRecord> {
        let reader = self.file.reader();
        let wrapping_keys = self.wrapping_keys();
        self.records(TableId::GENERIC_PASSWORD)
            .into_iter()
            .filter_map(|addr| build_generic_password(&reader, addr, wrapping_keys))
            .collect()
    }

    pub fn internet_passwords(&self) -> Vec<InternetPasswordRecord> {
        let reader = self.file.reader();
        let wrapping_keys = self.wrapping_keys();
        self.records(TableId::INTERNET_PASSWORD)
            .into_iter()
            .filter_map(|addr| build_internet_password(&reader, addr, wrapping_keys))
            .collect()
    }

    pub fn appleshare_passwords(&self) -> Vec<AppleShareRecord> {
        let reader = self.file.reader();
        let wrapping_keys = self.wrapping_keys();
        self.records(TableId::APPLESHARE_PASSWORD)
            .into_iter()
            .filter_map(|addr| build_appleshare_password(&reader, addr, wrapping_keys))
            .collect()
    }

    pub fn x509_certificates(&self) -> Vec<X509CertificateRecord> {
        let reader = self.file.reader();
        self.records(TableId::X509_CERTIFICATE)
            .into_iter()
            .filter_map(|addr| build_x509_certificate(&reader, addr))
            .collect()
    }

    pub fn public_keys(&self) -> Vec<KeyRecord> {
        let reader = self.file.reader();
        self.records(TableId::PUBLIC_KEY)
            .into_iter()
            .filter_map(|addr| build_public_key(&reader, addr))
            .collect()
    }

    /// Key material is `None` on every record while the keychain is locked —
    /// callers render that as the locked sentinel, not this crate.
    pub fn private_keys(&self) -> Vec<KeyRecord> {
        let reader = self.file.reader();
        let db_key = self.db_key();
        self.records(TableId::PRIVATE_KEY)
            .into_iter()
            .filter_map(|addr| build_private_key(&reader, addr, db_key))
            .collect()
    }

    /// Available even while locked — extracting the crackable hash never
    /// requires the credential that hash is meant to attack.
    pub fn password_hash(&self) -> Result<KeychainPasswordHash, ChainbreakError> {
        let blob = self.db_blob()?;
        let ciphertext = self.db_blob_ciphertext(&blob);
        Ok(KeychainPasswordHash::new(blob.salt, blob.iv, ciphertext.to_vec()))
    }
}
