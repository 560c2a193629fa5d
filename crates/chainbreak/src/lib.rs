//! # chainbreak
//!
//! Public facade over the legacy Apple `.keychain` parser: a `Keychain`
//! handle that opens a file, optionally unlocks it with a password, hex
//! wrapping key, or unlock-file, and enumerates its records.
//!
//! A `Keychain` never panics on malformed input and never returns an error
//! for a wrong credential — see [`error::ChainbreakError`] for the line
//! between a structural failure (an error) and a cryptographic one (a
//! locked record or an empty enumerator).

mod credential;
mod error;
mod hash;
mod keychain;

pub use credential::Credential;
pub use error::ChainbreakError;
pub use hash::KeychainPasswordHash;
pub use keychain::Keychain;

pub use chainbreak_format::{
    AppleShareRecord, GenericPasswordRecord, InternetPasswordRecord, KeyRecord, PasswordEncoding,
    PasswordValue, X509CertificateRecord,
};
pub use chainbreak_types::LOCKED_SIGNATURE;

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn be(values: &[u32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_be_bytes()).collect()
    }

    /// Builds a keychain file containing only a metadata table (for the DB
    /// blob) with an intentionally-garbage DB blob so unlock attempts can be
    /// exercised without real crypto fixtures.
    fn build_minimal_keychain() -> Vec<u8> {
        let header_size = 20u32;
        let schema_offset = header_size;
        let mut buf = b"kych".to_vec();
        buf.extend(be(&[1, header_size, schema_offset, 0]));

        let table_offset_rel = 8 + 4;
        buf.extend(be(&[100, 1]));
        buf.extend(be(&[table_offset_rel]));

        // table header: table_size, table_id=METADATA, record_count=0, reserved
        buf.extend(be(&[24, 0x8000_8000, 0, 0, 0, 0]));
        // the DB blob lives at table_offset + 0x38; pad up to it, then write
        // 44 zeroed bytes (an all-zero blob: bad magic, empty ciphertext).
        let table_offset = header_size as usize + table_offset_rel as usize;
        let db_blob_addr = table_offset + 0x38;
        buf.resize(db_blob_addr, 0);
        buf.extend(vec![0u8; 44]);

        buf
    }

    #[test]
    fn opening_a_garbage_signature_file_still_parses_and_stays_locked() {
        let mut bytes = build_minimal_keychain();
        bytes[0] = b'x';
        let keychain = Keychain::open(bytes).unwrap();
        assert!(!keychain.signature_valid());
        assert!(keychain.is_locked());
        assert!(keychain.generic_passwords().is_empty());
    }

    #[test]
    fn wrong_password_leaves_keychain_locked_without_erroring() {
        let mut keychain = Keychain::open(build_minimal_keychain()).unwrap();
        keychain.unlock(&Credential::Password("hunter2".to_string()));
        assert!(keychain.is_locked());
    }

    #[test]
    fn missing_table_enumerators_return_empty_not_error() {
        let keychain = Keychain::open(build_minimal_keychain()).unwrap();
        assert!(keychain.internet_passwords().is_empty());
        assert!(keychain.x509_certificates().is_empty());
        assert!(keychain.public_keys().is_empty());
    }

    #[test]
    fn password_hash_is_available_while_locked() {
        let keychain = Keychain::open(build_minimal_keychain()).unwrap();
        let hash = keychain.password_hash().unwrap();
        assert!(hash.to_string().starts_with("$keychain$*"));
    }

    #[test_case("aabb" ; "too short")]
    #[test_case(&"aa".repeat(25) ; "too long")]
    #[test_case("not-hex-at-all!!" ; "not valid hex")]
    fn malformed_hex_key_leaves_keychain_locked(hex_key: &str) {
        let mut keychain = Keychain::open(build_minimal_keychain()).unwrap();
        keychain.unlock(&Credential::HexKey(hex_key.to_string()));
        assert!(keychain.is_locked());
    }
}
