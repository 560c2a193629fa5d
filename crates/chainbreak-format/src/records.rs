//! Per-table-kind record builders.
//!
//! Each builder decodes a record's fixed header, resolves its column-pointer
//! attributes, and — for password-bearing kinds — attempts to recover the
//! plaintext secret via the SSGP container embedded in the record's trailing
//! bytes. A record whose secret cannot be recovered (locked keychain, no
//! matching wrapping key, bad padding) still builds successfully with its
//! `password` field left `None`; a missing secret is metadata, not failure.

use chainbreak_crypto::{decrypt_item_secret, unwrap_private_key, unwrap_symmetric_key, WrappingKeyMap};
use chainbreak_types::{AuthType, CssmAlgorithm, FourCharCode, KeyClass, KeychainTimestamp, ProtocolType};

use crate::attrs::{mask_pointer, resolve_four_char_code, resolve_int, resolve_lv_string, resolve_timestamp};
use crate::byte_reader::{ByteReader, Decode};
use crate::structs::{
    AppleShareHeader, GenericPasswordHeader, InternetPasswordHeader, KeyBlob, KeyBlobRecordHeader,
    SecKeyHeader, Ssgp, X509CertHeader, SSGP_MAGIC,
};

/// Which text encoding a recovered password's bytes were decoded with.
///
/// The legacy keychain format predates consistent UTF-8 use: most secrets
/// are plain ASCII, but a minority contain Latin-1 bytes that are not valid
/// UTF-8. The decoder tries UTF-8 first and only falls back to Latin-1 (a
/// lossless one-byte-per-codepoint mapping) on failure, so callers that need
/// the original bytes back can always recover them from `PasswordValue::text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordEncoding {
    Utf8,
    Latin1,
}

/// A recovered item secret, decoded to text alongside the encoding that
/// decoding required.
#[derive(Debug, Clone)]
pub struct PasswordValue {
    pub text: String,
    pub encoding: PasswordEncoding,
}

/// Decodes a decrypted item secret as UTF-8, falling back to Latin-1 (which
/// never fails — every byte value is a valid Latin-1 codepoint) when the
/// bytes are not valid UTF-8.
fn decode_password(bytes: Vec<u8>) -> PasswordValue {
    match String::from_utf8(bytes) {
        Ok(text) => PasswordValue {
            text,
            encoding: PasswordEncoding::Utf8,
        },
        Err(err) => {
            let text = err.into_bytes().iter().map(|&b| b as char).collect();
            PasswordValue {
                text,
                encoding: PasswordEncoding::Latin1,
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenericPasswordRecord {
    pub creation_date: Option<KeychainTimestamp>,
    pub mod_date: Option<KeychainTimestamp>,
    pub description: Option<String>,
    pub creator: Option<FourCharCode>,
    pub type_: Option<FourCharCode>,
    pub print_name: Option<String>,
    pub alias: Option<String>,
    pub account: Option<String>,
    pub service: Option<String>,
    pub password: Option<PasswordValue>,
}

#[derive(Debug, Clone)]
pub struct InternetPasswordRecord {
    pub creation_date: Option<KeychainTimestamp>,
    pub mod_date: Option<KeychainTimestamp>,
    pub description: Option<String>,
    pub comment: Option<String>,
    pub creator: Option<FourCharCode>,
    pub type_: Option<FourCharCode>,
    pub print_name: Option<String>,
    pub alias: Option<String>,
    pub account: Option<String>,
    pub security_domain: Option<String>,
    pub server: Option<String>,
    pub protocol: Option<ProtocolType>,
    pub auth_type: Option<AuthType>,
    pub port: Option<u32>,
    pub path: Option<String>,
    pub password: Option<PasswordValue>,
}

#[derive(Debug, Clone)]
pub struct AppleShareRecord {
    pub creation_date: Option<KeychainTimestamp>,
    pub mod_date: Option<KeychainTimestamp>,
    pub description: Option<String>,
    pub comment: Option<String>,
    pub creator: Option<FourCharCode>,
    pub type_: Option<FourCharCode>,
    pub print_name: Option<String>,
    pub alias: Option<String>,
    pub account: Option<String>,
    pub volume: Option<String>,
    pub server: Option<String>,
    pub protocol: Option<ProtocolType>,
    pub address: Option<u32>,
    pub signature: Option<u32>,
    pub password: Option<PasswordValue>,
}

#[derive(Debug, Clone)]
pub struct X509CertificateRecord {
    pub cert_type: Option<u32>,
    pub cert_encoding: Option<u32>,
    pub print_name: Option<String>,
    pub alias: Option<String>,
    pub subject: Option<String>,
    pub issuer: Option<String>,
    pub serial_number: Option<String>,
    pub subject_key_identifier: Option<String>,
    pub public_key_hash: Option<String>,
    pub der_bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct KeyRecord {
    pub print_name: Option<String>,
    pub label: Option<String>,
    pub key_class: KeyClass,
    pub key_type: Option<CssmAlgorithm>,
    pub key_size_in_bits: Option<u32>,
    pub effective_key_size: Option<u32>,
    pub extractable: Option<u32>,
    /// `Some` only when the keychain was unlocked and the wrap was
    /// successfully reversed.
    pub key_material: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub enum Record {
    GenericPassword(GenericPasswordRecord),
    InternetPassword(InternetPasswordRecord),
    AppleSharePassword(AppleShareRecord),
    X509Certificate(X509CertificateRecord),
    PublicKey(KeyRecord),
    PrivateKey(KeyRecord),
}

/// Recovers a record's encrypted secret via its trailing SSGP container, if
/// one is present and a matching wrapping key has been recovered.
///
/// `header_size` is the record kind's fixed header length — the SSGP
/// container sits immediately after it, at `base_addr + header_size`.
/// `ssgp_area` is not an offset but the *length* of the SSGP region, so the
/// ciphertext runs from the end of the fixed `Ssgp` struct to
/// `ssgp_offset + ssgp_area`, not to the end of the whole record.
fn extract_password(
    reader: &ByteReader<'_>,
    base_addr: usize,
    header_size: usize,
    ssgp_area: u32,
    wrapping_keys: &WrappingKeyMap,
) -> Option<Vec<u8>> {
    if ssgp_area == 0 {
        return None;
    }
    let ssgp_offset = base_addr + header_size;
    let ssgp = Ssgp::decode(reader, ssgp_offset).ok()?;
    let wrapping_key = wrapping_keys.get(&ssgp.lookup_key())?;

    let ct_start = ssgp_offset + Ssgp::SIZE;
    let ct_end = ssgp_offset + ssgp_area as usize;
    if ct_end <= ct_start {
        return None;
    }
    let ciphertext = reader.slice(ct_start, ct_end - ct_start).ok()?;
    decrypt_item_secret(wrapping_key, &ssgp.iv, ciphertext)
}

pub fn build_generic_password(
    reader: &ByteReader<'_>,
    base_addr: usize,
    wrapping_keys: &WrappingKeyMap,
) -> Option<GenericPasswordRecord> {
    let h = GenericPasswordHeader::decode(reader, base_addr).ok()?;
    Some(GenericPasswordRecord {
        creation_date: resolve_timestamp(reader, base_addr, mask_pointer(h.creation_date)),
        mod_date: resolve_timestamp(reader, base_addr, mask_pointer(h.mod_date)),
        description: resolve_lv_string(reader, base_addr, mask_pointer(h.description)),
        creator: resolve_four_char_code(reader, base_addr, mask_pointer(h.creator)),
        type_: resolve_four_char_code(reader, base_addr, mask_pointer(h.type_)),
        print_name: resolve_lv_string(reader, base_addr, mask_pointer(h.print_name)),
        alias: resolve_lv_string(reader, base_addr, mask_pointer(h.alias)),
        account: resolve_lv_string(reader, base_addr, mask_pointer(h.account)),
        service: resolve_lv_string(reader, base_addr, mask_pointer(h.service)),
        password: extract_password(
            reader,
            base_addr,
            GenericPasswordHeader::SIZE,
            h.ssgp_area,
            wrapping_keys,
        )
        .map(decode_password),
    })
}

pub fn build_internet_password(
    reader: &ByteReader<'_>,
    base_addr: usize,
    wrapping_keys: &WrappingKeyMap,
) -> Option<InternetPasswordRecord> {
    let h = InternetPasswordHeader::decode(reader, base_addr).ok()?;
    let protocol_code = resolve_four_char_code(reader, base_addr, mask_pointer(h.protocol));
    let auth_code = resolve_four_char_code(reader, base_addr, mask_pointer(h.auth_type));
    Some(InternetPasswordRecord {
        creation_date: resolve_timestamp(reader, base_addr, mask_pointer(h.creation_date)),
        mod_date: resolve_timestamp(reader, base_addr, mask_pointer(h.mod_date)),
        description: resolve_lv_string(reader, base_addr, mask_pointer(h.description)),
        comment: resolve_lv_string(reader, base_addr, mask_pointer(h.comment)),
        creator: resolve_four_char_code(reader, base_addr, mask_pointer(h.creator)),
        type_: resolve_four_char_code(reader, base_addr, mask_pointer(h.type_)),
        print_name: resolve_lv_string(reader, base_addr, mask_pointer(h.print_name)),
        alias: resolve_lv_string(reader, base_addr, mask_pointer(h.alias)),
        account: resolve_lv_string(reader, base_addr, mask_pointer(h.account)),
        security_domain: resolve_lv_string(reader, base_addr, mask_pointer(h.security_domain)),
        server: resolve_lv_string(reader, base_addr, mask_pointer(h.server)),
        protocol: protocol_code.map(ProtocolType::from_raw),
        auth_type: auth_code.map(AuthType::from_raw),
        port: resolve_int(reader, base_addr, mask_pointer(h.port)),
        path: resolve_lv_string(reader, base_addr, mask_pointer(h.path)),
        password: extract_password(
            reader,
            base_addr,
            InternetPasswordHeader::SIZE,
            h.ssgp_area,
            wrapping_keys,
        )
        .map(decode_password),
    })
}

pub fn build_appleshare_password(
    reader: &ByteReader<'_>,
    base_addr: usize,
    wrapping_keys: &WrappingKeyMap,
) -> Option<AppleShareRecord> {
    let h = AppleShareHeader::decode(reader, base_addr).ok()?;
    let protocol_code = resolve_four_char_code(reader, base_addr, mask_pointer(h.protocol));
    Some(AppleShareRecord {
        creation_date: resolve_timestamp(reader, base_addr, mask_pointer(h.creation_date)),
        mod_date: resolve_timestamp(reader, base_addr, mask_pointer(h.mod_date)),
        description: resolve_lv_string(reader, base_addr, mask_pointer(h.description)),
        comment: resolve_lv_string(reader, base_addr, mask_pointer(h.comment)),
        creator: resolve_four_char_code(reader, base_addr, mask_pointer(h.creator)),
        type_: resolve_four_char_code(reader, base_addr, mask_pointer(h.type_)),
        print_name: resolve_lv_string(reader, base_addr, mask_pointer(h.print_name)),
        alias: resolve_lv_string(reader, base_addr, mask_pointer(h.alias)),
        account: resolve_lv_string(reader, base_addr, mask_pointer(h.account)),
        volume: resolve_lv_string(reader, base_addr, mask_pointer(h.volume)),
        server: resolve_lv_string(reader, base_addr, mask_pointer(h.server)),
        protocol: protocol_code.map(ProtocolType::from_raw),
        address: resolve_int(reader, base_addr, mask_pointer(h.address)),
        signature: resolve_int(reader, base_addr, mask_pointer(h.signature)),
        password: extract_password(
            reader,
            base_addr,
            AppleShareHeader::SIZE,
            h.ssgp_area,
            wrapping_keys,
        )
        .map(decode_password),
    })
}

pub fn build_x509_certificate(
    reader: &ByteReader<'_>,
    base_addr: usize,
) -> Option<X509CertificateRecord> {
    let h = X509CertHeader::decode(reader, base_addr).ok()?;
    let der_start = base_addr + X509CertHeader::SIZE;
    let der_bytes = reader.slice(der_start, h.cert_size as usize).ok()?.to_vec();
    Some(X509CertificateRecord {
        cert_type: resolve_int(reader, base_addr, mask_pointer(h.cert_type)),
        cert_encoding: resolve_int(reader, base_addr, mask_pointer(h.cert_encoding)),
        print_name: resolve_lv_string(reader, base_addr, mask_pointer(h.print_name)),
        alias: resolve_lv_string(reader, base_addr, mask_pointer(h.alias)),
        subject: resolve_lv_string(reader, base_addr, mask_pointer(h.subject)),
        issuer: resolve_lv_string(reader, base_addr, mask_pointer(h.issuer)),
        serial_number: resolve_lv_string(reader, base_addr, mask_pointer(h.serial_number)),
        subject_key_identifier: resolve_lv_string(
            reader,
            base_addr,
            mask_pointer(h.subject_key_identifier),
        ),
        public_key_hash: resolve_lv_string(reader, base_addr, mask_pointer(h.public_key_hash)),
        der_bytes,
    })
}

/// Builds a public key record. Unlike private keys, a public key's blob is
/// never wrapped with the DB key — Security.framework stores it as plain
/// CSSM key-blob bytes since it carries no secret — so `key_material` is the
/// raw blob ciphertext region verbatim, available even on a locked keychain.
pub fn build_public_key(reader: &ByteReader<'_>, base_addr: usize) -> Option<KeyRecord> {
    let (mut record, blob_offset) = build_key_record_common(reader, base_addr)?;
    record.key_material = raw_key_blob(reader, blob_offset);
    Some(record)
}

/// Builds a private key record, attempting to unwrap its keyblob with
/// `db_key` (the keychain's recovered DB key) when present. `db_key` is
/// `None` while the keychain is locked, in which case `key_material` is
/// always `None`.
pub fn build_private_key(
    reader: &ByteReader<'_>,
    base_addr: usize,
    db_key: Option<&[u8; 24]>,
) -> Option<KeyRecord> {
    let (mut record, blob_offset) = build_key_record_common(reader, base_addr)?;
    record.key_material = db_key.and_then(|key| {
        let blob = KeyBlob::decode(reader, blob_offset).ok()?;
        if !blob.has_valid_magic() {
            return None;
        }
        let ct_start = blob_offset + blob.start_crypto_blob as usize;
        let ct_end = blob_offset + blob.total_length as usize;
        let ciphertext = reader.slice(ct_start, ct_end.checked_sub(ct_start)?).ok()?;
        let (_name, material) = unwrap_private_key(key, &blob.iv, ciphertext)?;
        Some(material.to_vec())
    });
    Some(record)
}

/// Reads a key record's raw blob ciphertext region without attempting any
/// decryption — the shape [`build_public_key`] needs.
fn raw_key_blob(reader: &ByteReader<'_>, blob_offset: usize) -> Option<Vec<u8>> {
    let blob = KeyBlob::decode(reader, blob_offset).ok()?;
    if !blob.has_valid_magic() {
        return None;
    }
    let ct_start = blob_offset + blob.start_crypto_blob as usize;
    let ct_end = blob_offset + blob.total_length as usize;
    reader
        .slice(ct_start, ct_end.checked_sub(ct_start)?)
        .ok()
        .map(|bytes| bytes.to_vec())
}

/// Decodes the fields common to public and private key records, returning
/// the partially-built record (with `key_material` left empty) alongside
/// the absolute offset of the trailing key blob.
fn build_key_record_common(reader: &ByteReader<'_>, base_addr: usize) -> Option<(KeyRecord, usize)> {
    let h = SecKeyHeader::decode(reader, base_addr).ok()?;
    let key_class_raw = resolve_int(reader, base_addr, mask_pointer(h.key_class)).unwrap_or(0);
    let key_type_raw = resolve_int(reader, base_addr, mask_pointer(h.key_type));
    let blob_offset = base_addr + SecKeyHeader::SIZE;

    let record = KeyRecord {
        print_name: resolve_lv_string(reader, base_addr, mask_pointer(h.print_name)),
        label: resolve_lv_string(reader, base_addr, mask_pointer(h.label)),
        key_class: KeyClass::from_raw(key_class_raw),
        key_type: key_type_raw.map(CssmAlgorithm::from_raw),
        key_size_in_bits: resolve_int(reader, base_addr, mask_pointer(h.key_size_in_bits)),
        effective_key_size: resolve_int(reader, base_addr, mask_pointer(h.effective_key_size)),
        extractable: resolve_int(reader, base_addr, mask_pointer(h.extractable)),
        key_material: None,
    };
    Some((record, blob_offset))
}

/// Walks a symmetric-key table, recovering each record's wrapping key with
/// the keychain's DB key and indexing it by the record's SSGP tag so
/// password-bearing records can later find the wrapping key matching their
/// own SSGP container.
pub fn build_wrapping_key_map(
    reader: &ByteReader<'_>,
    record_offsets: &[usize],
    db_key: &[u8; 24],
) -> WrappingKeyMap {
    let mut map = WrappingKeyMap::new();
    for &base_addr in record_offsets {
        if let Some((ssgp_key, wrapping_key)) = decode_symmetric_key_entry(reader, base_addr, db_key) {
            map.insert(ssgp_key, wrapping_key);
        }
    }
    map
}

fn decode_symmetric_key_entry(
    reader: &ByteReader<'_>,
    base_addr: usize,
    db_key: &[u8; 24],
) -> Option<([u8; 24], [u8; 24])> {
    KeyBlobRecordHeader::decode(reader, base_addr).ok()?;
    let blob_offset = base_addr + KeyBlobRecordHeader::SIZE;
    let blob = KeyBlob::decode(reader, blob_offset).ok()?;
    if !blob.has_valid_magic() {
        return None;
    }

    let ct_start = blob_offset + blob.start_crypto_blob as usize;
    let ct_end = blob_offset + blob.total_length as usize;

    // The "ssgp" discriminator sits 8 bytes past the ciphertext region, with
    // the 20-byte label immediately after it; a record whose magic doesn't
    // match is a tombstoned or otherwise unrelated slot and is skipped.
    let tag = reader.slice(ct_end + 8, 24).ok()?;
    if &tag[..4] != SSGP_MAGIC {
        return None;
    }

    let ciphertext = reader.slice(ct_start, ct_end.checked_sub(ct_start)?).ok()?;
    let wrapping_key = unwrap_symmetric_key(db_key, &blob.iv, ciphertext)?;
    if wrapping_key.len() != 24 {
        return None;
    }

    let mut ssgp_key = [0u8; 24];
    ssgp_key.copy_from_slice(tag);
    let mut wk = [0u8; 24];
    wk.copy_from_slice(&wrapping_key);
    Some((ssgp_key, wk))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::COMMON_BLOB_MAGIC;

    fn be(values: &[u32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_be_bytes()).collect()
    }

    /// A public key's blob is never decrypted — Security.framework never
    /// wraps it in the first place — so `build_public_key` must return the
    /// raw blob ciphertext even with no `db_key` in scope at all.
    #[test]
    fn build_public_key_returns_raw_blob_without_decryption() {
        let mut buf = be(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 0]); // SecKeyHeader, all pointers absent
        buf.extend(COMMON_BLOB_MAGIC.to_be_bytes());
        buf.extend(be(&[0, 24, 28])); // version, start_crypto_blob, total_length
        buf.extend_from_slice(&[0u8; 8]); // iv
        buf.extend_from_slice(&[0xEE; 4]); // the 4 raw "key" bytes [24, 28)

        let reader = ByteReader::new(&buf);
        let record = build_public_key(&reader, 0).unwrap();
        assert_eq!(record.key_material.unwrap(), vec![0xEE; 4]);
    }

    #[test]
    fn decode_password_prefers_utf8() {
        let value = decode_password(b"hunter2".to_vec());
        assert_eq!(value.text, "hunter2");
        assert_eq!(value.encoding, PasswordEncoding::Utf8);
    }

    #[test]
    fn decode_password_falls_back_to_latin1_and_round_trips() {
        // 0xE9 is "e acute" in Latin-1 but not valid standalone UTF-8.
        let raw = vec![0x70, 0x61, 0x73, 0xE9];
        let value = decode_password(raw.clone());
        assert_eq!(value.encoding, PasswordEncoding::Latin1);
        let round_tripped: Vec<u8> = value.text.chars().map(|c| c as u8).collect();
        assert_eq!(round_tripped, raw);
    }

    fn tdes_encrypt(key: &[u8; 24], iv: &[u8; 8], data: &[u8]) -> Vec<u8> {
        use cbc::Encryptor;
        use cipher::block_padding::Pkcs7;
        use cipher::{BlockEncryptMut, KeyIvInit};
        use des::TdesEde3;

        Encryptor::<TdesEde3>::new(key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(data)
    }

    /// Drives a full generic-password record through `build_generic_password`:
    /// the SSGP container sits at `base_addr + GenericPasswordHeader::SIZE`,
    /// not at `base_addr + ssgp_area` — `ssgp_area` is the SSGP region's
    /// *length*, not its offset — and the ciphertext ends at
    /// `ssgp_offset + ssgp_area`, not at the end of the whole record.
    #[test]
    fn build_generic_password_recovers_plaintext_through_real_ssgp_container() {
        let wrapping_key = [7u8; 24];
        let iv = [3u8; 8];
        let ciphertext = tdes_encrypt(&wrapping_key, &iv, b"hunter2");

        let mut ssgp = b"ssgp".to_vec();
        ssgp.extend_from_slice(&[0x42u8; 20]); // label
        ssgp.extend_from_slice(&iv);
        ssgp.extend_from_slice(&ciphertext);

        let ssgp_area = (ssgp.len()) as u32;
        let mut header = be(&[0, ssgp_area, 0, 0, 0, 0, 0, 0, 0, 0, 0]); // GenericPasswordHeader
        header.extend(ssgp);
        // trailing garbage past the SSGP area must not be pulled into the
        // ciphertext slice.
        header.extend_from_slice(&[0xAAu8; 16]);

        let mut wrapping_keys = WrappingKeyMap::new();
        let mut ssgp_key = [0u8; 24];
        ssgp_key[..4].copy_from_slice(b"ssgp");
        ssgp_key[4..].copy_from_slice(&[0x42u8; 20]);
        wrapping_keys.insert(ssgp_key, wrapping_key);

        let reader = ByteReader::new(&header);
        let record = build_generic_password(&reader, 0, &wrapping_keys).unwrap();
        let password = record.password.unwrap();
        assert_eq!(password.text, "hunter2");
        assert_eq!(password.encoding, PasswordEncoding::Utf8);
    }
}
