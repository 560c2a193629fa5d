//! Fixed-size on-disk struct decoders.
//!
//! Every struct here implements [`Decode`] and is read with
//! [`ByteReader::slice`] plus `.try_into().expect(...)` once the bounds
//! check has already run — the same idiom the rest of this workspace uses
//! for fixed-width header parsing.
//!
//! Column-pointer fields (anything that locates a variable-length attribute
//! elsewhere in the record) are stored here as raw `u32`s. Masking the low
//! bit and resolving the pointer happens in `attrs`, never here — a zero or
//! unset pointer is a valid "attribute absent" state, not a decode failure.

use crate::byte_reader::{ByteReader, Decode};
use crate::error::FormatError;

/// Magic bytes every valid keychain file starts with (`"kych"`).
pub const KEYCHAIN_SIGNATURE: [u8; 4] = *b"kych";

/// Magic marking a valid key/item common blob (`CommonBlob.Magic`).
pub const COMMON_BLOB_MAGIC: u32 = 0xFADE_0711;

/// The "Secure Storage Group Password" discriminator, both on SSGP
/// containers themselves and on the trailing tag of a symmetric-key record.
pub const SSGP_MAGIC: &[u8; 4] = b"ssgp";

/// File-level header: signature, version, and the offset of the schema.
#[derive(Debug, Clone, Copy)]
pub struct DatabaseHeader {
    pub signature: [u8; 4],
    pub version: u32,
    pub header_size: u32,
    pub schema_offset: u32,
    pub auth_offset: u32,
}

impl Decode for DatabaseHeader {
    const SIZE: usize = 20;

    fn decode(reader: &ByteReader<'_>, offset: usize) -> Result<Self, FormatError> {
        reader.slice(offset, Self::SIZE)?;
        Ok(Self {
            signature: reader.four_char_code(offset)?,
            version: reader.u32_be(offset + 4)?,
            header_size: reader.u32_be(offset + 8)?,
            schema_offset: reader.u32_be(offset + 12)?,
            auth_offset: reader.u32_be(offset + 16)?,
        })
    }
}

impl DatabaseHeader {
    pub fn is_valid_signature(&self) -> bool {
        self.signature == KEYCHAIN_SIGNATURE
    }
}

/// Schema header: size of the schema section and the number of tables it
/// declares. Immediately followed by `table_count` big-endian `u32` table
/// offsets (the table directory), read separately since they are not a
/// fixed-size struct.
#[derive(Debug, Clone, Copy)]
pub struct SchemaHeader {
    pub schema_size: u32,
    pub table_count: u32,
}

impl Decode for SchemaHeader {
    const SIZE: usize = 8;

    fn decode(reader: &ByteReader<'_>, offset: usize) -> Result<Self, FormatError> {
        Ok(Self {
            schema_size: reader.u32_be(offset)?,
            table_count: reader.u32_be(offset + 4)?,
        })
    }
}

/// Per-table header. Only `table_id` and `record_count` drive navigation;
/// the remaining CSSM index/free-list bookkeeping fields are carried
/// because they are part of the on-disk layout, not because anything reads
/// them.
#[derive(Debug, Clone, Copy)]
pub struct TableHeader {
    pub table_size: u32,
    pub table_id: u32,
    pub record_count: u32,
    pub records_used: u32,
    pub free_list_head: u32,
    pub index_head: u32,
}

impl Decode for TableHeader {
    const SIZE: usize = 24;

    fn decode(reader: &ByteReader<'_>, offset: usize) -> Result<Self, FormatError> {
        Ok(Self {
            table_size: reader.u32_be(offset)?,
            table_id: reader.u32_be(offset + 4)?,
            record_count: reader.u32_be(offset + 8)?,
            records_used: reader.u32_be(offset + 12)?,
            free_list_head: reader.u32_be(offset + 16)?,
            index_head: reader.u32_be(offset + 20)?,
        })
    }
}

/// The DB blob: the encrypted container holding the 24-byte key that
/// unwraps every other secret in the keychain. `salt` feeds PBKDF2; `iv` and
/// the `[start_crypto_blob, total_length)` ciphertext range feed the 3DES
/// decrypt with the derived master key.
#[derive(Debug, Clone, Copy)]
pub struct DbBlob {
    pub magic: [u8; 4],
    pub version: u32,
    pub start_crypto_blob: u32,
    pub total_length: u32,
    pub salt: [u8; 20],
    pub iv: [u8; 8],
}

impl Decode for DbBlob {
    const SIZE: usize = 44;

    fn decode(reader: &ByteReader<'_>, offset: usize) -> Result<Self, FormatError> {
        let salt_bytes = reader.slice(offset + 16, 20)?;
        let iv_bytes = reader.slice(offset + 36, 8)?;
        Ok(Self {
            magic: reader.four_char_code(offset)?,
            version: reader.u32_be(offset + 4)?,
            start_crypto_blob: reader.u32_be(offset + 8)?,
            total_length: reader.u32_be(offset + 12)?,
            salt: salt_bytes.try_into().expect("slice is exactly 20 bytes after bounds check"),
            iv: iv_bytes.try_into().expect("slice is exactly 8 bytes after bounds check"),
        })
    }
}

/// Header preceding a symmetric-key table record's keyblob payload.
#[derive(Debug, Clone, Copy)]
pub struct KeyBlobRecordHeader {
    pub record_size: u32,
}

impl Decode for KeyBlobRecordHeader {
    const SIZE: usize = 24;

    fn decode(reader: &ByteReader<'_>, offset: usize) -> Result<Self, FormatError> {
        Ok(Self {
            record_size: reader.u32_be(offset)?,
        })
    }
}

/// The CMS-wrapped keyblob itself: magic, the `[start_crypto_blob,
/// total_length)` ciphertext range, and the record's own IV.
#[derive(Debug, Clone, Copy)]
pub struct KeyBlob {
    pub magic: u32,
    pub start_crypto_blob: u32,
    pub total_length: u32,
    pub iv: [u8; 8],
}

impl Decode for KeyBlob {
    const SIZE: usize = 24;

    fn decode(reader: &ByteReader<'_>, offset: usize) -> Result<Self, FormatError> {
        let iv_bytes = reader.slice(offset + 16, 8)?;
        Ok(Self {
            magic: reader.u32_be(offset)?,
            start_crypto_blob: reader.u32_be(offset + 8)?,
            total_length: reader.u32_be(offset + 12)?,
            iv: iv_bytes.try_into().expect("slice is exactly 8 bytes after bounds check"),
        })
    }
}

impl KeyBlob {
    pub fn has_valid_magic(&self) -> bool {
        self.magic == COMMON_BLOB_MAGIC
    }
}

/// SSGP container header: `magic ∥ label` is the wrapping-key map lookup
/// key; `iv` is used with the matched wrapping key to decrypt the item's
/// plaintext secret (ciphertext follows immediately after and is not part
/// of this fixed struct).
#[derive(Debug, Clone, Copy)]
pub struct Ssgp {
    pub magic: [u8; 4],
    pub label: [u8; 20],
    pub iv: [u8; 8],
}

impl Decode for Ssgp {
    const SIZE: usize = 32;

    fn decode(reader: &ByteReader<'_>, offset: usize) -> Result<Self, FormatError> {
        let label_bytes = reader.slice(offset + 4, 20)?;
        let iv_bytes = reader.slice(offset + 24, 8)?;
        Ok(Self {
            magic: reader.four_char_code(offset)?,
            label: label_bytes.try_into().expect("slice is exactly 20 bytes after bounds check"),
            iv: iv_bytes.try_into().expect("slice is exactly 8 bytes after bounds check"),
        })
    }
}

impl Ssgp {
    /// The 24-byte `magic ∥ label` key used to look up a wrapping key.
    pub fn lookup_key(&self) -> [u8; 24] {
        let mut key = [0u8; 24];
        key[..4].copy_from_slice(&self.magic);
        key[4..].copy_from_slice(&self.label);
        key
    }
}

/// An unlock file's container: a small fixed header followed by the
/// 24-byte master key.
#[derive(Debug, Clone, Copy)]
pub struct UnlockBlob {
    pub master_key: [u8; 24],
}

impl Decode for UnlockBlob {
    const SIZE: usize = 40;

    fn decode(reader: &ByteReader<'_>, offset: usize) -> Result<Self, FormatError> {
        let key_bytes = reader.slice(offset + 16, 24)?;
        Ok(Self {
            master_key: key_bytes.try_into().expect("slice is exactly 24 bytes after bounds check"),
        })
    }
}

/// Generic password record header. No `Comment` field — unlike internet
/// and appleshare passwords, generic passwords never had one.
#[derive(Debug, Clone, Copy)]
pub struct GenericPasswordHeader {
    pub record_size: u32,
    pub ssgp_area: u32,
    pub creation_date: u32,
    pub mod_date: u32,
    pub description: u32,
    pub creator: u32,
    pub type_: u32,
    pub print_name: u32,
    pub alias: u32,
    pub account: u32,
    pub service: u32,
}

impl Decode for GenericPasswordHeader {
    const SIZE: usize = 44;

    fn decode(reader: &ByteReader<'_>, offset: usize) -> Result<Self, FormatError> {
        Ok(Self {
            record_size: reader.u32_be(offset)?,
            ssgp_area: reader.u32_be(offset + 4)?,
            creation_date: reader.u32_be(offset + 8)?,
            mod_date: reader.u32_be(offset + 12)?,
            description: reader.u32_be(offset + 16)?,
            creator: reader.u32_be(offset + 20)?,
            type_: reader.u32_be(offset + 24)?,
            print_name: reader.u32_be(offset + 28)?,
            alias: reader.u32_be(offset + 32)?,
            account: reader.u32_be(offset + 36)?,
            service: reader.u32_be(offset + 40)?,
        })
    }
}

/// Internet password record header.
#[derive(Debug, Clone, Copy)]
pub struct InternetPasswordHeader {
    pub record_size: u32,
    pub ssgp_area: u32,
    pub creation_date: u32,
    pub mod_date: u32,
    pub description: u32,
    pub comment: u32,
    pub creator: u32,
    pub type_: u32,
    pub print_name: u32,
    pub alias: u32,
    pub protected: u32,
    pub account: u32,
    pub security_domain: u32,
    pub server: u32,
    pub protocol: u32,
    pub auth_type: u32,
    pub port: u32,
    pub path: u32,
}

impl Decode for InternetPasswordHeader {
    const SIZE: usize = 72;

    fn decode(reader: &ByteReader<'_>, offset: usize) -> Result<Self, FormatError> {
        Ok(Self {
            record_size: reader.u32_be(offset)?,
            ssgp_area: reader.u32_be(offset + 4)?,
            creation_date: reader.u32_be(offset + 8)?,
            mod_date: reader.u32_be(offset + 12)?,
            description: reader.u32_be(offset + 16)?,
            comment: reader.u32_be(offset + 20)?,
            creator: reader.u32_be(offset + 24)?,
            type_: reader.u32_be(offset + 28)?,
            print_name: reader.u32_be(offset + 32)?,
            alias: reader.u32_be(offset + 36)?,
            protected: reader.u32_be(offset + 40)?,
            account: reader.u32_be(offset + 44)?,
            security_domain: reader.u32_be(offset + 48)?,
            server: reader.u32_be(offset + 52)?,
            protocol: reader.u32_be(offset + 56)?,
            auth_type: reader.u32_be(offset + 60)?,
            port: reader.u32_be(offset + 64)?,
            path: reader.u32_be(offset + 68)?,
        })
    }
}

/// AppleShare password record header.
#[derive(Debug, Clone, Copy)]
pub struct AppleShareHeader {
    pub record_size: u32,
    pub ssgp_area: u32,
    pub creation_date: u32,
    pub mod_date: u32,
    pub description: u32,
    pub comment: u32,
    pub creator: u32,
    pub type_: u32,
    pub print_name: u32,
    pub alias: u32,
    pub protected: u32,
    pub account: u32,
    pub volume: u32,
    pub server: u32,
    pub protocol: u32,
    pub address: u32,
    pub signature: u32,
}

impl Decode for AppleShareHeader {
    const SIZE: usize = 68;

    fn decode(reader: &ByteReader<'_>, offset: usize) -> Result<Self, FormatError> {
        Ok(Self {
            record_size: reader.u32_be(offset)?,
            ssgp_area: reader.u32_be(offset + 4)?,
            creation_date: reader.u32_be(offset + 8)?,
            mod_date: reader.u32_be(offset + 12)?,
            description: reader.u32_be(offset + 16)?,
            comment: reader.u32_be(offset + 20)?,
            creator: reader.u32_be(offset + 24)?,
            type_: reader.u32_be(offset + 28)?,
            print_name: reader.u32_be(offset + 32)?,
            alias: reader.u32_be(offset + 36)?,
            protected: reader.u32_be(offset + 40)?,
            account: reader.u32_be(offset + 44)?,
            volume: reader.u32_be(offset + 48)?,
            server: reader.u32_be(offset + 52)?,
            protocol: reader.u32_be(offset + 56)?,
            address: reader.u32_be(offset + 60)?,
            signature: reader.u32_be(offset + 64)?,
        })
    }
}

/// X.509 certificate record header. Unlike the password records, the
/// certificate bytes are a flat trailing blob (`cert_size` long, starting
/// right after this header) rather than column-pointer attributes.
#[derive(Debug, Clone, Copy)]
pub struct X509CertHeader {
    pub cert_size: u32,
    pub cert_type: u32,
    pub cert_encoding: u32,
    pub print_name: u32,
    pub alias: u32,
    pub subject: u32,
    pub issuer: u32,
    pub serial_number: u32,
    pub subject_key_identifier: u32,
    pub public_key_hash: u32,
}

impl Decode for X509CertHeader {
    const SIZE: usize = 40;

    fn decode(reader: &ByteReader<'_>, offset: usize) -> Result<Self, FormatError> {
        Ok(Self {
            cert_size: reader.u32_be(offset)?,
            cert_type: reader.u32_be(offset + 4)?,
            cert_encoding: reader.u32_be(offset + 8)?,
            print_name: reader.u32_be(offset + 12)?,
            alias: reader.u32_be(offset + 16)?,
            subject: reader.u32_be(offset + 20)?,
            issuer: reader.u32_be(offset + 24)?,
            serial_number: reader.u32_be(offset + 28)?,
            subject_key_identifier: reader.u32_be(offset + 32)?,
            public_key_hash: reader.u32_be(offset + 36)?,
        })
    }
}

/// Public/private key record header, shared by both `CSSM_DL_DB_RECORD_PUBLIC_KEY`
/// and `CSSM_DL_DB_RECORD_PRIVATE_KEY`. `blob_size` bounds the keyblob that
/// immediately follows this header.
#[derive(Debug, Clone, Copy)]
pub struct SecKeyHeader {
    pub blob_size: u32,
    pub print_name: u32,
    pub label: u32,
    pub key_class: u32,
    pub private: u32,
    pub key_type: u32,
    pub key_size_in_bits: u32,
    pub effective_key_size: u32,
    pub extractable: u32,
    pub key_creator: u32,
}

impl Decode for SecKeyHeader {
    const SIZE: usize = 40;

    fn decode(reader: &ByteReader<'_>, offset: usize) -> Result<Self, FormatError> {
        Ok(Self {
            blob_size: reader.u32_be(offset)?,
            print_name: reader.u32_be(offset + 4)?,
            label: reader.u32_be(offset + 8)?,
            key_class: reader.u32_be(offset + 12)?,
            private: reader.u32_be(offset + 16)?,
            key_type: reader.u32_be(offset + 20)?,
            key_size_in_bits: reader.u32_be(offset + 24)?,
            effective_key_size: reader.u32_be(offset + 28)?,
            extractable: reader.u32_be(offset + 32)?,
            key_creator: reader.u32_be(offset + 36)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn be_bytes(values: &[u32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_be_bytes()).collect()
    }

    #[test]
    fn database_header_decodes_signature_and_offsets() {
        let mut buf = KEYCHAIN_SIGNATURE.to_vec();
        buf.extend(be_bytes(&[1, 20, 28, 0]));
        let reader = ByteReader::new(&buf);
        let header = DatabaseHeader::decode(&reader, 0).unwrap();
        assert!(header.is_valid_signature());
        assert_eq!(header.header_size, 20);
        assert_eq!(header.schema_offset, 28);
    }

    #[test]
    fn database_header_rejects_bad_signature() {
        let mut buf = b"nope".to_vec();
        buf.extend(be_bytes(&[1, 20, 28, 0]));
        let reader = ByteReader::new(&buf);
        let header = DatabaseHeader::decode(&reader, 0).unwrap();
        assert!(!header.is_valid_signature());
    }

    #[test]
    fn table_header_decodes_record_count() {
        let buf = be_bytes(&[100, 0x8000_0000, 3, 3, 0, 0]);
        let reader = ByteReader::new(&buf);
        let header = TableHeader::decode(&reader, 0).unwrap();
        assert_eq!(header.table_id, 0x8000_0000);
        assert_eq!(header.record_count, 3);
    }

    #[test]
    fn key_blob_reports_valid_magic() {
        let mut buf = COMMON_BLOB_MAGIC.to_be_bytes().to_vec();
        buf.extend(be_bytes(&[0, 24, 48]));
        buf.extend_from_slice(&[0u8; 8]);
        let reader = ByteReader::new(&buf);
        let blob = KeyBlob::decode(&reader, 0).unwrap();
        assert!(blob.has_valid_magic());
        assert_eq!(blob.start_crypto_blob, 24);
        assert_eq!(blob.total_length, 48);
    }

    #[test]
    fn ssgp_lookup_key_concatenates_magic_and_label() {
        let mut buf = b"ssgp".to_vec();
        buf.extend_from_slice(&[0x11u8; 20]);
        buf.extend_from_slice(&[0u8; 8]);
        let reader = ByteReader::new(&buf);
        let ssgp = Ssgp::decode(&reader, 0).unwrap();
        let key = ssgp.lookup_key();
        assert_eq!(&key[..4], b"ssgp");
        assert_eq!(&key[4..], &[0x11u8; 20][..]);
    }
}
