//! # chainbreak-format
//!
//! Parses the legacy Apple `.keychain` binary container: the file header,
//! schema, table directory, and the per-record-kind struct layouts, plus the
//! attribute-pointer resolution and record-building logic that turns raw
//! bytes into typed records.
//!
//! This crate never makes a yes/no judgment about whether a password is
//! "right" — that is `chainbreak-crypto`'s PKCS#7-padding signal. Here, a
//! record whose secret cannot be recovered simply has `password: None` or
//! `key_material: None`.

mod attrs;
mod byte_reader;
mod error;
mod navigator;
mod records;
mod structs;

pub use attrs::{mask_pointer, resolve_four_char_code, resolve_int, resolve_lv, resolve_lv_string, resolve_timestamp};
pub use byte_reader::{ByteReader, Decode};
pub use error::FormatError;
pub use navigator::{KeychainFile, TableView};
pub use records::{
    build_appleshare_password, build_generic_password, build_internet_password,
    build_private_key, build_public_key, build_wrapping_key_map, build_x509_certificate,
    AppleShareRecord, GenericPasswordRecord, InternetPasswordRecord, KeyRecord, PasswordEncoding,
    PasswordValue, Record, X509CertificateRecord,
};
pub use structs::{
    AppleShareHeader, COMMON_BLOB_MAGIC, DatabaseHeader, DbBlob, GenericPasswordHeader,
    InternetPasswordHeader, KEYCHAIN_SIGNATURE, KeyBlob, KeyBlobRecordHeader, SchemaHeader,
    SecKeyHeader, SSGP_MAGIC, Ssgp, TableHeader, UnlockBlob, X509CertHeader,
};
