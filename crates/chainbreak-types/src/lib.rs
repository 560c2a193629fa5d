//! # chainbreak-types
//!
//! Shared types for reading the legacy (pre-SQLite) Apple keychain binary
//! format: table identifiers, four-char codes, the opaque keychain timestamp,
//! and the small set of CSSM-heritage enumerations (key class, algorithm,
//! internet-password protocol/auth type) that keychain records carry as raw
//! integers or four-char codes.
//!
//! This crate has no I/O and no cryptography — it only defines the vocabulary
//! that [`chainbreak-format`](../chainbreak_format/index.html) and
//! [`chainbreak-crypto`](../chainbreak_crypto/index.html) build on.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// CSSM/Apple well-known record (table) type identifiers.
///
/// Schema tables in a keychain file are not stored in a fixed order; callers
/// must scan the table directory and match on these constants to find a
/// table of a given kind. Values are taken from Apple's CSSM/Security
/// framework headers (`cssmtype.h`, `cssmapple.h`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableId(pub u32);

impl TableId {
    pub const SCHEMA_INFO: TableId = TableId(0x0000_0000);
    pub const SCHEMA_INDEXES: TableId = TableId(0x0000_0001);
    pub const SCHEMA_ATTRIBUTES: TableId = TableId(0x0000_0002);
    pub const SCHEMA_PARSING_MODULE: TableId = TableId(0x0000_0003);

    pub const PUBLIC_KEY: TableId = TableId(0x0000_000A);
    pub const PRIVATE_KEY: TableId = TableId(0x0000_000B);
    pub const SYMMETRIC_KEY: TableId = TableId(0x0000_000C);

    pub const GENERIC_PASSWORD: TableId = TableId(0x8000_0000);
    pub const INTERNET_PASSWORD: TableId = TableId(0x8000_0001);
    pub const APPLESHARE_PASSWORD: TableId = TableId(0x8000_0002);
    pub const X509_CERTIFICATE: TableId = TableId(0x8000_1000);
    pub const X509_CRL: TableId = TableId(0x8000_1001);
    pub const UNLOCK_REFERRAL: TableId = TableId(0x8000_1002);
    pub const EXTENDED_ATTRIBUTE: TableId = TableId(0x8000_1004);
    pub const METADATA: TableId = TableId(0x8000_8000);

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl From<u32> for TableId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// A raw 4-byte type tag, stored and displayed the way CSSM four-char codes
/// always are: as ASCII when printable, as hex otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FourCharCode(pub [u8; 4]);

impl FourCharCode {
    pub fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Lossy ASCII rendering, replacing non-printable bytes with `.`.
    pub fn to_ascii_lossy(self) -> String {
        self.0
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
            .collect()
    }
}

impl Display for FourCharCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.iter().all(|&b| b.is_ascii_graphic() || b == b' ') {
            write!(f, "{}", self.to_ascii_lossy())
        } else {
            write!(f, "0x{:02x}{:02x}{:02x}{:02x}", self.0[0], self.0[1], self.0[2], self.0[3])
        }
    }
}

impl From<[u8; 4]> for FourCharCode {
    fn from(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }
}

/// The 16-byte `CSSM_DB_ATTRIBUTE_FORMAT_TIME_DATE` token keychain records use
/// for creation/modification timestamps.
///
/// The on-disk value is an ASCII string such as `20230114120102Z` padded with
/// trailing NULs, not a struct. Nothing in this tool needs to do date
/// arithmetic on it, so it is kept as an opaque token rather than parsed into
/// a calendar type — parsing it would require guessing at a timezone and
/// locale the original writer never recorded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeychainTimestamp(pub String);

impl KeychainTimestamp {
    pub fn from_raw(raw: &[u8]) -> Self {
        let text = raw
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| b as char)
            .collect::<String>();
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for KeychainTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `CSSM_KEYCLASS` — the role a key record plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyClass {
    PublicKey,
    PrivateKey,
    SessionKey,
    SecretPart,
    Unknown(u32),
}

impl KeyClass {
    pub fn from_raw(value: u32) -> Self {
        match value {
            0 => Self::PublicKey,
            1 => Self::PrivateKey,
            2 => Self::SessionKey,
            3 => Self::SecretPart,
            other => Self::Unknown(other),
        }
    }
}

impl Display for KeyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PublicKey => write!(f, "Public Key"),
            Self::PrivateKey => write!(f, "Private Key"),
            Self::SessionKey => write!(f, "Session Key"),
            Self::SecretPart => write!(f, "Secret Part"),
            Self::Unknown(v) => write!(f, "Unknown (0x{v:08x})"),
        }
    }
}

/// `CSSM_ALGORITHMS` values seen on keychain key records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CssmAlgorithm {
    Rsa,
    Dsa,
    Fee,
    ElGamal,
    Aes,
    Des,
    TripleDes,
    Rc2,
    Rc4,
    Rc5,
    EcDsa,
    Unknown(u32),
}

impl CssmAlgorithm {
    pub fn from_raw(value: u32) -> Self {
        match value {
            42 => Self::Rsa,
            43 => Self::Dsa,
            0x18 => Self::Fee,
            0x1E => Self::ElGamal,
            0x80000001 => Self::Aes,
            3 => Self::Des,
            17 => Self::TripleDes,
            9 => Self::Rc2,
            1 => Self::Rc4,
            0x81000002 => Self::Rc5,
            0x8000_0086 => Self::EcDsa,
            other => Self::Unknown(other),
        }
    }
}

impl Display for CssmAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rsa => write!(f, "RSA"),
            Self::Dsa => write!(f, "DSA"),
            Self::Fee => write!(f, "FEE"),
            Self::ElGamal => write!(f, "ElGamal"),
            Self::Aes => write!(f, "AES"),
            Self::Des => write!(f, "DES"),
            Self::TripleDes => write!(f, "3DES"),
            Self::Rc2 => write!(f, "RC2"),
            Self::Rc4 => write!(f, "RC4"),
            Self::Rc5 => write!(f, "RC5"),
            Self::EcDsa => write!(f, "ECDSA"),
            Self::Unknown(v) => write!(f, "Unknown (0x{v:08x})"),
        }
    }
}

/// `kSecProtocolType*` four-char codes on internet password records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtocolType {
    Ftp,
    Http,
    Https,
    Smtp,
    Pop3,
    Imap,
    Ssh,
    Telnet,
    Afp,
    Other(FourCharCode),
}

impl ProtocolType {
    pub fn from_raw(code: FourCharCode) -> Self {
        match &code.0 {
            b"ftp " => Self::Ftp,
            b"http" => Self::Http,
            b"htps" => Self::Https,
            b"smtp" => Self::Smtp,
            b"pop3" => Self::Pop3,
            b"imap" => Self::Imap,
            b"ssh " => Self::Ssh,
            b"teln" => Self::Telnet,
            b"afp " => Self::Afp,
            _ => Self::Other(code),
        }
    }
}

impl Display for ProtocolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ftp => write!(f, "ftp"),
            Self::Http => write!(f, "http"),
            Self::Https => write!(f, "https"),
            Self::Smtp => write!(f, "smtp"),
            Self::Pop3 => write!(f, "pop3"),
            Self::Imap => write!(f, "imap"),
            Self::Ssh => write!(f, "ssh"),
            Self::Telnet => write!(f, "telnet"),
            Self::Afp => write!(f, "afp"),
            Self::Other(code) => write!(f, "{code}"),
        }
    }
}

/// `kSecAuthenticationType*` four-char codes on internet password records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthType {
    Ntlm,
    MsnAuth,
    Dpa,
    Rpa,
    HttpBasic,
    HttpDigest,
    HtmlForm,
    Default,
    Other(FourCharCode),
}

impl AuthType {
    pub fn from_raw(code: FourCharCode) -> Self {
        match &code.0 {
            b"ntlm" => Self::Ntlm,
            b"msna" => Self::MsnAuth,
            b"dpaa" => Self::Dpa,
            b"rpaa" => Self::Rpa,
            b"http" => Self::HttpBasic,
            b"httd" => Self::HttpDigest,
            b"form" => Self::HtmlForm,
            b"dflt" => Self::Default,
            _ => Self::Other(code),
        }
    }
}

impl Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ntlm => write!(f, "NTLM"),
            Self::MsnAuth => write!(f, "MSN"),
            Self::Dpa => write!(f, "DPA"),
            Self::Rpa => write!(f, "RPA"),
            Self::HttpBasic => write!(f, "HTTP Basic"),
            Self::HttpDigest => write!(f, "HTTP Digest"),
            Self::HtmlForm => write!(f, "HTML Form"),
            Self::Default => write!(f, "Default"),
            Self::Other(code) => write!(f, "{code}"),
        }
    }
}

/// The sentinel string surfaced wherever a field's plaintext cannot be
/// recovered because the keychain is still locked.
pub const LOCKED_SIGNATURE: &str = "[Invalid Password / Keychain Locked]";
