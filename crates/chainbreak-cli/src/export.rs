//! Exports dumped records to one file per record.
//!
//! The filename is derived from the record's print name, keeping only
//! alphanumeric characters, with the per-kind extension `chainbreak dump`
//! uses: `.txt` for passwords, `.crt` for certificates, `.pub`/`.key` for
//! public/private key material. A record with no recoverable secret still
//! gets a file, containing the locked sentinel — the point of export is a
//! complete inventory, not just the ones that cracked.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chainbreak::{Keychain, LOCKED_SIGNATURE};

use crate::style::{print_labeled, print_success};
use crate::CliWhich;

pub fn export_all(keychain: &Keychain, which: CliWhich, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    use CliWhich::*;
    let mut written = 0usize;

    if matches!(which, Generic | All) {
        for record in keychain.generic_passwords() {
            let payload = record.password.map(|p| p.text).unwrap_or_else(|| LOCKED_SIGNATURE.to_string());
            export_one(dir, record.print_name.as_deref(), "txt", payload.as_bytes())?;
            written += 1;
        }
    }

    if matches!(which, Internet | All) {
        for record in keychain.internet_passwords() {
            let payload = record.password.map(|p| p.text).unwrap_or_else(|| LOCKED_SIGNATURE.to_string());
            export_one(dir, record.print_name.as_deref(), "txt", payload.as_bytes())?;
            written += 1;
        }
    }

    if matches!(which, Appleshare | All) {
        for record in keychain.appleshare_passwords() {
            let payload = record.password.map(|p| p.text).unwrap_or_else(|| LOCKED_SIGNATURE.to_string());
            export_one(dir, record.print_name.as_deref(), "txt", payload.as_bytes())?;
            written += 1;
        }
    }

    if matches!(which, X509 | All) {
        for record in keychain.x509_certificates() {
            export_one(dir, record.print_name.as_deref(), "crt", &record.der_bytes)?;
            written += 1;
        }
    }

    if matches!(which, Pubkey | All) {
        for record in keychain.public_keys() {
            let payload = record.key_material.unwrap_or_else(|| LOCKED_SIGNATURE.as_bytes().to_vec());
            export_one(dir, record.print_name.as_deref(), "pub", &payload)?;
            written += 1;
        }
    }

    if matches!(which, Privkey | All) {
        for record in keychain.private_keys() {
            let payload = record.key_material.unwrap_or_else(|| LOCKED_SIGNATURE.as_bytes().to_vec());
            export_one(dir, record.print_name.as_deref(), "key", &payload)?;
            written += 1;
        }
    }

    if matches!(which, Hash | All) {
        if let Ok(hash) = keychain.password_hash() {
            export_one(dir, Some("keychain-password-hash"), "txt", hash.to_string().as_bytes())?;
            written += 1;
        }
    }

    print_labeled("export directory", &dir.display().to_string());
    print_success(&format!("wrote {written} file(s)"));
    Ok(())
}

/// Writes `payload` under a filename derived from `print_name`, disambiguating
/// a collision by appending `.1`, `.2`, ... before the extension.
fn export_one(dir: &Path, print_name: Option<&str>, extension: &str, payload: &[u8]) -> Result<()> {
    let stem = sanitize_stem(print_name);
    let mut path = dir.join(format!("{stem}.{extension}"));
    let mut suffix = 1u32;
    while path.exists() {
        path = dir.join(format!("{stem}.{suffix}.{extension}"));
        suffix += 1;
    }
    fs::write(&path, payload).with_context(|| format!("writing {}", path.display()))
}

fn sanitize_stem(print_name: Option<&str>) -> String {
    let name: String = print_name
        .unwrap_or("unnamed")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    if name.is_empty() {
        "unnamed".to_string()
    } else {
        name
    }
}
