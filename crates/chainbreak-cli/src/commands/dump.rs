//! `chainbreak dump` — parse a keychain file and render its records.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chainbreak::{Credential, Keychain, KeyRecord, LOCKED_SIGNATURE};

use crate::export;
use crate::json;
use crate::style::colors::SemanticStyle;
use crate::style::table::print_records_table;
use crate::style::{print_hint, print_success, print_warn};
use crate::{CliOutputFormat, CliWhich};

/// Arguments collected from the `dump` subcommand, already merged with
/// configured defaults by `main`.
pub struct DumpArgs {
    pub keychain_path: PathBuf,
    pub password: Option<String>,
    pub hex_key: Option<String>,
    pub unlock_file: Option<PathBuf>,
    pub which: CliWhich,
    pub format: CliOutputFormat,
    pub export_dir: Option<PathBuf>,
    pub try_all_kinds: bool,
}

pub fn run(args: DumpArgs) -> Result<()> {
    let candidates = resolve_credentials(&args);
    tracing::debug!(
        try_all_kinds = args.try_all_kinds,
        candidates = candidates.len(),
        "resolving credential"
    );

    let bytes = fs::read(&args.keychain_path)
        .with_context(|| format!("reading {}", args.keychain_path.display()))?;
    let mut keychain = Keychain::open(bytes)?;

    if !keychain.signature_valid() {
        print_warn("file signature is not \"kych\" — parsing best-effort");
    }

    if candidates.is_empty() {
        print_hint("no credential supplied — dumping structure and metadata only");
    } else {
        // `--password`/`--hex-key`/`--unlock-file` may be combined; when
        // `try_all_kinds` is set, each supplied credential is tried in turn
        // (password, then hex key, then unlock file) until one unlocks the
        // keychain or all have been exhausted.
        for credential in &candidates {
            keychain.unlock(credential);
            if !keychain.is_locked() {
                break;
            }
            if !args.try_all_kinds {
                break;
            }
        }
        if keychain.is_locked() {
            print_warn("credential did not unlock the keychain — secrets will show as locked");
        } else {
            print_success("keychain unlocked");
        }
    }

    if let Some(export_dir) = &args.export_dir {
        return export::export_all(&keychain, args.which, export_dir);
    }

    match args.format {
        CliOutputFormat::Json => json::print_all(&keychain, args.which),
        CliOutputFormat::Text => print_all_text(&keychain, args.which),
    }
}

/// Collects every credential the caller supplied, in the fixed try-order
/// password -> hex key -> unlock file.
fn resolve_credentials(args: &DumpArgs) -> Vec<Credential> {
    let mut credentials = Vec::new();
    if let Some(password) = &args.password {
        credentials.push(Credential::Password(password.clone()));
    }
    if let Some(hex_key) = &args.hex_key {
        credentials.push(Credential::HexKey(hex_key.clone()));
    }
    if let Some(unlock_file) = &args.unlock_file {
        credentials.push(Credential::UnlockFile(unlock_file.clone()));
    }
    credentials
}

fn print_all_text(keychain: &Keychain, which: CliWhich) -> Result<()> {
    use CliWhich::*;

    if matches!(which, Generic | All) {
        let rows: Vec<Vec<String>> = keychain
            .generic_passwords()
            .iter()
            .map(|r| {
                vec![
                    r.print_name.clone().unwrap_or_default(),
                    r.account.clone().unwrap_or_default(),
                    r.service.clone().unwrap_or_default(),
                    password_cell(r.password.as_ref().map(|p| p.text.as_str())),
                ]
            })
            .collect();
        print_records_table(
            "Generic Passwords",
            &["Name", "Account", "Service", "Password"].map(String::from),
            &rows,
        );
    }

    if matches!(which, Internet | All) {
        let rows: Vec<Vec<String>> = keychain
            .internet_passwords()
            .iter()
            .map(|r| {
                vec![
                    r.print_name.clone().unwrap_or_default(),
                    r.account.clone().unwrap_or_default(),
                    r.server.clone().unwrap_or_default(),
                    r.protocol.map(|p| p.to_string()).unwrap_or_default(),
                    password_cell(r.password.as_ref().map(|p| p.text.as_str())),
                ]
            })
            .collect();
        print_records_table(
            "Internet Passwords",
            &["Name", "Account", "Server", "Protocol", "Password"].map(String::from),
            &rows,
        );
    }

    if matches!(which, Appleshare | All) {
        let rows: Vec<Vec<String>> = keychain
            .appleshare_passwords()
            .iter()
            .map(|r| {
                vec![
                    r.print_name.clone().unwrap_or_default(),
                    r.account.clone().unwrap_or_default(),
                    r.server.clone().unwrap_or_default(),
                    password_cell(r.password.as_ref().map(|p| p.text.as_str())),
                ]
            })
            .collect();
        print_records_table(
            "AppleShare Passwords",
            &["Name", "Account", "Server", "Password"].map(String::from),
            &rows,
        );
    }

    if matches!(which, X509 | All) {
        let rows: Vec<Vec<String>> = keychain
            .x509_certificates()
            .iter()
            .map(|r| {
                vec![
                    r.print_name.clone().unwrap_or_default(),
                    r.subject.clone().unwrap_or_default(),
                    r.issuer.clone().unwrap_or_default(),
                    r.der_bytes.len().to_string(),
                ]
            })
            .collect();
        print_records_table(
            "X.509 Certificates",
            &["Name", "Subject", "Issuer", "DER bytes"].map(String::from),
            &rows,
        );
    }

    if matches!(which, Pubkey | All) {
        print_key_table("Public Keys", &keychain.public_keys());
    }

    if matches!(which, Privkey | All) {
        print_key_table("Private Keys", &keychain.private_keys());
    }

    if matches!(which, Hash | All) {
        match keychain.password_hash() {
            Ok(hash) => {
                println!("{}", "Keychain Password Hash".header());
                println!("{hash}");
            }
            Err(err) => crate::style::print_error(&format!("could not extract password hash: {err}")),
        }
    }

    Ok(())
}

fn print_key_table(title: &str, records: &[KeyRecord]) {
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| {
            vec![
                r.print_name.clone().unwrap_or_default(),
                r.label.clone().unwrap_or_default(),
                r.key_class.to_string(),
                r.key_type.map(|t| t.to_string()).unwrap_or_default(),
                r.key_size_in_bits.map(|b| b.to_string()).unwrap_or_default(),
                match &r.key_material {
                    Some(material) => format!("{} bytes", material.len()),
                    None => LOCKED_SIGNATURE.to_string(),
                },
            ]
        })
        .collect();
    print_records_table(
        title,
        &["Name", "Label", "Class", "Type", "Bits", "Material"].map(String::from),
        &rows,
    );
}

fn password_cell(password: Option<&str>) -> String {
    password.map(str::to_string).unwrap_or_else(|| LOCKED_SIGNATURE.to_string())
}
