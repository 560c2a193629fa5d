//! JSON rendering for dumped records.
//!
//! One `serde_json::Value` object per record, byte fields (certificate DER,
//! key material) base64-encoded, and the locked sentinel surfaced verbatim
//! wherever a secret could not be recovered — downstream tooling should not
//! need to special-case "locked" versus "present" beyond a string compare.

use anyhow::Result;
use base64::prelude::*;
use chainbreak::{
    AppleShareRecord, GenericPasswordRecord, InternetPasswordRecord, KeyRecord, Keychain,
    PasswordEncoding, PasswordValue, X509CertificateRecord, LOCKED_SIGNATURE,
};
use serde_json::{json, Map, Value};

use crate::CliWhich;

pub fn print_all(keychain: &Keychain, which: CliWhich) -> Result<()> {
    use CliWhich::*;

    let mut out = Map::new();

    if matches!(which, Generic | All) {
        let records = keychain.generic_passwords();
        out.insert(
            "generic_passwords".to_string(),
            Value::Array(records.iter().map(generic_password_json).collect()),
        );
    }
    if matches!(which, Internet | All) {
        let records = keychain.internet_passwords();
        out.insert(
            "internet_passwords".to_string(),
            Value::Array(records.iter().map(internet_password_json).collect()),
        );
    }
    if matches!(which, Appleshare | All) {
        let records = keychain.appleshare_passwords();
        out.insert(
            "appleshare_passwords".to_string(),
            Value::Array(records.iter().map(appleshare_json).collect()),
        );
    }
    if matches!(which, X509 | All) {
        let records = keychain.x509_certificates();
        out.insert(
            "x509_certificates".to_string(),
            Value::Array(records.iter().map(x509_json).collect()),
        );
    }
    if matches!(which, Pubkey | All) {
        let records = keychain.public_keys();
        out.insert(
            "public_keys".to_string(),
            Value::Array(records.iter().map(key_json).collect()),
        );
    }
    if matches!(which, Privkey | All) {
        let records = keychain.private_keys();
        out.insert(
            "private_keys".to_string(),
            Value::Array(records.iter().map(key_json).collect()),
        );
    }
    if matches!(which, Hash | All) {
        if let Ok(hash) = keychain.password_hash() {
            out.insert("password_hash".to_string(), json!(hash.to_string()));
        }
    }

    println!("{}", serde_json::to_string_pretty(&Value::Object(out))?);
    Ok(())
}

fn password_value(password: &Option<PasswordValue>) -> Value {
    match password {
        Some(p) => json!({ "text": p.text, "encoding": encoding_name(p.encoding) }),
        None => json!(LOCKED_SIGNATURE),
    }
}

fn encoding_name(encoding: PasswordEncoding) -> &'static str {
    match encoding {
        PasswordEncoding::Utf8 => "utf-8",
        PasswordEncoding::Latin1 => "latin-1",
    }
}

fn generic_password_json(record: &GenericPasswordRecord) -> Value {
    json!({
        "creation_date": record.creation_date.as_ref().map(|t| t.as_str().to_string()),
        "mod_date": record.mod_date.as_ref().map(|t| t.as_str().to_string()),
        "description": record.description,
        "creator": record.creator.map(|c| c.to_string()),
        "type": record.type_.map(|c| c.to_string()),
        "print_name": record.print_name,
        "alias": record.alias,
        "account": record.account,
        "service": record.service,
        "password": password_value(&record.password),
    })
}

fn internet_password_json(record: &InternetPasswordRecord) -> Value {
    json!({
        "creation_date": record.creation_date.as_ref().map(|t| t.as_str().to_string()),
        "mod_date": record.mod_date.as_ref().map(|t| t.as_str().to_string()),
        "description": record.description,
        "comment": record.comment,
        "creator": record.creator.map(|c| c.to_string()),
        "type": record.type_.map(|c| c.to_string()),
        "print_name": record.print_name,
        "alias": record.alias,
        "account": record.account,
        "security_domain": record.security_domain,
        "server": record.server,
        "protocol": record.protocol.map(|p| p.to_string()),
        "auth_type": record.auth_type.map(|a| a.to_string()),
        "port": record.port,
        "path": record.path,
        "password": password_value(&record.password),
    })
}

fn appleshare_json(record: &AppleShareRecord) -> Value {
    json!({
        "creation_date": record.creation_date.as_ref().map(|t| t.as_str().to_string()),
        "mod_date": record.mod_date.as_ref().map(|t| t.as_str().to_string()),
        "description": record.description,
        "comment": record.comment,
        "creator": record.creator.map(|c| c.to_string()),
        "type": record.type_.map(|c| c.to_string()),
        "print_name": record.print_name,
        "alias": record.alias,
        "account": record.account,
        "volume": record.volume,
        "server": record.server,
        "protocol": record.protocol.map(|p| p.to_string()),
        "address": record.address,
        "signature": record.signature,
        "password": password_value(&record.password),
    })
}

fn x509_json(record: &X509CertificateRecord) -> Value {
    json!({
        "cert_type": record.cert_type,
        "cert_encoding": record.cert_encoding,
        "print_name": record.print_name,
        "alias": record.alias,
        "subject": record.subject,
        "issuer": record.issuer,
        "serial_number": record.serial_number,
        "subject_key_identifier": record.subject_key_identifier,
        "public_key_hash": record.public_key_hash,
        "der_bytes": BASE64_STANDARD.encode(&record.der_bytes),
    })
}

fn key_json(record: &KeyRecord) -> Value {
    json!({
        "print_name": record.print_name,
        "label": record.label,
        "key_class": record.key_class.to_string(),
        "key_type": record.key_type.map(|t| t.to_string()),
        "key_size_in_bits": record.key_size_in_bits,
        "effective_key_size": record.effective_key_size,
        "extractable": record.extractable,
        "key_material": match &record.key_material {
            Some(material) => json!(BASE64_STANDARD.encode(material)),
            None => json!(LOCKED_SIGNATURE),
        },
    })
}
