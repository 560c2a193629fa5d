//! The crackable keychain-password hash, in the `$keychain$*salt*iv*ct` form
//! common password-recovery tools expect.

use std::fmt;

/// The DB blob's salt, IV, and ciphertext, formatted for an offline cracker.
///
/// Available on a locked keychain — extracting this never requires the
/// credential it is meant to attack.
#[derive(Debug, Clone)]
pub struct KeychainPasswordHash {
    salt: [u8; 20],
    iv: [u8; 8],
    ciphertext: Vec<u8>,
}

impl KeychainPasswordHash {
    pub(crate) fn new(salt: [u8; 20], iv: [u8; 8], ciphertext: Vec<u8>) -> Self {
        Self { salt, iv, ciphertext }
    }

    pub fn salt(&self) -> &[u8; 20] {
        &self.salt
    }

    pub fn iv(&self) -> &[u8; 8] {
        &self.iv
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }
}

impl fmt::Display for KeychainPasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "$keychain$*{}*{}*{}",
            hex::encode(self.salt),
            hex::encode(self.iv),
            hex::encode(&self.ciphertext)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_keychain_hash_format() {
        let hash = KeychainPasswordHash::new([0x11; 20], [0x22; 8], vec![0x33; 4]);
        let rendered = hash.to_string();
        assert!(rendered.starts_with("$keychain$*"));
        let parts: Vec<&str> = rendered.trim_start_matches("$keychain$*").split('*').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "11".repeat(20));
        assert_eq!(parts[1], "22".repeat(8));
        assert_eq!(parts[2], "33333333");
    }
}
