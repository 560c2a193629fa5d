//! Master key derivation from a user-supplied password.

use zeroize::Zeroizing;

/// Keychain master keys are 1000-round PBKDF2-HMAC-SHA1, 24 bytes — this
/// predates PBKDF2 iteration-count inflation and must be reproduced exactly,
/// not strengthened, or derived keys from real keychain files will not match.
const PBKDF2_ROUNDS: u32 = 1000;
const MASTER_KEY_LEN: usize = 24;

/// Derives the master key used to decrypt a keychain's DB blob.
pub fn derive_master_key(password: &[u8], salt: &[u8; 20]) -> Zeroizing<[u8; 24]> {
    let mut out = [0u8; MASTER_KEY_LEN];
    pbkdf2::pbkdf2_hmac::<sha1::Sha1>(password, salt, PBKDF2_ROUNDS, &mut out);
    Zeroizing::new(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_password_and_salt_derive_the_same_key() {
        let salt = [1u8; 20];
        let a = derive_master_key(b"hunter2", &salt);
        let b = derive_master_key(b"hunter2", &salt);
        assert_eq!(*a, *b);
    }

    #[test]
    fn different_passwords_derive_different_keys() {
        let salt = [1u8; 20];
        let a = derive_master_key(b"hunter2", &salt);
        let b = derive_master_key(b"hunter3", &salt);
        assert_ne!(*a, *b);
    }

    #[test]
    fn different_salts_derive_different_keys() {
        let a = derive_master_key(b"hunter2", &[1u8; 20]);
        let b = derive_master_key(b"hunter2", &[2u8; 20]);
        assert_ne!(*a, *b);
    }
}
