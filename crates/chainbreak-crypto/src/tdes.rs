//! 3DES-CBC, the block cipher every keychain secret is wrapped in.

use cbc::Decryptor;
use cipher::block_padding::Pkcs7;
use cipher::{BlockDecryptMut, KeyIvInit};
use des::TdesEde3;

/// Decrypts `data` with 3DES-CBC and strips PKCS#7 padding.
///
/// Returns `None` rather than an error on anything that signals a wrong key:
/// empty input, a length that is not a positive multiple of the 8-byte block
/// size, or padding that does not validate. Keychain tooling uses exactly
/// this signal to detect a wrong password — treating it as an exceptional
/// `Err` would make the "try the next candidate" caller pattern (see
/// [`crate::recover_wrapping_key`]) awkward for no benefit.
pub fn tdes_cbc_decrypt(key: &[u8; 24], iv: &[u8; 8], data: &[u8]) -> Option<Vec<u8>> {
    if data.is_empty() || data.len() % 8 != 0 {
        return None;
    }
    let decryptor = Decryptor::<TdesEde3>::new(key.into(), iv.into());
    decryptor.decrypt_padded_vec_mut::<Pkcs7>(data).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cbc::Encryptor;
    use cipher::BlockEncryptMut;
    use proptest::prelude::*;
    use test_case::test_case;

    fn encrypt(key: &[u8; 24], iv: &[u8; 8], data: &[u8]) -> Vec<u8> {
        Encryptor::<TdesEde3>::new(key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(data)
    }

    #[test]
    fn round_trips_through_encrypt_decrypt() {
        let key = [7u8; 24];
        let iv = [3u8; 8];
        let plaintext = b"hunter2 is a bad password choice";
        let ciphertext = encrypt(&key, &iv, plaintext);
        let recovered = tdes_cbc_decrypt(&key, &iv, &ciphertext).unwrap();
        assert_eq!(recovered, plaintext);
    }

    #[test]
    fn wrong_key_fails_padding_and_returns_none() {
        let key = [7u8; 24];
        let wrong_key = [8u8; 24];
        let iv = [3u8; 8];
        let ciphertext = encrypt(&key, &iv, b"some secret value here");
        assert!(tdes_cbc_decrypt(&wrong_key, &iv, &ciphertext).is_none());
    }

    #[test_case(&[] ; "empty")]
    #[test_case(&[1, 2, 3] ; "three bytes")]
    #[test_case(&[0u8; 9] ; "not a multiple of the block size")]
    fn non_block_aligned_input_returns_none(data: &[u8]) {
        assert!(tdes_cbc_decrypt(&[0u8; 24], &[0u8; 8], data).is_none());
    }

    proptest! {
        /// For any key/iv/plaintext, encrypting then decrypting recovers the
        /// original bytes exactly — the padding scheme never loses data.
        #[test]
        fn round_trip_preserves_arbitrary_plaintext(
            key in any::<[u8; 24]>(),
            iv in any::<[u8; 8]>(),
            plaintext in proptest::collection::vec(any::<u8>(), 0..256),
        ) {
            let ciphertext = encrypt(&key, &iv, &plaintext);
            let recovered = tdes_cbc_decrypt(&key, &iv, &ciphertext);
            prop_assert_eq!(recovered, Some(plaintext));
        }
    }
}
