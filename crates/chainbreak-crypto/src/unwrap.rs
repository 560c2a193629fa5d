//! The two-stage CMS-style key unwrap used for symmetric keys, private keys,
//! and the DB blob's own wrapping key.

use zeroize::Zeroizing;

use crate::tdes::tdes_cbc_decrypt;

/// Fixed IV used for the outer decrypt of every CMS-wrapped keyblob.
///
/// This is not a secret — it is a constant baked into every keychain ever
/// written by Security.framework — but it must match exactly or the first of
/// the two decrypt passes produces garbage.
pub const MAGIC_CMS_IV: [u8; 8] = [0x4A, 0xDD, 0xA2, 0x2C, 0x79, 0xE8, 0x21, 0x05];

const KEY_LEN: usize = 24;

/// Recovers the 24-byte DB wrapping key from the DB blob's ciphertext region.
///
/// `master_key` is the PBKDF2 output derived from the user's password;
/// `salt`/`iv`/`ciphertext` come straight from the DB blob's on-disk fields.
/// Returns `None` on wrong password (bad padding) or on a plaintext shorter
/// than a wrapping key, which can only mean the same thing.
pub fn recover_wrapping_key(
    master_key: &[u8; KEY_LEN],
    iv: &[u8; 8],
    ciphertext: &[u8],
) -> Option<Zeroizing<[u8; KEY_LEN]>> {
    let plain = tdes_cbc_decrypt(master_key, iv, ciphertext)?;
    if plain.len() < KEY_LEN {
        return None;
    }
    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&plain[..KEY_LEN]);
    Some(Zeroizing::new(key))
}

/// Reverses the first 32 bytes of `data` in place.
///
/// The middle step of the CMS unwrap: after the outer decrypt with
/// [`MAGIC_CMS_IV`], the leading 4 CBC blocks come out byte-reversed and must
/// be flipped back before the inner decrypt with the record's own IV.
fn reverse_first_32(data: &mut [u8]) {
    let n = data.len().min(32);
    data[..n].reverse();
}

/// Unwraps a symmetric-key or DB-blob keyblob ciphertext into its 24-byte
/// key material, via the shared two-pass CMS unwrap primitive.
pub fn unwrap_symmetric_key(
    wrapping_key: &[u8; KEY_LEN],
    iv: &[u8; 8],
    ciphertext: &[u8],
) -> Option<Zeroizing<Vec<u8>>> {
    let mut outer = tdes_cbc_decrypt(wrapping_key, &MAGIC_CMS_IV, ciphertext)?;
    reverse_first_32(&mut outer);
    let inner = tdes_cbc_decrypt(wrapping_key, iv, &outer)?;
    if inner.len() < 4 {
        return None;
    }
    Some(Zeroizing::new(inner[4..].to_vec()))
}

/// Unwraps a private-key keyblob into `(key_name, key_material)`.
///
/// Runs the same two-pass unwrap as [`unwrap_symmetric_key`], but private-key
/// blobs carry an extra 12-byte name field ahead of the key material.
pub fn unwrap_private_key(
    wrapping_key: &[u8; KEY_LEN],
    iv: &[u8; 8],
    ciphertext: &[u8],
) -> Option<(Vec<u8>, Zeroizing<Vec<u8>>)> {
    let mut outer = tdes_cbc_decrypt(wrapping_key, &MAGIC_CMS_IV, ciphertext)?;
    reverse_first_32(&mut outer);
    let inner = tdes_cbc_decrypt(wrapping_key, iv, &outer)?;
    if inner.len() < 12 {
        return None;
    }
    let key_name = inner[..12].to_vec();
    let key_material = Zeroizing::new(inner[12..].to_vec());
    Some((key_name, key_material))
}

/// Decrypts an SSGP-wrapped item secret (a generic/internet/appleshare
/// password value) given its per-item wrapping key.
pub fn decrypt_item_secret(
    wrapping_key: &[u8; KEY_LEN],
    iv: &[u8; 8],
    ciphertext: &[u8],
) -> Option<Vec<u8>> {
    tdes_cbc_decrypt(wrapping_key, iv, ciphertext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cbc::Encryptor;
    use cipher::block_padding::Pkcs7;
    use cipher::{BlockEncryptMut, KeyIvInit};
    use des::TdesEde3;

    fn encrypt(key: &[u8; 24], iv: &[u8; 8], data: &[u8]) -> Vec<u8> {
        Encryptor::<TdesEde3>::new(key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(data)
    }

    #[test]
    fn reverse_first_32_only_touches_leading_bytes() {
        let mut data = (0u8..40).collect::<Vec<_>>();
        reverse_first_32(&mut data);
        assert_eq!(data[0], 31);
        assert_eq!(data[31], 0);
        assert_eq!(data[32], 32);
        assert_eq!(data[39], 39);
    }

    #[test]
    fn symmetric_key_unwrap_round_trips() {
        let wrapping_key = [9u8; 24];
        let record_iv = [5u8; 8];

        // Construct a keyblob the same way Security.framework would wrap one:
        // encrypt(record_iv, plaintext), reverse the leading 32 bytes, then
        // encrypt(MAGIC_CMS_IV, that).
        let mut plaintext = vec![0u8; 4];
        plaintext.extend_from_slice(&[0xAB; 24]);
        let inner_ct = encrypt(&wrapping_key, &record_iv, &plaintext);
        let mut reversed = inner_ct.clone();
        reverse_first_32(&mut reversed);
        let outer_ct = encrypt(&wrapping_key, &MAGIC_CMS_IV, &reversed);

        let result = unwrap_symmetric_key(&wrapping_key, &record_iv, &outer_ct);
        assert_eq!(result.unwrap().as_slice(), &[0xAB; 24][..]);
    }

    #[test]
    fn private_key_unwrap_splits_name_and_material_with_no_leading_offset() {
        let wrapping_key = [4u8; 24];
        let record_iv = [6u8; 8];

        let mut plaintext = b"keyname-12ab".to_vec(); // exactly 12 bytes
        plaintext.extend_from_slice(&[0xCD; 16]);
        let inner_ct = encrypt(&wrapping_key, &record_iv, &plaintext);
        let mut reversed = inner_ct.clone();
        reverse_first_32(&mut reversed);
        let outer_ct = encrypt(&wrapping_key, &MAGIC_CMS_IV, &reversed);

        let (name, material) = unwrap_private_key(&wrapping_key, &record_iv, &outer_ct).unwrap();
        assert_eq!(name, b"keyname-12ab");
        assert_eq!(material.as_slice(), &[0xCD; 16][..]);
    }

    #[test]
    fn wrong_wrapping_key_yields_none() {
        let wrapping_key = [9u8; 24];
        let wrong_key = [1u8; 24];
        let record_iv = [5u8; 8];
        let ciphertext = encrypt(&wrapping_key, &MAGIC_CMS_IV, &[0u8; 32]);
        assert!(unwrap_symmetric_key(&wrong_key, &record_iv, &ciphertext).is_none());
    }
}
