//! Column-pointer attribute resolvers.
//!
//! Every password/certificate/key header stores its variable-length
//! attributes (names, accounts, timestamps...) as `u32` column pointers
//! rather than inline data. A pointer is relative to the record's own base
//! address; its low bit is a CSSM "is this attribute present" flag and must
//! be masked off before the pointer is followed. A zero pointer, or any
//! pointer that resolves out of bounds, means the attribute is simply
//! absent — not a parse error.

use chainbreak_types::{FourCharCode, KeychainTimestamp};

use crate::byte_reader::ByteReader;

/// Masks off the CSSM presence-flag bit, producing a plain byte offset.
pub fn mask_pointer(raw: u32) -> u32 {
    raw & 0xFFFF_FFFE
}

fn round_up_to_4(len: u32) -> u32 {
    (len + 3) & !3
}

/// Resolves a big-endian `u32` attribute.
pub fn resolve_int(reader: &ByteReader<'_>, base_addr: usize, pcol: u32) -> Option<u32> {
    if pcol == 0 {
        return None;
    }
    reader.u32_be(base_addr + pcol as usize).ok()
}

/// Resolves a four-character-code attribute (e.g. `ptcl`, `atyp`).
pub fn resolve_four_char_code(
    reader: &ByteReader<'_>,
    base_addr: usize,
    pcol: u32,
) -> Option<FourCharCode> {
    if pcol == 0 {
        return None;
    }
    reader
        .four_char_code(base_addr + pcol as usize)
        .ok()
        .map(FourCharCode::new)
}

/// Resolves a 16-byte keychain timestamp attribute.
pub fn resolve_timestamp(
    reader: &ByteReader<'_>,
    base_addr: usize,
    pcol: u32,
) -> Option<KeychainTimestamp> {
    if pcol == 0 {
        return None;
    }
    let bytes = reader.slice(base_addr + pcol as usize, 16).ok()?;
    Some(KeychainTimestamp::from_raw(bytes))
}

/// Resolves a length-prefixed variable-length blob (a CSSM "LV": a 4-byte
/// big-endian declared length, followed by that many bytes rounded up to a
/// 4-byte boundary). The returned value is truncated to the declared
/// length, not the padded length.
pub fn resolve_lv(reader: &ByteReader<'_>, base_addr: usize, pcol: u32) -> Option<Vec<u8>> {
    if pcol == 0 {
        return None;
    }
    let offset = base_addr + pcol as usize;
    let length = reader.u32_be(offset).ok()?;
    let padded = round_up_to_4(length) as usize;
    let data = reader.slice(offset + 4, padded).ok()?;
    Some(data[..length as usize].to_vec())
}

/// Resolves an LV attribute as a lossily-decoded string (the format
/// predates consistent UTF-8 use; most text here is Latin-1 or ASCII).
pub fn resolve_lv_string(reader: &ByteReader<'_>, base_addr: usize, pcol: u32) -> Option<String> {
    resolve_lv(reader, base_addr, pcol).map(|bytes| {
        bytes
            .iter()
            .map(|&b| b as char)
            .collect::<String>()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn mask_pointer_clears_low_bit() {
        assert_eq!(mask_pointer(0x21), 0x20);
        assert_eq!(mask_pointer(0x20), 0x20);
    }

    proptest! {
        /// The low bit of a column pointer is an unspecified presence flag;
        /// a pointer and its low-bit-set twin must resolve identically.
        #[test]
        fn mask_pointer_ignores_low_bit(raw in any::<u32>()) {
            prop_assert_eq!(mask_pointer(raw), mask_pointer(raw | 1));
        }

        /// `LV(data)` round-trips: decoding yields exactly `data` back, with
        /// no padding bytes leaking into the value.
        #[test]
        fn resolve_lv_round_trips_arbitrary_data(data in proptest::collection::vec(any::<u8>(), 0..64)) {
            let mut buf = (data.len() as u32).to_be_bytes().to_vec();
            buf.extend_from_slice(&data);
            let padded_len = round_up_to_4(data.len() as u32) as usize;
            buf.resize(4 + padded_len, 0);

            let reader = ByteReader::new(&buf);
            let decoded = resolve_lv(&reader, 0, 0).unwrap();
            prop_assert_eq!(decoded, data);
        }
    }

    #[test]
    fn resolve_int_is_none_for_zero_pointer() {
        let reader = ByteReader::new(&[0u8; 8]);
        assert!(resolve_int(&reader, 0, 0).is_none());
    }

    #[test]
    fn resolve_lv_truncates_to_declared_length() {
        let mut buf = 3u32.to_be_bytes().to_vec();
        buf.extend_from_slice(b"abc\0");
        let reader = ByteReader::new(&buf);
        let value = resolve_lv(&reader, 0, 0).unwrap();
        assert_eq!(value, b"abc");
    }

    #[test]
    fn resolve_lv_string_decodes_latin1_bytes() {
        let mut buf = 1u32.to_be_bytes().to_vec();
        buf.extend_from_slice(&[0xE9, 0, 0, 0]);
        let reader = ByteReader::new(&buf);
        let value = resolve_lv_string(&reader, 0, 0).unwrap();
        assert_eq!(value.chars().next().unwrap(), '\u{E9}');
    }

    #[test]
    fn resolve_timestamp_reads_sixteen_bytes() {
        let mut buf = vec![0u8; 4];
        buf.extend_from_slice(b"20230101120000Z ");
        let reader = ByteReader::new(&buf);
        let ts = resolve_timestamp(&reader, 0, 4).unwrap();
        assert_eq!(ts.as_str(), "20230101120000Z ");
    }
}
