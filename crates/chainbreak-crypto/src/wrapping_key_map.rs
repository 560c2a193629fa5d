//! Maps an SSGP container's `(magic ∥ label)` lookup key to the per-item
//! wrapping key recovered for it while walking the symmetric-key table.

use std::collections::HashMap;

use zeroize::Zeroizing;

/// `(magic[4] ∥ label[20])` — the 24-byte key SSGP containers and symmetric
/// key records are matched on.
pub type SsgpKey = [u8; 24];

/// Write-once, read-only-after-unlock map from SSGP key to recovered
/// wrapping key. Built once while walking the symmetric-key table during
/// unlock; consulted once per password-bearing record thereafter.
#[derive(Default)]
pub struct WrappingKeyMap {
    keys: HashMap<SsgpKey, Zeroizing<[u8; 24]>>,
}

impl WrappingKeyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ssgp_key: SsgpKey, wrapping_key: [u8; 24]) {
        self.keys.insert(ssgp_key, Zeroizing::new(wrapping_key));
    }

    pub fn get(&self, ssgp_key: &SsgpKey) -> Option<&[u8; 24]> {
        self.keys.get(ssgp_key).map(|k| &**k)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_get_round_trips() {
        let mut map = WrappingKeyMap::new();
        let ssgp_key = [1u8; 24];
        let wrapping_key = [2u8; 24];
        map.insert(ssgp_key, wrapping_key);
        assert_eq!(map.get(&ssgp_key), Some(&wrapping_key));
    }

    #[test]
    fn missing_key_returns_none() {
        let map = WrappingKeyMap::new();
        assert!(map.get(&[0u8; 24]).is_none());
    }

    #[test]
    fn empty_map_reports_empty() {
        let map = WrappingKeyMap::new();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
    }
}
