//! Deterministic hashing helpers for per-call randomness.
//!
//! Bandit ranking must stay `&self` (it is called concurrently across the
//! session fan-out), so any randomness is derived statelessly: hash the
//! candidate list together with the policy seed and feed the result into a
//! seeded RNG. This module intentionally does **not** provide cryptographic
//! guarantees; it exists for repeatable pseudo-random ordering.

use crate::ItemId;

/// Deterministic (non-crypto) stable hash over a candidate item list.
///
/// Implementation:
/// - FNV-1a over the little-endian item bytes (cheap, stable across platforms)
/// - SplitMix64 finalizer (improves bit diffusion / uniformity)
#[must_use]
pub fn stable_hash_items(seed: u64, items: &[ItemId]) -> u64 {
    let mut h: u64 = 14695981039346656037u64;
    for item in items {
        for b in item.to_le_bytes() {
            h ^= b as u64;
            h = h.wrapping_mul(1099511628211u64);
        }
    }
    splitmix64(seed ^ h)
}

#[inline]
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_input_same_hash() {
        let items = [3u64, 1, 2];
        assert_eq!(stable_hash_items(7, &items), stable_hash_items(7, &items));
    }

    #[test]
    fn seed_and_order_change_the_hash() {
        let items = [3u64, 1, 2];
        let reordered = [1u64, 2, 3];
        assert_ne!(stable_hash_items(7, &items), stable_hash_items(8, &items));
        assert_ne!(
            stable_hash_items(7, &items),
            stable_hash_items(7, &reordered)
        );
    }
}
