//! Benchmark workloads for the Skein container library.
//!
//! - [`scrambled_keys`]: deterministic, collision-free key order from a seed
//! - [`filled_list`]: a list holding `0..n`
//! - [`filled_sorted`]: a sorted list holding `n` scrambled keys

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use skein_core::ContainerError;
use skein_list::List;
use skein_sorted::SortedList;

/// Generate `n` distinct keys in `0..n`, in a seed-dependent order.
///
/// Each key is hashed from its index and the seed, then linear-probed
/// past keys already taken.
pub fn scrambled_keys(n: usize, seed: u64) -> Vec<u64> {
    if n == 0 {
        return Vec::new();
    }
    let mut taken = vec![false; n];
    let mut keys = Vec::with_capacity(n);
    for i in 0..n as u64 {
        let mut key = (seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(i.wrapping_mul(1442695040888963407))
            >> 17) as usize
            % n;
        while taken[key] {
            key = (key + 1) % n;
        }
        taken[key] = true;
        keys.push(key as u64);
    }
    keys
}

/// A list holding `0..n`, sized exactly.
pub fn filled_list(n: u64) -> Result<List<u64>, ContainerError> {
    List::from_iter_in(0..n, skein_core::Global)
}

/// A sorted list holding `n` scrambled keys, each mapped to its square.
pub fn filled_sorted(n: usize, seed: u64) -> Result<SortedList<u64, u64>, ContainerError> {
    let sorted = SortedList::with_capacity(n)?;
    for key in scrambled_keys(n, seed) {
        sorted.add(key, key * key)?;
    }
    Ok(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrambled_keys_are_a_permutation() {
        let mut keys = scrambled_keys(500, 42);
        assert_eq!(keys.len(), 500);
        keys.sort_unstable();
        assert!(keys.iter().enumerate().all(|(i, &k)| k == i as u64));
    }

    #[test]
    fn scrambled_keys_deterministic() {
        assert_eq!(scrambled_keys(64, 7), scrambled_keys(64, 7));
        assert!(scrambled_keys(0, 7).is_empty());
    }

    #[test]
    fn workloads_build() {
        assert_eq!(filled_list(100).unwrap().len(), 100);
        let sorted = filled_sorted(100, 1).unwrap();
        assert_eq!(sorted.len(), 100);
        assert_eq!(sorted.at(&9).unwrap(), 81);
    }
}
