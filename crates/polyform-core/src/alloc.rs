//! Optimized collection types.
//!
//! The geometry algorithms key hash maps by small integer tuples (triangle
//! index triples, anchor positions). AHash is measurably faster than SipHash
//! for these keys, and none of the maps are exposed to untrusted input.

pub use ahash::{AHashMap as HashMap, AHashSet as HashSet, RandomState};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashmap_ahash() {
        let mut map = HashMap::new();
        map.insert([0u16, 1, 2], 7usize);
        assert_eq!(map.get(&[0u16, 1, 2]), Some(&7));
    }

    #[test]
    fn test_hashset_ahash() {
        let mut set = HashSet::new();
        set.insert(42usize);
        assert!(set.contains(&42));
        assert!(!set.contains(&43));
    }
}
