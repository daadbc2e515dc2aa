//! Deterministic hashing for edge lookups and per-face debug colors.

use core::hash::{BuildHasher, Hash};
use foldhash::fast::{FixedState, FoldHasher};
use hashbrown::{HashMap, HashSet};

/// Fixed seed so that map iteration order and face colors are stable across runs.
const EDGE_HASH_STATE: FixedState = FixedState::with_seed(0x9e37_79b9_7f4a_7c15);

/// Hasher builder with a fixed, process-independent state.
#[derive(Copy, Clone, Default, Debug)]
pub struct FixedHasher;

impl BuildHasher for FixedHasher {
    type Hasher = FoldHasher<'static>;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        EDGE_HASH_STATE.build_hasher()
    }
}

/// A [`HashMap`] keyed with the [`FixedHasher`].
pub type FixedHashMap<K, V> = HashMap<K, V, FixedHasher>;

/// A [`HashSet`] keyed with the [`FixedHasher`].
pub type FixedHashSet<T> = HashSet<T, FixedHasher>;

/// Hashes a single value with the fixed state.
#[inline]
pub fn hash_one<T: Hash>(value: T) -> u64 {
    FixedHasher.hash_one(value)
}
