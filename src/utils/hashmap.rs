//! Hash-map alias with a fast, fixed-seed hasher.
//!
//! The fixed seed makes iteration order deterministic for a given key set,
//! which keeps the (otherwise unspecified) callback order reproducible
//! within a process.

pub use hashbrown::hash_map::Entry;

/// Hashmap using [`hashbrown::HashMap`].
pub type HashMap<K, V> = hashbrown::HashMap<K, V, foldhash::fast::FixedState>;
