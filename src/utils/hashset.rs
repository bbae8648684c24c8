//! Hash-set alias matching [`crate::utils::hashmap`].

/// Hashset using [`hashbrown::HashSet`].
pub type HashSet<K> = hashbrown::HashSet<K, foldhash::fast::FixedState>;
