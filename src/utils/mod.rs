//! Miscellaneous support utilities.

pub mod hashmap;
pub mod hashset;

pub use hashmap::HashMap;
pub use hashset::HashSet;
