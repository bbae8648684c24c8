//! Spatial partitioning tools.

pub use self::aabb_tree::{DynamicAabbTree, Leaves, Node, NULL_NODE};

mod aabb_tree;
