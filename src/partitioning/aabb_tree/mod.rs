pub use self::aabb_tree::{DynamicAabbTree, Leaves, Node, NULL_NODE};

mod aabb_tree;
mod aabb_tree_balance;
mod aabb_tree_update;
mod aabb_tree_validation;
