//! Tree traversals backing the broad-phase queries.
//!
//! All walks are double recursions with pruning. They never mutate the tree;
//! a callback returning `true` terminates the walk immediately.

use super::object::CollisionObject;
use crate::bounding_volume::{Aabb, BoundingVolume};
use crate::math::Real;
use crate::partitioning::DynamicAabbTree;
use std::rc::Rc;

pub(super) type ObjectTree = DynamicAabbTree<Rc<CollisionObject>>;

/// Overlap walk between two subtrees.
///
/// The descent side is the node with the larger volume measure, so the larger
/// region is subdivided first.
pub(super) fn collision_recurse<F>(
    tree1: &ObjectTree,
    id1: u32,
    tree2: &ObjectTree,
    id2: u32,
    callback: &mut F,
) -> bool
where
    F: FnMut(&CollisionObject, &CollisionObject) -> bool,
{
    let n1 = tree1.node(id1);
    let n2 = tree2.node(id2);

    if n1.is_leaf() && n2.is_leaf() {
        if !n1.bv.intersects(&n2.bv) {
            return false;
        }
        return callback(tree1.leaf_payload(id1), tree2.leaf_payload(id2));
    }

    if !n1.bv.intersects(&n2.bv) {
        return false;
    }

    if n2.is_leaf() || (!n1.is_leaf() && n1.bv.size() > n2.bv.size()) {
        let [c0, c1] = n1.children;
        collision_recurse(tree1, c0, tree2, id2, callback)
            || collision_recurse(tree1, c1, tree2, id2, callback)
    } else {
        let [c0, c1] = n2.children;
        collision_recurse(tree1, id1, tree2, c0, callback)
            || collision_recurse(tree1, id1, tree2, c1, callback)
    }
}

/// Overlap walk within a single subtree: each half alone, then across.
pub(super) fn self_collision_recurse<F>(tree: &ObjectTree, id: u32, callback: &mut F) -> bool
where
    F: FnMut(&CollisionObject, &CollisionObject) -> bool,
{
    let node = tree.node(id);
    if node.is_leaf() {
        return false;
    }

    let [c0, c1] = node.children;
    self_collision_recurse(tree, c0, callback)
        || self_collision_recurse(tree, c1, callback)
        || collision_recurse(tree, c0, tree, c1, callback)
}

/// Distance walk between two subtrees.
///
/// The children of the descent side are visited nearer-first; the farther
/// child is visited only while its volume distance still undercuts
/// `min_dist`. This best-first order is correct because the volume distance
/// lower-bounds every leaf distance underneath.
pub(super) fn distance_recurse<F>(
    tree1: &ObjectTree,
    id1: u32,
    tree2: &ObjectTree,
    id2: u32,
    callback: &mut F,
    min_dist: &mut Real,
) -> bool
where
    F: FnMut(&CollisionObject, &CollisionObject, &mut Real) -> bool,
{
    let n1 = tree1.node(id1);
    let n2 = tree2.node(id2);

    if n1.is_leaf() && n2.is_leaf() {
        return callback(
            tree1.leaf_payload(id1),
            tree2.leaf_payload(id2),
            min_dist,
        );
    }

    if n2.is_leaf() || (!n1.is_leaf() && n1.bv.size() > n2.bv.size()) {
        let [c0, c1] = n1.children;
        let d0 = n2.bv.distance(&tree1.node(c0).bv);
        let d1 = n2.bv.distance(&tree1.node(c1).bv);

        if d1 < d0 {
            if d1 < *min_dist && distance_recurse(tree1, c1, tree2, id2, callback, min_dist) {
                return true;
            }
            if d0 < *min_dist && distance_recurse(tree1, c0, tree2, id2, callback, min_dist) {
                return true;
            }
        } else {
            if d0 < *min_dist && distance_recurse(tree1, c0, tree2, id2, callback, min_dist) {
                return true;
            }
            if d1 < *min_dist && distance_recurse(tree1, c1, tree2, id2, callback, min_dist) {
                return true;
            }
        }
    } else {
        let [c0, c1] = n2.children;
        let d0 = n1.bv.distance(&tree2.node(c0).bv);
        let d1 = n1.bv.distance(&tree2.node(c1).bv);

        if d1 < d0 {
            if d1 < *min_dist && distance_recurse(tree1, id1, tree2, c1, callback, min_dist) {
                return true;
            }
            if d0 < *min_dist && distance_recurse(tree1, id1, tree2, c0, callback, min_dist) {
                return true;
            }
        } else {
            if d0 < *min_dist && distance_recurse(tree1, id1, tree2, c0, callback, min_dist) {
                return true;
            }
            if d1 < *min_dist && distance_recurse(tree1, id1, tree2, c1, callback, min_dist) {
                return true;
            }
        }
    }

    false
}

/// Distance walk within a single subtree.
pub(super) fn self_distance_recurse<F>(
    tree: &ObjectTree,
    id: u32,
    callback: &mut F,
    min_dist: &mut Real,
) -> bool
where
    F: FnMut(&CollisionObject, &CollisionObject, &mut Real) -> bool,
{
    let node = tree.node(id);
    if node.is_leaf() {
        return false;
    }

    let [c0, c1] = node.children;
    self_distance_recurse(tree, c0, callback, min_dist)
        || self_distance_recurse(tree, c1, callback, min_dist)
        || distance_recurse(tree, c0, tree, c1, callback, min_dist)
}

/// Overlap walk of one subtree against a single query object.
pub(super) fn collision_query_recurse<F>(
    tree: &ObjectTree,
    id: u32,
    query: &CollisionObject,
    query_aabb: &Aabb,
    callback: &mut F,
) -> bool
where
    F: FnMut(&CollisionObject, &CollisionObject) -> bool,
{
    let node = tree.node(id);

    if node.is_leaf() {
        if !node.bv.intersects(query_aabb) {
            return false;
        }
        return callback(tree.leaf_payload(id), query);
    }

    if !node.bv.intersects(query_aabb) {
        return false;
    }

    let [c0, c1] = node.children;
    let first = select_child(query_aabb, &tree.node(c0).bv, &tree.node(c1).bv);
    let (near, far) = if first == 0 { (c0, c1) } else { (c1, c0) };

    collision_query_recurse(tree, near, query, query_aabb, callback)
        || collision_query_recurse(tree, far, query, query_aabb, callback)
}

// Picks the child whose volume the query is likelier to intersect first.
// Only the visit order depends on this; correctness does not.
fn select_child(query: &Aabb, bv0: &Aabb, bv1: &Aabb) -> usize {
    let center = query.center();
    let d0 = (bv0.center() - center).norm_squared();
    let d1 = (bv1.center() - center).norm_squared();
    (d1 < d0) as usize
}

/// Distance walk of one subtree against a single query object.
pub(super) fn distance_query_recurse<F>(
    tree: &ObjectTree,
    id: u32,
    query: &CollisionObject,
    query_aabb: &Aabb,
    callback: &mut F,
    min_dist: &mut Real,
) -> bool
where
    F: FnMut(&CollisionObject, &CollisionObject, &mut Real) -> bool,
{
    let node = tree.node(id);

    if node.is_leaf() {
        return callback(tree.leaf_payload(id), query, min_dist);
    }

    let [c0, c1] = node.children;
    let d0 = query_aabb.distance(&tree.node(c0).bv);
    let d1 = query_aabb.distance(&tree.node(c1).bv);

    if d1 < d0 {
        if d1 < *min_dist && distance_query_recurse(tree, c1, query, query_aabb, callback, min_dist)
        {
            return true;
        }
        if d0 < *min_dist && distance_query_recurse(tree, c0, query, query_aabb, callback, min_dist)
        {
            return true;
        }
    } else {
        if d0 < *min_dist && distance_query_recurse(tree, c0, query, query_aabb, callback, min_dist)
        {
            return true;
        }
        if d1 < *min_dist && distance_query_recurse(tree, c1, query, query_aabb, callback, min_dist)
        {
            return true;
        }
    }

    false
}
