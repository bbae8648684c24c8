//! Traversals where the query side is a hierarchical occupancy grid.
//!
//! One side walks the binary AABB tree, the other descends the 8-ary grid by
//! octant subdivision. When the grid carries an identity rotation a faster
//! axis-aligned path only translates the grid bounds; otherwise volumes are
//! compared through oriented boxes.
//!
//! Cell interactions synthesize a temporary [`CollisionObject`] on the stack,
//! alive for the duration of the callback invocation only (and reclaimed
//! normally should the callback panic).

use super::object::{BoxGeometry, CollisionObject, Geometry};
use super::traversal::ObjectTree;
use crate::bounding_volume::{Aabb, BoundingVolume, Obb};
use crate::math::{Isometry, Real, Rotation, Translation, Vector};
use crate::octree::{Octree, OctreeNode};

#[inline]
fn rotation_is_identity(m: &Isometry<Real>) -> bool {
    abs_diff_eq!(m.rotation.angle(), 0.0)
}

// A collision object standing for one occupancy-grid cell.
fn cell_object(
    bv: &Aabb,
    tf: &Isometry<Real>,
    cost_density: Real,
    threshold_occupied: Real,
) -> CollisionObject {
    let mut geometry = BoxGeometry::new(bv.extents());
    geometry.cost_density = cost_density;
    geometry.threshold_occupied = threshold_occupied;
    CollisionObject::with_transform(
        Geometry::Box(geometry),
        tf * Translation::from(bv.center().coords),
    )
}

#[inline]
fn translation_isometry(v: &Vector<Real>) -> Isometry<Real> {
    Isometry::from_parts(Translation::from(*v), Rotation::identity())
}

/// Overlap walk of a binary tree against an occupancy grid.
///
/// A missing grid node (`None`) stands for unknown space and is reported with
/// the grid's default occupancy; free nodes prune the walk.
pub(super) fn octree_collision_recurse<F>(
    tree1: &ObjectTree,
    id1: u32,
    grid: &Octree,
    node2: Option<&OctreeNode>,
    bv2: &Aabb,
    tf2: &Isometry<Real>,
    callback: &mut F,
) -> bool
where
    F: FnMut(&CollisionObject, &CollisionObject) -> bool,
{
    if rotation_is_identity(tf2) {
        collision_translated(
            tree1,
            id1,
            grid,
            node2,
            bv2,
            &tf2.translation.vector,
            callback,
        )
    } else {
        collision_transformed(tree1, id1, grid, node2, bv2, tf2, callback)
    }
}

fn collision_translated<F>(
    tree1: &ObjectTree,
    id1: u32,
    grid: &Octree,
    node2: Option<&OctreeNode>,
    bv2: &Aabb,
    translation2: &Vector<Real>,
    callback: &mut F,
) -> bool
where
    F: FnMut(&CollisionObject, &CollisionObject) -> bool,
{
    let n1 = tree1.node(id1);

    let Some(node2) = node2 else {
        // Unknown space: report cells at the default occupancy.
        if n1.is_leaf() {
            let obj1 = tree1.leaf_payload(id1);
            if !obj1.geometry().is_free() && n1.bv.intersects(&bv2.translated(translation2)) {
                let cell = cell_object(
                    bv2,
                    &translation_isometry(translation2),
                    grid.default_occupancy,
                    grid.occupancy_threshold,
                );
                return callback(obj1, &cell);
            }
            return false;
        }

        let [c0, c1] = n1.children;
        return collision_translated(tree1, c0, grid, None, bv2, translation2, callback)
            || collision_translated(tree1, c1, grid, None, bv2, translation2, callback);
    };

    if n1.is_leaf() && !node2.has_children() {
        let obj1 = tree1.leaf_payload(id1);
        if !grid.is_node_free(node2)
            && !obj1.geometry().is_free()
            && n1.bv.intersects(&bv2.translated(translation2))
        {
            let cell = cell_object(
                bv2,
                &translation_isometry(translation2),
                node2.occupancy(),
                grid.occupancy_threshold,
            );
            return callback(obj1, &cell);
        }
        return false;
    }

    if grid.is_node_free(node2) || !n1.bv.intersects(&bv2.translated(translation2)) {
        return false;
    }

    if !node2.has_children() || (!n1.is_leaf() && n1.bv.size() > bv2.size()) {
        let [c0, c1] = n1.children;
        collision_translated(tree1, c0, grid, Some(node2), bv2, translation2, callback)
            || collision_translated(tree1, c1, grid, Some(node2), bv2, translation2, callback)
    } else {
        for i in 0..8 {
            let child_bv = Octree::child_bv(bv2, i);
            if collision_translated(
                tree1,
                id1,
                grid,
                node2.child(i),
                &child_bv,
                translation2,
                callback,
            ) {
                return true;
            }
        }
        false
    }
}

fn collision_transformed<F>(
    tree1: &ObjectTree,
    id1: u32,
    grid: &Octree,
    node2: Option<&OctreeNode>,
    bv2: &Aabb,
    tf2: &Isometry<Real>,
    callback: &mut F,
) -> bool
where
    F: FnMut(&CollisionObject, &CollisionObject) -> bool,
{
    let n1 = tree1.node(id1);

    let Some(node2) = node2 else {
        if n1.is_leaf() {
            let obj1 = tree1.leaf_payload(id1);
            if !obj1.geometry().is_free() {
                let obb1 = Obb::from_aabb(&n1.bv, &Isometry::identity());
                let obb2 = Obb::from_aabb(bv2, tf2);
                if obb1.overlap(&obb2) {
                    let cell =
                        cell_object(bv2, tf2, grid.default_occupancy, grid.occupancy_threshold);
                    return callback(obj1, &cell);
                }
            }
            return false;
        }

        let [c0, c1] = n1.children;
        return collision_transformed(tree1, c0, grid, None, bv2, tf2, callback)
            || collision_transformed(tree1, c1, grid, None, bv2, tf2, callback);
    };

    if n1.is_leaf() && !node2.has_children() {
        let obj1 = tree1.leaf_payload(id1);
        if !grid.is_node_free(node2) && !obj1.geometry().is_free() {
            let obb1 = Obb::from_aabb(&n1.bv, &Isometry::identity());
            let obb2 = Obb::from_aabb(bv2, tf2);
            if obb1.overlap(&obb2) {
                let cell = cell_object(bv2, tf2, node2.occupancy(), grid.occupancy_threshold);
                return callback(obj1, &cell);
            }
        }
        return false;
    }

    let obb1 = Obb::from_aabb(&n1.bv, &Isometry::identity());
    let obb2 = Obb::from_aabb(bv2, tf2);
    if grid.is_node_free(node2) || !obb1.overlap(&obb2) {
        return false;
    }

    if !node2.has_children() || (!n1.is_leaf() && n1.bv.size() > bv2.size()) {
        let [c0, c1] = n1.children;
        collision_transformed(tree1, c0, grid, Some(node2), bv2, tf2, callback)
            || collision_transformed(tree1, c1, grid, Some(node2), bv2, tf2, callback)
    } else {
        for i in 0..8 {
            let child_bv = Octree::child_bv(bv2, i);
            if collision_transformed(tree1, id1, grid, node2.child(i), &child_bv, tf2, callback) {
                return true;
            }
        }
        false
    }
}

/// Distance walk of a binary tree against an occupancy grid.
///
/// Only occupied grid nodes participate; unknown space is skipped.
pub(super) fn octree_distance_recurse<F>(
    tree1: &ObjectTree,
    id1: u32,
    grid: &Octree,
    node2: &OctreeNode,
    bv2: &Aabb,
    tf2: &Isometry<Real>,
    callback: &mut F,
    min_dist: &mut Real,
) -> bool
where
    F: FnMut(&CollisionObject, &CollisionObject, &mut Real) -> bool,
{
    if rotation_is_identity(tf2) {
        distance_translated(
            tree1,
            id1,
            grid,
            node2,
            bv2,
            &tf2.translation.vector,
            callback,
            min_dist,
        )
    } else {
        distance_transformed(tree1, id1, grid, node2, bv2, tf2, callback, min_dist)
    }
}

fn distance_translated<F>(
    tree1: &ObjectTree,
    id1: u32,
    grid: &Octree,
    node2: &OctreeNode,
    bv2: &Aabb,
    translation2: &Vector<Real>,
    callback: &mut F,
    min_dist: &mut Real,
) -> bool
where
    F: FnMut(&CollisionObject, &CollisionObject, &mut Real) -> bool,
{
    let n1 = tree1.node(id1);

    if n1.is_leaf() && !node2.has_children() {
        if grid.is_node_occupied(node2) {
            let cell = cell_object(bv2, &translation_isometry(translation2), 1.0, 1.0);
            return callback(tree1.leaf_payload(id1), &cell, min_dist);
        }
        return false;
    }

    if !grid.is_node_occupied(node2) {
        return false;
    }

    if !node2.has_children() || (!n1.is_leaf() && n1.bv.size() > bv2.size()) {
        let aabb2 = bv2.translated(translation2);
        let [c0, c1] = n1.children;
        let d0 = aabb2.distance(&tree1.node(c0).bv);
        let d1 = aabb2.distance(&tree1.node(c1).bv);

        if d1 < d0 {
            if d1 < *min_dist
                && distance_translated(tree1, c1, grid, node2, bv2, translation2, callback, min_dist)
            {
                return true;
            }
            if d0 < *min_dist
                && distance_translated(tree1, c0, grid, node2, bv2, translation2, callback, min_dist)
            {
                return true;
            }
        } else {
            if d0 < *min_dist
                && distance_translated(tree1, c0, grid, node2, bv2, translation2, callback, min_dist)
            {
                return true;
            }
            if d1 < *min_dist
                && distance_translated(tree1, c1, grid, node2, bv2, translation2, callback, min_dist)
            {
                return true;
            }
        }
    } else {
        for i in 0..8 {
            if let Some(child) = node2.child(i) {
                let child_bv = Octree::child_bv(bv2, i);
                let d = n1.bv.distance(&child_bv.translated(translation2));
                if d < *min_dist
                    && distance_translated(
                        tree1,
                        id1,
                        grid,
                        child,
                        &child_bv,
                        translation2,
                        callback,
                        min_dist,
                    )
                {
                    return true;
                }
            }
        }
    }

    false
}

fn distance_transformed<F>(
    tree1: &ObjectTree,
    id1: u32,
    grid: &Octree,
    node2: &OctreeNode,
    bv2: &Aabb,
    tf2: &Isometry<Real>,
    callback: &mut F,
    min_dist: &mut Real,
) -> bool
where
    F: FnMut(&CollisionObject, &CollisionObject, &mut Real) -> bool,
{
    let n1 = tree1.node(id1);

    if n1.is_leaf() && !node2.has_children() {
        if grid.is_node_occupied(node2) {
            let cell = cell_object(bv2, tf2, 1.0, 1.0);
            return callback(tree1.leaf_payload(id1), &cell, min_dist);
        }
        return false;
    }

    if !grid.is_node_occupied(node2) {
        return false;
    }

    if !node2.has_children() || (!n1.is_leaf() && n1.bv.size() > bv2.size()) {
        let aabb2 = bv2.transform_by(tf2);
        let [c0, c1] = n1.children;
        let d0 = aabb2.distance(&tree1.node(c0).bv);
        let d1 = aabb2.distance(&tree1.node(c1).bv);

        if d1 < d0 {
            if d1 < *min_dist
                && distance_transformed(tree1, c1, grid, node2, bv2, tf2, callback, min_dist)
            {
                return true;
            }
            if d0 < *min_dist
                && distance_transformed(tree1, c0, grid, node2, bv2, tf2, callback, min_dist)
            {
                return true;
            }
        } else {
            if d0 < *min_dist
                && distance_transformed(tree1, c0, grid, node2, bv2, tf2, callback, min_dist)
            {
                return true;
            }
            if d1 < *min_dist
                && distance_transformed(tree1, c1, grid, node2, bv2, tf2, callback, min_dist)
            {
                return true;
            }
        }
    } else {
        for i in 0..8 {
            if let Some(child) = node2.child(i) {
                let child_bv = Octree::child_bv(bv2, i);
                let d = n1.bv.distance(&child_bv.transform_by(tf2));
                if d < *min_dist
                    && distance_transformed(
                        tree1, id1, grid, child, &child_bv, tf2, callback, min_dist,
                    )
                {
                    return true;
                }
            }
        }
    }

    false
}
