use super::object::{CollisionObject, Geometry};
use super::{octree_traversal, traversal};
use crate::math::Real;
use crate::partitioning::DynamicAabbTree;
use crate::utils::HashMap;
use std::rc::Rc;
use tracing::debug;

/// A broad-phase collision manager backed by a dynamic AABB tree.
///
/// Objects are registered as shared handles; between queries, callers move
/// them through [`CollisionObject::set_transform`] and propagate the new
/// poses with one of the `update` methods. Queries report candidate pairs to
/// a callback; returning `true` from the callback stops the traversal.
///
/// The order in which pairs are presented is unspecified and may change
/// across `update` calls — callers needing a canonical order must sort on
/// their side. A manager is single-threaded: queries take `&self` and
/// mutations `&mut self`, so a callback can never mutate the tree it is
/// traversing.
pub struct DynamicAabbTreeManager {
    tree: DynamicAabbTree<Rc<CollisionObject>>,
    table: HashMap<*const CollisionObject, u32>,
    setup_done: bool,
    /// Imbalance threshold `height - log2(n)` above which [`setup`] runs a
    /// full top-down rebuild instead of incremental rotations.
    ///
    /// [`setup`]: DynamicAabbTreeManager::setup
    pub max_tree_nonbalanced_level: u32,
    /// Number of local rotations attempted per incremental rebalance.
    pub tree_incremental_balance_pass: u32,
    /// Leaf-count threshold at which top-down rebuilds chain leaves linearly.
    pub tree_topdown_balance_threshold: usize,
    /// Split-strategy selector for top-down rebuilds (0 = centroid median,
    /// otherwise centroid mean).
    pub tree_topdown_level: u32,
    /// Split-strategy selector for bulk construction, same encoding as
    /// [`DynamicAabbTreeManager::tree_topdown_level`].
    pub tree_init_level: u32,
    /// Treat occupancy-grid queries as an opaque AABB leaf in
    /// [`DynamicAabbTreeManager::collide_object`].
    pub octree_as_geometry_collide: bool,
    /// Same as [`DynamicAabbTreeManager::octree_as_geometry_collide`], for
    /// [`DynamicAabbTreeManager::distance_object`].
    pub octree_as_geometry_distance: bool,
}

impl Default for DynamicAabbTreeManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicAabbTreeManager {
    /// An empty manager with default tunables.
    pub fn new() -> Self {
        DynamicAabbTreeManager {
            tree: DynamicAabbTree::new(),
            table: HashMap::default(),
            setup_done: false,
            max_tree_nonbalanced_level: 10,
            tree_incremental_balance_pass: 10,
            tree_topdown_balance_threshold: 2,
            tree_topdown_level: 0,
            tree_init_level: 0,
            // From experiment, treating grids as plain geometry is the better
            // default for overlap queries but not for distance queries.
            octree_as_geometry_collide: true,
            octree_as_geometry_distance: false,
        }
    }

    /// The number of registered objects.
    pub fn len(&self) -> usize {
        self.tree.leaf_count()
    }

    /// Is any object registered?
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Read access to the underlying tree.
    pub fn tree(&self) -> &DynamicAabbTree<Rc<CollisionObject>> {
        &self.tree
    }

    /// Registers a batch of objects.
    ///
    /// When the manager is still empty, the tree is bulk-constructed top-down
    /// from the whole batch at [`DynamicAabbTreeManager::tree_init_level`],
    /// which produces a better tree than repeated insertion. Otherwise this
    /// falls back to registering the objects one by one.
    pub fn register_objects(&mut self, objects: &[Rc<CollisionObject>]) {
        if objects.is_empty() {
            return;
        }

        if self.len() > 0 {
            for obj in objects {
                self.register_object(obj);
            }
        } else {
            self.sync_tree_tunables();
            let leaves = objects.iter().map(|o| (o.aabb(), o.clone())).collect();
            let handles = self.tree.init(leaves, self.tree_init_level);
            self.table.reserve(objects.len());
            for (obj, handle) in objects.iter().zip(handles) {
                let _ = self.table.insert(Rc::as_ptr(obj), handle);
            }
            debug!(objects = objects.len(), "bulk-built broad-phase tree");
            self.setup_done = true;
        }
    }

    /// Registers one object with its current bounds.
    pub fn register_object(&mut self, obj: &Rc<CollisionObject>) {
        debug_assert!(
            !self.table.contains_key(&Rc::as_ptr(obj)),
            "object registered twice"
        );
        let node = self.tree.insert(obj.aabb(), obj.clone());
        let _ = self.table.insert(Rc::as_ptr(obj), node);
        self.setup_done = false;
    }

    /// Unregisters an object. Unknown objects are ignored.
    pub fn unregister_object(&mut self, obj: &Rc<CollisionObject>) {
        if let Some(node) = self.table.remove(&Rc::as_ptr(obj)) {
            let _ = self.tree.remove(node);
        }
    }

    /// Rebalances the tree if it isn't already set up.
    ///
    /// Incremental rotations while the height stays within
    /// [`DynamicAabbTreeManager::max_tree_nonbalanced_level`] of the optimum,
    /// a full top-down rebuild once the drift exceeds it.
    pub fn setup(&mut self) {
        if self.setup_done {
            return;
        }

        let num = self.len();
        if num == 0 {
            self.setup_done = true;
            return;
        }

        self.sync_tree_tunables();
        let height = self.tree.max_height();

        if (height as Real) - (num as Real).log2() < self.max_tree_nonbalanced_level as Real {
            self.tree
                .balance_incremental(self.tree_incremental_balance_pass);
        } else {
            debug!(leaves = num, height, "top-down broad-phase rebuild");
            self.tree.balance_topdown();
        }

        self.setup_done = true;
    }

    /// Propagates every object's current bounds into the tree, refits, and
    /// rebalances.
    pub fn update(&mut self) {
        for &node in self.table.values() {
            let aabb = self.tree.leaf_payload(node).aabb();
            self.tree.set_leaf_bv(node, aabb);
        }
        self.tree.refit();
        self.setup_done = false;
        self.setup();
    }

    /// Propagates one object's bounds, then rebalances.
    pub fn update_object(&mut self, obj: &Rc<CollisionObject>) {
        self.update_single(obj);
        self.setup();
    }

    /// Propagates a batch of objects' bounds, rebalancing only once.
    pub fn update_objects(&mut self, objects: &[Rc<CollisionObject>]) {
        for obj in objects {
            self.update_single(obj);
        }
        self.setup();
    }

    // Unknown objects are ignored.
    fn update_single(&mut self, obj: &Rc<CollisionObject>) {
        if let Some(&node) = self.table.get(&Rc::as_ptr(obj)) {
            let aabb = obj.aabb();
            if self.tree.node(node).bv != aabb {
                let _ = self.tree.update(node, aabb);
            }
        }
        self.setup_done = false;
    }

    /// Unregisters every object.
    pub fn clear(&mut self) {
        self.tree.clear();
        self.table.clear();
        self.setup_done = false;
    }

    /// The registered objects, in unspecified order.
    pub fn objects(&self) -> Vec<Rc<CollisionObject>> {
        self.table
            .values()
            .map(|&node| self.tree.leaf_payload(node).clone())
            .collect()
    }

    /// Tests one query object against every registered object.
    ///
    /// When the query geometry is an occupancy grid and
    /// [`DynamicAabbTreeManager::octree_as_geometry_collide`] is `false`, the
    /// grid structure itself is traversed and the callback receives
    /// synthesized per-cell box objects; otherwise the grid is treated as one
    /// opaque AABB leaf.
    pub fn collide_object<F>(&self, obj: &CollisionObject, mut callback: F)
    where
        F: FnMut(&CollisionObject, &CollisionObject) -> bool,
    {
        if self.is_empty() {
            return;
        }

        match obj.geometry() {
            Geometry::Octree(grid) if !self.octree_as_geometry_collide => {
                let _ = octree_traversal::octree_collision_recurse(
                    &self.tree,
                    self.tree.root(),
                    grid,
                    grid.root(),
                    &grid.root_bv(),
                    &obj.transform(),
                    &mut callback,
                );
            }
            _ => {
                let query_aabb = obj.aabb();
                let _ = traversal::collision_query_recurse(
                    &self.tree,
                    self.tree.root(),
                    obj,
                    &query_aabb,
                    &mut callback,
                );
            }
        }
    }

    /// Distance analogue of [`DynamicAabbTreeManager::collide_object`], gated
    /// by [`DynamicAabbTreeManager::octree_as_geometry_distance`].
    pub fn distance_object<F>(&self, obj: &CollisionObject, mut callback: F)
    where
        F: FnMut(&CollisionObject, &CollisionObject, &mut Real) -> bool,
    {
        if self.is_empty() {
            return;
        }

        let mut min_dist = Real::MAX;
        match obj.geometry() {
            Geometry::Octree(grid) if !self.octree_as_geometry_distance => {
                if let Some(root) = grid.root() {
                    let _ = octree_traversal::octree_distance_recurse(
                        &self.tree,
                        self.tree.root(),
                        grid,
                        root,
                        &grid.root_bv(),
                        &obj.transform(),
                        &mut callback,
                        &mut min_dist,
                    );
                }
            }
            _ => {
                let query_aabb = obj.aabb();
                let _ = traversal::distance_query_recurse(
                    &self.tree,
                    self.tree.root(),
                    obj,
                    &query_aabb,
                    &mut callback,
                    &mut min_dist,
                );
            }
        }
    }

    /// Enumerates candidate overlap pairs among the registered objects.
    pub fn collide<F>(&self, mut callback: F)
    where
        F: FnMut(&CollisionObject, &CollisionObject) -> bool,
    {
        if self.is_empty() {
            return;
        }
        let _ = traversal::self_collision_recurse(&self.tree, self.tree.root(), &mut callback);
    }

    /// Runs a distance walk among the registered objects.
    ///
    /// The callback may shrink the running `min_dist` bound to tighten the
    /// pruning.
    pub fn distance<F>(&self, mut callback: F)
    where
        F: FnMut(&CollisionObject, &CollisionObject, &mut Real) -> bool,
    {
        if self.is_empty() {
            return;
        }
        let mut min_dist = Real::MAX;
        let _ = traversal::self_distance_recurse(
            &self.tree,
            self.tree.root(),
            &mut callback,
            &mut min_dist,
        );
    }

    /// Enumerates candidate overlap pairs across two managers.
    pub fn collide_manager<F>(&self, other: &DynamicAabbTreeManager, mut callback: F)
    where
        F: FnMut(&CollisionObject, &CollisionObject) -> bool,
    {
        if self.is_empty() || other.is_empty() {
            return;
        }
        let _ = traversal::collision_recurse(
            &self.tree,
            self.tree.root(),
            &other.tree,
            other.tree.root(),
            &mut callback,
        );
    }

    /// Distance analogue of [`DynamicAabbTreeManager::collide_manager`].
    pub fn distance_manager<F>(&self, other: &DynamicAabbTreeManager, mut callback: F)
    where
        F: FnMut(&CollisionObject, &CollisionObject, &mut Real) -> bool,
    {
        if self.is_empty() || other.is_empty() {
            return;
        }
        let mut min_dist = Real::MAX;
        let _ = traversal::distance_recurse(
            &self.tree,
            self.tree.root(),
            &other.tree,
            other.tree.root(),
            &mut callback,
            &mut min_dist,
        );
    }

    fn sync_tree_tunables(&mut self) {
        self.tree.topdown_balance_threshold = self.tree_topdown_balance_threshold;
        self.tree.topdown_level = self.tree_topdown_level;
    }
}
