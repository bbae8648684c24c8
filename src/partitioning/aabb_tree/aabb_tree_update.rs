use super::aabb_tree::NULL_NODE;
use super::DynamicAabbTree;
use crate::bounding_volume::{Aabb, BoundingVolume};
use crate::math::Real;

impl<T> DynamicAabbTree<T> {
    /// Creates a leaf holding `(bv, data)` and inserts it under the current
    /// root, returning its handle.
    ///
    /// The insertion point is chosen by descending from the root toward the
    /// child whose union with `bv` has the smallest measure, ties breaking
    /// toward `children[0]`. Ancestor volumes and heights are refit on the
    /// way back up, applying local rotations where they reduce imbalance.
    pub fn insert(&mut self, bv: Aabb, data: T) -> u32 {
        let leaf = self.arena.allocate();
        {
            let node = &mut self.arena[leaf];
            node.bv = bv;
            node.data = Some(data);
        }
        self.insert_leaf(leaf);
        self.n_leaves += 1;
        leaf
    }

    /// Removes a leaf, returning its payload.
    ///
    /// Removing the last leaf empties the tree.
    pub fn remove(&mut self, leaf: u32) -> Option<T> {
        debug_assert!(self.arena[leaf].is_leaf());
        let data = self.arena[leaf].data.take();
        self.remove_leaf(leaf);
        self.arena.free(leaf);
        self.n_leaves -= 1;
        data
    }

    /// Refreshes the volume stored on a leaf.
    ///
    /// No-op when the stored volume already contains `bv`. Otherwise the leaf
    /// is removed and reinserted at its new best position. Returns whether
    /// the leaf moved.
    pub fn update(&mut self, leaf: u32, bv: Aabb) -> bool {
        self.update_loosened(leaf, bv, 0.0)
    }

    /// Same as [`DynamicAabbTree::update`], but fattens the reinserted volume
    /// by `margin` so that small motions do not force another reinsertion.
    pub fn update_loosened(&mut self, leaf: u32, bv: Aabb, margin: Real) -> bool {
        if self.arena[leaf].bv.contains(&bv) {
            return false;
        }

        self.remove_leaf(leaf);
        self.arena[leaf].bv = if margin > 0.0 { bv.loosened(margin) } else { bv };
        self.insert_leaf(leaf);
        true
    }

    /// Bottom-up recomputation of every internal volume from the current leaf
    /// volumes, preserving the topology.
    pub fn refit(&mut self) {
        if self.root != NULL_NODE {
            self.refit_recurse(self.root);
        }
    }

    fn refit_recurse(&mut self, id: u32) {
        if self.arena[id].is_leaf() {
            return;
        }
        let [c0, c1] = self.arena[id].children;
        self.refit_recurse(c0);
        self.refit_recurse(c1);
        let bv = self.arena[c0].bv.merged(&self.arena[c1].bv);
        self.arena[id].bv = bv;
    }

    // Attaches an initialized leaf node to the tree.
    pub(super) fn insert_leaf(&mut self, leaf: u32) {
        if self.root == NULL_NODE {
            self.root = leaf;
            self.arena[leaf].parent = NULL_NODE;
            return;
        }

        // Find the best sibling for the new leaf.
        let leaf_bv = self.arena[leaf].bv;
        let mut sibling = self.root;
        while !self.arena[sibling].is_leaf() {
            let [c0, c1] = self.arena[sibling].children;
            let cost0 = leaf_bv.merged(&self.arena[c0].bv).size();
            let cost1 = leaf_bv.merged(&self.arena[c1].bv).size();
            sibling = if cost1 < cost0 { c1 } else { c0 };
        }

        // Splice a new internal node in place of the sibling.
        let old_parent = self.arena[sibling].parent;
        let new_parent = self.arena.allocate();
        let sibling_bv = self.arena[sibling].bv;
        let sibling_height = self.arena[sibling].height;
        {
            let node = &mut self.arena[new_parent];
            node.parent = old_parent;
            node.bv = leaf_bv.merged(&sibling_bv);
            node.height = sibling_height + 1;
            node.children = [sibling, leaf];
        }
        self.arena[sibling].parent = new_parent;
        self.arena[leaf].parent = new_parent;

        if old_parent == NULL_NODE {
            self.root = new_parent;
        } else {
            let slot = (self.arena[old_parent].children[1] == sibling) as usize;
            self.arena[old_parent].children[slot] = new_parent;
        }

        // Walk back up, refitting and rotating.
        let mut id = old_parent;
        while id != NULL_NODE {
            let top = self.rotate_if_imbalanced(id);
            self.refresh_node(top);
            id = self.arena[top].parent;
        }
    }

    // Detaches a leaf node without freeing it.
    pub(super) fn remove_leaf(&mut self, leaf: u32) {
        if leaf == self.root {
            self.root = NULL_NODE;
            return;
        }

        let parent = self.arena[leaf].parent;
        let grandparent = self.arena[parent].parent;
        let [c0, c1] = self.arena[parent].children;
        let sibling = if c0 == leaf { c1 } else { c0 };

        if grandparent == NULL_NODE {
            self.root = sibling;
            self.arena[sibling].parent = NULL_NODE;
        } else {
            let slot = (self.arena[grandparent].children[1] == parent) as usize;
            self.arena[grandparent].children[slot] = sibling;
            self.arena[sibling].parent = grandparent;
            self.refit_upward(grandparent);
        }

        self.arena.free(parent);
    }

    // Recomputes volumes and heights from `id` up to the root.
    pub(super) fn refit_upward(&mut self, mut id: u32) {
        while id != NULL_NODE {
            self.refresh_node(id);
            id = self.arena[id].parent;
        }
    }

    // Recomputes the volume and height of a single internal node.
    pub(super) fn refresh_node(&mut self, id: u32) {
        let [c0, c1] = self.arena[id].children;
        let bv = self.arena[c0].bv.merged(&self.arena[c1].bv);
        let height = 1 + self.arena[c0].height.max(self.arena[c1].height);
        let node = &mut self.arena[id];
        node.bv = bv;
        node.height = height;
    }

    // Swaps a child of `id` with one of its nephews when this reduces the
    // height imbalance. Returns the handle now occupying `id`'s position.
    pub(super) fn rotate_if_imbalanced(&mut self, id: u32) -> u32 {
        let [b, c] = self.arena[id].children;
        let balance = self.arena[c].height as i64 - self.arena[b].height as i64;

        if balance > 1 {
            self.rotate_up(id, 1)
        } else if balance < -1 {
            self.rotate_up(id, 0)
        } else {
            id
        }
    }

    // Promotes the taller child `children[which]` into `id`'s position; `id`
    // keeps the promoted child's shorter grandchild as a replacement.
    fn rotate_up(&mut self, id: u32, which: usize) -> u32 {
        let promoted = self.arena[id].children[which];
        let [f, g] = self.arena[promoted].children;
        let parent = self.arena[id].parent;

        // The promoted child takes `id`'s place under its parent.
        self.arena[promoted].parent = parent;
        if parent == NULL_NODE {
            self.root = promoted;
        } else {
            let slot = (self.arena[parent].children[1] == id) as usize;
            self.arena[parent].children[slot] = promoted;
        }

        // The taller grandchild stays under the promoted child; the shorter
        // one replaces it under `id`.
        let (kept, moved) = if self.arena[f].height >= self.arena[g].height {
            (f, g)
        } else {
            (g, f)
        };

        self.arena[promoted].children = if which == 1 { [id, kept] } else { [kept, id] };
        self.arena[id].parent = promoted;
        self.arena[id].children[which] = moved;
        self.arena[moved].parent = id;

        self.refresh_node(id);
        self.refresh_node(promoted);

        promoted
    }
}
