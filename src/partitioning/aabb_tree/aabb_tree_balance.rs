use super::aabb_tree::NULL_NODE;
use super::DynamicAabbTree;
use crate::bounding_volume::{Aabb, BoundingVolume};
use crate::math::Real;
use smallvec::SmallVec;

impl<T> DynamicAabbTree<T> {
    /// Performs at most `passes` local rotations, each found by walking from
    /// the root along a deterministic path.
    ///
    /// A rotation swaps a child with one of its nephews when this reduces the
    /// height imbalance. The leaf set is left unchanged. Cheap per call, but
    /// the tree quality drifts over long mutation sequences; see
    /// [`DynamicAabbTree::balance_topdown`] for the full rebuild.
    pub fn balance_incremental(&mut self, passes: u32) {
        if self.root == NULL_NODE {
            return;
        }

        for _ in 0..passes {
            let mut id = self.root;
            let mut bit = 0u32;
            while !self.arena[id].is_leaf() {
                let top = self.rotate_if_imbalanced(id);
                if top != id {
                    // One rotation per pass; ancestor metadata must follow.
                    let parent = self.arena[top].parent;
                    if parent != NULL_NODE {
                        self.refit_upward(parent);
                    }
                    break;
                }
                id = self.arena[id].children[((self.opath >> bit) & 1) as usize];
                bit = (bit + 1) & 31;
            }
            self.opath = self.opath.wrapping_add(1);
        }
    }

    /// Rebuilds the tree from its current leaf set.
    ///
    /// Partitions are split at each level on the axis of greatest centroid
    /// extent, at the centroid median ([`topdown_level`] 0) or the centroid
    /// mean (any other value); partitions no larger than
    /// [`topdown_balance_threshold`] are chained linearly. `O(n log n)`, and
    /// restores near-optimal quality after incremental drift.
    ///
    /// [`topdown_level`]: DynamicAabbTree::topdown_level
    /// [`topdown_balance_threshold`]: DynamicAabbTree::topdown_balance_threshold
    pub fn balance_topdown(&mut self) {
        if self.root == NULL_NODE {
            return;
        }

        let mut leaves = self.collect_leaves_and_free_internals();
        let level = self.topdown_level;
        let root = self.topdown(&mut leaves, level);
        self.root = root;
        self.arena[root].parent = NULL_NODE;
    }

    /// Bulk construction from a leaf set, on an empty tree.
    ///
    /// All leaves are allocated before any internal node, and their handles
    /// are returned in input order. `level` selects the split strategy like
    /// [`DynamicAabbTree::topdown_level`] does for rebuilds.
    pub fn init(&mut self, leaves: Vec<(Aabb, T)>, level: u32) -> Vec<u32> {
        debug_assert!(self.is_empty());

        self.arena.reserve(leaves.len() * 2);
        let mut handles = Vec::with_capacity(leaves.len());
        for (bv, data) in leaves {
            let id = self.arena.allocate();
            let node = &mut self.arena[id];
            node.bv = bv;
            node.data = Some(data);
            handles.push(id);
        }
        self.n_leaves = handles.len();

        if !handles.is_empty() {
            let mut order = handles.clone();
            let root = self.topdown(&mut order, level);
            self.root = root;
            self.arena[root].parent = NULL_NODE;
        }

        handles
    }

    // Gathers every leaf handle and frees every internal node, leaving the
    // tree temporarily rootless.
    fn collect_leaves_and_free_internals(&mut self) -> Vec<u32> {
        let mut leaves = Vec::with_capacity(self.n_leaves);
        let mut stack: SmallVec<[u32; 32]> = SmallVec::new();
        stack.push(self.root);

        while let Some(id) = stack.pop() {
            if self.arena[id].is_leaf() {
                leaves.push(id);
            } else {
                let [c0, c1] = self.arena[id].children;
                stack.push(c0);
                stack.push(c1);
                self.arena.free(id);
            }
        }

        self.root = NULL_NODE;
        leaves
    }

    // Builds a subtree over `leaves`, reordering the slice in place, and
    // returns its root handle.
    fn topdown(&mut self, leaves: &mut [u32], level: u32) -> u32 {
        let n = leaves.len();
        if n == 1 {
            return leaves[0];
        }
        if n <= self.topdown_balance_threshold {
            return self.build_chain(leaves);
        }

        // Axis of greatest centroid extent.
        let mut mins = self.arena[leaves[0]].bv.center();
        let mut maxs = mins;
        for &leaf in leaves.iter().skip(1) {
            let c = self.arena[leaf].bv.center();
            mins = mins.inf(&c);
            maxs = maxs.sup(&c);
        }
        let extents = maxs - mins;
        let mut axis = 0;
        if extents[1] > extents[axis] {
            axis = 1;
        }
        if extents[2] > extents[axis] {
            axis = 2;
        }

        let mid = if level == 0 {
            let mid = n / 2;
            let arena = &self.arena;
            let _ = leaves.select_nth_unstable_by(mid, |a, b| {
                arena[*a].bv.center()[axis].total_cmp(&arena[*b].bv.center()[axis])
            });
            mid
        } else {
            let mut sum: Real = 0.0;
            for &leaf in leaves.iter() {
                sum += self.arena[leaf].bv.center()[axis];
            }
            self.partition_below(leaves, axis, sum / n as Real)
        };

        let (lo, hi) = leaves.split_at_mut(mid);
        let left = self.topdown(lo, level);
        let right = self.topdown(hi, level);
        self.make_internal(left, right)
    }

    // Moves the leaves whose centroid lies below `threshold` on `axis` to the
    // front and returns the split index, forced inside `1..n` so both sides
    // stay populated.
    fn partition_below(&self, leaves: &mut [u32], axis: usize, threshold: Real) -> usize {
        let n = leaves.len();
        let mut i = 0;
        let mut j = n;
        while i < j {
            if self.arena[leaves[i]].bv.center()[axis] < threshold {
                i += 1;
            } else {
                j -= 1;
                leaves.swap(i, j);
            }
        }
        i.clamp(1, n - 1)
    }

    // Chains `leaves` into a linear subtree.
    fn build_chain(&mut self, leaves: &[u32]) -> u32 {
        let mut node = leaves[0];
        for &leaf in &leaves[1..] {
            node = self.make_internal(node, leaf);
        }
        node
    }

    // Allocates an internal node over two existing subtrees.
    fn make_internal(&mut self, left: u32, right: u32) -> u32 {
        let id = self.arena.allocate();
        let bv = self.arena[left].bv.merged(&self.arena[right].bv);
        let height = 1 + self.arena[left].height.max(self.arena[right].height);
        {
            let node = &mut self.arena[id];
            node.bv = bv;
            node.height = height;
            node.children = [left, right];
        }
        self.arena[left].parent = id;
        self.arena[right].parent = id;
        id
    }
}
