use super::aabb_tree::NULL_NODE;
use super::DynamicAabbTree;
use crate::bounding_volume::BoundingVolume;
use crate::utils::HashSet;

impl<T> DynamicAabbTree<T> {
    /// Panics if the tree isn't well-formed.
    ///
    /// The tree is well-formed when parent/child handles are mutually
    /// consistent, no reachable node sits on the free list, every internal
    /// volume is exactly the union of its children's, heights are correct,
    /// and the reachable leaf count matches the recorded one.
    pub fn assert_well_formed(&self) {
        let free: HashSet<u32> = self.arena.free_slots().collect();

        if self.root == NULL_NODE {
            assert_eq!(self.leaf_count(), 0);
            return;
        }

        assert_eq!(self.arena[self.root].parent, NULL_NODE);
        let mut n_leaves = 0;
        self.assert_well_formed_recurse(self.root, &free, &mut n_leaves);
        assert_eq!(n_leaves, self.leaf_count());
    }

    fn assert_well_formed_recurse(&self, id: u32, free: &HashSet<u32>, n_leaves: &mut usize) {
        assert!(
            !free.contains(&id),
            "node {} is both reachable and on the free list",
            id
        );

        let node = &self.arena[id];
        if node.is_leaf() {
            assert_eq!(node.height, 0);
            assert!(node.payload().is_some(), "leaf {} has no payload", id);
            *n_leaves += 1;
            return;
        }

        assert!(node.payload().is_none());
        let [c0, c1] = node.children;
        let (left, right) = (&self.arena[c0], &self.arena[c1]);
        assert_eq!(left.parent, id);
        assert_eq!(right.parent, id);
        assert_eq!(node.height, 1 + left.height.max(right.height));
        assert_eq!(node.bv, left.bv.merged(&right.bv));

        self.assert_well_formed_recurse(c0, free, n_leaves);
        self.assert_well_formed_recurse(c1, free, n_leaves);
    }

    /// The number of slots currently on the free list.
    pub fn free_slot_count(&self) -> usize {
        self.arena.free_slots().count()
    }
}
