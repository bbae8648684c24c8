//! Hierarchical occupancy grid.
//!
//! An 8-ary tree over a cubic region whose nodes carry an occupancy
//! probability. The broad-phase traversals only need the structure and the
//! occupancy classification; mapping sensor data into the grid is the
//! caller's concern.

use crate::bounding_volume::Aabb;
use crate::math::Real;

/// A node of an [`Octree`]: an occupancy sample plus up to eight children.
///
/// A missing child stands for unknown space; the traversals substitute the
/// grid's default occupancy there.
#[derive(Clone, Debug)]
pub struct OctreeNode {
    occupancy: Real,
    children: Option<Box<[Option<OctreeNode>; 8]>>,
}

impl OctreeNode {
    /// A childless node with the given occupancy probability.
    pub fn leaf(occupancy: Real) -> Self {
        OctreeNode {
            occupancy,
            children: None,
        }
    }

    /// An interior node. Children are indexed by octant: bit 0 selects the
    /// upper x half, bit 1 the upper y half, bit 2 the upper z half.
    pub fn with_children(occupancy: Real, children: [Option<OctreeNode>; 8]) -> Self {
        OctreeNode {
            occupancy,
            children: Some(Box::new(children)),
        }
    }

    /// The occupancy probability sampled at this node.
    #[inline]
    pub fn occupancy(&self) -> Real {
        self.occupancy
    }

    /// Does this node carry any children?
    #[inline]
    pub fn has_children(&self) -> bool {
        self.children.is_some()
    }

    /// The child in the `i`-th octant, if present.
    #[inline]
    pub fn child(&self, i: usize) -> Option<&OctreeNode> {
        self.children.as_ref().and_then(|c| c[i].as_ref())
    }
}

/// An 8-ary occupancy tree used as query geometry by the broad phase.
#[derive(Clone, Debug)]
pub struct Octree {
    root: Option<OctreeNode>,
    root_bv: Aabb,
    /// Occupancy probability at or above which a node counts as occupied.
    pub occupancy_threshold: Real,
    /// Occupancy probability at or below which a node counts as free.
    pub free_threshold: Real,
    /// Occupancy assumed for unknown space (missing children).
    pub default_occupancy: Real,
}

impl Octree {
    /// An empty grid covering `root_bv`.
    pub fn new(root_bv: Aabb) -> Self {
        Octree {
            root: None,
            root_bv,
            occupancy_threshold: 0.5,
            free_threshold: 0.0,
            default_occupancy: 0.5,
        }
    }

    /// A grid covering `root_bv` with the given root node.
    pub fn with_root(root_bv: Aabb, root: OctreeNode) -> Self {
        let mut result = Self::new(root_bv);
        result.root = Some(root);
        result
    }

    /// The root node, if any.
    #[inline]
    pub fn root(&self) -> Option<&OctreeNode> {
        self.root.as_ref()
    }

    /// The region covered by the grid.
    #[inline]
    pub fn root_bv(&self) -> Aabb {
        self.root_bv
    }

    /// Is this node classified as occupied?
    #[inline]
    pub fn is_node_occupied(&self, node: &OctreeNode) -> bool {
        node.occupancy() >= self.occupancy_threshold
    }

    /// Is this node classified as free?
    #[inline]
    pub fn is_node_free(&self, node: &OctreeNode) -> bool {
        node.occupancy() <= self.free_threshold
    }

    /// The bounds of the `i`-th octant of `bv`.
    pub fn child_bv(bv: &Aabb, i: usize) -> Aabb {
        let center = bv.center();
        let mut mins = bv.mins;
        let mut maxs = center;
        for axis in 0..3 {
            if (i & (1 << axis)) != 0 {
                mins[axis] = center[axis];
                maxs[axis] = bv.maxs[axis];
            } else {
                mins[axis] = bv.mins[axis];
                maxs[axis] = center[axis];
            }
        }
        Aabb::new(mins, maxs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounding_volume::BoundingVolume;
    use crate::math::Point;

    #[test]
    fn octants_tile_the_parent() {
        let bv = Aabb::new(Point::new(-2.0, -4.0, 0.0), Point::new(2.0, 0.0, 8.0));
        let mut merged = Octree::child_bv(&bv, 0);
        let mut volume = 0.0;
        for i in 0..8 {
            let child = Octree::child_bv(&bv, i);
            assert!(bv.contains(&child));
            volume += child.volume();
            merged.merge(&child);
        }
        assert_relative_eq!(volume, bv.volume());
        assert_eq!(merged, bv);
    }

    #[test]
    fn octant_indexing_is_bit_per_axis() {
        let bv = Aabb::new(Point::new(0.0, 0.0, 0.0), Point::new(2.0, 2.0, 2.0));
        let child = Octree::child_bv(&bv, 0b101);
        assert_eq!(child.mins, Point::new(1.0, 0.0, 1.0));
        assert_eq!(child.maxs, Point::new(2.0, 1.0, 2.0));
    }

    #[test]
    fn occupancy_classification() {
        let tree = Octree::new(Aabb::new(Point::origin(), Point::new(1.0, 1.0, 1.0)));
        assert!(tree.is_node_occupied(&OctreeNode::leaf(0.9)));
        assert!(!tree.is_node_occupied(&OctreeNode::leaf(0.2)));
        assert!(tree.is_node_free(&OctreeNode::leaf(0.0)));
        assert!(!tree.is_node_free(&OctreeNode::leaf(0.2)));
    }
}
