//! Collision objects tracked by the broad phase.

use crate::bounding_volume::Aabb;
use crate::math::{Isometry, Point, Real, Translation, Vector};
use crate::octree::Octree;
use std::cell::Cell;
use std::rc::Rc;

/// The geometry attached to a [`CollisionObject`].
///
/// The broad phase never inspects exact shapes: it only needs local-space
/// bounds, the free-space classification, and, for occupancy grids, access to
/// the grid structure. Narrow-phase refinement happens in the caller's
/// callbacks.
#[derive(Clone, Debug)]
pub enum Geometry {
    /// A solid box given by its full extents.
    Box(BoxGeometry),
    /// A hierarchical occupancy grid.
    Octree(Rc<Octree>),
}

impl Geometry {
    /// The axis-aligned bounds of the geometry in its local frame.
    pub fn local_aabb(&self) -> Aabb {
        match self {
            Geometry::Box(b) => Aabb::from_half_extents(Point::origin(), b.extents * 0.5),
            Geometry::Octree(grid) => grid.root_bv(),
        }
    }

    /// Is this geometry classified as free space?
    ///
    /// Free geometry never produces overlap candidates against occupancy
    /// grids.
    pub fn is_free(&self) -> bool {
        match self {
            Geometry::Box(b) => b.cost_density <= b.threshold_free,
            Geometry::Octree(_) => false,
        }
    }
}

/// A box shape.
///
/// Grid traversals also synthesize these on the fly for occupied cells, in
/// which case the occupancy fields carry the cell's sample and the grid's
/// threshold.
#[derive(Clone, Debug)]
pub struct BoxGeometry {
    /// Full extents along each local axis.
    pub extents: Vector<Real>,
    /// Collision cost density of the space covered by the shape.
    pub cost_density: Real,
    /// Occupancy at or above which the shape counts as occupied.
    pub threshold_occupied: Real,
    /// Occupancy at or below which the shape counts as free.
    pub threshold_free: Real,
}

impl BoxGeometry {
    /// A box with the given full extents and default cost values.
    pub fn new(extents: Vector<Real>) -> Self {
        BoxGeometry {
            extents,
            cost_density: 1.0,
            threshold_occupied: 1.0,
            threshold_free: 0.0,
        }
    }

    /// A cube with the given side length.
    pub fn cube(side: Real) -> Self {
        Self::new(Vector::repeat(side))
    }
}

/// A collision object: a geometry with a pose.
///
/// The pose is interior-mutable so that callers sharing the object with one
/// or more managers (through `Rc`) can move it between broad-phase updates.
/// The world-space bounds are recomputed from the geometry and the current
/// pose on demand.
#[derive(Debug)]
pub struct CollisionObject {
    geometry: Geometry,
    transform: Cell<Isometry<Real>>,
}

impl CollisionObject {
    /// An object at the identity pose.
    pub fn new(geometry: Geometry) -> Self {
        Self::with_transform(geometry, Isometry::identity())
    }

    /// An object at the given pose.
    pub fn with_transform(geometry: Geometry, transform: Isometry<Real>) -> Self {
        CollisionObject {
            geometry,
            transform: Cell::new(transform),
        }
    }

    /// The geometry attached to this object.
    #[inline]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// The current pose.
    #[inline]
    pub fn transform(&self) -> Isometry<Real> {
        self.transform.get()
    }

    /// Replaces the pose.
    #[inline]
    pub fn set_transform(&self, transform: Isometry<Real>) {
        self.transform.set(transform);
    }

    /// Replaces the translational part of the pose.
    #[inline]
    pub fn set_translation(&self, translation: Vector<Real>) {
        let mut m = self.transform.get();
        m.translation = Translation::from(translation);
        self.transform.set(m);
    }

    /// The current world-space bounds.
    #[inline]
    pub fn aabb(&self) -> Aabb {
        self.geometry.local_aabb().transform_by(&self.transform.get())
    }
}
