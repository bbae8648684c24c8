//! Axis Aligned Bounding Box.

use crate::bounding_volume::BoundingVolume;
use crate::math::{Isometry, Point, Real, Vector, DIM};
use num::Bounded;

/// An Axis Aligned Bounding Box.
#[derive(Debug, PartialEq, Copy, Clone)]
pub struct Aabb {
    /// The point with the smallest coordinates contained by the box.
    pub mins: Point<Real>,
    /// The point with the greatest coordinates contained by the box.
    pub maxs: Point<Real>,
}

impl Aabb {
    /// Creates a new Aabb.
    ///
    /// # Arguments:
    ///   * `mins` - position of the point with the smallest coordinates.
    ///   * `maxs` - position of the point with the highest coordinates. Each component of `mins`
    ///     must be smaller than the related components of `maxs`.
    #[inline]
    pub fn new(mins: Point<Real>, maxs: Point<Real>) -> Aabb {
        Aabb { mins, maxs }
    }

    /// Creates an invalid Aabb with `mins` components set to `Real::max_value` and `maxs`
    /// components set to `-Real::max_value`.
    ///
    /// This is often used as the initial value of some merging algorithms.
    #[inline]
    pub fn new_invalid() -> Self {
        Self::new(
            Vector::repeat(Real::max_value()).into(),
            Vector::repeat(-Real::max_value()).into(),
        )
    }

    /// Creates a new Aabb from its center and its half-extents.
    #[inline]
    pub fn from_half_extents(center: Point<Real>, half_extents: Vector<Real>) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// The center of this Aabb.
    #[inline]
    pub fn center(&self) -> Point<Real> {
        na::center(&self.mins, &self.maxs)
    }

    /// The half extents of this Aabb.
    #[inline]
    pub fn half_extents(&self) -> Vector<Real> {
        (self.maxs - self.mins) * 0.5
    }

    /// The extents of this Aabb.
    #[inline]
    pub fn extents(&self) -> Vector<Real> {
        self.maxs - self.mins
    }

    /// The volume of this Aabb.
    #[inline]
    pub fn volume(&self) -> Real {
        let extents = self.extents();
        extents.x * extents.y * extents.z
    }

    /// The squared norm of this Aabb's diagonal.
    ///
    /// A monotone proxy of the volume: cheaper than the exact volume and
    /// sufficient for comparing candidate volumes during tree descents. Every
    /// descent heuristic in this crate uses this measure consistently.
    #[inline]
    pub fn size(&self) -> Real {
        self.extents().norm_squared()
    }

    /// The smallest distance between a point of `self` and a point of `other`.
    ///
    /// Returns 0 when the boxes overlap.
    pub fn distance(&self, other: &Aabb) -> Real {
        let mut dist2: Real = 0.0;
        for i in 0..DIM {
            let gap = (self.mins[i] - other.maxs[i])
                .max(other.mins[i] - self.maxs[i])
                .max(0.0);
            dist2 += gap * gap;
        }
        dist2.sqrt()
    }

    /// This Aabb translated by `v`.
    #[inline]
    pub fn translated(&self, v: &Vector<Real>) -> Self {
        Aabb::new(self.mins + v, self.maxs + v)
    }

    /// Computes the Aabb bounding `self` transformed by `m`.
    #[inline]
    pub fn transform_by(&self, m: &Isometry<Real>) -> Self {
        let center = m * self.center();
        let abs_rot = m.rotation.to_rotation_matrix().into_inner().abs();
        let ws_half_extents = abs_rot * self.half_extents();
        Aabb::from_half_extents(center, ws_half_extents)
    }
}

impl BoundingVolume for Aabb {
    #[inline]
    fn center(&self) -> Point<Real> {
        self.center()
    }

    #[inline]
    fn intersects(&self, other: &Aabb) -> bool {
        for i in 0..DIM {
            if self.mins[i] > other.maxs[i] || other.mins[i] > self.maxs[i] {
                return false;
            }
        }
        true
    }

    #[inline]
    fn contains(&self, other: &Aabb) -> bool {
        for i in 0..DIM {
            if self.mins[i] > other.mins[i] || self.maxs[i] < other.maxs[i] {
                return false;
            }
        }
        true
    }

    #[inline]
    fn merge(&mut self, other: &Aabb) {
        *self = self.merged(other);
    }

    #[inline]
    fn merged(&self, other: &Aabb) -> Aabb {
        Aabb {
            mins: self.mins.inf(&other.mins),
            maxs: self.maxs.sup(&other.maxs),
        }
    }

    #[inline]
    fn loosen(&mut self, amount: Real) {
        *self = self.loosened(amount);
    }

    #[inline]
    fn loosened(&self, amount: Real) -> Aabb {
        assert!(amount >= 0.0, "The loosening margin must be positive.");
        Aabb {
            mins: self.mins - Vector::repeat(amount),
            maxs: self.maxs + Vector::repeat(amount),
        }
    }

    #[inline]
    fn tighten(&mut self, amount: Real) {
        *self = self.tightened(amount);
    }

    #[inline]
    fn tightened(&self, amount: Real) -> Aabb {
        assert!(amount >= 0.0, "The tightening margin must be positive.");
        Aabb::new(
            self.mins + Vector::repeat(amount),
            self.maxs - Vector::repeat(amount),
        )
    }
}
