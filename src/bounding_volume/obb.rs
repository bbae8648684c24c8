//! Oriented bounding box.

use crate::bounding_volume::Aabb;
use crate::math::{Isometry, Matrix, Point, Real, Vector};

/// An oriented bounding box.
///
/// Used by the occupancy-grid traversals when the grid carries a non-identity
/// rotation: an axis-aligned volume transformed by an isometry is represented
/// exactly instead of being re-wrapped in a looser Aabb.
#[derive(Debug, Copy, Clone)]
pub struct Obb {
    /// The center of the box.
    pub center: Point<Real>,
    /// The orientation of the box: columns are its local axes.
    pub axes: Matrix<Real>,
    /// The half-lengths of the box along each of its local axes.
    pub half_extents: Vector<Real>,
}

impl Obb {
    /// The oriented box obtained by transforming `aabb` by `m`.
    pub fn from_aabb(aabb: &Aabb, m: &Isometry<Real>) -> Self {
        Obb {
            center: m * aabb.center(),
            axes: m.rotation.to_rotation_matrix().into_inner(),
            half_extents: aabb.half_extents(),
        }
    }

    /// Separating-axis overlap test between two oriented boxes.
    ///
    /// Tests the 6 face normals and the 9 edge cross-products. The small
    /// epsilon added to the absolute rotation terms guards against missed
    /// separations when two edges are near parallel.
    pub fn overlap(&self, other: &Obb) -> bool {
        let eps: Real = 1.0e-6;

        // Rotation from `other`'s frame to `self`'s frame, and the center
        // offset expressed in `self`'s frame.
        let rot = self.axes.transpose() * other.axes;
        let t = self.axes.transpose() * (other.center - self.center);
        let abs_rot = rot.abs().add_scalar(eps);

        let a = &self.half_extents;
        let b = &other.half_extents;

        // Face normals of `self`.
        for i in 0..3 {
            let ra = a[i];
            let rb = b[0] * abs_rot[(i, 0)] + b[1] * abs_rot[(i, 1)] + b[2] * abs_rot[(i, 2)];
            if t[i].abs() > ra + rb {
                return false;
            }
        }

        // Face normals of `other`.
        for j in 0..3 {
            let ra = a[0] * abs_rot[(0, j)] + a[1] * abs_rot[(1, j)] + a[2] * abs_rot[(2, j)];
            let rb = b[j];
            let dist = t[0] * rot[(0, j)] + t[1] * rot[(1, j)] + t[2] * rot[(2, j)];
            if dist.abs() > ra + rb {
                return false;
            }
        }

        // Edge cross-products.
        for i in 0..3 {
            let i1 = (i + 1) % 3;
            let i2 = (i + 2) % 3;
            for j in 0..3 {
                let j1 = (j + 1) % 3;
                let j2 = (j + 2) % 3;
                let ra = a[i1] * abs_rot[(i2, j)] + a[i2] * abs_rot[(i1, j)];
                let rb = b[j1] * abs_rot[(i, j2)] + b[j2] * abs_rot[(i, j1)];
                let dist = t[i2] * rot[(i1, j)] - t[i1] * rot[(i2, j)];
                if dist.abs() > ra + rb {
                    return false;
                }
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounding_volume::BoundingVolume;
    use crate::math::{Point, Rotation, Translation, Vector};

    fn unit_box_at(x: Real, y: Real, z: Real) -> Aabb {
        Aabb::from_half_extents(Point::new(x, y, z), Vector::repeat(0.5))
    }

    #[test]
    fn axis_aligned_obbs_match_aabbs() {
        let id = Isometry::identity();
        let boxes = [
            unit_box_at(0.0, 0.0, 0.0),
            unit_box_at(0.9, 0.0, 0.0),
            unit_box_at(1.1, 0.0, 0.0),
            unit_box_at(0.5, 0.5, 0.5),
            unit_box_at(-2.0, 0.3, 0.0),
        ];

        for a in &boxes {
            for b in &boxes {
                let obb_a = Obb::from_aabb(a, &id);
                let obb_b = Obb::from_aabb(b, &id);
                assert_eq!(a.intersects(b), obb_a.overlap(&obb_b));
            }
        }
    }

    #[test]
    fn rotated_obb_overlap() {
        let a = Obb::from_aabb(&unit_box_at(0.0, 0.0, 0.0), &Isometry::identity());
        let rot = Isometry::from_parts(
            Translation::new(1.1, 0.0, 0.0),
            Rotation::from_axis_angle(&Vector::z_axis(), std::f64::consts::FRAC_PI_4 as Real),
        );
        let b = Obb::from_aabb(&unit_box_at(0.0, 0.0, 0.0), &rot);
        // Half-diagonal of the rotated box reaches ~0.707 toward `a`.
        assert!(a.overlap(&b));

        let far = Isometry::from_parts(
            Translation::new(2.6, 0.0, 0.0),
            Rotation::from_axis_angle(&Vector::z_axis(), std::f64::consts::FRAC_PI_4 as Real),
        );
        let c = Obb::from_aabb(&unit_box_at(0.0, 0.0, 0.0), &far);
        assert!(!a.overlap(&c));
    }
}
