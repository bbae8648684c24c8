//! Linear algebra type aliases.

/// The scalar type used throughout this crate.
#[cfg(feature = "f32")]
pub type Real = f32;

/// The scalar type used throughout this crate.
#[cfg(not(feature = "f32"))]
pub type Real = f64;

/// The dimension of the ambient space.
pub const DIM: usize = 3;

/// The point type.
pub type Point<N> = na::Point3<N>;

/// The vector type.
pub type Vector<N> = na::Vector3<N>;

/// The transformation type: a rotation followed by a translation.
pub type Isometry<N> = na::Isometry3<N>;

/// The rotation type.
pub type Rotation<N> = na::UnitQuaternion<N>;

/// The translation type.
pub type Translation<N> = na::Translation3<N>;

/// The square matrix type.
pub type Matrix<N> = na::Matrix3<N>;
