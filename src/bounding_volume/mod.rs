//! Bounding volumes.

#[doc(inline)]
pub use self::aabb::Aabb;
#[doc(inline)]
pub use self::bounding_volume::BoundingVolume;
#[doc(inline)]
pub use self::obb::Obb;

#[doc(hidden)]
pub mod aabb;
#[doc(hidden)]
pub mod bounding_volume;
#[doc(hidden)]
pub mod obb;
