/*!
dbvt3d
======

**dbvt3d** is a dynamic bounding-volume-tree broad phase for 3-dimensional
collision pipelines, written with the rust programming language.

It maintains a self-balancing binary tree of axis-aligned bounding boxes over
a mutable set of collision objects and answers three kinds of queries:
pairwise overlap enumeration, nearest-pair distance, and single-object
overlap/distance against the whole set. Occupancy grids (octrees) are
supported as query geometry through dedicated traversals.

Narrow-phase geometry is out of scope: traversals report candidate pairs to
caller-supplied callbacks and never compute exact contacts.

*/

#![deny(non_camel_case_types)]
#![deny(unused_parens)]
#![deny(non_upper_case_globals)]
#![deny(unused_results)]
#![warn(missing_docs)]
#![warn(unused_imports)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::module_inception)]
#![allow(clippy::manual_range_contains)]

#[macro_use]
extern crate approx;
extern crate num_traits as num;

pub extern crate nalgebra as na;

pub mod bounding_volume;
pub mod broadphase;
pub mod math;
pub mod octree;
pub mod partitioning;
pub mod utils;
