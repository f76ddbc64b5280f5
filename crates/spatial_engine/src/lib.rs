//! # Spatial Engine
//!
//! Static scene partitioning and collision queries.
//!
//! ## Features
//!
//! - **Geometry clipping**: Split indexed triangle soups against planes
//! - **Octree**: Recursive octant subdivision driven by triangle counts
//! - **BSP**: Randomized splitting-plane selection per fragment
//! - **Collision queries**: Box-box broad phase and GJK narrow phase
//! - **Debug views**: Cell and object snapshots for an external renderer
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spatial_engine::prelude::*;
//!
//! let config = PartitionConfig::default();
//! let scene = vec![Fragment::cuboid(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0))];
//! let octree = Octree::create(Vec3::zeros(), 10.0, 6, scene, &config);
//!
//! let query = BoundingBox::cube(Vec3::new(0.5, 0.0, 0.0), 0.25);
//! assert!(octree.collision_test(&query));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::cast_precision_loss)]

pub mod config;
pub mod debug;
pub mod foundation;
pub mod geometry;
pub mod physics;
pub mod spatial;

/// Common imports for library users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, PartitionConfig},
        debug::{CellView, ObjectView, PartitionDebugVisualizer},
        foundation::math::{Transform, Vec3},
        geometry::{clip, BoundingBox, Fragment, GeometryError, Plane},
        physics::{box_box, gjk_intersect, PartitionTree},
        spatial::{BspTree, Octree, PartitionObject, TreeStats},
    };
}
