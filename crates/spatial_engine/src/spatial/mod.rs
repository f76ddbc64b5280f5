//! Spatial partitioning data structures
//!
//! Octree and BSP builders over static, world-space scene geometry. Both
//! store what they cannot usefully split any further as [`PartitionObject`]s.

pub mod bsp;
pub mod object;
pub mod octree;
pub mod stats;


pub use bsp::{BspNode, BspNodeKey, BspTree};
pub use object::PartitionObject;
pub use octree::{Octant, Octree, OctreeNode};
pub use stats::TreeStats;
