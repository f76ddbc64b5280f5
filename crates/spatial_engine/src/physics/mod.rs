//! Collision detection against partition trees
//!
//! A cheap box-box broad phase prunes tree traversal; a GJK narrow phase
//! decides the final answer against stored object bounds.

pub mod broad_phase;
pub mod collision_query;
pub mod gjk;

pub use broad_phase::box_box;
pub use collision_query::PartitionTree;
pub use gjk::{gjk_intersect, support, Evolution, Simplex};
