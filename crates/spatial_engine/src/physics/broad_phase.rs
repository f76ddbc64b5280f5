//! Box-box broad phase
//!
//! Cheap interval-overlap test used to prune tree traversal before the
//! narrow phase runs.

use crate::geometry::BoundingBox;

/// True when the boxes overlap on all three axes (touching counts)
pub fn box_box(a: &BoundingBox, b: &BoundingBox) -> bool {
    let (a_min, a_max) = (a.min(), a.max());
    let (b_min, b_max) = (b.min(), b.max());

    a_min.x <= b_max.x && a_max.x >= b_min.x &&
    a_min.y <= b_max.y && a_max.y >= b_min.y &&
    a_min.z <= b_max.z && a_max.z >= b_min.z
}
