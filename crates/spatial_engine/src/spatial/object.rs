//! Leaf payloads stored in partition trees

use std::sync::atomic::{AtomicBool, Ordering};

use crate::foundation::math::Vec3;
use crate::geometry::{BoundingBox, Fragment};

/// A geometry fragment stored on a tree node
///
/// The bounding box is computed once when the object is created and is
/// what the collision query tests against. The colliding flag is written
/// by queries through a shared reference; concurrent queries do not race
/// in the memory-safety sense, but the last writer wins.
#[derive(Debug)]
pub struct PartitionObject {
    fragment: Fragment,
    bounds: BoundingBox,
    colliding: AtomicBool,
}

impl PartitionObject {
    /// Wrap a fragment, caching its bounds
    ///
    /// A fragment with no triangles gets a zero-size box at the origin.
    pub fn new(fragment: Fragment) -> Self {
        let bounds = fragment
            .bounds()
            .unwrap_or_else(|| BoundingBox::cube(Vec3::zeros(), 0.0));
        Self {
            fragment,
            bounds,
            colliding: AtomicBool::new(false),
        }
    }

    /// Stored geometry
    pub fn fragment(&self) -> &Fragment {
        &self.fragment
    }

    /// Cached bounding box
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// Number of stored triangles
    pub fn triangle_count(&self) -> usize {
        self.fragment.triangle_count()
    }

    /// Whether the most recent query touching this object hit it
    pub fn is_colliding(&self) -> bool {
        self.colliding.load(Ordering::Relaxed)
    }

    pub(crate) fn mark_colliding(&self) {
        self.colliding.store(true, Ordering::Relaxed);
    }

    pub(crate) fn clear_colliding(&self) {
        self.colliding.store(false, Ordering::Relaxed);
    }
}
