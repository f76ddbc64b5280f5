//! Axis-aligned bounding boxes
//!
//! Boxes are stored as a center plus non-negative half extents, the form
//! both the octree cells and the GJK support function work in.

use crate::foundation::math::{Transform, Vec3};

/// Axis-Aligned Bounding Box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Center of the box
    pub position: Vec3,
    /// Half size along each axis (all components >= 0)
    pub half_extent: Vec3,
}

impl BoundingBox {
    /// Create a box from its center and half extents
    ///
    /// Negative half extents are folded to their absolute value.
    pub fn new(position: Vec3, half_extent: Vec3) -> Self {
        Self {
            position,
            half_extent: half_extent.abs(),
        }
    }

    /// Create a cube with the same half extent on every axis
    pub fn cube(position: Vec3, half_extent: f32) -> Self {
        Self::new(position, Vec3::new(half_extent, half_extent, half_extent))
    }

    /// Create a box from its minimum and maximum corners
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self::new((min + max) * 0.5, (max - min) * 0.5)
    }

    /// Smallest box enclosing every point, `None` for an empty set
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Vec3>,
    {
        let mut points = points.into_iter();
        let first = *points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), point| {
            (min.inf(point), max.sup(point))
        });
        Some(Self::from_min_max(min, max))
    }

    /// Box of the given half extents placed by a transform
    ///
    /// Translation and scale are applied; rotation is ignored because the
    /// narrow phase only handles axis-aligned boxes.
    pub fn from_transform(half_extent: Vec3, transform: &Transform) -> Self {
        Self::new(transform.position, half_extent.component_mul(&transform.scale))
    }

    /// Minimum corner
    pub fn min(&self) -> Vec3 {
        self.position - self.half_extent
    }

    /// Maximum corner
    pub fn max(&self) -> Vec3 {
        self.position + self.half_extent
    }

    /// The eight corners; bit 0/1/2 of the index selects +X/+Y/+Z
    pub fn corners(&self) -> [Vec3; 8] {
        let mut corners = [Vec3::zeros(); 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            let sign = |bit: usize| if i & bit != 0 { 1.0 } else { -1.0 };
            *corner = self.position
                + Vec3::new(
                    self.half_extent.x * sign(1),
                    self.half_extent.y * sign(2),
                    self.half_extent.z * sign(4),
                );
        }
        corners
    }

    /// Check if this box contains a point (inclusive)
    pub fn contains_point(&self, point: &Vec3) -> bool {
        let min = self.min();
        let max = self.max();
        point.x >= min.x && point.x <= max.x &&
        point.y >= min.y && point.y <= max.y &&
        point.z >= min.z && point.z <= max.z
    }

    /// Smallest box enclosing both boxes
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        Self::from_min_max(self.min().inf(&other.min()), self.max().sup(&other.max()))
    }
}
