//! Indexed triangle soups
//!
//! A [`Fragment`] is a piece of world-space scene geometry: a vertex buffer
//! and an index buffer whose consecutive triples form triangles. Fragments
//! are what the octree and BSP builders clip and hand down the tree.

use super::{BoundingBox, GeometryError};
use crate::foundation::math::{Point3, Transform, Vec3};

/// Indexed triangle soup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    vertices: Vec<Vec3>,
    indices: Vec<u32>,
}

impl Fragment {
    /// Create a fragment from caller-supplied buffers
    ///
    /// Validates that the indices form whole triangles, stay in range, and
    /// that every vertex is finite.
    pub fn new(vertices: Vec<Vec3>, indices: Vec<u32>) -> Result<Self, GeometryError> {
        if indices.len() % 3 != 0 {
            return Err(GeometryError::IndexCountNotTriangles { count: indices.len() });
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(GeometryError::IndexOutOfRange {
                index,
                vertex_count: vertices.len(),
            });
        }
        if let Some(index) = vertices
            .iter()
            .position(|v| !(v.x.is_finite() && v.y.is_finite() && v.z.is_finite()))
        {
            return Err(GeometryError::NonFiniteVertex { index });
        }

        Ok(Self { vertices, indices })
    }

    /// Assemble a fragment from buffers the crate built itself
    pub(crate) fn from_parts(vertices: Vec<Vec3>, indices: Vec<u32>) -> Self {
        assert!(
            indices.len() % 3 == 0,
            "fragment index count {} is not a multiple of 3",
            indices.len()
        );
        debug_assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
        Self { vertices, indices }
    }

    /// Axis-aligned box mesh: 8 vertices, 12 triangles, outward winding
    pub fn cuboid(center: Vec3, half_extent: Vec3) -> Self {
        let corners = BoundingBox::new(center, half_extent).corners();
        // Corner index bits: 1 = +X, 2 = +Y, 4 = +Z
        #[rustfmt::skip]
        let indices = vec![
            0, 2, 3, 0, 3, 1, // -Z
            4, 5, 7, 4, 7, 6, // +Z
            0, 4, 6, 0, 6, 2, // -X
            1, 3, 7, 1, 7, 5, // +X
            0, 1, 5, 0, 5, 4, // -Y
            2, 6, 7, 2, 7, 3, // +Y
        ];
        Self::from_parts(corners.to_vec(), indices)
    }

    /// Vertex positions
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Triangle indices
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// True when the fragment holds no triangles
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate over triangles as vertex triples
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |tri| {
            [
                self.vertices[tri[0] as usize],
                self.vertices[tri[1] as usize],
                self.vertices[tri[2] as usize],
            ]
        })
    }

    /// Vertices in triangle order, repeated once per reference
    ///
    /// Unreferenced vertices are skipped, so classification and bounds only
    /// ever see geometry that is actually drawn.
    pub fn triangle_vertices(&self) -> impl Iterator<Item = &Vec3> + '_ {
        self.indices.iter().map(move |&i| &self.vertices[i as usize])
    }

    /// Bounding box of the vertices referenced by triangles
    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.triangle_vertices())
    }

    /// Append another fragment's triangles, rebasing its indices
    pub fn append(&mut self, other: &Fragment) {
        assert!(
            self.vertices.len() + other.vertices.len() <= u32::MAX as usize,
            "fragment vertex count exceeds the u32 index range"
        );
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|&i| i + base));
    }

    /// Concatenate several fragments into one
    pub fn merge<'a, I>(fragments: I) -> Fragment
    where
        I: IntoIterator<Item = &'a Fragment>,
    {
        let mut merged = Fragment::default();
        for fragment in fragments {
            merged.append(fragment);
        }
        merged
    }

    /// Copy of this fragment with every vertex moved by `transform`
    pub fn transformed(&self, transform: &Transform) -> Fragment {
        let matrix = transform.to_matrix();
        let vertices = self
            .vertices
            .iter()
            .map(|v| matrix.transform_point(&Point3::from(*v)).coords)
            .collect();
        Self::from_parts(vertices, self.indices.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn single_triangle() -> Fragment {
        Fragment::new(
            vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
            vec![0, 1, 2],
        )
        .unwrap()
    }

    #[test]
    fn test_new_validates_index_count() {
        let result = Fragment::new(vec![Vec3::zeros(); 3], vec![0, 1]);
        assert_eq!(result, Err(GeometryError::IndexCountNotTriangles { count: 2 }));
    }

    #[test]
    fn test_new_validates_index_range() {
        let result = Fragment::new(vec![Vec3::zeros(); 3], vec![0, 1, 3]);
        assert_eq!(
            result,
            Err(GeometryError::IndexOutOfRange { index: 3, vertex_count: 3 })
        );
    }

    #[test]
    fn test_new_rejects_nan() {
        let result = Fragment::new(
            vec![Vec3::zeros(), Vec3::new(f32::NAN, 0.0, 0.0), Vec3::x()],
            vec![0, 1, 2],
        );
        assert_eq!(result, Err(GeometryError::NonFiniteVertex { index: 1 }));
    }

    #[test]
    fn test_cuboid_shape() {
        let cube = Fragment::cuboid(Vec3::new(5.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(cube.vertices().len(), 8);
        assert_eq!(cube.triangle_count(), 12);

        let bounds = cube.bounds().unwrap();
        assert_relative_eq!(bounds.position, Vec3::new(5.0, 0.0, 0.0));
        assert_relative_eq!(bounds.half_extent, Vec3::new(1.0, 1.0, 1.0));

        // Every face normal points away from the center
        for [a, b, c] in cube.triangles() {
            let normal = (b - a).cross(&(c - a));
            let outward = (a + b + c) / 3.0 - Vec3::new(5.0, 0.0, 0.0);
            assert!(normal.dot(&outward) > 0.0);
        }
    }

    #[test]
    fn test_merge_rebases_indices() {
        let merged = Fragment::merge([&single_triangle(), &single_triangle()]);
        assert_eq!(merged.triangle_count(), 2);
        assert_eq!(merged.indices(), &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_transformed_moves_vertices() {
        let moved = single_triangle().transformed(&Transform::from_position(Vec3::new(0.0, 0.0, 2.0)));
        assert_relative_eq!(moved.vertices()[1], Vec3::new(1.0, 0.0, 2.0));
        assert_eq!(moved.indices(), single_triangle().indices());
    }

    #[test]
    #[should_panic(expected = "not a multiple of 3")]
    fn test_from_parts_panics_on_partial_triangle() {
        let _ = Fragment::from_parts(vec![Vec3::zeros(); 3], vec![0, 1]);
    }
}
