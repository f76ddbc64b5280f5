//! Splitting triangle soups against a plane
//!
//! Triangles entirely on one side are copied whole (keeping their shared
//! vertices); straddling triangles are clipped edge by edge in the
//! Sutherland-Hodgman manner. A clipped side holds three points (still a
//! triangle) or four (a quad, re-triangulated across the 0-2 diagonal).

use super::plane::{straddle_from_counts, Classification, Plane, Straddle};
use super::Fragment;
use crate::foundation::math::Vec3;

/// Split `fragment` into the parts in front of and behind `plane`
///
/// Both outputs are freshly built; triangles lying in the plane count as
/// front. Every output triangle of `front` has no vertex behind the plane,
/// and every triangle of `back` has no vertex in front of it.
///
/// # Panics
///
/// Panics if the fragment's index count is not a multiple of 3.
pub fn clip(fragment: &Fragment, plane: &Plane) -> (Fragment, Fragment) {
    let indices = fragment.indices();
    assert!(
        indices.len() % 3 == 0,
        "clip: index count {} is not a multiple of 3",
        indices.len()
    );

    let vertices = fragment.vertices();
    let classes: Vec<Classification> = vertices.iter().map(|v| plane.classify(v)).collect();

    let mut front = SideBuilder::new(vertices.len());
    let mut back = SideBuilder::new(vertices.len());
    let mut straddling = 0usize;

    for tri in indices.chunks_exact(3) {
        let tri = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let front_count = tri.iter().filter(|&&i| classes[i] == Classification::Front).count();
        let back_count = tri.iter().filter(|&&i| classes[i] == Classification::Back).count();

        match straddle_from_counts(front_count, back_count) {
            Straddle::AllFront => front.push_shared_triangle(tri, vertices),
            Straddle::AllBack => back.push_shared_triangle(tri, vertices),
            Straddle::Straddling => {
                straddling += 1;
                let (front_poly, back_poly) = split_triangle(tri, vertices, &classes, plane);
                front.push_polygon(&front_poly);
                back.push_polygon(&back_poly);
            }
        }
    }

    log::trace!(
        "clip: {} triangles, {} straddling -> front {} / back {}",
        fragment.triangle_count(),
        straddling,
        front.indices.len() / 3,
        back.indices.len() / 3
    );

    let (front, back) = (front.build(), back.build());
    debug_assert!(front.indices().len() % 3 == 0 && back.indices().len() % 3 == 0);
    (front, back)
}

/// Clip one straddling triangle into its front and back polygons
fn split_triangle(
    tri: [usize; 3],
    vertices: &[Vec3],
    classes: &[Classification],
    plane: &Plane,
) -> (ClippedPolygon, ClippedPolygon) {
    let mut front = ClippedPolygon::default();
    let mut back = ClippedPolygon::default();

    // Edges a->b, b->c, c->a; each step emits the edge's destination
    for edge in 0..3 {
        let start = tri[edge];
        let end = tri[(edge + 1) % 3];
        let (start_class, end_class) = (classes[start], classes[end]);

        let crosses = matches!(
            (start_class, end_class),
            (Classification::Front, Classification::Back) | (Classification::Back, Classification::Front)
        );
        if crosses {
            let hit = plane.intersect_segment(&vertices[start], &vertices[end]);
            front.push(hit);
            back.push(hit);
        }

        match end_class {
            Classification::Front => front.push(vertices[end]),
            Classification::Back => back.push(vertices[end]),
            Classification::Coplanar => {
                front.push(vertices[end]);
                back.push(vertices[end]);
            }
        }
    }

    (front, back)
}

/// Up to four points produced by clipping a triangle
#[derive(Debug, Default)]
struct ClippedPolygon {
    points: [Vec3; 4],
    len: usize,
}

impl ClippedPolygon {
    fn push(&mut self, point: Vec3) {
        assert!(self.len < 4, "clipped triangle produced more than four points");
        self.points[self.len] = point;
        self.len += 1;
    }

    fn points(&self) -> &[Vec3] {
        &self.points[..self.len]
    }
}

/// Accumulates one side of a clip
struct SideBuilder {
    vertices: Vec<Vec3>,
    indices: Vec<u32>,
    /// Source vertex index -> index in this side, for unclipped triangles
    remap: Vec<Option<u32>>,
}

impl SideBuilder {
    fn new(source_vertex_count: usize) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            remap: vec![None; source_vertex_count],
        }
    }

    fn next_index(&self) -> u32 {
        self.vertices.len() as u32
    }

    fn push_shared_triangle(&mut self, tri: [usize; 3], source: &[Vec3]) {
        for i in tri {
            let index = match self.remap[i] {
                Some(index) => index,
                None => {
                    let index = self.next_index();
                    self.vertices.push(source[i]);
                    self.remap[i] = Some(index);
                    index
                }
            };
            self.indices.push(index);
        }
    }

    fn push_polygon(&mut self, polygon: &ClippedPolygon) {
        let points = polygon.points();
        if points.len() < 3 {
            return;
        }

        let base = self.next_index();
        self.vertices.extend_from_slice(points);
        self.indices.extend_from_slice(&[base, base + 1, base + 2]);
        if points.len() == 4 {
            self.indices.extend_from_slice(&[base, base + 2, base + 3]);
        }
    }

    fn build(self) -> Fragment {
        Fragment::from_parts(self.vertices, self.indices)
    }
}
