//! GJK narrow phase for axis-aligned boxes
//!
//! Gilbert-Johnson-Keerthi on the Minkowski difference of two boxes. The
//! simplex is an explicit state machine (point, line, triangle,
//! tetrahedron); each state reduces itself to the feature closest to the
//! origin and points the search direction from that feature at the origin.
//!
//! Boxes count as colliding when the origin is within a small tolerance of
//! the Minkowski difference. The tolerance scales with the boxes, so the
//! answer does not depend on units, and touching boxes (shared face, edge or
//! corner) collide whichever argument comes first.

use crate::foundation::math::Vec3;
use crate::geometry::BoundingBox;

/// Contact distance as a fraction of the Minkowski difference's size
const RELATIVE_TOLERANCE: f32 = 1.0e-5;

/// Squared sine (triangle) or normalized volume (tetrahedron) below which a
/// simplex is treated as flat
const DEGENERATE_RATIO: f32 = f32::EPSILON;

/// Furthest corner of `shape` along `direction`
///
/// All corners are equidistant from the center, so ranking them by the raw
/// projection picks the same corner as ranking normalized offsets.
pub fn support(shape: &BoundingBox, direction: &Vec3) -> Vec3 {
    let corners = shape.corners();
    let mut best = corners[0];
    let mut best_projection = (best - shape.position).dot(direction);

    for corner in &corners[1..] {
        let projection = (corner - shape.position).dot(direction);
        if projection > best_projection {
            best = *corner;
            best_projection = projection;
        }
    }

    best
}

/// Support point of the Minkowski difference `a - b`
fn minkowski_support(a: &BoundingBox, b: &BoundingBox, direction: &Vec3) -> Vec3 {
    support(a, direction) - support(b, &-direction)
}

/// GJK working set; the first point is always the newest
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Simplex {
    /// Single support point
    Point(Vec3),
    /// Segment `a-b`
    Line(Vec3, Vec3),
    /// Triangle `a-b-c`
    Triangle(Vec3, Vec3, Vec3),
    /// Tetrahedron with apex `a` over base `b-c-d`
    Tetrahedron(Vec3, Vec3, Vec3, Vec3),
}

/// Outcome of reducing a simplex
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evolution {
    /// The simplex encloses the origin
    ContainsOrigin,
    /// Keep searching with the reduced simplex
    Continue(Simplex),
}

impl Simplex {
    /// Number of support points
    pub fn len(&self) -> usize {
        match self {
            Simplex::Point(..) => 1,
            Simplex::Line(..) => 2,
            Simplex::Triangle(..) => 3,
            Simplex::Tetrahedron(..) => 4,
        }
    }

    /// Add a new support point as the newest vertex
    pub fn push(self, point: Vec3) -> Simplex {
        match self {
            Simplex::Point(a) => Simplex::Line(point, a),
            Simplex::Line(a, b) => Simplex::Triangle(point, a, b),
            Simplex::Triangle(a, b, c) => Simplex::Tetrahedron(point, a, b, c),
            // A tetrahedron either encloses the origin or is reduced before
            // the next push; keep the newest three if it ever happens
            Simplex::Tetrahedron(a, b, c, _) => {
                debug_assert!(false, "push onto an unreduced tetrahedron");
                Simplex::Tetrahedron(point, a, b, c)
            }
        }
    }

    /// Reduce the simplex to the feature nearest the origin
    ///
    /// `direction` is set to the vector from the nearest point to the
    /// origin, so its length is the simplex's distance from the origin.
    pub fn evolve(self, direction: &mut Vec3) -> Evolution {
        match self {
            Simplex::Point(a) => {
                *direction = -a;
                Evolution::Continue(self)
            }
            Simplex::Line(a, b) => Evolution::Continue(line(a, b, direction)),
            Simplex::Triangle(a, b, c) => Evolution::Continue(triangle(a, b, c, direction)),
            Simplex::Tetrahedron(a, b, c, d) => tetrahedron(a, b, c, d, direction),
        }
    }
}

fn line(a: Vec3, b: Vec3, direction: &mut Vec3) -> Simplex {
    let ab = b - a;
    let t = -a.dot(&ab);

    if t <= 0.0 {
        *direction = -a;
        return Simplex::Point(a);
    }
    let length_squared = ab.norm_squared();
    if t >= length_squared {
        *direction = -b;
        return Simplex::Point(b);
    }

    *direction = -(a + ab * (t / length_squared));
    Simplex::Line(a, b)
}

/// Nearest of several reductions, by distance to the origin
fn nearest(candidates: impl IntoIterator<Item = (Simplex, Vec3)>) -> Option<(Simplex, Vec3)> {
    candidates
        .into_iter()
        .min_by(|(_, x), (_, y)| x.norm_squared().total_cmp(&y.norm_squared()))
}

fn edge(a: Vec3, b: Vec3) -> (Simplex, Vec3) {
    let mut direction = Vec3::zeros();
    let simplex = line(a, b, &mut direction);
    (simplex, direction)
}

fn triangle(a: Vec3, b: Vec3, c: Vec3, direction: &mut Vec3) -> Simplex {
    let ab = b - a;
    let ac = c - a;

    // Vertex and edge regions, from the barycentric signs of the origin
    let d1 = -ab.dot(&a);
    let d2 = -ac.dot(&a);
    if d1 <= 0.0 && d2 <= 0.0 {
        *direction = -a;
        return Simplex::Point(a);
    }

    let d3 = -ab.dot(&b);
    let d4 = -ac.dot(&b);
    if d3 >= 0.0 && d4 <= d3 {
        *direction = -b;
        return Simplex::Point(b);
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        *direction = -(a + ab * (d1 / (d1 - d3)));
        return Simplex::Line(a, b);
    }

    let d5 = -ab.dot(&c);
    let d6 = -ac.dot(&c);
    if d6 >= 0.0 && d5 <= d6 {
        *direction = -c;
        return Simplex::Point(c);
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        *direction = -(a + ac * (d2 / (d2 - d6)));
        return Simplex::Line(a, c);
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && d4 >= d3 && d5 >= d6 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        *direction = -(b + (c - b) * w);
        return Simplex::Line(b, c);
    }

    // va + vb + vc is the squared area term |ab x ac|^2
    let area = va + vb + vc;
    if area <= DEGENERATE_RATIO * ab.norm_squared() * ac.norm_squared() {
        // Collinear points span no face; fall back to the nearest edge
        if let Some((simplex, nearest_direction)) = nearest([edge(a, b), edge(a, c), edge(b, c)]) {
            *direction = nearest_direction;
            return simplex;
        }
    }

    *direction = -(a + ab * (vb / area) + ac * (vc / area));
    Simplex::Triangle(a, b, c)
}

fn tetrahedron(a: Vec3, b: Vec3, c: Vec3, d: Vec3, direction: &mut Vec3) -> Evolution {
    let ab = b - a;
    let ac = c - a;
    let ad = d - a;
    let volume = ab.dot(&ac.cross(&ad));
    let flat = volume * volume
        <= DEGENERATE_RATIO * ab.norm_squared() * ac.norm_squared() * ad.norm_squared();

    // Each face with the vertex opposite it
    let faces = [(a, b, c, d), (a, c, d, b), (a, d, b, c), (b, d, c, a)];
    let outside = faces.into_iter().filter_map(|(p, q, r, opposite)| {
        let normal = (q - p).cross(&(r - p));
        let origin_side = -p.dot(&normal);
        let opposite_side = (opposite - p).dot(&normal);
        (flat || origin_side * opposite_side < 0.0).then(|| {
            let mut face_direction = Vec3::zeros();
            let simplex = triangle(p, q, r, &mut face_direction);
            (simplex, face_direction)
        })
    });

    match nearest(outside) {
        Some((simplex, nearest_direction)) => {
            *direction = nearest_direction;
            Evolution::Continue(simplex)
        }
        None => Evolution::ContainsOrigin,
    }
}

/// True when the two boxes intersect or touch
///
/// Runs at most `max_iterations` support steps; a query that has not
/// resolved by then is reported as separated.
pub fn gjk_intersect(a: &BoundingBox, b: &BoundingBox, max_iterations: u32) -> bool {
    let scale = (b.position - a.position).norm() + (a.half_extent + b.half_extent).norm();
    let tolerance = scale * RELATIVE_TOLERANCE;

    let first = minkowski_support(a, b, &Vec3::x());
    let mut simplex = Simplex::Point(first);
    let mut direction = -first;

    for _ in 0..max_iterations {
        let distance = direction.norm();
        if distance <= tolerance {
            // The origin sits on the simplex itself
            return true;
        }

        let point = minkowski_support(a, b, &direction);
        let reach = point.dot(&direction);
        if reach < -tolerance * distance {
            // Nothing on the difference gets within tolerance of the origin
            return false;
        }
        if distance * distance + reach <= tolerance * distance {
            // No support point gets meaningfully closer than the simplex
            return true;
        }

        match simplex.push(point).evolve(&mut direction) {
            Evolution::ContainsOrigin => return true,
            Evolution::Continue(next) => simplex = next,
        }
    }

    log::debug!(
        "GJK: unresolved after {} iterations ({:?} vs {:?}), reporting no collision",
        max_iterations,
        a.position,
        b.position
    );
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::broad_phase::box_box;

    const ITERATIONS: u32 = 64;

    fn unit_box(x: f32, y: f32, z: f32) -> BoundingBox {
        BoundingBox::cube(Vec3::new(x, y, z), 1.0)
    }

    #[test]
    fn test_support_picks_furthest_corner() {
        let aabb = BoundingBox::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 0.5));
        assert_eq!(support(&aabb, &Vec3::new(1.0, 1.0, 1.0)), Vec3::new(3.0, 1.0, 0.5));
        assert_eq!(support(&aabb, &Vec3::new(-1.0, 0.2, -3.0)), Vec3::new(-1.0, 1.0, -0.5));
    }

    #[test]
    fn test_separated_boxes() {
        let a = unit_box(0.0, 0.0, 0.0);
        let b = unit_box(5.0, 0.0, 0.0);
        assert!(!gjk_intersect(&a, &b, ITERATIONS));
        assert!(!gjk_intersect(&b, &a, ITERATIONS));
    }

    #[test]
    fn test_overlapping_boxes() {
        let a = unit_box(0.0, 0.0, 0.0);
        let b = unit_box(1.0, 0.0, 0.0);
        assert!(gjk_intersect(&a, &b, ITERATIONS));
        assert!(gjk_intersect(&b, &a, ITERATIONS));
    }

    #[test]
    fn test_identical_boxes() {
        let a = unit_box(3.0, -2.0, 1.0);
        assert!(gjk_intersect(&a, &a, ITERATIONS));
    }

    #[test]
    fn test_diagonal_cases() {
        let a = unit_box(0.0, 0.0, 0.0);
        assert!(gjk_intersect(&a, &unit_box(1.5, 1.5, 1.5), ITERATIONS));
        assert!(!gjk_intersect(&a, &unit_box(2.5, 2.5, 2.5), ITERATIONS));
        assert!(!gjk_intersect(&a, &unit_box(2.5, 0.0, 1.0), ITERATIONS));
    }

    #[test]
    fn test_iteration_cap_is_conservative() {
        let a = unit_box(0.0, 0.0, 0.0);
        let b = unit_box(1.5, 1.5, 1.5);
        assert!(!gjk_intersect(&a, &b, 1));
    }

    fn assert_matches_broad_phase(scale: f32) {
        let offsets = [-3.0, -2.25, -1.5, -0.75, 0.0, 0.75, 1.5, 2.25, 3.0];
        let a = BoundingBox::new(Vec3::zeros(), Vec3::new(1.0, 0.6, 1.0) * scale);

        for &x in &offsets {
            for &y in &offsets {
                for &z in &offsets {
                    let b = BoundingBox::new(Vec3::new(x, y, z) * scale, Vec3::new(0.6, 1.0, 1.0) * scale);
                    let forward = gjk_intersect(&a, &b, ITERATIONS);
                    let backward = gjk_intersect(&b, &a, ITERATIONS);
                    assert_eq!(forward, backward, "asymmetric at ({x}, {y}, {z}) x {scale}");
                    assert_eq!(
                        forward,
                        box_box(&a, &b),
                        "disagrees with box test at ({x}, {y}, {z}) x {scale}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_matches_broad_phase_and_is_symmetric() {
        assert_matches_broad_phase(1.0);
    }

    #[test]
    fn test_small_and_large_boxes_match_broad_phase() {
        assert_matches_broad_phase(1.0e-3);
        assert_matches_broad_phase(1.0e-2);
        assert_matches_broad_phase(1.0e3);
    }

    #[test]
    fn test_small_separated_boxes() {
        let a = BoundingBox::cube(Vec3::zeros(), 0.01);
        let b = BoundingBox::cube(Vec3::new(-0.0185, -0.0232, 0.0013), 0.01);
        assert!(!box_box(&a, &b));
        assert!(!gjk_intersect(&a, &b, ITERATIONS));
        assert!(!gjk_intersect(&b, &a, ITERATIONS));
    }

    #[test]
    fn test_touching_boxes_collide_in_both_orders() {
        let a = unit_box(0.0, 0.0, 0.0);
        let contacts = [
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(-2.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
            Vec3::new(0.0, 0.0, -2.0),
            Vec3::new(2.0, 2.0, 0.0),
            Vec3::new(2.0, -2.0, 2.0),
            Vec3::new(2.0, 0.5, -1.0),
        ];

        for position in contacts {
            let b = BoundingBox::cube(position, 1.0);
            assert!(box_box(&a, &b), "{position:?}");
            assert!(gjk_intersect(&a, &b, ITERATIONS), "{position:?}");
            assert!(gjk_intersect(&b, &a, ITERATIONS), "{position:?}");
        }

        let gap = BoundingBox::cube(Vec3::new(2.01, 0.0, 0.0), 1.0);
        assert!(!gjk_intersect(&a, &gap, ITERATIONS));
        assert!(!gjk_intersect(&gap, &a, ITERATIONS));
    }

    #[test]
    fn test_degenerate_box_terminates() {
        let flat = BoundingBox::new(Vec3::zeros(), Vec3::new(1.0, 0.0, 1.0));
        let far = unit_box(0.0, 4.0, 0.0);
        assert!(!gjk_intersect(&flat, &far, ITERATIONS));
        assert!(gjk_intersect(&flat, &unit_box(0.0, 0.5, 0.0), ITERATIONS));
        assert!(gjk_intersect(&unit_box(0.0, 0.5, 0.0), &flat, ITERATIONS));
    }

    #[test]
    fn test_line_case_drops_old_point_when_origin_behind() {
        let mut direction = Vec3::zeros();
        let next = Simplex::Line(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0))
            .evolve(&mut direction);
        assert_eq!(next, Evolution::Continue(Simplex::Point(Vec3::new(1.0, 0.0, 0.0))));
        assert_eq!(direction, Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_line_case_points_from_segment_to_origin() {
        let mut direction = Vec3::zeros();
        let simplex = Simplex::Line(Vec3::new(1.0, 1.0, 0.0), Vec3::new(-1.0, 1.0, 0.0));
        let next = simplex.evolve(&mut direction);
        assert_eq!(next, Evolution::Continue(simplex));
        assert_eq!(direction, Vec3::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn test_collinear_triangle_reduces_to_segment() {
        let a = Vec3::new(-1.0, 1.0, 0.0);
        let b = Vec3::new(1.0, 1.0, 0.0);
        let c = Vec3::new(3.0, 1.0, 0.0);
        let mut direction = Vec3::zeros();

        let next = Simplex::Triangle(a, b, c).evolve(&mut direction);

        assert_eq!(next, Evolution::Continue(Simplex::Line(a, b)));
        assert_eq!(direction, Vec3::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn test_triangle_case_projects_onto_face() {
        let a = Vec3::new(-1.0, -1.0, 1.0);
        let b = Vec3::new(1.0, -1.0, 1.0);
        let c = Vec3::new(0.0, 1.0, 1.0);
        let mut direction = Vec3::zeros();

        let next = Simplex::Triangle(a, b, c).evolve(&mut direction);

        assert_eq!(next, Evolution::Continue(Simplex::Triangle(a, b, c)));
        assert_eq!(direction, Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_triangle_case_keeps_nearest_edge() {
        let a = Vec3::new(-1.0, 1.0, 0.0);
        let b = Vec3::new(1.0, 1.0, 0.0);
        let c = Vec3::new(0.0, 3.0, 0.0);
        let mut direction = Vec3::zeros();

        let next = Simplex::Triangle(a, b, c).evolve(&mut direction);

        assert_eq!(next, Evolution::Continue(Simplex::Line(a, b)));
        assert_eq!(direction, Vec3::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn test_tetrahedron_enclosing_origin() {
        let simplex = Simplex::Tetrahedron(
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(-1.0, -1.0, -1.0),
        );
        let mut direction = Vec3::zeros();
        assert_eq!(simplex.evolve(&mut direction), Evolution::ContainsOrigin);
    }

    #[test]
    fn test_tetrahedron_outside_face_drops_vertex() {
        let shift = Vec3::new(3.0, 6.0, 1.0);
        let simplex = Simplex::Tetrahedron(
            Vec3::new(0.0, 0.0, 2.0) - shift,
            Vec3::new(1.0, 0.0, -1.0) - shift,
            Vec3::new(-1.0, 1.0, -1.0) - shift,
            Vec3::new(-1.0, -1.0, -1.0) - shift,
        );
        let mut direction = Vec3::zeros();
        match simplex.evolve(&mut direction) {
            Evolution::Continue(next) => assert!(next.len() <= 3),
            Evolution::ContainsOrigin => panic!("origin is outside face abc"),
        }
    }

    #[test]
    fn test_push_orders_newest_first() {
        let p = Vec3::new(1.0, 0.0, 0.0);
        let q = Vec3::new(0.0, 1.0, 0.0);
        assert_eq!(Simplex::Point(p).push(q), Simplex::Line(q, p));
        assert_eq!(Simplex::Point(p).push(q).len(), 2);
    }
}
