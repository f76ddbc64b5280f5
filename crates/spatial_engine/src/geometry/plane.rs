//! Planes and point/plane classification
//!
//! A plane is stored as a unit normal plus the scalar offset `d`, so every
//! point `p` on the plane satisfies `normal · p == d`. A point on the plane
//! is always derived from that pair, never stored alongside it.

use crate::foundation::math::Vec3;

/// Half-thickness of every plane used for classification
///
/// Points closer than this to a plane are coplanar. The clipper, the
/// straddle test and both tree builders all go through [`Plane::classify`]
/// so they agree on the same thickness.
pub const PLANE_THICKNESS: f32 = 1.0e-4;

/// Which side of a plane a point lies on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Positive side, along the normal
    Front,
    /// Negative side
    Back,
    /// Within [`PLANE_THICKNESS`] of the plane
    Coplanar,
}

/// Aggregate classification of a vertex set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Straddle {
    /// No vertex in front, at least one behind
    AllBack = -1,
    /// Vertices on both sides
    Straddling = 0,
    /// No vertex behind (also returned for empty and fully coplanar input)
    AllFront = 1,
}

impl Straddle {
    /// Signed encoding: `-1`, `0`, `1`
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Result of [`Plane::straddle`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StraddleInfo {
    /// Which side(s) the vertices fall on
    pub side: Straddle,
    /// Smallest absolute distance of any vertex to the plane
    /// (`f32::INFINITY` for an empty vertex set)
    pub min_distance: f32,
}

/// Coordinate axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// X axis
    X,
    /// Y axis
    Y,
    /// Z axis
    Z,
}

impl Axis {
    /// All three axes in octree processing order
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Component index into a vector
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Unit vector along the axis
    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::x(),
            Axis::Y => Vec3::y(),
            Axis::Z => Vec3::z(),
        }
    }
}

/// Oriented plane in Hessian normal form
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal vector
    pub normal: Vec3,
    /// Signed offset along the normal (`normal · p` for any point `p` on the plane)
    pub d: f32,
}

impl Plane {
    /// Create a plane from a normal and offset; the normal is normalized
    pub fn new(normal: Vec3, d: f32) -> Self {
        Self {
            normal: normal.normalize(),
            d,
        }
    }

    /// Create a plane through `point` facing along `normal`
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize();
        Self {
            normal,
            d: normal.dot(&point),
        }
    }

    /// Axis-aligned plane through `point`, facing the positive axis direction
    pub fn axis_aligned(axis: Axis, point: Vec3) -> Self {
        Self {
            normal: axis.unit(),
            d: point[axis.index()],
        }
    }

    /// Plane through the midpoint of `a` and `b`, facing from `a` towards `b`
    ///
    /// This is a cheap splitting heuristic, not a fitted plane. Returns
    /// `None` when the points are too close to define a direction.
    pub fn between_points(a: Vec3, b: Vec3) -> Option<Self> {
        let direction = b - a;
        if direction.norm() <= 2.0 * PLANE_THICKNESS {
            return None;
        }
        Some(Self::from_point_normal((a + b) * 0.5, direction))
    }

    /// A point lying on the plane
    pub fn point(&self) -> Vec3 {
        self.normal * self.d
    }

    /// Signed distance from the plane to `point`
    pub fn distance(&self, point: &Vec3) -> f32 {
        self.normal.dot(point) - self.d
    }

    /// Classify a point against the plane
    pub fn classify(&self, point: &Vec3) -> Classification {
        classify_distance(self.distance(point))
    }

    /// Classify a vertex set against the plane
    pub fn straddle<'a, I>(&self, vertices: I) -> StraddleInfo
    where
        I: IntoIterator<Item = &'a Vec3>,
    {
        let mut front = 0usize;
        let mut back = 0usize;
        let mut min_distance = f32::INFINITY;

        for vertex in vertices {
            let distance = self.distance(vertex);
            min_distance = min_distance.min(distance.abs());
            match classify_distance(distance) {
                Classification::Front => front += 1,
                Classification::Back => back += 1,
                Classification::Coplanar => {}
            }
        }

        StraddleInfo {
            side: straddle_from_counts(front, back),
            min_distance,
        }
    }

    /// Intersection of the segment `a → b` with the plane
    ///
    /// The caller guarantees the endpoints lie on opposite sides, so the
    /// segment is never parallel to the plane. The result is clamped to the
    /// segment to absorb rounding.
    pub fn intersect_segment(&self, a: &Vec3, b: &Vec3) -> Vec3 {
        let direction = b - a;
        let length = direction.norm();
        if length <= f32::EPSILON {
            return *a;
        }
        let unit = direction / length;
        let denom = self.normal.dot(&unit);
        if denom.abs() <= f32::EPSILON {
            return *a;
        }
        let t = (self.normal.dot(&(self.point() - a)) / denom).clamp(0.0, length);
        a + unit * t
    }
}

fn classify_distance(distance: f32) -> Classification {
    if distance > PLANE_THICKNESS {
        Classification::Front
    } else if distance < -PLANE_THICKNESS {
        Classification::Back
    } else {
        Classification::Coplanar
    }
}

/// Straddle rule shared by whole fragments and single triangles
pub(crate) fn straddle_from_counts(front: usize, back: usize) -> Straddle {
    if back == 0 {
        Straddle::AllFront
    } else if front == 0 {
        Straddle::AllBack
    } else {
        Straddle::Straddling
    }
}
