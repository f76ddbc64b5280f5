//! Geometric primitives for partitioning static scenes
//!
//! - [`plane`] - Planes, point classification and straddle tests
//! - [`bounds`] - Axis-aligned bounding boxes
//! - [`fragment`] - Indexed triangle soups, the unit of data the trees redistribute
//! - [`clip`] - Splitting a fragment against a plane

pub mod bounds;
pub mod clip;
pub mod fragment;
pub mod plane;

pub use bounds::BoundingBox;
pub use clip::clip;
pub use fragment::Fragment;
pub use plane::{Axis, Classification, Plane, Straddle, StraddleInfo, PLANE_THICKNESS};

/// Errors raised while validating caller-supplied geometry
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Index buffer does not describe whole triangles
    #[error("index count {count} is not a multiple of 3")]
    IndexCountNotTriangles {
        /// Offending index count
        count: usize,
    },

    /// An index points past the end of the vertex buffer
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        /// Offending index value
        index: u32,
        /// Length of the vertex buffer
        vertex_count: usize,
    },

    /// A vertex has a NaN or infinite component
    #[error("vertex {index} is not finite")]
    NonFiniteVertex {
        /// Position of the vertex in the buffer
        index: usize,
    },
}
