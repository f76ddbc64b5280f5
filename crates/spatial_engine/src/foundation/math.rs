//! Math utilities and types
//!
//! Thin aliases over nalgebra plus the transform used to place scene
//! geometry and query volumes in world space.

pub use nalgebra::{Matrix4, Quaternion, Unit, Vector3};

/// 3D vector type (also used for positions)
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and uniform scale
    pub fn from_position_scale(position: Vec3, scale: f32) -> Self {
        Self {
            position,
            scale: Vec3::new(scale, scale, scale),
            ..Default::default()
        }
    }

    /// Convert to a transformation matrix (TRS order)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Apply this transform to a position
    pub fn transform_point(&self, point: &Vec3) -> Vec3 {
        self.to_matrix()
            .transform_point(&Point3::from(*point))
            .coords
    }
}
