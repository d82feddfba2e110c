//! Pose component: where a body is and how it is oriented.

use glam::{Mat3, Mat4, Quat, Vec3};

/// World-space pose of a body. Stores position, rotation, and scale separately.
///
/// The renderer reads this every frame; only the physics step mutates it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub scale: Vec3,
    pub rotation: Mat3,
}

impl Pose {
    /// Create an identity pose.
    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            scale: Vec3::ONE,
            rotation: Mat3::IDENTITY,
        }
    }

    /// Create a pose from a position.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    /// Replace the rotation with the given quaternion.
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = Mat3::from_quat(rotation);
        self
    }

    /// Replace the scale.
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Convert to a 4x4 matrix (translation * rotation * scale).
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_mat3(self.rotation)
            * Mat4::from_scale(self.scale)
    }

    /// Map a local-space point into world space.
    #[inline]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * (self.scale * point)
    }

    /// Map a local-space vector into world space (no translation).
    #[inline]
    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        self.rotation * (self.scale * vector)
    }

    /// Map a world-space search direction into local space.
    ///
    /// Maximizing `d · (R S p)` over local points `p` is the same as
    /// maximizing `(S Rᵀ d) · p`, so support queries use this direction.
    #[inline]
    pub fn to_local_direction(&self, direction: Vec3) -> Vec3 {
        self.scale * (self.rotation.transpose() * direction)
    }

    /// Largest absolute scale component. Spheres and capsules use it to stay round.
    #[inline]
    pub fn max_scale(&self) -> f32 {
        self.scale.abs().max_element()
    }

    /// Advance the rotation by an angular velocity over `dt` seconds.
    pub fn rotate(&mut self, angular_velocity: Vec3, dt: f32) {
        let delta = angular_velocity * dt;
        if delta.length_squared() <= 1e-12 {
            return;
        }
        let rotation = Quat::from_scaled_axis(delta) * Quat::from_mat3(&self.rotation);
        self.rotation = Mat3::from_quat(rotation.normalize());
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}
