//! Render extraction system.
//!
//! Copies what a renderer needs out of the body world: one entry per body
//! with a collider, carrying its shape kind and model matrix. The physics
//! core never draws anything itself.

use glam::Mat4;

use crate::ecs::components::physics::{BodyHandle, Collider};
use crate::ecs::components::transform::Pose;
use crate::physics::shape::ShapeKind;

/// Snapshot of a body for drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPose {
    pub body: BodyHandle,
    pub kind: ShapeKind,
    pub pose: Pose,
    /// Model matrix (translation * rotation * scale).
    pub matrix: Mat4,
}

/// Collect the pose and shape kind of every body with a collider.
pub fn extract_render_poses(world: &hecs::World) -> Vec<RenderPose> {
    let mut query = world.query::<(&Pose, &Collider)>();
    query
        .iter()
        .map(|(body, (pose, collider))| RenderPose {
            body,
            kind: collider.shape.kind(),
            pose: *pose,
            matrix: pose.to_matrix(),
        })
        .collect()
}
