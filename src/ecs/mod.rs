//! hecs integration: body components and systems.
//!
//! A [`PhysicsWorld`](crate::physics::PhysicsWorld) stores its bodies as
//! entities in a `hecs::World`; the entity is the body handle.

pub mod components;
pub mod systems;

pub mod prelude {
    pub use super::components::{
        Body, BodyHandle, Collider, GroundPlane, Pose, RigidBody, RigidBodyType,
    };
    pub use super::systems::{extract_render_poses, RenderPose};
}
