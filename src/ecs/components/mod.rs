//! Body components.

pub mod physics;
pub mod transform;

pub use physics::{
    Body, BodyHandle, Collider, GroundPlane, RigidBody, RigidBodyType, DEFAULT_FRICTION,
    DEFAULT_RESTITUTION,
};
pub use transform::Pose;
