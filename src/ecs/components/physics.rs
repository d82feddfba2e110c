//! Physics components for body entities.

use std::sync::Arc;

use glam::{Quat, Vec3};

use crate::error::{PhysicsError, Result};
use crate::physics::shape::Shape;

use super::transform::Pose;

/// Handle identifying a body inside a [`PhysicsWorld`](crate::physics::PhysicsWorld).
pub type BodyHandle = hecs::Entity;

/// Default restitution of dynamic bodies.
pub const DEFAULT_RESTITUTION: f32 = 0.8;
/// Default static and dynamic friction coefficient of dynamic bodies.
pub const DEFAULT_FRICTION: f32 = 0.8;

/// Rigid body type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigidBodyType {
    /// Affected by forces and collisions.
    Dynamic,
    /// Immovable.
    Static,
}

/// Rigid body component.
///
/// `inverse_mass` and `inverse_inertia` are zero iff the body is not dynamic.
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub body_type: RigidBodyType,
    mass: f32,
    inverse_mass: f32,
    /// Scalar moment of inertia.
    inertia: f32,
    inverse_inertia: f32,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub force_accumulator: Vec3,
    pub torque_accumulator: Vec3,
    /// Coefficient of restitution (0.0 - 1.0).
    pub restitution: f32,
    /// Static friction coefficient.
    pub static_friction: f32,
    /// Dynamic friction coefficient.
    pub dynamic_friction: f32,
    /// Gravity scale (default: 1.0).
    pub gravity_scale: f32,
}

impl RigidBody {
    /// Create a new dynamic rigid body with the given mass.
    pub fn new_dynamic(mass: f32) -> Self {
        let mut body = Self {
            body_type: RigidBodyType::Dynamic,
            mass: 0.0,
            inverse_mass: 0.0,
            inertia: 0.0,
            inverse_inertia: 0.0,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            force_accumulator: Vec3::ZERO,
            torque_accumulator: Vec3::ZERO,
            restitution: DEFAULT_RESTITUTION,
            static_friction: DEFAULT_FRICTION,
            dynamic_friction: DEFAULT_FRICTION,
            gravity_scale: 1.0,
        };
        // Unit sphere approximation until told otherwise.
        body.set_mass(mass);
        body.set_inertia(mass);
        body
    }

    /// Create a new static rigid body.
    pub fn new_static() -> Self {
        Self {
            body_type: RigidBodyType::Static,
            mass: 0.0,
            inverse_mass: 0.0,
            inertia: 0.0,
            inverse_inertia: 0.0,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            force_accumulator: Vec3::ZERO,
            torque_accumulator: Vec3::ZERO,
            restitution: 1.0,
            static_friction: 0.0,
            dynamic_friction: 0.0,
            gravity_scale: 0.0,
        }
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.body_type == RigidBodyType::Dynamic
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.body_type == RigidBodyType::Static
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    #[inline]
    pub fn inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    #[inline]
    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    #[inline]
    pub fn inverse_inertia(&self) -> f32 {
        self.inverse_inertia
    }

    /// Set the mass. Ignored by static bodies.
    pub fn set_mass(&mut self, mass: f32) {
        if !self.is_dynamic() {
            return;
        }
        self.mass = mass;
        self.inverse_mass = if mass > 0.0 { 1.0 / mass } else { 0.0 };
    }

    /// Set the scalar moment of inertia. Ignored by static bodies.
    pub fn set_inertia(&mut self, inertia: f32) {
        if !self.is_dynamic() {
            return;
        }
        self.inertia = inertia;
        self.inverse_inertia = if inertia > 0.0 { 1.0 / inertia } else { 0.0 };
    }

    /// Dynamic bodies need a finite, positive mass and inertia.
    pub fn validate(&self) -> Result<()> {
        if !self.is_dynamic() {
            return Ok(());
        }
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(PhysicsError::InvalidConfig(format!(
                "dynamic body mass must be finite and positive, got {}",
                self.mass
            )));
        }
        if !(self.inertia.is_finite() && self.inertia > 0.0) {
            return Err(PhysicsError::InvalidConfig(format!(
                "dynamic body inertia must be finite and positive, got {}",
                self.inertia
            )));
        }
        Ok(())
    }
}

/// Collision detection component.
#[derive(Debug, Clone)]
pub struct Collider {
    /// Shared convex geometry.
    pub shape: Arc<Shape>,
    /// If true, contacts are reported but never solved.
    pub is_trigger: bool,
}

impl Collider {
    pub fn new(shape: Arc<Shape>) -> Self {
        Self {
            shape,
            is_trigger: false,
        }
    }
}

/// Marker for the standing ground body every dynamic body is tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroundPlane;

/// Everything needed to register a body with a world.
///
/// ```
/// use std::sync::Arc;
/// use rein_physics::prelude::*;
///
/// let ball = Body::dynamic(2.0)
///     .with_position(Vec3::new(0.0, 5.0, 0.0))
///     .with_shape(Arc::new(Shape::sphere(Vec3::ZERO, 0.5)));
/// assert!(ball.rigid_body.is_dynamic());
/// ```
#[derive(Debug, Clone)]
pub struct Body {
    pub pose: Pose,
    pub rigid_body: RigidBody,
    pub collider: Option<Collider>,
}

impl Body {
    /// A dynamic body with the given mass at the origin.
    pub fn dynamic(mass: f32) -> Self {
        Self {
            pose: Pose::identity(),
            rigid_body: RigidBody::new_dynamic(mass),
            collider: None,
        }
    }

    /// A static body at the origin.
    pub fn fixed() -> Self {
        Self {
            pose: Pose::identity(),
            rigid_body: RigidBody::new_static(),
            collider: None,
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.pose.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.pose = self.pose.with_rotation(rotation);
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.pose.scale = scale;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.rigid_body.linear_velocity = velocity;
        self
    }

    pub fn with_angular_velocity(mut self, angular_velocity: Vec3) -> Self {
        self.rigid_body.angular_velocity = angular_velocity;
        self
    }

    pub fn with_inertia(mut self, inertia: f32) -> Self {
        self.rigid_body.set_inertia(inertia);
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.rigid_body.restitution = restitution;
        self
    }

    pub fn with_friction(mut self, static_friction: f32, dynamic_friction: f32) -> Self {
        self.rigid_body.static_friction = static_friction;
        self.rigid_body.dynamic_friction = dynamic_friction;
        self
    }

    pub fn with_gravity_scale(mut self, gravity_scale: f32) -> Self {
        self.rigid_body.gravity_scale = gravity_scale;
        self
    }

    /// Attach a collider with the given shape.
    pub fn with_shape(mut self, shape: Arc<Shape>) -> Self {
        self.collider = Some(Collider::new(shape));
        self
    }

    /// Mark the collider as a trigger. Has no effect without a shape.
    pub fn as_trigger(mut self) -> Self {
        if let Some(collider) = &mut self.collider {
            collider.is_trigger = true;
        }
        self
    }
}
