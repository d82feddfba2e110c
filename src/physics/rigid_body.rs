//! Rigid body integration functions.

use glam::Vec3;

use crate::ecs::components::physics::RigidBody;
use crate::ecs::components::transform::Pose;

/// Add `mass * gravity * gravity_scale` to every dynamic body's force accumulator.
pub fn apply_gravity(world: &mut hecs::World, gravity: Vec3) {
    for (_, rb) in world.query_mut::<&mut RigidBody>() {
        if rb.is_dynamic() {
            rb.force_accumulator += gravity * rb.mass() * rb.gravity_scale;
        }
    }
}

/// Semi-implicit Euler: `v += F/m * dt`, `ω += τ/I * dt`.
pub fn integrate_velocities(world: &mut hecs::World, dt: f32) {
    for (_, rb) in world.query_mut::<&mut RigidBody>() {
        if !rb.is_dynamic() {
            continue;
        }
        let inverse_mass = rb.inverse_mass();
        let inverse_inertia = rb.inverse_inertia();
        rb.linear_velocity += rb.force_accumulator * inverse_mass * dt;
        rb.angular_velocity += rb.torque_accumulator * inverse_inertia * dt;
    }
}

/// Advance positions by `v * dt` and rotations by `ω * dt`.
pub fn integrate_positions(world: &mut hecs::World, dt: f32) {
    for (_, (rb, pose)) in world.query_mut::<(&RigidBody, &mut Pose)>() {
        if !rb.is_dynamic() {
            continue;
        }
        pose.position += rb.linear_velocity * dt;
        pose.rotate(rb.angular_velocity, dt);
    }
}

/// Clear force and torque accumulators on all rigid bodies.
pub fn clear_forces(world: &mut hecs::World) {
    for (_, rb) in world.query_mut::<&mut RigidBody>() {
        rb.force_accumulator = Vec3::ZERO;
        rb.torque_accumulator = Vec3::ZERO;
    }
}
