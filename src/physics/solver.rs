//! Contact solvers.
//!
//! Solvers run once per substep over the deduplicated contact list, in the
//! order they were registered with the world. Contacts are not cached between
//! steps.

use glam::Vec3;

use crate::ecs::components::physics::{BodyHandle, RigidBody};
use crate::ecs::components::transform::Pose;

use super::contact::CollisionPair;

/// Fraction of the penetration removed per step by [`ImpulseSolver`].
pub const IMPULSE_CORRECTION_PERCENT: f32 = 0.2;
/// Fraction of the penetration removed per step by [`PositionSolver`].
pub const POSITION_CORRECTION_PERCENT: f32 = 0.8;
/// Penetration tolerated before any positional correction.
pub const PENETRATION_SLOP: f32 = 0.01;

/// Below this tangential speed no friction is applied.
const TANGENT_EPSILON: f32 = 1e-4;

/// Resolves contacts by changing body velocities and/or positions.
pub trait Solver {
    fn solve(&mut self, pairs: &[CollisionPair], bodies: &mut hecs::World, dt: f32);
}

/// Sequential impulse solver with restitution, Coulomb friction and
/// positional correction.
#[derive(Debug, Clone)]
pub struct ImpulseSolver {
    pub percent: f32,
    pub slop: f32,
}

impl Default for ImpulseSolver {
    fn default() -> Self {
        Self {
            percent: IMPULSE_CORRECTION_PERCENT,
            slop: PENETRATION_SLOP,
        }
    }
}

impl ImpulseSolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn solve_pair(&self, pair: &CollisionPair, world: &mut hecs::World) {
        let (Some(mut a), Some(mut b)) = (
            BodyState::load(world, pair.body_a),
            BodyState::load(world, pair.body_b),
        ) else {
            return;
        };

        let inv_mass_sum = a.inverse_mass + b.inverse_mass;
        if inv_mass_sum <= 0.0 {
            return;
        }

        let manifold = &pair.manifold;
        let normal = manifold.normal;
        let point = manifold.point();
        let r_a = point - a.position;
        let r_b = point - b.position;

        let relative_velocity = b.velocity_at(r_b) - a.velocity_at(r_a);
        let normal_speed = relative_velocity.dot(normal);
        if normal_speed >= 0.0 {
            return;
        }

        // Normal impulse
        let restitution = a.restitution * b.restitution;
        let k_normal = inv_mass_sum + a.angular_term(r_a, normal) + b.angular_term(r_b, normal);
        let j = -(1.0 + restitution) * normal_speed / k_normal;
        let impulse = normal * j;
        a.apply_impulse(-impulse, r_a);
        b.apply_impulse(impulse, r_b);

        // Friction impulse
        let relative_velocity = b.velocity_at(r_b) - a.velocity_at(r_a);
        let tangent_velocity = relative_velocity - normal * relative_velocity.dot(normal);
        let tangent_speed = tangent_velocity.length();
        if tangent_speed > TANGENT_EPSILON {
            let tangent = tangent_velocity / tangent_speed;
            let k_tangent =
                inv_mass_sum + a.angular_term(r_a, tangent) + b.angular_term(r_b, tangent);

            let static_mu = a.static_friction.hypot(b.static_friction);
            let f = -relative_velocity.dot(tangent) / k_tangent;
            let friction = if f.abs() < j * static_mu {
                tangent * f
            } else {
                let dynamic_mu = a.dynamic_friction.hypot(b.dynamic_friction);
                tangent * (-j * dynamic_mu)
            };
            a.apply_impulse(-friction, r_a);
            b.apply_impulse(friction, r_b);
        }

        // Positional correction
        let correction =
            normal * ((manifold.depth - self.slop).max(0.0) * self.percent / inv_mass_sum);
        a.position -= correction * a.inverse_mass;
        b.position += correction * b.inverse_mass;

        a.store(world, pair.body_a);
        b.store(world, pair.body_b);
    }
}

impl Solver for ImpulseSolver {
    fn solve(&mut self, pairs: &[CollisionPair], bodies: &mut hecs::World, _dt: f32) {
        for pair in pairs {
            self.solve_pair(pair, bodies);
        }
    }
}

/// Pure positional solver. Every correction is computed from the incoming
/// positions before any is applied, so the result does not depend on
/// contact order.
#[derive(Debug, Clone)]
pub struct PositionSolver {
    pub percent: f32,
    pub slop: f32,
}

impl Default for PositionSolver {
    fn default() -> Self {
        Self {
            percent: POSITION_CORRECTION_PERCENT,
            slop: PENETRATION_SLOP,
        }
    }
}

impl PositionSolver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Solver for PositionSolver {
    fn solve(&mut self, pairs: &[CollisionPair], bodies: &mut hecs::World, _dt: f32) {
        let mut deltas: Vec<(BodyHandle, Vec3)> = Vec::with_capacity(pairs.len() * 2);

        for pair in pairs {
            let inverse_mass = |body| {
                bodies
                    .get::<&RigidBody>(body)
                    .map(|rb| rb.inverse_mass())
                    .unwrap_or(0.0)
            };
            let inv_a = inverse_mass(pair.body_a);
            let inv_b = inverse_mass(pair.body_b);
            let inv_mass_sum = inv_a + inv_b;
            if inv_mass_sum <= 0.0 {
                continue;
            }

            let manifold = &pair.manifold;
            let correction = manifold.normal
                * ((manifold.depth - self.slop).max(0.0) * self.percent / inv_mass_sum);
            deltas.push((pair.body_a, -correction * inv_a));
            deltas.push((pair.body_b, correction * inv_b));
        }

        for (body, delta) in deltas {
            if let Ok(mut pose) = bodies.get::<&mut Pose>(body) {
                pose.position += delta;
            }
        }
    }
}

/// Snapshot of the body data a contact needs. Non-dynamic bodies load with
/// zero inverse mass and inertia, restitution 1 and no friction.
struct BodyState {
    inverse_mass: f32,
    inverse_inertia: f32,
    linear_velocity: Vec3,
    angular_velocity: Vec3,
    position: Vec3,
    restitution: f32,
    static_friction: f32,
    dynamic_friction: f32,
}

impl BodyState {
    fn load(world: &hecs::World, body: BodyHandle) -> Option<Self> {
        let rb = world.get::<&RigidBody>(body).ok()?;
        let pose = world.get::<&Pose>(body).ok()?;
        let dynamic = rb.is_dynamic();
        Some(Self {
            inverse_mass: rb.inverse_mass(),
            inverse_inertia: rb.inverse_inertia(),
            linear_velocity: rb.linear_velocity,
            angular_velocity: rb.angular_velocity,
            position: pose.position,
            restitution: if dynamic { rb.restitution } else { 1.0 },
            static_friction: if dynamic { rb.static_friction } else { 0.0 },
            dynamic_friction: if dynamic { rb.dynamic_friction } else { 0.0 },
        })
    }

    fn store(&self, world: &mut hecs::World, body: BodyHandle) {
        if self.inverse_mass == 0.0 && self.inverse_inertia == 0.0 {
            return;
        }
        if let Ok(mut rb) = world.get::<&mut RigidBody>(body) {
            rb.linear_velocity = self.linear_velocity;
            rb.angular_velocity = self.angular_velocity;
        }
        if let Ok(mut pose) = world.get::<&mut Pose>(body) {
            pose.position = self.position;
        }
    }

    #[inline]
    fn velocity_at(&self, r: Vec3) -> Vec3 {
        self.linear_velocity + self.angular_velocity.cross(r)
    }

    /// `I⁻¹ |r × d|²`, the rotational share of the effective mass along `d`.
    #[inline]
    fn angular_term(&self, r: Vec3, direction: Vec3) -> f32 {
        self.inverse_inertia * r.cross(direction).length_squared()
    }

    fn apply_impulse(&mut self, impulse: Vec3, r: Vec3) {
        self.linear_velocity += impulse * self.inverse_mass;
        self.angular_velocity += r.cross(impulse) * self.inverse_inertia;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::contact::ContactManifold;

    fn spawn_dynamic(world: &mut hecs::World, position: Vec3, velocity: Vec3) -> BodyHandle {
        let mut rb = RigidBody::new_dynamic(1.0);
        rb.linear_velocity = velocity;
        world.spawn((Pose::from_position(position), rb))
    }

    fn x_contact(depth: f32) -> ContactManifold {
        ContactManifold {
            point_a: Vec3::new(1.0, 0.0, 0.0),
            point_b: Vec3::new(0.5, 0.0, 0.0),
            normal: Vec3::X,
            depth,
            contact_point: None,
        }
    }

    #[test]
    fn test_head_on_restitution() {
        let mut world = hecs::World::new();
        let a = spawn_dynamic(&mut world, Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        let b = spawn_dynamic(&mut world, Vec3::new(1.5, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0));
        world.get::<&mut RigidBody>(a).unwrap().restitution = 1.0;
        world.get::<&mut RigidBody>(b).unwrap().restitution = 0.8;

        let pairs = [CollisionPair::new(a, b, x_contact(0.5))];
        ImpulseSolver::new().solve(&pairs, &mut world, 1.0 / 60.0);

        let va = world.get::<&RigidBody>(a).unwrap().linear_velocity;
        let vb = world.get::<&RigidBody>(b).unwrap().linear_velocity;
        let separation = (vb - va).dot(Vec3::X);
        let eps = 1e-5;
        assert!(separation >= 0.0);
        assert!((separation - 0.8 * 2.0).abs() < eps, "separation = {}", separation);
        // Momentum is conserved.
        assert!((va + vb).length() < eps);
    }

    #[test]
    fn test_positional_correction_split_by_inverse_mass() {
        let mut world = hecs::World::new();
        let a = spawn_dynamic(&mut world, Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        let b = world.spawn((Pose::from_position(Vec3::new(1.5, 0.0, 0.0)), RigidBody::new_static()));

        let pairs = [CollisionPair::new(a, b, x_contact(0.51))];
        ImpulseSolver::new().solve(&pairs, &mut world, 1.0 / 60.0);

        let pa = world.get::<&Pose>(a).unwrap().position;
        let pb = world.get::<&Pose>(b).unwrap().position;
        let eps = 1e-5;
        // (0.51 - 0.01) * 0.2 all goes to the dynamic body.
        assert!((pa.x + 0.1).abs() < eps, "a = {:?}", pa);
        assert_eq!(pb, Vec3::new(1.5, 0.0, 0.0));

        // Bouncing off a static body uses its restitution of 1.
        let va = world.get::<&RigidBody>(a).unwrap().linear_velocity;
        assert!((va.x + 0.8).abs() < eps, "va = {:?}", va);
    }

    #[test]
    fn test_separating_pair_untouched() {
        let mut world = hecs::World::new();
        let a = spawn_dynamic(&mut world, Vec3::ZERO, Vec3::new(-1.0, 0.0, 0.0));
        let b = spawn_dynamic(&mut world, Vec3::new(1.5, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));

        let pairs = [CollisionPair::new(a, b, x_contact(0.5))];
        ImpulseSolver::new().solve(&pairs, &mut world, 1.0 / 60.0);

        assert_eq!(world.get::<&RigidBody>(a).unwrap().linear_velocity, Vec3::NEG_X);
        assert_eq!(world.get::<&Pose>(b).unwrap().position, Vec3::new(1.5, 0.0, 0.0));
    }

    #[test]
    fn test_friction_slows_sliding() {
        let mut world = hecs::World::new();
        let ground = world.spawn((Pose::identity(), RigidBody::new_static()));
        let block = spawn_dynamic(&mut world, Vec3::new(0.0, 0.5, 0.0), Vec3::new(2.0, -1.0, 0.0));
        // Keep the contact arm from spinning the block so only friction acts on x.
        world.get::<&mut RigidBody>(block).unwrap().set_inertia(0.0);

        let manifold = ContactManifold {
            point_a: Vec3::new(0.0, 0.0, 0.0),
            point_b: Vec3::new(0.0, -0.01, 0.0),
            normal: Vec3::Y,
            depth: 0.01,
            contact_point: Some(Vec3::ZERO),
        };
        let pairs = [CollisionPair::new(ground, block, manifold)];
        ImpulseSolver::new().solve(&pairs, &mut world, 1.0 / 60.0);

        let v = world.get::<&RigidBody>(block).unwrap().linear_velocity;
        assert!(v.y > 0.0, "block should bounce: {:?}", v);
        assert!(v.x < 2.0 && v.x >= 0.0, "friction should slow the block: {:?}", v);
    }

    #[test]
    fn test_position_solver_uses_incoming_positions() {
        let mut world = hecs::World::new();
        let a = spawn_dynamic(&mut world, Vec3::ZERO, Vec3::ZERO);
        let b = spawn_dynamic(&mut world, Vec3::new(1.5, 0.0, 0.0), Vec3::ZERO);

        // The same contact reported twice moves each body twice by the same amount.
        let pairs = [
            CollisionPair::new(a, b, x_contact(0.51)),
            CollisionPair::new(a, b, x_contact(0.51)),
        ];
        PositionSolver::new().solve(&pairs, &mut world, 1.0 / 60.0);

        let pa = world.get::<&Pose>(a).unwrap().position;
        let pb = world.get::<&Pose>(b).unwrap().position;
        let eps = 1e-5;
        // 0.5 * 0.8 / 2 per body per contact.
        assert!((pa.x + 0.4).abs() < eps, "a = {:?}", pa);
        assert!((pb.x - 1.9).abs() < eps, "b = {:?}", pb);
        assert_eq!(world.get::<&RigidBody>(a).unwrap().linear_velocity, Vec3::ZERO);
    }
}
