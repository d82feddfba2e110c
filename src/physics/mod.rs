//! Rigid body simulation and collision detection.
//!
//! # Architecture
//!
//! Each call to [`PhysicsWorld::step`] runs `substeps` iterations of:
//!
//! 1. Broadphase candidate pairs (exhaustive or kd-tree), plus every dynamic
//!    body against the ground plane
//! 2. Narrowphase dispatch (analytic tests, GJK/EPA)
//! 3. Pair deduplication; trigger contacts are split off and only reported
//! 4. Registered solvers, in registration order
//! 5. Gravity and integration of velocities, positions and rotations
//! 6. Clearing of force accumulators

pub mod broadphase;
pub mod contact;
pub mod epa;
pub mod gjk;
pub mod kdtree;
pub mod narrowphase;
pub mod rigid_body;
pub mod shape;
pub mod solver;

use std::sync::Arc;

use glam::Vec3;
use tracing::{debug, info, warn};

use crate::ecs::components::physics::{Body, BodyHandle, Collider, GroundPlane, RigidBody};
use crate::ecs::components::transform::Pose;
use crate::ecs::systems::{extract_render_poses, RenderPose};
use crate::error::{PhysicsError, Result};

use self::broadphase::{Broadphase, BroadphaseEntry, BroadphaseMode};
use self::contact::{dedup_pairs, CollisionPair};
use self::narrowphase::detect_collision;
use self::shape::{Shape, ShapeKind};
use self::solver::Solver;

/// The standing ground plane every dynamic body is tested against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundConfig {
    /// Plane normal, pointing out of the ground.
    pub normal: Vec3,
    /// Offset of the plane along its normal.
    pub distance: f32,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            normal: Vec3::Y,
            distance: 0.0,
        }
    }
}

/// Configuration for the physics simulation.
#[derive(Debug, Clone)]
pub struct PhysicsConfig {
    /// Gravity vector. Default: (0, -9.81, 0).
    pub gravity: Vec3,
    /// Substeps per [`PhysicsWorld::step`]. Default: 1.
    pub substeps: u32,
    /// Candidate pair search. Default: exhaustive.
    pub broadphase: BroadphaseMode,
    /// Ground plane, if any. Default: the y = 0 plane facing +Y.
    pub ground_plane: Option<GroundConfig>,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            substeps: 1,
            broadphase: BroadphaseMode::Exhaustive,
            ground_plane: Some(GroundConfig::default()),
        }
    }
}

impl PhysicsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.substeps == 0 {
            return Err(PhysicsError::InvalidConfig(
                "substeps must be at least 1".into(),
            ));
        }
        if !self.gravity.is_finite() {
            return Err(PhysicsError::InvalidConfig(format!(
                "gravity must be finite, got {}",
                self.gravity
            )));
        }
        if let BroadphaseMode::KdTree { radius } = self.broadphase {
            if !(radius.is_finite() && radius > 0.0) {
                return Err(PhysicsError::InvalidConfig(format!(
                    "kd-tree radius must be positive, got {radius}"
                )));
            }
        }
        if let Some(ground) = &self.ground_plane {
            if ground.normal.length_squared() < 1e-12 || !ground.normal.is_finite() {
                return Err(PhysicsError::InvalidConfig(
                    "ground plane normal must be non-zero".into(),
                ));
            }
        }
        Ok(())
    }
}

/// The physics world: bodies, solvers and the stepping loop.
pub struct PhysicsWorld {
    config: PhysicsConfig,
    bodies: hecs::World,
    solvers: Vec<Box<dyn Solver>>,
    broadphase: Broadphase,
    ground: Option<BodyHandle>,
    contacts: Vec<CollisionPair>,
    triggers: Vec<CollisionPair>,
}

impl PhysicsWorld {
    /// Create a world. Spawns the ground plane body when configured.
    pub fn new(config: PhysicsConfig) -> Result<Self> {
        config.validate()?;

        let mut bodies = hecs::World::new();
        let ground = config.ground_plane.map(|ground| {
            let shape = Shape::plane(ground.normal, ground.distance);
            bodies.spawn((
                Pose::identity(),
                RigidBody::new_static(),
                Collider::new(Arc::new(shape)),
                GroundPlane,
            ))
        });

        info!(
            gravity = %config.gravity,
            substeps = config.substeps,
            ground = ground.is_some(),
            "physics world created"
        );

        Ok(Self {
            broadphase: Broadphase::new(config.broadphase),
            config,
            bodies,
            solvers: Vec::new(),
            ground,
            contacts: Vec::new(),
            triggers: Vec::new(),
        })
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Register a body and return its handle.
    ///
    /// Dynamic bodies with a non-positive or non-finite mass or inertia are
    /// rejected with [`PhysicsError::InvalidConfig`].
    pub fn add_body(&mut self, body: Body) -> Result<BodyHandle> {
        if let Err(err) = body.rigid_body.validate() {
            warn!(%err, "rejected body");
            return Err(err);
        }
        let mut builder = hecs::EntityBuilder::new();
        builder.add(body.pose).add(body.rigid_body);
        if let Some(collider) = body.collider {
            builder.add(collider);
        }
        Ok(self.bodies.spawn(builder.build()))
    }

    /// Remove a body. Removing the ground plane body disables ground tests.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Result<()> {
        if self.bodies.despawn(handle).is_err() {
            warn!(?handle, "tried to remove an unknown body");
            return Err(PhysicsError::UnknownBody(handle));
        }
        if self.ground == Some(handle) {
            self.ground = None;
        }
        Ok(())
    }

    /// Append a solver. Solvers run in registration order every substep.
    pub fn add_solver(&mut self, solver: Box<dyn Solver>) {
        self.solvers.push(solver);
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// `dt == 0` does nothing. Negative or non-finite values are rejected.
    pub fn step(&mut self, dt: f32) -> Result<()> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(PhysicsError::InvalidTimestep(dt));
        }
        if dt == 0.0 {
            return Ok(());
        }

        let substep_dt = dt / self.config.substeps as f32;
        for _ in 0..self.config.substeps {
            self.substep(substep_dt);
        }
        Ok(())
    }

    fn substep(&mut self, dt: f32) {
        // 1-2. Detect
        let mut pairs = self.detect();

        // 3. Deduplicate and split off triggers
        dedup_pairs(&mut pairs);
        let (triggers, contacts): (Vec<_>, Vec<_>) =
            pairs.into_iter().partition(|pair| self.involves_trigger(pair));
        self.triggers = triggers;
        self.contacts = contacts;

        // 4. Solve
        for solver in &mut self.solvers {
            solver.solve(&self.contacts, &mut self.bodies, dt);
        }

        // 5. Integrate
        rigid_body::apply_gravity(&mut self.bodies, self.config.gravity);
        rigid_body::integrate_velocities(&mut self.bodies, dt);
        rigid_body::integrate_positions(&mut self.bodies, dt);

        // 6. Clear force accumulators
        rigid_body::clear_forces(&mut self.bodies);

        debug!(
            contacts = self.contacts.len(),
            triggers = self.triggers.len(),
            "substep done"
        );
    }

    fn detect(&mut self) -> Vec<CollisionPair> {
        let mut handles = Vec::new();
        let mut entries = Vec::new();
        for (entity, (pose, rb, _)) in self
            .bodies
            .query_mut::<hecs::Without<(&Pose, &RigidBody, &Collider), &GroundPlane>>()
        {
            handles.push(entity);
            entries.push(BroadphaseEntry {
                position: pose.position,
                is_dynamic: rb.is_dynamic(),
            });
        }

        let mut pairs = Vec::new();
        for (i, j) in self.broadphase.find_pairs(&entries) {
            if let Some(pair) = self.collide(handles[i], handles[j]) {
                pairs.push(pair);
            }
        }

        if let Some(ground) = self.ground {
            for (i, entry) in entries.iter().enumerate() {
                if !entry.is_dynamic {
                    continue;
                }
                if let Some(pair) = self.collide(ground, handles[i]) {
                    pairs.push(pair);
                }
            }
        }
        pairs
    }

    fn collide(&self, body_a: BodyHandle, body_b: BodyHandle) -> Option<CollisionPair> {
        let mut query_a = self.bodies.query_one::<(&Pose, &Collider)>(body_a).ok()?;
        let mut query_b = self.bodies.query_one::<(&Pose, &Collider)>(body_b).ok()?;
        let (pose_a, collider_a) = query_a.get()?;
        let (pose_b, collider_b) = query_b.get()?;

        let manifold = detect_collision(&collider_a.shape, pose_a, &collider_b.shape, pose_b)?;
        Some(CollisionPair::new(body_a, body_b, manifold))
    }

    fn involves_trigger(&self, pair: &CollisionPair) -> bool {
        let is_trigger = |body: BodyHandle| {
            self.bodies
                .get::<&Collider>(body)
                .map(|c| c.is_trigger)
                .unwrap_or(false)
        };
        is_trigger(pair.body_a) || is_trigger(pair.body_b)
    }

    /// Add a force to a body's accumulator for the next step.
    pub fn apply_force(&mut self, handle: BodyHandle, force: Vec3) -> Result<()> {
        self.rigid_body_mut(handle)?.force_accumulator += force;
        Ok(())
    }

    /// Add a torque to a body's accumulator for the next step.
    pub fn apply_torque(&mut self, handle: BodyHandle, torque: Vec3) -> Result<()> {
        self.rigid_body_mut(handle)?.torque_accumulator += torque;
        Ok(())
    }

    pub fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec3) -> Result<()> {
        self.rigid_body_mut(handle)?.linear_velocity = velocity;
        Ok(())
    }

    pub fn set_angular_velocity(&mut self, handle: BodyHandle, angular_velocity: Vec3) -> Result<()> {
        self.rigid_body_mut(handle)?.angular_velocity = angular_velocity;
        Ok(())
    }

    pub fn pose(&self, handle: BodyHandle) -> Result<Pose> {
        self.bodies
            .get::<&Pose>(handle)
            .map(|pose| *pose)
            .map_err(|_| PhysicsError::UnknownBody(handle))
    }

    pub fn set_pose(&mut self, handle: BodyHandle, pose: Pose) -> Result<()> {
        let mut current = self
            .bodies
            .get::<&mut Pose>(handle)
            .map_err(|_| PhysicsError::UnknownBody(handle))?;
        *current = pose;
        Ok(())
    }

    pub fn velocity(&self, handle: BodyHandle) -> Result<Vec3> {
        self.bodies
            .get::<&RigidBody>(handle)
            .map(|rb| rb.linear_velocity)
            .map_err(|_| PhysicsError::UnknownBody(handle))
    }

    pub fn angular_velocity(&self, handle: BodyHandle) -> Result<Vec3> {
        self.bodies
            .get::<&RigidBody>(handle)
            .map(|rb| rb.angular_velocity)
            .map_err(|_| PhysicsError::UnknownBody(handle))
    }

    /// Shape kind of a body, `None` when it has no collider.
    pub fn shape_kind(&self, handle: BodyHandle) -> Result<Option<ShapeKind>> {
        if !self.bodies.contains(handle) {
            return Err(PhysicsError::UnknownBody(handle));
        }
        Ok(self
            .bodies
            .get::<&Collider>(handle)
            .ok()
            .map(|collider| collider.shape.kind()))
    }

    /// Solved contacts of the last substep.
    pub fn contacts(&self) -> &[CollisionPair] {
        &self.contacts
    }

    /// Contacts involving a trigger collider in the last substep. Never solved.
    pub fn trigger_pairs(&self) -> &[CollisionPair] {
        &self.triggers
    }

    /// Number of bodies, not counting the ground plane.
    pub fn body_count(&self) -> usize {
        self.bodies.len() as usize - usize::from(self.ground.is_some())
    }

    /// Handle of the ground plane body, if one exists.
    pub fn ground(&self) -> Option<BodyHandle> {
        self.ground
    }

    /// Read access to the body storage.
    pub fn bodies(&self) -> &hecs::World {
        &self.bodies
    }

    /// Poses and shape kinds of every body with a collider, for a renderer.
    pub fn render_poses(&self) -> Vec<RenderPose> {
        extract_render_poses(&self.bodies)
    }

    fn rigid_body_mut(&mut self, handle: BodyHandle) -> Result<hecs::RefMut<'_, RigidBody>> {
        self.bodies
            .get::<&mut RigidBody>(handle)
            .map_err(|_| PhysicsError::UnknownBody(handle))
    }
}
