//! Rein Physics
//!
//! A small rigid-body physics kernel with a particle cloth simulator.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! 1. **ecs** - Body components stored in a hecs world, render extraction
//! 2. **physics** - Shapes, GJK/EPA narrowphase, kd-tree broadphase,
//!    contact solvers and the [`PhysicsWorld`] stepper
//! 3. **cloth** - Independent particle and link cloth simulation
//! 4. **error** - [`PhysicsError`] and the crate [`Result`] alias
//!
//! ```
//! use std::sync::Arc;
//! use rein_physics::prelude::*;
//!
//! let mut world = PhysicsWorld::new(PhysicsConfig::default()).unwrap();
//! world.add_solver(Box::new(ImpulseSolver::new()));
//! let ball = world
//!     .add_body(
//!         Body::dynamic(1.0)
//!             .with_position(Vec3::new(0.0, 2.0, 0.0))
//!             .with_shape(Arc::new(Shape::sphere(Vec3::ZERO, 0.5))),
//!     )
//!     .unwrap();
//! world.step(1.0 / 60.0).unwrap();
//! assert!(world.pose(ball).unwrap().position.y < 2.0);
//! ```

pub mod cloth;
pub mod ecs;
pub mod error;
pub mod physics;

// Re-export commonly used types
pub use cloth::{Cloth, ClothConfig, LinkConstraint, Particle};

pub use error::{PhysicsError, Result};

pub use physics::{
    broadphase::BroadphaseMode,
    contact::{CollisionPair, ContactManifold},
    epa::epa,
    gjk::{gjk, GjkResult, Simplex, SupportPoint},
    kdtree::{KdTree, Neighbor},
    narrowphase::detect_collision,
    shape::{ConvexHull, Shape, ShapeKind},
    solver::{ImpulseSolver, PositionSolver, Solver},
    GroundConfig, PhysicsConfig, PhysicsWorld,
};

pub use ecs::prelude::*;

/// Everything needed to build and step a scene.
pub mod prelude {
    pub use crate::cloth::{Cloth, ClothConfig};
    pub use crate::ecs::prelude::*;
    pub use crate::error::{PhysicsError, Result};
    pub use crate::physics::{
        broadphase::BroadphaseMode,
        shape::{ConvexHull, Shape, ShapeKind},
        solver::{ImpulseSolver, PositionSolver, Solver},
        GroundConfig, PhysicsConfig, PhysicsWorld,
    };
    pub use glam::{Mat3, Quat, Vec3};
}

// Re-export glam for convenience
pub use glam;
