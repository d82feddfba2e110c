//! Shared setup helpers for rein-physics benchmarks.
//!
//! ## Running
//!
//!   cargo bench --manifest-path benchmarks/Cargo.toml --bench physics
//!
//! Filter by group:
//!   cargo bench --manifest-path benchmarks/Cargo.toml --bench physics -- kdtree
//!   cargo bench --manifest-path benchmarks/Cargo.toml --bench physics -- cloth

use std::sync::Arc;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rein_physics::cloth::{Cloth, ClothConfig};
use rein_physics::ecs::components::physics::Body;
use rein_physics::physics::broadphase::BroadphaseMode;
use rein_physics::physics::shape::{ConvexHull, Shape};
use rein_physics::physics::solver::ImpulseSolver;
use rein_physics::physics::{PhysicsConfig, PhysicsWorld};

// ---------------------------------------------------------------------------
// Point clouds
// ---------------------------------------------------------------------------

/// Seeded pseudo-random points in `[-extent, extent]^3`. Same seed, same cloud.
pub fn point_cloud(n: usize, extent: f32) -> Vec<Vec3> {
    let mut rng = StdRng::seed_from_u64(0x9E37_79B9_7F4A_7C15);
    (0..n)
        .map(|_| {
            Vec3::new(
                rng.gen_range(-extent..=extent),
                rng.gen_range(-extent..=extent),
                rng.gen_range(-extent..=extent),
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Scenes
// ---------------------------------------------------------------------------

/// Ground plane plus `n` dynamic bodies in a loose grid above it, alternating
/// spheres and hull cubes. The world has one impulse solver.
pub fn setup_scene(n: usize, broadphase: BroadphaseMode) -> PhysicsWorld {
    let config = PhysicsConfig {
        broadphase,
        ..PhysicsConfig::default()
    };
    let mut physics = PhysicsWorld::new(config).expect("benchmark scene config");
    physics.add_solver(Box::new(ImpulseSolver::new()));

    let sphere = Arc::new(Shape::sphere(Vec3::ZERO, 0.5));
    let cube = Arc::new(Shape::hull(ConvexHull::cuboid(Vec3::splat(0.5))));
    let cols = (n as f32).sqrt().ceil() as usize;

    for i in 0..n {
        let x = (i % cols) as f32 * 1.2;
        let z = (i / cols) as f32 * 1.2;
        let shape = if i % 2 == 0 { sphere.clone() } else { cube.clone() };
        physics
            .add_body(
                Body::dynamic(1.0)
                    .with_position(Vec3::new(x, 0.45 + (i % 3) as f32, z))
                    .with_shape(shape),
            )
            .expect("benchmark body");
    }
    physics
}

/// A `columns x rows` cloth with default physical parameters.
pub fn setup_cloth(columns: u32, rows: u32) -> Cloth {
    let config = ClothConfig {
        columns,
        rows,
        ..ClothConfig::default()
    };
    Cloth::grid(config).expect("benchmark cloth config")
}
