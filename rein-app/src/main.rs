use std::sync::Arc;

use anyhow::Context;
use glam::{Quat, Vec3};
use rein_physics::prelude::*;

/// Fixed simulation rate of the demo.
const STEP: f32 = 1.0 / 60.0;
const FRAMES: u32 = 300;

struct DemoApp {
    physics: PhysicsWorld,
    cloth: Cloth,
    cubes: Vec<BodyHandle>,
}

impl DemoApp {
    fn init() -> anyhow::Result<Self> {
        let mut physics = PhysicsWorld::new(PhysicsConfig {
            substeps: 2,
            broadphase: BroadphaseMode::KdTree { radius: 3.0 },
            ..PhysicsConfig::default()
        })
        .context("failed to create physics world")?;
        physics.add_solver(Box::new(ImpulseSolver::new()));
        physics.add_solver(Box::new(PositionSolver::new()));

        // Two cubes, the upper one tilted so it tumbles off the lower.
        let cube = Arc::new(Shape::hull(ConvexHull::cuboid(Vec3::splat(0.5))));
        let cubes = vec![
            physics.add_body(
                Body::dynamic(1.0)
                    .with_position(Vec3::new(0.0, 1.0, 0.0))
                    .with_shape(cube.clone()),
            )?,
            physics.add_body(
                Body::dynamic(1.0)
                    .with_position(Vec3::new(0.3, 3.0, 0.0))
                    .with_rotation(Quat::from_rotation_z(0.4))
                    .with_shape(cube),
            )?,
        ];

        let cloth = Cloth::grid(ClothConfig {
            columns: 30,
            rows: 15,
            ..ClothConfig::default()
        })
        .context("failed to create cloth")?;

        Ok(Self {
            physics,
            cloth,
            cubes,
        })
    }

    fn update(&mut self, frame: u32) -> anyhow::Result<()> {
        self.physics.step(STEP)?;
        self.cloth.update(STEP);

        if frame % 60 == 0 {
            for (i, &cube) in self.cubes.iter().enumerate() {
                let pose = self.physics.pose(cube)?;
                log::info!(
                    "frame {frame}: cube {i} at ({:.3}, {:.3}, {:.3})",
                    pose.position.x,
                    pose.position.y,
                    pose.position.z
                );
            }
            let lowest = self
                .cloth
                .particles()
                .iter()
                .map(|p| p.position.y)
                .fold(f32::INFINITY, f32::min);
            log::info!(
                "frame {frame}: {} contacts, cloth has {} links, lowest particle y = {lowest:.1}",
                self.physics.contacts().len(),
                self.cloth.links().len()
            );
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut app = DemoApp::init()?;
    for frame in 0..FRAMES {
        app.update(frame)?;
    }

    for pose in app.physics.render_poses() {
        log::info!("{:?} {:?} at {}", pose.body, pose.kind, pose.pose.position);
    }
    Ok(())
}
