//! Particle and link cloth simulation.
//!
//! Independent of [`PhysicsWorld`](crate::physics::PhysicsWorld): a cloth
//! owns its particles and links and is advanced by [`Cloth::update`].
//!
//! Each update:
//!
//! 1. Purge links that tore during the previous update
//! 2. Accumulate gravity and linear air drag
//! 3. Integrate free particles (semi-implicit Euler)
//! 4. Relax all links in list order, `relaxation_iterations` times
//! 5. Derive velocities from the displacement and clear forces

pub mod link;
pub mod particle;

use glam::Vec3;
use tracing::{debug, info};

use crate::error::{PhysicsError, Result};

pub use link::{LinkConstraint, DEFAULT_MAX_ELONGATION_RATIO};
pub use particle::Particle;

/// Default number of relaxation passes per update.
pub const CLOTH_RELAXATION_ITERATIONS: u32 = 32;

/// Cloth parameters. The grid fields are only used by [`Cloth::grid`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClothConfig {
    /// Particles per row. Default: 60.
    pub columns: u32,
    /// Number of rows. Default: 30.
    pub rows: u32,
    /// Rest spacing between neighbouring particles. Default: 20.
    pub link_length: f32,
    /// Default: 1.
    pub particle_mass: f32,
    /// Gravity acceleration. Default: 1500 downward.
    pub gravity: Vec3,
    /// Linear drag coefficient, `force -= velocity * air_friction`. Default: 0.5.
    pub air_friction: f32,
    /// Default: [`CLOTH_RELAXATION_ITERATIONS`].
    pub relaxation_iterations: u32,
}

impl Default for ClothConfig {
    fn default() -> Self {
        Self {
            columns: 60,
            rows: 30,
            link_length: 20.0,
            particle_mass: 1.0,
            gravity: Vec3::new(0.0, -1500.0, 0.0),
            air_friction: 0.5,
            relaxation_iterations: CLOTH_RELAXATION_ITERATIONS,
        }
    }
}

impl ClothConfig {
    pub fn validate(&self) -> Result<()> {
        if self.columns == 0 || self.rows == 0 {
            return Err(PhysicsError::InvalidConfig(format!(
                "cloth grid must be at least 1x1, got {}x{}",
                self.columns, self.rows
            )));
        }
        if !(self.link_length.is_finite() && self.link_length > 0.0) {
            return Err(PhysicsError::InvalidConfig(format!(
                "link length must be positive, got {}",
                self.link_length
            )));
        }
        if !(self.particle_mass.is_finite() && self.particle_mass > 0.0) {
            return Err(PhysicsError::InvalidConfig(format!(
                "particle mass must be positive, got {}",
                self.particle_mass
            )));
        }
        if !self.gravity.is_finite() {
            return Err(PhysicsError::InvalidConfig("cloth gravity must be finite".into()));
        }
        if !(self.air_friction.is_finite() && self.air_friction >= 0.0) {
            return Err(PhysicsError::InvalidConfig(format!(
                "air friction must be non-negative, got {}",
                self.air_friction
            )));
        }
        if self.relaxation_iterations == 0 {
            return Err(PhysicsError::InvalidConfig(
                "relaxation iterations must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Break ratio of the vertical links leaving `row`. Links near the pinned
/// top carry more weight and are allowed to stretch further.
fn vertical_elongation_ratio(row: u32, rows: u32) -> f32 {
    1.2 * (2.0 - row as f32 / rows as f32)
}

/// A cloth: particles joined by tearable links.
#[derive(Debug, Clone)]
pub struct Cloth {
    config: ClothConfig,
    particles: Vec<Particle>,
    links: Vec<LinkConstraint>,
}

impl Default for Cloth {
    fn default() -> Self {
        Self::new()
    }
}

impl Cloth {
    /// An empty cloth with default parameters.
    pub fn new() -> Self {
        Self {
            config: ClothConfig::default(),
            particles: Vec::new(),
            links: Vec::new(),
        }
    }

    /// An empty cloth using the physical parameters of `config`.
    pub fn from_config(config: ClothConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            particles: Vec::new(),
            links: Vec::new(),
        })
    }

    /// A `columns x rows` sheet hanging from its pinned top row, centered on x = 0
    /// with rows extending downward from y = 0.
    pub fn grid(config: ClothConfig) -> Result<Self> {
        let mut cloth = Self::from_config(config)?;
        let ClothConfig {
            columns,
            rows,
            link_length,
            ..
        } = cloth.config;
        let start_x = -((columns - 1) as f32 * link_length) * 0.5;

        cloth.particles.reserve((columns * rows) as usize);
        for row in 0..rows {
            let ratio = vertical_elongation_ratio(row, rows);
            for column in 0..columns {
                let id = cloth.add_particle(Vec3::new(
                    start_x + column as f32 * link_length,
                    -(row as f32) * link_length,
                    0.0,
                ));
                if column > 0 {
                    cloth.add_link(id - 1, id, ratio * 0.9)?;
                }
                if row > 0 {
                    cloth.add_link(id - columns as usize, id, ratio)?;
                } else {
                    cloth.pin(id)?;
                }
            }
        }

        info!(
            particles = cloth.particles.len(),
            links = cloth.links.len(),
            "cloth created"
        );
        Ok(cloth)
    }

    pub fn config(&self) -> &ClothConfig {
        &self.config
    }

    /// Add a free particle and return its index.
    pub fn add_particle(&mut self, position: Vec3) -> usize {
        self.particles
            .push(Particle::new(position).with_mass(self.config.particle_mass));
        self.particles.len() - 1
    }

    /// Link two particles. The rest length is their current distance.
    pub fn add_link(&mut self, a: usize, b: usize, max_elongation_ratio: f32) -> Result<usize> {
        let pa = self.particle(a)?.position;
        let pb = self.particle(b)?.position;
        self.links
            .push(LinkConstraint::new(a, b, pa.distance(pb), max_elongation_ratio));
        Ok(self.links.len() - 1)
    }

    pub fn pin(&mut self, index: usize) -> Result<()> {
        let particle = self.particle_mut(index)?;
        particle.pinned = true;
        particle.velocity = Vec3::ZERO;
        particle.previous_position = particle.position;
        Ok(())
    }

    pub fn unpin(&mut self, index: usize) -> Result<()> {
        self.particle_mut(index)?.pinned = false;
        Ok(())
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn links(&self) -> &[LinkConstraint] {
        &self.links
    }

    /// Advance the cloth by `dt`. Non-positive or non-finite `dt` does nothing.
    pub fn update(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }

        let before = self.links.len();
        self.links.retain(|link| !link.is_broken());
        let purged = before - self.links.len();

        let gravity = self.config.gravity;
        let air_friction = self.config.air_friction;
        for particle in &mut self.particles {
            particle.force += gravity * particle.mass;
            particle.force -= particle.velocity * air_friction;
            particle.integrate(dt);
        }

        let mut torn = 0;
        for _ in 0..self.config.relaxation_iterations {
            for link in &mut self.links {
                if link.solve(&mut self.particles) {
                    torn += 1;
                }
            }
        }

        for particle in &mut self.particles {
            particle.update_velocity(dt);
        }

        debug!(purged, torn, links = self.links.len(), "cloth updated");
    }

    fn particle(&self, index: usize) -> Result<&Particle> {
        let count = self.particles.len();
        self.particles
            .get(index)
            .ok_or(PhysicsError::InvalidParticle { index, count })
    }

    fn particle_mut(&mut self, index: usize) -> Result<&mut Particle> {
        let count = self.particles.len();
        self.particles
            .get_mut(index)
            .ok_or(PhysicsError::InvalidParticle { index, count })
    }
}
