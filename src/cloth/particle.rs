//! Cloth particle.

use glam::Vec3;

/// A point mass of a cloth.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    /// Position at the start of the current update.
    pub previous_position: Vec3,
    pub velocity: Vec3,
    /// Force accumulator, cleared at the end of every update.
    pub force: Vec3,
    pub mass: f32,
    /// Pinned particles never move.
    pub pinned: bool,
}

impl Particle {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            previous_position: position,
            velocity: Vec3::ZERO,
            force: Vec3::ZERO,
            mass: 1.0,
            pinned: false,
        }
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    /// Zero for pinned or massless particles.
    #[inline]
    pub fn inverse_mass(&self) -> f32 {
        if self.pinned || self.mass <= 0.0 {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    /// Semi-implicit Euler step. Remembers the starting position.
    pub fn integrate(&mut self, dt: f32) {
        if self.pinned {
            return;
        }
        self.previous_position = self.position;
        self.velocity += self.force * self.inverse_mass() * dt;
        self.position += self.velocity * dt;
    }

    /// Derive the velocity from the displacement of this update and clear forces.
    pub fn update_velocity(&mut self, dt: f32) {
        self.velocity = (self.position - self.previous_position) / dt;
        self.force = Vec3::ZERO;
    }

    /// Move by `delta` unless pinned.
    #[inline]
    pub fn displace(&mut self, delta: Vec3) {
        if !self.pinned {
            self.position += delta;
        }
    }
}
