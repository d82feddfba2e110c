//! Distance link between two cloth particles.

use super::particle::Particle;

/// Default break threshold of a link, as a multiple of its rest length.
pub const DEFAULT_MAX_ELONGATION_RATIO: f32 = 1.5;

/// A one-sided distance constraint: it only pulls stretched particles back
/// together and tears once stretched past `rest_length * max_elongation_ratio`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkConstraint {
    pub particle_a: usize,
    pub particle_b: usize,
    pub rest_length: f32,
    pub max_elongation_ratio: f32,
    /// Fraction of the stretch removed per relaxation pass.
    pub stiffness: f32,
    broken: bool,
}

impl LinkConstraint {
    pub fn new(
        particle_a: usize,
        particle_b: usize,
        rest_length: f32,
        max_elongation_ratio: f32,
    ) -> Self {
        Self {
            particle_a,
            particle_b,
            rest_length,
            max_elongation_ratio,
            stiffness: 1.0,
            broken: false,
        }
    }

    /// Once set this never clears.
    #[inline]
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// One relaxation pass.
    ///
    /// Returns `true` if the link tore during this call. The pass that tears
    /// a link still applies its correction.
    pub fn solve(&mut self, particles: &mut [Particle]) -> bool {
        if self.broken {
            return false;
        }
        let (Some(a), Some(b)) = (particles.get(self.particle_a), particles.get(self.particle_b))
        else {
            return false;
        };

        let delta = a.position - b.position;
        let length = delta.length();
        if length <= self.rest_length {
            return false;
        }

        self.broken = length > self.rest_length * self.max_elongation_ratio;

        let w_a = a.inverse_mass();
        let w_b = b.inverse_mass();
        let w = w_a + w_b;
        if w > 0.0 {
            let correction = delta / length * ((length - self.rest_length) * self.stiffness / w);
            particles[self.particle_a].displace(-correction * w_a);
            particles[self.particle_b].displace(correction * w_b);
        }
        self.broken
    }
}
