//! Contact data structures for collision response.

use glam::Vec3;

use crate::ecs::components::physics::BodyHandle;

/// A single contact between two shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactManifold {
    /// Deepest point of A inside B.
    pub point_a: Vec3,
    /// Deepest point of B inside A.
    pub point_b: Vec3,
    /// Unit contact normal, pointing from A towards B.
    pub normal: Vec3,
    /// Penetration depth.
    pub depth: f32,
    /// Contact location in world space, when the test produced one.
    pub contact_point: Option<Vec3>,
}

impl ContactManifold {
    /// Exchange the roles of A and B.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.point_a, &mut self.point_b);
        self.normal = -self.normal;
    }

    /// Contact location, falling back to the witness midpoint.
    #[inline]
    pub fn point(&self) -> Vec3 {
        self.contact_point
            .unwrap_or((self.point_a + self.point_b) * 0.5)
    }
}

/// A contact between two bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionPair {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub manifold: ContactManifold,
}

impl CollisionPair {
    pub fn new(body_a: BodyHandle, body_b: BodyHandle, manifold: ContactManifold) -> Self {
        Self {
            body_a,
            body_b,
            manifold,
        }
    }

    /// Order-independent key of the body pair.
    #[inline]
    pub fn key(&self) -> (u64, u64) {
        let a = self.body_a.to_bits().get();
        let b = self.body_b.to_bits().get();
        (a.min(b), a.max(b))
    }
}

/// Sort pairs by their unordered key and keep the first contact of each {A, B}.
pub fn dedup_pairs(pairs: &mut Vec<CollisionPair>) {
    pairs.sort_by_key(CollisionPair::key);
    pairs.dedup_by_key(|pair| pair.key());
}
