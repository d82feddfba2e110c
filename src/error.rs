//! Error type for API misuse.
//!
//! Geometric failures (separated shapes, degenerate EPA polytopes, broken cloth
//! links) are not errors: they surface as `None` results or state flags.

use thiserror::Error;

/// Errors reported by world, cloth and shape construction APIs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    /// The handle does not refer to a body owned by this world.
    #[error("body {0:?} is not registered in this world")]
    UnknownBody(hecs::Entity),

    /// Step durations must be finite and non-negative.
    #[error("timestep must be finite and non-negative, got {0}")]
    InvalidTimestep(f32),

    /// A configuration value is out of its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A cloth link referenced a particle that does not exist.
    #[error("particle index {index} out of range ({count} particles)")]
    InvalidParticle { index: usize, count: usize },

    /// A hull face referenced a vertex that does not exist.
    #[error("hull index {index} out of range ({count} vertices)")]
    InvalidHullIndex { index: u32, count: usize },
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = PhysicsError> = std::result::Result<T, E>;
