//! ECS systems.

pub mod extract;

pub use extract::{extract_render_poses, RenderPose};
