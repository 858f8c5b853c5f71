//! Physics layer: kinematic movement, jumps, collision groups
//!
//! Architecture:
//! - Rapier for collisions (RigidBody::KinematicPositionBased)
//! - Custom velocity integration (no Rapier forces)
//! - Determinism: fixed timestep (60Hz), deterministic Rapier build

pub mod collision;
pub mod jump;
pub mod movement;

pub use jump::{JumpConfig, JumpState};
pub use movement::{
    launch_velocity_for_height, spawn_fighter, KinematicController, KinematicControllerPlugin,
};
