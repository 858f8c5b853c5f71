//! ECS components shared across combat subsystems
//!
//! Organized by domain:
//! - actor: base characteristics (faction, health, facing)
//! - combat: hit reactions (StaggerState, Dead)
//! - movement: kinematic body state and per-frame input (PhysicsBody, InputSnapshot)

pub mod actor;
pub mod combat;
pub mod movement;

// Re-exports for convenient imports
pub use actor::*;
pub use combat::*;
pub use movement::*;
