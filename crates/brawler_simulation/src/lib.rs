//! BRAWLER Simulation Core
//!
//! Headless combat simulation on Bevy 0.16: combo state machines,
//! directional guard, knockdown stamina, swept weapon hit detection and
//! a damage-resolution pipeline, deterministic at a fixed 60Hz physics
//! tick. Rendering, input devices and animation live in an outer layer
//! that feeds `InputSnapshot` and consumes the combat events.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Public modules
pub mod combat;
pub mod components;
pub mod health_sync;
pub mod logger;
pub mod physics;

// Re-export the base components for convenience
pub use combat::*;
pub use components::*;
pub use health_sync::{HealthSync, HealthSyncReceived};
pub use logger::{
    init_logger, log, log_error, log_info, log_warning, set_log_level, set_logger,
    set_logger_if_needed, LogLevel, LogPrinter,
};
pub use physics::{
    launch_velocity_for_height, spawn_fighter, JumpConfig, JumpState, KinematicController,
    KinematicControllerPlugin,
};

/// Main simulation plugin (bundles every subsystem)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz for the physics tick (easy interval math)
            .insert_resource(Time::<Fixed>::from_hz(60.0))
            // Deterministic RNG (default seed)
            .insert_resource(DeterministicRng::new(42))
            // Subsystems
            .add_plugins((CombatPlugin, KinematicControllerPlugin));
    }
}

/// Deterministic RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Creates a minimal Bevy App for headless simulation
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    logger::init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0)); // 60Hz FixedUpdate

    app
}
