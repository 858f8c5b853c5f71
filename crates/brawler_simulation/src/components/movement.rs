//! Movement-side components: PhysicsBody, InputSnapshot

use bevy::prelude::*;

/// Custom velocity state (we integrate velocity ourselves, Rapier only collides)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct PhysicsBody {
    pub velocity: Vec3,
}

impl PhysicsBody {
    /// Sets upward velocity directly (launches, jumps)
    pub fn bump_vertical(&mut self, velocity: f32) {
        self.velocity.y = velocity;
    }
}

/// Per-frame input sampled by an outer layer (player devices, AI, tests)
///
/// `*_pressed` flags are edge-triggered and cleared at the end of every
/// frame tick; `block_held` and `move_dir` are level state.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct InputSnapshot {
    /// Planar movement, x = strafe, y = forward
    pub move_dir: Vec2,
    /// Vertical aim axis (stick up); pairs with attack for uppercuts
    pub vertical_aim: f32,
    pub attack_pressed: bool,
    pub jump_pressed: bool,
    pub dash_pressed: bool,
    pub block_held: bool,
}

impl InputSnapshot {
    pub fn clear_edges(&mut self) {
        self.attack_pressed = false;
        self.jump_pressed = false;
        self.dash_pressed = false;
    }
}

/// System: drop edge-triggered input at frame end so one press is one request
pub fn clear_input_edges(mut query: Query<&mut InputSnapshot>) {
    for mut input in query.iter_mut() {
        input.clear_edges();
    }
}
