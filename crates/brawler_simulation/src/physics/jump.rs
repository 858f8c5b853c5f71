//! Jumps: primary + double jump, tracked per airborne period
//!
//! The double-jump bookkeeping feeds combat rules: air combos arm only
//! after the double jump, and ground combos may start airborne only
//! while the double jump is still available.

use bevy::prelude::*;

use crate::combat::knockdown::KnockdownState;
use crate::components::{InputSnapshot, PhysicsBody, StaggerState};
use crate::physics::movement::KinematicController;

#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct JumpConfig {
    pub jump_velocity: f32,
    pub double_jump_velocity: f32,
    pub allow_double_jump: bool,
}

impl Default for JumpConfig {
    fn default() -> Self {
        Self {
            jump_velocity: 8.0,
            double_jump_velocity: 7.0,
            allow_double_jump: true,
        }
    }
}

/// Jump consumption state, reset on every landing
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct JumpState {
    pub primary_consumed: bool,
    pub double_consumed: bool,
    /// Latched for the whole airborne period once the double jump fires
    pub double_jumped_this_airborne: bool,
}

impl JumpState {
    pub fn can_double_jump(&self, airborne: bool) -> bool {
        airborne && !self.double_consumed
    }

    pub fn reset_on_landing(&mut self) {
        self.primary_consumed = false;
        self.double_consumed = false;
        self.double_jumped_this_airborne = false;
    }
}

/// System: jump input → vertical velocity
pub fn update_jumps(
    mut query: Query<(
        &InputSnapshot,
        &JumpConfig,
        &StaggerState,
        Option<&KnockdownState>,
        &mut JumpState,
        &mut KinematicController,
        &mut PhysicsBody,
    )>,
) {
    for (input, config, stagger, knockdown, mut state, mut controller, mut body) in
        query.iter_mut()
    {
        if controller.grounded {
            state.reset_on_landing();
        }

        if !input.jump_pressed {
            continue;
        }
        if stagger.is_staggered() || knockdown.is_some_and(|k| k.knocked_down || k.dead) {
            continue;
        }

        if controller.grounded {
            body.bump_vertical(config.jump_velocity);
            controller.grounded = false;
            state.primary_consumed = true;
        } else if config.allow_double_jump && state.can_double_jump(true) {
            body.bump_vertical(config.double_jump_velocity);
            state.double_consumed = true;
            state.double_jumped_this_airborne = true;
        }
    }
}
