//! Dash: short burst of planar speed with input buffering
//!
//! The dash owns planar velocity while active and eases the speed out
//! quadratically over its duration. Starting a dash cancels the active
//! attack stage; knocked-down and staggered characters cannot dash.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combat::combo::{AttackStageEnded, ComboState};
use crate::combat::knockdown::KnockdownState;
use crate::components::{Facing, InputSnapshot, PhysicsBody, StaggerState};
use crate::physics::movement::KinematicController;

/// Event: dash started (animation/VFX cue)
#[derive(Event, Debug, Clone, Copy)]
pub struct DashStarted {
    pub entity: Entity,
    pub direction: Vec3,
}

#[derive(Component, Debug, Clone, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct DashConfig {
    pub speed: f32,
    pub duration: f32,
    pub cooldown: f32,
    /// Presses this close to readiness are honored when the cooldown ends
    pub buffer_window: f32,
    pub allow_air_dash: bool,
    /// Grounded dashes keep a small downward clamp so slopes don't drop the character
    pub grounded_vertical_clamp: f32,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            speed: 12.0,
            duration: 0.2,
            cooldown: 0.35,
            buffer_window: 0.12,
            allow_air_dash: false,
            grounded_vertical_clamp: -4.0,
        }
    }
}

#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct DashState {
    active_timer: f32,
    cooldown_timer: f32,
    buffer_timer: f32,
    direction: Vec3,
}

impl DashState {
    pub fn is_dashing(&self) -> bool {
        self.active_timer > 0.0
    }

    pub fn ready(&self) -> bool {
        self.cooldown_timer <= 0.0 && !self.is_dashing()
    }

    /// Eased planar speed: full speed at start, quadratic falloff to zero
    pub fn current_speed(&self, config: &DashConfig) -> f32 {
        if !self.is_dashing() || config.duration <= 0.0 {
            return 0.0;
        }
        let t = (self.active_timer / config.duration).clamp(0.0, 1.0);
        config.speed * t * t
    }
}

/// System: dash buffering, start, eased velocity, cooldown
pub fn update_dash(
    time: Res<Time>,
    mut query: Query<(
        Entity,
        &DashConfig,
        &InputSnapshot,
        &Facing,
        &KinematicController,
        &StaggerState,
        Option<&KnockdownState>,
        &mut ComboState,
        &mut DashState,
        &mut PhysicsBody,
    )>,
    mut started: EventWriter<DashStarted>,
    mut stage_ended: EventWriter<AttackStageEnded>,
) {
    let delta = time.delta_secs();

    for (
        entity,
        config,
        input,
        facing,
        controller,
        stagger,
        knockdown,
        mut combo,
        mut dash,
        mut body,
    ) in query.iter_mut()
    {
        dash.cooldown_timer = (dash.cooldown_timer - delta).max(0.0);
        dash.buffer_timer = (dash.buffer_timer - delta).max(0.0);

        if input.dash_pressed {
            dash.buffer_timer = config.buffer_window;
        }

        // Active dash owns planar velocity
        if dash.is_dashing() {
            dash.active_timer = (dash.active_timer - delta).max(0.0);
            let speed = dash.current_speed(config);
            body.velocity.x = dash.direction.x * speed;
            body.velocity.z = dash.direction.z * speed;
            if controller.grounded {
                body.velocity.y = body.velocity.y.max(config.grounded_vertical_clamp);
            }
            continue;
        }

        if dash.buffer_timer <= 0.0 || !dash.ready() {
            continue;
        }
        let blocked = stagger.is_staggered()
            || knockdown.is_some_and(|k| k.knocked_down || k.dead)
            || (!controller.grounded && !config.allow_air_dash);
        if blocked {
            continue;
        }

        // Start: move direction if any, otherwise facing
        let input_dir = Vec3::new(input.move_dir.x, 0.0, input.move_dir.y);
        let direction = if input_dir.length_squared() > 0.01 {
            input_dir.normalize()
        } else {
            facing.forward.normalize_or_zero()
        };
        if direction == Vec3::ZERO {
            continue;
        }

        dash.buffer_timer = 0.0;
        dash.active_timer = config.duration;
        dash.cooldown_timer = config.cooldown;
        dash.direction = direction;

        // Dash cancels the attack and drops the chain
        if let Some((stage, is_air)) = combo.cancel() {
            stage_ended.write(AttackStageEnded {
                entity,
                stage,
                is_air,
            });
        }

        body.velocity.x = direction.x * config.speed;
        body.velocity.z = direction.z * config.speed;
        started.write(DashStarted { entity, direction });
    }
}
