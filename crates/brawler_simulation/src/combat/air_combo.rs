//! Air combo: a short 3-hit chain available after the double jump
//!
//! Arms exactly once per airborne period, once the double jump has been
//! spent. Stages are reported to the hit detector offset by 10 (11..13)
//! so weapon tables can tune them apart from ground stages. Each stage
//! refreshes a small upward + forward impulse, keeping the attacker
//! afloat; stage ends are deferred through the action scheduler. Landing
//! cancels and resets everything.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combat::combo::{AttackStageEnded, AttackStageStarted};
use crate::combat::knockdown::KnockdownState;
use crate::combat::scheduler::{ActionScheduler, DeferredAction};
use crate::components::{Facing, InputSnapshot, PhysicsBody, StaggerState};
use crate::physics::jump::JumpState;
use crate::physics::movement::KinematicController;

#[derive(Component, Debug, Clone, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct AirComboConfig {
    /// Chain window between air hits
    pub window: f32,
    pub initial_delay: f32,
    pub chain_delay: f32,
    /// Per-hit attacker impulse keeping the juggle airborne
    pub vertical_impulse: f32,
    pub forward_impulse: f32,
    /// Stage end is scheduled this long after the stage starts
    pub stage_end_delay: f32,
    /// Hit-detector stage numbering offset (air stage N reports as offset + N)
    pub stage_offset: i32,
    pub max_stages: i32,
}

impl Default for AirComboConfig {
    fn default() -> Self {
        Self {
            window: 0.5,
            initial_delay: 0.05,
            chain_delay: 0.05,
            vertical_impulse: 2.2,
            forward_impulse: 1.4,
            stage_end_delay: 0.3,
            stage_offset: 10,
            max_stages: 3,
        }
    }
}

#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct AirComboState {
    /// Ready to accept air attacks (set once per airborne period)
    pub armed: bool,
    /// A chain is running (gates ground combo input)
    pub combo_active: bool,
    /// Last executed stage, 1..max_stages (0 = none)
    pub stage: i32,
    window_timer: f32,
    queued: Option<f32>,
    used_this_airborne: bool,
}

impl AirComboState {
    pub fn reported_stage(&self, config: &AirComboConfig) -> i32 {
        config.stage_offset + self.stage
    }

    fn reset(&mut self) {
        self.armed = false;
        self.combo_active = false;
        self.stage = 0;
        self.window_timer = 0.0;
        self.queued = None;
        self.used_this_airborne = false;
    }
}

/// System: arming, chain window, input consumption, per-hit impulses
pub fn tick_air_combos(
    time: Res<Time>,
    mut query: Query<(
        Entity,
        &AirComboConfig,
        &InputSnapshot,
        &Facing,
        &JumpState,
        &StaggerState,
        Option<&KnockdownState>,
        &mut KinematicController,
        &mut PhysicsBody,
        &mut AirComboState,
    )>,
    mut scheduler: ResMut<ActionScheduler>,
    mut started: EventWriter<AttackStageStarted>,
    mut ended: EventWriter<AttackStageEnded>,
) {
    let delta = time.delta_secs();
    let now = time.elapsed_secs();

    for (
        entity,
        config,
        input,
        facing,
        jump,
        stagger,
        knockdown,
        mut controller,
        mut body,
        mut state,
    ) in query.iter_mut()
    {
        // Landing cancels the chain and re-locks arming
        if controller.grounded {
            if state.combo_active {
                ended.write(AttackStageEnded {
                    entity,
                    stage: state.reported_stage(config),
                    is_air: true,
                });
            }
            state.reset();
            continue;
        }

        if !state.armed
            && !state.used_this_airborne
            && jump.double_jumped_this_airborne
        {
            state.armed = true;
            crate::logger::log(&format!("AirCombo: {:?} armed after double jump", entity));
        }

        // Chain window
        if state.combo_active {
            state.window_timer -= delta;
            if state.window_timer <= 0.0 {
                state.combo_active = false;
                state.queued = None;
            }
        }

        let incapacitated =
            stagger.is_staggered() || knockdown.is_some_and(|k| k.knocked_down || k.dead);

        if input.attack_pressed
            && state.armed
            && !incapacitated
            && state.stage < config.max_stages
        {
            let delay = if state.stage == 0 {
                config.initial_delay
            } else {
                config.chain_delay
            };
            state.queued = Some(delay); // Single slot, latest press wins
        }

        // Consume the queued hit after its delay
        let Some(remaining) = state.queued else {
            continue;
        };
        let remaining = remaining - delta;
        if remaining > 0.0 {
            state.queued = Some(remaining);
            continue;
        }
        state.queued = None;
        if incapacitated || state.stage >= config.max_stages {
            continue;
        }

        state.stage += 1;
        state.combo_active = true;
        state.used_this_airborne = true;
        state.window_timer = config.window;

        // Refresh the juggle: small hop up, drift toward facing
        body.velocity.y = config.vertical_impulse;
        let planar = facing.forward.normalize_or_zero() * config.forward_impulse;
        body.velocity.x = planar.x;
        body.velocity.z = planar.z;
        controller.grounded = false;

        let stage = state.reported_stage(config);
        started.write(AttackStageStarted {
            entity,
            stage,
            is_air: true,
        });
        scheduler.schedule(
            now + config.stage_end_delay,
            DeferredAction::EndAirStage { attacker: entity, stage },
        );
    }
}
