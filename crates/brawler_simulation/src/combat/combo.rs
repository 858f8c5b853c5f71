//! Ground combo state machine
//!
//! Stages 1..3 chain while the reset window is open; an uppercut override
//! (stage 4) is triggered by up-input + attack buffered together and is
//! valid from idle or chained after stage 2. Requests are single-slot
//! buffered: a new press overwrites the pending one.
//!
//! Stage lifecycle is event-driven: AttackStageStarted arms the weapon
//! hitbox, AttackStageEnded disarms it. An interrupted stage (chain into
//! the next stage, landing, stagger, dash) still emits its end event so
//! arming always pairs.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combat::air_combo::AirComboState;
use crate::combat::dash::DashState;
use crate::combat::knockdown::KnockdownState;
use crate::components::{InputSnapshot, StaggerState};
use crate::physics::jump::JumpState;
use crate::physics::movement::KinematicController;

/// Event: an attack stage became active (hitboxes arm on this)
#[derive(Event, Debug, Clone, Copy)]
pub struct AttackStageStarted {
    pub entity: Entity,
    pub stage: i32,
    pub is_air: bool,
}

/// Event: an attack stage stopped being active (naturally or interrupted)
#[derive(Event, Debug, Clone, Copy)]
pub struct AttackStageEnded {
    pub entity: Entity,
    pub stage: i32,
    pub is_air: bool,
}

/// Combo tuning
#[derive(Component, Debug, Clone, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct ComboConfig {
    /// Active window of one stage (seconds)
    pub stage_duration: f32,
    /// Chain window after a stage ends; expiry drops the combo back to idle
    pub reset_window: f32,
    /// Consumption delay for the first attack of a chain
    pub initial_attack_delay: f32,
    /// Consumption delay for follow-up attacks
    pub chain_delay: f32,
    /// Ground combos may start airborne while the double jump is unspent
    pub allow_air_start: bool,

    // Uppercut override
    pub uppercut_stage: i32,
    /// Minimum up-input to count as an uppercut direction
    pub uppercut_min_vertical_input: f32,
    /// Window in which attack + up inputs pair up
    pub uppercut_buffer_window: f32,
    pub uppercut_cooldown: f32,
    pub uppercut_require_grounded: bool,
    /// Coyote window: recently-grounded still satisfies the ground requirement
    pub ground_grace_seconds: f32,
    /// Launch tuning consulted by the hit detector for the uppercut stage
    pub uppercut_launch_velocity: f32,
    pub uppercut_max_launch_height: f32,
    pub uppercut_launch_delay: f32,

    /// Frames after landing during which new requests are rejected
    pub landing_lockout_frames: u32,
}

impl Default for ComboConfig {
    fn default() -> Self {
        Self {
            stage_duration: 0.35,
            reset_window: 0.6,
            initial_attack_delay: 0.06,
            chain_delay: 0.05,
            allow_air_start: true,
            uppercut_stage: 4,
            uppercut_min_vertical_input: 0.5,
            uppercut_buffer_window: 0.3,
            uppercut_cooldown: 0.2,
            uppercut_require_grounded: true,
            ground_grace_seconds: 0.12,
            uppercut_launch_velocity: 12.0,
            uppercut_max_launch_height: 7.0,
            uppercut_launch_delay: 0.3,
            landing_lockout_frames: 10,
        }
    }
}

/// Pending stage override (uppercut)
#[derive(Debug, Clone, Copy, Reflect)]
pub struct StageOverride {
    pub stage: i32,
    pub force_air: bool,
    pub from_combo: bool,
}

/// Combo state machine
///
/// Invariants: stage_timer > 0 ⇒ stage ∈ [1, uppercut_stage];
/// stage == 0 ⇒ stage_timer == 0. The stage value may outlive its timer
/// while the chain window is open.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct ComboState {
    /// 0 = idle, 1..3 = ground chain, uppercut_stage = override
    pub stage: i32,
    pub stage_timer: f32,
    /// The active stage started airborne (cancelled on landing)
    pub stage_is_air: bool,
    /// Chain window; pinned to the full window while a stage is active
    pub reset_timer: f32,
    /// The active uppercut was chained after stage 2 (launch tuning source)
    pub uppercut_from_combo: bool,

    /// One-slot request buffer, value is the remaining consumption delay
    queued: Option<f32>,
    override_next: Option<StageOverride>,

    // Uppercut input pairing
    attack_buffer: f32,
    up_buffer: f32,
    ground_grace: f32,
    uppercut_cooldown: f32,

    pub landing_lockout_frames: u32,
    was_airborne: bool,
}

impl ComboState {
    pub fn is_attacking(&self) -> bool {
        self.stage_timer > 0.0
    }

    pub fn chain_window_open(&self) -> bool {
        self.reset_timer > 0.0 && self.stage > 0
    }

    /// Queues an attack request, overwriting any pending one
    pub fn request_attack(&mut self, config: &ComboConfig) {
        let delay = if self.stage == 0 {
            config.initial_attack_delay
        } else {
            config.chain_delay
        };
        self.queued = Some(delay);
    }

    pub fn request_stage_override(&mut self, override_next: StageOverride) {
        self.override_next = Some(override_next);
    }

    /// Cuts the active stage short without touching the chain window.
    /// Returns the interrupted (stage, is_air) for the end event.
    pub fn interrupt_stage(&mut self) -> Option<(i32, bool)> {
        if !self.is_attacking() {
            return None;
        }
        self.stage_timer = 0.0;
        Some((self.stage, self.stage_is_air))
    }

    /// Cancels the attack and the whole chain (landing, stagger, dash)
    pub fn cancel(&mut self) -> Option<(i32, bool)> {
        let ended = self.interrupt_stage();
        self.stage = 0;
        self.reset_timer = 0.0;
        self.queued = None;
        self.override_next = None;
        self.uppercut_from_combo = false;
        ended
    }

    /// Starts the next stage: a pending override wins, otherwise the chain
    /// continues while the window is open (1 → 2 → 3) or restarts at 1.
    pub fn begin_stage(&mut self, config: &ComboConfig, grounded: bool) -> (i32, bool) {
        let (stage, is_air, from_combo) = match self.override_next.take() {
            Some(o) => (
                o.stage.clamp(1, config.uppercut_stage),
                o.force_air || !grounded,
                o.from_combo,
            ),
            None => {
                let next = if self.chain_window_open() && self.stage < 3 {
                    self.stage + 1
                } else {
                    1
                };
                (next, !grounded, false)
            }
        };

        self.stage = stage;
        self.stage_timer = config.stage_duration;
        self.stage_is_air = is_air;
        self.reset_timer = config.reset_window;
        self.uppercut_from_combo = from_combo && stage == config.uppercut_stage;
        (stage, is_air)
    }

    /// Natural stage end. Stage 3 and the uppercut close the chain; earlier
    /// stages keep it open for the reset window.
    pub fn finish_stage(&mut self, config: &ComboConfig) -> (i32, bool) {
        let ended = (self.stage, self.stage_is_air);
        self.stage_timer = 0.0;
        self.uppercut_from_combo = false;
        if self.stage >= 3 {
            self.stage = 0;
            self.reset_timer = 0.0;
        } else {
            self.reset_timer = config.reset_window;
        }
        ended
    }

    /// Uppercut is valid from idle or right after stage 2, off cooldown,
    /// standing (or within the coyote window)
    pub fn uppercut_ready(&self, config: &ComboConfig) -> bool {
        if self.uppercut_cooldown > 0.0 {
            return false;
        }
        if self.stage != 0 && self.stage != 2 {
            return false;
        }
        !config.uppercut_require_grounded || self.ground_grace > 0.0
    }
}

/// System: combo timers, landing/stagger interruption, input consumption
pub fn tick_combos(
    time: Res<Time>,
    mut query: Query<(
        Entity,
        &ComboConfig,
        &InputSnapshot,
        &KinematicController,
        &JumpState,
        &StaggerState,
        Option<&KnockdownState>,
        Option<&DashState>,
        Option<&AirComboState>,
        &mut ComboState,
    )>,
    mut started: EventWriter<AttackStageStarted>,
    mut ended: EventWriter<AttackStageEnded>,
) {
    let delta = time.delta_secs();

    for (entity, config, input, controller, jump, stagger, knockdown, dash, air_combo, mut state) in
        query.iter_mut()
    {
        let grounded = controller.grounded;

        // Input-pairing buffers
        state.attack_buffer = (state.attack_buffer - delta).max(0.0);
        state.up_buffer = (state.up_buffer - delta).max(0.0);
        state.uppercut_cooldown = (state.uppercut_cooldown - delta).max(0.0);
        state.ground_grace = if grounded {
            config.ground_grace_seconds
        } else {
            (state.ground_grace - delta).max(0.0)
        };

        // Landing: cancel an airborne-started stage, short input lockout
        if grounded && state.was_airborne {
            if state.is_attacking() && state.stage_is_air {
                if let Some((stage, is_air)) = state.cancel() {
                    ended.write(AttackStageEnded { entity, stage, is_air });
                    crate::logger::log(&format!(
                        "Combo: {:?} landing cancelled air stage {}",
                        entity, stage
                    ));
                }
            }
            state.landing_lockout_frames = config.landing_lockout_frames;
        } else if grounded && state.landing_lockout_frames > 0 {
            state.landing_lockout_frames -= 1;
        }
        state.was_airborne = !grounded;

        // Stagger interrupts the active stage immediately
        if stagger.is_staggered() && state.is_attacking() {
            if let Some((stage, is_air)) = state.cancel() {
                ended.write(AttackStageEnded { entity, stage, is_air });
            }
        }

        // Stage lifecycle
        if state.is_attacking() {
            state.reset_timer = config.reset_window;
            state.stage_timer -= delta;
            if state.stage_timer <= 0.0 {
                let (stage, is_air) = state.finish_stage(config);
                ended.write(AttackStageEnded { entity, stage, is_air });
            }
        } else if state.reset_timer > 0.0 {
            state.reset_timer -= delta;
            if state.reset_timer <= 0.0 {
                state.reset_timer = 0.0;
                state.stage = 0;
            }
        }

        let incapacitated = stagger.is_staggered()
            || knockdown.is_some_and(|k| k.knocked_down || k.dead)
            || dash.is_some_and(|d| d.is_dashing())
            || air_combo.is_some_and(|a| a.combo_active)
            || state.landing_lockout_frames > 0;

        if input.vertical_aim >= config.uppercut_min_vertical_input {
            state.up_buffer = config.uppercut_buffer_window;
        }

        if input.attack_pressed && !incapacitated {
            // Airborne ground-combo starts ride on the unspent double jump
            let can_start = grounded || (config.allow_air_start && jump.can_double_jump(true));
            if can_start {
                state.attack_buffer = config.uppercut_buffer_window;
                state.request_attack(config);
            }
        }

        // Attack + up paired within the buffer window: uppercut override,
        // started immediately (no consumption delay)
        if state.attack_buffer > 0.0
            && state.up_buffer > 0.0
            && !incapacitated
            && state.uppercut_ready(config)
        {
            let from_combo = state.stage == 2;
            state.queued = None;
            state.attack_buffer = 0.0;
            state.up_buffer = 0.0;
            state.uppercut_cooldown = config.uppercut_cooldown;
            state.request_stage_override(StageOverride {
                stage: config.uppercut_stage,
                force_air: false,
                from_combo,
            });

            if let Some((stage, is_air)) = state.interrupt_stage() {
                ended.write(AttackStageEnded { entity, stage, is_air });
            }
            let (stage, is_air) = state.begin_stage(config, grounded);
            started.write(AttackStageStarted { entity, stage, is_air });
            crate::logger::log(&format!(
                "Combo: {:?} uppercut (from_combo: {})",
                entity, from_combo
            ));
            continue;
        }

        // Consume the queued request after its delay
        if let Some(remaining) = state.queued {
            let remaining = remaining - delta;
            if remaining > 0.0 {
                state.queued = Some(remaining);
            } else {
                state.queued = None;
                if !incapacitated {
                    if let Some((stage, is_air)) = state.interrupt_stage() {
                        ended.write(AttackStageEnded { entity, stage, is_air });
                    }
                    let (stage, is_air) = state.begin_stage(config, grounded);
                    started.write(AttackStageStarted { entity, stage, is_air });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_progression_1_2_3_then_idle() {
        let config = ComboConfig::default();
        let mut state = ComboState::default();

        let (stage, _) = state.begin_stage(&config, true);
        assert_eq!(stage, 1);
        state.finish_stage(&config);
        assert!(state.chain_window_open());

        let (stage, _) = state.begin_stage(&config, true);
        assert_eq!(stage, 2);
        state.finish_stage(&config);

        let (stage, _) = state.begin_stage(&config, true);
        assert_eq!(stage, 3);
        let (ended, _) = state.finish_stage(&config);
        assert_eq!(ended, 3);

        // Stage 3 closes the chain
        assert_eq!(state.stage, 0);
        assert!(!state.chain_window_open());

        let (stage, _) = state.begin_stage(&config, true);
        assert_eq!(stage, 1);
    }

    #[test]
    fn test_expired_window_restarts_at_one() {
        let config = ComboConfig::default();
        let mut state = ComboState::default();

        state.begin_stage(&config, true);
        state.finish_stage(&config);
        assert_eq!(state.stage, 1);

        // Window expiry drops back to idle
        state.reset_timer = 0.0;
        state.stage = 0;

        let (stage, _) = state.begin_stage(&config, true);
        assert_eq!(stage, 1);
    }

    #[test]
    fn test_override_wins_over_chain() {
        let config = ComboConfig::default();
        let mut state = ComboState::default();

        state.begin_stage(&config, true);
        state.finish_stage(&config);
        state.request_stage_override(StageOverride {
            stage: config.uppercut_stage,
            force_air: false,
            from_combo: true,
        });

        let (stage, is_air) = state.begin_stage(&config, true);
        assert_eq!(stage, 4);
        assert!(!is_air);
        assert!(state.uppercut_from_combo);

        // Consumed: the next start chains normally
        state.finish_stage(&config);
        assert!(!state.uppercut_from_combo);
        let (stage, _) = state.begin_stage(&config, true);
        assert_eq!(stage, 1);
    }

    #[test]
    fn test_airborne_start_marks_stage_air() {
        let config = ComboConfig::default();
        let mut state = ComboState::default();

        let (_, is_air) = state.begin_stage(&config, false);
        assert!(is_air);
        assert!(state.stage_is_air);
    }

    #[test]
    fn test_cancel_clears_queue_and_chain() {
        let config = ComboConfig::default();
        let mut state = ComboState::default();

        state.begin_stage(&config, true);
        state.request_attack(&config);

        let ended = state.cancel();
        assert_eq!(ended, Some((1, false)));
        assert_eq!(state.stage, 0);
        assert!(state.queued.is_none());
        assert!(!state.is_attacking());
    }

    #[test]
    fn test_uppercut_ready_gating() {
        let config = ComboConfig::default();
        let mut state = ComboState {
            ground_grace: 0.1,
            ..default()
        };

        assert!(state.uppercut_ready(&config)); // Idle, grounded recently

        state.stage = 1;
        assert!(!state.uppercut_ready(&config)); // Only idle or after stage 2

        state.stage = 2;
        assert!(state.uppercut_ready(&config));

        state.uppercut_cooldown = 0.1;
        assert!(!state.uppercut_ready(&config));

        state.uppercut_cooldown = 0.0;
        state.ground_grace = 0.0;
        assert!(!state.uppercut_ready(&config)); // Ground requirement

        let mut airborne_ok = config.clone();
        airborne_ok.uppercut_require_grounded = false;
        assert!(state.uppercut_ready(&airborne_ok));
    }

    #[test]
    fn test_new_request_overwrites_pending() {
        let config = ComboConfig::default();
        let mut state = ComboState::default();

        state.request_attack(&config);
        assert_eq!(state.queued, Some(config.initial_attack_delay));

        state.begin_stage(&config, true);
        state.request_attack(&config);
        // Single slot, chain delay replaces the initial delay
        assert_eq!(state.queued, Some(config.chain_delay));
    }
}
