//! Knockdown stamina: a second pool that buys poise
//!
//! Light and heavy hits drain it; exhaustion knocks the character down
//! for a fixed duration. Wake-up restores the pool in full and grants a
//! short invulnerability window, armed on knockdown entry so it covers
//! the whole downtime plus the recovery. Death converts the state into a
//! permanent knockdown.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Event: knocked down / stood up (animation cue)
#[derive(Event, Debug, Clone, Copy)]
pub struct KnockdownChanged {
    pub entity: Entity,
    pub down: bool,
}

#[derive(Component, Debug, Clone, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct KnockdownState {
    pub stamina: f32,
    pub stamina_max: f32,
    /// Regeneration while standing and alive
    pub regen_per_second: f32,
    pub light_hit_cost: f32,
    pub heavy_hit_cost: f32,
    pub knockdown_duration: f32,
    /// Invulnerability granted on wake-up; armed on entry as
    /// duration + this, so it spans the downtime and the recovery
    pub wake_up_invulnerability_duration: f32,

    pub knocked_down: bool,
    knockdown_timer: f32,
    invulnerability_timer: f32,
    pub dead: bool,
    /// Heaviness of the terminal hit (death animation selection)
    pub death_was_heavy: bool,
}

impl Default for KnockdownState {
    fn default() -> Self {
        Self {
            stamina: 100.0,
            stamina_max: 100.0,
            regen_per_second: 20.0,
            light_hit_cost: 15.0,
            heavy_hit_cost: 50.0,
            knockdown_duration: 2.0,
            wake_up_invulnerability_duration: 0.3,
            knocked_down: false,
            knockdown_timer: 0.0,
            invulnerability_timer: 0.0,
            dead: false,
            death_was_heavy: false,
        }
    }
}

impl KnockdownState {
    pub fn is_wake_up_invulnerable(&self) -> bool {
        self.invulnerability_timer > 0.0
    }

    /// Light hit drain. Returns true when this hit caused the knockdown.
    pub fn on_light_hit(&mut self) -> bool {
        self.on_hit(self.light_hit_cost)
    }

    /// Heavy hit drain. Returns true when this hit caused the knockdown.
    pub fn on_heavy_hit(&mut self) -> bool {
        self.on_hit(self.heavy_hit_cost)
    }

    fn on_hit(&mut self, cost: f32) -> bool {
        if self.dead || self.knocked_down {
            return false;
        }
        self.stamina = (self.stamina - cost).max(0.0);
        if self.stamina > 0.0 {
            return false;
        }
        self.enter_knockdown()
    }

    /// Idempotent: re-entry while already down changes nothing
    pub fn enter_knockdown(&mut self) -> bool {
        if self.dead || self.knocked_down {
            return false;
        }
        self.knocked_down = true;
        self.knockdown_timer = self.knockdown_duration;
        self.invulnerability_timer =
            self.knockdown_duration + self.wake_up_invulnerability_duration;
        true
    }

    /// Permanent knockdown; records the terminal hit heaviness. Idempotent.
    pub fn on_death(&mut self, was_heavy: bool) {
        if self.dead {
            return;
        }
        self.dead = true;
        self.death_was_heavy = was_heavy;
        self.knocked_down = true;
        self.knockdown_timer = 0.0;
        self.invulnerability_timer = 0.0;
    }

    /// Debug/cheat path: stand up immediately
    pub fn force_wake_up(&mut self) {
        if self.dead || !self.knocked_down {
            return;
        }
        self.wake_up();
    }

    fn wake_up(&mut self) {
        self.knocked_down = false;
        self.knockdown_timer = 0.0;
        self.stamina = self.stamina_max;
        self.invulnerability_timer = self
            .invulnerability_timer
            .max(self.wake_up_invulnerability_duration);
    }

    /// Advances timers and regeneration. Returns true on wake-up.
    pub fn tick(&mut self, delta: f32) -> bool {
        self.invulnerability_timer = (self.invulnerability_timer - delta).max(0.0);

        if self.dead {
            return false;
        }
        if self.knocked_down {
            self.knockdown_timer -= delta;
            if self.knockdown_timer <= 0.0 {
                self.wake_up();
                return true;
            }
            return false;
        }
        if self.stamina < self.stamina_max {
            self.stamina = (self.stamina + self.regen_per_second * delta).min(self.stamina_max);
        }
        false
    }
}

/// System: knockdown timers and wake-up notifications
pub fn update_knockdowns(
    time: Res<Time>,
    mut query: Query<(Entity, &mut KnockdownState)>,
    mut changed: EventWriter<KnockdownChanged>,
) {
    let delta = time.delta_secs();

    for (entity, mut state) in query.iter_mut() {
        if state.tick(delta) {
            changed.write(KnockdownChanged {
                entity,
                down: false,
            });
            crate::logger::log(&format!("Knockdown: {:?} woke up", entity));
        }
    }
}
