//! Directional guard with its own stamina pool
//!
//! Blocking reduces frontal damage by a flat fraction. Heavy hits that are
//! blocked drain guard stamina; an empty pool breaks the guard, which
//! pins stamina at zero and forces blocking off until an explicit heal.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::{InputSnapshot, StaggerState};

/// Event: block intent toggled (animation/VFX cue)
#[derive(Event, Debug, Clone, Copy)]
pub struct BlockingChanged {
    pub entity: Entity,
    pub blocking: bool,
}

#[derive(Component, Debug, Clone, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct GuardState {
    pub blocking: bool,
    pub stamina: f32,
    pub stamina_max: f32,
    /// Regeneration rate, only while not blocking and not broken
    pub regen_per_second: f32,
    /// Guard stamina drained by a blocked heavy hit
    pub heavy_block_cost: f32,
    /// Fraction of damage removed from a successful block
    pub reduction_fraction: f32,
    pub broken: bool,
    block_request: bool,
}

impl Default for GuardState {
    fn default() -> Self {
        Self {
            blocking: false,
            stamina: 100.0,
            stamina_max: 100.0,
            regen_per_second: 40.0,
            heavy_block_cost: 40.0,
            reduction_fraction: 0.75,
            broken: false,
            block_request: false,
        }
    }
}

impl GuardState {
    pub fn set_block_request(&mut self, wants_block: bool) {
        self.block_request = wants_block;
    }

    pub fn cancel_block(&mut self) {
        self.block_request = false;
        self.blocking = false;
    }

    /// Applies the request, regenerates stamina. A broken guard never
    /// comes up; stamina stays pinned until `heal_guard`.
    pub fn update(&mut self, delta: f32, staggered: bool) -> bool {
        let was_blocking = self.blocking;
        self.blocking = self.block_request && !self.broken && !staggered;

        if self.broken {
            self.stamina = 0.0;
        } else if !self.blocking && self.stamina < self.stamina_max {
            self.stamina = (self.stamina + self.regen_per_second * delta).min(self.stamina_max);
        }
        was_blocking != self.blocking
    }

    /// Melee block check against the attacker position. The attacker
    /// counts as in front of the guard when the dot against the facing
    /// axis is negative; frontal blocked damage is reduced in place.
    /// Returns whether the hit was blocked.
    pub fn evaluate(
        &self,
        facing: Vec3,
        to_attacker: Vec3,
        damage: &mut f32,
        staggered: bool,
    ) -> bool {
        if !self.blocking || self.broken || staggered {
            return false;
        }
        let to_attacker = to_attacker.normalize_or_zero();
        if to_attacker == Vec3::ZERO {
            return false;
        }
        let facing_attacker = facing.dot(to_attacker) < 0.0;
        if !facing_attacker {
            return false;
        }
        *damage *= 1.0 - self.reduction_fraction;
        true
    }

    /// Projectile variant: `direction` points attacker → target
    pub fn evaluate_direction(
        &self,
        facing: Vec3,
        direction: Vec3,
        damage: &mut f32,
        staggered: bool,
    ) -> bool {
        if !self.blocking || self.broken || staggered {
            return false;
        }
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO {
            return false;
        }
        let facing_attack = facing.dot(-direction) > 0.0;
        if !facing_attack {
            return false;
        }
        *damage *= 1.0 - self.reduction_fraction;
        true
    }

    /// Guard stamina cost of a blocked heavy hit; an empty pool breaks
    pub fn absorb_heavy_block(&mut self) {
        self.stamina -= self.heavy_block_cost;
        if self.stamina <= 0.0 {
            self.stamina = 0.0;
            self.break_guard();
        }
    }

    /// Guard break only affects an active block
    pub fn break_guard(&mut self) {
        if !self.blocking {
            return;
        }
        self.broken = true;
        self.blocking = false;
        self.stamina = 0.0;
    }

    /// Explicit recovery path; any positive stamina clears the break
    pub fn heal_guard(&mut self, amount: f32) {
        if amount <= 0.0 {
            return;
        }
        self.stamina = (self.stamina + amount).min(self.stamina_max);
        if self.stamina > 0.0 {
            self.broken = false;
        }
    }
}

/// System: block intent from input, stamina regeneration
pub fn update_guard(
    time: Res<Time>,
    mut query: Query<(Entity, &InputSnapshot, &StaggerState, &mut GuardState)>,
    mut changed: EventWriter<BlockingChanged>,
) {
    let delta = time.delta_secs();

    for (entity, input, stagger, mut guard) in query.iter_mut() {
        guard.set_block_request(input.block_held);
        if guard.update(delta, stagger.is_staggered()) {
            changed.write(BlockingChanged {
                entity,
                blocking: guard.blocking,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocking_guard() -> GuardState {
        let mut guard = GuardState::default();
        guard.set_block_request(true);
        guard.update(0.0, false);
        assert!(guard.blocking);
        guard
    }

    #[test]
    fn test_frontal_block_reduces_damage() {
        let guard = blocking_guard();
        // Facing axis +Z, attacker toward -Z: dot < 0 means in front
        let mut damage = 40.0;
        let blocked = guard.evaluate(Vec3::Z, -Vec3::Z, &mut damage, false);
        assert!(blocked);
        assert!((damage - 10.0).abs() < 1e-6); // 40 * (1 - 0.75)
    }

    #[test]
    fn test_rear_hit_not_blocked() {
        let guard = blocking_guard();
        let mut damage = 40.0;
        // dot >= 0: attacker behind the guard arc, full damage
        let blocked = guard.evaluate(Vec3::Z, Vec3::Z, &mut damage, false);
        assert!(!blocked);
        assert_eq!(damage, 40.0);
    }

    #[test]
    fn test_stagger_disables_block() {
        let guard = blocking_guard();
        let mut damage = 40.0;
        let blocked = guard.evaluate(Vec3::Z, -Vec3::Z, &mut damage, true);
        assert!(!blocked);
        assert_eq!(damage, 40.0);
    }

    #[test]
    fn test_heavy_block_drains_and_breaks() {
        let mut guard = blocking_guard();

        guard.absorb_heavy_block();
        assert_eq!(guard.stamina, 60.0);
        assert!(!guard.broken);

        guard.absorb_heavy_block();
        guard.absorb_heavy_block(); // 100 - 3 * 40 < 0: break
        assert!(guard.broken);
        assert!(!guard.blocking);
        assert_eq!(guard.stamina, 0.0);
    }

    #[test]
    fn test_broken_guard_pinned_until_heal() {
        let mut guard = blocking_guard();
        guard.stamina = 10.0;
        guard.absorb_heavy_block();
        assert!(guard.broken);

        // Regen does not lift a break, stamina stays pinned
        guard.set_block_request(true);
        guard.update(5.0, false);
        assert!(guard.broken);
        assert!(!guard.blocking);
        assert_eq!(guard.stamina, 0.0);

        guard.heal_guard(30.0);
        assert!(!guard.broken);
        assert_eq!(guard.stamina, 30.0);

        guard.update(0.0, false);
        assert!(guard.blocking);
    }

    #[test]
    fn test_regen_only_while_not_blocking() {
        let mut guard = GuardState {
            stamina: 50.0,
            ..default()
        };

        guard.set_block_request(true);
        guard.update(1.0, false);
        assert_eq!(guard.stamina, 50.0); // Blocking: no regen

        guard.set_block_request(false);
        guard.update(1.0, false);
        assert_eq!(guard.stamina, 90.0); // 40/s

        guard.update(1.0, false);
        assert_eq!(guard.stamina, 100.0); // Clamped
    }

    #[test]
    fn test_projectile_direction_variant() {
        let guard = blocking_guard();
        let mut damage = 20.0;
        // Projectile flying along -Z into a +Z-facing guard
        let blocked = guard.evaluate_direction(Vec3::Z, -Vec3::Z, &mut damage, false);
        assert!(blocked);
        assert!((damage - 5.0).abs() < 1e-6);
    }
}
