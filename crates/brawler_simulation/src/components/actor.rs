//! Base actor components: Actor, Health, Facing

use bevy::prelude::*;

/// Actor (NPC, player, enemy) — base component for living characters
///
/// Pulls in Health, Facing and StaggerState through Required Components.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(Health, Facing, crate::components::StaggerState)]
pub struct Actor {
    /// Stable faction ID (friendly-fire filtering)
    pub faction_id: u64,
}

/// Actor health
///
/// Invariant: 0 ≤ current ≤ max, max ≥ 1.
/// current == 0 is terminal: healing a dead character is a no-op.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0) // Default 100 HP
    }
}

impl Health {
    pub fn new(max: f32) -> Self {
        let max = max.max(1.0);
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.current = (self.current - amount.max(0.0)).max(0.0);
    }

    pub fn heal(&mut self, amount: f32) {
        if !self.is_alive() || amount <= 0.0 {
            return;
        }
        self.current = (self.current + amount).min(self.max);
    }

    /// Fraction of max health a hit of `amount` represents (stagger severity)
    pub fn fraction_of_max(&self, amount: f32) -> f32 {
        amount / self.max
    }
}

/// Planar facing axis of a character
///
/// Updated from movement input; weapon anchors and guard arcs are
/// expressed relative to this axis.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Facing {
    /// Normalized, Y is kept at 0
    pub forward: Vec3,
}

impl Default for Facing {
    fn default() -> Self {
        Self { forward: Vec3::Z }
    }
}

impl Facing {
    /// Rotates a local offset (x = right, y = up, z = forward) into world space
    pub fn oriented_offset(&self, local: Vec3) -> Vec3 {
        let forward = self.forward.normalize_or_zero();
        let right = Vec3::Y.cross(forward);
        right * local.x + Vec3::Y * local.y + forward * local.z
    }
}
