//! Hit-reaction components: StaggerState, Dead

use bevy::prelude::*;

/// Hit-stun timer
///
/// While the timer runs the character cannot start attacks, dash or block.
/// Re-applying a shorter stagger never shortens the remaining one.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct StaggerState {
    pub timer: f32,
}

impl StaggerState {
    pub fn is_staggered(&self) -> bool {
        self.timer > 0.0
    }

    pub fn apply(&mut self, duration: f32) {
        self.timer = self.timer.max(duration);
    }

    pub fn tick(&mut self, delta: f32) {
        self.timer = (self.timer - delta).max(0.0);
    }
}

/// Marker: entity is dead (Health == 0)
///
/// No automatic despawn — bodies stay in the world, traversable.
#[derive(Component, Debug)]
pub struct Dead;

/// System: advance stagger timers
pub fn tick_stagger(mut query: Query<&mut StaggerState>, time: Res<Time>) {
    let delta = time.delta_secs();
    for mut stagger in query.iter_mut() {
        stagger.tick(delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stagger_longest_wins() {
        let mut stagger = StaggerState::default();
        stagger.apply(0.5);
        stagger.apply(0.2); // Shorter re-apply does not shorten
        assert_eq!(stagger.timer, 0.5);

        stagger.apply(0.8);
        assert_eq!(stagger.timer, 0.8);
    }

    #[test]
    fn test_stagger_tick_clamps_at_zero() {
        let mut stagger = StaggerState::default();
        stagger.apply(0.1);
        stagger.tick(1.0);
        assert_eq!(stagger.timer, 0.0);
        assert!(!stagger.is_staggered());
    }
}
