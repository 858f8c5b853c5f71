//! Combat core: combos, guard, knockdown, hit detection, damage
//!
//! ECS responsibilities:
//! - Game state: combo/guard/knockdown state machines, health, i-frames
//! - Rules: swept hit detection, damage resolution, launches
//! - Events: stage starts/ends, hits, reactions, deaths
//!
//! The animation/VFX layer is a consumer of the events registered here;
//! nothing in this module waits for it.

use bevy::prelude::*;

pub mod air_combo;
pub mod combo;
pub mod damage;
pub mod dash;
pub mod guard;
pub mod hit_detection;
pub mod knockdown;
pub mod scheduler;

// Re-export the main types
pub use air_combo::{AirComboConfig, AirComboState};
pub use combo::{AttackStageEnded, AttackStageStarted, ComboConfig, ComboState, StageOverride};
pub use damage::{
    resolve_hit, DamageDealt, DamageKind, Damageable, EntityDied, HitOutcome, HitReaction,
    HitRequest, ReactionCue,
};
pub use dash::{DashConfig, DashStarted, DashState};
pub use guard::{BlockingChanged, GuardState};
pub use hit_detection::{HitConnected, LaunchConfig, LaunchRequest, WeaponHitbox};
pub use knockdown::{KnockdownChanged, KnockdownState};
pub use scheduler::{ActionScheduler, DeferredAction};

/// Combat Plugin
///
/// Registers the whole per-frame pipeline in Update, chained:
/// 1. pump_scheduler — due deferred actions (delayed launches, air stage ends)
/// 2. update_dash — dash buffering/easing, attack cancel
/// 3. update_jumps — jump/double-jump consumption
/// 4. tick_combos — ground combo timers and input
/// 5. tick_air_combos — air chain after the double jump
/// 6. update_guard — block intent + guard stamina
/// 7. update_knockdowns — knockdown timers, wake-ups
/// 8. tick_damageables — i-frame timers
/// 9. handle_stage_events — arm/disarm weapon volumes
/// 10. sweep_hitboxes — capsule + tip sweep overlap tests
/// 11. apply_hits — damage resolution pipeline
/// 12. apply_launches — vertical velocity + juggle start
/// 13. update_air_juggle — juggle landings into knockdowns
/// 14. handle_deaths — corpses stop colliding with actors
/// 15. apply_health_sync — pushed health snapshots
/// 16. tick_stagger — hit-stun timers
/// 17. clear_input_edges — one press, one request
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ActionScheduler>();

        app.add_event::<AttackStageStarted>()
            .add_event::<AttackStageEnded>()
            .add_event::<HitConnected>()
            .add_event::<LaunchRequest>()
            .add_event::<DamageDealt>()
            .add_event::<EntityDied>()
            .add_event::<HitReaction>()
            .add_event::<KnockdownChanged>()
            .add_event::<BlockingChanged>()
            .add_event::<DashStarted>()
            .add_event::<crate::health_sync::HealthSyncReceived>();

        app.add_systems(
            Update,
            (
                scheduler::pump_scheduler,
                dash::update_dash,
                crate::physics::jump::update_jumps,
                combo::tick_combos,
                air_combo::tick_air_combos,
                guard::update_guard,
                knockdown::update_knockdowns,
                damage::tick_damageables,
                hit_detection::handle_stage_events,
                hit_detection::sweep_hitboxes,
                damage::apply_hits,
                damage::apply_launches,
                damage::update_air_juggle,
                damage::handle_deaths,
                crate::health_sync::apply_health_sync,
                crate::components::tick_stagger,
                crate::components::clear_input_edges,
            )
                .chain(),
        );
    }
}
