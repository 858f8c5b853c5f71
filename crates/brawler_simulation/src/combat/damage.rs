//! Damage resolution pipeline
//!
//! One entry point, `resolve_hit`, runs the full gauntlet for a single
//! hit: validity, wake-up invulnerability, i-frames with combo bypass,
//! guard break and block evaluation, HP application, stagger, knockdown
//! stamina, i-frame arming, death and the air-juggle branch. The
//! `apply_hits` system feeds it from HitConnected events; everything
//! downstream (launches, juggle landings, corpse handling) is also here.
//!
//! Combo bypass: a followup hit of the same attacker's combo may ignore
//! i-frames if it comes soon enough and with an increasing stage. A
//! same-attacker hit inside the window that fails the stage rule becomes
//! animation-only: reaction cues fire, nothing else changes.

use bevy::prelude::*;

use crate::combat::guard::GuardState;
use crate::combat::hit_detection::{HitConnected, LaunchRequest};
use crate::combat::knockdown::{KnockdownChanged, KnockdownState};
use crate::components::{Dead, Facing, Health, PhysicsBody, StaggerState};
use crate::physics::collision;
use crate::physics::movement::{launch_velocity_for_height, KinematicController};

/// Event: a hit finished resolving (UI, sound, effects)
#[derive(Event, Debug, Clone)]
pub struct DamageDealt {
    pub attacker: Option<Entity>,
    pub target: Entity,
    /// Requested amount before block reduction
    pub amount: f32,
    pub applied: f32,
    pub blocked: bool,
    pub animation_only: bool,
    pub target_died: bool,
}

/// Event: entity died (health reached 0)
#[derive(Event, Debug, Clone)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
    /// The terminal hit was heavy (death animation selection)
    pub was_heavy: bool,
}

/// Animation cue selected by the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionCue {
    Ground { heavy: bool },
    AirJuggle { heavy: bool },
    JuggleLanding { heavy: bool },
}

/// Event: play a hit reaction (fire and forget)
#[derive(Event, Debug, Clone, Copy)]
pub struct HitReaction {
    pub entity: Entity,
    pub cue: ReactionCue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageKind {
    Melee,
    Projectile,
}

/// One incoming hit, as the resolver sees it
#[derive(Debug, Clone)]
pub struct HitRequest {
    pub amount: f32,
    pub attacker: Option<Entity>,
    pub attacker_position: Vec3,
    pub kind: DamageKind,
    /// Projectiles: normalized attacker → target direction
    pub direction: Vec3,
    /// Combo stage of the hit, 0 for plain damage
    pub combo_stage: i32,
    pub heavy: bool,
    /// Heavy hits break an active guard before evaluation
    pub heavy_guard_break: bool,
    pub unblockable: bool,
}

impl HitRequest {
    pub fn melee(amount: f32, attacker: Entity, attacker_position: Vec3, stage: i32, heavy: bool) -> Self {
        Self {
            amount,
            attacker: Some(attacker),
            attacker_position,
            kind: DamageKind::Melee,
            direction: Vec3::ZERO,
            combo_stage: stage,
            heavy,
            heavy_guard_break: heavy,
            unblockable: false,
        }
    }
}

/// What the resolver did with the hit
#[derive(Debug, Clone, Default)]
pub struct HitOutcome {
    pub rejected: bool,
    pub animation_only: bool,
    pub applied: f32,
    pub blocked: bool,
    pub stagger_applied: bool,
    pub knockdown_started: bool,
    pub died: bool,
    pub reaction: Option<ReactionCue>,
}

/// Per-character damage pipeline state and tuning
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Damageable {
    pub use_invulnerability: bool,
    pub invulnerability_seconds: f32,
    iframe_timer: f32,

    pub prevent_damage_while_knocked_down: bool,
    /// Fully absorbed blocked hits still play a reaction
    pub play_reaction_on_blocked_zero: bool,

    pub apply_stagger_on_hit: bool,
    pub stagger_duration: f32,
    pub heavy_stagger_duration: f32,
    /// Hits above this fraction of max health stagger heavily
    pub heavy_hit_fraction_threshold: f32,
    pub stagger_min_damage: f32,

    pub allow_combo_bypass: bool,
    pub combo_bypass_max_gap: f32,
    pub combo_bypass_require_increasing_stage: bool,
    last_attacker: Option<Entity>,
    last_combo_stage: i32,
    last_combo_hit_time: f32,

    pub use_air_juggle: bool,
    pub in_air_juggle: bool,
    last_air_hit_heavy: bool,
    landing_started_at: Option<f32>,
    /// Grounded juggle victims stay in the landing reaction this long
    /// before the knockdown kicks in
    pub landing_reaction_seconds: f32,
}

impl Default for Damageable {
    fn default() -> Self {
        Self {
            use_invulnerability: true,
            invulnerability_seconds: 0.2,
            iframe_timer: 0.0,
            prevent_damage_while_knocked_down: false,
            play_reaction_on_blocked_zero: true,
            apply_stagger_on_hit: true,
            stagger_duration: 0.15,
            heavy_stagger_duration: 0.4,
            heavy_hit_fraction_threshold: 0.2,
            stagger_min_damage: 0.0,
            allow_combo_bypass: true,
            combo_bypass_max_gap: 1.2,
            combo_bypass_require_increasing_stage: true,
            last_attacker: None,
            last_combo_stage: 0,
            last_combo_hit_time: f32::NEG_INFINITY,
            use_air_juggle: true,
            in_air_juggle: false,
            last_air_hit_heavy: false,
            landing_started_at: None,
            landing_reaction_seconds: 0.2,
        }
    }
}

impl Damageable {
    pub fn is_invulnerable(&self) -> bool {
        self.use_invulnerability && self.iframe_timer > 0.0
    }

    /// Heavy hits grant half the usual i-frame window
    pub fn arm_iframes(&mut self, heavy: bool) {
        if !self.use_invulnerability {
            return;
        }
        let seconds = if heavy {
            self.invulnerability_seconds * 0.5
        } else {
            self.invulnerability_seconds
        };
        self.iframe_timer = self.iframe_timer.max(seconds);
    }

    pub fn tick(&mut self, delta: f32) {
        self.iframe_timer = (self.iframe_timer - delta).max(0.0);
    }

    fn combo_bypass_allowed(&self, attacker: Option<Entity>, stage: i32, now: f32) -> bool {
        if !self.allow_combo_bypass || stage <= 0 {
            return false;
        }
        let Some(attacker) = attacker else {
            return false;
        };
        if self.last_attacker != Some(attacker) {
            return false;
        }
        if now - self.last_combo_hit_time > self.combo_bypass_max_gap {
            return false;
        }
        !self.combo_bypass_require_increasing_stage || stage > self.last_combo_stage
    }

    fn within_combo_window(&self, attacker: Option<Entity>, now: f32) -> bool {
        attacker.is_some()
            && self.last_attacker == attacker
            && now - self.last_combo_hit_time <= self.combo_bypass_max_gap
    }

    fn note_combo_hit(&mut self, attacker: Option<Entity>, stage: i32, now: f32) {
        if stage <= 0 {
            return;
        }
        if let Some(attacker) = attacker {
            self.last_attacker = Some(attacker);
            self.last_combo_stage = stage;
            self.last_combo_hit_time = now;
        }
    }

    pub fn start_air_juggle(&mut self, heavy: bool) {
        self.in_air_juggle = true;
        self.last_air_hit_heavy = heavy;
        self.landing_started_at = None;
    }

    pub fn clear_air_juggle(&mut self) {
        self.in_air_juggle = false;
        self.landing_started_at = None;
    }
}

/// Resolves one hit against a target's combat state.
///
/// Missing collaborators (no guard, no knockdown pool, no stagger slot)
/// degrade gracefully: the corresponding steps are skipped.
pub fn resolve_hit(
    request: &HitRequest,
    now: f32,
    position: Vec3,
    facing: Vec3,
    grounded: bool,
    health: &mut Health,
    damageable: &mut Damageable,
    mut guard: Option<&mut GuardState>,
    mut knockdown: Option<&mut KnockdownState>,
    mut stagger: Option<&mut StaggerState>,
) -> HitOutcome {
    let mut outcome = HitOutcome::default();

    // Validity
    if request.amount <= 0.0 || !health.is_alive() {
        outcome.rejected = true;
        return outcome;
    }
    if let Some(kd) = knockdown.as_deref() {
        if kd.dead || kd.is_wake_up_invulnerable() {
            outcome.rejected = true;
            return outcome;
        }
        if damageable.prevent_damage_while_knocked_down && kd.knocked_down {
            outcome.rejected = true;
            return outcome;
        }
    }

    // I-frames: combo followups may bypass; same-attacker hits inside
    // the window degrade to animation-only; everything else is dropped
    let mut animation_only = false;
    if damageable.is_invulnerable() {
        let bypass = damageable.combo_bypass_allowed(request.attacker, request.combo_stage, now);
        if !bypass {
            if damageable.within_combo_window(request.attacker, now) {
                animation_only = true;
            } else {
                outcome.rejected = true;
                return outcome;
            }
        }
    }

    let mut applied = request.amount;
    let mut blocked = false;
    if !animation_only {
        if let Some(g) = guard.as_deref_mut() {
            if request.heavy_guard_break {
                g.break_guard();
            }
            if !request.unblockable {
                let staggered = stagger.as_deref().is_some_and(|s| s.is_staggered());
                blocked = match request.kind {
                    DamageKind::Melee => g.evaluate(
                        facing,
                        request.attacker_position - position,
                        &mut applied,
                        staggered,
                    ),
                    DamageKind::Projectile => {
                        g.evaluate_direction(facing, request.direction, &mut applied, staggered)
                    }
                };
                if blocked && request.heavy {
                    g.absorb_heavy_block();
                }
            }
        }
    }

    // Combo tracking updates on every non-rejected hit
    damageable.note_combo_hit(request.attacker, request.combo_stage, now);

    if animation_only {
        outcome.animation_only = true;
        outcome.reaction = Some(ReactionCue::Ground {
            heavy: request.heavy,
        });
        return outcome;
    }

    if applied <= 0.0 && blocked && !damageable.play_reaction_on_blocked_zero {
        outcome.blocked = true;
        return outcome;
    }

    let was_alive = health.is_alive();
    health.take_damage(applied);
    outcome.applied = applied;
    outcome.blocked = blocked;

    if applied > 0.0 && health.is_alive() {
        // Stagger severity scales with the fraction of max health lost;
        // heavy-flagged hits stagger heavily regardless of severity.
        // Blocking reduces severity through the reduced damage, it does
        // not skip these steps.
        if damageable.apply_stagger_on_hit && applied >= damageable.stagger_min_damage {
            if let Some(s) = stagger.as_deref_mut() {
                let severity = applied / health.max;
                let duration = if request.heavy
                    || severity >= damageable.heavy_hit_fraction_threshold
                {
                    damageable.heavy_stagger_duration
                } else {
                    damageable.stagger_duration
                };
                if duration > 0.0 {
                    s.apply(duration);
                    outcome.stagger_applied = true;
                }
            }
        }
        if let Some(kd) = knockdown.as_deref_mut() {
            outcome.knockdown_started = if request.heavy {
                kd.on_heavy_hit()
            } else {
                kd.on_light_hit()
            };
        }
    }

    damageable.arm_iframes(request.heavy);

    if !health.is_alive() {
        if was_alive {
            if let Some(kd) = knockdown.as_deref_mut() {
                kd.on_death(request.heavy);
            }
            outcome.died = true;
        }
        return outcome;
    }

    // Reaction selection: airborne survivors juggle, standing ones flinch,
    // a fresh knockdown plays through KnockdownChanged instead
    if !grounded && damageable.use_air_juggle {
        damageable.start_air_juggle(request.heavy);
        outcome.reaction = Some(ReactionCue::AirJuggle {
            heavy: request.heavy,
        });
    } else if !knockdown.as_deref().is_some_and(|k| k.knocked_down) {
        outcome.reaction = Some(ReactionCue::Ground {
            heavy: request.heavy,
        });
    }
    outcome
}

/// System: i-frame timers
pub fn tick_damageables(time: Res<Time>, mut query: Query<&mut Damageable>) {
    let delta = time.delta_secs();
    for mut damageable in query.iter_mut() {
        damageable.tick(delta);
    }
}

/// System: resolve HitConnected events against targets
pub fn apply_hits(
    time: Res<Time>,
    mut hit_events: EventReader<HitConnected>,
    mut targets: Query<(
        &Transform,
        &Facing,
        &KinematicController,
        &mut Health,
        &mut Damageable,
        Option<&mut GuardState>,
        Option<&mut KnockdownState>,
        Option<&mut StaggerState>,
    )>,
    mut dealt: EventWriter<DamageDealt>,
    mut died: EventWriter<EntityDied>,
    mut reactions: EventWriter<HitReaction>,
    mut knockdown_changed: EventWriter<KnockdownChanged>,
) {
    let now = time.elapsed_secs();

    for hit in hit_events.read() {
        let Ok((
            transform,
            facing,
            controller,
            mut health,
            mut damageable,
            guard,
            knockdown,
            stagger,
        )) = targets.get_mut(hit.target)
        else {
            crate::logger::log_warning(&format!(
                "apply_hits: target {:?} has no damage pipeline components",
                hit.target
            ));
            continue;
        };

        let request = HitRequest::melee(
            hit.damage,
            hit.attacker,
            hit.attacker_position,
            hit.stage,
            hit.heavy,
        );
        let outcome = resolve_hit(
            &request,
            now,
            transform.translation,
            facing.forward,
            controller.grounded,
            &mut health,
            &mut damageable,
            guard.map(Mut::into_inner),
            knockdown.map(Mut::into_inner),
            stagger.map(Mut::into_inner),
        );

        if outcome.rejected {
            continue;
        }

        dealt.write(DamageDealt {
            attacker: Some(hit.attacker),
            target: hit.target,
            amount: hit.damage,
            applied: outcome.applied,
            blocked: outcome.blocked,
            animation_only: outcome.animation_only,
            target_died: outcome.died,
        });
        if let Some(cue) = outcome.reaction {
            reactions.write(HitReaction {
                entity: hit.target,
                cue,
            });
        }
        if outcome.knockdown_started {
            knockdown_changed.write(KnockdownChanged {
                entity: hit.target,
                down: true,
            });
        }
        if outcome.died {
            died.write(EntityDied {
                entity: hit.target,
                killer: Some(hit.attacker),
                was_heavy: hit.heavy,
            });
            crate::logger::log_info(&format!(
                "Entity {:?} killed by {:?}",
                hit.target, hit.attacker
            ));
        }
    }
}

/// System: apply LaunchRequest events (vertical velocity, juggle start)
pub fn apply_launches(
    mut launch_events: EventReader<LaunchRequest>,
    mut targets: Query<(
        &Health,
        &mut KinematicController,
        &mut PhysicsBody,
        &mut Damageable,
    )>,
) {
    for launch in launch_events.read() {
        let Ok((health, mut controller, mut body, mut damageable)) =
            targets.get_mut(launch.target)
        else {
            continue;
        };
        if !health.is_alive() {
            continue;
        }

        let velocity =
            launch_velocity_for_height(launch.velocity, launch.max_height, controller.gravity);
        body.bump_vertical(velocity);
        controller.grounded = false;
        if launch.juggle {
            damageable.start_air_juggle(launch.heavy);
        }
    }
}

/// System: juggle victims hitting the ground
///
/// First grounded frame plays the landing reaction; after the reaction
/// window the juggle clears into a knockdown.
pub fn update_air_juggle(
    time: Res<Time>,
    mut query: Query<(
        Entity,
        &Health,
        &KinematicController,
        &mut Damageable,
        Option<&mut KnockdownState>,
    )>,
    mut reactions: EventWriter<HitReaction>,
    mut knockdown_changed: EventWriter<KnockdownChanged>,
) {
    let now = time.elapsed_secs();

    for (entity, health, controller, mut damageable, knockdown) in query.iter_mut() {
        if !damageable.in_air_juggle {
            continue;
        }
        if !health.is_alive() {
            damageable.clear_air_juggle();
            continue;
        }
        if !controller.grounded {
            damageable.landing_started_at = None;
            continue;
        }

        match damageable.landing_started_at {
            None => {
                damageable.landing_started_at = Some(now);
                reactions.write(HitReaction {
                    entity,
                    cue: ReactionCue::JuggleLanding {
                        heavy: damageable.last_air_hit_heavy,
                    },
                });
            }
            Some(started) if now - started >= damageable.landing_reaction_seconds => {
                damageable.clear_air_juggle();
                if let Some(mut kd) = knockdown {
                    if kd.enter_knockdown() {
                        knockdown_changed.write(KnockdownChanged { entity, down: true });
                    }
                }
            }
            Some(_) => {}
        }
    }
}

/// System: corpse handling
///
/// Dead characters stop moving, drop out of the actor collision layer
/// (traversable, still resting on the ground) and get the Dead marker.
pub fn handle_deaths(
    mut commands: Commands,
    mut death_events: EventReader<EntityDied>,
    mut bodies: Query<(
        &mut PhysicsBody,
        Option<&mut crate::combat::combo::ComboState>,
        Option<&mut GuardState>,
    )>,
) {
    for event in death_events.read() {
        if let Ok((mut body, combo, guard)) = bodies.get_mut(event.entity) {
            body.velocity = Vec3::ZERO;
            if let Some(mut combo) = combo {
                combo.cancel();
            }
            if let Some(mut guard) = guard {
                guard.cancel_block();
            }
        }

        if let Ok(mut entity_commands) = commands.get_entity(event.entity) {
            entity_commands.insert((Dead, collision::corpse_groups()));
            crate::logger::log_info(&format!("Corpse: {:?} is now traversable", event.entity));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic_target() -> (Health, Damageable) {
        (Health::new(100.0), Damageable::default())
    }

    fn plain_hit(amount: f32, heavy: bool) -> HitRequest {
        HitRequest {
            amount,
            attacker: None,
            attacker_position: Vec3::new(0.0, 0.0, -5.0),
            kind: DamageKind::Melee,
            direction: Vec3::ZERO,
            combo_stage: 0,
            heavy,
            heavy_guard_break: heavy,
            unblockable: false,
        }
    }

    #[test]
    fn test_three_light_hits_no_iframes() {
        // Three unblockable light hits of 10 each, i-frames disabled:
        // all land, health 70, each one staggers
        let (mut health, mut damageable) = basic_target();
        damageable.use_invulnerability = false;
        let mut stagger = StaggerState::default();
        let mut knockdown = KnockdownState::default();

        for i in 0..3 {
            let mut request = plain_hit(10.0, false);
            request.unblockable = true;
            let outcome = resolve_hit(
                &request,
                i as f32 * 0.1,
                Vec3::ZERO,
                Vec3::Z,
                true,
                &mut health,
                &mut damageable,
                None,
                Some(&mut knockdown),
                Some(&mut stagger),
            );
            assert!(!outcome.rejected);
            assert_eq!(outcome.applied, 10.0);
            assert!(outcome.stagger_applied);
            stagger.timer = 0.0; // Next hit starts clean
        }
        assert_eq!(health.current, 70.0);
        assert_eq!(knockdown.stamina, 55.0); // 3 light hits at 15 each
        assert!(!knockdown.knocked_down);
    }

    #[test]
    fn test_blocked_heavy_hit() {
        // Facing the attacker with guard up: 40 heavy → 10 applied,
        // guard stamina drained by the heavy block cost. Blocking does
        // not exempt the stagger and knockdown steps: they run on the
        // reduced damage.
        let (mut health, mut damageable) = basic_target();
        let mut guard = GuardState::default();
        guard.set_block_request(true);
        guard.update(0.0, false);
        let mut knockdown = KnockdownState::default();
        let mut stagger = StaggerState::default();

        // heavy_guard_break off for this swing so the block holds
        let mut request = plain_hit(40.0, true);
        request.heavy_guard_break = false;

        let outcome = resolve_hit(
            &request,
            0.0,
            Vec3::ZERO,
            Vec3::Z, // Attacker at -Z: in front of the guard
            true,
            &mut health,
            &mut damageable,
            Some(&mut guard),
            Some(&mut knockdown),
            Some(&mut stagger),
        );

        assert!(outcome.blocked);
        assert!((outcome.applied - 10.0).abs() < 1e-4);
        assert!((health.current - 90.0).abs() < 1e-4);
        assert_eq!(guard.stamina, 60.0);
        // Step 9 still drains the pool on a blocked heavy
        assert_eq!(knockdown.stamina, 50.0);
        assert!(outcome.stagger_applied);
    }

    #[test]
    fn test_heavy_flag_forces_heavy_stagger() {
        // 10 of 100 max is below the 0.2 severity threshold, but the
        // heavy flag alone selects the heavy stagger duration
        let (mut health, mut damageable) = basic_target();
        damageable.use_invulnerability = false;
        damageable.use_air_juggle = false;
        let mut stagger = StaggerState::default();

        let mut request = plain_hit(10.0, true);
        request.unblockable = true;
        let outcome = resolve_hit(
            &request, 0.0, Vec3::ZERO, Vec3::Z, true,
            &mut health, &mut damageable, None, None, Some(&mut stagger),
        );
        assert!(outcome.stagger_applied);
        assert_eq!(stagger.timer, damageable.heavy_stagger_duration);
    }

    #[test]
    fn test_combo_bypass_increasing_stage() {
        let (mut health, mut damageable) = basic_target();
        let attacker = Entity::PLACEHOLDER;

        // Stage 1 lands and arms i-frames
        let request = HitRequest::melee(10.0, attacker, Vec3::new(0.0, 0.0, -5.0), 1, false);
        let outcome = resolve_hit(
            &request, 0.0, Vec3::ZERO, Vec3::Z, true,
            &mut health, &mut damageable, None, None, None,
        );
        assert_eq!(outcome.applied, 10.0);
        assert!(damageable.is_invulnerable());

        // Stage 2 inside the i-frame window: bypass, full damage
        let request = HitRequest::melee(10.0, attacker, Vec3::new(0.0, 0.0, -5.0), 2, false);
        let outcome = resolve_hit(
            &request, 0.1, Vec3::ZERO, Vec3::Z, true,
            &mut health, &mut damageable, None, None, None,
        );
        assert!(!outcome.rejected);
        assert!(!outcome.animation_only);
        assert_eq!(outcome.applied, 10.0);
        assert_eq!(health.current, 80.0);

        // Same stage again: window matches but the stage rule fails,
        // animation-only, no HP change
        let request = HitRequest::melee(10.0, attacker, Vec3::new(0.0, 0.0, -5.0), 2, false);
        let outcome = resolve_hit(
            &request, 0.15, Vec3::ZERO, Vec3::Z, true,
            &mut health, &mut damageable, None, None, None,
        );
        assert!(outcome.animation_only);
        assert_eq!(outcome.applied, 0.0);
        assert!(outcome.reaction.is_some());
        assert_eq!(health.current, 80.0);
    }

    #[test]
    fn test_different_attacker_blocked_by_iframes() {
        let (mut health, mut damageable) = basic_target();
        let attacker = Entity::from_raw(1);
        let other = Entity::from_raw(2);

        let request = HitRequest::melee(10.0, attacker, Vec3::ZERO, 1, false);
        resolve_hit(
            &request, 0.0, Vec3::ZERO, Vec3::Z, true,
            &mut health, &mut damageable, None, None, None,
        );

        let request = HitRequest::melee(10.0, other, Vec3::ZERO, 1, false);
        let outcome = resolve_hit(
            &request, 0.05, Vec3::ZERO, Vec3::Z, true,
            &mut health, &mut damageable, None, None, None,
        );
        assert!(outcome.rejected);
        assert_eq!(health.current, 90.0);
    }

    #[test]
    fn test_heavy_halves_iframes() {
        let (mut health, mut damageable) = basic_target();
        damageable.use_air_juggle = false;

        let mut request = plain_hit(10.0, true);
        request.unblockable = true;
        resolve_hit(
            &request, 0.0, Vec3::ZERO, Vec3::Z, true,
            &mut health, &mut damageable, None, None, None,
        );
        assert!(damageable.is_invulnerable());

        damageable.tick(0.11); // Past half the window (0.2 * 0.5 = 0.1)
        assert!(!damageable.is_invulnerable());
    }

    #[test]
    fn test_overkill_clamps_and_kills_once() {
        let (mut health, mut damageable) = basic_target();
        damageable.use_invulnerability = false;
        let mut knockdown = KnockdownState::default();

        let mut request = plain_hit(1000.0, true);
        request.unblockable = true;
        let outcome = resolve_hit(
            &request, 0.0, Vec3::ZERO, Vec3::Z, true,
            &mut health, &mut damageable, None, Some(&mut knockdown), None,
        );
        assert!(outcome.died);
        assert_eq!(health.current, 0.0);
        assert!(knockdown.dead);
        assert!(knockdown.death_was_heavy);
        assert!(outcome.reaction.is_none());

        // Corpse hits are no-ops
        let outcome = resolve_hit(
            &request, 0.1, Vec3::ZERO, Vec3::Z, true,
            &mut health, &mut damageable, None, Some(&mut knockdown), None,
        );
        assert!(outcome.rejected);

        // Healing a corpse is a no-op too
        health.heal(50.0);
        assert_eq!(health.current, 0.0);
    }

    #[test]
    fn test_wake_up_invulnerability_rejects() {
        let (mut health, mut damageable) = basic_target();
        let mut knockdown = KnockdownState::default();
        knockdown.enter_knockdown();

        let request = plain_hit(10.0, false);
        let outcome = resolve_hit(
            &request, 0.0, Vec3::ZERO, Vec3::Z, true,
            &mut health, &mut damageable, None, Some(&mut knockdown), None,
        );
        assert!(outcome.rejected);
        assert_eq!(health.current, 100.0);
    }

    #[test]
    fn test_severe_hit_staggers_heavily() {
        let (mut health, mut damageable) = basic_target();
        damageable.use_invulnerability = false;
        let mut stagger = StaggerState::default();

        // 25 of 100 max: above the 0.2 fraction threshold
        let mut request = plain_hit(25.0, false);
        request.unblockable = true;
        let outcome = resolve_hit(
            &request, 0.0, Vec3::ZERO, Vec3::Z, true,
            &mut health, &mut damageable, None, None, Some(&mut stagger),
        );
        assert!(outcome.stagger_applied);
        assert_eq!(stagger.timer, damageable.heavy_stagger_duration);
    }

    #[test]
    fn test_airborne_hit_starts_juggle() {
        let (mut health, mut damageable) = basic_target();
        damageable.use_invulnerability = false;

        let mut request = plain_hit(10.0, false);
        request.unblockable = true;
        let outcome = resolve_hit(
            &request, 0.0, Vec3::ZERO, Vec3::Z, false, // airborne
            &mut health, &mut damageable, None, None, None,
        );
        assert_eq!(
            outcome.reaction,
            Some(ReactionCue::AirJuggle { heavy: false })
        );
        assert!(damageable.in_air_juggle);
    }

    #[test]
    fn test_zero_amount_rejected() {
        let (mut health, mut damageable) = basic_target();
        let request = plain_hit(0.0, false);
        let outcome = resolve_hit(
            &request, 0.0, Vec3::ZERO, Vec3::Z, true,
            &mut health, &mut damageable, None, None, None,
        );
        assert!(outcome.rejected);
    }
}
