//! Swept weapon hit detection
//!
//! A weapon is a capsule between two anchors local to the attacker
//! (rotated by facing). While a stage is armed, every frame tests the
//! instantaneous capsule and, optionally, sub-samples of the tip's path
//! since the previous frame so fast swings cannot tunnel through a
//! target. Targets are simple body spheres.
//!
//! Determinism: candidates are processed in entity-index order and each
//! sample keeps a fixed-capacity buffer; overflow drops the tail and
//! logs a warning.

use std::collections::{HashMap, HashSet};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combat::combo::{AttackStageEnded, AttackStageStarted, ComboConfig, ComboState};
use crate::combat::damage::Damageable;
use crate::combat::scheduler::{ActionScheduler, DeferredAction};
use crate::components::{Actor, Facing};

/// Approximate target body: a sphere at chest height
pub const TARGET_BODY_RADIUS: f32 = 0.4;
pub const TARGET_BODY_CENTER_HEIGHT: f32 = 0.9;

/// Attacker hop on a connected air hit (keeps the juggle readable)
const AIR_HIT_ATTACKER_BUMP: f32 = 1.5;

/// Event: a weapon sample overlapped a target this frame
#[derive(Event, Debug, Clone)]
pub struct HitConnected {
    pub attacker: Entity,
    pub target: Entity,
    pub damage: f32,
    pub stage: i32,
    pub heavy: bool,
    pub attacker_position: Vec3,
}

/// Event: set vertical velocity on the target
#[derive(Event, Debug, Clone, Copy)]
pub struct LaunchRequest {
    pub target: Entity,
    pub velocity: f32,
    /// Ballistic apex cap in meters above the launch point, 0 = uncapped
    pub max_height: f32,
    pub heavy: bool,
    /// Launches with juggle start the air-juggle pipeline on the target;
    /// attacker self-bumps do not
    pub juggle: bool,
}

/// Launch tuning for one stage
#[derive(Debug, Clone, Copy, Reflect, Serialize, Deserialize)]
pub struct LaunchConfig {
    pub stage: i32,
    pub vertical_velocity: f32,
    pub max_height: f32,
    /// Damage lands immediately, the launch fires this much later
    pub delay: f32,
    /// Only applies when the stage was chained out of a combo
    pub requires_combo: bool,
}

/// Armed volume state for one stage instance
#[derive(Debug, Clone, Default)]
pub struct ActiveHitVolume {
    pub stage: i32,
    pub is_air: bool,
    prev_tip: Option<Vec3>,
    hit_this_stage: HashSet<Entity>,
    last_hit_time: HashMap<Entity, f32>,
}

impl ActiveHitVolume {
    fn new(stage: i32, is_air: bool, tip: Vec3) -> Self {
        Self {
            stage,
            is_air,
            prev_tip: Some(tip),
            ..default()
        }
    }

    /// One hit per target per stage instance, unless the per-target
    /// cooldown has elapsed (cooldown 0 blocks until stage end)
    pub fn can_hit(&self, target: Entity, now: f32, cooldown: f32) -> bool {
        if !self.hit_this_stage.contains(&target) {
            return true;
        }
        if cooldown <= 0.0 {
            return false;
        }
        self.last_hit_time
            .get(&target)
            .is_none_or(|t| now - t >= cooldown)
    }

    pub fn register_hit(&mut self, target: Entity, now: f32) {
        self.hit_this_stage.insert(target);
        self.last_hit_time.insert(target, now);
    }
}

/// Weapon hitbox: anchors, sweep tuning and per-stage tables
#[derive(Component, Debug, Clone)]
pub struct WeaponHitbox {
    /// Local offsets, rotated by facing (x right, y up, z forward)
    pub base_offset: Vec3,
    pub tip_offset: Vec3,
    pub capsule_radius: f32,
    pub use_tip_sweep: bool,
    /// Falls back to capsule_radius when <= 0
    pub tip_sweep_radius: f32,
    /// Intermediate samples between the previous and current tip
    pub sweep_sub_samples: u32,

    /// Stages this weapon arms for
    pub stages: Vec<i32>,
    pub damage_per_stage: Vec<(i32, f32)>,
    pub default_damage: f32,
    /// Explicit heavy classification; missing stages fall back to
    /// stage 3 and the uppercut being heavy
    pub heavy_stages: Vec<(i32, bool)>,
    pub uppercut_stage: i32,

    pub hit_cooldown_per_target: f32,
    pub max_targets_per_sample: usize,
    pub skip_same_faction: bool,
    pub launch_configs: Vec<LaunchConfig>,

    pub active: Option<ActiveHitVolume>,
}

impl Default for WeaponHitbox {
    fn default() -> Self {
        Self {
            base_offset: Vec3::new(0.0, 1.0, 0.4),
            tip_offset: Vec3::new(0.0, 1.0, 1.3),
            capsule_radius: 0.35,
            use_tip_sweep: true,
            tip_sweep_radius: 0.35,
            sweep_sub_samples: 2,
            stages: vec![1, 2, 3, 4, 11, 12, 13],
            damage_per_stage: vec![
                (1, 8.0),
                (2, 10.0),
                (3, 14.0),
                (4, 18.0),
                (11, 7.0),
                (12, 7.0),
                (13, 9.0),
            ],
            default_damage: 10.0,
            heavy_stages: Vec::new(),
            uppercut_stage: 4,
            hit_cooldown_per_target: 0.15,
            max_targets_per_sample: 16,
            skip_same_faction: true,
            launch_configs: vec![LaunchConfig {
                stage: 4,
                vertical_velocity: 9.0,
                max_height: 5.0,
                delay: 0.0,
                requires_combo: false,
            }],
            active: None,
        }
    }
}

impl WeaponHitbox {
    pub fn damage_for_stage(&self, stage: i32) -> f32 {
        self.damage_per_stage
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, d)| *d)
            .unwrap_or(self.default_damage)
    }

    pub fn is_heavy(&self, stage: i32) -> bool {
        self.heavy_stages
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, heavy)| *heavy)
            .unwrap_or(stage == 3 || stage == self.uppercut_stage)
    }

    pub fn sweep_radius(&self) -> f32 {
        if self.tip_sweep_radius > 0.0 {
            self.tip_sweep_radius
        } else {
            self.capsule_radius
        }
    }

    /// Launch tuning for a stage: an uppercut chained out of a combo
    /// takes its numbers from ComboConfig, everything else from the
    /// first matching table entry whose combo gate passes.
    /// Returns (velocity, max_height, delay).
    pub fn resolve_launch(
        &self,
        stage: i32,
        combo: Option<(&ComboState, &ComboConfig)>,
    ) -> Option<(f32, f32, f32)> {
        let from_combo = combo.is_some_and(|(state, _)| state.uppercut_from_combo);
        if stage == self.uppercut_stage && from_combo {
            if let Some((_, config)) = combo {
                return Some((
                    config.uppercut_launch_velocity,
                    config.uppercut_max_launch_height,
                    config.uppercut_launch_delay,
                ));
            }
        }
        self.launch_configs
            .iter()
            .find(|lc| lc.stage == stage && (!lc.requires_combo || from_combo))
            .map(|lc| (lc.vertical_velocity, lc.max_height, lc.delay))
    }
}

/// Distance from point `p` to segment `ab`
pub fn segment_point_distance(a: Vec3, b: Vec3, p: Vec3) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    let t = if len_sq <= 1e-8 {
        0.0
    } else {
        ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0)
    };
    (a + ab * t - p).length()
}

/// System: arm/disarm weapon volumes from stage events
///
/// End events are drained first so an interrupt-and-restart in the same
/// frame leaves the new stage armed.
pub fn handle_stage_events(
    mut started: EventReader<AttackStageStarted>,
    mut ended: EventReader<AttackStageEnded>,
    mut hitboxes: Query<(&Transform, &Facing, &mut WeaponHitbox)>,
) {
    for event in ended.read() {
        if let Ok((_, _, mut hitbox)) = hitboxes.get_mut(event.entity) {
            if hitbox.active.as_ref().is_some_and(|v| v.stage == event.stage) {
                hitbox.active = None;
            }
        }
    }

    for event in started.read() {
        if let Ok((transform, facing, mut hitbox)) = hitboxes.get_mut(event.entity) {
            if !hitbox.stages.contains(&event.stage) {
                continue;
            }
            let tip = transform.translation + facing.oriented_offset(hitbox.tip_offset);
            hitbox.active = Some(ActiveHitVolume::new(event.stage, event.is_air, tip));
        }
    }
}

/// System: per-frame swept overlap test for armed volumes
pub fn sweep_hitboxes(
    time: Res<Time>,
    mut attackers: Query<(
        Entity,
        &Transform,
        &Facing,
        Option<&Actor>,
        Option<(&ComboState, &ComboConfig)>,
        &mut WeaponHitbox,
    )>,
    targets: Query<(Entity, &Transform, Option<&Actor>), With<Damageable>>,
    mut hits: EventWriter<HitConnected>,
    mut launches: EventWriter<LaunchRequest>,
    mut scheduler: ResMut<ActionScheduler>,
) {
    let now = time.elapsed_secs();

    for (attacker, transform, facing, actor, combo, mut hitbox) in attackers.iter_mut() {
        let Some(volume) = hitbox.active.as_ref() else {
            continue;
        };
        let stage = volume.stage;
        let is_air = volume.is_air;
        let prev_tip = volume.prev_tip;

        let base = transform.translation + facing.oriented_offset(hitbox.base_offset);
        let tip = transform.translation + facing.oriented_offset(hitbox.tip_offset);

        // Candidates in entity-index order for deterministic truncation
        let mut candidates: Vec<(Entity, Vec3)> = targets
            .iter()
            .filter(|(target, _, target_actor)| {
                if *target == attacker {
                    return false;
                }
                if hitbox.skip_same_faction {
                    if let (Some(a), Some(t)) = (actor, target_actor) {
                        if a.faction_id == t.faction_id {
                            return false;
                        }
                    }
                }
                true
            })
            .map(|(target, target_transform, _)| {
                (
                    target,
                    target_transform.translation + Vec3::Y * TARGET_BODY_CENTER_HEIGHT,
                )
            })
            .collect();
        candidates.sort_by_key(|(target, _)| target.index());

        // Capsule pass plus tip sweep samples, each with its own capacity
        let mut connected: Vec<Entity> = Vec::new();
        let mut seen: HashSet<Entity> = HashSet::new();
        let mut overflow = 0usize;

        let collect = |hit_test: &dyn Fn(Vec3) -> bool,
                           connected: &mut Vec<Entity>,
                           seen: &mut HashSet<Entity>,
                           overflow: &mut usize| {
            let mut in_sample = 0usize;
            for (target, center) in &candidates {
                if !hit_test(*center) {
                    continue;
                }
                if in_sample >= hitbox.max_targets_per_sample {
                    *overflow += 1;
                    continue;
                }
                in_sample += 1;
                if seen.insert(*target) {
                    connected.push(*target);
                }
            }
        };

        let capsule_reach = hitbox.capsule_radius + TARGET_BODY_RADIUS;
        collect(
            &|center| segment_point_distance(base, tip, center) <= capsule_reach,
            &mut connected,
            &mut seen,
            &mut overflow,
        );

        if hitbox.use_tip_sweep {
            if let Some(prev) = prev_tip {
                if (tip - prev).length_squared() > 1e-6 {
                    let sweep_reach = hitbox.sweep_radius() + TARGET_BODY_RADIUS;
                    let samples = hitbox.sweep_sub_samples + 1;
                    for i in 1..=samples {
                        let sample = prev.lerp(tip, i as f32 / samples as f32);
                        collect(
                            &|center| (center - sample).length() <= sweep_reach,
                            &mut connected,
                            &mut seen,
                            &mut overflow,
                        );
                    }
                }
            }
        }

        if overflow > 0 {
            crate::logger::log_warning(&format!(
                "WeaponHitbox: {:?} stage {} dropped {} overflowing candidates",
                attacker, stage, overflow
            ));
        }

        let damage = hitbox.damage_for_stage(stage);
        let heavy = hitbox.is_heavy(stage);
        let launch = hitbox.resolve_launch(stage, combo);
        let cooldown = hitbox.hit_cooldown_per_target;

        let Some(volume) = hitbox.active.as_mut() else {
            continue;
        };
        let mut any_hit = false;
        for target in connected {
            if !volume.can_hit(target, now, cooldown) {
                continue;
            }
            volume.register_hit(target, now);
            any_hit = true;

            hits.write(HitConnected {
                attacker,
                target,
                damage,
                stage,
                heavy,
                attacker_position: transform.translation,
            });

            if let Some((velocity, max_height, delay)) = launch {
                if delay > 0.0 {
                    scheduler.schedule(
                        now + delay,
                        DeferredAction::DelayedLaunch {
                            target,
                            velocity,
                            max_height,
                            heavy,
                        },
                    );
                } else {
                    launches.write(LaunchRequest {
                        target,
                        velocity,
                        max_height,
                        heavy,
                        juggle: true,
                    });
                }
            }
        }

        // Air hits keep the attacker afloat a touch longer
        if any_hit && is_air {
            launches.write(LaunchRequest {
                target: attacker,
                velocity: AIR_HIT_ATTACKER_BUMP,
                max_height: 0.0,
                heavy: false,
                juggle: false,
            });
        }

        volume.prev_tip = Some(tip);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_point_distance() {
        let a = Vec3::ZERO;
        let b = Vec3::new(0.0, 0.0, 2.0);

        // Beside the middle of the segment
        let d = segment_point_distance(a, b, Vec3::new(1.0, 0.0, 1.0));
        assert!((d - 1.0).abs() < 1e-6);

        // Past the tip: clamped to the endpoint
        let d = segment_point_distance(a, b, Vec3::new(0.0, 0.0, 3.0));
        assert!((d - 1.0).abs() < 1e-6);

        // Degenerate segment
        let d = segment_point_distance(a, a, Vec3::new(0.0, 2.0, 0.0));
        assert!((d - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_one_hit_per_stage_until_cooldown() {
        let mut volume = ActiveHitVolume::new(1, false, Vec3::ZERO);
        let target = Entity::PLACEHOLDER;

        assert!(volume.can_hit(target, 0.0, 0.15));
        volume.register_hit(target, 0.0);

        assert!(!volume.can_hit(target, 0.1, 0.15));
        assert!(volume.can_hit(target, 0.15, 0.15));
    }

    #[test]
    fn test_zero_cooldown_blocks_until_stage_end() {
        let mut volume = ActiveHitVolume::new(1, false, Vec3::ZERO);
        let target = Entity::PLACEHOLDER;

        volume.register_hit(target, 0.0);
        assert!(!volume.can_hit(target, 100.0, 0.0));

        // A fresh stage instance starts clean
        let volume = ActiveHitVolume::new(2, false, Vec3::ZERO);
        assert!(volume.can_hit(target, 100.0, 0.0));
    }

    #[test]
    fn test_stage_tables_with_fallbacks() {
        let hitbox = WeaponHitbox::default();
        assert_eq!(hitbox.damage_for_stage(2), 10.0);
        assert_eq!(hitbox.damage_for_stage(99), hitbox.default_damage);

        assert!(!hitbox.is_heavy(1));
        assert!(hitbox.is_heavy(3)); // Fallback: finisher is heavy
        assert!(hitbox.is_heavy(4)); // Fallback: uppercut is heavy

        let mut overridden = WeaponHitbox::default();
        overridden.heavy_stages = vec![(3, false), (1, true)];
        assert!(!overridden.is_heavy(3));
        assert!(overridden.is_heavy(1));
    }

    #[test]
    fn test_launch_resolution_priority() {
        let hitbox = WeaponHitbox::default();
        let combo_config = ComboConfig::default();

        // Uppercut chained from a combo: ComboConfig tuning wins
        let mut state = ComboState::default();
        state.request_stage_override(crate::combat::combo::StageOverride {
            stage: combo_config.uppercut_stage,
            force_air: false,
            from_combo: true,
        });
        state.begin_stage(&combo_config, true);
        assert!(state.uppercut_from_combo);

        let (velocity, max_height, delay) = hitbox
            .resolve_launch(4, Some((&state, &combo_config)))
            .unwrap();
        assert_eq!(velocity, combo_config.uppercut_launch_velocity);
        assert_eq!(max_height, combo_config.uppercut_max_launch_height);
        assert_eq!(delay, combo_config.uppercut_launch_delay);

        // Raw uppercut: weapon table entry
        let idle = ComboState::default();
        let (velocity, _, delay) = hitbox
            .resolve_launch(4, Some((&idle, &combo_config)))
            .unwrap();
        assert_eq!(velocity, 9.0);
        assert_eq!(delay, 0.0);

        // Non-launching stage
        assert!(hitbox.resolve_launch(2, Some((&idle, &combo_config))).is_none());
    }

    #[test]
    fn test_requires_combo_gate() {
        let mut hitbox = WeaponHitbox::default();
        hitbox.launch_configs = vec![LaunchConfig {
            stage: 3,
            vertical_velocity: 6.0,
            max_height: 3.0,
            delay: 0.0,
            requires_combo: true,
        }];

        // No combo context: the gated entry does not apply
        assert!(hitbox.resolve_launch(3, None).is_none());
    }
}
