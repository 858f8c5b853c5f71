//! Deferred combat actions (delayed launches, scheduled stage ends)
//!
//! A min-heap keyed by fire time; equal times fire in FIFO order via a
//! sequence counter. Actions revalidate their target right before firing,
//! so a launch scheduled against a character who died in the meantime is
//! dropped instead of moving a corpse.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use bevy::prelude::*;

use crate::combat::air_combo::AirComboState;
use crate::combat::combo::AttackStageEnded;
use crate::combat::hit_detection::LaunchRequest;
use crate::components::{Health, PhysicsBody};

#[derive(Debug, Clone)]
pub enum DeferredAction {
    /// Launch the target upward (damage was already applied)
    DelayedLaunch {
        target: Entity,
        velocity: f32,
        max_height: f32,
        heavy: bool,
    },
    /// End an air-combo stage for the attacker
    EndAirStage { attacker: Entity, stage: i32 },
}

#[derive(Debug)]
struct Scheduled {
    fire_at: f32,
    seq: u64,
    action: DeferredAction,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fire_at
            .total_cmp(&other.fire_at)
            .then(self.seq.cmp(&other.seq))
    }
}

#[derive(Resource, Default)]
pub struct ActionScheduler {
    heap: BinaryHeap<Reverse<Scheduled>>,
    next_seq: u64,
}

impl ActionScheduler {
    pub fn schedule(&mut self, fire_at: f32, action: DeferredAction) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Scheduled {
            fire_at,
            seq,
            action,
        }));
    }

    /// Pops the next action whose fire time has passed
    pub fn pop_due(&mut self, now: f32) -> Option<DeferredAction> {
        if self.heap.peek().is_some_and(|Reverse(s)| s.fire_at <= now) {
            self.heap.pop().map(|Reverse(s)| s.action)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

/// System: fire due actions, revalidating targets
pub fn pump_scheduler(
    time: Res<Time>,
    mut scheduler: ResMut<ActionScheduler>,
    health: Query<&Health>,
    bodies: Query<(), With<PhysicsBody>>,
    air_combos: Query<&AirComboState>,
    mut launches: EventWriter<LaunchRequest>,
    mut ended: EventWriter<AttackStageEnded>,
) {
    let now = time.elapsed_secs();

    while let Some(action) = scheduler.pop_due(now) {
        match action {
            DeferredAction::DelayedLaunch {
                target,
                velocity,
                max_height,
                heavy,
            } => {
                let alive = health.get(target).is_ok_and(|h| h.is_alive());
                if !alive || bodies.get(target).is_err() {
                    crate::logger::log(&format!(
                        "Scheduler: dropping launch for invalid target {:?}",
                        target
                    ));
                    continue;
                }
                launches.write(LaunchRequest {
                    target,
                    velocity,
                    max_height,
                    heavy,
                    juggle: true,
                });
            }
            DeferredAction::EndAirStage { attacker, stage } => {
                if air_combos.get(attacker).is_err() {
                    continue;
                }
                ended.write(AttackStageEnded {
                    entity: attacker,
                    stage,
                    is_air: true,
                });
            }
        }
    }
}
