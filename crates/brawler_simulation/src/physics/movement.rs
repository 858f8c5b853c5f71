//! Kinematic controller for fighters
//!
//! Architecture:
//! - Rapier for collisions (RigidBody::KinematicPositionBased)
//! - Custom velocity integration (no Rapier forces)
//! - Gravity + ground check + movement input
//!
//! Determinism: fixed timestep (60Hz), deterministic Rapier build

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::combat::air_combo::{AirComboConfig, AirComboState};
use crate::combat::combo::{ComboConfig, ComboState};
use crate::combat::damage::Damageable;
use crate::combat::dash::{DashConfig, DashState};
use crate::combat::guard::GuardState;
use crate::combat::hit_detection::WeaponHitbox;
use crate::combat::knockdown::KnockdownState;
use crate::components::{Actor, Facing, InputSnapshot, PhysicsBody, StaggerState};
use crate::physics::collision;
use crate::physics::jump::{JumpConfig, JumpState};

/// Kinematic controller component
///
/// Drives character locomotion (planar input + gravity).
/// Rapier handles collisions, velocity is integrated by us.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct KinematicController {
    /// Movement speed (m/s)
    pub move_speed: f32,
    /// Gravity (m/s²), negative is down
    pub gravity: f32,
    /// On the ground (gates gravity, jumps, combo rules)
    pub grounded: bool,
}

impl Default for KinematicController {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            gravity: -9.81,
            grounded: true,
        }
    }
}

/// Caps a requested launch velocity so the ballistic apex stays within
/// `max_height` meters above the launch point. `max_height <= 0` disables
/// the cap.
pub fn launch_velocity_for_height(requested: f32, max_height: f32, gravity: f32) -> f32 {
    if max_height <= 0.0 {
        return requested;
    }
    let cap = (2.0 * gravity.abs() * max_height).sqrt();
    requested.min(cap)
}

/// System: gravity → velocity
pub fn apply_gravity(
    mut query: Query<(&KinematicController, &mut PhysicsBody)>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (controller, mut body) in query.iter_mut() {
        if !controller.grounded {
            body.velocity.y += controller.gravity * delta;
        }
    }
}

/// System: planar movement from input
///
/// Skipped while a dash owns the planar velocity, while staggered or
/// knocked down, and for the dead. Facing follows the movement direction.
pub fn apply_movement_input(
    mut query: Query<
        (
            &KinematicController,
            &InputSnapshot,
            &StaggerState,
            Option<&DashState>,
            Option<&KnockdownState>,
            &mut PhysicsBody,
            &mut Facing,
        ),
        Without<crate::components::Dead>,
    >,
) {
    for (controller, input, stagger, dash, knockdown, mut body, mut facing) in query.iter_mut() {
        if dash.is_some_and(|d| d.is_dashing()) {
            continue;
        }
        let incapacitated =
            stagger.is_staggered() || knockdown.is_some_and(|k| k.knocked_down || k.dead);
        let direction = Vec3::new(input.move_dir.x, 0.0, input.move_dir.y);

        if !incapacitated && direction.length_squared() > 0.01 {
            let direction = direction.normalize();
            // Planar velocity only, Y stays with gravity handling
            body.velocity.x = direction.x * controller.move_speed;
            body.velocity.z = direction.z * controller.move_speed;
            facing.forward = direction;
        } else {
            // Stop planar movement (friction)
            body.velocity.x = 0.0;
            body.velocity.z = 0.0;
        }
    }
}

/// System: velocity sync to Rapier
///
/// Rapier applies velocity to KinematicPositionBased bodies itself; this
/// only mirrors our PhysicsBody.velocity into the Rapier component.
pub fn sync_velocity_to_rapier(
    mut query: Query<(&PhysicsBody, &mut Velocity), With<KinematicController>>,
) {
    for (body, mut rapier_velocity) in query.iter_mut() {
        rapier_velocity.linvel = body.velocity;
    }
}

/// System: ground detection via simple Y check
///
/// Floor at y = 0, capsule bottom at the origin. Grounded when close to
/// the floor and not moving upward (launched characters leave the ground
/// the same frame the launch velocity lands). Grounded bodies never sink.
///
/// TODO: replace with a RapierContext raycast once the full plugin is wired
pub fn ground_detection(
    mut query: Query<(&mut Transform, &mut KinematicController, &mut PhysicsBody)>,
) {
    for (mut transform, mut controller, mut body) in query.iter_mut() {
        controller.grounded = transform.translation.y <= 0.05 && body.velocity.y <= 0.0;
        if controller.grounded {
            body.velocity.y = 0.0;
            transform.translation.y = transform.translation.y.max(0.0);
        }
    }
}

/// System: velocity → Transform integration (headless mode, no Rapier step)
pub fn integrate_velocity_to_transform(
    mut query: Query<(&PhysicsBody, &mut Transform), With<KinematicController>>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (body, mut transform) in query.iter_mut() {
        transform.translation += body.velocity * delta;
    }
}

/// Plugin: kinematic controller systems
///
/// Everything runs in FixedUpdate for determinism, before the Rapier step.
pub struct KinematicControllerPlugin;

impl Plugin for KinematicControllerPlugin {
    fn build(&self, app: &mut App) {
        use bevy_rapier3d::plugin::PhysicsSet;

        app.add_systems(
            FixedUpdate,
            (
                ground_detection,
                apply_movement_input,
                apply_gravity,
                sync_velocity_to_rapier,
                integrate_velocity_to_transform, // Direct integration (Rapier only for collisions)
            )
                .chain()
                .before(PhysicsSet::SyncBackend),
        );
    }
}

/// Spawn helper: a fully equipped fighter
///
/// Entity gets the complete combat kit: kinematic body, input slot,
/// combo/guard/knockdown/dash state, weapon hitbox, damage pipeline
/// state and Rapier collision (capsule, actor collision groups).
pub fn spawn_fighter(commands: &mut Commands, position: Vec3, faction_id: u64) -> Entity {
    commands
        .spawn((
            Transform::from_translation(position),
            // Actor pulls in Health, Facing, StaggerState
            Actor { faction_id },
            InputSnapshot::default(),
            // Movement
            (
                PhysicsBody::default(),
                KinematicController::default(),
                JumpState::default(),
                JumpConfig::default(),
            ),
            // Combat kit
            (
                ComboState::default(),
                ComboConfig::default(),
                AirComboState::default(),
                AirComboConfig::default(),
                GuardState::default(),
                KnockdownState::default(),
                DashState::default(),
                DashConfig::default(),
                Damageable::default(),
                WeaponHitbox::default(),
                crate::health_sync::HealthSync::default(),
            ),
            // Rapier physics
            (
                RigidBody::KinematicPositionBased,
                Collider::capsule_y(0.5, 0.4), // 1.8m character, capsule center at chest height
                Velocity::default(),
                collision::actor_groups(),
            ),
        ))
        .id()
}
