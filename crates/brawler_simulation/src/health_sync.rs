//! Remote health authority
//!
//! An outer layer (server, save system) may push health snapshots in.
//! The remote max is only trusted when it reports a positive value, and
//! once trusted it stays authoritative: the local fallback default never
//! overwrites it back.

use bevy::prelude::*;

use crate::components::Health;

/// Event: health snapshot pushed from outside
#[derive(Event, Debug, Clone, Copy)]
pub struct HealthSyncReceived {
    pub entity: Entity,
    pub current: f32,
    pub max: f32,
}

#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct HealthSync {
    /// Max has been remote-authoritative at least once
    pub has_remote_max: bool,
}

/// System: apply pushed snapshots, clamped into the local invariants
pub fn apply_health_sync(
    mut events: EventReader<HealthSyncReceived>,
    mut query: Query<(&mut Health, &mut HealthSync)>,
) {
    for event in events.read() {
        let Ok((mut health, mut sync)) = query.get_mut(event.entity) else {
            crate::logger::log_warning(&format!(
                "health_sync: {:?} has no Health component",
                event.entity
            ));
            continue;
        };

        if event.max > 0.0 {
            health.max = event.max.max(1.0);
            sync.has_remote_max = true;
        }
        health.current = event.current.clamp(0.0, health.max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sync_app() -> App {
        let mut app = App::new();
        app.add_event::<HealthSyncReceived>()
            .add_systems(Update, apply_health_sync);
        app
    }

    #[test]
    fn test_nonpositive_max_never_regresses() {
        let mut app = sync_app();
        let entity = app
            .world_mut()
            .spawn((
                Health::new(150.0),
                HealthSync {
                    has_remote_max: true,
                },
            ))
            .id();

        // A zero remote max keeps the local one, current still applies
        app.world_mut().send_event(HealthSyncReceived {
            entity,
            current: 40.0,
            max: 0.0,
        });
        app.update();

        let health = app.world().get::<Health>(entity).unwrap();
        assert_eq!(health.max, 150.0);
        assert_eq!(health.current, 40.0);
        assert!(app.world().get::<HealthSync>(entity).unwrap().has_remote_max);
    }

    #[test]
    fn test_positive_max_trusted_and_current_clamped() {
        let mut app = sync_app();
        let entity = app
            .world_mut()
            .spawn((Health::new(100.0), HealthSync::default()))
            .id();

        app.world_mut().send_event(HealthSyncReceived {
            entity,
            current: 500.0,
            max: 120.0,
        });
        app.update();

        let health = app.world().get::<Health>(entity).unwrap();
        assert_eq!(health.max, 120.0);
        assert_eq!(health.current, 120.0); // Clamped into the remote max
        assert!(app.world().get::<HealthSync>(entity).unwrap().has_remote_max);
    }
}
