//! Rapier collision groups
//!
//! Two layers are enough for the combat core: characters and ground.
//! Corpses drop out of the character layer so survivors walk through
//! them, but keep the ground filter so they do not fall through floors.

use bevy_rapier3d::prelude::*;

pub const ACTOR_GROUP: Group = Group::GROUP_1;
pub const GROUND_GROUP: Group = Group::GROUP_2;

/// Living characters: collide with each other and the ground
pub fn actor_groups() -> CollisionGroups {
    CollisionGroups::new(ACTOR_GROUP, ACTOR_GROUP | GROUND_GROUP)
}

/// Dead characters: traversable, ground contact preserved
pub fn corpse_groups() -> CollisionGroups {
    CollisionGroups::new(Group::NONE, GROUND_GROUP)
}
