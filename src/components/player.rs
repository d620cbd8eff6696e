use bevy_ecs::prelude::Component;

/// Marks the player entity spawned from a map.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct PlayerTag;
