//! Human-readable entity names.

use bevy_ecs::prelude::*;

/// Display name shown by the inspector and in log messages.
#[derive(Component, Clone, Debug, PartialEq, Eq)]
pub struct EntityName(pub String);

impl EntityName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Name of `entity`, or `entity <id>` when it has none.
pub fn entity_display_name(world: &World, entity: Entity) -> String {
    match world.get::<EntityName>(entity) {
        Some(name) => name.0.clone(),
        None => format!("entity {:?}", entity),
    }
}
