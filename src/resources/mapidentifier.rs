use std::path::PathBuf;

use bevy_ecs::prelude::Resource;

/// Which map is currently loaded into the scene.
#[derive(Resource, Clone, Debug, PartialEq, Eq)]
pub struct MapIdentifier {
    pub name: String,
    pub path: PathBuf,
}
