//! Tiled map support.
//!
//! Submodules overview:
//! - [`tmj`] – serde model of `.tmj` maps and `.tsj` tilesets
//! - [`loader`] – turn a map into scene entities (layers, tiles, sprites, colliders, player)

pub mod loader;
pub mod tmj;

pub use loader::{add_map_to_scene, load_map, spawn_player};
