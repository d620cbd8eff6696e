//! Keel Engine library.
//!
//! A 2D engine core built around a transform hierarchy stored in a
//! `bevy_ecs` world. Exposes the scene graph, components, resources, systems,
//! the Tiled map loader and editor tooling for use by game code and
//! integration tests.

pub mod components;
pub mod editor;
pub mod game;
pub mod resources;
pub mod scene;
pub mod systems;
pub mod tilemap;
