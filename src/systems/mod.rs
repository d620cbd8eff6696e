//! Engine systems.
//!
//! Systems here take the [`Scene`](crate::scene::Scene) (or its world)
//! explicitly and are called in a fixed order by
//! [`Game::tick`](crate::game::Game::tick).
//!
//! Submodules overview
//! - [`follower`] – move followers (e.g. the camera) toward their targets
//! - [`parallax`] – scroll parallax layers against the camera
//! - [`physics`] – integrate rigid bodies and sync poses into the scene graph
//! - [`render`] – walk the scene and emit draw commands to a renderer
//! - [`time`] – update simulation time and delta
//! - [`traversal`] – ordered pre-order walk over the hierarchy

pub mod follower;
pub mod parallax;
pub mod physics;
pub mod render;
pub mod time;
pub mod traversal;
