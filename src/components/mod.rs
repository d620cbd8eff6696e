//! ECS components for entities.
//!
//! This module groups all component types that can be attached to entities in
//! the scene world. The transform hierarchy itself lives in [`scenenode`];
//! the other components hang data for rendering, physics and gameplay off the
//! entities of that hierarchy.
//!
//! Submodules overview:
//! - [`camera`] – view distance of a camera entity
//! - [`collider`] – static collision shapes built from map layers
//! - [`entityname`] – display name used by the inspector and logs
//! - [`follower`] – chase another entity's world position
//! - [`parallax`] – layer scrolling relative to the camera
//! - [`player`] – tag for the player entity
//! - [`rigidbody`] – simulated body that owns its entity's world pose
//! - [`scenenode`] – parent/child links and local/global transforms
//! - [`sprite`] – textured quad drawn at a node
//! - [`tilelayer`] – tile quads of one map layer
//! - [`transform2d`] – 2D transform value type

pub mod camera;
pub mod collider;
pub mod entityname;
pub mod follower;
pub mod parallax;
pub mod player;
pub mod rigidbody;
pub mod scenenode;
pub mod sprite;
pub mod tilelayer;
pub mod transform2d;
