//! Collision shapes attached to static map bodies.
//!
//! Shapes are data for the physics backend; vertices are in the collider's
//! local space (tile units).

use bevy_ecs::prelude::Component;
use glam::Vec2;

#[derive(Clone, Debug, PartialEq)]
pub enum ColliderShape {
    /// Closed polygon; boxes are stored as four-vertex loops.
    Loop(Vec<Vec2>),
    /// Open polyline with ghost vertices on both ends.
    Chain {
        vertices: Vec<Vec2>,
        prev: Vec2,
        next: Vec2,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollisionLayer {
    Map,
    /// One-way platforms, only solid from above.
    MapPlatforms,
    Player,
}

#[derive(Component, Clone, Debug)]
pub struct Collider {
    pub shape: ColliderShape,
    pub layer: CollisionLayer,
}
