//! Parallax scrolling for map layers.

use bevy_ecs::prelude::Component;
use glam::Vec2;

/// Moves the entity with a fraction of the active camera's motion.
///
/// `factor` comes from Tiled: 1 is no parallax, 0 sticks to the camera.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Parallax {
    pub factor: Vec2,
    /// World position with the camera at the origin. Captured from the node
    /// on the first tick when unset.
    pub offset: Option<Vec2>,
}

impl Parallax {
    pub fn new(factor: Vec2) -> Self {
        Self {
            factor,
            offset: None,
        }
    }
}
