//! Camera parameters for the render traversal.

use bevy_ecs::prelude::Component;

/// Default distance for new cameras.
pub const DEFAULT_CAMERA_DISTANCE: f32 = 10.0;

/// View parameters; the camera's position comes from its scene node.
///
/// `distance` is the half-height of the visible area in world units.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub distance: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            distance: DEFAULT_CAMERA_DISTANCE,
        }
    }
}
