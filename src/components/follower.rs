//! Component making an entity chase another entity's world position.
//!
//! The [`follower_system`](crate::systems::follower::follower_system) moves
//! the follower's scene node toward the target each tick. Typically used to
//! have the camera follow the player.

use bevy_ecs::prelude::{Component, Entity};
use glam::Vec2;

#[derive(Component, Clone, Copy, Debug)]
pub struct Follower {
    pub target: Entity,
    /// Per-axis catch-up rate, in fractions of the remaining distance per second.
    pub speed: Vec2,
}

impl Follower {
    pub fn new(target: Entity) -> Self {
        Self {
            target,
            speed: Vec2::ONE,
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = Vec2::splat(speed);
        self
    }
}
