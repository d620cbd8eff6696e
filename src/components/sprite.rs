//! Textured quad drawn at its entity's scene node.

use bevy_ecs::prelude::Component;
use glam::{Vec2, Vec4};

/// Region of a texture in normalized UV coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureRect {
    /// Top-left corner.
    pub origin: Vec2,
    pub size: Vec2,
}

impl Default for TextureRect {
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            size: Vec2::ONE,
        }
    }
}

/// Sprite is identified by a texture key. The quad covers one world unit per
/// `pixel_to_meter` texels and is shifted by `offset` (in quad units) so that
/// `(-0.5, -0.5)` centres it on the node.
#[derive(Component, Clone, Debug)]
pub struct Sprite {
    pub tex_key: String,
    pub texture_rect: TextureRect,
    pub offset: Vec2,
    pub pixel_to_meter: f32,
    /// RGBA tint, multiplied in the shader.
    pub color: Vec4,
}

impl Sprite {
    pub fn new(tex_key: impl Into<String>) -> Self {
        Self {
            tex_key: tex_key.into(),
            texture_rect: TextureRect::default(),
            offset: Vec2::ZERO,
            pixel_to_meter: 32.0,
            color: Vec4::ONE,
        }
    }
}
