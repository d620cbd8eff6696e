//! Tile layer geometry produced by the map loader.
//!
//! A [`TileLayer`] holds one [`TileLayerPart`] per tileset used by the layer.
//! Each part lists the quads to draw with that tileset's texture, in tile
//! units relative to the layer's scene node.

use bevy_ecs::prelude::Component;
use glam::{Vec2, Vec4};

/// One tile: its cell in layer space and the UVs of its four corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileQuad {
    /// Bottom-left corner of the tile cell.
    pub position: Vec2,
    pub uv_top_left: Vec2,
    pub uv_top_right: Vec2,
    pub uv_bottom_left: Vec2,
    pub uv_bottom_right: Vec2,
}

#[derive(Clone, Debug, Default)]
pub struct TileLayerPart {
    pub tex_key: String,
    pub tiles: Vec<TileQuad>,
}

#[derive(Component, Clone, Debug)]
pub struct TileLayer {
    pub name: String,
    pub color: Vec4,
    pub parts: Vec<TileLayerPart>,
}

impl TileLayer {
    pub fn tile_count(&self) -> usize {
        self.parts.iter().map(|p| p.tiles.len()).sum()
    }
}
