//! Serde model of the Tiled JSON formats we read.
//!
//! Only the fields the loader uses are declared; everything else in the file
//! is ignored. Missing optional fields fall back to Tiled's own defaults.

use serde::Deserialize;

fn one() -> f32 {
    1.0
}

fn default_tile_px() -> u32 {
    256
}

/// Top level of a `.tmj` map file.
#[derive(Debug, Deserialize)]
pub struct TmjMap {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "default_tile_px")]
    pub tilewidth: u32,
    #[serde(default = "default_tile_px")]
    pub tileheight: u32,
    #[serde(default)]
    pub infinite: bool,
    #[serde(default)]
    pub tilesets: Vec<TmjTilesetRef>,
    #[serde(default)]
    pub layers: Vec<TmjLayer>,
}

/// Tileset entry of a map: either a reference to an external `.tsj` file
/// (`source`) or the tileset fields inline.
#[derive(Debug, Deserialize)]
pub struct TmjTilesetRef {
    pub firstgid: u32,
    pub source: Option<String>,
    pub image: Option<String>,
    pub imagewidth: Option<u32>,
    pub imageheight: Option<u32>,
    pub tilecount: Option<u32>,
    pub columns: Option<u32>,
    pub tilewidth: Option<u32>,
    pub tileheight: Option<u32>,
}

impl TmjTilesetRef {
    /// The inline tileset, if every required field is present.
    pub fn embedded(&self) -> Option<TsjTileset> {
        Some(TsjTileset {
            image: self.image.clone()?,
            imagewidth: self.imagewidth?,
            imageheight: self.imageheight?,
            tilecount: self.tilecount?,
            columns: self.columns?,
            tilewidth: self.tilewidth?,
            tileheight: self.tileheight?,
        })
    }
}

/// A `.tsj` tileset file (single image tilesets only).
#[derive(Debug, Deserialize)]
pub struct TsjTileset {
    pub image: String,
    pub imagewidth: u32,
    pub imageheight: u32,
    pub tilecount: u32,
    pub columns: u32,
    pub tilewidth: u32,
    pub tileheight: u32,
}

/// Tile layer payload: a plain array of gids or an encoded string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TmjLayerData {
    Tiles(Vec<u32>),
    Encoded(String),
}

/// Any layer. Which fields matter depends on `kind`
/// (`tilelayer`, `objectgroup` or `group`).
#[derive(Debug, Deserialize)]
pub struct TmjLayer {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    pub tintcolor: Option<String>,
    #[serde(default = "one")]
    pub opacity: f32,
    #[serde(default = "one")]
    pub parallaxx: f32,
    #[serde(default = "one")]
    pub parallaxy: f32,

    // tilelayer
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    pub encoding: Option<String>,
    pub compression: Option<String>,
    pub data: Option<TmjLayerData>,
    pub chunks: Option<Vec<serde_json::Value>>,

    // objectgroup
    #[serde(default)]
    pub objects: Vec<TmjObject>,

    // group
    #[serde(default)]
    pub layers: Vec<TmjLayer>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TmjPoint {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Deserialize)]
pub struct TmjObject {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    pub template: Option<String>,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    /// Degrees, clockwise.
    #[serde(default)]
    pub rotation: f32,
    pub gid: Option<u32>,
    #[serde(default)]
    pub ellipse: bool,
    #[serde(default)]
    pub point: bool,
    pub polygon: Option<Vec<TmjPoint>>,
    pub polyline: Option<Vec<TmjPoint>>,
}
