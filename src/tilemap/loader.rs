//! Builds scene entities from a Tiled `.tmj` map.
//!
//! The map's layer tree becomes a subtree of the scene graph: a "Map" root,
//! one node per layer (group layers nest), and below each layer node the
//! entities that layer produces (tile layer, sprites, colliders, player).
//!
//! Tiled works in pixels with y pointing down. Everything is converted to tile
//! units with y up, so one tile is one world unit.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bevy_ecs::prelude::*;
use glam::{Vec2, Vec4};
use log::{error, info, warn};

use super::tmj::{TmjLayer, TmjLayerData, TmjMap, TmjObject, TmjPoint, TsjTileset};
use crate::components::camera::Camera;
use crate::components::collider::{Collider, ColliderShape, CollisionLayer};
use crate::components::follower::Follower;
use crate::components::parallax::Parallax;
use crate::components::player::PlayerTag;
use crate::components::rigidbody::RigidBody;
use crate::components::sprite::{Sprite, TextureRect};
use crate::components::tilelayer::{TileLayer, TileLayerPart, TileQuad};
use crate::components::transform2d::Transform2D;
use crate::resources::mapidentifier::MapIdentifier;
use crate::scene::Scene;

const FLIP_HORIZONTAL: u32 = 1 << 31;
const FLIP_VERTICAL: u32 = 1 << 30;
const FLIP_DIAGONAL: u32 = 1 << 29;
const FLIP_MASK: u32 = FLIP_HORIZONTAL | FLIP_VERTICAL | FLIP_DIAGONAL;

const EMPTY_TILE: u32 = 0;

const PLAYER_TEMPLATE_SUFFIX: &str = "/player.tj";
const PLAYER_TEXTURE: &str = "textures/player";
const PLAYER_HALF_EXTENTS: Vec2 = Vec2::new(0.25, 0.4);

/// Camera settings applied by [`load_map`] when the map has a player.
const PLAYER_CAMERA_DISTANCE: f32 = 4.0;
const PLAYER_CAMERA_FOLLOW_SPEED: f32 = 8.0;

struct Tileset {
    first_gid: u32,
    columns: u32,
    rows: u32,
    /// Tile size over image size, i.e. one tile in UV units.
    uv_tile: Vec2,
    tex_key: String,
}

impl Tileset {
    fn from_tsj(first_gid: u32, tsj: &TsjTileset, base_dir: &Path) -> Result<Self, String> {
        if tsj.columns == 0 || tsj.imagewidth == 0 || tsj.imageheight == 0 {
            return Err(format!("Tileset {} has an empty image or no columns", tsj.image));
        }
        Ok(Self {
            first_gid,
            columns: tsj.columns,
            rows: tsj.tilecount / tsj.columns,
            uv_tile: Vec2::new(
                tsj.tilewidth as f32 / tsj.imagewidth as f32,
                tsj.tileheight as f32 / tsj.imageheight as f32,
            ),
            tex_key: texture_key(&base_dir.join(&tsj.image)),
        })
    }

    /// UV rectangle of a global tile id (flip bits cleared).
    fn texture_rect(&self, gid: u32) -> Option<TextureRect> {
        let index = gid.checked_sub(self.first_gid)?;
        if index >= self.columns * self.rows {
            return None;
        }
        let cell = Vec2::new((index % self.columns) as f32, (index / self.columns) as f32);
        Some(TextureRect {
            origin: cell * self.uv_tile,
            size: self.uv_tile,
        })
    }
}

/// Texture identifier: the image path without extension, `/`-separated.
fn texture_key(path: &Path) -> String {
    path.with_extension("")
        .to_string_lossy()
        .replace('\\', "/")
}

/// Parse `#RRGGBB` or `#AARRGGBB` (leading `#` optional) into RGBA.
pub fn parse_html_color(input: &str) -> Option<Vec4> {
    let hex = input.strip_prefix('#').unwrap_or(input);
    let byte = |i: usize| -> Option<f32> {
        let digits = hex.get(i..i + 2)?;
        u8::from_str_radix(digits, 16).ok().map(|v| v as f32 / 255.0)
    };
    match hex.len() {
        6 => Some(Vec4::new(byte(0)?, byte(2)?, byte(4)?, 1.0)),
        8 => Some(Vec4::new(byte(2)?, byte(4)?, byte(6)?, byte(0)?)),
        _ => None,
    }
}

/// Decode a little-endian `u32` tile buffer.
fn decode_base64_tiles(data: &str) -> Result<Vec<u32>, String> {
    let bytes = BASE64
        .decode(data.trim())
        .map_err(|e| format!("Invalid base64 tile data: {}", e))?;
    if bytes.len() % 4 != 0 {
        return Err(format!(
            "Tile data has {} bytes, not a multiple of 4",
            bytes.len()
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// Single-use loader state while walking the layer tree.
struct TmjLoader<'s> {
    scene: &'s mut Scene,
    map_name: String,
    base_dir: PathBuf,
    tile_size: f32,
    /// Sorted by descending first gid.
    tilesets: Vec<Tileset>,
    /// Node new layer nodes are attached to.
    layer_node: Entity,
    color_stack: Vec<Vec4>,
    parallax_stack: Vec<Vec2>,
}

impl<'s> TmjLoader<'s> {
    fn convert(&self, v: Vec2) -> Vec2 {
        let v = v / self.tile_size;
        Vec2::new(v.x, -v.y)
    }

    fn convert_point(&self, p: TmjPoint) -> Vec2 {
        self.convert(Vec2::new(p.x, p.y))
    }

    fn color(&self) -> Vec4 {
        self.color_stack.iter().fold(Vec4::ONE, |acc, c| acc * *c)
    }

    fn parallax(&self) -> Vec2 {
        self.parallax_stack.iter().fold(Vec2::ONE, |acc, p| acc * *p)
    }

    /// Tileset index and UV rect for a gid; tilesets are sorted so the first
    /// one starting at or below `gid` owns it.
    fn lookup(&self, gid: u32) -> Option<(usize, TextureRect)> {
        let index = self.tilesets.iter().position(|t| gid >= t.first_gid)?;
        Some((index, self.tilesets[index].texture_rect(gid)?))
    }

    fn load_tilesets(&mut self, map: &TmjMap) -> Result<(), String> {
        for (index, entry) in map.tilesets.iter().enumerate() {
            let tileset = match (&entry.source, entry.embedded()) {
                (Some(source), _) => {
                    let path = self.base_dir.join(source);
                    let text = std::fs::read_to_string(&path)
                        .map_err(|e| format!("Failed to read tileset {:?}: {}", path, e))?;
                    let tsj: TsjTileset = serde_json::from_str(&text)
                        .map_err(|e| format!("Failed to parse tileset {:?}: {}", path, e))?;
                    let tileset_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
                    Tileset::from_tsj(entry.firstgid, &tsj, &tileset_dir)?
                }
                (None, Some(tsj)) => Tileset::from_tsj(entry.firstgid, &tsj, &self.base_dir)?,
                (None, None) => {
                    return Err(format!(
                        "{}: Tileset {}: Invalid format",
                        self.map_name, index
                    ));
                }
            };
            self.tilesets.push(tileset);
        }
        self.tilesets.sort_by(|a, b| b.first_gid.cmp(&a.first_gid));
        Ok(())
    }

    fn load_layers(&mut self, layers: &[TmjLayer]) -> Result<(), String> {
        for layer in layers {
            let name = if layer.name.is_empty() {
                "Map Layer"
            } else {
                layer.name.as_str()
            };

            let offset = self.convert(Vec2::new(layer.x, layer.y));
            let node = self.scene.create_entity(name);
            self.scene.add_scene_node(
                node,
                Transform2D::from_position(offset),
                Some(self.layer_node),
            );

            let mut color = match layer.tintcolor.as_deref() {
                Some(html) => parse_html_color(html).unwrap_or_else(|| {
                    warn!("{}: Invalid tint color {:?}", self.map_name, html);
                    Vec4::ONE
                }),
                None => Vec4::ONE,
            };
            color.w *= layer.opacity;

            let parent_node = self.layer_node;
            self.layer_node = node;
            self.color_stack.push(color);
            self.parallax_stack
                .push(Vec2::new(layer.parallaxx, layer.parallaxy));

            let result = match layer.kind.as_str() {
                "tilelayer" => self.load_tile_layer(layer, name),
                "objectgroup" if name.starts_with("Collision") => {
                    self.load_collision_layer(layer, name);
                    Ok(())
                }
                "objectgroup" => {
                    self.load_object_layer(layer);
                    Ok(())
                }
                "group" => self.load_layers(&layer.layers),
                other => Err(format!("{}: Unknown layer type: {}", self.map_name, other)),
            };

            self.parallax_stack.pop();
            self.color_stack.pop();
            self.layer_node = parent_node;
            result?;
        }
        Ok(())
    }

    fn layer_tiles(&self, layer: &TmjLayer) -> Result<Vec<u32>, String> {
        if layer.chunks.is_some() {
            return Err(format!(
                "{}: Chunked (infinite) maps are not supported",
                self.map_name
            ));
        }
        if layer.compression.as_deref().is_some_and(|c| !c.is_empty()) {
            return Err(format!(
                "{}: Compressed tile data is not supported",
                self.map_name
            ));
        }
        match (layer.encoding.as_deref(), &layer.data) {
            (Some("base64"), Some(TmjLayerData::Encoded(data))) => decode_base64_tiles(data),
            (None | Some("csv"), Some(TmjLayerData::Tiles(tiles))) => Ok(tiles.clone()),
            (_, None) => Err(format!("{}: Missing data field", self.map_name)),
            (encoding, Some(_)) => Err(format!(
                "{}: Unsupported tile data encoding {:?}",
                self.map_name, encoding
            )),
        }
    }

    fn load_tile_layer(&mut self, layer: &TmjLayer, name: &str) -> Result<(), String> {
        let tiles = self.layer_tiles(layer)?;
        let expected = layer.width as usize * layer.height as usize;
        if tiles.len() != expected {
            return Err(format!(
                "{}: data length does not match layer dimensions tileCount={} width={} height={}",
                self.map_name,
                tiles.len(),
                layer.width,
                layer.height
            ));
        }

        let mut parts: Vec<TileLayerPart> = self
            .tilesets
            .iter()
            .map(|t| TileLayerPart {
                tex_key: t.tex_key.clone(),
                tiles: Vec::new(),
            })
            .collect();

        let width = layer.width.max(1) as usize;
        for (index, tile) in tiles.into_iter().enumerate() {
            if tile == EMPTY_TILE {
                continue;
            }
            let gid = tile & !FLIP_MASK;
            let Some((tileset_index, rect)) = self.lookup(gid) else {
                warn!("{}: Layer {}: no tileset for gid {}", self.map_name, name, gid);
                continue;
            };

            let mut top_left = rect.origin;
            let mut top_right = rect.origin + Vec2::new(rect.size.x, 0.0);
            let mut bottom_left = rect.origin + Vec2::new(0.0, rect.size.y);
            let mut bottom_right = rect.origin + rect.size;
            if tile & FLIP_VERTICAL != 0 {
                std::mem::swap(&mut top_left, &mut bottom_left);
                std::mem::swap(&mut top_right, &mut bottom_right);
            }
            if tile & FLIP_HORIZONTAL != 0 {
                std::mem::swap(&mut top_left, &mut top_right);
                std::mem::swap(&mut bottom_left, &mut bottom_right);
            }
            if tile & FLIP_DIAGONAL != 0 {
                std::mem::swap(&mut top_right, &mut bottom_left);
            }

            let column = (index % width) as f32;
            let row = (index / width) as f32;
            parts[tileset_index].tiles.push(TileQuad {
                position: Vec2::new(column, -row - 1.0),
                uv_top_left: top_left,
                uv_top_right: top_right,
                uv_bottom_left: bottom_left,
                uv_bottom_right: bottom_right,
            });
        }
        parts.retain(|p| !p.tiles.is_empty());

        let (color, parallax) = (self.color(), self.parallax());
        let entity = self.scene.create_entity(name);
        self.scene
            .add_scene_node(entity, Transform2D::IDENTITY, Some(self.layer_node));
        self.scene.world_mut().entity_mut(entity).insert(TileLayer {
            name: name.to_string(),
            color,
            parts,
        });
        self.insert_parallax(entity, parallax);
        Ok(())
    }

    fn load_object_layer(&mut self, layer: &TmjLayer) {
        for object in &layer.objects {
            match (&object.template, object.gid) {
                (Some(template), _) if template.ends_with(PLAYER_TEMPLATE_SUFFIX) => {
                    let position = self.convert(Vec2::new(
                        object.x + self.tile_size / 2.0,
                        object.y - self.tile_size / 2.0,
                    ));
                    spawn_player(self.scene, position, Some(self.layer_node));
                }
                (Some(template), _) => {
                    error!("{}: Unknown entity template: {}", self.map_name, template);
                }
                (None, Some(gid)) => self.load_tile_object(object, gid),
                (None, None) => {
                    warn!(
                        "{}: Object {} has neither template nor gid, skipped",
                        self.map_name, object.id
                    );
                }
            }
        }
    }

    fn load_tile_object(&mut self, object: &TmjObject, tile: u32) {
        let gid = tile & !FLIP_MASK;
        let Some((tileset_index, rect)) = self.lookup(gid) else {
            warn!(
                "{}: Object {}: no tileset for gid {}",
                self.map_name, object.id, gid
            );
            return;
        };

        let rotation = -object.rotation.to_radians();
        let mut scale = Vec2::new(object.width, object.height) / self.tile_size;
        // Tiled pivots tile objects at their bottom-left corner, sprites are
        // centred on their node.
        let position = Vec2::from_angle(rotation).rotate(scale / 2.0)
            + self.convert(Vec2::new(object.x, object.y));
        if tile & FLIP_HORIZONTAL != 0 {
            scale.x = -scale.x;
        }
        if tile & FLIP_VERTICAL != 0 {
            scale.y = -scale.y;
        }

        let entity = self.scene.create_entity(&object.name);
        self.scene.add_scene_node(
            entity,
            Transform2D::new(position, rotation, scale),
            Some(self.layer_node),
        );
        let sprite = Sprite {
            tex_key: self.tilesets[tileset_index].tex_key.clone(),
            texture_rect: rect,
            offset: Vec2::splat(-0.5),
            pixel_to_meter: self.tile_size,
            color: self.color(),
        };
        let parallax = self.parallax();
        self.scene.world_mut().entity_mut(entity).insert(sprite);
        self.insert_parallax(entity, parallax);
    }

    fn insert_parallax(&mut self, entity: Entity, factor: Vec2) {
        if factor != Vec2::ONE {
            self.scene
                .world_mut()
                .entity_mut(entity)
                .insert(Parallax::new(factor));
        }
    }

    fn load_collision_layer(&mut self, layer: &TmjLayer, name: &str) {
        let collision_layer = if name.ends_with("Platforms") {
            CollisionLayer::MapPlatforms
        } else {
            CollisionLayer::Map
        };

        for object in &layer.objects {
            if object.ellipse {
                warn!("{}: Ellipse collider not supported. id={}", self.map_name, object.id);
                continue;
            }
            if object.point {
                warn!("{}: Point collider not supported. id={}", self.map_name, object.id);
                continue;
            }
            if object.rotation != 0.0 {
                warn!("{}: Collider rotation not supported. id={}", self.map_name, object.id);
                continue;
            }

            let Some(shape) = self.collider_shape(object) else {
                continue;
            };

            let entity = self.scene.create_entity("Collider");
            let position = self.convert(Vec2::new(object.x, object.y));
            self.scene.add_scene_node(
                entity,
                Transform2D::from_position(position),
                Some(self.layer_node),
            );
            self.scene.add_rigid_body(entity, RigidBody::fixed());
            self.scene.world_mut().entity_mut(entity).insert(Collider {
                shape,
                layer: collision_layer,
            });
        }
    }

    fn collider_shape(&self, object: &TmjObject) -> Option<ColliderShape> {
        if let Some(polygon) = &object.polygon {
            if polygon.len() < 3 {
                error!("{}: Polygon collider with {} vertices. id={}", self.map_name, polygon.len(), object.id);
                return None;
            }
            return Some(ColliderShape::Loop(
                polygon.iter().map(|p| self.convert_point(*p)).collect(),
            ));
        }

        if let Some(polyline) = &object.polyline {
            if polyline.len() < 2 {
                error!("{}: Polyline collider with {} vertices. id={}", self.map_name, polyline.len(), object.id);
                return None;
            }
            let vertices: Vec<Vec2> = polyline.iter().map(|p| self.convert_point(*p)).collect();
            let n = vertices.len();
            // ghost vertices continue the end segments
            let prev = vertices[0] - (vertices[1] - vertices[0]);
            let next = vertices[n - 1] + (vertices[n - 1] - vertices[n - 2]);
            return Some(ColliderShape::Chain {
                vertices,
                prev,
                next,
            });
        }

        if object.width == 0.0 && object.height == 0.0 {
            error!("{}: Invalid size for collider. id={}", self.map_name, object.id);
            return None;
        }
        let (w, h) = (object.width, object.height);
        Some(ColliderShape::Loop(vec![
            self.convert(Vec2::new(0.0, 0.0)),
            self.convert(Vec2::new(0.0, h)),
            self.convert(Vec2::new(w, h)),
            self.convert(Vec2::new(w, 0.0)),
        ]))
    }
}

/// Spawn the player: tag, sprite, dynamic body and collider under `parent`.
pub fn spawn_player(scene: &mut Scene, position: Vec2, parent: Option<Entity>) -> Entity {
    let player = scene.create_entity("Player");
    scene.add_scene_node(player, Transform2D::from_position(position), parent);

    let mut sprite = Sprite::new(PLAYER_TEXTURE);
    sprite.offset = Vec2::splat(-0.5);

    let mut body = RigidBody::dynamic();
    // movement is driven by the controller, not by gravity
    body.gravity_scale = 0.0;
    scene.add_rigid_body(player, body);

    let h = PLAYER_HALF_EXTENTS;
    scene.world_mut().entity_mut(player).insert((
        PlayerTag,
        sprite,
        Collider {
            shape: ColliderShape::Loop(vec![
                Vec2::new(-h.x, -h.y),
                Vec2::new(h.x, -h.y),
                Vec2::new(h.x, h.y),
                Vec2::new(-h.x, h.y),
            ]),
            layer: CollisionLayer::Player,
        },
    ));
    player
}

/// Load a `.tmj` map into `scene` under a new "Map" root node.
///
/// Returns the root. On error the entities created so far stay in the scene.
pub fn add_map_to_scene(scene: &mut Scene, path: impl AsRef<Path>) -> Result<Entity, String> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read map {:?}: {}", path, e))?;
    let map: TmjMap =
        serde_json::from_str(&text).map_err(|e| format!("Failed to parse map {:?}: {}", path, e))?;

    let map_name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    if map.kind != "map" {
        return Err(format!("{}: Not a map", map_name));
    }
    if map.tilewidth != map.tileheight {
        return Err(format!(
            "{}: Tiles must be quadratic. tileSize=({}, {})",
            map_name, map.tilewidth, map.tileheight
        ));
    }
    if map.tilewidth == 0 {
        return Err(format!("{}: Tile size is zero", map_name));
    }
    if map.infinite {
        warn!("{}: Infinite map, chunked layers will fail to load", map_name);
    }

    scene.world_mut().insert_resource(MapIdentifier {
        name: map_name.clone(),
        path: path.to_path_buf(),
    });

    let root = scene.create_entity("Map");
    scene.add_scene_node(root, Transform2D::IDENTITY, None);

    let mut loader = TmjLoader {
        scene,
        map_name,
        base_dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
        tile_size: map.tilewidth as f32,
        tilesets: Vec::new(),
        layer_node: root,
        color_stack: Vec::new(),
        parallax_stack: Vec::new(),
    };
    loader.load_tilesets(&map)?;
    loader.load_layers(&map.layers)?;

    info!(
        "Loaded map {} ({} tilesets, {} layers)",
        loader.map_name,
        loader.tilesets.len(),
        map.layers.len()
    );
    Ok(root)
}

/// Load a map, check the hierarchy and point the active camera at the player.
///
/// Load errors are logged and returned, but whatever was built before the
/// error is still set up.
pub fn load_map(scene: &mut Scene, path: impl AsRef<Path>) -> Result<Entity, String> {
    let path = path.as_ref();
    let result = add_map_to_scene(scene, path);
    if let Err(e) = &result {
        error!("Failed to load map {:?}: {}", path, e);
    }

    if !scene.validate_hierarchy() {
        error!("Scene hierarchy is inconsistent after loading {:?}", path);
    }

    let player = {
        let world = scene.world_mut();
        let mut query = world.query_filtered::<Entity, With<PlayerTag>>();
        query.iter(world).min()
    };
    if let Some(player) = player {
        match scene.active_camera() {
            Some(camera) => {
                let mut camera_global = scene.global_transform(camera);
                camera_global.position = scene.global_transform(player).position;
                scene.set_global_transform(camera, camera_global);
                scene.world_mut().entity_mut(camera).insert((
                    Camera {
                        distance: PLAYER_CAMERA_DISTANCE,
                    },
                    Follower::new(player).with_speed(PLAYER_CAMERA_FOLLOW_SPEED),
                ));
            }
            None => warn!("Map has a player but the scene has no active camera"),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn vec4_approx_eq(a: Vec4, b: Vec4) -> bool {
        (a - b).abs().max_element() < EPSILON
    }

    #[test]
    fn test_parse_html_color() {
        let c = parse_html_color("#ff8000").unwrap();
        assert!(vec4_approx_eq(c, Vec4::new(1.0, 128.0 / 255.0, 0.0, 1.0)));

        let c = parse_html_color("80FF0000").unwrap();
        assert!(vec4_approx_eq(c, Vec4::new(1.0, 0.0, 0.0, 128.0 / 255.0)));

        assert!(parse_html_color("#fff").is_none());
        assert!(parse_html_color("#gg0000").is_none());
    }

    #[test]
    fn test_decode_base64_tiles_little_endian() {
        // [1, 0x80000002]
        let data = BASE64.encode([1u8, 0, 0, 0, 2, 0, 0, 0x80]);
        assert_eq!(decode_base64_tiles(&data).unwrap(), vec![1, 0x8000_0002]);
        assert!(decode_base64_tiles("AQID").is_err());
        assert!(decode_base64_tiles("not base64!").is_err());
    }

    #[test]
    fn test_tileset_texture_rect() {
        let tsj = TsjTileset {
            image: "tiles.png".into(),
            imagewidth: 64,
            imageheight: 32,
            tilecount: 8,
            columns: 4,
            tilewidth: 16,
            tileheight: 16,
        };
        let ts = Tileset::from_tsj(10, &tsj, Path::new("maps")).unwrap();
        assert_eq!(ts.tex_key, "maps/tiles");

        let rect = ts.texture_rect(15).unwrap();
        assert_eq!(rect.origin, Vec2::new(0.25, 0.5));
        assert_eq!(rect.size, Vec2::new(0.25, 0.5));
        assert!(ts.texture_rect(9).is_none());
        assert!(ts.texture_rect(18).is_none());
    }
}
