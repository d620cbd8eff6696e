//! Scene render pass.
//!
//! The crate does no GPU work itself: [`render_scene`] walks the scene graph
//! and hands [`DrawCmd`]s to a [`Renderer`] implementation. [`DrawList`] is a
//! renderer that just records what it was given (headless runs and tests).
//!
//! Draw order is the pre-order of the hierarchy: roots by creation order,
//! parents before children. Each command carries the node's global transform
//! as a 3×3 matrix plus its layer so a backend can re-sort if it wants to.

use bevy_ecs::prelude::*;
use glam::{Mat3, Vec2};
use log::warn;

use crate::components::camera::Camera;
use crate::components::scenenode;
use crate::components::sprite::Sprite;
use crate::components::tilelayer::TileLayer;
use crate::scene::Scene;

/// Camera data for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneView {
    pub camera: Entity,
    /// World to normalised view space.
    pub view: Mat3,
}

pub enum DrawCmd<'a> {
    Sprite {
        entity: Entity,
        transform: Mat3,
        layer: u32,
        sprite: &'a Sprite,
    },
    TileLayer {
        entity: Entity,
        transform: Mat3,
        layer: u32,
        tiles: &'a TileLayer,
    },
}

/// Backend receiving one frame of draw commands.
pub trait Renderer {
    /// `None` when the scene has no usable camera; the frame is empty then.
    fn begin_frame(&mut self, view: Option<&SceneView>);
    fn submit(&mut self, cmd: DrawCmd<'_>);
    fn end_frame(&mut self);
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawKind {
    Sprite { tex_key: String },
    TileLayer { name: String, tile_count: usize },
}

#[derive(Clone, Debug, PartialEq)]
pub struct DrawRecord {
    pub entity: Entity,
    pub transform: Mat3,
    pub layer: u32,
    pub kind: DrawKind,
}

/// Recording renderer. Keeps the commands of the last frame.
#[derive(Debug, Default)]
pub struct DrawList {
    pub view: Option<SceneView>,
    pub records: Vec<DrawRecord>,
    pub frames: u64,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entities(&self) -> Vec<Entity> {
        self.records.iter().map(|r| r.entity).collect()
    }
}

impl Renderer for DrawList {
    fn begin_frame(&mut self, view: Option<&SceneView>) {
        self.view = view.copied();
        self.records.clear();
    }

    fn submit(&mut self, cmd: DrawCmd<'_>) {
        let record = match cmd {
            DrawCmd::Sprite {
                entity,
                transform,
                layer,
                sprite,
            } => DrawRecord {
                entity,
                transform,
                layer,
                kind: DrawKind::Sprite {
                    tex_key: sprite.tex_key.clone(),
                },
            },
            DrawCmd::TileLayer {
                entity,
                transform,
                layer,
                tiles,
            } => DrawRecord {
                entity,
                transform,
                layer,
                kind: DrawKind::TileLayer {
                    name: tiles.name.clone(),
                    tile_count: tiles.tile_count(),
                },
            },
        };
        self.records.push(record);
    }

    fn end_frame(&mut self) {
        self.frames += 1;
    }
}

/// Stretch correction so the view keeps square world units.
fn aspect_correction(aspect_ratio: f32) -> Mat3 {
    if aspect_ratio >= 1.0 {
        Mat3::from_scale(Vec2::new(aspect_ratio, 1.0))
    } else {
        Mat3::from_scale(Vec2::new(1.0, 1.0 / aspect_ratio))
    }
}

/// View for the active camera, if it has both a node and a [`Camera`].
pub fn camera_view(scene: &Scene, aspect_ratio: f32) -> Option<SceneView> {
    let camera = scene.active_camera()?;
    scene.scene_node(camera)?;
    let distance = scene.world().get::<Camera>(camera)?.distance;

    let global = scene.global_transform(camera);
    let camera_matrix =
        global.mat3() * Mat3::from_scale(Vec2::splat(distance)) * aspect_correction(aspect_ratio);
    Some(SceneView {
        camera,
        view: camera_matrix.inverse(),
    })
}

/// Submit every sprite and tile layer of the scene to `renderer`.
pub fn render_scene<R: Renderer + ?Sized>(scene: &mut Scene, renderer: &mut R, aspect_ratio: f32) {
    let Some(view) = camera_view(scene, aspect_ratio) else {
        warn!("No active camera with a scene node, rendering an empty frame");
        renderer.begin_frame(None);
        renderer.end_frame();
        return;
    };

    renderer.begin_frame(Some(&view));
    scene.traverse(|visit| {
        let sprite = visit.world.get::<Sprite>(visit.entity);
        let tiles = visit.world.get::<TileLayer>(visit.entity);
        if sprite.is_none() && tiles.is_none() {
            return;
        }

        let global = scenenode::global_transform(visit.world, visit.entity);
        let transform = global.mat3();
        if let Some(sprite) = sprite {
            renderer.submit(DrawCmd::Sprite {
                entity: visit.entity,
                transform,
                layer: global.layer,
                sprite,
            });
        }
        if let Some(tiles) = tiles {
            renderer.submit(DrawCmd::TileLayer {
                entity: visit.entity,
                transform,
                layer: global.layer,
                tiles,
            });
        }
    });
    renderer.end_frame();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::transform2d::Transform2D;

    const EPSILON: f32 = 1e-4;

    #[test]
    fn test_no_camera_renders_empty_frame() {
        let mut scene = Scene::new();
        let e = scene.create_entity("s");
        scene.add_scene_node(e, Transform2D::IDENTITY, None);
        scene.world_mut().entity_mut(e).insert(Sprite::new("tex"));

        let mut list = DrawList::new();
        render_scene(&mut scene, &mut list, 1.0);
        assert!(list.view.is_none());
        assert!(list.records.is_empty());
        assert_eq!(list.frames, 1);
    }

    #[test]
    fn test_view_maps_camera_to_origin() {
        let mut scene = Scene::new();
        let camera = scene.create_camera(5.0);
        scene.set_local_transform(camera, Transform2D::from_position(Vec2::new(3.0, -2.0)));

        let view = camera_view(&scene, 2.0).unwrap();
        let at_camera = view.view.transform_point2(Vec2::new(3.0, -2.0));
        assert!(at_camera.length() < EPSILON);

        // distance 5 and aspect 2: the right edge is 10 world units away.
        let right_edge = view.view.transform_point2(Vec2::new(13.0, -2.0));
        assert!((right_edge - Vec2::new(1.0, 0.0)).length() < EPSILON);
        let top_edge = view.view.transform_point2(Vec2::new(3.0, 3.0));
        assert!((top_edge - Vec2::new(0.0, 1.0)).length() < EPSILON);
    }

    #[test]
    fn test_tall_aspect_stretches_y() {
        let mut scene = Scene::new();
        scene.create_camera(1.0);
        let view = camera_view(&scene, 0.5).unwrap();
        let top_edge = view.view.transform_point2(Vec2::new(0.0, 2.0));
        assert!((top_edge - Vec2::new(0.0, 1.0)).length() < EPSILON);
    }

    #[test]
    fn test_camera_without_component_is_unusable() {
        let mut scene = Scene::new();
        let fake = scene.create_entity("fake");
        scene.add_scene_node(fake, Transform2D::IDENTITY, None);
        scene.set_active_camera(Some(fake));
        assert!(camera_view(&scene, 1.0).is_none());
    }
}
