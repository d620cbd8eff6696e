//! Parallax scrolling against the active camera.

use bevy_ecs::prelude::*;
use glam::Vec2;
use log::warn;

use crate::components::parallax::Parallax;
use crate::scene::Scene;

/// Place every [`Parallax`] entity at `(1 - factor) * camera + offset`.
///
/// The offset is taken from the entity's world position the first time it is
/// seen. Without an active camera nothing moves.
pub fn parallax_system(scene: &mut Scene) {
    let Some(camera) = scene.active_camera() else {
        return;
    };
    if scene.scene_node(camera).is_none() {
        return;
    }
    let camera_position = scene.global_transform(camera).position;

    let layers: Vec<(Entity, Parallax)> = {
        let world = scene.world_mut();
        let mut query = world.query::<(Entity, &Parallax)>();
        query.iter(world).map(|(e, p)| (e, *p)).collect()
    };

    for (entity, parallax) in layers {
        if scene.scene_node(entity).is_none() {
            warn!("Parallax {:?} has no scene node", entity);
            continue;
        }
        let mut global = scene.global_transform(entity);
        let offset = match parallax.offset {
            Some(offset) => offset,
            None => {
                if let Some(mut stored) = scene.world_mut().get_mut::<Parallax>(entity) {
                    stored.offset = Some(global.position);
                }
                global.position
            }
        };
        global.position = (Vec2::ONE - parallax.factor) * camera_position + offset;
        scene.set_global_transform(entity, global);
    }
}
