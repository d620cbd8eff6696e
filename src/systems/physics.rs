//! Physics step and scene-graph sync.
//!
//! Bodies hold their own world pose. After integration every body that was
//! awake gets its pose pushed into the scene graph through
//! `set_global_transform`, so the node's local transform is recomputed
//! against whatever parent it currently has. Global scale and layer of the
//! node are left alone.

use bevy_ecs::prelude::*;
use log::debug;

use crate::components::rigidbody::{BodyPose, RigidBody};
use crate::components::scenenode;
use crate::components::transform2d::Transform2D;
use crate::resources::gameconfig::{DEFAULT_GRAVITY, GameConfig};
use crate::scene::Scene;

/// Advance all bodies by `dt` seconds and sync their poses to the scene.
///
/// Gravity comes from the [`GameConfig`] resource when present.
pub fn physics_step(scene: &mut Scene, dt: f32) {
    let gravity = scene
        .world()
        .get_resource::<GameConfig>()
        .map_or(DEFAULT_GRAVITY, |config| config.gravity);

    let mut to_sync: Vec<(Entity, BodyPose)> = {
        let world = scene.world_mut();
        let mut query = world.query::<(Entity, &mut RigidBody)>();
        query
            .iter_mut(world)
            .filter_map(|(entity, mut body)| {
                body.integrate(dt, gravity).then_some((entity, body.pose))
            })
            .collect()
    };

    // Parents first: a child's new local is computed from its parent's
    // already-synced global.
    to_sync.sort_by_cached_key(|(entity, _)| {
        (scenenode::ancestors(scene.world(), *entity).count(), *entity)
    });

    for (entity, pose) in to_sync {
        if scene.scene_node(entity).is_none() {
            debug!("Body {:?} has no scene node, adding a root node", entity);
            scene.add_scene_node(entity, Transform2D::IDENTITY, None);
        }
        let current = scene.global_transform(entity);
        scene.set_global_transform(
            entity,
            Transform2D {
                position: pose.position,
                rotation: pose.rotation,
                ..current
            },
        );
    }
}
