//! Chase system for [`Follower`] components.

use bevy_ecs::prelude::*;
use glam::Vec2;
use log::warn;

use crate::components::follower::Follower;
use crate::scene::Scene;

/// Move every follower toward its target's world position.
///
/// Each axis closes `min(speed * dt, 1)` of the remaining distance, so a
/// large step lands exactly on the target and never overshoots.
pub fn follower_system(scene: &mut Scene, dt: f32) {
    let followers: Vec<(Entity, Follower)> = {
        let world = scene.world_mut();
        let mut query = world.query::<(Entity, &Follower)>();
        query.iter(world).map(|(e, f)| (e, *f)).collect()
    };

    for (entity, follower) in followers {
        if scene.scene_node(entity).is_none() {
            warn!("Follower {:?} has no scene node", entity);
            continue;
        }
        if scene.scene_node(follower.target).is_none() {
            warn!(
                "Follower {:?} target {:?} has no scene node",
                entity, follower.target
            );
            continue;
        }

        let target = scene.global_transform(follower.target).position;
        let mut global = scene.global_transform(entity);
        let factor = (follower.speed * dt).clamp(Vec2::ZERO, Vec2::ONE);
        global.position += (target - global.position) * factor;
        scene.set_global_transform(entity, global);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::transform2d::Transform2D;

    #[test]
    fn test_moves_fraction_of_distance() {
        let mut scene = Scene::new();
        let target = scene.create_entity("target");
        scene.add_scene_node(target, Transform2D::from_position(Vec2::new(10.0, 4.0)), None);
        let cam = scene.create_entity("cam");
        scene.add_scene_node(cam, Transform2D::IDENTITY, None);
        scene
            .world_mut()
            .entity_mut(cam)
            .insert(Follower::new(target).with_speed(2.0));

        follower_system(&mut scene, 0.25);
        let pos = scene.global_transform(cam).position;
        assert!((pos - Vec2::new(5.0, 2.0)).length() < 1e-4);

        // factor clamps to 1
        follower_system(&mut scene, 10.0);
        let pos = scene.global_transform(cam).position;
        assert!((pos - Vec2::new(10.0, 4.0)).length() < 1e-4);
    }

    #[test]
    fn test_destroyed_target_is_skipped() {
        let mut scene = Scene::new();
        let target = scene.create_entity("target");
        scene.add_scene_node(target, Transform2D::from_position(Vec2::new(3.0, 0.0)), None);
        let cam = scene.create_entity("cam");
        scene.add_scene_node(cam, Transform2D::from_position(Vec2::new(1.0, 1.0)), None);
        scene.world_mut().entity_mut(cam).insert(Follower::new(target));
        scene.destroy_entity(target);

        follower_system(&mut scene, 0.5);
        let pos = scene.global_transform(cam).position;
        assert!((pos - Vec2::new(1.0, 1.0)).length() < 1e-6);
    }
}
