//! The scene: entity storage plus the transform hierarchy living in it.
//!
//! [`Scene`] owns the `bevy_ecs` [`World`]. Every [`SceneNode`] belongs to an
//! entity of this world, so the scene owns all nodes transitively. Game,
//! physics and editor code receive `&mut Scene` explicitly; there is no global
//! "current scene".
//!
//! Entities should be removed through [`Scene::destroy_entity`], which hands
//! the node's children to its parent before despawning. Despawning directly on
//! the world leaves stale links behind (detected by
//! [`Scene::validate_hierarchy`], harmless otherwise since links are
//! generation-checked).

use bevy_ecs::prelude::*;
use log::{debug, warn};

use crate::components::camera::Camera;
use crate::components::entityname::{EntityName, entity_display_name};
use crate::components::rigidbody::RigidBody;
use crate::components::scenenode::{self, SceneNode};
use crate::components::transform2d::Transform2D;
use crate::systems::traversal::{NodeVisit, collect_roots, walk_scene};

/// Creation sequence number; the stable ordering key for root enumeration.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct SpawnOrder(pub u64);

pub struct Scene {
    world: World,
    next_spawn_order: u64,
    active_camera: Option<Entity>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            next_spawn_order: 0,
            active_camera: None,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Spawn an entity; an empty name leaves it unnamed.
    pub fn create_entity(&mut self, name: &str) -> Entity {
        let order = SpawnOrder(self.next_spawn_order);
        self.next_spawn_order += 1;

        let mut entity = self.world.spawn(order);
        if !name.is_empty() {
            entity.insert(EntityName::new(name));
        }
        entity.id()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.world.get_entity(entity).is_ok()
    }

    /// Despawn `entity`. Its children (if it is a scene node) move up to its
    /// parent first.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if !self.contains(entity) {
            warn!("destroy_entity: {:?} does not exist", entity);
            return false;
        }
        scenenode::remove_scene_node(&mut self.world, entity);
        if self.active_camera == Some(entity) {
            self.active_camera = None;
        }
        debug!("Destroying {}", self.display_name(entity));
        self.world.despawn(entity)
    }

    /// Destroy every entity created through this scene.
    pub fn clear(&mut self) {
        let mut query = self.world.query_filtered::<Entity, With<SpawnOrder>>();
        let entities: Vec<Entity> = query.iter(&self.world).collect();
        for entity in entities {
            self.destroy_entity(entity);
        }
    }

    pub fn display_name(&self, entity: Entity) -> String {
        entity_display_name(&self.world, entity)
    }

    // --- scene graph -------------------------------------------------------

    pub fn add_scene_node(
        &mut self,
        entity: Entity,
        local_transform: Transform2D,
        parent: Option<Entity>,
    ) -> bool {
        scenenode::insert_scene_node(&mut self.world, entity, local_transform, parent)
    }

    /// Remove only the node; the entity stays alive.
    pub fn remove_scene_node(&mut self, entity: Entity) -> bool {
        scenenode::remove_scene_node(&mut self.world, entity)
    }

    pub fn scene_node(&self, entity: Entity) -> Option<&SceneNode> {
        self.world.get::<SceneNode>(entity)
    }

    pub fn local_transform(&self, entity: Entity) -> Option<Transform2D> {
        scenenode::local_transform(&self.world, entity)
    }

    pub fn set_local_transform(&mut self, entity: Entity, transform: Transform2D) {
        scenenode::set_local_transform(&mut self.world, entity, transform);
    }

    pub fn parent_transform(&self, entity: Entity) -> Transform2D {
        scenenode::parent_transform(&self.world, entity)
    }

    pub fn global_transform(&self, entity: Entity) -> Transform2D {
        scenenode::global_transform(&self.world, entity)
    }

    pub fn set_global_transform(&mut self, entity: Entity, transform: Transform2D) {
        scenenode::set_global_transform(&mut self.world, entity, transform);
    }

    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        scenenode::parent(&self.world, entity)
    }

    pub fn children(&self, entity: Entity) -> &[Entity] {
        scenenode::children(&self.world, entity)
    }

    pub fn set_parent(&mut self, entity: Entity, parent: Option<Entity>) {
        scenenode::set_parent(&mut self.world, entity, parent);
    }

    pub fn clear_parent(&mut self, entity: Entity) {
        scenenode::set_parent(&mut self.world, entity, None);
    }

    pub fn add_child(&mut self, parent: Entity, child: Entity) {
        scenenode::add_child(&mut self.world, parent, child);
    }

    pub fn remove_child(&mut self, parent: Entity, child: Entity) {
        scenenode::remove_child(&mut self.world, parent, child);
    }

    /// Root nodes in creation order.
    pub fn roots(&mut self) -> Vec<Entity> {
        collect_roots(&mut self.world)
    }

    /// Pre-order walk over all nodes, see [`crate::systems::traversal`].
    pub fn traverse<F>(&mut self, mut visitor: F)
    where
        F: FnMut(NodeVisit<'_>),
    {
        let roots = self.roots();
        walk_scene(&self.world, &roots, &mut visitor);
    }

    /// Check every node's links; returns false if any is broken.
    pub fn validate_hierarchy(&mut self) -> bool {
        let mut query = self.world.query_filtered::<Entity, With<SceneNode>>();
        let nodes: Vec<Entity> = query.iter(&self.world).collect();
        nodes
            .into_iter()
            .fold(true, |ok, entity| {
                scenenode::validate_parent_child_link(&self.world, entity) && ok
            })
    }

    // --- collaborators -----------------------------------------------------

    /// Attach a body whose pose starts at the node's current global transform.
    pub fn add_rigid_body(&mut self, entity: Entity, mut body: RigidBody) -> bool {
        if self.scene_node(entity).is_some() {
            let global = self.global_transform(entity);
            body.pose.position = global.position;
            body.pose.rotation = global.rotation;
        }
        match self.world.get_entity_mut(entity) {
            Ok(mut entity_mut) => {
                entity_mut.insert(body);
                true
            }
            Err(_) => {
                warn!("add_rigid_body: {:?} does not exist", entity);
                false
            }
        }
    }

    /// Spawn a root "Camera" node and make it the active camera.
    pub fn create_camera(&mut self, distance: f32) -> Entity {
        let camera = self.create_entity("Camera");
        self.add_scene_node(camera, Transform2D::IDENTITY, None);
        self.world
            .entity_mut(camera)
            .insert(Camera { distance });
        self.active_camera = Some(camera);
        camera
    }

    /// The active camera, if it still exists.
    pub fn active_camera(&self) -> Option<Entity> {
        self.active_camera.filter(|camera| self.contains(*camera))
    }

    pub fn set_active_camera(&mut self, camera: Option<Entity>) {
        self.active_camera = camera;
    }
}
