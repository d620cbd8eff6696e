//! Entity outliner and inspector state.
//!
//! UI-agnostic: [`Inspector::outline`] produces the rows an outliner widget
//! would draw, and the `request_*` methods record what the user did with
//! them. Structural edits are deferred to [`Inspector::apply_pending`]; plain
//! transform edits of the selected node go through immediately.

use bevy_ecs::prelude::*;
use glam::Vec2;

use super::commands::{HierarchyCmd, HierarchyCommands};
use crate::components::entityname::entity_display_name;
use crate::components::scenenode::SceneNode;
use crate::components::transform2d::Transform2D;
use crate::scene::{Scene, SpawnOrder};

#[derive(Clone, Debug, PartialEq)]
pub struct OutlineRow {
    pub entity: Entity,
    pub depth: usize,
    pub label: String,
    pub has_children: bool,
    pub selected: bool,
}

#[derive(Debug, Default)]
pub struct Inspector {
    selected: Option<Entity>,
    pending: HierarchyCommands,
}

impl Inspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<Entity> {
        self.selected
    }

    pub fn select(&mut self, entity: Option<Entity>) {
        self.selected = entity;
    }

    pub fn pending(&self) -> &HierarchyCommands {
        &self.pending
    }

    /// Scene nodes in pre-order, then entities without a node at depth 0.
    pub fn outline(&self, scene: &mut Scene) -> Vec<OutlineRow> {
        let mut rows = Vec::new();
        scene.traverse(|visit| {
            rows.push(OutlineRow {
                entity: visit.entity,
                depth: visit.depth,
                label: entity_display_name(visit.world, visit.entity),
                has_children: !visit.node.children().is_empty(),
                selected: self.selected == Some(visit.entity),
            });
        });

        let mut loose: Vec<(SpawnOrder, Entity)> = {
            let world = scene.world_mut();
            let mut query =
                world.query_filtered::<(&SpawnOrder, Entity), Without<SceneNode>>();
            query.iter(world).map(|(order, e)| (*order, e)).collect()
        };
        loose.sort();
        rows.extend(loose.into_iter().map(|(_, entity)| OutlineRow {
            entity,
            depth: 0,
            label: scene.display_name(entity),
            has_children: false,
            selected: self.selected == Some(entity),
        }));
        rows
    }

    /// Drop `entity` onto `parent` in the outliner.
    pub fn request_reparent(&mut self, entity: Entity, parent: Entity) {
        self.pending.push(HierarchyCmd::SetParent {
            entity,
            parent: Some(parent),
        });
    }

    pub fn request_clear_parent(&mut self, entity: Entity) {
        self.pending.push(HierarchyCmd::SetParent {
            entity,
            parent: None,
        });
    }

    pub fn request_delete(&mut self, entity: Entity) {
        self.pending.push(HierarchyCmd::Destroy(entity));
    }

    pub fn request_remove_scene_node(&mut self, entity: Entity) {
        self.pending.push(HierarchyCmd::RemoveSceneNode(entity));
    }

    pub fn request_rename(&mut self, entity: Entity, name: impl Into<String>) {
        self.pending.push(HierarchyCmd::Rename {
            entity,
            name: name.into(),
        });
    }

    pub fn request_local_transform(&mut self, entity: Entity, transform: Transform2D) {
        self.pending
            .push(HierarchyCmd::SetLocalTransform { entity, transform });
    }

    /// Edit the selected node's local transform in place. Returns false when
    /// nothing with a scene node is selected.
    pub fn edit_local_transform<F>(&self, scene: &mut Scene, edit: F) -> bool
    where
        F: FnOnce(&mut Transform2D),
    {
        let Some(entity) = self.selected else {
            return false;
        };
        let Some(mut local) = scene.local_transform(entity) else {
            return false;
        };
        edit(&mut local);
        scene.set_local_transform(entity, local);
        true
    }

    /// Create an unnamed entity (no scene node) and select it.
    pub fn new_entity(&mut self, scene: &mut Scene) -> Entity {
        let entity = scene.create_entity("");
        self.selected = Some(entity);
        entity
    }

    /// Give the selected entity a root scene node if it has none.
    pub fn attach_scene_node(&self, scene: &mut Scene) -> bool {
        match self.selected {
            Some(entity) if scene.contains(entity) && scene.scene_node(entity).is_none() => {
                scene.add_scene_node(entity, Transform2D::IDENTITY, None)
            }
            _ => false,
        }
    }

    /// World-space rectangle `(min, size)` highlighting the selected node.
    pub fn selection_rect(&self, scene: &Scene) -> Option<(Vec2, Vec2)> {
        let entity = self.selected?;
        scene.scene_node(entity)?;
        let global = scene.global_transform(entity);
        let size = global.scale.abs();
        Some((global.position - size / 2.0, size))
    }

    /// Apply queued requests; drops the selection if it was destroyed.
    pub fn apply_pending(&mut self, scene: &mut Scene) -> usize {
        let applied = self.pending.apply(scene);
        if self.selected.is_some_and(|e| !scene.contains(e)) {
            self.selected = None;
        }
        applied
    }
}
