//! Deferred hierarchy edits.
//!
//! Structural changes requested while the scene is being walked (outliner
//! drag and drop, context menu actions) are queued here and applied once the
//! walk is over.

use bevy_ecs::prelude::*;
use log::{debug, error, warn};

use crate::components::entityname::EntityName;
use crate::components::transform2d::Transform2D;
use crate::resources::gameconfig::GameConfig;
use crate::scene::Scene;

#[derive(Clone, Debug, PartialEq)]
pub enum HierarchyCmd {
    SetParent {
        entity: Entity,
        parent: Option<Entity>,
    },
    Destroy(Entity),
    RemoveSceneNode(Entity),
    SetLocalTransform {
        entity: Entity,
        transform: Transform2D,
    },
    Rename {
        entity: Entity,
        name: String,
    },
}

impl HierarchyCmd {
    fn target(&self) -> Entity {
        match self {
            HierarchyCmd::SetParent { entity, .. }
            | HierarchyCmd::SetLocalTransform { entity, .. }
            | HierarchyCmd::Rename { entity, .. } => *entity,
            HierarchyCmd::Destroy(entity) | HierarchyCmd::RemoveSceneNode(entity) => *entity,
        }
    }
}

/// FIFO of pending hierarchy edits.
#[derive(Debug, Default)]
pub struct HierarchyCommands {
    queue: Vec<HierarchyCmd>,
}

impl HierarchyCommands {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cmd: HierarchyCmd) {
        self.queue.push(cmd);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn pending(&self) -> &[HierarchyCmd] {
        &self.queue
    }

    /// Apply all queued commands in order and empty the queue.
    ///
    /// Commands addressed at entities that no longer exist (for example
    /// destroyed by an earlier command of the same batch) are skipped.
    /// Returns how many commands were applied.
    pub fn apply(&mut self, scene: &mut Scene) -> usize {
        if self.queue.is_empty() {
            return 0;
        }

        let mut applied = 0;
        for cmd in self.queue.drain(..) {
            if !scene.contains(cmd.target()) {
                warn!("Skipping {:?}: target no longer exists", cmd);
                continue;
            }
            debug!("Applying {:?}", cmd);
            match cmd {
                HierarchyCmd::SetParent { entity, parent } => scene.set_parent(entity, parent),
                HierarchyCmd::Destroy(entity) => {
                    scene.destroy_entity(entity);
                }
                HierarchyCmd::RemoveSceneNode(entity) => {
                    scene.remove_scene_node(entity);
                }
                HierarchyCmd::SetLocalTransform { entity, transform } => {
                    scene.set_local_transform(entity, transform)
                }
                HierarchyCmd::Rename { entity, name } => {
                    let mut entity_mut = scene.world_mut().entity_mut(entity);
                    if name.is_empty() {
                        entity_mut.remove::<EntityName>();
                    } else {
                        entity_mut.insert(EntityName::new(name));
                    }
                }
            }
            applied += 1;
        }

        let validate = scene
            .world()
            .get_resource::<GameConfig>()
            .is_some_and(|config| config.validate_hierarchy);
        if validate && !scene.validate_hierarchy() {
            error!("Scene hierarchy is inconsistent after applying editor commands");
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_apply_in_order() {
        let mut scene = Scene::new();
        let a = scene.create_entity("a");
        let b = scene.create_entity("b");
        scene.add_scene_node(a, Transform2D::IDENTITY, None);
        scene.add_scene_node(b, Transform2D::IDENTITY, None);

        let mut commands = HierarchyCommands::new();
        commands.push(HierarchyCmd::SetParent {
            entity: b,
            parent: Some(a),
        });
        commands.push(HierarchyCmd::SetParent {
            entity: b,
            parent: None,
        });
        assert_eq!(commands.apply(&mut scene), 2);
        assert!(commands.is_empty());
        assert_eq!(scene.parent(b), None);
    }

    #[test]
    fn test_commands_on_destroyed_entity_are_skipped() {
        let mut scene = Scene::new();
        let a = scene.create_entity("a");
        scene.add_scene_node(a, Transform2D::IDENTITY, None);

        let mut commands = HierarchyCommands::new();
        commands.push(HierarchyCmd::Destroy(a));
        commands.push(HierarchyCmd::Rename {
            entity: a,
            name: "gone".into(),
        });
        assert_eq!(commands.apply(&mut scene), 1);
        assert!(!scene.contains(a));
    }

    #[test]
    fn test_rename_and_clear_name() {
        let mut scene = Scene::new();
        let a = scene.create_entity("a");

        let mut commands = HierarchyCommands::new();
        commands.push(HierarchyCmd::Rename {
            entity: a,
            name: "hero".into(),
        });
        commands.apply(&mut scene);
        assert_eq!(scene.display_name(a), "hero");

        commands.push(HierarchyCmd::Rename {
            entity: a,
            name: String::new(),
        });
        commands.apply(&mut scene);
        assert!(scene.world().get::<EntityName>(a).is_none());
    }
}
