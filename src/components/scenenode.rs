//! Scene graph node: parent/child links and hierarchical transforms.
//!
//! Every entity that takes part in the transform hierarchy carries one
//! [`SceneNode`]. Links between nodes are plain [`Entity`] ids, which bevy
//! generation-checks, so a link to a despawned entity resolves to "no node"
//! instead of aliasing a reused slot.
//!
//! Invariants kept by the functions in this module:
//! - `child.parent == this` for every entry in `this.children`, and every node
//!   with a parent is listed in that parent's children.
//! - No node is its own ancestor.
//! - A populated parent-transform cache equals the parent's global transform
//!   (identity for roots). Changing a node's local transform clears the caches
//!   of its descendants; re-parenting clears the node's own cache too.
//!
//! Structural mutation needs `&mut World`, reads only `&World`. The cache is
//! filled lazily on reads through a [`OnceLock`], so repeated reads between two
//! mutations cost O(1) after the first O(depth) walk.
//!
//! Violations are logged with `log::error!` and never panic; the scene keeps
//! running and a later `set_parent` can repair the links.

use std::sync::OnceLock;

use bevy_ecs::prelude::*;
use log::{error, warn};
use rustc_hash::FxHashSet;
use smallvec::{SmallVec, smallvec};

use super::transform2d::Transform2D;

/// Node of the transform hierarchy, owned by its entity.
///
/// Fields are private: links must only change through [`set_parent`] and
/// friends so both sides of a parent/child link stay in agreement.
#[derive(Component, Debug)]
pub struct SceneNode {
    local_transform: Transform2D,
    cached_parent_transform: OnceLock<Transform2D>,
    entity: Entity,
    parent: Option<Entity>,
    children: SmallVec<[Entity; 4]>,
}

impl SceneNode {
    fn new(entity: Entity, local_transform: Transform2D) -> Self {
        Self {
            local_transform,
            cached_parent_transform: OnceLock::new(),
            entity,
            parent: None,
            children: SmallVec::new(),
        }
    }

    /// Owning entity.
    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn local_transform(&self) -> Transform2D {
        self.local_transform
    }

    pub fn parent(&self) -> Option<Entity> {
        self.parent
    }

    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    /// Children in insertion order. Reflects the live state of the node.
    pub fn children(&self) -> &[Entity] {
        &self.children
    }

    /// Whether the composed parent transform is currently memoized.
    pub fn is_parent_transform_cached(&self) -> bool {
        self.cached_parent_transform.get().is_some()
    }

    fn invalidate_cached_parent_transform(&mut self) {
        self.cached_parent_transform.take();
    }
}

/// Attach a new [`SceneNode`] to `entity`, optionally under `parent`.
///
/// Returns `false` (and changes nothing) if the entity does not exist or
/// already has a node.
pub fn insert_scene_node(
    world: &mut World,
    entity: Entity,
    local_transform: Transform2D,
    parent: Option<Entity>,
) -> bool {
    let Ok(mut entity_mut) = world.get_entity_mut(entity) else {
        warn!("Cannot add SceneNode: {:?} does not exist", entity);
        return false;
    };
    if entity_mut.contains::<SceneNode>() {
        warn!("{:?} already has a SceneNode", entity);
        return false;
    }
    entity_mut.insert(SceneNode::new(entity, local_transform));
    set_parent(world, entity, parent);
    true
}

/// Detach the node of `entity` and remove the component.
///
/// Children are handed over to the removed node's parent (their local
/// transforms are kept), so no node is left pointing at the removed one.
pub fn remove_scene_node(world: &mut World, entity: Entity) -> bool {
    let Some(node) = world.get::<SceneNode>(entity) else {
        return false;
    };
    let parent = node.parent;
    // set_parent mutates our children list, iterate over a copy.
    let children = node.children.clone();
    for child in children {
        set_parent(world, child, parent);
    }
    set_parent(world, entity, None);

    if let Ok(mut entity_mut) = world.get_entity_mut(entity) {
        entity_mut.remove::<SceneNode>();
    }
    true
}

pub fn local_transform(world: &World, entity: Entity) -> Option<Transform2D> {
    world
        .get::<SceneNode>(entity)
        .map(|node| node.local_transform)
}

/// Set the local transform and invalidate the caches below this node.
///
/// The node's own cache holds its parent's transform, which does not change.
pub fn set_local_transform(world: &mut World, entity: Entity, transform: Transform2D) {
    let children = {
        let Some(mut node) = world.get_mut::<SceneNode>(entity) else {
            warn!("set_local_transform: {:?} has no SceneNode", entity);
            return;
        };
        node.local_transform = transform;
        node.children.clone()
    };
    for child in children {
        invalidate_subtree(world, child);
    }
}

/// Global transform of the parent, identity for roots and unknown entities.
pub fn parent_transform(world: &World, entity: Entity) -> Transform2D {
    match world.get::<SceneNode>(entity) {
        Some(node) => cached_parent_transform(world, node),
        None => Transform2D::IDENTITY,
    }
}

/// `parent_transform * local_transform`.
pub fn global_transform(world: &World, entity: Entity) -> Transform2D {
    match world.get::<SceneNode>(entity) {
        Some(node) => cached_parent_transform(world, node) * node.local_transform,
        None => Transform2D::IDENTITY,
    }
}

/// Walks up to the nearest cached ancestor, then fills the caches of every
/// node on the way back down. A filled cache therefore implies filled caches
/// on all ancestors.
fn cached_parent_transform(world: &World, node: &SceneNode) -> Transform2D {
    if let Some(cached) = node.cached_parent_transform.get() {
        return *cached;
    }

    let mut chain: SmallVec<[&SceneNode; 16]> = smallvec![node];
    let mut visited = FxHashSet::default();
    visited.insert(node.entity);
    let mut top_parent_global = Transform2D::IDENTITY;
    let mut current = node;
    while let Some(parent) = current.parent {
        let Some(parent_node) = world.get::<SceneNode>(parent) else {
            break;
        };
        if !visited.insert(parent) {
            error!("Nodes above {:?} build a loop", node.entity);
            break;
        }
        if let Some(cached) = parent_node.cached_parent_transform.get() {
            top_parent_global = *cached * parent_node.local_transform;
            break;
        }
        chain.push(parent_node);
        current = parent_node;
    }

    let mut parent_global = top_parent_global;
    let mut result = top_parent_global;
    for link in chain.iter().rev() {
        // A concurrent reader may have filled it first; both values are equal.
        let _ = link.cached_parent_transform.set(parent_global);
        result = parent_global;
        parent_global = parent_global * link.local_transform;
    }
    result
}

/// Choose the local transform so that the node ends up at `transform` in world space.
pub fn set_global_transform(world: &mut World, entity: Entity, transform: Transform2D) {
    let parent = parent_transform(world, entity);
    set_local_transform(world, entity, parent.inverse() * transform);
}

pub fn parent(world: &World, entity: Entity) -> Option<Entity> {
    world.get::<SceneNode>(entity).and_then(|node| node.parent)
}

/// Children of `entity`; empty for unknown entities.
pub fn children(world: &World, entity: Entity) -> &[Entity] {
    world
        .get::<SceneNode>(entity)
        .map(|node| node.children())
        .unwrap_or(&[])
}

/// Re-parent `entity` under `new_parent` (or make it a root with `None`).
///
/// If `new_parent` currently lies below `entity`, it is first moved up to
/// `entity`'s current parent so the request cannot close a loop. The node is
/// appended to the end of the new parent's children.
pub fn set_parent(world: &mut World, entity: Entity, new_parent: Option<Entity>) {
    let Some(node) = world.get::<SceneNode>(entity) else {
        warn!("set_parent: {:?} has no SceneNode", entity);
        return;
    };
    let old_parent = node.parent;
    if new_parent == old_parent {
        return;
    }

    if let Some(target) = new_parent {
        if target == entity {
            error!("set_parent: {:?} cannot be its own parent", entity);
            return;
        }
        if world.get::<SceneNode>(target).is_none() {
            error!(
                "set_parent: target {:?} of {:?} has no SceneNode",
                target, entity
            );
            return;
        }
    }

    invalidate_subtree(world, entity);

    if let Some(target) = new_parent {
        let has_children = world
            .get::<SceneNode>(entity)
            .is_some_and(|node| !node.children.is_empty());
        let target_is_descendant =
            has_children && ancestors(world, target).any(|ancestor| ancestor == entity);
        if target_is_descendant {
            set_parent(world, target, old_parent);
        }
    }

    if let Some(old) = old_parent {
        match world.get_mut::<SceneNode>(old) {
            Some(mut old_node) => {
                if let Some(index) = old_node.children.iter().position(|c| *c == entity) {
                    old_node.children.remove(index);
                } else {
                    error!("Parent-child invariant broken between {:?} and {:?}", old, entity);
                }
            }
            None => error!("{:?} referenced a parent {:?} without SceneNode", entity, old),
        }
    }

    if let Some(mut node) = world.get_mut::<SceneNode>(entity) {
        node.parent = new_parent;
    }

    if let Some(target) = new_parent {
        if let Some(mut target_node) = world.get_mut::<SceneNode>(target) {
            target_node.children.push(entity);
        }
    }

    if cfg!(debug_assertions) && !validate_parent_child_link(world, entity) {
        error!("Broken SceneNode invariant on {:?}", entity);
    }
}

/// Make `child` a child of `parent`.
pub fn add_child(world: &mut World, parent: Entity, child: Entity) {
    set_parent(world, child, Some(parent));
}

/// Detach `child` if, and only if, `parent` is its current parent.
pub fn remove_child(world: &mut World, parent: Entity, child: Entity) {
    if self::parent(world, child) == Some(parent) {
        set_parent(world, child, None);
    }
}

/// Clear the parent-transform cache of `root` and of everything below it.
///
/// An empty cache means the whole subtree below is empty as well, so those
/// branches are not descended into.
fn invalidate_subtree(world: &mut World, root: Entity) {
    let mut stack: SmallVec<[Entity; 16]> = smallvec![root];
    while let Some(entity) = stack.pop() {
        if let Some(mut node) = world.get_mut::<SceneNode>(entity) {
            if !node.is_parent_transform_cached() {
                continue;
            }
            node.invalidate_cached_parent_transform();
            stack.extend(node.children.iter().copied());
        }
    }
}

/// Iterator over the parent chain of a node, nearest first.
///
/// Stops at a root, at a link to an entity without a node, or when a node
/// repeats (which only happens if the hierarchy is corrupted).
pub struct Ancestors<'w> {
    world: &'w World,
    next: Option<Entity>,
    visited: FxHashSet<Entity>,
}

impl Iterator for Ancestors<'_> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        let current = self.next.take()?;
        if !self.visited.insert(current) {
            return None;
        }
        let node = self.world.get::<SceneNode>(current)?;
        self.next = node.parent;
        Some(current)
    }
}

pub fn ancestors(world: &World, entity: Entity) -> Ancestors<'_> {
    let mut visited = FxHashSet::default();
    visited.insert(entity);
    Ancestors {
        world,
        next: parent(world, entity),
        visited,
    }
}

/// Check the links around one node; logs and returns `false` on the first problem.
pub fn validate_parent_child_link(world: &World, entity: Entity) -> bool {
    let Some(node) = world.get::<SceneNode>(entity) else {
        error!("{:?} has no SceneNode", entity);
        return false;
    };

    if let Some(parent) = node.parent {
        match world.get::<SceneNode>(parent) {
            Some(parent_node) if parent_node.children.contains(&entity) => {}
            Some(_) => {
                error!("Node {:?} not linked with parent {:?}", entity, parent);
                return false;
            }
            None => {
                error!("Node {:?} has a dangling parent {:?}", entity, parent);
                return false;
            }
        }
    }

    for child in node.children.iter() {
        match world.get::<SceneNode>(*child) {
            Some(child_node) if child_node.parent == Some(entity) => {}
            _ => {
                error!("Child {:?} not linked with node {:?}", child, entity);
                return false;
            }
        }
    }

    // Walk the raw parent links; a revisit of any node means a loop.
    let mut visited = FxHashSet::default();
    let mut current = Some(entity);
    while let Some(e) = current {
        if !visited.insert(e) {
            error!("Nodes above {:?} build a loop", entity);
            return false;
        }
        current = world.get::<SceneNode>(e).and_then(|n| n.parent);
    }

    true
}
