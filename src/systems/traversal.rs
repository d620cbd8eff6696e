//! Depth-first walk over the scene graph.
//!
//! Roots (nodes without a parent) are visited in [`SpawnOrder`], each node is
//! handed to the visitor before its children (pre-order), children in their
//! list order. The visitor only gets `&World`: re-parenting or destroying
//! nodes while walking is not possible, such requests have to be queued and
//! applied after the walk (see [`crate::editor::HierarchyCommands`]).

use bevy_ecs::prelude::*;
use log::warn;

use crate::components::scenenode::SceneNode;
use crate::scene::SpawnOrder;

/// What the visitor sees of one node.
#[derive(Clone, Copy)]
pub struct NodeVisit<'w> {
    pub world: &'w World,
    pub entity: Entity,
    pub node: &'w SceneNode,
    /// 0 for roots.
    pub depth: usize,
}

/// Root nodes sorted by spawn order. Entities spawned without a
/// [`SpawnOrder`] come last, ordered by id.
pub fn collect_roots(world: &mut World) -> Vec<Entity> {
    let mut query = world.query::<(Entity, &SceneNode, Option<&SpawnOrder>)>();
    let mut roots: Vec<(u64, Entity)> = query
        .iter(world)
        .filter(|(_, node, _)| !node.has_parent())
        .map(|(entity, _, order)| (order.map_or(u64::MAX, |o| o.0), entity))
        .collect();
    roots.sort();
    roots.into_iter().map(|(_, entity)| entity).collect()
}

/// Visit every node reachable from `roots`, parents before children.
///
/// Uses an explicit stack, so the depth of the tree is only bounded by memory.
pub fn walk_scene<F>(world: &World, roots: &[Entity], visitor: &mut F)
where
    F: FnMut(NodeVisit<'_>),
{
    let mut stack: Vec<(Entity, usize)> = roots.iter().rev().map(|root| (*root, 0)).collect();
    while let Some((entity, depth)) = stack.pop() {
        let Some(node) = world.get::<SceneNode>(entity) else {
            warn!("Scene walk reached {:?} without SceneNode", entity);
            continue;
        };
        visitor(NodeVisit {
            world,
            entity,
            node,
            depth,
        });
        stack.extend(node.children().iter().rev().map(|child| (*child, depth + 1)));
    }
}
