//! Top-level game context.
//!
//! [`Game`] bundles the scene and the editor inspector and runs one tick of
//! the engine. There is no global engine instance: whoever drives the loop
//! owns the `Game` and passes a [`Renderer`] in.

use std::path::Path;

use bevy_ecs::prelude::*;
use log::info;

use crate::editor::Inspector;
use crate::resources::gameconfig::GameConfig;
use crate::resources::worldtime::WorldTime;
use crate::scene::Scene;
use crate::systems::follower::follower_system;
use crate::systems::parallax::parallax_system;
use crate::systems::physics::physics_step;
use crate::systems::render::{Renderer, render_scene};
use crate::systems::time::update_world_time;
use crate::tilemap;

pub struct Game {
    pub scene: Scene,
    pub inspector: Inspector,
}

impl Game {
    /// New scene with a clock, the config as a resource and an active camera.
    pub fn new(config: GameConfig) -> Self {
        let mut scene = Scene::new();
        scene.create_camera(config.camera_distance);
        scene.world_mut().insert_resource(WorldTime::default());
        scene.world_mut().insert_resource(config);
        Self {
            scene,
            inspector: Inspector::new(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        self.scene.world().resource::<GameConfig>()
    }

    pub fn config_mut(&mut self) -> Mut<'_, GameConfig> {
        self.scene.world_mut().resource_mut::<GameConfig>()
    }

    pub fn time(&self) -> WorldTime {
        *self.scene.world().resource::<WorldTime>()
    }

    /// Load a Tiled map into the scene, see [`tilemap::load_map`].
    pub fn load_map(&mut self, path: impl AsRef<Path>) -> Result<Entity, String> {
        tilemap::load_map(&mut self.scene, path)
    }

    /// One engine tick: time, physics, follow, parallax, pending editor edits, render.
    pub fn tick<R: Renderer + ?Sized>(&mut self, dt: f32, renderer: &mut R, aspect_ratio: f32) {
        let dt = update_world_time(self.scene.world_mut(), dt);
        physics_step(&mut self.scene, dt);
        follower_system(&mut self.scene, dt);
        parallax_system(&mut self.scene);
        self.inspector.apply_pending(&mut self.scene);
        render_scene(&mut self.scene, renderer, aspect_ratio);
    }

    /// Run `frames` ticks with the configured fixed tick length.
    pub fn run_headless<R: Renderer + ?Sized>(&mut self, frames: u32, renderer: &mut R) {
        let (dt, aspect_ratio) = {
            let config = self.config();
            (config.tick_seconds(), config.aspect_ratio())
        };
        info!("Running {} frames at dt={:.4}s", frames, dt);
        for _ in 0..frames {
            self.tick(dt, renderer, aspect_ratio);
        }
    }
}
