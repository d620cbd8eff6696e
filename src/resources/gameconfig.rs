//! Game configuration resource.
//!
//! Manages settings loaded from an INI configuration file. Provides defaults
//! for safe startup and methods to load/save configuration.
//!
//! # Configuration File Format
//!
//! ```ini
//! [window]
//! width = 1280
//! height = 720
//! target_fps = 60
//!
//! [physics]
//! gravity_x = 0
//! gravity_y = -10
//!
//! [camera]
//! distance = 10
//!
//! [debug]
//! validate_hierarchy = true
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use glam::Vec2;
use log::info;
use std::path::PathBuf;

use crate::components::camera::DEFAULT_CAMERA_DISTANCE;

/// Default safe values for startup
const DEFAULT_WINDOW_WIDTH: u32 = 1280;
const DEFAULT_WINDOW_HEIGHT: u32 = 720;
const DEFAULT_TARGET_FPS: u32 = 60;
pub const DEFAULT_GRAVITY: Vec2 = Vec2::new(0.0, -10.0);
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

#[derive(Resource, Debug, Clone)]
pub struct GameConfig {
    /// Window width in pixels.
    pub window_width: u32,
    /// Window height in pixels.
    pub window_height: u32,
    /// Target frames per second; also the fixed tick rate of the headless loop.
    pub target_fps: u32,
    /// World gravity in units per second squared (y up).
    pub gravity: Vec2,
    /// Distance of newly created cameras.
    pub camera_distance: f32,
    /// Validate the whole hierarchy after map loads and editor batches.
    pub validate_hierarchy: bool,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GameConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            target_fps: DEFAULT_TARGET_FPS,
            gravity: DEFAULT_GRAVITY,
            camera_distance: DEFAULT_CAMERA_DISTANCE,
            validate_hierarchy: cfg!(debug_assertions),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;

        // [window] section
        if let Some(width) = config.getuint("window", "width").ok().flatten() {
            self.window_width = width as u32;
        }
        if let Some(height) = config.getuint("window", "height").ok().flatten() {
            self.window_height = height as u32;
        }
        if let Some(fps) = config.getuint("window", "target_fps").ok().flatten() {
            self.target_fps = (fps as u32).max(1);
        }

        // [physics] section
        if let Some(gx) = config.getfloat("physics", "gravity_x").ok().flatten() {
            self.gravity.x = gx as f32;
        }
        if let Some(gy) = config.getfloat("physics", "gravity_y").ok().flatten() {
            self.gravity.y = gy as f32;
        }

        // [camera] section
        if let Some(distance) = config.getfloat("camera", "distance").ok().flatten() {
            self.camera_distance = distance as f32;
        }

        // [debug] section
        if let Some(validate) = config.getbool("debug", "validate_hierarchy").ok().flatten() {
            self.validate_hierarchy = validate;
        }

        info!(
            "Loaded config: {}x{} window, fps={}, gravity=({}, {}), camera distance={}, validate={}",
            self.window_width,
            self.window_height,
            self.target_fps,
            self.gravity.x,
            self.gravity.y,
            self.camera_distance,
            self.validate_hierarchy
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        // [window] section
        config.set("window", "width", Some(self.window_width.to_string()));
        config.set("window", "height", Some(self.window_height.to_string()));
        config.set("window", "target_fps", Some(self.target_fps.to_string()));

        // [physics] section
        config.set("physics", "gravity_x", Some(self.gravity.x.to_string()));
        config.set("physics", "gravity_y", Some(self.gravity.y.to_string()));

        // [camera] section
        config.set("camera", "distance", Some(self.camera_distance.to_string()));

        // [debug] section
        config.set(
            "debug",
            "validate_hierarchy",
            Some(self.validate_hierarchy.to_string()),
        );

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }

    /// Fixed tick length in seconds.
    pub fn tick_seconds(&self) -> f32 {
        1.0 / self.target_fps.max(1) as f32
    }

    /// Width over height of the window.
    pub fn aspect_ratio(&self) -> f32 {
        self.window_width as f32 / self.window_height.max(1) as f32
    }
}
