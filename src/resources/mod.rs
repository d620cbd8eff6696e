//! ECS resources stored in the scene world.
//!
//! Overview
//! - `gameconfig` – settings loaded from the INI config file
//! - `mapidentifier` – which Tiled map the scene was built from
//! - `worldtime` – simulation time and delta
pub mod gameconfig;
pub mod mapidentifier;
pub mod worldtime;
