//! Keel Engine headless runner.
//!
//! Loads the configuration and optionally a Tiled map, then runs a fixed
//! number of ticks against a recording renderer. Useful for smoke-testing
//! maps and for profiling the simulation without a window.
//!
//! # Running
//!
//! ```sh
//! RUST_LOG=debug cargo run --release -- --map assets/maps/level1.tmj --frames 600 --dump-tree
//! ```

use std::path::PathBuf;

use clap::Parser;
use keelengine::game::Game;
use keelengine::resources::gameconfig::GameConfig;
use keelengine::systems::render::DrawList;

/// Keel Engine 2D (headless)
#[derive(Parser)]
#[command(version, about = "Runs a scene headless and reports what would be drawn.")]
struct Cli {
    /// INI configuration file (default: ./config.ini, ignored if missing).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Tiled map (.tmj) to load.
    #[arg(long, value_name = "PATH")]
    map: Option<PathBuf>,

    /// Number of ticks to run.
    #[arg(long, default_value_t = 120)]
    frames: u32,

    /// Log the scene outline after the run.
    #[arg(long)]
    dump_tree: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => GameConfig::with_path(path),
        None => GameConfig::new(),
    };
    if let Err(e) = config.load_from_file() {
        if cli.config.is_some() {
            log::error!("{}", e);
            std::process::exit(1);
        }
        log::info!("No config file, using defaults");
    }

    let mut game = Game::new(config);

    if let Some(map) = &cli.map {
        if game.load_map(map).is_err() {
            std::process::exit(1);
        }
    }

    let mut draw_list = DrawList::new();
    game.run_headless(cli.frames, &mut draw_list);

    log::info!(
        "{} frames, {} draw commands in the last frame, t={:.2}s",
        draw_list.frames,
        draw_list.records.len(),
        game.time().elapsed
    );

    if cli.dump_tree {
        for row in game.inspector.outline(&mut game.scene) {
            log::info!("{}{}", "  ".repeat(row.depth), row.label);
        }
    }
}
