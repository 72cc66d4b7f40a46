//! # Voxel World Demo
//!
//! Streams a world around a scripted viewer with the headless backend and prints
//! what ended up in the scene. Every few frames a random block near the origin is
//! replaced by a random block type, which exercises the re-meshing path.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- [config.json]
//! ```

use std::time::Duration;

use cgmath::Vector3;
use log::{error, info, warn};
use voxel_world::engine_state::rendering::headless::{HeadlessBackend, ScriptedViewer};
use voxel_world::engine_state::voxels::{block::BlockState, position::BlockPos};
use voxel_world::{EngineConfig, Result, WorldDisplayer};

/// Frames between two random block edits.
const EDIT_INTERVAL: usize = 10;

fn main() {
    voxel_world::init_logging();
    if let Err(err) = run() {
        error!("{}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let seed = config.resolve_seed();
    let config = EngineConfig {
        seed: Some(seed),
        ..config
    };
    let mut rng = fastrand::Rng::with_seed(seed);

    let backend = HeadlessBackend::new();
    let mut displayer = WorldDisplayer::new(&config, Box::new(backend.clone()))?;

    let path = (0..8)
        .map(|step| Vector3::new(step as f32 * 6.0, 1.5, step as f32 * 2.0))
        .collect();
    let mut viewer = ScriptedViewer::new(path);
    displayer.place_anchor(&mut viewer, Vector3::new(0.0, 0.0, 0.0));

    let block_count = displayer.registry().all().len() as u8;
    let mut frame = 0;
    loop {
        displayer.update_from_tracker(&viewer);
        displayer.on_frame();

        if frame % EDIT_INTERVAL == EDIT_INTERVAL - 1 {
            let pos = BlockPos::new(rng.i32(-8..8), rng.i32(0..4), rng.i32(-8..8));
            let state = BlockState {
                block_type: rng.u8(0..block_count),
            };
            displayer.set_block(pos, state)?;
        }

        frame += 1;
        if !viewer.advance() {
            break;
        }
        std::thread::sleep(Duration::from_millis(16));
    }

    if !displayer.settle(Duration::from_secs(30)) {
        warn!("Pipeline did not settle in time");
    }

    let scene = backend.scene();
    info!(
        "{} chunks loaded, {} visuals placed, {} replaced, {} results dropped",
        displayer.world().get().chunk_count(),
        scene.placed.len(),
        scene.removed,
        displayer.dropped_results()
    );
    Ok(())
}
