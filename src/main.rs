//! particle-sim: run one emitter headless and report what happened
//!
//! Usage: `particle-sim [config.json]`. Without a path the built-in emitter
//! (a sphere burst over a bouncy floor) is used.

use std::process::ExitCode;

use particle_core::EmitterConfig;
use particle_core::sim::Emitter;

fn main() -> ExitCode {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => match EmitterConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{e}");
                return ExitCode::FAILURE;
            }
        },
        None => {
            log::info!("No config given, using the built-in emitter");
            EmitterConfig::default()
        }
    };

    let mut emitter = Emitter::new(config);
    let summary = emitter.run();

    println!("ticks       {}", summary.ticks);
    println!("spawned     {}", summary.spawned);
    println!("alive       {}", summary.alive);
    println!("expired     {}", summary.expired);
    println!("collisions  {}", summary.collisions);
    println!("min world z {:.4}", summary.min_world_z);
    ExitCode::SUCCESS
}
