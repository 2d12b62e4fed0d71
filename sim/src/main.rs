//! Headless fixed-tick host for the locomotion core.
//!
//! Usage: `sim [config.json] [seconds]`
//!
//! Builds the demo level, spawns the scripted cast and ticks every character in
//! parallel against the shared query world. The moving platform is advanced
//! between ticks, never during one.

mod agent;
mod world;

use std::path::PathBuf;

use locomotion::{CollisionWorld, ConfigError, MovementConfig};
use rayon::prelude::*;
use thiserror::Error;

use crate::agent::spawn_agents;
use crate::world::{PLATFORM, build_demo_world, platform_pose};

const DEFAULT_SECONDS: f32 = 10.0;

#[derive(Debug, Error)]
enum SimError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid duration {0:?}")]
    Duration(String),
    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}

fn load_config(path: Option<String>) -> Result<MovementConfig, SimError> {
    let Some(path) = path.map(PathBuf::from) else {
        return Ok(MovementConfig::default());
    };
    let json = std::fs::read_to_string(&path).map_err(|source| SimError::Io { path: path.clone(), source })?;
    let config = MovementConfig::from_json_str(&json)?;
    log::info!("loaded movement config from {path:?}");
    Ok(config)
}

fn main() -> Result<(), SimError> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let config = load_config(args.next())?;
    config.validate()?;
    let seconds = match args.next() {
        Some(raw) => raw
            .parse::<f32>()
            .ok()
            .filter(|s| s.is_finite() && *s > 0.0)
            .ok_or(SimError::Duration(raw))?,
        None => DEFAULT_SECONDS,
    };

    let dt = config.fixed_delta();
    let ticks = (seconds / dt).ceil() as u64;
    let log_every = (config.tick_rate.round() as u64).max(1);

    let mut world = build_demo_world();
    let mut agents = spawn_agents(&config);
    log::info!("simulating {} characters for {ticks} ticks at {dt:.4}s", agents.len());

    for tick in 0..ticks {
        // -----------------------------------------------------------------------------------------
        // Advance kinematic objects, then tick every character against the same snapshot
        // -----------------------------------------------------------------------------------------
        world.move_object(PLATFORM, platform_pose(tick as f32 * dt), dt);

        let snapshot: &dyn CollisionWorld = &world;
        agents.par_iter_mut().for_each(|agent| agent.step(snapshot, tick, dt));

        // -----------------------------------------------------------------------------------------
        // Publish
        // -----------------------------------------------------------------------------------------
        if tick % log_every != 0 {
            continue;
        }
        if let Some(velocity) = world.object_velocity(PLATFORM) {
            log::debug!("platform velocity {velocity:?}");
        }
        for agent in &agents {
            let Some(report) = agent.last.as_ref() else {
                continue;
            };
            let p = report.replicated.position;
            let v = report.animation.velocity;
            log::info!(
                "t={:5.2}s {:>8} [{}] pos=({:8.2},{:7.2},{:8.2}) vel=({:7.2},{:7.2},{:7.2}) grounded={} crouch={:.2} {:?}",
                tick as f32 * dt,
                agent.name,
                agent.controller.strategy_name(),
                p.x,
                p.y,
                p.z,
                v.x,
                v.y,
                v.z,
                report.replicated.grounded,
                report.animation.crouch_factor,
                report.status,
            );
        }
    }

    // -----------------------------------------------------------------------------------------
    // Final replicated state, as a replication layer would forward it
    // -----------------------------------------------------------------------------------------
    for agent in &agents {
        if let Some(report) = agent.last.as_ref() {
            log::info!("{} final {}", agent.name, serde_json::to_string(&report.replicated)?);
        }
    }

    Ok(())
}
