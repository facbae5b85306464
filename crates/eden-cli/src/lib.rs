//! # Eden CLI
//!
//! Headless driver for the Eden character controller.
//!
//! ## Commands
//! - `simulate` - Run a character through a scene and report its final state
//! - `raycast` - Cast a segment through a scene
//! - `sample-scene` - Print a sample scene description

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use eden_core::{FixedTimeStep, SimulationClock};
use eden_physics::controller::{DEFAULT_JUMP_VELOCITY, DEFAULT_MAX_STAIR_HEIGHT};
use eden_physics::{CharacterController, PlatformId, RaycastResult, SceneDesc};
use glam::{Vec2, Vec3};
use serde::Serialize;

/// Eden character physics CLI
#[derive(Parser)]
#[command(name = "eden")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the character controller headless
    Simulate {
        /// Scene file (JSON); the built-in sample scene when omitted
        #[arg(short, long)]
        scene: Option<PathBuf>,

        /// Number of fixed ticks to run
        #[arg(short, long, default_value = "600")]
        ticks: u64,

        /// Tick rate in Hz
        #[arg(long, default_value = "60")]
        hz: f64,

        /// Desired horizontal velocity as X,Z
        #[arg(short, long, value_parser = parse_vec2, default_value = "0,0")]
        walk: Vec2,

        /// Request a jump every N ticks (0 disables)
        #[arg(short, long, default_value = "0")]
        jump_every: u64,

        /// Drive ticks from frames of this many milliseconds instead of one tick per iteration
        #[arg(long)]
        frame_ms: Option<f64>,
    },

    /// Cast a ray through a scene
    Raycast {
        /// Scene file (JSON); the built-in sample scene when omitted
        #[arg(short, long)]
        scene: Option<PathBuf>,

        /// Segment start as X,Y,Z
        #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
        from: Vec3,

        /// Segment end as X,Y,Z
        #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
        to: Vec3,
    },

    /// Print a sample scene description
    SampleScene,
}

/// Simulation parameters for [`simulate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulateOptions {
    pub ticks: u64,
    pub hz: f64,
    pub walk: Vec2,
    pub jump_every: u64,
    pub frame_ms: Option<f64>,
}

impl Default for SimulateOptions {
    fn default() -> Self {
        Self {
            ticks: 600,
            hz: 60.0,
            walk: Vec2::ZERO,
            jump_every: 0,
            frame_ms: None,
        }
    }
}

/// Character state after a simulation run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub ticks: u64,
    pub elapsed: f64,
    pub jumps: u64,
    pub position: Vec3,
    pub velocity: Vec3,
    pub on_ground: bool,
    pub on_steep_ground: bool,
    pub ground_normal: Vec3,
    pub ground_velocity: Vec3,
    pub platforms: Vec<PlatformId>,
}

fn parse_floats<const N: usize>(s: &str) -> Result<[f32; N], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(format!("expected {} comma-separated numbers, got '{}'", N, s));
    }
    let mut out = [0.0; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part.parse().map_err(|_| format!("invalid number '{}'", part))?;
    }
    Ok(out)
}

fn parse_vec2(s: &str) -> Result<Vec2, String> {
    parse_floats::<2>(s).map(Vec2::from_array)
}

fn parse_vec3(s: &str) -> Result<Vec3, String> {
    parse_floats::<3>(s).map(Vec3::from_array)
}

fn load_scene(path: Option<&Path>) -> Result<SceneDesc> {
    match path {
        Some(path) => SceneDesc::from_path(path).with_context(|| format!("failed to load scene {}", path.display())),
        None => Ok(SceneDesc::sample()),
    }
}

/// Run a character through `scene` and report where it ended up.
pub fn simulate(scene: &SceneDesc, options: &SimulateOptions) -> Result<SimulationReport> {
    if !(options.hz > 0.0) {
        bail!("tick rate must be positive, got {}", options.hz);
    }
    let (mut controller, platforms) = scene.instantiate()?;
    let mut clock = SimulationClock::new(FixedTimeStep::from_hz(options.hz));
    let ticks_per_second = options.hz.round().max(1.0) as u64;
    let desired = Vec3::new(options.walk.x, 0.0, options.walk.y);
    let mut jumps = 0;

    log::info!(
        "simulating {} ticks at {} Hz on the {} backend",
        options.ticks,
        options.hz,
        controller.backend()
    );

    let mut run_tick = |clock: &mut SimulationClock| {
        let t = clock.elapsed() as f32;
        let dt = clock.tick();
        scene.update_platforms(controller.as_mut(), &platforms, t + dt, dt);

        let jump = options.jump_every > 0 && clock.ticks() % options.jump_every == 0;
        let was_grounded = controller.is_on_ground();
        let position = controller.extended_update(dt, desired, jump, DEFAULT_JUMP_VELOCITY, DEFAULT_MAX_STAIR_HEIGHT);
        if jump && was_grounded {
            jumps += 1;
        }

        if clock.ticks() % ticks_per_second == 0 {
            log::info!(
                "t={:.2}s pos={} vel={} grounded={}",
                clock.elapsed(),
                position,
                controller.linear_velocity(),
                controller.is_on_ground()
            );
        }
    };

    match options.frame_ms {
        Some(frame_ms) if frame_ms > 0.0 => {
            let frame = frame_ms / 1000.0;
            while clock.ticks() < options.ticks {
                let due = clock.advance(frame);
                for _ in 0..due {
                    if clock.ticks() >= options.ticks {
                        break;
                    }
                    run_tick(&mut clock);
                }
                log::trace!("frame ran {} ticks, alpha {:.3}", due, clock.interpolation());
            }
        }
        _ => {
            for _ in 0..options.ticks {
                run_tick(&mut clock);
            }
        }
    }

    Ok(SimulationReport {
        ticks: clock.ticks(),
        elapsed: clock.elapsed(),
        jumps,
        position: controller.position(),
        velocity: controller.linear_velocity(),
        on_ground: controller.is_on_ground(),
        on_steep_ground: controller.is_on_steep_ground(),
        ground_normal: controller.ground_normal(),
        ground_velocity: controller.ground_velocity(),
        platforms,
    })
}

/// Cast the segment `from -> to` through `scene`.
pub fn raycast(scene: &SceneDesc, from: Vec3, to: Vec3) -> Result<RaycastResult> {
    let (controller, _) = scene.instantiate()?;
    Ok(controller.raycast(from, to))
}

/// Execute the CLI command
pub fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    match cli.command {
        Commands::Simulate {
            scene,
            ticks,
            hz,
            walk,
            jump_every,
            frame_ms,
        } => {
            let scene = load_scene(scene.as_deref())?;
            let options = SimulateOptions {
                ticks,
                hz,
                walk,
                jump_every,
                frame_ms,
            };
            let report = simulate(&scene, &options)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::Raycast { scene, from, to } => {
            let scene = load_scene(scene.as_deref())?;
            let result = raycast(&scene, from, to)?;
            if result.hit {
                log::info!("hit at {} ({:.3} units)", result.point, result.distance);
            } else {
                log::info!("no hit");
            }
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::SampleScene => {
            println!("{}", SceneDesc::sample().to_json_pretty()?);
        }
    }

    Ok(())
}
