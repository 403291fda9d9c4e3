//! Animable command line driver.
//!
//! - `simulate` builds a small skeletal scene, plays clips on it for a number
//!   of fixed ticks and can write the resulting snapshot to disk.
//! - `inspect` loads a snapshot and prints every animable slot.
//!
//! # Running
//!
//! ```sh
//! cargo run -- simulate --ticks 90 --save scene.bin
//! cargo run -- inspect scene.bin
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use animable::components::renderable::SkeletalModel;
use animable::engine::Engine;
use animable::resources::animationconfig::AnimationConfig;
use animable::resources::animationstore::{AnimationClip, BoneTrack};
use animable::resources::universe::ComponentType;
use clap::{Parser, Subcommand};
use glam::{Quat, Vec3};
use log::{error, info, warn};

/// Skeletal animation store driver
#[derive(Parser)]
#[command(version, about = "Drive and inspect animable scenes")]
struct Cli {
    /// INI configuration file. Defaults are used when it is missing.
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a demo scene and run it for a number of ticks.
    Simulate {
        #[arg(long, default_value_t = 120)]
        ticks: u32,

        /// Clip file under the asset root to play instead of the built-in one.
        #[arg(long, value_name = "PATH")]
        clip: Option<String>,

        /// Write the final snapshot here.
        #[arg(long, value_name = "PATH")]
        save: Option<PathBuf>,
    },
    /// Print the animable slots stored in a snapshot.
    Inspect {
        #[arg(value_name = "SNAPSHOT")]
        snapshot: PathBuf,
    },
}

const BUILTIN_CLIP: &str = "builtin/wave";

fn wave_clip() -> AnimationClip {
    let frames = 24;
    let rotations = (0..frames)
        .map(|i| Quat::from_rotation_z((i as f32 / frames as f32) * std::f32::consts::TAU))
        .collect();
    let translations = (0..frames)
        .map(|i| Vec3::new(0.0, (i as f32 * 0.25).sin(), 0.0))
        .collect();
    AnimationClip::new(24.0, frames).with_track(BoneTrack {
        bone: "arm".to_string(),
        translations,
        rotations,
    })
}

fn load_config(path: Option<PathBuf>) -> AnimationConfig {
    let Some(path) = path else {
        return AnimationConfig::new();
    };
    let mut config = AnimationConfig::with_path(path);
    if let Err(e) = config.load_from_file() {
        warn!("Config file not found or invalid, using defaults: {}", e);
    }
    config
}

fn simulate(config: AnimationConfig, ticks: u32, clip: Option<String>, save: Option<PathBuf>) {
    let dt = config.tick_delta();
    let mut engine = Engine::with_config(config);
    engine.start_clip_loader();
    engine.insert_clip(BUILTIN_CLIP, wave_clip());
    let clip_path = clip.as_deref().unwrap_or(BUILTIN_CLIP);
    let model = Arc::new(SkeletalModel::chain(["root", "arm"]));

    // renderable first, bound at creation
    let a = engine.create_entity();
    engine.create_renderable(a, Arc::clone(&model));
    let anim_a = engine.create_component(ComponentType::Animable, a);
    engine.play(anim_a, clip_path);

    // animable first, bound when the renderable shows up
    let b = engine.create_entity();
    let anim_b = engine.create_component(ComponentType::Animable, b);
    engine.create_renderable(b, Arc::clone(&model));
    engine.play(anim_b, clip_path);

    // manual, parked on a frame
    let c = engine.create_entity();
    engine.create_renderable(c, model);
    let anim_c = engine.create_component(ComponentType::Animable, c);
    engine.play(anim_c, BUILTIN_CLIP);
    engine.set_manual(anim_c, true);
    engine.set_frame(anim_c, 12);

    for _ in 0..ticks {
        engine.tick(dt);
    }
    info!(
        "Ran {} ticks ({:.3}s simulated)",
        engine.time().frame_count,
        engine.time().elapsed
    );
    print_slots(&engine);

    if let Some(path) = save {
        let bytes = engine.save();
        if let Err(e) = std::fs::write(&path, &bytes) {
            error!("Failed to write snapshot {:?}: {}", path, e);
            std::process::exit(1);
        }
        println!("Snapshot written to {} ({} bytes)", path.display(), bytes.len());
    }
    engine.shutdown();
}

fn inspect(config: AnimationConfig, snapshot: PathBuf) {
    let bytes = match std::fs::read(&snapshot) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", snapshot.display());
            std::process::exit(1);
        }
    };
    let mut engine = Engine::with_config(config);
    if let Err(e) = engine.load(&bytes) {
        eprintln!("Error decoding {}: {e}", snapshot.display());
        std::process::exit(1);
    }
    print_slots(&engine);
}

fn print_slots(engine: &Engine) {
    let scene = engine.animation_scene();
    let render = engine.render_scene();
    println!("{} animable slot(s)", scene.len());
    for (index, slot) in scene.slots().iter().enumerate() {
        let entity = slot
            .entity
            .map_or_else(|| "-".to_string(), |e| format!("{}v{}", e.index, e.generation));
        let bound = slot.renderable.is_some_and(|r| render.is_valid(r));
        println!(
            "[{index}] entity={entity} free={} manual={} time={:.4} bound={} clip={:?}",
            slot.is_free,
            slot.manual,
            slot.time,
            bound,
            slot.clip_path()
        );
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(cli.config);

    match cli.command {
        Command::Simulate { ticks, clip, save } => simulate(config, ticks, clip, save),
        Command::Inspect { snapshot } => inspect(config, snapshot),
    }
}
