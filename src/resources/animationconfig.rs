//! Animation engine configuration resource.
//!
//! Settings loaded from an INI file, with defaults that work without one.
//!
//! # Configuration File Format
//!
//! ```ini
//! [animation]
//! asset_root = assets/animations
//! time_scale = 1.0
//!
//! [engine]
//! tick_rate = 60
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::{info, warn};
use std::path::PathBuf;

const DEFAULT_ASSET_ROOT: &str = "assets/animations";
const DEFAULT_TIME_SCALE: f32 = 1.0;
const DEFAULT_TICK_RATE: u32 = 60;
const DEFAULT_CONFIG_PATH: &str = "./animable.ini";

#[derive(Resource, Debug, Clone)]
pub struct AnimationConfig {
    /// Directory clip paths are resolved against.
    pub asset_root: PathBuf,
    /// Multiplier applied to every tick delta.
    pub time_scale: f32,
    /// Ticks per simulated second.
    pub tick_rate: u32,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            asset_root: PathBuf::from(DEFAULT_ASSET_ROOT),
            time_scale: DEFAULT_TIME_SCALE,
            tick_rate: DEFAULT_TICK_RATE,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Fixed delta of one tick in seconds.
    pub fn tick_delta(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current values. Returns an error if the
    /// file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;

        // [animation] section
        if let Some(root) = config.get("animation", "asset_root") {
            self.asset_root = PathBuf::from(root);
        }
        if let Some(scale) = config.getfloat("animation", "time_scale").ok().flatten() {
            if scale.is_finite() && scale >= 0.0 {
                self.time_scale = scale as f32;
            } else {
                warn!("Ignoring invalid time_scale {}", scale);
            }
        }

        // [engine] section
        if let Some(rate) = config.getuint("engine", "tick_rate").ok().flatten() {
            if rate > 0 {
                self.tick_rate = rate as u32;
            } else {
                warn!("Ignoring tick_rate 0");
            }
        }

        info!(
            "Loaded config: asset_root={:?}, time_scale={}, tick_rate={}",
            self.asset_root, self.time_scale, self.tick_rate
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        config.set(
            "animation",
            "asset_root",
            Some(self.asset_root.to_string_lossy().into_owned()),
        );
        config.set("animation", "time_scale", Some(self.time_scale.to_string()));
        config.set("engine", "tick_rate", Some(self.tick_rate.to_string()));

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }
}
