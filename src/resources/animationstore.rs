//! Animation clip cache and loader bridge.
//!
//! [`AnimationStore`] hands out shared [`ClipHandle`]s keyed by asset path.
//! The first request for a path registers a pending handle and, if a loader
//! thread is attached, forwards a load command to it. Results come back
//! through [`ClipLoaderBridge`] and are applied by
//! [`poll_clip_loads`](crate::systems::cliploader::poll_clip_loads).
//! Nothing here blocks: callers check [`ClipResource::is_ready`] each tick.
//!
//! Use [`setup_clip_loader`] once during initialization and
//! [`shutdown_clip_loader`] during teardown.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, unbounded};
use glam::{Quat, Vec3};
use log::{debug, info, warn};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::renderable::{Pose, SkeletalModel};
use crate::events::cliploader::{ClipLoaded, ClipLoaderCmd};
use crate::systems::cliploader::clip_loader_thread;

/// Errors produced while decoding a clip file.
#[derive(Debug, Error)]
pub enum ClipError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid clip metadata: {0}")]
    InvalidMetadata(String),
}

/// Per-bone keys, one per frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneTrack {
    pub bone: String,
    #[serde(default)]
    pub translations: Vec<Vec3>,
    #[serde(default)]
    pub rotations: Vec<Quat>,
}

/// Decoded skeletal animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationClip {
    /// Frames per second.
    pub fps: f32,
    pub frame_count: u32,
    #[serde(default)]
    pub tracks: Vec<BoneTrack>,
}

impl AnimationClip {
    pub fn new(fps: f32, frame_count: u32) -> Self {
        Self {
            fps,
            frame_count,
            tracks: Vec::new(),
        }
    }

    pub fn with_track(mut self, track: BoneTrack) -> Self {
        self.tracks.push(track);
        self
    }

    pub fn from_json(text: &str) -> Result<Self, ClipError> {
        let clip: Self = serde_json::from_str(text)?;
        if !clip.fps.is_finite() || clip.fps < 0.0 {
            return Err(ClipError::InvalidMetadata(format!("fps {}", clip.fps)));
        }
        Ok(clip)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ClipError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Length in seconds. Zero when the sample rate is not positive.
    pub fn length(&self) -> f32 {
        if self.fps > 0.0 {
            self.frame_count as f32 / self.fps
        } else {
            0.0
        }
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn sample_rate(&self) -> f32 {
        self.fps
    }

    /// Write the clip's pose at `time` into `pose`.
    ///
    /// Keys are interpolated between the two frames surrounding `time` and
    /// clamped to the last key. Tracks naming bones absent from `model` are
    /// ignored, as are bones the clip has no track for.
    pub fn sample_into(&self, time: f32, pose: &mut Pose, model: &SkeletalModel) {
        if self.frame_count == 0 {
            return;
        }
        let last = (self.frame_count - 1) as usize;
        let frame = (time * self.fps).max(0.0);
        let (key, t) = if frame >= last as f32 {
            (last, 0.0)
        } else {
            let key = frame.floor() as usize;
            (key, frame - key as f32)
        };

        for track in &self.tracks {
            let Some(bone) = model.bone_index(&track.bone) else {
                continue;
            };
            if bone >= pose.len() {
                continue;
            }
            if let Some((a, b)) = key_pair(&track.translations, key) {
                pose.translations[bone] = a.lerp(b, t);
            }
            if let Some((a, b)) = key_pair(&track.rotations, key) {
                pose.rotations[bone] = a.slerp(b, t);
            }
        }
    }
}

fn key_pair<T: Copy>(keys: &[T], key: usize) -> Option<(T, T)> {
    let last = keys.len().checked_sub(1)?;
    Some((keys[key.min(last)], keys[key.saturating_add(1).min(last)]))
}

#[derive(Debug)]
enum ClipState {
    Ready(AnimationClip),
    Failed,
}

/// Clip slot shared between the cache and every animable using it.
#[derive(Debug)]
pub struct ClipResource {
    path: Arc<str>,
    state: OnceLock<ClipState>,
}

/// Shared, reference-counted clip handle.
pub type ClipHandle = Arc<ClipResource>;

impl ClipResource {
    fn pending(path: Arc<str>) -> Self {
        Self {
            path,
            state: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state.get(), Some(ClipState::Ready(_)))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state.get(), Some(ClipState::Failed))
    }

    /// The decoded clip once loading has succeeded.
    pub fn clip(&self) -> Option<&AnimationClip> {
        match self.state.get() {
            Some(ClipState::Ready(clip)) => Some(clip),
            _ => None,
        }
    }

    /// Settle a pending clip. Returns false if it was already settled.
    fn settle(&self, result: Result<AnimationClip, ClipError>) -> bool {
        let state = match result {
            Ok(clip) => ClipState::Ready(clip),
            Err(e) => {
                warn!("Failed to load animation '{}': {}", self.path, e);
                ClipState::Failed
            }
        };
        self.state.set(state).is_ok()
    }
}

/// Cache of clips keyed by asset path.
#[derive(Resource, Default)]
pub struct AnimationStore {
    clips: FxHashMap<Arc<str>, ClipHandle>,
    tx_cmd: Option<Sender<ClipLoaderCmd>>,
}

impl AnimationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the handle for `path`, requesting a load on first use.
    pub fn load(&mut self, path: &str) -> ClipHandle {
        if let Some(handle) = self.clips.get(path) {
            return Arc::clone(handle);
        }
        let key: Arc<str> = Arc::from(path);
        let handle = Arc::new(ClipResource::pending(Arc::clone(&key)));
        self.clips.insert(key, Arc::clone(&handle));

        match &self.tx_cmd {
            Some(tx) => {
                if tx
                    .send(ClipLoaderCmd::Load {
                        path: path.to_string(),
                    })
                    .is_err()
                {
                    warn!("Clip loader is gone, '{}' stays pending", path);
                }
            }
            None => debug!("No clip loader attached, '{}' stays pending", path),
        }
        handle
    }

    /// Register an already decoded clip under `path` and return its handle.
    ///
    /// A pending handle for the same path is settled in place so existing
    /// holders see the clip.
    pub fn insert(&mut self, path: &str, clip: AnimationClip) -> ClipHandle {
        if let Some(handle) = self.clips.get(path) {
            if !handle.settle(Ok(clip.clone())) {
                debug!("Replacing settled clip '{}'", path);
                let key: Arc<str> = Arc::from(path);
                let fresh = Arc::new(ClipResource::pending(Arc::clone(&key)));
                fresh.settle(Ok(clip));
                self.clips.insert(key, Arc::clone(&fresh));
                return fresh;
            }
            return Arc::clone(handle);
        }
        let key: Arc<str> = Arc::from(path);
        let handle = Arc::new(ClipResource::pending(Arc::clone(&key)));
        handle.settle(Ok(clip));
        self.clips.insert(key, Arc::clone(&handle));
        handle
    }

    /// Apply a loader result to the pending handle for `path`.
    pub fn resolve(&mut self, path: &str, result: Result<AnimationClip, ClipError>) {
        match self.clips.get(path) {
            Some(handle) => {
                if handle.settle(result) {
                    debug!("Animation '{}' settled", path);
                }
            }
            None => debug!("Dropping load result for released clip '{}'", path),
        }
    }

    pub fn get(&self, path: &str) -> Option<&ClipHandle> {
        self.clips.get(path)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.clips.values().filter(|c| c.state.get().is_none()).count()
    }

    /// Drop clips nobody but the cache holds. Returns how many were dropped.
    pub fn release_unused(&mut self) -> usize {
        let before = self.clips.len();
        self.clips.retain(|_, handle| Arc::strong_count(handle) > 1);
        let released = before - self.clips.len();
        if released > 0 {
            debug!("Released {} unused clips", released);
        }
        released
    }

    pub fn attach_loader(&mut self, tx_cmd: Sender<ClipLoaderCmd>) {
        self.tx_cmd = Some(tx_cmd);
    }

    pub fn detach_loader(&mut self) {
        self.tx_cmd = None;
    }
}

/// Channels and thread handle of the background clip loader.
#[derive(Resource)]
pub struct ClipLoaderBridge {
    /// Sender for [`ClipLoaderCmd`] messages (ECS -> loader thread).
    pub tx_cmd: Sender<ClipLoaderCmd>,
    /// Receiver for [`ClipLoaded`] messages (loader thread -> ECS).
    pub rx_msg: Receiver<ClipLoaded>,
    pub handle: std::thread::JoinHandle<()>,
}

/// Spawn the loader thread reading clips relative to `asset_root`.
///
/// Initializes [`AnimationStore`] if missing, attaches the command sender to
/// it and inserts [`ClipLoaderBridge`].
pub fn setup_clip_loader(world: &mut World, asset_root: impl Into<PathBuf>) {
    let asset_root = asset_root.into();
    let (tx_cmd, rx_cmd) = unbounded::<ClipLoaderCmd>();
    let (tx_msg, rx_msg) = unbounded::<ClipLoaded>();

    info!("Starting clip loader at {:?}", asset_root);
    let handle = std::thread::spawn(move || clip_loader_thread(asset_root, rx_cmd, tx_msg));

    world.init_resource::<AnimationStore>();
    world
        .resource_mut::<AnimationStore>()
        .attach_loader(tx_cmd.clone());
    world.insert_resource(ClipLoaderBridge {
        tx_cmd,
        rx_msg,
        handle,
    });
}

/// Stop the loader thread and join it. Pending clips stay pending.
pub fn shutdown_clip_loader(world: &mut World) {
    if let Some(mut store) = world.get_resource_mut::<AnimationStore>() {
        store.detach_loader();
    }
    if let Some(bridge) = world.remove_resource::<ClipLoaderBridge>() {
        let _ = bridge.tx_cmd.send(ClipLoaderCmd::Shutdown);
        let _ = bridge.handle.join();
        info!("Clip loader stopped");
    }
}
