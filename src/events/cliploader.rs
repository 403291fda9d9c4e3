//! Messages exchanged with the background clip loader thread.
//!
//! See [`crate::resources::animationstore::setup_clip_loader`] for the
//! bridge that carries them and [`crate::systems::cliploader`] for both ends
//! of the conversation.

use crate::resources::animationstore::{AnimationClip, ClipError};

/// Commands sent *to* the loader thread.
#[derive(Debug, Clone)]
pub enum ClipLoaderCmd {
    /// Read and decode the clip at `path`, relative to the asset root.
    Load { path: String },
    Shutdown,
}

/// Result sent *back* from the loader thread.
#[derive(Debug)]
pub struct ClipLoaded {
    pub path: String,
    pub result: Result<AnimationClip, ClipError>,
}
