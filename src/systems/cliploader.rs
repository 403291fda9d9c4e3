//! Clip loading backed by a dedicated thread.
//!
//! - [`clip_loader_thread`] runs on its own OS thread, reads clip files from
//!   disk and decodes them, replying with a
//!   [`ClipLoaded`](crate::events::cliploader::ClipLoaded) per request.
//! - [`poll_clip_loads`] non-blockingly drains those replies into the
//!   [`AnimationStore`] each tick.
//!
//! The loader must be created via
//! [`crate::resources::animationstore::setup_clip_loader`] and stopped via
//! [`crate::resources::animationstore::shutdown_clip_loader`].

use std::path::PathBuf;

use bevy_ecs::prelude::{Res, ResMut};
use crossbeam_channel::{Receiver, Sender};
use log::{debug, info};

use crate::events::cliploader::{ClipLoaded, ClipLoaderCmd};
use crate::resources::animationstore::{AnimationClip, AnimationStore, ClipLoaderBridge};

/// Apply finished loads to their pending handles.
///
/// Does nothing when no loader is running.
pub fn poll_clip_loads(
    bridge: Option<Res<ClipLoaderBridge>>,
    mut store: ResMut<AnimationStore>,
) {
    let Some(bridge) = bridge else {
        return;
    };
    for loaded in bridge.rx_msg.try_iter() {
        store.resolve(&loaded.path, loaded.result);
    }
}

/// Entry point of the loader thread.
///
/// Blocks on the command channel and exits on [`ClipLoaderCmd::Shutdown`]
/// or when every sender has been dropped.
pub fn clip_loader_thread(
    asset_root: PathBuf,
    rx_cmd: Receiver<ClipLoaderCmd>,
    tx_msg: Sender<ClipLoaded>,
) {
    info!(
        "[clips] loader thread starting (id={:?})",
        std::thread::current().id()
    );
    for cmd in rx_cmd.iter() {
        match cmd {
            ClipLoaderCmd::Load { path } => {
                debug!("[clips] loading '{}'", path);
                let result = AnimationClip::load_from_file(&asset_root.join(&path));
                if tx_msg.send(ClipLoaded { path, result }).is_err() {
                    break;
                }
            }
            ClipLoaderCmd::Shutdown => break,
        }
    }
    info!("[clips] loader thread exiting");
}
