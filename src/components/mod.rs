//! Component data stored by the scenes.
//!
//! Submodules overview:
//! - [`animable`] – per-entity animation playback state
//! - [`renderable`] – skeletal model, pose buffer and the renderable pairing them

pub mod animable;
pub mod renderable;
