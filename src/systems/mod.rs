//! Engine systems.
//!
//! Submodules overview
//! - [`animable`] – world-level animable create/destroy/play
//! - [`animation`] – sample clips into poses and advance playback
//! - [`cliploader`] – loader thread body and the poll system draining it
//! - [`renderable`] – world-level renderable create/destroy
//! - [`time`] – update simulation time and delta

pub mod animable;
pub mod animation;
pub mod cliploader;
pub mod renderable;
pub mod time;
