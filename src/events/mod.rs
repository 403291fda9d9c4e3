//! Event types and observers used by the engine.
//!
//! Submodules:
//! - [`cliploader`] – commands and results for the background clip loader thread
//! - [`componentcreated`] – component creation notification and the animable binding observer
pub mod cliploader;
pub mod componentcreated;
