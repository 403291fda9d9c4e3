//! Animable component store library.
//!
//! Per-entity skeletal animation playback hosted in a `bevy_ecs` world:
//! slot storage with first-fit reuse, late binding to renderables, a
//! tick-driven update with looping, and binary save/load. Exposes the
//! components, resources, systems, and events for use in integration tests
//! and as a reusable library.

pub mod blob;
pub mod components;
pub mod engine;
pub mod events;
pub mod resources;
pub mod systems;
