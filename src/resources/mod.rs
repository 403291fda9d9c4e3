//! ECS resources made available to systems.
//!
//! Overview
//! - `animationconfig` – INI-backed engine settings
//! - `animationscene` – animable slot store, update loop and persistence
//! - `animationstore` – clip cache and loader thread bridge
//! - `renderscene` – generational storage for skeletal renderables
//! - `universe` – entity identity and component registration
//! - `worldtime` – simulation time and delta
pub mod animationconfig;
pub mod animationscene;
pub mod animationstore;
pub mod renderscene;
pub mod universe;
pub mod worldtime;
