//! Animation update system.
//!
//! [`animation`] runs once per tick after pending clip loads have been
//! applied. It hands the tick delta from [`WorldTime`] to
//! [`AnimationScene::update`], which samples every playing animable into
//! its renderable's pose and advances the non-manual ones.
//!
//! # Related
//!
//! - [`crate::components::animable::AnimableSlot`] – per-entity playback state
//! - [`crate::resources::animationstore::AnimationStore`] – clip cache
//! - [`crate::systems::cliploader::poll_clip_loads`] – must run before this

use bevy_ecs::prelude::*;

use crate::resources::animationscene::AnimationScene;
use crate::resources::renderscene::RenderScene;
use crate::resources::worldtime::WorldTime;

/// Advance animation playback and write poses.
pub fn animation(
    mut scene: ResMut<AnimationScene>,
    mut render_scene: ResMut<RenderScene>,
    time: Res<WorldTime>,
) {
    scene.update(time.delta, &mut render_scene);
}
