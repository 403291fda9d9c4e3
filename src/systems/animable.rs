//! World-level animable lifecycle.
//!
//! Wraps the [`AnimationScene`] operations that need collaborators held as
//! other resources, and fires [`ComponentCreatedEvent`] after a creation so
//! listeners see a fully registered component.

use bevy_ecs::prelude::*;

use crate::events::componentcreated::ComponentCreatedEvent;
use crate::resources::animationscene::AnimationScene;
use crate::resources::animationstore::AnimationStore;
use crate::resources::renderscene::RenderScene;
use crate::resources::universe::{ComponentHandle, EntityId, Universe};

/// Create an animable for `entity` and announce it.
pub fn create_animable(world: &mut World, entity: EntityId) -> ComponentHandle {
    let handle = world.resource_scope(|world, mut scene: Mut<AnimationScene>| {
        world.resource_scope(|world, mut universe: Mut<Universe>| {
            scene.create(entity, world.resource::<RenderScene>(), &mut universe)
        })
    });
    world.trigger(ComponentCreatedEvent { handle });
    handle
}

pub fn destroy_animable(world: &mut World, handle: ComponentHandle) {
    world.resource_scope(|world, mut scene: Mut<AnimationScene>| {
        scene.destroy(handle, &mut world.resource_mut::<Universe>());
    });
}

/// Start playing the clip at `path` on `handle`.
pub fn play_animation(world: &mut World, handle: ComponentHandle, path: &str) {
    world.resource_scope(|world, mut scene: Mut<AnimationScene>| {
        scene.play(handle, path, &mut world.resource_mut::<AnimationStore>());
    });
}
