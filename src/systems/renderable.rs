//! World-level renderable lifecycle.
//!
//! Creating a renderable registers it with the [`Universe`] and fires
//! [`ComponentCreatedEvent`], which lets an animable created earlier on the
//! same entity pick it up.

use std::sync::Arc;

use bevy_ecs::prelude::*;
use log::warn;

use crate::components::renderable::SkeletalModel;
use crate::events::componentcreated::ComponentCreatedEvent;
use crate::resources::renderscene::RenderScene;
use crate::resources::universe::{ComponentHandle, ComponentType, EntityId, Universe};

pub fn create_renderable(
    world: &mut World,
    entity: EntityId,
    model: Arc<SkeletalModel>,
) -> ComponentHandle {
    let renderable = world
        .resource_mut::<RenderScene>()
        .create_renderable(entity, model);
    let handle = world.resource_mut::<Universe>().add_component(
        entity,
        ComponentType::Renderable,
        renderable.index,
    );
    world.trigger(ComponentCreatedEvent { handle });
    handle
}

pub fn destroy_renderable(world: &mut World, handle: ComponentHandle) {
    {
        let mut render_scene = world.resource_mut::<RenderScene>();
        match render_scene.resolve_component(handle) {
            Some(renderable) => {
                render_scene.destroy_renderable(renderable);
            }
            None => warn!("destroy_renderable on unknown component {:?}", handle),
        }
    }
    world.resource_mut::<Universe>().destroy_component(handle);
}
