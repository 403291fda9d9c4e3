//! Component creation notification.
//!
//! Every scene that creates a component triggers a [`ComponentCreatedEvent`]
//! once the component is registered with the
//! [`Universe`](crate::resources::universe::Universe). The animation scene
//! listens for it to bind renderables created after their animable.
//!
//! The listener is an observer entity. [`subscribe_animable_binding`] spawns
//! it and records it in [`AnimableBindingSubscription`];
//! [`unsubscribe_animable_binding`] despawns it again.

use bevy_ecs::observer::{Observer, On};
use bevy_ecs::prelude::*;
use log::debug;

use crate::resources::animationscene::AnimationScene;
use crate::resources::renderscene::RenderScene;
use crate::resources::universe::ComponentHandle;

/// A component was created and registered.
#[derive(Event, Debug, Clone, Copy)]
pub struct ComponentCreatedEvent {
    pub handle: ComponentHandle,
}

/// Observer entity listening for [`ComponentCreatedEvent`] on behalf of the
/// animation scene.
#[derive(Resource, Debug, Clone, Copy)]
pub struct AnimableBindingSubscription {
    pub observer: Entity,
}

/// Forward component creations to [`AnimationScene::on_component_created`].
pub fn animable_binding_observer(
    trigger: On<ComponentCreatedEvent>,
    scene: Option<ResMut<AnimationScene>>,
    render_scene: Option<Res<RenderScene>>,
) {
    let handle = trigger.event().handle;
    let (Some(mut scene), Some(render_scene)) = (scene, render_scene) else {
        debug!("ComponentCreatedEvent {:?} with no scenes present", handle);
        return;
    };
    scene.on_component_created(handle, &render_scene);
}

/// Start listening. A second call while subscribed is a no-op.
pub fn subscribe_animable_binding(world: &mut World) {
    if world.contains_resource::<AnimableBindingSubscription>() {
        return;
    }
    let observer = world
        .spawn(Observer::new(animable_binding_observer))
        .id();
    world.flush();
    world.insert_resource(AnimableBindingSubscription { observer });
    debug!("Animable binding observer {:?} subscribed", observer);
}

/// Stop listening. Safe to call when not subscribed.
pub fn unsubscribe_animable_binding(world: &mut World) {
    if let Some(subscription) = world.remove_resource::<AnimableBindingSubscription>() {
        world.despawn(subscription.observer);
        debug!("Animable binding observer {:?} unsubscribed", subscription.observer);
    }
}
