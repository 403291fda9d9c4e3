//! Engine facade.
//!
//! [`Engine`] owns the ECS [`World`] holding every scene resource and the
//! per-tick [`Schedule`]. It is the entry point used by the binary and the
//! integration tests: entity and component lifecycle, playback control,
//! ticking, and whole-world save/load.
//!
//! # Tick
//!
//! 1. [`update_world_time`] applies the time scale to `dt`
//! 2. [`poll_clip_loads`] settles clips finished by the loader thread
//! 3. [`animation`] samples and advances every animable
//!
//! # Snapshots
//!
//! [`Engine::save`] writes the universe, the render scene and the animation
//! scene, in that order. [`Engine::load`] decodes all three into fresh
//! resources and only swaps them in once every scene decoded cleanly.

use std::sync::Arc;

use bevy_ecs::prelude::*;
use log::{info, warn};

use crate::blob::{BlobError, InputBlob, OutputBlob};
use crate::components::renderable::SkeletalModel;
use crate::events::componentcreated::{subscribe_animable_binding, unsubscribe_animable_binding};
use crate::resources::animationconfig::AnimationConfig;
use crate::resources::animationscene::AnimationScene;
use crate::resources::animationstore::{
    AnimationClip, AnimationStore, ClipHandle, setup_clip_loader, shutdown_clip_loader,
};
use crate::resources::renderscene::RenderScene;
use crate::resources::universe::{ComponentHandle, ComponentType, EntityId, Universe};
use crate::resources::worldtime::WorldTime;
use crate::systems::animable::{create_animable, destroy_animable, play_animation};
use crate::systems::animation::animation;
use crate::systems::cliploader::poll_clip_loads;
use crate::systems::renderable::{create_renderable, destroy_renderable};
use crate::systems::time::update_world_time;

pub struct Engine {
    world: World,
    schedule: Schedule,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(AnimationConfig::new())
    }

    pub fn with_config(config: AnimationConfig) -> Self {
        let mut world = World::new();
        world.insert_resource(WorldTime::with_time_scale(config.time_scale));
        world.insert_resource(config);
        world.init_resource::<Universe>();
        world.init_resource::<RenderScene>();
        world.init_resource::<AnimationScene>();
        world.init_resource::<AnimationStore>();
        subscribe_animable_binding(&mut world);

        let mut schedule = Schedule::default();
        schedule.add_systems((poll_clip_loads, animation).chain());

        Self { world, schedule }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn config(&self) -> &AnimationConfig {
        self.world.resource::<AnimationConfig>()
    }

    pub fn universe(&self) -> &Universe {
        self.world.resource::<Universe>()
    }

    pub fn render_scene(&self) -> &RenderScene {
        self.world.resource::<RenderScene>()
    }

    pub fn animation_scene(&self) -> &AnimationScene {
        self.world.resource::<AnimationScene>()
    }

    pub fn animation_store(&self) -> &AnimationStore {
        self.world.resource::<AnimationStore>()
    }

    pub fn time(&self) -> WorldTime {
        *self.world.resource::<WorldTime>()
    }

    /// Spawn the background clip loader rooted at the configured asset root.
    pub fn start_clip_loader(&mut self) {
        let asset_root = self.config().asset_root.clone();
        setup_clip_loader(&mut self.world, asset_root);
    }

    /// Make `clip` available under `path` without going through the loader.
    pub fn insert_clip(&mut self, path: &str, clip: AnimationClip) -> ClipHandle {
        self.world
            .resource_mut::<AnimationStore>()
            .insert(path, clip)
    }

    pub fn release_unused_clips(&mut self) -> usize {
        self.world.resource_mut::<AnimationStore>().release_unused()
    }

    pub fn create_entity(&mut self) -> EntityId {
        self.world.resource_mut::<Universe>().create_entity()
    }

    /// Destroy every component of `entity`, then the entity itself.
    pub fn destroy_entity(&mut self, entity: EntityId) {
        let components = self.universe().components(entity).to_vec();
        for handle in components {
            self.destroy_component(handle);
        }
        self.world.resource_mut::<Universe>().destroy_entity(entity);
    }

    /// Create a component of type `ty`. Renderables get an empty skeleton;
    /// use [`Engine::create_renderable`] to supply one.
    pub fn create_component(&mut self, ty: ComponentType, entity: EntityId) -> ComponentHandle {
        match ty {
            ComponentType::Animable => create_animable(&mut self.world, entity),
            ComponentType::Renderable => {
                create_renderable(&mut self.world, entity, Arc::new(SkeletalModel::default()))
            }
        }
    }

    pub fn create_renderable(
        &mut self,
        entity: EntityId,
        model: Arc<SkeletalModel>,
    ) -> ComponentHandle {
        create_renderable(&mut self.world, entity, model)
    }

    pub fn destroy_component(&mut self, handle: ComponentHandle) {
        match handle.ty {
            ComponentType::Animable => destroy_animable(&mut self.world, handle),
            ComponentType::Renderable => destroy_renderable(&mut self.world, handle),
        }
    }

    pub fn get_animable(&self, entity: EntityId) -> Option<ComponentHandle> {
        self.animation_scene().get_animable(entity)
    }

    pub fn set_manual(&mut self, handle: ComponentHandle, manual: bool) {
        self.world
            .resource_mut::<AnimationScene>()
            .set_manual(handle, manual);
    }

    pub fn is_manual(&self, handle: ComponentHandle) -> bool {
        self.animation_scene().is_manual(handle)
    }

    pub fn play(&mut self, handle: ComponentHandle, path: &str) {
        play_animation(&mut self.world, handle, path);
    }

    pub fn set_frame(&mut self, handle: ComponentHandle, frame: i32) {
        self.world
            .resource_mut::<AnimationScene>()
            .set_frame(handle, frame);
    }

    pub fn frame_count(&self, handle: ComponentHandle) -> i32 {
        self.animation_scene().frame_count(handle)
    }

    pub fn animation_time(&self, handle: ComponentHandle) -> f32 {
        self.animation_scene().time(handle)
    }

    pub fn set_animation_time(&mut self, handle: ComponentHandle, time: f32) {
        self.world
            .resource_mut::<AnimationScene>()
            .set_time(handle, time);
    }

    pub fn preview(&self, handle: ComponentHandle) -> String {
        self.animation_scene().preview(handle)
    }

    pub fn set_preview(&mut self, handle: ComponentHandle, path: &str) {
        play_animation(&mut self.world, handle, path);
    }

    /// Advance the simulation by `dt` unscaled seconds.
    pub fn tick(&mut self, dt: f32) {
        update_world_time(&mut self.world, dt);
        self.schedule.run(&mut self.world);
    }

    /// Encode the universe, render scene and animation scene.
    pub fn save(&self) -> Vec<u8> {
        let mut blob = OutputBlob::new();
        self.universe().serialize(&mut blob);
        self.render_scene().serialize(&mut blob);
        self.animation_scene().serialize(&mut blob);
        info!("Saved snapshot ({} bytes)", blob.len());
        blob.into_inner()
    }

    /// Replace every scene with the snapshot in `bytes`.
    ///
    /// On error the current scenes are left untouched.
    pub fn load(&mut self, bytes: &[u8]) -> Result<(), BlobError> {
        let mut blob = InputBlob::new(bytes);
        let mut universe = Universe::new();
        let mut render_scene = RenderScene::new();
        let mut scene = AnimationScene::new();

        universe.deserialize(&mut blob)?;
        render_scene.deserialize(&mut blob, &mut universe)?;
        {
            let mut store = self.world.resource_mut::<AnimationStore>();
            scene.deserialize(&mut blob, &render_scene, &mut store, &mut universe)?;
        }
        if blob.remaining() > 0 {
            warn!("{} trailing bytes after snapshot", blob.remaining());
        }

        self.world.insert_resource(universe);
        self.world.insert_resource(render_scene);
        self.world.insert_resource(scene);
        info!(
            "Loaded snapshot: {} entities, {} renderables, {} animable slots",
            self.universe().entity_count(),
            self.render_scene().len(),
            self.animation_scene().len()
        );
        Ok(())
    }

    /// Stop the clip loader and drop the creation listener.
    pub fn shutdown(&mut self) {
        unsubscribe_animable_binding(&mut self.world);
        shutdown_clip_loader(&mut self.world);
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
