//! Animable component store.
//!
//! [`AnimationScene`] owns every animable slot in a dense array. Destroyed
//! slots are only marked free and are reused first-fit, so the index inside
//! a [`ComponentHandle`] stays valid for as long as its component lives.
//! Lookups by entity scan the array; no secondary index is kept.
//!
//! The scene does not own its collaborators. Operations that need the
//! registry, the render scene or the clip cache take them as arguments; the
//! world-level wrappers in [`crate::systems::animable`] fetch them from the
//! ECS world and fire the creation notification.
//!
//! # Persisted layout
//!
//! ```text
//! i32 count
//! count x {
//!     bool   manual
//!     i32    entity index of the bound renderable, -1 when unbound
//!     f32    time
//!     bool   is_free
//!     string clip path, empty when no clip
//! }
//! ```

use bevy_ecs::prelude::Resource;
use log::{debug, info, warn};

use crate::blob::{BlobError, InputBlob, MAX_STRING_LEN, OutputBlob};
use crate::components::animable::AnimableSlot;
use crate::resources::animationstore::AnimationStore;
use crate::resources::renderscene::RenderScene;
use crate::resources::universe::{ComponentHandle, ComponentType, EntityId, Universe};

/// Entity index written for slots without a renderable binding.
pub const INVALID_ENTITY_INDEX: i32 = -1;

/// Frame count reported for slots without a clip.
pub const UNKNOWN_FRAME_COUNT: i32 = -1;

#[derive(Resource, Debug, Default)]
pub struct AnimationScene {
    animables: Vec<AnimableSlot>,
}

impl AnimationScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owns_component_type(&self, ty: ComponentType) -> bool {
        ty == ComponentType::Animable
    }

    /// Handle of the live animable attached to `entity`.
    pub fn get_animable(&self, entity: EntityId) -> Option<ComponentHandle> {
        self.animables
            .iter()
            .position(|a| !a.is_free && a.entity == Some(entity))
            .map(|index| ComponentHandle {
                entity,
                ty: ComponentType::Animable,
                index,
            })
    }

    /// Create an animable for `entity` and register it with `universe`.
    ///
    /// Reuses the first free slot, else appends. The slot starts from
    /// defaults and binds the entity's renderable if one already exists.
    /// Firing the creation notification is left to the caller.
    pub fn create(
        &mut self,
        entity: EntityId,
        render_scene: &RenderScene,
        universe: &mut Universe,
    ) -> ComponentHandle {
        let mut slot = AnimableSlot::new(entity);
        slot.renderable = render_scene.get_renderable(entity);

        let index = match self.animables.iter().position(|a| a.is_free) {
            Some(index) => {
                self.animables[index] = slot;
                index
            }
            None => {
                self.animables.push(slot);
                self.animables.len() - 1
            }
        };
        debug!(
            "Created animable {} for {:?} (renderable bound: {})",
            index,
            entity,
            self.animables[index].renderable.is_some()
        );
        universe.add_component(entity, ComponentType::Animable, index)
    }

    /// Mark the slot free, drop its clip and binding, and unregister it.
    ///
    /// A handle whose slot is already free or owned by another entity only
    /// unregisters the handle; the slot is left alone.
    pub fn destroy(&mut self, handle: ComponentHandle, universe: &mut Universe) {
        universe.destroy_component(handle);
        let Some(animable) = self.animables.get_mut(handle.index) else {
            warn!("Destroy on unknown animable {}", handle.index);
            return;
        };
        if animable.is_free || animable.entity != Some(handle.entity) {
            warn!(
                "Destroy on animable {} not owned by {:?}",
                handle.index, handle.entity
            );
            return;
        }
        animable.is_free = true;
        animable.clip = None;
        animable.renderable = None;
        debug!("Destroyed animable {}", handle.index);
    }

    /// Bind a renderable that was created after the animable.
    ///
    /// Called for every component creation; ignores anything that is not a
    /// renderable. Keeps a binding that is still valid.
    pub fn on_component_created(&mut self, handle: ComponentHandle, render_scene: &RenderScene) {
        if handle.ty != ComponentType::Renderable {
            return;
        }
        let Some(renderable) = render_scene.resolve_component(handle) else {
            return;
        };
        let Some(animable) = self
            .animables
            .iter_mut()
            .find(|a| !a.is_free && a.entity == Some(handle.entity))
        else {
            return;
        };
        if animable
            .renderable
            .is_some_and(|current| render_scene.is_valid(current))
        {
            return;
        }
        animable.renderable = Some(renderable);
        debug!("Late-bound renderable {} to {:?}", renderable.index, handle.entity);
    }

    pub fn slot(&self, handle: ComponentHandle) -> &AnimableSlot {
        &self.animables[handle.index]
    }

    /// All slots in storage order, free ones included.
    pub fn slots(&self) -> &[AnimableSlot] {
        &self.animables
    }

    pub fn len(&self) -> usize {
        self.animables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animables.is_empty()
    }

    pub fn is_manual(&self, handle: ComponentHandle) -> bool {
        self.animables[handle.index].manual
    }

    pub fn set_manual(&mut self, handle: ComponentHandle, manual: bool) {
        self.animables[handle.index].manual = manual;
    }

    pub fn time(&self, handle: ComponentHandle) -> f32 {
        self.animables[handle.index].time
    }

    /// Set the playback position directly, for external drivers.
    pub fn set_time(&mut self, handle: ComponentHandle, time: f32) {
        self.animables[handle.index].time = time;
    }

    /// Bind the clip at `path`, rewind and switch to automatic playback.
    ///
    /// The clip may still be loading; the update loop skips the slot until
    /// it is ready.
    ///
    /// Paths longer than [`MAX_STRING_LEN`] bytes could not be saved and
    /// are refused.
    pub fn play(&mut self, handle: ComponentHandle, path: &str, store: &mut AnimationStore) {
        if path.len() > MAX_STRING_LEN {
            warn!(
                "Refusing clip path of {} bytes (max {})",
                path.len(),
                MAX_STRING_LEN
            );
            return;
        }
        let animable = &mut self.animables[handle.index];
        animable.clip = Some(store.load(path));
        animable.time = 0.0;
        animable.manual = false;
    }

    /// Seek to `frame`. Ignored while no clip is bound or loaded.
    pub fn set_frame(&mut self, handle: ComponentHandle, frame: i32) {
        let animable = &mut self.animables[handle.index];
        let Some(clip) = animable.clip.as_ref().and_then(|c| c.clip()) else {
            return;
        };
        if clip.frame_count == 0 {
            return;
        }
        animable.time = clip.length() * frame as f32 / clip.frame_count as f32;
    }

    /// Frame count of the bound clip, or [`UNKNOWN_FRAME_COUNT`].
    pub fn frame_count(&self, handle: ComponentHandle) -> i32 {
        self.animables[handle.index]
            .clip
            .as_ref()
            .and_then(|c| c.clip())
            .map_or(UNKNOWN_FRAME_COUNT, |clip| clip.frame_count as i32)
    }

    /// Clip path shown by the property inspector.
    pub fn preview(&self, handle: ComponentHandle) -> String {
        self.animables[handle.index].clip_path().to_string()
    }

    pub fn set_preview(&mut self, handle: ComponentHandle, path: &str, store: &mut AnimationStore) {
        self.play(handle, path, store);
    }

    /// Sample and advance every live slot with a ready clip and a valid
    /// renderable. Everything else is skipped until it resolves.
    pub fn update(&mut self, delta: f32, render_scene: &mut RenderScene) {
        for animable in self.animables.iter_mut() {
            if animable.is_free {
                continue;
            }
            let Some(clip) = animable.clip.as_ref().and_then(|c| c.clip()) else {
                continue;
            };
            let Some((pose, model)) = animable
                .renderable
                .and_then(|r| render_scene.pose_and_model_mut(r))
            else {
                continue;
            };
            clip.sample_into(animable.time, pose, model);
            if !animable.manual {
                animable.time = advance_time(animable.time, delta, clip.length());
            }
        }
    }

    /// Write every slot in storage order.
    pub fn serialize(&self, blob: &mut OutputBlob) {
        blob.write_i32(self.animables.len() as i32);
        for animable in &self.animables {
            blob.write_bool(animable.manual);
            blob.write_i32(
                animable
                    .renderable
                    .map_or(INVALID_ENTITY_INDEX, |r| r.entity.index as i32),
            );
            blob.write_f32(animable.time);
            blob.write_bool(animable.is_free);
            blob.write_string(animable.clip_path());
        }
    }

    /// Replace the whole store with the slots in `blob`.
    ///
    /// The stream is fully decoded before anything changes. Entity indices
    /// are paired with `universe`, renderables are looked up again in
    /// `render_scene`, clip loads are requested from `store`, and every live
    /// slot is registered under the index it was saved at. Free slots keep
    /// their place but own nothing.
    pub fn deserialize(
        &mut self,
        blob: &mut InputBlob,
        render_scene: &RenderScene,
        store: &mut AnimationStore,
        universe: &mut Universe,
    ) -> Result<(), BlobError> {
        struct Entry {
            manual: bool,
            entity_index: i32,
            time: f32,
            is_free: bool,
            path: String,
        }

        let count = blob.read_count()?;
        let mut entries = Vec::with_capacity(blob.capacity_for(count));
        for _ in 0..count {
            entries.push(Entry {
                manual: blob.read_bool()?,
                entity_index: blob.read_i32()?,
                time: blob.read_f32()?,
                is_free: blob.read_bool()?,
                path: blob.read_string()?,
            });
        }

        self.animables.clear();
        for (index, entry) in entries.into_iter().enumerate() {
            let entity = if entry.is_free {
                None
            } else {
                universe.entity_at(entry.entity_index)
            };
            let renderable = entity.and_then(|e| render_scene.get_renderable(e));
            let clip = (!entry.path.is_empty()).then(|| store.load(&entry.path));
            self.animables.push(AnimableSlot {
                entity,
                manual: entry.manual,
                is_free: entry.is_free,
                renderable,
                time: entry.time,
                clip,
            });
            match entity {
                Some(entity) => {
                    universe.add_component(entity, ComponentType::Animable, index);
                }
                None if entry.is_free => {}
                None => debug!("Animable {} has no owning entity after load", index),
            }
        }
        info!("Loaded {} animable slots", count);
        Ok(())
    }
}

/// Advance `time` by `delta` and wrap it into `[0, length)`.
///
/// Wrapping subtracts `length` repeatedly instead of taking a remainder.
/// A non-positive `length` freezes time.
pub fn advance_time(time: f32, delta: f32, length: f32) -> f32 {
    if length <= 0.0 {
        return time;
    }
    let mut t = time + delta;
    if !t.is_finite() {
        return 0.0;
    }
    while t >= length {
        let next = t - length;
        // no progress at this magnitude
        if next == t {
            return t.rem_euclid(length);
        }
        t = next;
    }
    t
}
