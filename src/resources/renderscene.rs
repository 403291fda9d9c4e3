//! Render scene: storage for skeletal renderables.
//!
//! [`RenderScene`] keeps renderables in a dense array of generational slots.
//! A [`RenderableHandle`] stays comparable after its renderable is destroyed,
//! but [`RenderScene::is_valid`] and every accessor reject it once the slot's
//! generation has moved on. Other scenes may cache handles as weak
//! references and re-check them on each use.

use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use log::{debug, warn};

use crate::blob::{BlobError, InputBlob, OutputBlob};
use crate::components::renderable::{Bone, Pose, Renderable, SkeletalModel};
use crate::resources::universe::{ComponentHandle, ComponentType, EntityId, Universe};

/// Weak reference to a renderable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderableHandle {
    pub entity: EntityId,
    pub index: usize,
    pub generation: u32,
}

#[derive(Debug, Default)]
struct RenderableSlot {
    generation: u32,
    renderable: Option<Renderable>,
}

#[derive(Resource, Debug, Default)]
pub struct RenderScene {
    slots: Vec<RenderableSlot>,
}

impl RenderScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a renderable for `entity`, reusing the first empty slot.
    pub fn create_renderable(
        &mut self,
        entity: EntityId,
        model: Arc<SkeletalModel>,
    ) -> RenderableHandle {
        let renderable = Renderable::new(entity, model);
        let index = match self.slots.iter().position(|s| s.renderable.is_none()) {
            Some(index) => index,
            None => {
                self.slots.push(RenderableSlot::default());
                self.slots.len() - 1
            }
        };
        let slot = &mut self.slots[index];
        slot.renderable = Some(renderable);
        debug!("Created renderable {} for {:?}", index, entity);
        RenderableHandle {
            entity,
            index,
            generation: slot.generation,
        }
    }

    /// Remove a renderable. Outstanding handles to it become invalid.
    pub fn destroy_renderable(&mut self, handle: RenderableHandle) -> bool {
        if !self.is_valid(handle) {
            return false;
        }
        let slot = &mut self.slots[handle.index];
        slot.renderable = None;
        slot.generation = slot.generation.wrapping_add(1);
        debug!("Destroyed renderable {}", handle.index);
        true
    }

    /// Find the renderable attached to `entity`.
    pub fn get_renderable(&self, entity: EntityId) -> Option<RenderableHandle> {
        self.slots.iter().enumerate().find_map(|(index, slot)| {
            slot.renderable
                .as_ref()
                .filter(|r| r.entity == entity)
                .map(|_| RenderableHandle {
                    entity,
                    index,
                    generation: slot.generation,
                })
        })
    }

    /// Current handle for the renderable stored at `index`, if any.
    pub fn handle_at(&self, index: usize) -> Option<RenderableHandle> {
        let slot = self.slots.get(index)?;
        slot.renderable.as_ref().map(|r| RenderableHandle {
            entity: r.entity,
            index,
            generation: slot.generation,
        })
    }

    /// Resolve a registry handle for a renderable component.
    pub fn resolve_component(&self, handle: ComponentHandle) -> Option<RenderableHandle> {
        if handle.ty != ComponentType::Renderable {
            return None;
        }
        self.handle_at(handle.index)
            .filter(|r| r.entity == handle.entity)
    }

    pub fn is_valid(&self, handle: RenderableHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: RenderableHandle) -> Option<&Renderable> {
        let slot = self.slots.get(handle.index)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.renderable
            .as_ref()
            .filter(|r| r.entity == handle.entity)
    }

    fn get_mut(&mut self, handle: RenderableHandle) -> Option<&mut Renderable> {
        let slot = self.slots.get_mut(handle.index)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.renderable
            .as_mut()
            .filter(|r| r.entity == handle.entity)
    }

    pub fn pose(&self, handle: RenderableHandle) -> Option<&Pose> {
        self.get(handle).map(|r| &r.pose)
    }

    pub fn pose_mut(&mut self, handle: RenderableHandle) -> Option<&mut Pose> {
        self.get_mut(handle).map(|r| &mut r.pose)
    }

    pub fn model(&self, handle: RenderableHandle) -> Option<&Arc<SkeletalModel>> {
        self.get(handle).map(|r| &r.model)
    }

    /// Mutable pose together with the skeleton it belongs to.
    pub fn pose_and_model_mut(
        &mut self,
        handle: RenderableHandle,
    ) -> Option<(&mut Pose, &SkeletalModel)> {
        self.get_mut(handle).map(|r| (&mut r.pose, r.model.as_ref()))
    }

    /// Number of live renderables.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.renderable.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write every slot, empty ones included, so indices survive a reload.
    pub fn serialize(&self, blob: &mut OutputBlob) {
        blob.write_i32(self.slots.len() as i32);
        for slot in &self.slots {
            match &slot.renderable {
                Some(r) => {
                    blob.write_bool(true);
                    blob.write_i32(r.entity.index as i32);
                    blob.write_i32(r.model.bones.len() as i32);
                    for bone in &r.model.bones {
                        blob.write_string(&bone.name);
                        blob.write_i32(bone.parent.map_or(-1, |p| p as i32));
                    }
                }
                None => blob.write_bool(false),
            }
        }
    }

    /// Rebuild from a snapshot and register every renderable with `universe`.
    ///
    /// Poses restart from the bind pose; the animation update writes them
    /// again on the next tick.
    pub fn deserialize(
        &mut self,
        blob: &mut InputBlob,
        universe: &mut Universe,
    ) -> Result<(), BlobError> {
        let count = blob.read_count()?;
        let mut decoded = Vec::with_capacity(blob.capacity_for(count));
        for _ in 0..count {
            if !blob.read_bool()? {
                decoded.push(None);
                continue;
            }
            let entity_index = blob.read_i32()?;
            let bone_count = blob.read_count()?;
            let mut bones = Vec::with_capacity(blob.capacity_for(bone_count));
            for _ in 0..bone_count {
                let name = blob.read_string()?;
                let parent = usize::try_from(blob.read_i32()?).ok();
                bones.push(Bone { name, parent });
            }
            decoded.push(Some((entity_index, SkeletalModel::new(bones))));
        }

        self.slots.clear();
        for (index, entry) in decoded.into_iter().enumerate() {
            let mut slot = RenderableSlot::default();
            if let Some((entity_index, model)) = entry {
                match universe.entity_at(entity_index) {
                    Some(entity) => {
                        slot.renderable = Some(Renderable::new(entity, Arc::new(model)));
                        universe.add_component(entity, ComponentType::Renderable, index);
                    }
                    None => warn!(
                        "Renderable {} refers to missing entity {}, dropped",
                        index, entity_index
                    ),
                }
            }
            self.slots.push(slot);
        }
        debug!("Loaded {} renderable slots", count);
        Ok(())
    }
}
