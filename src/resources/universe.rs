//! Entity and component registry.
//!
//! The [`Universe`] resource owns entity identity and records which
//! components each entity carries. Scenes that own a component type register
//! their components here under the storage index they occupy, and the
//! [`ComponentHandle`] returned is what the rest of the engine passes around.
//!
//! Entities are `(index, generation)` pairs. Destroying an entity bumps the
//! generation of its index so stale identities never compare equal to the
//! entity that later reuses the index.

use bevy_ecs::prelude::Resource;
use log::{debug, warn};
use smallvec::SmallVec;

use crate::blob::{BlobError, InputBlob, OutputBlob};

/// Identity of a simulated entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId {
    pub index: u32,
    pub generation: u32,
}

impl EntityId {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

/// Component types known to the engine. Each scene owns exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Renderable,
    Animable,
}

/// A component of a given type attached to an entity, addressed by the
/// storage index inside its owning scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentHandle {
    pub entity: EntityId,
    pub ty: ComponentType,
    pub index: usize,
}

#[derive(Debug, Clone, Default)]
struct EntityRecord {
    generation: u32,
    alive: bool,
    components: SmallVec<[ComponentHandle; 4]>,
}

/// Registry of live entities and the components attached to them.
#[derive(Resource, Debug, Default)]
pub struct Universe {
    entities: Vec<EntityRecord>,
}

impl Universe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an entity, reusing the lowest dead index first.
    pub fn create_entity(&mut self) -> EntityId {
        if let Some(index) = self.entities.iter().position(|e| !e.alive) {
            let record = &mut self.entities[index];
            record.alive = true;
            return EntityId::new(index as u32, record.generation);
        }
        self.entities.push(EntityRecord {
            generation: 0,
            alive: true,
            components: SmallVec::new(),
        });
        EntityId::new((self.entities.len() - 1) as u32, 0)
    }

    /// Destroy an entity and forget its components.
    ///
    /// Returns the components that were still attached so the owning scenes
    /// can release them. Returns an empty list if the entity was not alive.
    pub fn destroy_entity(&mut self, entity: EntityId) -> SmallVec<[ComponentHandle; 4]> {
        if !self.is_alive(entity) {
            warn!("destroy_entity on dead entity {:?}", entity);
            return SmallVec::new();
        }
        let record = &mut self.entities[entity.index as usize];
        record.alive = false;
        record.generation = record.generation.wrapping_add(1);
        debug!("Destroyed entity {:?}", entity);
        std::mem::take(&mut record.components)
    }

    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.entities
            .get(entity.index as usize)
            .is_some_and(|e| e.alive && e.generation == entity.generation)
    }

    /// Pair a persisted entity index with the live registry.
    pub fn entity_at(&self, index: i32) -> Option<EntityId> {
        let index = usize::try_from(index).ok()?;
        let record = self.entities.get(index)?;
        record
            .alive
            .then(|| EntityId::new(index as u32, record.generation))
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.iter().filter(|e| e.alive).count()
    }

    /// Record that `entity` carries a component of type `ty` stored at `index`.
    pub fn add_component(
        &mut self,
        entity: EntityId,
        ty: ComponentType,
        index: usize,
    ) -> ComponentHandle {
        let handle = ComponentHandle { entity, ty, index };
        match self.entities.get_mut(entity.index as usize) {
            Some(record) if record.alive && record.generation == entity.generation => {
                record.components.push(handle);
            }
            _ => warn!("add_component {:?} on dead entity", handle),
        }
        handle
    }

    /// Forget a component. Unknown handles are ignored.
    pub fn destroy_component(&mut self, handle: ComponentHandle) {
        if let Some(record) = self.entities.get_mut(handle.entity.index as usize) {
            record.components.retain(|c| *c != handle);
        }
    }

    /// Components attached to a live entity, in registration order.
    pub fn components(&self, entity: EntityId) -> &[ComponentHandle] {
        match self.entities.get(entity.index as usize) {
            Some(record) if record.alive && record.generation == entity.generation => {
                &record.components
            }
            _ => &[],
        }
    }

    pub fn get_component(&self, entity: EntityId, ty: ComponentType) -> Option<ComponentHandle> {
        self.components(entity).iter().copied().find(|c| c.ty == ty)
    }

    pub fn has_component(&self, entity: EntityId, ty: ComponentType) -> bool {
        self.get_component(entity, ty).is_some()
    }

    /// Write the entity table. Component lists are rebuilt by the scenes.
    pub fn serialize(&self, blob: &mut OutputBlob) {
        blob.write_i32(self.entities.len() as i32);
        for record in &self.entities {
            blob.write_u32(record.generation);
            blob.write_bool(record.alive);
        }
    }

    /// Rebuild the entity table from a snapshot, dropping current state.
    pub fn deserialize(&mut self, blob: &mut InputBlob) -> Result<(), BlobError> {
        let count = blob.read_count()?;
        let mut entities = Vec::with_capacity(blob.capacity_for(count));
        for _ in 0..count {
            let generation = blob.read_u32()?;
            let alive = blob.read_bool()?;
            entities.push(EntityRecord {
                generation,
                alive,
                components: SmallVec::new(),
            });
        }
        self.entities = entities;
        debug!("Loaded {} entity records", count);
        Ok(())
    }
}
