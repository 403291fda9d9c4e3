//! Skeletal renderable data.
//!
//! A [`Renderable`] pairs an entity with the [`SkeletalModel`] it draws and
//! the [`Pose`] buffer the renderer reads each frame. The model is shared
//! between renderables using the same skeleton; the pose is per instance.

use std::sync::Arc;

use glam::{Quat, Vec3};

use crate::resources::universe::EntityId;

/// One joint of a skeleton.
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    /// Index of the parent bone, `None` for roots.
    pub parent: Option<usize>,
}

/// Skeleton metadata needed to sample clips into a pose.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkeletalModel {
    pub bones: Vec<Bone>,
}

impl SkeletalModel {
    pub fn new(bones: Vec<Bone>) -> Self {
        Self { bones }
    }

    /// Build a single chain where each bone is parented to the previous one.
    pub fn chain<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        let bones = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Bone {
                name: name.into(),
                parent: i.checked_sub(1),
            })
            .collect();
        Self { bones }
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }
}

/// Local transforms for every bone of a skeleton.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    pub translations: Vec<Vec3>,
    pub rotations: Vec<Quat>,
}

impl Pose {
    /// Identity pose for `bone_count` bones.
    pub fn bind(bone_count: usize) -> Self {
        Self {
            translations: vec![Vec3::ZERO; bone_count],
            rotations: vec![Quat::IDENTITY; bone_count],
        }
    }

    pub fn len(&self) -> usize {
        self.translations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }
}

/// Renderable instance of a skeletal model.
#[derive(Debug, Clone)]
pub struct Renderable {
    pub entity: EntityId,
    pub model: Arc<SkeletalModel>,
    pub pose: Pose,
}

impl Renderable {
    pub fn new(entity: EntityId, model: Arc<SkeletalModel>) -> Self {
        let pose = Pose::bind(model.bone_count());
        Self {
            entity,
            model,
            pose,
        }
    }
}
