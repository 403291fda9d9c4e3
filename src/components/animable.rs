//! Per-entity animation playback state.

use crate::resources::animationstore::ClipHandle;
use crate::resources::renderscene::RenderableHandle;
use crate::resources::universe::EntityId;

/// One slot of the animable store.
///
/// While `is_free` is set the slot is waiting for reuse and its other fields
/// are stale.
#[derive(Debug, Clone)]
pub struct AnimableSlot {
    /// Owning entity. `None` when a snapshot referred to an entity that no
    /// longer exists.
    pub entity: Option<EntityId>,
    /// When set, the update loop samples but never advances `time`.
    pub manual: bool,
    pub is_free: bool,
    /// Cached sibling renderable. May be stale; checked on every use.
    pub renderable: Option<RenderableHandle>,
    /// Playback position in seconds.
    pub time: f32,
    pub clip: Option<ClipHandle>,
}

impl AnimableSlot {
    /// Fresh slot for `entity`: manual, at time zero, with nothing bound.
    pub fn new(entity: EntityId) -> Self {
        Self {
            entity: Some(entity),
            manual: true,
            is_free: false,
            renderable: None,
            time: 0.0,
            clip: None,
        }
    }

    /// Path of the bound clip, or an empty string.
    pub fn clip_path(&self) -> &str {
        self.clip.as_ref().map_or("", |c| c.path())
    }
}
