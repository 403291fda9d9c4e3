//! Save/load integration tests across the universe, render scene and
//! animation scene.

use std::sync::Arc;

use animable::blob::{BlobError, InputBlob, OutputBlob};
use animable::components::renderable::SkeletalModel;
use animable::engine::Engine;
use animable::resources::animationscene::INVALID_ENTITY_INDEX;
use animable::resources::animationstore::AnimationClip;
use animable::resources::universe::{ComponentType, EntityId};

const EPSILON: f32 = 1e-6;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn model() -> Arc<SkeletalModel> {
    Arc::new(SkeletalModel::chain(["root", "arm"]))
}

/// Scene with a playing slot, a manual slot, a freed slot and an unbound one.
fn populated_engine() -> (Engine, Vec<EntityId>) {
    let mut engine = Engine::new();
    engine.insert_clip("walk", AnimationClip::new(10.0, 20));
    engine.insert_clip("idle", AnimationClip::new(5.0, 5));

    let a = engine.create_entity();
    engine.create_renderable(a, model());
    let ha = engine.create_component(ComponentType::Animable, a);
    engine.play(ha, "walk");

    let b = engine.create_entity();
    engine.create_renderable(b, model());
    let hb = engine.create_component(ComponentType::Animable, b);
    engine.play(hb, "idle");
    engine.set_manual(hb, true);
    engine.set_animation_time(hb, 0.4);

    let c = engine.create_entity();
    engine.create_renderable(c, model());
    let hc = engine.create_component(ComponentType::Animable, c);

    let d = engine.create_entity();
    engine.create_component(ComponentType::Animable, d);
    engine.destroy_component(hc);

    engine.tick(0.3);
    engine.tick(0.3);
    (engine, vec![a, b, c, d])
}

#[test]
fn round_trip_preserves_slots_per_index() {
    let (engine, entities) = populated_engine();
    let bytes = engine.save();

    let mut restored = Engine::new();
    restored.insert_clip("walk", AnimationClip::new(10.0, 20));
    restored.insert_clip("idle", AnimationClip::new(5.0, 5));
    restored.load(&bytes).unwrap();

    let before = engine.animation_scene().slots();
    let after = restored.animation_scene().slots();
    assert_eq!(before.len(), after.len());
    for (old, new) in before.iter().zip(after) {
        assert_eq!(old.manual, new.manual);
        assert_eq!(old.is_free, new.is_free);
        assert_eq!(old.time.to_bits(), new.time.to_bits());
        assert_eq!(old.clip_path(), new.clip_path());
    }

    let ha = restored.get_animable(entities[0]).unwrap();
    assert!(approx_eq(restored.animation_time(ha), 0.6));
    assert_eq!(
        restored.animation_scene().slot(ha).renderable,
        restored.render_scene().get_renderable(entities[0])
    );
    assert!(restored.universe().has_component(entities[0], ComponentType::Animable));
    assert!(restored.universe().has_component(entities[0], ComponentType::Renderable));
}

#[test]
fn restored_scene_keeps_playing_identically() {
    let (mut engine, entities) = populated_engine();
    let bytes = engine.save();
    let mut restored = Engine::new();
    restored.insert_clip("walk", AnimationClip::new(10.0, 20));
    restored.insert_clip("idle", AnimationClip::new(5.0, 5));
    restored.load(&bytes).unwrap();

    for _ in 0..17 {
        engine.tick(0.13);
        restored.tick(0.13);
    }
    let original = engine.get_animable(entities[0]).unwrap();
    let copy = restored.get_animable(entities[0]).unwrap();
    assert_eq!(
        engine.animation_time(original).to_bits(),
        restored.animation_time(copy).to_bits()
    );
}

#[test]
fn unbound_slot_loses_its_entity_on_reload() {
    let (engine, entities) = populated_engine();
    let handle = engine.get_animable(entities[3]).unwrap();
    assert!(engine.animation_scene().slot(handle).renderable.is_none());

    let mut restored = Engine::new();
    restored.load(&engine.save()).unwrap();
    let slot = &restored.animation_scene().slots()[handle.index];
    assert_eq!(slot.entity, None);
    assert!(!slot.is_free);
    assert_eq!(restored.get_animable(entities[3]), None);
    assert!(!restored.universe().has_component(entities[3], ComponentType::Animable));
}

#[test]
fn load_requests_clips_it_does_not_have() {
    let (engine, _) = populated_engine();
    let mut restored = Engine::new();
    restored.load(&engine.save()).unwrap();
    assert_eq!(restored.animation_store().pending_count(), 2);
    assert!(restored.animation_store().get("walk").is_some());
}

#[test]
fn empty_scene_round_trips() {
    let engine = Engine::new();
    let mut restored = Engine::new();
    restored.load(&engine.save()).unwrap();
    assert!(restored.animation_scene().is_empty());
    assert_eq!(restored.universe().entity_count(), 0);
}

#[test]
fn truncated_snapshot_leaves_engine_untouched() {
    let (engine, _) = populated_engine();
    let bytes = engine.save();

    let (mut target, entities) = populated_engine();
    let err = target.load(&bytes[..bytes.len() - 3]).unwrap_err();
    assert!(matches!(err, BlobError::Io(_)));
    assert_eq!(target.animation_scene().len(), 4);
    assert!(target.get_animable(entities[0]).is_some());
}

#[test]
fn animation_section_layout() {
    let mut engine = Engine::new();
    engine.insert_clip("walk", AnimationClip::new(10.0, 20));
    let e = engine.create_entity();
    engine.create_renderable(e, model());
    let h = engine.create_component(ComponentType::Animable, e);
    engine.play(h, "walk");
    engine.set_animation_time(h, 0.25);
    let u = engine.create_entity();
    engine.create_component(ComponentType::Animable, u);

    let mut out = OutputBlob::new();
    engine.animation_scene().serialize(&mut out);
    let mut input = InputBlob::new(out.data());

    assert_eq!(input.read_i32().unwrap(), 2);
    assert!(!input.read_bool().unwrap());
    assert_eq!(input.read_i32().unwrap(), e.index as i32);
    assert_eq!(input.read_f32().unwrap(), 0.25);
    assert!(!input.read_bool().unwrap());
    assert_eq!(input.read_string().unwrap(), "walk");

    assert!(input.read_bool().unwrap());
    assert_eq!(input.read_i32().unwrap(), INVALID_ENTITY_INDEX);
    assert_eq!(input.read_f32().unwrap(), 0.0);
    assert!(!input.read_bool().unwrap());
    assert_eq!(input.read_string().unwrap(), "");
    assert_eq!(input.remaining(), 0);
}

#[test]
fn freed_slot_is_not_reattached_to_its_old_entity_on_reload() {
    let mut engine = Engine::new();
    let a = engine.create_entity();
    engine.create_renderable(a, model());
    engine.create_component(ComponentType::Animable, a);
    let b = engine.create_entity();
    engine.create_renderable(b, model());
    let hb = engine.create_component(ComponentType::Animable, b);
    engine.destroy_component(hb);

    let mut restored = Engine::new();
    restored.load(&engine.save()).unwrap();
    assert!(!restored.universe().has_component(b, ComponentType::Animable));
    assert!(restored.animation_scene().slots()[hb.index].is_free);

    let c = restored.create_entity();
    let hc = restored.create_component(ComponentType::Animable, c);
    assert_eq!(hc.index, hb.index);

    restored.destroy_entity(b);
    assert_eq!(restored.get_animable(c), Some(hc));
    assert!(!restored.animation_scene().slot(hc).is_free);
}

#[test]
fn huge_counts_fail_cleanly() {
    let huge = i32::MAX.to_le_bytes();

    // entity table
    let mut engine = Engine::new();
    assert!(matches!(engine.load(&huge), Err(BlobError::Io(_))));

    // render scene, then animation scene, each after empty sections
    for empty_sections in 1..=2 {
        let mut bytes = Vec::new();
        for _ in 0..empty_sections {
            bytes.extend_from_slice(&0i32.to_le_bytes());
        }
        bytes.extend_from_slice(&huge);
        assert!(matches!(engine.load(&bytes), Err(BlobError::Io(_))));
    }
    assert!(engine.animation_scene().is_empty());
}

#[test]
fn overlong_clip_path_never_reaches_the_snapshot() {
    let mut engine = Engine::new();
    let e = engine.create_entity();
    engine.create_renderable(e, model());
    let h = engine.create_component(ComponentType::Animable, e);
    engine.play(h, "walk");
    engine.play(h, &"x".repeat(5000));
    assert_eq!(engine.preview(h), "walk");

    let mut restored = Engine::new();
    restored.load(&engine.save()).unwrap();
    let restored_h = restored.get_animable(e).unwrap();
    assert_eq!(restored.preview(restored_h), "walk");
}
