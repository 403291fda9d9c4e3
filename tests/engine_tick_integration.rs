//! Engine tick integration tests for animable playback, binding and the
//! clip loader thread.

use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::Vec3;

use animable::components::renderable::SkeletalModel;
use animable::engine::Engine;
use animable::resources::animationconfig::AnimationConfig;
use animable::resources::animationscene::UNKNOWN_FRAME_COUNT;
use animable::resources::animationstore::{AnimationClip, BoneTrack};
use animable::resources::universe::{ComponentType, EntityId};

const EPSILON: f32 = 1e-5;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn model() -> Arc<SkeletalModel> {
    Arc::new(SkeletalModel::chain(["root", "arm"]))
}

/// Clip whose `arm` bone moves one unit along x per frame.
fn ramp_clip(fps: f32, frames: u32) -> AnimationClip {
    AnimationClip::new(fps, frames).with_track(BoneTrack {
        bone: "arm".to_string(),
        translations: (0..frames).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect(),
        rotations: vec![],
    })
}

fn arm_x(engine: &Engine, entity: EntityId) -> f32 {
    let render = engine.render_scene();
    let handle = render.get_renderable(entity).unwrap();
    render.pose(handle).unwrap().translations[1].x
}

#[test]
fn playing_animable_loops_over_ticks() {
    let mut engine = Engine::new();
    engine.insert_clip("walk", ramp_clip(2.0, 4));
    let e = engine.create_entity();
    engine.create_renderable(e, model());
    let h = engine.create_component(ComponentType::Animable, e);
    engine.play(h, "walk");

    // length 2.0s
    engine.tick(1.5);
    assert!(approx_eq(engine.animation_time(h), 1.5));
    engine.tick(1.0);
    assert!(approx_eq(engine.animation_time(h), 0.5));
    engine.tick(5.0);
    assert!(approx_eq(engine.animation_time(h), 1.5));
}

#[test]
fn pose_reflects_time_before_advance() {
    let mut engine = Engine::new();
    engine.insert_clip("ramp", ramp_clip(1.0, 8));
    let e = engine.create_entity();
    engine.create_renderable(e, model());
    let h = engine.create_component(ComponentType::Animable, e);
    engine.play(h, "ramp");

    engine.tick(1.0);
    assert!(approx_eq(arm_x(&engine, e), 0.0));
    engine.tick(1.0);
    assert!(approx_eq(arm_x(&engine, e), 1.0));
}

#[test]
fn time_scale_from_config_applies_to_playback() {
    let mut config = AnimationConfig::new();
    config.time_scale = 0.5;
    let mut engine = Engine::with_config(config);
    engine.insert_clip("walk", ramp_clip(1.0, 10));
    let e = engine.create_entity();
    engine.create_renderable(e, model());
    let h = engine.create_component(ComponentType::Animable, e);
    engine.play(h, "walk");

    engine.tick(1.0);
    assert!(approx_eq(engine.animation_time(h), 0.5));
    assert_eq!(engine.time().frame_count, 1);
}

#[test]
fn manual_animable_holds_its_frame() {
    let mut engine = Engine::new();
    engine.insert_clip("ramp", ramp_clip(25.0, 100));
    let e = engine.create_entity();
    engine.create_renderable(e, model());
    let h = engine.create_component(ComponentType::Animable, e);
    engine.play(h, "ramp");
    engine.set_manual(h, true);
    engine.set_frame(h, 25);
    assert!(approx_eq(engine.animation_time(h), 1.0));
    assert_eq!(engine.frame_count(h), 100);

    for _ in 0..10 {
        engine.tick(0.3);
    }
    assert!(engine.is_manual(h));
    assert!(approx_eq(engine.animation_time(h), 1.0));
    assert!(approx_eq(arm_x(&engine, e), 25.0));
}

#[test]
fn renderable_created_after_animable_is_bound_by_notification() {
    let mut engine = Engine::new();
    engine.insert_clip("ramp", ramp_clip(1.0, 8));
    let e = engine.create_entity();
    let h = engine.create_component(ComponentType::Animable, e);
    engine.play(h, "ramp");
    assert!(engine.animation_scene().slot(h).renderable.is_none());

    // unbound slots are skipped
    engine.tick(1.0);
    assert!(approx_eq(engine.animation_time(h), 0.0));

    engine.create_renderable(e, model());
    let bound = engine.animation_scene().slot(h).renderable;
    assert_eq!(bound, engine.render_scene().get_renderable(e));

    engine.tick(1.0);
    assert!(approx_eq(engine.animation_time(h), 1.0));
}

#[test]
fn destroyed_renderable_stops_playback_until_recreated() {
    let mut engine = Engine::new();
    engine.insert_clip("ramp", ramp_clip(1.0, 8));
    let e = engine.create_entity();
    let r = engine.create_renderable(e, model());
    let h = engine.create_component(ComponentType::Animable, e);
    engine.play(h, "ramp");

    engine.tick(1.0);
    engine.destroy_component(r);
    engine.tick(1.0);
    assert!(approx_eq(engine.animation_time(h), 1.0));

    engine.create_renderable(e, model());
    engine.tick(1.0);
    assert!(approx_eq(engine.animation_time(h), 2.0));
}

#[test]
fn unknown_clip_never_plays_without_loader() {
    let mut engine = Engine::new();
    let e = engine.create_entity();
    engine.create_renderable(e, model());
    let h = engine.create_component(ComponentType::Animable, e);
    engine.play(h, "missing");
    engine.tick(1.0);
    assert!(approx_eq(engine.animation_time(h), 0.0));
    assert_eq!(engine.frame_count(h), UNKNOWN_FRAME_COUNT);
    assert_eq!(engine.preview(h), "missing");
}

#[test]
fn destroy_entity_frees_its_slot_for_reuse() {
    let mut engine = Engine::new();
    let a = engine.create_entity();
    engine.create_renderable(a, model());
    let ha = engine.create_component(ComponentType::Animable, a);
    let b = engine.create_entity();
    let hb = engine.create_component(ComponentType::Animable, b);

    engine.destroy_entity(a);
    assert!(engine.animation_scene().slot(ha).is_free);
    assert_eq!(engine.get_animable(a), None);
    assert!(engine.render_scene().is_empty());

    let c = engine.create_entity();
    let hc = engine.create_component(ComponentType::Animable, c);
    assert_eq!(hc.index, ha.index);
    assert_ne!(hc.index, hb.index);
    assert_eq!(engine.get_animable(c), Some(hc));
    assert!(engine.is_manual(hc));
}

#[test]
fn destroyed_slot_releases_its_clip() {
    let mut engine = Engine::new();
    engine.insert_clip("walk", ramp_clip(1.0, 4));
    let e = engine.create_entity();
    let h = engine.create_component(ComponentType::Animable, e);
    engine.play(h, "walk");
    assert_eq!(engine.release_unused_clips(), 0);

    engine.destroy_component(h);
    assert_eq!(engine.release_unused_clips(), 1);
    assert!(engine.animation_store().is_empty());
}

#[test]
fn set_preview_drives_play() {
    let mut engine = Engine::new();
    engine.insert_clip("idle", ramp_clip(10.0, 10));
    let e = engine.create_entity();
    let h = engine.create_component(ComponentType::Animable, e);
    engine.set_animation_time(h, 0.7);
    engine.set_preview(h, "idle");
    assert_eq!(engine.preview(h), "idle");
    assert!(!engine.is_manual(h));
    assert!(approx_eq(engine.animation_time(h), 0.0));
}

#[test]
fn clip_loader_thread_settles_clips_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("wave.json"),
        r#"{
            "fps": 4.0,
            "frame_count": 2,
            "tracks": [
                { "bone": "arm", "translations": [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0]] }
            ]
        }"#,
    )
    .unwrap();

    let mut config = AnimationConfig::new();
    config.asset_root = dir.path().to_path_buf();
    let mut engine = Engine::with_config(config);
    engine.start_clip_loader();

    let e = engine.create_entity();
    engine.create_renderable(e, model());
    let h = engine.create_component(ComponentType::Animable, e);
    engine.play(h, "wave.json");
    engine.play(h, "broken.json");
    engine.play(h, "wave.json");

    let deadline = Instant::now() + Duration::from_secs(5);
    while engine.frame_count(h) == UNKNOWN_FRAME_COUNT {
        assert!(Instant::now() < deadline, "clip never loaded");
        std::thread::sleep(Duration::from_millis(5));
        engine.tick(0.0);
    }
    assert_eq!(engine.frame_count(h), 2);

    engine.tick(0.25);
    engine.tick(0.0);
    assert!(approx_eq(arm_x(&engine, e), 2.0));

    // the failed load settles too and is never ready
    while engine.animation_store().pending_count() > 0 {
        assert!(Instant::now() < deadline, "failed load never settled");
        std::thread::sleep(Duration::from_millis(5));
        engine.tick(0.0);
    }
    assert!(engine.animation_store().get("broken.json").unwrap().is_failed());

    engine.shutdown();
}

#[test]
fn manual_slot_with_extreme_time_samples_last_key() {
    let mut engine = Engine::new();
    engine.insert_clip("ramp", ramp_clip(1.0, 8));
    let e = engine.create_entity();
    engine.create_renderable(e, model());
    let h = engine.create_component(ComponentType::Animable, e);
    engine.play(h, "ramp");
    engine.set_manual(h, true);
    engine.set_animation_time(h, 1.0e20);

    engine.tick(0.1);
    assert_eq!(engine.animation_time(h), 1.0e20);
    assert!(approx_eq(arm_x(&engine, e), 7.0));

    engine.set_animation_time(h, f32::INFINITY);
    engine.tick(0.1);
    assert!(approx_eq(arm_x(&engine, e), 7.0));
}
