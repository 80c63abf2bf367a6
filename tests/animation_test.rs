use std::time::Duration;

use scene_ngin::{
    Node,
    animation::{
        AnimationClip, AnimationPath, AnimationTRS,
        easing::{EaseType, EaseVariant},
        interpolation::interpolate_frames,
        runner::{AnimationRunner, INTERPOLATION_STEPS, PlayMode},
        sample_walk_clip,
    },
    error::AnimationError,
    flow::EditorState,
    math::Vector3,
};

use crate::common::test_utils::{init_logger, triangle_mesh};

mod common;

fn body() -> Node {
    ["rarm", "larm", "rleg", "lleg"]
        .into_iter()
        .fold(Node::group("body"), |body, limb| body.with_child(triangle_mesh(limb)))
}

fn child_position(node: &Node, name: &str) -> Vector3 {
    node.find_by_name(name).unwrap().position()
}

#[test]
fn walk_clip_poses_limbs_by_name() {
    let mut runner = AnimationRunner::new(body()).with_fps(1.0);
    runner.set_clip(sample_walk_clip());
    runner.set_current_frame(2).unwrap();

    let target = runner.target();
    assert_eq!(child_position(target, "rarm"), Vector3::new(-1.0, 0.3, 0.0));
    assert_eq!(child_position(target, "lleg"), Vector3::new(-0.4, -0.5, 0.0));
    assert!((target.find_by_name("larm").unwrap().rotation().z + 0.4).abs() < 1e-5);
}

#[test]
fn looping_wraps_and_once_stops() {
    let mut looping = AnimationRunner::new(body()).with_fps(1.0);
    looping.set_clip(sample_walk_clip());
    looping.play();
    assert!(looping.update(6.0));
    assert_eq!(looping.current_frame(), 1);
    assert!(looping.is_playing());

    let mut once = AnimationRunner::new(body()).with_fps(1.0).with_mode(PlayMode::Once);
    once.set_clip(sample_walk_clip());
    once.play();
    assert!(once.update(6.0));
    assert_eq!(once.current_frame(), 4);
    assert!(!once.is_playing());
    assert!(!once.update(1.0));
}

#[test]
fn fractional_frames_carry_over() {
    let mut runner = AnimationRunner::new(body()).with_fps(4.0);
    runner.set_clip(sample_walk_clip());
    runner.play();

    assert!(!runner.update(0.125));
    assert!((runner.delta_frame() - 0.5).abs() < 1e-9);
    assert!(runner.update(0.125));
    assert_eq!(runner.current_frame(), 1);
    assert!(runner.delta_frame().abs() < 1e-9);
}

#[test]
fn interpolation_expands_and_restores() {
    let mut runner = AnimationRunner::new(body());
    assert!(matches!(
        runner.set_interpolation(EaseType::Sine, EaseVariant::InOut),
        Err(AnimationError::NoClip)
    ));

    runner.set_clip(sample_walk_clip());
    runner
        .set_interpolation(EaseType::Sine, EaseVariant::InOut)
        .unwrap();
    assert_eq!(runner.len(), 4 * (INTERPOLATION_STEPS + 1) + 1);
    runner.end().unwrap();
    assert_eq!(runner.current_frame(), 24);

    runner.unset_interpolation();
    assert_eq!(runner.len(), 5);
    assert_eq!(runner.current_frame(), 4);
}

#[test]
fn interpolating_identical_frames_changes_nothing() {
    let still = AnimationPath::new(AnimationTRS {
        position: Some([1.0, 2.0, 3.0]),
        ..Default::default()
    });
    let frames = interpolate_frames(&[still.clone(), still.clone()], EaseType::Back, EaseVariant::In, 3);
    assert_eq!(frames.len(), 5);
    assert!(frames.iter().all(|f| f == &still));
}

#[test]
fn interpolated_frames_keep_the_authored_ones() {
    let clip = sample_walk_clip();
    let frames = interpolate_frames(&clip.frames, EaseType::Quint, EaseVariant::Out, 2);
    assert_eq!(frames.len(), 13);
    for (i, authored) in clip.frames.iter().enumerate() {
        assert_eq!(&frames[i * 3], authored);
    }
}

#[test]
fn out_of_range_frames_are_rejected() {
    let mut runner = AnimationRunner::new(body());
    assert!(matches!(runner.next(), Err(AnimationError::NoClip)));
    runner.set_clip(sample_walk_clip());
    assert!(matches!(
        runner.set_current_frame(5),
        Err(AnimationError::FrameOutOfRange { frame: 5, len: 5 })
    ));
    runner.prev().unwrap();
    assert_eq!(runner.current_frame(), 4);
}

#[test]
fn clip_json_round_trip() {
    let clip = sample_walk_clip();
    let json = clip.to_json().unwrap();
    assert_eq!(AnimationClip::from_json(&json).unwrap(), clip);
    assert!(AnimationClip::from_json("{\"name\": 3}").is_err());
}

#[test]
fn editor_state_folds_animation_into_the_scene() {
    init_logger();
    let mut state = EditorState::with_default_scene(1.5);
    let body = body();
    let body_id = body.id();
    let rarm_id = body.find_by_name("rarm").unwrap().id();
    state.add_root(body);

    state.animate(body_id, sample_walk_clip(), 10.0).unwrap();
    assert!(!state.advance(Duration::from_millis(50)).unwrap());
    assert!(state.advance(Duration::from_millis(60)).unwrap());

    let rarm = state.node(rarm_id).unwrap();
    assert_eq!(rarm.position(), Vector3::new(-1.0, 0.4, 0.0));
    assert_eq!(state.runner().unwrap().current_frame(), 1);

    state.stop_animation();
    assert!(!state.advance(Duration::from_secs(1)).unwrap());
}

#[test]
fn edits_made_while_playing_survive_the_next_frame() {
    init_logger();
    let mut state = EditorState::with_default_scene(1.5);
    let body = body().with_child(triangle_mesh("tail"));
    let body_id = body.id();
    let tail_id = body.find_by_name("tail").unwrap().id();
    state.add_root(body);
    state.animate(body_id, sample_walk_clip(), 1.0).unwrap();

    let mut tail = state.scene().find(tail_id).unwrap().clone();
    tail.set_name("stub");
    tail.set_position(Vector3::new(7.0, 0.0, 0.0));
    state.apply_change(tail).unwrap();

    assert!(state.advance(Duration::from_secs(1)).unwrap());
    let tail = state.node(tail_id).unwrap();
    assert_eq!(tail.name(), "stub");
    assert_eq!(tail.position(), Vector3::new(7.0, 0.0, 0.0));
    let body = state.node(body_id).unwrap();
    assert_eq!(child_position(&body, "rarm"), Vector3::new(-1.0, 0.4, 0.0));
}

#[test]
fn looping_from_the_last_frame_wraps_to_the_first() {
    let mut runner = AnimationRunner::new(body()).with_fps(1.0);
    runner.set_clip(sample_walk_clip());
    runner.set_current_frame(4).unwrap();
    runner.play();

    assert!(runner.update(1.0));
    assert_eq!(runner.current_frame(), 0);
    assert!(runner.is_playing());
}

#[test]
fn once_on_the_last_frame_stays_and_stops() {
    let mut runner = AnimationRunner::new(body()).with_fps(1.0).with_mode(PlayMode::Once);
    runner.set_clip(sample_walk_clip());
    runner.set_current_frame(4).unwrap();
    runner.play();

    assert!(runner.update(1.0));
    assert_eq!(runner.current_frame(), 4);
    assert!(!runner.is_playing());
    assert!(!runner.update(1.0));
    assert_eq!(runner.current_frame(), 4);
}

#[test]
fn reverse_playback_runs_backwards() {
    let mut runner = AnimationRunner::new(body()).with_fps(1.0);
    runner.set_clip(sample_walk_clip());
    runner.set_reverse(true);
    runner.play();

    assert!(runner.update(1.0));
    assert_eq!(runner.current_frame(), 4);
    assert!(runner.update(2.0));
    assert_eq!(runner.current_frame(), 2);

    runner.set_mode(PlayMode::Once);
    assert!(runner.update(5.0));
    assert_eq!(runner.current_frame(), 0);
    assert!(!runner.is_playing());
}
