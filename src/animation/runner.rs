use crate::data_structures::scene_graph::Node;
use crate::error::AnimationError;
use crate::math::{Euler, Vector3};

use super::easing::{EaseType, EaseVariant};
use super::interpolation::interpolate_frames;
use super::{AnimationClip, AnimationPath};

/// In-betweens inserted by [`AnimationRunner::set_interpolation`].
pub const INTERPOLATION_STEPS: usize = 5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlayMode {
    /// Wrap around at either end.
    #[default]
    Loop,
    /// Stop on the last frame (the first when reversed).
    Once,
}

/// Plays an [`AnimationClip`] on a node it owns.
///
/// The host advances the runner with [`update`](Self::update) once per
/// redraw and then hands [`target`](Self::target) to the scene as a change.
#[derive(Debug)]
pub struct AnimationRunner {
    is_playing: bool,
    is_reverse: bool,
    mode: PlayMode,
    fps: f64,
    current_frame: usize,
    delta_frame: f64,
    initial: Option<AnimationClip>,
    current: Option<AnimationClip>,
    target: Node,
}

impl AnimationRunner {
    pub fn new(target: Node) -> Self {
        Self {
            is_playing: false,
            is_reverse: false,
            mode: PlayMode::Loop,
            fps: 60.0,
            current_frame: 0,
            delta_frame: 0.0,
            initial: None,
            current: None,
            target,
        }
    }

    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_mode(mut self, mode: PlayMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn set_fps(&mut self, fps: f64) {
        self.fps = fps;
    }

    pub fn mode(&self) -> PlayMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: PlayMode) {
        self.mode = mode;
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_reverse(&self) -> bool {
        self.is_reverse
    }

    pub fn set_reverse(&mut self, reverse: bool) {
        self.is_reverse = reverse;
    }

    pub fn play(&mut self) {
        self.is_playing = true;
    }

    pub fn pause(&mut self) {
        self.is_playing = false;
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Accumulated fraction of the next frame.
    pub fn delta_frame(&self) -> f64 {
        self.delta_frame
    }

    pub fn clip(&self) -> Option<&AnimationClip> {
        self.current.as_ref()
    }

    /// The keyframe path of the current frame.
    pub fn current_path(&self) -> Option<&AnimationPath> {
        self.current.as_ref().and_then(|c| c.frames.get(self.current_frame))
    }

    pub fn has_clip(&self) -> bool {
        self.current.is_some()
    }

    /// Frames in the current clip; 0 without one.
    pub fn len(&self) -> usize {
        self.current.as_ref().map_or(0, AnimationClip::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn target(&self) -> &Node {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut Node {
        &mut self.target
    }

    pub fn into_target(self) -> Node {
        self.target
    }

    /// Installs `clip` as both the authored and the playing clip and rewinds.
    pub fn set_clip(&mut self, clip: AnimationClip) {
        log::debug!("animation clip `{}` set ({} frames)", clip.name, clip.len());
        self.initial = Some(clip.clone());
        self.current = Some(clip);
        self.current_frame = 0;
        self.delta_frame = 0.0;
    }

    /// Replaces the playing frames with eased in-betweens of the authored ones.
    pub fn set_interpolation(&mut self, kind: EaseType, variant: EaseVariant) -> Result<(), AnimationError> {
        let (Some(initial), Some(current)) = (&self.initial, &mut self.current) else {
            log::error!("cannot interpolate: no animation clip is set");
            return Err(AnimationError::NoClip);
        };
        current.frames = interpolate_frames(&initial.frames, kind, variant, INTERPOLATION_STEPS);
        self.clamp_frame();
        Ok(())
    }

    /// Restores the authored frames.
    pub fn unset_interpolation(&mut self) {
        if let (Some(initial), Some(current)) = (&self.initial, &mut self.current) {
            current.frames = initial.frames.clone();
            self.clamp_frame();
        }
    }

    fn clamp_frame(&mut self) {
        self.current_frame = self.current_frame.min(self.len().saturating_sub(1));
    }

    /**
    Advances playback by `delta_seconds`.

    Whole frames accumulated at the runner's fps move the current frame
    forward (backward when reversed); the fractional rest carries over to the
    next call. Returns whether the target was re-posed.
    */
    pub fn update(&mut self, delta_seconds: f64) -> bool {
        let len = self.len();
        if !self.is_playing || len == 0 {
            return false;
        }
        self.delta_frame += delta_seconds * self.fps;
        if self.delta_frame < 1.0 {
            return false;
        }
        let increment = self.delta_frame.floor() as usize;
        self.delta_frame = self.delta_frame.fract();

        self.current_frame = match (self.mode, self.is_reverse) {
            (PlayMode::Loop, false) => (self.current_frame + increment) % len,
            (PlayMode::Loop, true) => (self.current_frame as i64 - increment as i64).rem_euclid(len as i64) as usize,
            (PlayMode::Once, false) => {
                let next = self.current_frame + increment;
                if next >= len - 1 {
                    self.is_playing = false;
                }
                next.min(len - 1)
            }
            (PlayMode::Once, true) => {
                if increment >= self.current_frame {
                    self.is_playing = false;
                }
                self.current_frame.saturating_sub(increment)
            }
        };
        self.pose();
        true
    }

    pub fn start(&mut self) -> Result<(), AnimationError> {
        self.set_current_frame(0)
    }

    pub fn end(&mut self) -> Result<(), AnimationError> {
        let len = self.len();
        if len == 0 {
            return Err(AnimationError::NoClip);
        }
        self.set_current_frame(len - 1)
    }

    pub fn next(&mut self) -> Result<(), AnimationError> {
        let len = self.len();
        if len == 0 {
            return Err(AnimationError::NoClip);
        }
        self.set_current_frame((self.current_frame + 1) % len)
    }

    pub fn prev(&mut self) -> Result<(), AnimationError> {
        let len = self.len();
        if len == 0 {
            return Err(AnimationError::NoClip);
        }
        let frame = self.current_frame.checked_sub(1).unwrap_or(len - 1);
        self.set_current_frame(frame)
    }

    /// Jumps to `frame` and poses the target.
    pub fn set_current_frame(&mut self, frame: usize) -> Result<(), AnimationError> {
        let len = self.len();
        if self.current.is_none() {
            return Err(AnimationError::NoClip);
        }
        if frame >= len {
            return Err(AnimationError::FrameOutOfRange { frame, len });
        }
        self.current_frame = frame;
        self.pose();
        Ok(())
    }

    fn pose(&mut self) {
        let Some(path) = self.current.as_ref().and_then(|c| c.frames.get(self.current_frame)) else {
            return;
        };
        pose_node(&mut self.target, path);
    }
}

/// Applies `path` to `node` and, by child name, to its descendants.
pub fn pose_node(node: &mut Node, path: &AnimationPath) {
    if let Some(keyframe) = &path.keyframe {
        if let Some([x, y, z]) = keyframe.position {
            node.set_position(Vector3::new(x, y, z));
        }
        if let Some(rotation) = keyframe.rotation {
            node.set_rotation(Euler::from(rotation));
        }
        if let Some([x, y, z]) = keyframe.scale {
            node.set_scale(Vector3::new(x, y, z));
        }
    }
    for (name, child_path) in &path.children {
        let Some(index) = node.children().iter().position(|c| c.name() == name) else {
            log::debug!("no child named `{name}` under `{}`", node.name());
            continue;
        };
        if let Some(child) = node.child_mut(index) {
            pose_node(child, child_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationTRS, sample_walk_clip};

    fn runner(frames: usize, mode: PlayMode) -> AnimationRunner {
        let frames = (0..frames)
            .map(|i| {
                AnimationPath::new(AnimationTRS {
                    position: Some([i as f32, 0.0, 0.0]),
                    ..Default::default()
                })
            })
            .collect();
        let mut runner = AnimationRunner::new(Node::group("body")).with_fps(10.0).with_mode(mode);
        runner.set_clip(AnimationClip::new("steps", frames));
        runner.play();
        runner
    }

    #[test]
    fn loop_wraps_forward_and_back() {
        let mut r = runner(4, PlayMode::Loop);
        assert!(r.update(0.5));
        assert_eq!(r.current_frame(), 1);
        assert_eq!(r.target().position().x, 1.0);

        r.set_reverse(true);
        assert!(r.update(0.3));
        assert_eq!(r.current_frame(), 2);
    }

    #[test]
    fn fraction_carries_over() {
        let mut r = runner(4, PlayMode::Loop);
        assert!(!r.update(0.05));
        assert_eq!(r.current_frame(), 0);
        assert!(r.update(0.06));
        assert_eq!(r.current_frame(), 1);
        assert!(r.delta_frame() < 1.0);
    }

    #[test]
    fn once_stops_at_the_ends() {
        let mut r = runner(4, PlayMode::Once);
        assert!(r.update(1.0));
        assert_eq!(r.current_frame(), 3);
        assert!(!r.is_playing());
        assert!(!r.update(1.0));

        r.set_reverse(true);
        r.play();
        assert!(r.update(0.5));
        assert_eq!(r.current_frame(), 0);
        assert!(!r.is_playing());
    }

    #[test]
    fn paused_runner_does_not_move() {
        let mut r = runner(4, PlayMode::Loop);
        r.pause();
        assert!(!r.update(10.0));
        assert_eq!(r.current_frame(), 0);
    }

    #[test]
    fn stepping_wraps() {
        let mut r = runner(3, PlayMode::Loop);
        r.prev().unwrap();
        assert_eq!(r.current_frame(), 2);
        r.next().unwrap();
        assert_eq!(r.current_frame(), 0);
        r.end().unwrap();
        assert_eq!(r.target().position().x, 2.0);
        assert!(matches!(
            r.set_current_frame(3),
            Err(AnimationError::FrameOutOfRange { frame: 3, len: 3 })
        ));
    }

    #[test]
    fn without_clip() {
        let mut r = AnimationRunner::new(Node::group("idle"));
        r.play();
        assert!(!r.update(1.0));
        assert!(matches!(r.start(), Err(AnimationError::NoClip)));
        assert!(matches!(
            r.set_interpolation(EaseType::Sine, EaseVariant::In),
            Err(AnimationError::NoClip)
        ));
    }

    #[test]
    fn interpolation_is_reversible() {
        let mut r = AnimationRunner::new(Node::group("body"));
        let clip = sample_walk_clip();
        r.set_clip(clip.clone());
        r.set_interpolation(EaseType::Cubic, EaseVariant::InOut).unwrap();
        r.set_interpolation(EaseType::Cubic, EaseVariant::InOut).unwrap();
        assert_eq!(r.len(), 4 * (INTERPOLATION_STEPS + 1) + 1);
        r.unset_interpolation();
        assert_eq!(r.clip(), Some(&clip));
    }

    #[test]
    fn poses_children_by_name() {
        let body = Node::group("body")
            .with_child(Node::group("rarm"))
            .with_child(Node::group("tail"));
        let mut r = AnimationRunner::new(body);
        r.set_clip(sample_walk_clip());
        r.set_current_frame(2).unwrap();

        let target = r.target();
        let rarm = target.find_by_name("rarm").unwrap();
        assert_eq!(rarm.position(), Vector3::new(-1.0, 0.3, 0.0));
        assert!((rarm.rotation().z - 0.4).abs() < 1e-6);
        assert_eq!(target.find_by_name("tail").unwrap().position(), Vector3::new(0.0, 0.0, 0.0));
    }
}
