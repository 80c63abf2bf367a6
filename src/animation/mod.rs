//! Keyframe animation of named node hierarchies.
//!
//! A clip is a list of [`AnimationPath`] frames. Each frame carries an
//! optional TRS for the animated node and, keyed by child name, paths for its
//! children. [`interpolate_frames`] densifies a clip with eased in-betweens
//! and [`AnimationRunner`] plays it against a [`Node`](crate::data_structures::scene_graph::Node).

pub mod easing;
pub mod interpolation;
pub mod runner;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::AnimationError;

pub use easing::{EaseType, EaseVariant, ease};
pub use interpolation::interpolate_frames;
pub use runner::{AnimationRunner, PlayMode};

/// Partial transform of one node. Missing components are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationTRS {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<[f32; 3]>,
    /// Euler angles in radians.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<[f32; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<[f32; 3]>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationPath {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyframe: Option<AnimationTRS>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, AnimationPath>,
}

impl AnimationPath {
    pub fn new(keyframe: AnimationTRS) -> Self {
        Self {
            keyframe: Some(keyframe),
            children: BTreeMap::new(),
        }
    }

    pub fn with_child(mut self, name: impl Into<String>, path: AnimationPath) -> Self {
        self.children.insert(name.into(), path);
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationClip {
    pub name: String,
    pub frames: Vec<AnimationPath>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, frames: Vec<AnimationPath>) -> Self {
        Self {
            name: name.into(),
            frames,
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn from_json(json: &str) -> Result<Self, AnimationError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, AnimationError> {
        Ok(serde_json::to_string(self)?)
    }
}

fn limb(position: [f32; 3], rotation_z: f32) -> AnimationPath {
    AnimationPath::new(AnimationTRS {
        position: Some(position),
        rotation: Some([0.0, 0.0, rotation_z]),
        scale: None,
    })
}

/// A five-frame walk cycle for a body with `rarm`, `larm`, `rleg` and `lleg`
/// children. The last frame equals the first.
pub fn sample_walk_clip() -> AnimationClip {
    // (arm height, leg height, swing angle) per frame
    let poses = [(0.5, -0.5, 0.0), (0.4, -0.6, 0.2), (0.3, -0.5, 0.4), (0.4, -0.6, 0.2), (0.5, -0.5, 0.0)];
    let frames = poses
        .iter()
        .map(|&(arm, leg, swing)| {
            AnimationPath::new(AnimationTRS {
                position: Some([0.0; 3]),
                rotation: Some([0.0; 3]),
                scale: None,
            })
            .with_child("rarm", limb([-1.0, arm, 0.0], swing))
            .with_child("larm", limb([1.0, arm, 0.0], -swing))
            .with_child("rleg", limb([0.4, leg, 0.0], swing))
            .with_child("lleg", limb([-0.4, leg, 0.0], -swing))
        })
        .collect();
    AnimationClip::new("walk", frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_clip_is_cyclic() {
        let clip = sample_walk_clip();
        assert_eq!(clip.len(), 5);
        assert_eq!(clip.frames[0], clip.frames[4]);
        assert_eq!(clip.frames[1], clip.frames[3]);
        let rarm = &clip.frames[2].children["rarm"];
        assert_eq!(rarm.keyframe.as_ref().and_then(|k| k.rotation), Some([0.0, 0.0, 0.4]));
    }

    #[test]
    fn clip_json_omits_missing_fields() {
        let clip = AnimationClip::new(
            "nod",
            vec![AnimationPath::new(AnimationTRS {
                scale: Some([2.0, 2.0, 2.0]),
                ..Default::default()
            })],
        );
        let json = clip.to_json().unwrap();
        assert_eq!(json, r#"{"name":"nod","frames":[{"keyframe":{"scale":[2.0,2.0,2.0]}}]}"#);
        assert_eq!(AnimationClip::from_json(&json).unwrap(), clip);
    }

    #[test]
    fn malformed_clip_is_an_error() {
        assert!(matches!(AnimationClip::from_json("{\"frames\": 3}"), Err(AnimationError::Json(_))));
    }
}
