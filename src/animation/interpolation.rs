use super::easing::{EaseType, EaseVariant, ease};
use super::{AnimationPath, AnimationTRS};

fn lerp3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t, a[2] + (b[2] - a[2]) * t]
}

fn lerp_component(a: Option<[f32; 3]>, b: Option<[f32; 3]>, t: f32) -> Option<[f32; 3]> {
    Some(lerp3(a?, b?, t))
}

fn lerp_trs(a: &AnimationTRS, b: &AnimationTRS, t: f32) -> AnimationTRS {
    AnimationTRS {
        position: lerp_component(a.position, b.position, t),
        rotation: lerp_component(a.rotation, b.rotation, t),
        scale: lerp_component(a.scale, b.scale, t),
    }
}

/// Blends two paths. Only components and children present on both sides
/// survive.
pub fn lerp_path(a: &AnimationPath, b: &AnimationPath, t: f32) -> AnimationPath {
    let keyframe = match (&a.keyframe, &b.keyframe) {
        (Some(ka), Some(kb)) => Some(lerp_trs(ka, kb, t)),
        _ => None,
    };
    let children = a
        .children
        .iter()
        .filter_map(|(name, ca)| {
            let cb = b.children.get(name)?;
            Some((name.clone(), lerp_path(ca, cb, t)))
        })
        .collect();
    AnimationPath { keyframe, children }
}

/**
Inserts `steps` eased in-betweens after every authored frame but the last.

The result starts with `frames[0]`, ends with the last authored frame, and
holds `(len - 1) * (steps + 1) + 1` frames in total. Authored frames are
copied through unchanged.
*/
pub fn interpolate_frames(frames: &[AnimationPath], kind: EaseType, variant: EaseVariant, steps: usize) -> Vec<AnimationPath> {
    let Some(last) = frames.last() else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity((frames.len() - 1) * (steps + 1) + 1);
    for pair in frames.windows(2) {
        let (start, end) = (&pair[0], &pair[1]);
        out.push(start.clone());
        for j in 1..=steps {
            let t = j as f64 / (steps + 1) as f64;
            out.push(lerp_path(start, end, ease(kind, variant, t) as f32));
        }
    }
    out.push(last.clone());
    out
}
