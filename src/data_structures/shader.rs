use std::borrow::Cow;
use std::hash::{DefaultHasher, Hash, Hasher};

/// A vertex/fragment source pair. Both halves are WGSL modules; the vertex
/// one must export `vs_main` and the fragment one `fs_main`. Built-in shaders
/// keep both entry points in one module and use it for both halves.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Shader {
    pub label: Cow<'static, str>,
    pub vertex: Cow<'static, str>,
    pub fragment: Cow<'static, str>,
}

impl Shader {
    pub fn new(label: impl Into<Cow<'static, str>>, vertex: impl Into<Cow<'static, str>>, fragment: impl Into<Cow<'static, str>>) -> Self {
        Self {
            label: label.into(),
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// Unlit, flat `color`.
    pub fn basic() -> Self {
        let src = include_str!("../pipelines/basic.wgsl");
        Self::new("basic", src, src)
    }

    /// Blinn-Phong shading against the single scene light.
    pub fn phong() -> Self {
        let src = include_str!("../pipelines/phong.wgsl");
        Self::new("phong", src, src)
    }

    /// Content hash over both sources. Shaders with equal sources share a GPU program.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.vertex.hash(&mut hasher);
        self.fragment.hash(&mut hasher);
        hasher.finish()
    }
}
