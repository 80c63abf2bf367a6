//! Error types, one enum per subsystem plus a crate-wide wrapper.
//!
//! Best-effort degradations (unmatched animation children, computed normals,
//! narrowed index types) are logged instead of being reported here.

use thiserror::Error;

use crate::data_structures::scene_graph::NodeId;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("cannot apply structural copy-on-write to a camera or light")]
    StructuralCopy,
    #[error("invalid property token `{0}`")]
    InvalidProperty(String),
    #[error("node {0} not found")]
    NotFound(NodeId),
    #[error("node {0} is not a camera")]
    NotACamera(NodeId),
    #[error("malformed scene json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("accessor {accessor} reads bytes {start}..{end} but the buffer holds {len}")]
    DecodeBounds {
        accessor: usize,
        start: usize,
        end: usize,
        len: usize,
    },
    #[error("unknown component type: {0}")]
    UnknownComponentType(u32),
    #[error("unknown accessor type: {0}")]
    UnknownAccessorType(String),
    #[error("attribute `{name}` has unsupported element size {size}")]
    UnsupportedAttributeSize { name: String, size: usize },
    #[error("unsupported index component type: {0}")]
    UnsupportedIndexType(u32),
    #[error("mesh {mesh} primitive is missing the {attribute} attribute")]
    MissingAttribute { mesh: usize, attribute: &'static str },
    #[error("{kind} index {index} is out of range")]
    MissingReference { kind: &'static str, index: usize },
    #[error("invalid embedded buffer: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("malformed model document: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("No light found in the scene")]
    NoLight,
    #[error("node {0} is not a camera")]
    NotACamera(NodeId),
    #[error("failed to create program `{label}`: {reason}")]
    ProgramCreation { label: String, reason: String },
}

#[derive(Debug, Error)]
pub enum AnimationError {
    #[error("no animation clip is set")]
    NoClip,
    #[error("frame {frame} is out of range for a clip of {len} frames")]
    FrameOutOfRange { frame: usize, len: usize },
    #[error("unknown ease type `{0}`")]
    UnknownEase(String),
    #[error("unknown ease variant `{0}`")]
    UnknownVariant(String),
    #[error("malformed animation clip: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Animation(#[from] AnimationError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
