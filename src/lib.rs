//! scene-ngin
//!
//! The core of a browser-hosted 3D scene editor: a copy-on-write scene graph,
//! a two-file model codec, keyframe animation and a renderer that runs on
//! wgpu natively and on WebGL in the browser.
//!
//! High-level modules
//! - `math`: vectors, quaternions, Euler angles and matrix helpers over cgmath
//! - `data_structures`: buffers, geometry, materials, cameras, lights and the scene graph
//! - `codec`: export and import of JSON + binary model documents
//! - `animation`: easing, keyframe interpolation and clip playback
//! - `render`: the backend-agnostic renderer and its wgpu backend
//! - `pipelines`: wgpu pipeline construction for the scene shaders
//! - `context`: window, surface and renderer of a running editor
//! - `flow`: editor state and the winit event loop
//! - `resources`: loading and saving model files, with retries
//! - `error`: one error enum per subsystem
//!

pub mod animation;
pub mod codec;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod math;
pub mod pipelines;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use data_structures::scene::{NodeLookup, Scene};
pub use data_structures::scene_graph::{Node, NodeId, NodeKind};
pub use error::{Error, Result};
pub use winit::event::WindowEvent;
