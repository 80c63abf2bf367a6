//! Editor data structures: geometry, materials and the scene graph.
//!
//! - `buffer` typed vertex/index arrays with size, stride and offset
//! - `geometry` named attribute sets and normal generation
//! - `primitives` procedural shapes (triangle, sphere, pyramid, ring, tetrahedron)
//! - `color`, `shader`, `material` describe how a mesh is shaded
//! - `transform` local TRS of a node
//! - `camera`, `light` payloads of the camera and light node kinds
//! - `scene_graph` the node tree and its copy-on-write rebuild
//! - `scene` root list, versioned updates and the id lookup cache

pub mod buffer;
pub mod camera;
pub mod color;
pub mod geometry;
pub mod light;
pub mod material;
pub mod primitives;
pub mod scene;
pub mod scene_graph;
pub mod shader;
pub mod transform;
