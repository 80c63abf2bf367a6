//! Math primitives used across the editor.
//!
//! The concrete value types are the `cgmath` ones (`f32`, column-major
//! matrices). This module adds the conversions the scene graph relies on:
//!
//! - `vector`: normalization that never divides by zero, quaternion rotation
//! - `quaternion`: intrinsic XYZ Euler conversion and trace-based matrix decomposition
//! - `matrix`: projection builders, affine helpers and a variadic left fold
//! - `euler`: an explicit Euler triple tagged with its rotation order
//!
//! Every rotational conversion in the crate goes through these helpers so the
//! Euler angles and the quaternion stored on a node always agree.

pub mod euler;
pub mod matrix;
pub mod quaternion;
pub mod vector;

pub type Vector3 = cgmath::Vector3<f32>;
pub type Quaternion = cgmath::Quaternion<f32>;
pub type Matrix4 = cgmath::Matrix4<f32>;

pub use euler::{Euler, EulerOrder};
pub use matrix::*;
pub use quaternion::QuaternionExt;
pub use vector::VectorExt;

/// Element-wise comparison used by tests and by callers that need tolerance checks.
pub fn matrix_approx_eq(a: &Matrix4, b: &Matrix4, epsilon: f32) -> bool {
    let a: &[f32; 16] = a.as_ref();
    let b: &[f32; 16] = b.as_ref();
    a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() <= epsilon)
}
