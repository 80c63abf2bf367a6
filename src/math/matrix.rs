//! Matrix builders.
//!
//! All builders take their arguments in row-major reading order and return a
//! column-major `cgmath::Matrix4`, so `from_rows` is the single place where
//! the layout flips.

use cgmath::{Matrix, SquareMatrix, Zero};

use super::{Matrix4, Quaternion, QuaternionExt, Vector3, VectorExt};

pub fn from_rows(rows: [[f32; 4]; 4]) -> Matrix4 {
    Matrix4::from(rows).transpose()
}

/// Folds the matrices left to right: `multiply_matrices(&[a, b, c]) == a * b * c`.
/// An empty slice yields the identity.
pub fn multiply_matrices(matrices: &[Matrix4]) -> Matrix4 {
    matrices
        .iter()
        .fold(Matrix4::identity(), |acc, m| acc * *m)
}

/// Cofactor inverse; a singular matrix maps to the zero matrix.
pub fn invert_or_zero(m: &Matrix4) -> Matrix4 {
    m.invert().unwrap_or_else(Matrix4::zero)
}

pub fn make_translation(x: f32, y: f32, z: f32) -> Matrix4 {
    from_rows([
        [1.0, 0.0, 0.0, x],
        [0.0, 1.0, 0.0, y],
        [0.0, 0.0, 1.0, z],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

pub fn make_scale(x: f32, y: f32, z: f32) -> Matrix4 {
    from_rows([
        [x, 0.0, 0.0, 0.0],
        [0.0, y, 0.0, 0.0],
        [0.0, 0.0, z, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

pub fn make_rotation_x(theta: f32) -> Matrix4 {
    let (s, c) = theta.sin_cos();
    from_rows([
        [1.0, 0.0, 0.0, 0.0],
        [0.0, c, -s, 0.0],
        [0.0, s, c, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

pub fn make_rotation_y(theta: f32) -> Matrix4 {
    let (s, c) = theta.sin_cos();
    from_rows([
        [c, 0.0, s, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [-s, 0.0, c, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

pub fn make_rotation_z(theta: f32) -> Matrix4 {
    let (s, c) = theta.sin_cos();
    from_rows([
        [c, -s, 0.0, 0.0],
        [s, c, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

/// Shear matrix; `xy` is how much x shears along y and so on.
pub fn make_shear(xy: f32, xz: f32, yx: f32, yz: f32, zx: f32, zy: f32) -> Matrix4 {
    from_rows([
        [1.0, yx, zx, 0.0],
        [xy, 1.0, zy, 0.0],
        [xz, yz, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

/// OpenGL-style perspective projection (NDC depth in [-1, 1]); `fovy` in radians.
pub fn perspective(fovy: f32, aspect: f32, near: f32, far: f32) -> Matrix4 {
    let f = 1.0 / (fovy / 2.0).tan();
    let nf = 1.0 / (near - far);
    from_rows([
        [f / aspect, 0.0, 0.0, 0.0],
        [0.0, f, 0.0, 0.0],
        [0.0, 0.0, (far + near) * nf, 2.0 * far * near * nf],
        [0.0, 0.0, -1.0, 0.0],
    ])
}

pub fn orthographic(left: f32, right: f32, top: f32, bottom: f32, near: f32, far: f32) -> Matrix4 {
    let rl = right - left;
    let tb = top - bottom;
    let nf = near - far;
    from_rows([
        [2.0 / rl, 0.0, 0.0, -(left + right) / rl],
        [0.0, 2.0 / tb, 0.0, -(bottom + top) / tb],
        [0.0, 0.0, 2.0 / nf, (near + far) / nf],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

/// Orthographic projection composed with a depth shear of angle `theta`
/// (radians) scaled by `ratio`.
#[allow(clippy::too_many_arguments)]
pub fn oblique(
    left: f32,
    right: f32,
    top: f32,
    bottom: f32,
    near: f32,
    far: f32,
    theta: f32,
    ratio: f32,
) -> Matrix4 {
    let k = ratio / theta.tan();
    let shear = from_rows([
        [1.0, 0.0, k, 0.0],
        [0.0, 1.0, -k, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);
    multiply_matrices(&[orthographic(left, right, top, bottom, near, far), shear])
}

/// Translation × rotation × scale.
pub fn compose(position: Vector3, rotation: Quaternion, scale: Vector3) -> Matrix4 {
    multiply_matrices(&[
        make_translation(position.x, position.y, position.z),
        rotation.to_matrix4(),
        make_scale(scale.x, scale.y, scale.z),
    ])
}

pub fn extract_position(m: &Matrix4) -> Vector3 {
    m.w.truncate()
}

/// Camera-to-world matrix placing the eye at `eye` looking at `target`.
pub fn look_at(eye: Vector3, target: Vector3, up: Vector3) -> Matrix4 {
    let z = (eye - target).normalize_or_keep();
    let x = up.cross(z).normalize_or_keep();
    let y = z.cross(x).normalize_or_keep();
    from_rows([
        [x.x, y.x, z.x, eye.x],
        [x.y, y.y, z.y, eye.y],
        [x.z, y.z, z.z, eye.z],
        [0.0, 0.0, 0.0, 1.0],
    ])
}
