//! Local TRS transform of a scene node.

use crate::math::{self, Euler, Matrix4, Quaternion, Vector3};

/// Position, rotation and scale relative to the parent node.
///
/// The rotation is held twice, as Euler angles (what the inspector edits) and
/// as a quaternion (what the matrix is built from). The setters keep the two
/// in agreement.
#[derive(Clone, Debug, PartialEq)]
pub struct Transform {
    position: Vector3,
    rotation: Euler,
    quaternion: Quaternion,
    scale: Vector3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform {
    /// Identity transform (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Euler::default(),
            quaternion: Quaternion::new(1.0, 0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn position(&self) -> Vector3 {
        self.position
    }

    pub fn rotation(&self) -> Euler {
        self.rotation
    }

    pub fn quaternion(&self) -> Quaternion {
        self.quaternion
    }

    pub fn scale(&self) -> Vector3 {
        self.scale
    }

    pub fn set_position(&mut self, position: Vector3) {
        self.position = position;
    }

    /// Sets the Euler angles and re-derives the quaternion.
    pub fn set_rotation(&mut self, rotation: Euler) {
        self.rotation = rotation;
        self.quaternion = rotation.to_quaternion();
    }

    /// Sets the quaternion and re-derives the Euler angles.
    pub fn set_quaternion(&mut self, quaternion: Quaternion) {
        self.quaternion = quaternion;
        self.rotation = Euler::from_quaternion(&quaternion);
    }

    pub fn set_scale(&mut self, scale: Vector3) {
        self.scale = scale;
    }

    /// translation × rotation × scale
    pub fn to_matrix(&self) -> Matrix4 {
        math::compose(self.position, self.quaternion, self.scale)
    }
}
