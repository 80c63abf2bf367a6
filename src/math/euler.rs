use serde::{Deserialize, Serialize};

use super::{Quaternion, QuaternionExt, Vector3};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EulerOrder {
    #[default]
    Xyz,
}

/// Euler angles in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Euler {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(default)]
    pub order: EulerOrder,
}

impl Euler {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            order: EulerOrder::Xyz,
        }
    }

    pub fn from_vector(v: Vector3) -> Self {
        Self::new(v.x, v.y, v.z)
    }

    pub fn to_vector(self) -> Vector3 {
        Vector3::new(self.x, self.y, self.z)
    }

    pub fn to_quaternion(self) -> Quaternion {
        match self.order {
            EulerOrder::Xyz => Quaternion::from_euler_xyz(self.x, self.y, self.z),
        }
    }

    pub fn from_quaternion(q: &Quaternion) -> Self {
        Self::from_vector(q.to_euler_xyz())
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f32; 3]> for Euler {
    fn from(value: [f32; 3]) -> Self {
        Self::new(value[0], value[1], value[2])
    }
}
