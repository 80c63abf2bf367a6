use serde::{Deserialize, Serialize};

use crate::data_structures::color::Color;
use crate::math::Vector3;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightKind {
    Directional,
    #[default]
    Point,
}

impl LightKind {
    /// Where a freshly created light of this kind is placed.
    pub fn default_position(self) -> Vector3 {
        match self {
            LightKind::Directional => Vector3::new(400.0, 400.0, 400.0),
            LightKind::Point => Vector3::new(3.0, 3.0, 3.0),
        }
    }

    /// Value of the `lightType` uniform.
    pub fn shader_code(self) -> i32 {
        match self {
            LightKind::Directional => 0,
            LightKind::Point => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub color: Color,
    pub intensity: f32,
    pub kind: LightKind,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            intensity: 1.0,
            kind: LightKind::Point,
        }
    }
}
