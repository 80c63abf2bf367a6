use serde::{Deserialize, Serialize};

/// RGB channels in 0–255, alpha in 0–1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255.0, 255.0, 255.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const RED: Color = Color::rgb(255.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 255.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 255.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Normalized `[r, g, b, a]`, every channel in 0–1.
    pub fn to_array(self) -> [f32; 4] {
        [self.r / 255.0, self.g / 255.0, self.b / 255.0, self.a]
    }

    pub fn to_wgpu(self) -> wgpu::Color {
        let [r, g, b, a] = self.to_array();
        wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: a as f64,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}
