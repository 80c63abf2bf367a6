//! Camera projections.
//!
//! Orthographic and oblique frustums shrink or grow with the camera's distance
//! along z so that dollying in the editor zooms them the way it zooms a
//! perspective camera.

use serde::{Deserialize, Serialize};

use crate::math::{self, Matrix4, Vector3};

/// Projection parameters. Angles are in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Projection {
    Perspective {
        fov: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    },
    Oblique {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
        theta: f32,
        ratio: f32,
    },
}

impl Projection {
    pub fn perspective() -> Self {
        Projection::Perspective {
            fov: 45.0,
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
        }
    }

    pub fn orthographic() -> Self {
        Projection::Orthographic {
            left: -1.0,
            right: 1.0,
            bottom: -1.0,
            top: 1.0,
            near: 0.1,
            far: 100.0,
        }
    }

    pub fn oblique(theta: f32, ratio: f32) -> Self {
        Projection::Oblique {
            left: -1.0,
            right: 1.0,
            bottom: -1.0,
            top: 1.0,
            near: 0.1,
            far: 100.0,
            theta,
            ratio,
        }
    }

    /// Projection matrix for a camera sitting at `position`.
    pub fn matrix(&self, position: Vector3) -> Matrix4 {
        match *self {
            Projection::Perspective {
                fov,
                aspect,
                near,
                far,
            } => math::perspective(fov.to_radians(), aspect, near, far),
            Projection::Orthographic {
                left,
                right,
                bottom,
                top,
                near,
                far,
            } => {
                let (x, y) = zoomed_extent(left, right, bottom, top, position.z);
                math::orthographic(-x, x, y, -y, near, far)
            }
            Projection::Oblique {
                left,
                right,
                bottom,
                top,
                near,
                far,
                theta,
                ratio,
            } => {
                let (x, y) = zoomed_extent(left, right, bottom, top, position.z);
                math::multiply_matrices(&[
                    math::oblique(-x, x, y, -y, near, far, theta.to_radians(), ratio),
                    math::make_translation(5.0, -5.0, 0.0),
                ])
            }
        }
    }

    /// Updates the aspect ratio of a perspective projection; the others keep their bounds.
    pub fn set_aspect(&mut self, new_aspect: f32) {
        if let Projection::Perspective { aspect, .. } = self {
            *aspect = new_aspect;
        }
    }
}

fn zoomed_extent(left: f32, right: f32, bottom: f32, top: f32, distance: f32) -> (f32, f32) {
    let zoom = 10.0 / distance.abs();
    let len_x = (right - left) / 2.0;
    let len_y = (top - bottom) / 2.0;
    ((len_x + len_x / zoom) / 2.0, (len_y + len_y / zoom) / 2.0)
}

#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    projection: Projection,
    projection_matrix: Matrix4,
}

impl Camera {
    pub fn new(projection: Projection, position: Vector3) -> Self {
        Self {
            projection,
            projection_matrix: projection.matrix(position),
        }
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn projection_matrix(&self) -> Matrix4 {
        self.projection_matrix
    }

    pub fn set_projection(&mut self, projection: Projection, position: Vector3) {
        self.projection = projection;
        self.update_projection_matrix(position);
    }

    pub fn update_projection_matrix(&mut self, position: Vector3) {
        self.projection_matrix = self.projection.matrix(position);
    }

    /// `projection × world⁻¹`; a singular world transform yields a zero view.
    pub fn view_projection(&self, world: &Matrix4) -> Matrix4 {
        self.projection_matrix * math::invert_or_zero(world)
    }
}
