use cgmath::InnerSpace;

use super::{Quaternion, Vector3};

/// Operations the editor needs on top of `cgmath::Vector3`.
pub trait VectorExt: Sized {
    /// Normalizes, substituting a length of 1 for a zero-length vector so
    /// the input is returned unchanged instead of turning into NaNs.
    fn normalize_or_keep(self) -> Self;
    fn apply_quaternion(self, q: Quaternion) -> Self;
    fn to_array(self) -> [f32; 3];
    fn from_slice(values: &[f32]) -> Option<Self>;
}

impl VectorExt for Vector3 {
    fn normalize_or_keep(self) -> Self {
        let len = self.magnitude();
        let len = if len == 0.0 { 1.0 } else { len };
        self / len
    }

    fn apply_quaternion(self, q: Quaternion) -> Self {
        // t = 2 * cross(q.xyz, v); v' = v + w * t + cross(q.xyz, t)
        let qv = q.v;
        let t = qv.cross(self) * 2.0;
        self + t * q.s + qv.cross(t)
    }

    fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    fn from_slice(values: &[f32]) -> Option<Self> {
        match values {
            [x, y, z, ..] => Some(Vector3::new(*x, *y, *z)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::QuaternionExt;

    #[test]
    fn zero_vector_is_kept() {
        let v = Vector3::new(0.0, 0.0, 0.0).normalize_or_keep();
        assert_eq!(v, Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn quarter_turn_about_z() {
        let q = Quaternion::from_euler_xyz(0.0, 0.0, std::f32::consts::FRAC_PI_2);
        let v = Vector3::new(1.0, 0.0, 0.0).apply_quaternion(q);
        assert!((v.x).abs() < 1e-6);
        assert!((v.y - 1.0).abs() < 1e-6);
    }
}
