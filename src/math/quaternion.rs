use super::{Matrix4, Vector3};

/// Quaternion conversions fixed to the intrinsic XYZ Euler order.
pub trait QuaternionExt: Sized {
    fn from_euler_xyz(x: f32, y: f32, z: f32) -> Self;
    fn from_euler_vector(e: Vector3) -> Self {
        Self::from_euler_xyz(e.x, e.y, e.z)
    }
    /** Inverse of [`QuaternionExt::from_euler_xyz`]. The middle angle is
    clamped to [-π/2, π/2]; at that boundary only the sum of the outer
    angles is recoverable. */
    fn to_euler_xyz(&self) -> Vector3;
    fn from_rotation_matrix(m: &Matrix4) -> Self;
    fn to_matrix4(&self) -> Matrix4;
    fn to_xyzw(&self) -> [f32; 4];
    fn from_xyzw(xyzw: [f32; 4]) -> Self;
}

impl QuaternionExt for cgmath::Quaternion<f32> {
    fn from_euler_xyz(x: f32, y: f32, z: f32) -> Self {
        let (s1, c1) = (x / 2.0).sin_cos();
        let (s2, c2) = (y / 2.0).sin_cos();
        let (s3, c3) = (z / 2.0).sin_cos();
        cgmath::Quaternion::new(
            c1 * c2 * c3 - s1 * s2 * s3,
            s1 * c2 * c3 + c1 * s2 * s3,
            c1 * s2 * c3 - s1 * c2 * s3,
            c1 * c2 * s3 + s1 * s2 * c3,
        )
    }

    fn to_euler_xyz(&self) -> Vector3 {
        let (w, x, y, z) = (self.s, self.v.x, self.v.y, self.v.z);
        // Rotation matrix terms of R = Rx * Ry * Rz.
        let m13 = 2.0 * (x * z + w * y);
        let m23 = 2.0 * (y * z - w * x);
        let m33 = 1.0 - 2.0 * (x * x + y * y);
        let m12 = 2.0 * (x * y - w * z);
        let m11 = 1.0 - 2.0 * (y * y + z * z);

        let pitch = m13.clamp(-1.0, 1.0).asin();
        if m13.abs() < 0.999_999 {
            Vector3::new((-m23).atan2(m33), pitch, (-m12).atan2(m11))
        } else {
            // gimbal lock: fold the whole twist into x
            let m32 = 2.0 * (y * z + w * x);
            let m22 = 1.0 - 2.0 * (x * x + z * z);
            Vector3::new(m32.atan2(m22), pitch, 0.0)
        }
    }

    fn from_rotation_matrix(m: &Matrix4) -> Self {
        // cgmath indexes [column][row]
        let (m11, m12, m13) = (m[0][0], m[1][0], m[2][0]);
        let (m21, m22, m23) = (m[0][1], m[1][1], m[2][1]);
        let (m31, m32, m33) = (m[0][2], m[1][2], m[2][2]);
        let trace = m11 + m22 + m33;

        let (w, x, y, z) = if trace > 0.0 {
            let s = 0.5 / (trace + 1.0).sqrt();
            (0.25 / s, (m32 - m23) * s, (m13 - m31) * s, (m21 - m12) * s)
        } else if m11 > m22 && m11 > m33 {
            let s = 2.0 * (1.0 + m11 - m22 - m33).sqrt();
            ((m32 - m23) / s, 0.25 * s, (m12 + m21) / s, (m13 + m31) / s)
        } else if m22 > m33 {
            let s = 2.0 * (1.0 + m22 - m11 - m33).sqrt();
            ((m13 - m31) / s, (m12 + m21) / s, 0.25 * s, (m23 + m32) / s)
        } else {
            let s = 2.0 * (1.0 + m33 - m11 - m22).sqrt();
            ((m21 - m12) / s, (m13 + m31) / s, (m23 + m32) / s, 0.25 * s)
        };
        cgmath::Quaternion::new(w, x, y, z)
    }

    fn to_matrix4(&self) -> Matrix4 {
        let (w, x, y, z) = (self.s, self.v.x, self.v.y, self.v.z);
        super::from_rows([
            [1.0 - 2.0 * (y * y + z * z), 2.0 * (x * y - w * z), 2.0 * (x * z + w * y), 0.0],
            [2.0 * (x * y + w * z), 1.0 - 2.0 * (x * x + z * z), 2.0 * (y * z - w * x), 0.0],
            [2.0 * (x * z - w * y), 2.0 * (y * z + w * x), 1.0 - 2.0 * (x * x + y * y), 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    fn to_xyzw(&self) -> [f32; 4] {
        [self.v.x, self.v.y, self.v.z, self.s]
    }

    fn from_xyzw(xyzw: [f32; 4]) -> Self {
        cgmath::Quaternion::new(xyzw[3], xyzw[0], xyzw[1], xyzw[2])
    }
}

#[cfg(test)]
mod tests {
    use cgmath::InnerSpace;

    use super::*;
    use crate::math::{Quaternion, make_rotation_x, make_rotation_y, make_rotation_z, matrix_approx_eq};

    #[test]
    fn matrix_matches_axis_rotations() {
        let q = Quaternion::from_euler_xyz(0.3, -0.5, 1.1);
        let expected = make_rotation_x(0.3) * make_rotation_y(-0.5) * make_rotation_z(1.1);
        assert!(matrix_approx_eq(&q.to_matrix4(), &expected, 1e-5));
    }

    #[test]
    fn every_trace_branch_decomposes() {
        // trace > 0, then each dominant diagonal term
        for euler in [
            (0.1, 0.2, 0.3),
            (3.0, 0.0, 0.0),
            (0.0, 3.0, 0.0),
            (0.0, 0.0, 3.0),
        ] {
            let q = Quaternion::from_euler_xyz(euler.0, euler.1, euler.2);
            let back = Quaternion::from_rotation_matrix(&q.to_matrix4());
            let same = (back.s - q.s).abs() < 1e-5 && (back.v - q.v).magnitude2() < 1e-9;
            let flipped = (back.s + q.s).abs() < 1e-5 && (back.v + q.v).magnitude2() < 1e-9;
            assert!(same || flipped, "{euler:?}: {q:?} vs {back:?}");
        }
    }
}
