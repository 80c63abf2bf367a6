use std::f32::consts::{FRAC_PI_2, PI};

use cgmath::InnerSpace;
use quickcheck_macros::quickcheck;
use scene_ngin::{
    Node,
    math::{Euler, Matrix4, Quaternion, QuaternionExt, Vector3, compose, make_rotation_x, make_rotation_y, make_rotation_z, make_scale, make_translation, matrix_approx_eq, multiply_matrices},
};

/// Maps a raw sample onto the open interval `(-limit, limit)`.
fn spread(raw: u16, limit: f32) -> f32 {
    (raw as f32 / u16::MAX as f32 * 2.0 - 1.0) * limit
}

#[quickcheck]
fn euler_survives_quaternion_round_trip(a: u16, b: u16, c: u16) -> bool {
    let euler = Euler::new(spread(a, PI - 0.05), spread(b, FRAC_PI_2 - 0.05), spread(c, PI - 0.05));
    let back = Euler::from_quaternion(&euler.to_quaternion());
    [(euler.x, back.x), (euler.y, back.y), (euler.z, back.z)]
        .iter()
        .all(|(want, got)| (want - got).abs() < 1e-3)
}

#[quickcheck]
fn quaternion_matrix_agrees_with_axis_rotations(a: u16, b: u16, c: u16) -> bool {
    let (x, y, z) = (spread(a, PI), spread(b, PI), spread(c, PI));
    let q = Quaternion::from_euler_xyz(x, y, z);
    let expected = multiply_matrices(&[make_rotation_x(x), make_rotation_y(y), make_rotation_z(z)]);
    matrix_approx_eq(&q.to_matrix4(), &expected, 1e-4)
}

#[test]
fn compose_is_translation_rotation_scale() {
    let position = Vector3::new(1.0, -2.0, 3.0);
    let rotation = Euler::new(0.3, 0.2, -0.1).to_quaternion();
    let scale = Vector3::new(2.0, 2.0, 0.5);
    let expected = make_translation(1.0, -2.0, 3.0) * rotation.to_matrix4() * make_scale(2.0, 2.0, 0.5);
    assert!(matrix_approx_eq(&compose(position, rotation, scale), &expected, 1e-5));
}

#[test]
fn child_world_follows_parent_trs() {
    let child = Node::group("child").with_position(Vector3::new(1.0, 0.0, 0.0));
    let mut parent = Node::group("parent")
        .with_position(Vector3::new(1.0, 2.0, 3.0))
        .with_rotation(Euler::new(0.0, FRAC_PI_2, 0.0))
        .with_scale(Vector3::new(2.0, 2.0, 2.0))
        .with_child(child);
    parent.compute_world_transform(None, true);

    let p = parent.children()[0].world_position();
    assert!((p - Vector3::new(1.0, 2.0, 1.0)).magnitude2() < 1e-8, "{p:?}");
}

#[test]
fn world_is_parent_times_local() {
    let mut parent = Node::group("parent")
        .with_position(Vector3::new(0.0, 5.0, 0.0))
        .with_rotation(Euler::new(0.4, 0.0, 0.0))
        .with_child(Node::group("child").with_scale(Vector3::new(3.0, 1.0, 1.0)));
    parent.compute_world_transform(None, true);

    let child = &parent.children()[0];
    let expected: Matrix4 = parent.world_transform() * child.local_transform();
    assert!(matrix_approx_eq(&child.world_transform(), &expected, 1e-6));
}

#[test]
fn setting_rotation_keeps_quaternion_in_sync() {
    let mut node = Node::group("n");
    node.set_rotation(Euler::new(0.1, 0.2, 0.3));
    let q = Euler::new(0.1, 0.2, 0.3).to_quaternion();
    assert!((node.quaternion().s - q.s).abs() < 1e-6);

    node.set_quaternion(Quaternion::from_euler_xyz(0.0, 0.0, 0.5));
    assert!((node.rotation().z - 0.5).abs() < 1e-5);
}
