//! Procedural geometry offered by the editor's "add object" menu.

use std::f32::consts::PI;

use cgmath::InnerSpace;

use crate::data_structures::buffer::BufferAttribute;
use crate::data_structures::geometry::{BufferGeometry, NORMAL, POSITION};
use crate::math::{Vector3, VectorExt};

/// Single counter-clockwise triangle facing +z.
pub fn triangle() -> BufferGeometry {
    let mut geometry = BufferGeometry::new().with_attribute(
        POSITION,
        BufferAttribute::from_f32(vec![0.0, 1.0, 0.0, -1.0, -1.0, 0.0, 1.0, -1.0, 0.0], 3),
    );
    geometry.compute_normals();
    geometry
}

/// UV sphere with inward facing normals, matching the editor's lighting convention.
pub fn sphere(radius: f32, width_segments: u16, height_segments: u16) -> BufferGeometry {
    let (ws, hs) = (width_segments.max(3) as usize, height_segments.max(2) as usize);
    let mut positions = Vec::with_capacity((ws + 1) * (hs + 1) * 3);
    let mut normals = Vec::with_capacity(positions.capacity());
    for y in 0..=hs {
        let (sin_t, cos_t) = (y as f32 * PI / hs as f32).sin_cos();
        for x in 0..=ws {
            let (sin_p, cos_p) = (x as f32 * 2.0 * PI / ws as f32).sin_cos();
            let n = [cos_p * sin_t, cos_t, sin_p * sin_t];
            positions.extend(n.iter().map(|c| c * radius));
            normals.extend(n.iter().map(|c| -c));
        }
    }
    let mut indices = Vec::with_capacity(ws * hs * 6);
    for y in 0..hs {
        for x in 0..ws {
            let first = (y * (ws + 1) + x) as u16;
            let second = first + ws as u16 + 1;
            indices.extend([first, second, first + 1, second, second + 1, first + 1]);
        }
    }
    BufferGeometry::new()
        .with_attribute(POSITION, BufferAttribute::from_f32(positions, 3))
        .with_attribute(NORMAL, BufferAttribute::from_f32(normals, 3))
        .with_indices(BufferAttribute::from_u16(indices, 1))
}

/// Square pyramid with smoothed, unit-length vertex normals.
pub fn pyramid() -> BufferGeometry {
    let positions = vec![
        -1.0, -1.0, -1.0, //
        1.0, -1.0, -1.0, //
        1.0, -1.0, 1.0, //
        -1.0, -1.0, 1.0, //
        0.0, 1.0, 0.0,
    ];
    let indices: Vec<u16> = vec![0, 4, 1, 1, 4, 2, 2, 4, 3, 3, 4, 0, 0, 1, 2, 2, 3, 0];
    let mut geometry = BufferGeometry::new()
        .with_attribute(POSITION, BufferAttribute::from_f32(positions, 3))
        .with_indices(BufferAttribute::from_u16(indices, 1));
    geometry.compute_normals();
    if let Some(normals) = geometry.normalized_normals() {
        let flat = normals.iter().flat_map(|n| n.to_array()).collect();
        geometry.set_attribute(NORMAL, BufferAttribute::from_f32(flat, 3));
    }
    geometry
}

/// Flat annulus in the xy plane with a given thickness.
pub fn ring(inner_radius: f32, outer_radius: f32, thickness: f32, segments: u16) -> BufferGeometry {
    let segments = segments.max(3) as usize;
    let half = thickness / 2.0;
    let mut positions: Vec<f32> = Vec::new();
    let mut normals: Vec<f32> = Vec::new();
    let mut push = |p: [[f32; 3]; 3], n: [Vector3; 3]| {
        positions.extend(p.iter().flatten());
        normals.extend(n.iter().flat_map(|v| v.to_array()));
    };
    let up = Vector3::new(0.0, 0.0, 1.0);
    let down = -up;

    for i in 0..segments {
        let a1 = i as f32 / segments as f32 * 2.0 * PI;
        let a2 = (i + 1) as f32 / segments as f32 * 2.0 * PI;
        let (i1, o1) = (
            [inner_radius * a1.cos(), inner_radius * a1.sin()],
            [outer_radius * a1.cos(), outer_radius * a1.sin()],
        );
        let (i2, o2) = (
            [inner_radius * a2.cos(), inner_radius * a2.sin()],
            [outer_radius * a2.cos(), outer_radius * a2.sin()],
        );
        let at = |p: [f32; 2], z: f32| [p[0], p[1], z];
        let radial = |p: [f32; 2]| Vector3::new(p[0], p[1], 0.0).normalize_or_keep();

        // top
        push([at(i1, half), at(o1, half), at(i2, half)], [up; 3]);
        push([at(i2, half), at(o1, half), at(o2, half)], [up; 3]);
        // bottom
        push([at(i1, -half), at(i2, -half), at(o1, -half)], [down; 3]);
        push([at(i2, -half), at(o2, -half), at(o1, -half)], [down; 3]);
        // outer wall
        let (n1, n2) = (radial(o1), radial(o2));
        push([at(o1, half), at(o1, -half), at(o2, half)], [n1, n1, n2]);
        push([at(o2, half), at(o1, -half), at(o2, -half)], [n2, n1, n2]);
        // inner wall
        let (n1, n2) = (radial(i1), radial(i2));
        push([at(i1, half), at(i2, half), at(i1, -half)], [n1, n2, n1]);
        push([at(i2, half), at(i2, -half), at(i1, -half)], [n2, n2, n1]);
    }

    BufferGeometry::new()
        .with_attribute(POSITION, BufferAttribute::from_f32(positions, 3))
        .with_attribute(NORMAL, BufferAttribute::from_f32(normals, 3))
}

/// Capsule along y: a cylinder of `height` capped by two hemispheres.
///
/// Segment counts are clamped to 3..=64 radially and 1..=64 per band so
/// the three bands stay addressable with u16 indices.
pub fn capsule(radius: f32, height: f32, radial_segments: u16, height_segments: u16) -> BufferGeometry {
    let (rs, hs) = (radial_segments.clamp(3, 64) as usize, height_segments.clamp(1, 64) as usize);
    let half = height / 2.0;
    let band = (rs + 1) * (hs + 1);
    let mut positions = Vec::with_capacity(band * 9);
    let mut normals = Vec::with_capacity(band * 9);
    // (sin, cos) of the polar angle, or None on the cylinder wall, and the y offset
    let mut ring = |polar: Option<(f32, f32)>, offset: f32| {
        for x in 0..=rs {
            let (sin_p, cos_p) = (x as f32 * 2.0 * PI / rs as f32).sin_cos();
            let n = match polar {
                Some((sin_t, cos_t)) => [cos_p * sin_t, cos_t, sin_p * sin_t],
                None => [cos_p, 0.0, sin_p],
            };
            positions.extend([radius * n[0], radius * n[1] + offset, radius * n[2]]);
            normals.extend(n);
        }
    };

    let step = PI / (2 * hs) as f32;
    for y in 0..=hs {
        ring(Some((y as f32 * step).sin_cos()), half);
    }
    for y in 0..=hs {
        ring(None, y as f32 / hs as f32 * height - half);
    }
    for y in 0..=hs {
        ring(Some((y as f32 * step + PI / 2.0).sin_cos()), -half);
    }

    let mut indices = Vec::with_capacity(band * 18);
    for (base, flip) in [(0, true), (band, false), (band * 2, true)] {
        for y in 0..hs {
            for x in 0..rs {
                let first = (base + y * (rs + 1) + x) as u16;
                let second = first + rs as u16 + 1;
                if flip {
                    indices.extend([second, first, first + 1, second + 1, second, first + 1]);
                } else {
                    indices.extend([first, second, first + 1, second, second + 1, first + 1]);
                }
            }
        }
    }
    BufferGeometry::new()
        .with_attribute(POSITION, BufferAttribute::from_f32(positions, 3))
        .with_attribute(NORMAL, BufferAttribute::from_f32(normals, 3))
        .with_indices(BufferAttribute::from_u16(indices, 1))
}

/// Triangle soup with one flat normal per quad.
#[derive(Default)]
struct Soup {
    positions: Vec<f32>,
    normals: Vec<f32>,
}

impl Soup {
    fn quad(&mut self, v1: Vector3, v2: Vector3, v3: Vector3, v4: Vector3) {
        for p in [v1, v2, v3, v1, v3, v4] {
            self.positions.extend(p.to_array());
        }
        let n = (v2 - v1).cross(v3 - v1);
        let n = if n.magnitude2() > 0.0 { n.normalize() } else { n };
        for _ in 0..6 {
            self.normals.extend(n.to_array());
        }
    }

    /// Square beam of side `thickness` from `start` to `end`.
    fn beam(&mut self, start: Vector3, end: Vector3, thickness: f32) {
        let dir = (end - start).normalize_or_keep();
        let up = if dir.y.abs() > 0.9 {
            Vector3::new(1.0, 0.0, 0.0)
        } else {
            Vector3::new(0.0, 1.0, 0.0)
        };
        let right = dir.cross(up).normalize_or_keep() * (thickness / 2.0);
        let forward = right.cross(dir).normalize_or_keep() * (thickness / 2.0);
        let v = [
            start + right + forward,
            start + right - forward,
            start - right + forward,
            start - right - forward,
            end + right + forward,
            end + right - forward,
            end - right + forward,
            end - right - forward,
        ];
        for [a, b, c, d] in [[1, 0, 4, 5], [2, 3, 7, 6], [2, 0, 4, 6], [1, 3, 7, 5], [1, 0, 3, 2], [5, 4, 6, 7]] {
            self.quad(v[a], v[b], v[c], v[d]);
        }
    }

    fn into_geometry(self) -> BufferGeometry {
        BufferGeometry::new()
            .with_attribute(POSITION, BufferAttribute::from_f32(self.positions, 3))
            .with_attribute(NORMAL, BufferAttribute::from_f32(self.normals, 3))
    }
}

/// Wireframe tetrahedron built from six square beams.
pub fn tetrahedron_frame(edge_length: f32, edge_thickness: f32) -> BufferGeometry {
    let k = edge_length / 3f32.sqrt();
    let corners = [
        Vector3::new(1.0, 1.0, 1.0) * k,
        Vector3::new(-1.0, -1.0, 1.0) * k,
        Vector3::new(-1.0, 1.0, -1.0) * k,
        Vector3::new(1.0, -1.0, -1.0) * k,
    ];
    let mut soup = Soup::default();
    for (s, e) in [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)] {
        soup.beam(corners[s], corners[e], edge_thickness);
    }
    soup.into_geometry()
}

/// Hollow tetrakis hexahedron frame.
///
/// Every one of the 24 edges is drawn twice, once on the outer shell and
/// once on an inner shell scaled by `1 - thickness`, with a quad bridging
/// the two.
pub fn tetrakis_hexahedron(thickness: f32, shorter_edge: f32, longer_edge: f32) -> BufferGeometry {
    let (s, l) = (shorter_edge, longer_edge / 2.0);
    let outer = [
        Vector3::new(s, 0.0, 0.0),
        Vector3::new(-s, 0.0, 0.0),
        Vector3::new(0.0, s, 0.0),
        Vector3::new(0.0, -s, 0.0),
        Vector3::new(0.0, 0.0, l),
        Vector3::new(0.0, 0.0, -l),
        Vector3::new(l, l, l),
        Vector3::new(l, -l, l),
        Vector3::new(-l, l, l),
        Vector3::new(-l, -l, l),
        Vector3::new(l, l, -l),
        Vector3::new(l, -l, -l),
        Vector3::new(-l, l, -l),
        Vector3::new(-l, -l, -l),
    ];
    const EDGES: [(usize, usize); 24] = [
        (0, 2),
        (0, 3),
        (0, 4),
        (0, 5),
        (1, 2),
        (1, 3),
        (1, 4),
        (1, 5),
        (2, 4),
        (2, 5),
        (3, 4),
        (3, 5),
        (6, 7),
        (6, 8),
        (6, 10),
        (7, 9),
        (7, 11),
        (8, 9),
        (8, 12),
        (9, 13),
        (10, 11),
        (10, 12),
        (11, 13),
        (12, 13),
    ];
    let scale = 1.0 - thickness;
    let mut soup = Soup::default();
    for (a, b) in EDGES {
        let (outer_start, outer_end) = (outer[a], outer[b]);
        let (inner_start, inner_end) = (outer_start * scale, outer_end * scale);
        soup.beam(outer_start, outer_end, thickness);
        soup.beam(inner_start, inner_end, thickness);
        soup.quad(outer_start, outer_end, inner_end, inner_start);
    }
    soup.into_geometry()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_normal_points_at_viewer() {
        let geometry = triangle();
        let normal = geometry.attribute(NORMAL).unwrap();
        for i in 0..3 {
            assert_eq!(normal.get(i), vec![0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn sphere_index_count() {
        let geometry = sphere(1.0, 8, 4);
        assert_eq!(geometry.vertex_count(), 9 * 5);
        assert_eq!(geometry.indices().unwrap().count(), 8 * 4 * 6);
    }

    #[test]
    fn pyramid_normals_are_unit() {
        for n in pyramid().normalized_normals().unwrap() {
            assert!((n.magnitude() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn capsule_bands_and_extent() {
        let geometry = capsule(0.5, 2.0, 8, 4);
        assert_eq!(geometry.vertex_count(), 3 * 9 * 5);
        assert_eq!(geometry.indices().unwrap().count(), 3 * 8 * 4 * 6);
        let positions = geometry.attribute(POSITION).unwrap();
        let top = (0..positions.count()).map(|i| positions.get(i)[1]).fold(f32::MIN, f32::max);
        let bottom = (0..positions.count()).map(|i| positions.get(i)[1]).fold(f32::MAX, f32::min);
        assert!((top - 1.5).abs() < 1e-5);
        assert!((bottom + 1.5).abs() < 1e-5);
        let normals = geometry.attribute(NORMAL).unwrap();
        for i in 0..normals.count() {
            let n = Vector3::from_slice(&normals.get(i)).unwrap();
            assert!((n.magnitude() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn capsule_segments_are_clamped() {
        let geometry = capsule(1.0, 1.0, 1000, 0);
        assert_eq!(geometry.vertex_count(), 3 * 65 * 2);
    }

    #[test]
    fn tetrakis_frame_has_two_shells_per_edge() {
        let geometry = tetrakis_hexahedron(0.1, 1.5, 2.0);
        // per edge: two beams of six quads plus one bridge, six vertices a quad
        assert_eq!(geometry.vertex_count(), 24 * 13 * 6);
        assert!(geometry.indices().is_none());
        let normals = geometry.attribute(NORMAL).unwrap();
        for i in 0..normals.count() {
            let n = normals.get(i);
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            assert!((len - 1.0).abs() < 1e-4, "normal {i} has length {len}");
        }
    }
}
