//! Named attribute sets with an optional index list.

use cgmath::InnerSpace;

use crate::data_structures::buffer::{BufferAttribute, BufferData};
use crate::math::{Vector3, VectorExt};

pub const POSITION: &str = "position";
pub const NORMAL: &str = "normal";

/// Geometry of one mesh. Attributes keep their insertion order so exports
/// are deterministic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BufferGeometry {
    attributes: Vec<(String, BufferAttribute)>,
    indices: Option<BufferAttribute>,
}

impl BufferGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: &str, attribute: BufferAttribute) -> Self {
        self.set_attribute(name, attribute);
        self
    }

    pub fn with_indices(mut self, indices: BufferAttribute) -> Self {
        self.indices = Some(indices);
        self
    }

    /// Inserts or replaces the attribute called `name`.
    pub fn set_attribute(&mut self, name: &str, attribute: BufferAttribute) {
        match self.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = attribute,
            None => self.attributes.push((name.to_string(), attribute)),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&BufferAttribute> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, a)| a)
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<BufferAttribute> {
        let idx = self.attributes.iter().position(|(n, _)| n == name)?;
        Some(self.attributes.remove(idx).1)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &BufferAttribute)> {
        self.attributes.iter().map(|(n, a)| (n.as_str(), a))
    }

    pub fn indices(&self) -> Option<&BufferAttribute> {
        self.indices.as_ref()
    }

    pub fn set_indices(&mut self, indices: BufferAttribute) {
        self.indices = Some(indices);
    }

    pub fn remove_indices(&mut self) -> Option<BufferAttribute> {
        self.indices.take()
    }

    /// Number of vertices, taken from the position attribute.
    pub fn vertex_count(&self) -> usize {
        self.attribute(POSITION).map_or(0, BufferAttribute::count)
    }

    /**
    Recomputes the `normal` attribute from `position`.

    Each triangle contributes its unit face normal to the three vertices it
    references (through the index list when present). Contributions are
    summed and the sums are left as is, so a vertex shared by several faces
    ends up with a non-unit normal. Does nothing without positions.
    */
    pub fn compute_normals(&mut self) {
        let Some(position) = self.attribute(POSITION) else {
            return;
        };
        let count = position.count();
        let vertex = |i: usize| Vector3::from_slice(&position.get(i)).unwrap_or(Vector3::new(0.0, 0.0, 0.0));

        let triangles: Vec<[usize; 3]> = match &self.indices {
            Some(indices) => indices
                .data()
                .to_u32_vec()
                .chunks_exact(3)
                .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
                .collect(),
            None => (0..count / 3).map(|t| [3 * t, 3 * t + 1, 3 * t + 2]).collect(),
        };

        let mut normals = vec![Vector3::new(0.0, 0.0, 0.0); count];
        for [ia, ib, ic] in triangles {
            if ia >= count || ib >= count || ic >= count {
                log::warn!("triangle ({ia}, {ib}, {ic}) references a vertex past {count}");
                continue;
            }
            let (a, b, c) = (vertex(ia), vertex(ib), vertex(ic));
            let face = (b - a).cross(c - b).normalize_or_keep();
            normals[ia] += face;
            normals[ib] += face;
            normals[ic] += face;
        }

        let flat: Vec<f32> = normals.iter().flat_map(|n| n.to_array()).collect();
        self.set_attribute(NORMAL, BufferAttribute::new(BufferData::F32(flat), 3));
    }

    /// Unit-length copy of every normal; for callers that need normalized data.
    pub fn normalized_normals(&self) -> Option<Vec<Vector3>> {
        let normal = self.attribute(NORMAL)?;
        Some(
            (0..normal.count())
                .filter_map(|i| Vector3::from_slice(&normal.get(i)))
                .map(|n| if n.magnitude2() > 0.0 { n.normalize() } else { n })
                .collect(),
        )
    }
}
