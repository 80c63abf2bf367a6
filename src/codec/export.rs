use std::collections::VecDeque;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::document::{AccessorDef, BufferDef, BufferViewDef, Document, MeshDef, NodeDef, PrimitiveDef, SceneDef, accessor_type};
use super::{ARRAY_BUFFER, DATA_URI_PREFIX, ELEMENT_ARRAY_BUFFER};
use crate::data_structures::buffer::{BufferAttribute, BufferData, ComponentType};
use crate::data_structures::scene_graph::{Mesh, Node};
use crate::error::CodecError;
use crate::math::{QuaternionExt, VectorExt};

/// A serialized subtree: the JSON document and the bytes of its `.bin` file.
///
/// `buffers[0]` also embeds the bytes as a data URI, so the document loads
/// on its own.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportedModel {
    pub document: Document,
    pub bin: Vec<u8>,
}

impl ExportedModel {
    pub fn to_json(&self) -> Result<String, CodecError> {
        Ok(serde_json::to_string(&self.document)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, CodecError> {
        Ok(serde_json::to_string_pretty(&self.document)?)
    }

    /// `(document, binary)` file names for a model exported from `root_name`.
    pub fn file_names(root_name: &str) -> (String, String) {
        let stem: String = root_name
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .collect();
        let stem = if stem.is_empty() { "model".to_string() } else { stem };
        (format!("{stem}.gltf"), format!("{stem}.bin"))
    }
}

#[derive(Default)]
struct Writer {
    document: Document,
    bin: Vec<u8>,
}

impl Writer {
    fn push_view(&mut self, bytes: &[u8], target: u32) -> usize {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        let view = BufferViewDef {
            buffer: 0,
            byte_offset: Some(self.bin.len()),
            byte_length: bytes.len(),
            byte_stride: None,
            target: Some(target),
        };
        self.bin.extend_from_slice(bytes);
        self.document.buffer_views.push(view);
        self.document.buffer_views.len() - 1
    }

    fn push_accessor(&mut self, name: &str, attribute: &BufferAttribute, target: u32) -> Result<usize, CodecError> {
        let kind = accessor_type(attribute.size()).ok_or_else(|| CodecError::UnsupportedAttributeSize {
            name: name.to_string(),
            size: attribute.size(),
        })?;
        let view = self.push_view(&attribute.to_bytes(), target);
        // an empty attribute has no bounds to report
        let (min, max) = match attribute.count() {
            0 => (None, None),
            _ => {
                let (min, max) = attribute.min_max();
                (Some(min), Some(max))
            }
        };
        self.document.accessors.push(AccessorDef {
            buffer_view: Some(view),
            byte_offset: None,
            component_type: attribute.dtype().code(),
            count: attribute.count(),
            kind: kind.to_string(),
            min,
            max,
        });
        Ok(self.document.accessors.len() - 1)
    }

    fn push_mesh(&mut self, mesh: &Mesh) -> Result<usize, CodecError> {
        let mut primitive = PrimitiveDef::default();
        for (name, attribute) in mesh.geometry.attributes() {
            let accessor = self.push_accessor(name, attribute, ARRAY_BUFFER)?;
            primitive.attributes.insert(name.to_uppercase(), accessor);
        }
        if let Some(indices) = mesh.geometry.indices() {
            let indices = index_attribute(indices);
            primitive.indices = Some(self.push_accessor("indices", &indices, ELEMENT_ARRAY_BUFFER)?);
        }
        self.document.meshes.push(MeshDef {
            primitives: vec![primitive],
        });
        Ok(self.document.meshes.len() - 1)
    }
}

/// Index lists must be unsigned; anything else is narrowed to u16.
fn index_attribute(indices: &BufferAttribute) -> BufferAttribute {
    match indices.dtype() {
        ComponentType::UnsignedByte | ComponentType::UnsignedShort | ComponentType::UnsignedInt => indices.clone(),
        other => {
            log::warn!("index list of type {other:?} exported as unsigned short");
            let values = indices.data().iter_f32().map(|v| v as u16).collect();
            BufferAttribute::new(BufferData::U16(values), indices.size())
        }
    }
}

fn node_def(node: &Node) -> NodeDef {
    NodeDef {
        name: Some(node.name().to_string()),
        translation: Some(node.position().to_array()),
        rotation: Some(node.quaternion().to_xyzw()),
        scale: Some(node.scale().to_array()),
        children: None,
        mesh: None,
    }
}

/**
Serializes the subtree under `root`.

Nodes are numbered breadth-first. Every mesh becomes one primitive whose
attributes are stored as accessors over 4-byte aligned views of a single
buffer; attribute names are upper-cased on the way out.
*/
pub fn export_model(root: &Node) -> Result<ExportedModel, CodecError> {
    let mut writer = Writer::default();
    let mut queue: VecDeque<(&Node, Option<usize>)> = VecDeque::new();
    queue.push_back((root, None));

    let mut root_index = 0;
    while let Some((node, parent)) = queue.pop_front() {
        let index = writer.document.nodes.len();
        let mut def = node_def(node);
        if let Some(mesh) = node.as_mesh() {
            def.mesh = Some(writer.push_mesh(mesh)?);
        }
        writer.document.nodes.push(def);

        match parent {
            Some(p) => writer.document.nodes[p]
                .children
                .get_or_insert_with(Vec::new)
                .push(index),
            None => root_index = index,
        }
        for child in node.children() {
            queue.push_back((child.as_ref(), Some(index)));
        }
    }

    writer.document.scenes.push(SceneDef { nodes: vec![root_index] });
    move_root_first(&mut writer.document, root_index);

    let Writer { mut document, bin } = writer;
    document.buffers.push(BufferDef {
        byte_length: bin.len(),
        uri: Some(format!("{DATA_URI_PREFIX}{}", STANDARD.encode(&bin))),
    });
    log::debug!(
        "exported {} nodes, {} meshes, {} bytes of buffer data",
        document.nodes.len(),
        document.meshes.len(),
        bin.len()
    );
    Ok(ExportedModel { document, bin })
}

fn move_root_first(document: &mut Document, root_index: usize) {
    if root_index == 0 {
        return;
    }
    let remap = |i: usize| match i {
        i if i == root_index => 0,
        i if i < root_index => i + 1,
        i => i,
    };
    let root = document.nodes.remove(root_index);
    document.nodes.insert(0, root);
    for node in &mut document.nodes {
        if let Some(children) = node.children.as_mut() {
            children.iter_mut().for_each(|c| *c = remap(*c));
        }
    }
    for scene in &mut document.scenes {
        scene.nodes.iter_mut().for_each(|n| *n = remap(*n));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_replace_whitespace() {
        assert_eq!(
            ExportedModel::file_names("my robot arm"),
            ("my_robot_arm.gltf".to_string(), "my_robot_arm.bin".to_string())
        );
        assert_eq!(ExportedModel::file_names("").0, "model.gltf");
    }

    #[test]
    fn root_moves_to_front() {
        let mut document = Document::default();
        for name in ["a", "b", "root"] {
            document.nodes.push(NodeDef {
                name: Some(name.into()),
                ..Default::default()
            });
        }
        document.nodes[2].children = Some(vec![0, 1]);
        document.scenes.push(SceneDef { nodes: vec![2] });

        move_root_first(&mut document, 2);

        assert_eq!(document.nodes[0].name.as_deref(), Some("root"));
        assert_eq!(document.nodes[0].children, Some(vec![1, 2]));
        assert_eq!(document.scenes[0].nodes, vec![0]);
    }
}
