use std::borrow::Cow;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::DATA_URI_PREFIX;
use super::document::{Document, NodeDef, component_count, component_size};
use crate::data_structures::buffer::{BufferAttribute, BufferData, ComponentType};
use crate::data_structures::geometry::{BufferGeometry, NORMAL, POSITION};
use crate::data_structures::material::Material;
use crate::data_structures::scene_graph::Node;
use crate::error::CodecError;
use crate::math::{Quaternion, QuaternionExt, Vector3};

/// Uniform scale applied to imported meshes when `scale_down` is set.
pub const SCALE_DOWN_FACTOR: f32 = 0.07;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ImportOptions {
    /// Replace every mesh's scale with [`SCALE_DOWN_FACTOR`].
    pub scale_down: bool,
}

/// Parses `document_json` and builds its nodes. See [`import_document`].
pub fn import_model(document_json: &str, bin: Option<&[u8]>, options: ImportOptions) -> Result<Vec<Node>, CodecError> {
    let document: Document = serde_json::from_str(document_json)?;
    import_document(&document, bin, options)
}

/**
Builds every node of `document`, in document order, each parent holding its
children.

Accessor bytes come from `bin` when given, otherwise from a base64 data URI
in `buffers[0]`. With neither, accessors decode to zeros. Any decoding error
aborts the whole import.
*/
pub fn import_document(document: &Document, bin: Option<&[u8]>, options: ImportOptions) -> Result<Vec<Node>, CodecError> {
    let blob = match bin {
        Some(bytes) => Some(Cow::Borrowed(bytes)),
        None => embedded_buffer(document)?.map(Cow::Owned),
    };
    let blob = blob.as_deref();

    let mut flat = Vec::with_capacity(document.nodes.len());
    for (i, def) in document.nodes.iter().enumerate() {
        flat.push(Some(build_node(document, i, def, blob, options)?));
    }
    let ids: Vec<_> = flat.iter().flatten().map(Node::id).collect();

    let mut is_child = vec![false; document.nodes.len()];
    for def in &document.nodes {
        for &c in def.children.iter().flatten() {
            let slot = is_child.get_mut(c).ok_or(CodecError::MissingReference { kind: "node", index: c })?;
            *slot = true;
        }
    }

    let mut roots = Vec::new();
    for i in 0..document.nodes.len() {
        if !is_child[i] {
            let mut root = attach(document, i, &mut flat)?;
            root.compute_world_transform(None, true);
            roots.push(root);
        }
    }

    let nodes = ids
        .iter()
        .filter_map(|&id| roots.iter().find_map(|r| r.find(id)).cloned())
        .collect::<Vec<_>>();
    log::info!("imported {} nodes ({} roots)", nodes.len(), roots.len());
    Ok(nodes)
}

/// Moves node `i` out of `flat` with its subtree attached.
fn attach(document: &Document, i: usize, flat: &mut [Option<Node>]) -> Result<Node, CodecError> {
    let Some(mut node) = flat.get_mut(i).and_then(Option::take) else {
        return Err(CodecError::MissingReference { kind: "node", index: i });
    };
    for &c in document.nodes[i].children.iter().flatten() {
        if flat.get(c).is_some_and(Option::is_none) {
            log::warn!("node {c} is listed under more than one parent; keeping the first");
            continue;
        }
        let child = attach(document, c, flat)?;
        node.add(child);
    }
    Ok(node)
}

fn build_node(document: &Document, index: usize, def: &NodeDef, blob: Option<&[u8]>, options: ImportOptions) -> Result<Node, CodecError> {
    let mut node = match def.mesh {
        Some(mesh) => Node::mesh(build_geometry(document, mesh, blob)?, Material::default_phong()),
        None => Node::group(""),
    };
    node.set_name(def.name.clone().unwrap_or_else(|| format!("Node_{index}")));
    let [x, y, z] = def.translation.unwrap_or([0.0; 3]);
    node.set_position(Vector3::new(x, y, z));
    node.set_quaternion(Quaternion::from_xyzw(def.rotation.unwrap_or([0.0, 0.0, 0.0, 1.0])));
    let [x, y, z] = def.scale.unwrap_or([1.0; 3]);
    node.set_scale(Vector3::new(x, y, z));
    if options.scale_down && node.is_mesh() {
        node.set_scale(Vector3::new(SCALE_DOWN_FACTOR, SCALE_DOWN_FACTOR, SCALE_DOWN_FACTOR));
    }
    Ok(node)
}

fn build_geometry(document: &Document, mesh_index: usize, blob: Option<&[u8]>) -> Result<BufferGeometry, CodecError> {
    let mesh = document
        .meshes
        .get(mesh_index)
        .ok_or(CodecError::MissingReference { kind: "mesh", index: mesh_index })?;
    let primitive = mesh.primitives.first().ok_or(CodecError::MissingAttribute {
        mesh: mesh_index,
        attribute: "POSITION",
    })?;
    if mesh.primitives.len() > 1 {
        log::warn!("mesh {mesh_index} has {} primitives; only the first is read", mesh.primitives.len());
    }

    let position = *primitive.attributes.get("POSITION").ok_or(CodecError::MissingAttribute {
        mesh: mesh_index,
        attribute: "POSITION",
    })?;
    let (data, size) = read_accessor(document, position, blob)?;
    let mut geometry = BufferGeometry::new().with_attribute(POSITION, BufferAttribute::new(data, size));

    if let Some(&indices) = primitive.indices.as_ref() {
        geometry.set_indices(read_indices(document, indices, blob)?);
    }

    match primitive.attributes.get("NORMAL") {
        Some(&normal) => {
            let (data, size) = read_accessor(document, normal, blob)?;
            geometry.set_attribute(NORMAL, BufferAttribute::new(data, size));
        }
        None => {
            log::debug!("mesh {mesh_index} has no normals; computing them");
            geometry.compute_normals();
        }
    }
    Ok(geometry)
}

fn read_indices(document: &Document, index: usize, blob: Option<&[u8]>) -> Result<BufferAttribute, CodecError> {
    let (data, size) = read_accessor(document, index, blob)?;
    let data = match data {
        BufferData::U8(_) | BufferData::U16(_) => data,
        BufferData::U32(values) => {
            log::warn!("accessor {index}: unsigned int indices narrowed to unsigned short");
            BufferData::U16(values.into_iter().map(|v| v as u16).collect())
        }
        other => return Err(CodecError::UnsupportedIndexType(other.component_type().code())),
    };
    Ok(BufferAttribute::new(data, size))
}

/// Decodes accessor `index`, returning its components and element size.
fn read_accessor(document: &Document, index: usize, blob: Option<&[u8]>) -> Result<(BufferData, usize), CodecError> {
    let accessor = document
        .accessors
        .get(index)
        .ok_or(CodecError::MissingReference { kind: "accessor", index })?;
    let size = component_size(accessor.component_type).ok_or(CodecError::UnknownComponentType(accessor.component_type))?;
    let component_type =
        ComponentType::from_code(accessor.component_type).ok_or(CodecError::UnknownComponentType(accessor.component_type))?;
    let n = component_count(&accessor.kind).ok_or_else(|| CodecError::UnknownAccessorType(accessor.kind.clone()))?;
    let view = match accessor.buffer_view {
        Some(v) => Some(
            document
                .buffer_views
                .get(v)
                .ok_or(CodecError::MissingReference { kind: "bufferView", index: v })?,
        ),
        None => None,
    };
    let view_offset = view.and_then(|v| v.byte_offset).unwrap_or(0);
    let accessor_offset = accessor.byte_offset.unwrap_or(0);

    // counts come straight from the document, so every step is checked
    let len = accessor.count.checked_mul(n);
    let byte_len = len.and_then(|l| l.checked_mul(size));
    let start = view_offset.checked_add(accessor_offset);
    let end = start.zip(byte_len).and_then(|(s, b)| s.checked_add(b));
    let out_of_bounds = |len: usize| CodecError::DecodeBounds {
        accessor: index,
        start: start.unwrap_or(usize::MAX),
        end: end.unwrap_or(usize::MAX),
        len,
    };
    let (Some(len), Some(byte_len), Some(start), Some(end)) = (len, byte_len, start, end) else {
        return Err(out_of_bounds(blob.map_or(0, <[u8]>::len)));
    };
    if let Some(view) = view {
        let fits = accessor_offset
            .checked_add(byte_len)
            .is_some_and(|used| used <= view.byte_length);
        if !fits {
            return Err(out_of_bounds(view_offset.saturating_add(view.byte_length)));
        }
    }

    let data = match blob {
        Some(bytes) => bytes
            .get(start..end)
            .and_then(|slice| BufferData::from_le_bytes(component_type, slice, len))
            .ok_or_else(|| out_of_bounds(bytes.len()))?,
        None => BufferData::zeroed(component_type, len),
    };
    Ok((data, n))
}

fn embedded_buffer(document: &Document) -> Result<Option<Vec<u8>>, CodecError> {
    let Some(uri) = document.buffers.first().and_then(|b| b.uri.as_deref()) else {
        return Ok(None);
    };
    match uri.strip_prefix(DATA_URI_PREFIX) {
        Some(encoded) => Ok(Some(STANDARD.decode(encoded)?)),
        None => {
            log::warn!("buffer uri `{uri}` is not an embedded data uri; reading zeros");
            Ok(None)
        }
    }
}
