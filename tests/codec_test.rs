use scene_ngin::{
    Node,
    codec::{ARRAY_BUFFER, Document, ELEMENT_ARRAY_BUFFER, ExportedModel, ImportOptions, export_model, import_document, import_model, import::SCALE_DOWN_FACTOR},
    data_structures::{
        buffer::{BufferAttribute, BufferData, ComponentType},
        geometry::{BufferGeometry, NORMAL, POSITION},
        material::Material,
        primitives,
    },
    error::CodecError,
    math::{Euler, Vector3},
};

use crate::common::test_utils::{init_logger, triangle_mesh};

mod common;

fn triangle_model() -> Node {
    Node::group("Model").with_child(
        triangle_mesh("Triangle")
            .with_position(Vector3::new(1.0, 2.0, 3.0))
            .with_rotation(Euler::new(0.0, 0.5, 0.0)),
    )
}

/// Two meshes, the first with a three byte index list, the second with
/// signed indices.
fn awkward_model() -> Node {
    let positions = || BufferAttribute::from_f32(vec![0.0, 1.0, 0.0, -1.0, -1.0, 0.0, 1.0, -1.0, 0.0], 3);
    let bytes = BufferGeometry::new()
        .with_attribute(POSITION, positions())
        .with_indices(BufferAttribute::new(BufferData::U8(vec![0, 1, 2]), 1));
    let signed = BufferGeometry::new()
        .with_attribute(POSITION, positions())
        .with_indices(BufferAttribute::new(BufferData::I32(vec![2, 1, 0]), 1));
    Node::group("Awkward")
        .with_child(Node::mesh(bytes, Material::default_phong()).with_name("bytes"))
        .with_child(Node::mesh(signed, Material::default_phong()).with_name("signed"))
}

#[test]
fn triangle_round_trip() {
    init_logger();
    let model = export_model(&triangle_model()).unwrap();
    let json = model.to_json().unwrap();

    let nodes = import_model(&json, Some(&model.bin), ImportOptions::default()).unwrap();

    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0].name(), "Model");
    assert_eq!(nodes[0].children().len(), 1);
    let triangle = &nodes[1];
    assert_eq!(triangle.name(), "Triangle");
    assert_eq!(triangle.position(), Vector3::new(1.0, 2.0, 3.0));
    assert!((triangle.rotation().y - 0.5).abs() < 1e-5);

    let geometry = &triangle.as_mesh().unwrap().geometry;
    assert_eq!(geometry.attribute(POSITION), primitives::triangle().attribute(POSITION));
    let normals = geometry.attribute(NORMAL).unwrap();
    for i in 0..3 {
        assert_eq!(normals.get(i), vec![0.0, 0.0, 1.0]);
    }
}

#[test]
fn embedded_buffer_is_used_without_a_bin_file() {
    let model = export_model(&triangle_model()).unwrap();
    let from_uri = import_model(&model.to_json().unwrap(), None, ImportOptions::default()).unwrap();
    let from_bin = import_model(&model.to_json().unwrap(), Some(&model.bin), ImportOptions::default()).unwrap();

    assert_eq!(
        from_uri[1].as_mesh().unwrap().geometry,
        from_bin[1].as_mesh().unwrap().geometry
    );
}

#[test]
fn missing_buffer_decodes_to_zeros() {
    let model = export_model(&triangle_model()).unwrap();
    let mut document = model.document.clone();
    document.buffers[0].uri = None;

    let nodes = import_document(&document, None, ImportOptions::default()).unwrap();

    let positions = nodes[1].as_mesh().unwrap().geometry.attribute(POSITION).unwrap();
    assert!(positions.data().iter_f32().all(|v| v == 0.0));
    assert_eq!(positions.count(), 3);
}

#[test]
fn empty_attributes_survive_a_round_trip() {
    init_logger();
    let empty = BufferGeometry::new()
        .with_attribute(POSITION, BufferAttribute::from_f32(vec![], 3))
        .with_attribute(NORMAL, BufferAttribute::from_f32(vec![], 3));
    let model = Node::group("Model")
        .with_child(triangle_mesh("Triangle"))
        .with_child(Node::mesh(empty, Material::default_phong()).with_name("empty"));

    let exported = export_model(&model).unwrap();
    let json = exported.to_json().unwrap();
    assert!(!json.contains("null"), "{json}");
    let bounded = exported.document.accessors.iter().filter(|a| a.count > 0);
    assert!(bounded.clone().all(|a| a.min.is_some() && a.max.is_some()));
    assert!(exported.document.accessors.iter().filter(|a| a.count == 0).all(|a| a.min.is_none()));

    for blob in [Some(&exported.bin[..]), None] {
        let nodes = import_model(&json, blob, ImportOptions::default()).unwrap();
        let empty = nodes.iter().find(|n| n.name() == "empty").unwrap();
        let geometry = &empty.as_mesh().unwrap().geometry;
        assert_eq!(geometry.attribute(POSITION).unwrap().count(), 0);
        assert_eq!(geometry.attribute(NORMAL).unwrap().count(), 0);
    }
}

#[test]
fn export_layout_is_aligned_and_targeted() {
    let model = export_model(&awkward_model()).unwrap();
    let document = &model.document;

    assert_eq!(document.scenes[0].nodes, vec![0]);
    assert_eq!(document.nodes[0].children, Some(vec![1, 2]));
    for view in &document.buffer_views {
        assert_eq!(view.byte_offset.unwrap_or(0) % 4, 0);
    }

    let primitive = &document.meshes[0].primitives[0];
    let position = &document.accessors[primitive.attributes["POSITION"]];
    let indices = &document.accessors[primitive.indices.unwrap()];
    assert_eq!(document.buffer_views[position.buffer_view.unwrap()].target, Some(ARRAY_BUFFER));
    assert_eq!(document.buffer_views[indices.buffer_view.unwrap()].target, Some(ELEMENT_ARRAY_BUFFER));
    assert_eq!(position.kind, "VEC3");
    assert_eq!(position.min, Some(vec![-1.0, -1.0, 0.0]));
    assert_eq!(position.max, Some(vec![1.0, 1.0, 0.0]));
    assert_eq!(indices.component_type, ComponentType::UnsignedByte.code());

    let signed = &document.meshes[1].primitives[0];
    let signed_indices = &document.accessors[signed.indices.unwrap()];
    assert_eq!(signed_indices.component_type, ComponentType::UnsignedShort.code());

    assert_eq!(document.buffers.len(), 1);
    assert_eq!(document.buffers[0].byte_length, model.bin.len());
    assert!(
        document.buffers[0]
            .uri
            .as_deref()
            .unwrap()
            .starts_with("data:application/octet-stream;base64,")
    );
}

#[test]
fn export_is_readable_by_gltf() {
    let model = export_model(&awkward_model()).unwrap();
    let json = model.to_json_pretty().unwrap();

    let gltf = gltf::Gltf::from_slice(json.as_bytes()).expect("exported document validates");

    assert_eq!(gltf.meshes().count(), 2);
    assert_eq!(gltf.nodes().count(), 3);
    let scene = gltf.scenes().next().unwrap();
    let root = scene.nodes().next().unwrap();
    assert_eq!(root.name(), Some("Awkward"));
    assert_eq!(root.children().count(), 2);
    for mesh in gltf.meshes() {
        let primitive = mesh.primitives().next().unwrap();
        assert!(primitive.get(&gltf::Semantic::Positions).is_some());
        assert!(primitive.indices().is_some());
    }
    assert_eq!(gltf.buffers().next().unwrap().length(), model.bin.len());
}

#[test]
fn short_buffer_is_a_decode_error() {
    let model = export_model(&triangle_model()).unwrap();
    let json = model.to_json().unwrap();

    let err = import_model(&json, Some(&model.bin[..10]), ImportOptions::default()).unwrap_err();

    assert!(matches!(err, CodecError::DecodeBounds { len: 10, .. }), "{err}");
}

#[test]
fn unknown_component_type_is_rejected() {
    let model = export_model(&triangle_model()).unwrap();
    let mut document: Document = serde_json::from_str(&model.to_json().unwrap()).unwrap();
    document.accessors[0].component_type = 9999;

    let err = import_document(&document, Some(&model.bin), ImportOptions::default()).unwrap_err();

    assert!(matches!(err, CodecError::UnknownComponentType(9999)));
}

#[test]
fn mesh_without_positions_is_rejected() {
    let model = export_model(&triangle_model()).unwrap();
    let mut document = model.document.clone();
    document.meshes[0].primitives[0].attributes.remove("POSITION");

    let err = import_document(&document, Some(&model.bin), ImportOptions::default()).unwrap_err();

    assert!(matches!(err, CodecError::MissingAttribute { mesh: 0, attribute: "POSITION" }));
}

#[test]
fn scale_down_only_touches_meshes() {
    let model = export_model(&triangle_model()).unwrap();
    let nodes = import_model(&model.to_json().unwrap(), Some(&model.bin), ImportOptions { scale_down: true }).unwrap();

    assert_eq!(nodes[0].scale(), Vector3::new(1.0, 1.0, 1.0));
    assert_eq!(
        nodes[1].scale(),
        Vector3::new(SCALE_DOWN_FACTOR, SCALE_DOWN_FACTOR, SCALE_DOWN_FACTOR)
    );
}

#[test]
fn malformed_json_is_a_codec_error() {
    assert!(matches!(
        import_model("{\"asset\":", None, ImportOptions::default()),
        Err(CodecError::Json(_))
    ));
}

#[test]
fn file_names_follow_the_root() {
    assert_eq!(
        ExportedModel::file_names("Robot Arm"),
        ("Robot_Arm.gltf".to_string(), "Robot_Arm.bin".to_string())
    );
}
