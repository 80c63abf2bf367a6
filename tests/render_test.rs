use scene_ngin::{
    Node,
    data_structures::{color::Color, light::LightKind, material::UniformValue, primitives},
    data_structures::material::Material,
    error::RenderError,
    flow::EditorState,
    math::{Vector3, make_translation},
    render::{Capability, LIGHT_COLOR, LIGHT_TYPE, ProgramId, Renderer, WORLD_TRANSFORM},
};

use crate::common::test_utils::{Call, RecordingBackend, basic_mesh, camera, init_logger, lit_group, triangle_mesh};

mod common;

#[test]
fn programs_are_cached_and_switches_elided() {
    init_logger();
    let root = lit_group(vec![
        basic_mesh("red", Color::RED),
        basic_mesh("green", Color::GREEN),
        triangle_mesh("lit"),
        basic_mesh("blue", Color::BLUE),
    ]);
    let mut renderer = Renderer::new(RecordingBackend::new());

    renderer.render(&root, &camera()).unwrap();

    let backend = renderer.backend();
    assert_eq!(renderer.program_count(), 2);
    assert_eq!(backend.count(|c| matches!(c, Call::CreateProgram(_))), 2);
    let switches: Vec<_> = backend
        .calls
        .iter()
        .filter_map(|c| match c {
            Call::UseProgram(p) => Some(*p),
            _ => None,
        })
        .collect();
    assert_eq!(switches, vec![ProgramId(0), ProgramId(1), ProgramId(0)]);
    assert_eq!(backend.draws(), vec![&Call::DrawArrays(3); 4]);
}

#[test]
fn cache_survives_across_frames() {
    let root = lit_group(vec![basic_mesh("a", Color::WHITE), basic_mesh("b", Color::BLACK)]);
    let mut renderer = Renderer::new(RecordingBackend::new());

    renderer.render(&root, &camera()).unwrap();
    renderer.render(&root, &camera()).unwrap();

    let backend = renderer.backend();
    assert_eq!(backend.count(|c| matches!(c, Call::CreateProgram(_))), 1);
    assert_eq!(backend.count(|c| matches!(c, Call::UseProgram(_))), 1);
    assert_eq!(backend.count(|c| *c == Call::Clear), 2);
    assert_eq!(renderer.current_program(), Some(ProgramId(0)));
}

#[test]
fn every_frame_enables_depth_and_culling() {
    let mut renderer = Renderer::new(RecordingBackend::new());
    renderer.render(&lit_group(vec![]), &camera()).unwrap();

    assert_eq!(
        renderer.backend().calls,
        vec![
            Call::Clear,
            Call::Enable(Capability::DepthTest),
            Call::Enable(Capability::CullFace)
        ]
    );
}

#[test]
fn missing_light_draws_nothing() {
    let mut root = Node::group("root");
    root.add(triangle_mesh("unlit"));
    let mut renderer = Renderer::new(RecordingBackend::new());

    let err = renderer.render(&root, &camera()).unwrap_err();

    assert!(matches!(err, RenderError::NoLight));
    assert_eq!(err.to_string(), "No light found in the scene");
    assert!(renderer.backend().draws().is_empty());
}

#[test]
fn light_must_be_a_direct_child() {
    let root = Node::group("root").with_child(lit_group(vec![triangle_mesh("deep")]));
    let mut renderer = Renderer::new(RecordingBackend::new());
    assert!(matches!(renderer.render(&root, &camera()), Err(RenderError::NoLight)));
}

#[test]
fn camera_argument_must_be_a_camera() {
    let mesh = triangle_mesh("impostor");
    let id = mesh.id();
    let mut renderer = Renderer::new(RecordingBackend::new());
    assert!(matches!(
        renderer.render(&lit_group(vec![]), &mesh),
        Err(RenderError::NotACamera(got)) if got == id
    ));
}

#[test]
fn disabled_subtrees_are_skipped() {
    let mut hidden = Node::group("hidden").with_child(triangle_mesh("inside"));
    hidden.set_enabled(false);
    let root = lit_group(vec![hidden, triangle_mesh("visible")]);
    let mut renderer = Renderer::new(RecordingBackend::new());

    renderer.render(&root, &camera()).unwrap();

    assert_eq!(renderer.backend().draws().len(), 1);
}

#[test]
fn indexed_geometry_draws_elements() {
    let sphere = Node::mesh(primitives::sphere(1.0, 8, 4), Material::default_phong());
    let root = lit_group(vec![sphere, triangle_mesh("flat")]);
    let mut renderer = Renderer::new(RecordingBackend::new());

    renderer.render(&root, &camera()).unwrap();

    assert_eq!(
        renderer.backend().draws(),
        vec![&Call::DrawElements(8 * 4 * 6), &Call::DrawArrays(3)]
    );
}

#[test]
fn world_transform_accumulates_down_the_tree() {
    let inner = triangle_mesh("inner").with_position(Vector3::new(1.0, 0.0, 0.0));
    let outer = Node::group("outer")
        .with_position(Vector3::new(0.0, 2.0, 0.0))
        .with_child(inner);
    let mut renderer = Renderer::new(RecordingBackend::new());

    renderer.render(&lit_group(vec![outer]), &camera()).unwrap();

    let expected = UniformValue::Mat4(make_translation(1.0, 2.0, 0.0).into());
    assert_eq!(renderer.backend().uniform(WORLD_TRANSFORM), Some(&expected));
}

#[test]
fn frame_uniforms_describe_the_light() {
    let mut renderer = Renderer::new(RecordingBackend::new());
    renderer
        .render(&lit_group(vec![triangle_mesh("t")]), &camera())
        .unwrap();

    let backend = renderer.backend();
    assert_eq!(backend.uniform(LIGHT_TYPE), Some(&UniformValue::Int(LightKind::Directional.shader_code())));
    assert_eq!(backend.uniform(LIGHT_COLOR), Some(&UniformValue::Vec4([1.0, 1.0, 1.0, 1.0])));
}

#[test]
fn program_creation_failure_is_reported() {
    let mut backend = RecordingBackend::new();
    backend.fail_programs = true;
    let mut renderer = Renderer::new(backend);

    let err = renderer
        .render(&lit_group(vec![triangle_mesh("t")]), &camera())
        .unwrap_err();

    assert!(matches!(err, RenderError::ProgramCreation { .. }));
    assert_eq!(renderer.program_count(), 0);
}

#[test]
fn editor_state_renders_its_scene() {
    let mut state = EditorState::with_default_scene(16.0 / 9.0);
    state.add_root(triangle_mesh("cube stand-in"));
    let mut renderer = Renderer::new(RecordingBackend::new());

    state.render(&mut renderer).unwrap();

    assert_eq!(renderer.backend().draws(), vec![&Call::DrawArrays(3)]);
}
