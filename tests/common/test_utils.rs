use scene_ngin::{
    Node,
    data_structures::{
        buffer::BufferAttribute,
        color::Color,
        light::LightKind,
        material::{Material, UniformValue},
        primitives,
    },
    error::RenderError,
    math::Vector3,
    render::{Backend, Capability, ProgramId},
};

/// One call received by [`RecordingBackend`].
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Clear,
    Enable(Capability),
    CreateProgram(String),
    UseProgram(ProgramId),
    SetAttribute(String),
    SetUniform(String, UniformValue),
    DrawArrays(usize),
    DrawElements(usize),
}

/// Backend that draws nothing and remembers every call it was given.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub calls: Vec<Call>,
    programs: usize,
    pub fail_programs: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn draws(&self) -> Vec<&Call> {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::DrawArrays(_) | Call::DrawElements(_)))
            .collect()
    }

    /// Last value bound to uniform `name`.
    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.calls.iter().rev().find_map(|c| match c {
            Call::SetUniform(n, v) if n == name => Some(v),
            _ => None,
        })
    }
}

impl Backend for RecordingBackend {
    fn clear(&mut self) {
        self.calls.push(Call::Clear);
    }

    fn enable(&mut self, capability: Capability) {
        self.calls.push(Call::Enable(capability));
    }

    fn create_program(&mut self, label: &str, _vertex: &str, _fragment: &str) -> Result<ProgramId, RenderError> {
        if self.fail_programs {
            return Err(RenderError::ProgramCreation {
                label: label.to_string(),
                reason: "rejected".into(),
            });
        }
        self.calls.push(Call::CreateProgram(label.to_string()));
        let id = ProgramId(self.programs);
        self.programs += 1;
        Ok(id)
    }

    fn use_program(&mut self, program: ProgramId) {
        self.calls.push(Call::UseProgram(program));
    }

    fn set_attribute(&mut self, name: &str, _attribute: &BufferAttribute) {
        self.calls.push(Call::SetAttribute(name.to_string()));
    }

    fn set_uniform(&mut self, name: &str, value: &UniformValue) {
        self.calls.push(Call::SetUniform(name.to_string(), value.clone()));
    }

    fn draw_arrays(&mut self, count: usize) {
        self.calls.push(Call::DrawArrays(count));
    }

    fn draw_elements(&mut self, indices: &BufferAttribute) {
        self.calls.push(Call::DrawElements(indices.count()));
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn triangle_mesh(name: &str) -> Node {
    Node::mesh(primitives::triangle(), Material::default_phong()).with_name(name)
}

pub fn basic_mesh(name: &str, color: Color) -> Node {
    Node::mesh(primitives::triangle(), Material::basic(color)).with_name(name)
}

pub fn camera() -> Node {
    Node::perspective(30.0, 1.5, 0.1, 100.0)
        .with_name("Main Camera")
        .with_position(Vector3::new(0.0, 0.0, 10.0))
}

pub fn light() -> Node {
    Node::light(Color::WHITE, 0.75, LightKind::Directional).with_name("Directional Light")
}

/// Group with a light and the given meshes as direct children.
pub fn lit_group(meshes: Vec<Node>) -> Node {
    let mut root = Node::group("root");
    root.add(light());
    for mesh in meshes {
        root.add(mesh);
    }
    root
}
