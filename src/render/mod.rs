//! Scene rendering on top of an immediate-mode GPU surface.
//!
//! [`Renderer`] walks a node tree once per frame and turns every enabled
//! mesh into calls on a [`Backend`]: program selection, attribute and
//! uniform binding, then one draw. Programs are created once per
//! [`ProgramKey`] and kept for the renderer's lifetime; a program switch is
//! only issued when two consecutive meshes differ.
//!
//! # Key types
//!
//! - [`Backend`] is the GPU surface the renderer drives
//! - [`Renderer`] owns a backend together with the program cache
//! - [`WgpuBackend`](wgpu_backend::WgpuBackend) implements `Backend` with wgpu

pub mod wgpu_backend;

use std::collections::HashMap;

use crate::data_structures::buffer::BufferAttribute;
use crate::data_structures::light::LightKind;
use crate::data_structures::material::{Material, ProgramKey, UniformValue};
use crate::data_structures::scene_graph::{Mesh, Node, NodeId};
use crate::error::RenderError;
use crate::math::{Matrix4, Vector3, VectorExt, extract_position};

pub use wgpu_backend::WgpuBackend;

pub const CAMERA_POSITION: &str = "cameraPosition";
pub const PROJECTION_MATRIX: &str = "projectionMatrix";
pub const LIGHT_POSITION: &str = "lightPosition";
pub const LIGHT_COLOR: &str = "lightColor";
pub const LIGHT_INTENSITY: &str = "lightIntensity";
pub const LIGHT_TYPE: &str = "lightType";
pub const WORLD_TRANSFORM: &str = "worldTransform";

/// Fixed-function state toggled before drawing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    DepthTest,
    CullFace,
}

/// Handle to a program created by a [`Backend`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramId(pub usize);

/**
Immediate-mode GPU surface.

Attribute and uniform bindings stay in effect until overwritten, the way a
GL context behaves. Names a program does not know are ignored.
*/
pub trait Backend {
    fn clear(&mut self);
    fn enable(&mut self, capability: Capability);
    fn create_program(&mut self, label: &str, vertex: &str, fragment: &str) -> Result<ProgramId, RenderError>;
    fn use_program(&mut self, program: ProgramId);
    fn set_attribute(&mut self, name: &str, attribute: &BufferAttribute);
    fn set_uniform(&mut self, name: &str, value: &UniformValue);
    /// Draws `count` vertices of the bound attributes as a triangle list.
    fn draw_arrays(&mut self, count: usize);
    /// Draws the bound attributes indexed by `indices`.
    fn draw_elements(&mut self, indices: &BufferAttribute);
}

pub struct Renderer<B: Backend> {
    backend: B,
    programs: HashMap<ProgramKey, ProgramId>,
    current: Option<ProgramId>,
}

impl<B: Backend> Renderer<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            programs: HashMap::new(),
            current: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Number of programs created so far.
    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    pub fn current_program(&self) -> Option<ProgramId> {
        self.current
    }

    /// Returns the program for `material`, creating it on first use.
    pub fn upsert_program(&mut self, material: &Material) -> Result<ProgramId, RenderError> {
        let key = material.program_key();
        if let Some(program) = self.programs.get(&key) {
            return Ok(*program);
        }
        let shader = material.shader();
        let program = self
            .backend
            .create_program(&shader.label, &shader.vertex, &shader.fragment)?;
        log::debug!("created program {program:?} for shader `{}`", shader.label);
        self.programs.insert(key, program);
        Ok(program)
    }

    fn switch_program(&mut self, program: ProgramId) {
        if self.current != Some(program) {
            self.backend.use_program(program);
            self.current = Some(program);
        }
    }

    /**
    Draws the tree under `root` as seen from `camera`.

    The first light among `root`'s direct children lights the frame; without
    one nothing is drawn and [`RenderError::NoLight`] is returned. `camera`
    may live inside the tree, in which case its world matrix is taken from
    there, or outside it, in which case its own transform is used.
    */
    pub fn render(&mut self, root: &Node, camera: &Node) -> Result<(), RenderError> {
        self.backend.clear();
        self.backend.enable(Capability::DepthTest);
        self.backend.enable(Capability::CullFace);

        let cam = camera.as_camera().ok_or(RenderError::NotACamera(camera.id()))?;
        let light_node = root
            .children()
            .iter()
            .find(|c| c.is_light())
            .ok_or(RenderError::NoLight)?;
        let Some(light) = light_node.as_light() else {
            return Err(RenderError::NoLight);
        };

        let camera_world = resolve_world(root, camera.id()).unwrap_or_else(|| camera.transform().to_matrix());
        let light_position = match light.kind {
            LightKind::Directional => Vector3::new(400.0, 400.0, 400.0).normalize_or_keep(),
            LightKind::Point => {
                let world = resolve_world(root, light_node.id()).unwrap_or_else(|| light_node.world_transform());
                extract_position(&world)
            }
        };

        let frame = [
            (CAMERA_POSITION, UniformValue::Vec3(extract_position(&camera_world).into())),
            (PROJECTION_MATRIX, UniformValue::Mat4(cam.view_projection(&camera_world).into())),
            (LIGHT_POSITION, UniformValue::Vec3(light_position.into())),
            (LIGHT_COLOR, UniformValue::Vec4(light.color.to_array())),
            (LIGHT_INTENSITY, UniformValue::Float(light.intensity)),
            (LIGHT_TYPE, UniformValue::Int(light.kind.shader_code())),
        ];
        self.render_node(root, None, &frame)
    }

    fn render_node(&mut self, node: &Node, parent_world: Option<&Matrix4>, frame: &[(&str, UniformValue)]) -> Result<(), RenderError> {
        if !node.enabled() {
            return Ok(());
        }
        let local = node.transform().to_matrix();
        let world = match parent_world {
            Some(parent) => *parent * local,
            None => local,
        };
        if let Some(mesh) = node.as_mesh() {
            self.draw_mesh(mesh, &world, frame)?;
        }
        for child in node.children() {
            self.render_node(child, Some(&world), frame)?;
        }
        Ok(())
    }

    fn draw_mesh(&mut self, mesh: &Mesh, world: &Matrix4, frame: &[(&str, UniformValue)]) -> Result<(), RenderError> {
        let program = self.upsert_program(&mesh.material)?;
        self.switch_program(program);

        for (name, attribute) in mesh.geometry.attributes() {
            self.backend.set_attribute(name, attribute);
        }
        for (name, value) in mesh.material.uniforms() {
            self.backend.set_uniform(name, value);
        }
        for (name, value) in frame {
            self.backend.set_uniform(name, value);
        }
        self.backend.set_uniform(WORLD_TRANSFORM, &UniformValue::Mat4((*world).into()));

        match mesh.geometry.indices() {
            Some(indices) => self.backend.draw_elements(indices),
            None => self.backend.draw_arrays(mesh.geometry.vertex_count()),
        }
        Ok(())
    }
}

/// World matrix of `id` recomputed from the local transforms along the path
/// from `root`. `None` when `id` is not in the tree.
pub fn resolve_world(root: &Node, id: NodeId) -> Option<Matrix4> {
    let path = root.path_to(id)?;
    let mut node = root;
    let mut world = root.transform().to_matrix();
    for i in path {
        node = node.children().get(i)?;
        world = world * node.transform().to_matrix();
    }
    Some(world)
}
