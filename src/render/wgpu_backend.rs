//! [`Backend`] implementation on wgpu.
//!
//! Calls are recorded and replayed in one render pass by
//! [`WgpuBackend::submit`]. Every draw snapshots the bound uniforms into its
//! own uniform buffer, so uniform changes between draws behave like GL.

use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::data_structures::buffer::{BufferAttribute, BufferData};
use crate::data_structures::color::Color;
use crate::data_structures::geometry::{NORMAL, POSITION};
use crate::data_structures::material::UniformValue;
use crate::error::RenderError;
use crate::math::Matrix4;
use crate::pipelines;

use super::{Backend, Capability, ProgramId};

/// Maps GL clip space (z in -1..1) onto wgpu's (z in 0..1).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4 = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Per-draw uniforms, laid out like `SceneUniform` in the WGSL shaders.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniform {
    pub world: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub camera_position: [f32; 3],
    pub light_intensity: f32,
    pub light_position: [f32; 3],
    pub light_type: i32,
    pub light_color: [f32; 4],
    pub color: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub light_coordinates: [f32; 3],
    pub shininess: f32,
}

impl Default for SceneUniform {
    fn default() -> Self {
        let identity: [[f32; 4]; 4] = Matrix4::from_scale(1.0).into();
        Self {
            world: identity,
            projection: identity,
            camera_position: [0.0; 3],
            light_intensity: 1.0,
            light_position: [0.0; 3],
            light_type: 1,
            light_color: [1.0; 4],
            color: [1.0; 4],
            ambient: [1.0; 4],
            diffuse: [1.0; 4],
            specular: [1.0; 4],
            light_coordinates: [0.0; 3],
            shininess: 30.0,
        }
    }
}

impl SceneUniform {
    /// Stores a named uniform. Returns `false` for names or types the
    /// shaders do not declare.
    pub fn set(&mut self, name: &str, value: &UniformValue) -> bool {
        use UniformValue::*;
        match (name, value) {
            ("worldTransform", Mat4(m)) => self.world = (*m).into(),
            ("projectionMatrix", Mat4(m)) => self.projection = (OPENGL_TO_WGPU_MATRIX * Matrix4::from(*m)).into(),
            ("cameraPosition", Vec3(v)) => self.camera_position = (*v).into(),
            ("lightPosition", Vec3(v)) => self.light_position = (*v).into(),
            ("lightCoordinates", Vec3(v)) => self.light_coordinates = (*v).into(),
            ("lightIntensity", Float(f)) => self.light_intensity = *f,
            ("shininess", Float(f)) => self.shininess = *f,
            ("lightType", Int(i)) => self.light_type = *i,
            ("lightColor", Vec4(c)) => self.light_color = *c,
            ("color", Vec4(c)) => self.color = *c,
            ("ambient", Vec4(c)) => self.ambient = *c,
            ("diffuse", Vec4(c)) => self.diffuse = *c,
            ("specular", Vec4(c)) => self.specular = *c,
            _ => return false,
        }
        true
    }
}

struct Program {
    label: String,
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
}

struct IndexData {
    buffer: wgpu::Buffer,
    format: wgpu::IndexFormat,
    count: u32,
}

struct RecordedDraw {
    pipeline: (ProgramId, bool, bool),
    bind_group: wgpu::BindGroup,
    positions: wgpu::Buffer,
    normals: wgpu::Buffer,
    vertex_count: u32,
    indices: Option<IndexData>,
}

pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    format: wgpu::TextureFormat,
    depth: wgpu::TextureView,
    uniform_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    programs: Vec<Program>,
    pipelines: HashMap<(ProgramId, bool, bool), wgpu::RenderPipeline>,
    current: Option<ProgramId>,
    depth_test: bool,
    cull_face: bool,
    clear_color: Color,
    uniform: SceneUniform,
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    draws: Vec<RecordedDraw>,
}

impl WgpuBackend {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, format: wgpu::TextureFormat, size: [u32; 2]) -> Self {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("scene_uniform_layout"),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });
        let depth = pipelines::create_depth_view(&device, size);
        Self {
            device,
            queue,
            format,
            depth,
            uniform_layout,
            pipeline_layout,
            programs: Vec::new(),
            pipelines: HashMap::new(),
            current: None,
            depth_test: false,
            cull_face: false,
            clear_color: Color::TRANSPARENT,
            uniform: SceneUniform::default(),
            positions: Vec::new(),
            normals: Vec::new(),
            draws: Vec::new(),
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    /// Draws recorded since the last [`clear`](Backend::clear).
    pub fn recorded_draws(&self) -> usize {
        self.draws.len()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.depth = pipelines::create_depth_view(&self.device, [width, height]);
    }

    fn pipeline_key(&mut self) -> Option<(ProgramId, bool, bool)> {
        let program = self.current?;
        let key = (program, self.depth_test, self.cull_face);
        if !self.pipelines.contains_key(&key) {
            let Program { label, vertex, fragment } = self.programs.get(program.0)?;
            let pipeline = pipelines::mk_scene_pipeline(
                &self.device,
                &self.pipeline_layout,
                label,
                self.format,
                vertex,
                fragment,
                self.depth_test,
                self.cull_face,
            );
            self.pipelines.insert(key, pipeline);
        }
        Some(key)
    }

    fn record(&mut self, vertex_count: u32, indices: Option<IndexData>) {
        let Some(pipeline) = self.pipeline_key() else {
            log::warn!("draw without a program is skipped");
            return;
        };
        let vertices = self.positions.len();
        let mut normals = self.normals.clone();
        normals.resize(vertices, [0.0; 3]);

        let uniform_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Uniform Buffer"),
            contents: bytemuck::cast_slice(&[self.uniform]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("scene_uniform_bind_group"),
        });
        let positions = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Position Buffer"),
            contents: bytemuck::cast_slice(&self.positions),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let normals = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Normal Buffer"),
            contents: bytemuck::cast_slice(&normals),
            usage: wgpu::BufferUsages::VERTEX,
        });
        self.draws.push(RecordedDraw {
            pipeline,
            bind_group,
            positions,
            normals,
            vertex_count,
            indices,
        });
    }

    /// Encodes every recorded draw into one pass over `view` and submits it.
    pub fn submit(&mut self, view: &wgpu::TextureView) {
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Scene Encoder"),
        });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            for draw in &self.draws {
                let Some(pipeline) = self.pipelines.get(&draw.pipeline) else {
                    continue;
                };
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, &draw.bind_group, &[]);
                render_pass.set_vertex_buffer(0, draw.positions.slice(..));
                render_pass.set_vertex_buffer(1, draw.normals.slice(..));
                match &draw.indices {
                    Some(indices) => {
                        render_pass.set_index_buffer(indices.buffer.slice(..), indices.format);
                        render_pass.draw_indexed(0..indices.count, 0, 0..1);
                    }
                    None => render_pass.draw(0..draw.vertex_count, 0..1),
                }
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

fn vec3_elements(attribute: &BufferAttribute) -> Vec<[f32; 3]> {
    (0..attribute.count())
        .map(|i| {
            let v = attribute.get(i);
            [
                v.first().copied().unwrap_or(0.0),
                v.get(1).copied().unwrap_or(0.0),
                v.get(2).copied().unwrap_or(0.0),
            ]
        })
        .collect()
}

impl Backend for WgpuBackend {
    fn clear(&mut self) {
        self.draws.clear();
    }

    fn enable(&mut self, capability: Capability) {
        match capability {
            Capability::DepthTest => self.depth_test = true,
            Capability::CullFace => self.cull_face = true,
        }
    }

    fn create_program(&mut self, label: &str, vertex: &str, fragment: &str) -> Result<ProgramId, RenderError> {
        for (stage, source, entry) in [("vertex", vertex, "fn vs_main"), ("fragment", fragment, "fn fs_main")] {
            if !source.contains(entry) {
                return Err(RenderError::ProgramCreation {
                    label: label.to_string(),
                    reason: format!("{stage} source has no `{}` entry point", &entry[3..]),
                });
            }
        }
        let vertex_module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(vertex.to_string().into()),
        });
        let fragment_module = if fragment == vertex {
            vertex_module.clone()
        } else {
            self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(fragment.to_string().into()),
            })
        };
        self.programs.push(Program {
            label: label.to_string(),
            vertex: vertex_module,
            fragment: fragment_module,
        });
        Ok(ProgramId(self.programs.len() - 1))
    }

    fn use_program(&mut self, program: ProgramId) {
        self.current = Some(program);
    }

    fn set_attribute(&mut self, name: &str, attribute: &BufferAttribute) {
        match name {
            POSITION => self.positions = vec3_elements(attribute),
            NORMAL => self.normals = vec3_elements(attribute),
            other => log::trace!("attribute `{other}` has no vertex slot"),
        }
    }

    fn set_uniform(&mut self, name: &str, value: &UniformValue) {
        if !self.uniform.set(name, value) {
            log::trace!("uniform `{name}` ignored");
        }
    }

    fn draw_arrays(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        self.record(count as u32, None);
    }

    fn draw_elements(&mut self, indices: &BufferAttribute) {
        let (contents, format): (Vec<u8>, _) = match indices.data() {
            BufferData::U32(values) => (bytemuck::cast_slice(values).to_vec(), wgpu::IndexFormat::Uint32),
            BufferData::U16(values) => (bytemuck::cast_slice(values).to_vec(), wgpu::IndexFormat::Uint16),
            other => {
                let widened: Vec<u16> = other.iter_f32().map(|v| v as u16).collect();
                (bytemuck::cast_slice(&widened).to_vec(), wgpu::IndexFormat::Uint16)
            }
        };
        if indices.is_empty() {
            return;
        }
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: &contents,
            usage: wgpu::BufferUsages::INDEX,
        });
        let count = indices.len() as u32;
        self.record(0, Some(IndexData { buffer, format, count }));
    }
}
