//! wgpu pipeline construction for the scene shaders.
//!
//! `basic.wgsl` and `phong.wgsl` share one uniform block and the same vertex
//! layout, so a single pipeline recipe serves both.

pub mod basic;

pub use basic::{mk_scene_pipeline, vertex_layouts};

/// Standard depth buffer texture format (32-bit float).
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Depth attachment of `size` pixels; zero sizes are bumped to 1.
pub fn create_depth_view(device: &wgpu::Device, size: [u32; 2]) -> wgpu::TextureView {
    let size = wgpu::Extent3d {
        width: size[0].max(1),
        height: size[1].max(1),
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[DEPTH_FORMAT],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
