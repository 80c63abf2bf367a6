use std::sync::Arc;

use anyhow::Context as _;
use winit::window::Window;

use crate::data_structures::color::Color;
use crate::render::{Renderer, WgpuBackend};
use crate::resources::{DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY};

/// Tunables of the editor shell.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub clear_color: Color,
    /// Playback rate of clips started by [`LoadModels`](crate::flow::LoadModels).
    pub animation_fps: f64,
    pub retry_attempts: usize,
    pub retry_delay_millis: u64,
    pub tick_duration_millis: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            clear_color: Color::TRANSPARENT,
            animation_fps: 60.0,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay_millis: DEFAULT_RETRY_DELAY.as_millis() as u64,
            tick_duration_millis: 1000,
        }
    }
}

/// Window, surface and renderer of a running editor.
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub config: wgpu::SurfaceConfiguration,
    pub renderer: Renderer<WgpuBackend>,
    pub settings: Settings,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Context {
    pub async fn new(window: Arc<Window>, settings: Settings) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("creating the window surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable GPU adapter")?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("requesting the GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The shaders output linear colour; an sRGB surface encodes it.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let mut backend = WgpuBackend::new(device, queue, config.format, [config.width, config.height]);
        backend.set_clear_color(settings.clear_color);

        Ok(Self {
            window,
            surface,
            config,
            renderer: Renderer::new(backend),
            settings,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Width over height of the surface.
    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        let backend = self.renderer.backend_mut();
        self.surface.configure(backend.device(), &self.config);
        backend.resize(width, height);
    }
}
