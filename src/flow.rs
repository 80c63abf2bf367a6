//! Editor state and the application event loop.
//!
//! [`EditorState`] holds the current scene version, the active camera and an
//! optional animation. The winit [`App`] drives it: every redraw advances the
//! animation, lets each [`EditorFlow`] update, renders the scene and presents
//! the frame.
//!
//! # Lifecycle
//!
//! 1. `on_init()` once the GPU context exists
//! 2. `on_window_events()` for each winit window event
//! 3. `on_update()` every frame, after the animation advanced
//! 4. `on_tick()` every `tick_duration_millis`
//! 5. render and present

use std::{fmt::Debug, pin::Pin, sync::Arc};

use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    animation::{AnimationClip, AnimationRunner, runner::pose_node},
    codec::ImportOptions,
    context::{Context, Settings},
    data_structures::{
        color::Color,
        light::LightKind,
        scene::{NodeLookup, Scene},
        scene_graph::{Node, NodeId},
    },
    error::{RenderError, SceneError},
    math::Vector3,
    render::{Backend, Renderer},
    resources,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub type StateMutation = Box<dyn FnOnce(&mut EditorState)>;

///
/// Output of every lifecycle hook.
///
/// `Out::FutFn` resolves futures into mutations of the [`EditorState`]. Natively they are awaited on
/// the spot; on the web they are spawned and applied once the event loop receives them.
///
/// `Out::Configure` changes the [`Context`] at runtime, for instance the clear colour.
///
/// `Empty` is the default when nothing needs to happen.
///
pub enum Out {
    FutFn(Vec<Box<dyn Future<Output = StateMutation>>>),
    Configure(Box<dyn FnOnce(&mut Context)>),
    Empty,
}

impl Default for Out {
    fn default() -> Self {
        Self::Empty
    }
}

/// A pluggable piece of editor behaviour.
pub trait EditorFlow {
    /// Called once when the context is ready. The only hook with mutable access to the context.
    fn on_init(&mut self, ctx: &mut Context, state: &mut EditorState) -> Out;

    /// Called every frame with the elapsed time `dt`.
    fn on_update(&mut self, _ctx: &Context, _state: &mut EditorState, _dt: Duration) -> Out {
        Out::Empty
    }

    /// Called every `tick_duration_millis` milliseconds.
    fn on_tick(&mut self, _ctx: &Context, _state: &mut EditorState) -> Out {
        Out::Empty
    }

    fn on_window_events(&mut self, _ctx: &Context, _state: &mut EditorState, _event: &WindowEvent) -> Out {
        Out::Empty
    }
}

impl Debug for dyn EditorFlow + 'static {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EditorFlow")
    }
}

/// The scene being edited plus everything that changes it over time.
#[derive(Debug)]
pub struct EditorState {
    scene: Scene,
    camera: NodeId,
    runner: Option<AnimationRunner>,
    animated: Option<NodeId>,
    lookup: NodeLookup,
}

impl EditorState {
    pub fn new(scene: Scene, camera: NodeId) -> Self {
        Self {
            scene,
            camera,
            runner: None,
            animated: None,
            lookup: NodeLookup::new(),
        }
    }

    /// A perspective "Main Camera" ten units back and a white "Directional Light".
    pub fn with_default_scene(aspect: f32) -> Self {
        let camera = Node::perspective(30.0, aspect, 0.1, 100.0)
            .with_name("Main Camera")
            .with_position(Vector3::new(0.0, 0.0, 10.0));
        let light = Node::light(Color::WHITE, 0.75, LightKind::Directional).with_name("Directional Light");
        let camera_id = camera.id();
        Self::new(Scene::from_roots([camera, light]), camera_id)
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera_id(&self) -> NodeId {
        self.camera
    }

    pub fn set_camera(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.scene.camera(id)?;
        self.camera = id;
        Ok(())
    }

    /// Current version of node `id`, served from the lookup cache when it is still live.
    pub fn node(&mut self, id: NodeId) -> Option<Arc<Node>> {
        self.lookup.get(id, &self.scene)
    }

    pub fn add_root(&mut self, node: Node) {
        self.scene.push_root(node);
    }

    pub fn remove_root(&mut self, id: NodeId) -> Option<Arc<Node>> {
        self.lookup.invalidate(id);
        self.scene.remove_root(id)
    }

    /// Replaces the scene with the version that contains `changed`.
    pub fn apply_change(&mut self, changed: Node) -> Result<(), SceneError> {
        self.scene = self.scene.apply_change(changed)?;
        Ok(())
    }

    /// Follows a surface resize in the active camera.
    pub fn set_aspect(&mut self, aspect: f32) -> Result<(), SceneError> {
        let mut camera = self.scene.camera(self.camera)?.clone();
        let position = camera.position();
        if let Some(cam) = camera.as_camera_mut() {
            let mut projection = cam.projection().clone();
            projection.set_aspect(aspect);
            cam.set_projection(projection, position);
        }
        self.apply_change(camera)
    }

    /// Starts playing `clip` on node `target`.
    ///
    /// Each frame poses the node's current version, so edits made through
    /// [`apply_change`](Self::apply_change) while playing are kept.
    pub fn animate(&mut self, target: NodeId, clip: AnimationClip, fps: f64) -> Result<(), SceneError> {
        let node = self.scene.find(target).ok_or(SceneError::NotFound(target))?.clone();
        let mut runner = AnimationRunner::new(node).with_fps(fps);
        runner.set_clip(clip);
        runner.play();
        self.runner = Some(runner);
        self.animated = Some(target);
        Ok(())
    }

    pub fn stop_animation(&mut self) -> Option<AnimationRunner> {
        self.animated = None;
        self.runner.take()
    }

    pub fn runner(&self) -> Option<&AnimationRunner> {
        self.runner.as_ref()
    }

    pub fn runner_mut(&mut self) -> Option<&mut AnimationRunner> {
        self.runner.as_mut()
    }

    /// Advances the animation by `dt` and folds a re-posed target into the
    /// scene. Returns whether the scene changed.
    pub fn advance(&mut self, dt: Duration) -> Result<bool, SceneError> {
        let Some(runner) = self.runner.as_mut() else {
            return Ok(false);
        };
        if !runner.update(dt.as_secs_f64()) {
            return Ok(false);
        }
        let Some(target) = self.animated else {
            return Ok(false);
        };
        let mut posed = self.scene.find(target).ok_or(SceneError::NotFound(target))?.clone();
        if let Some(path) = runner.current_path() {
            pose_node(&mut posed, path);
        }
        *runner.target_mut() = posed.clone();
        self.apply_change(posed)?;
        Ok(true)
    }

    pub fn render<B: Backend>(&self, renderer: &mut Renderer<B>) -> Result<(), RenderError> {
        let camera = self
            .scene
            .camera(self.camera)
            .map_err(|_| RenderError::NotACamera(self.camera))?;
        renderer.render(&self.scene.render_root(), camera)
    }
}

/// Where to load a model from and where to place its first node.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelSource {
    pub gltf_path: String,
    pub bin_path: Option<String>,
    pub position: Vector3,
    pub scale_down: bool,
    /// Started on the first node once it is in the scene.
    pub animation: Option<AnimationClip>,
}

impl ModelSource {
    pub fn new(gltf_path: impl Into<String>, bin_path: Option<String>) -> Self {
        Self {
            gltf_path: gltf_path.into(),
            bin_path,
            position: Vector3::new(0.0, 0.0, 0.0),
            scale_down: false,
            animation: None,
        }
    }
}

/// Loads models into the scene as soon as the editor is up.
#[derive(Debug, Default)]
pub struct LoadModels {
    pub models: Vec<ModelSource>,
}

impl EditorFlow for LoadModels {
    fn on_init(&mut self, ctx: &mut Context, _state: &mut EditorState) -> Out {
        let settings = ctx.settings.clone();
        let futures = self
            .models
            .drain(..)
            .map(|source| {
                let settings = settings.clone();
                let options = ImportOptions {
                    scale_down: source.scale_down,
                };
                let fut = async move {
                    let loaded = resources::with_retry(
                        settings.retry_attempts,
                        Duration::from_millis(settings.retry_delay_millis),
                        || resources::load_model(&source.gltf_path, source.bin_path.as_deref(), options),
                    )
                    .await;
                    let mutation: StateMutation = Box::new(move |state: &mut EditorState| match loaded {
                        Ok(nodes) => match nodes.into_iter().next() {
                            Some(mut node) => {
                                node.set_position(source.position);
                                let id = node.id();
                                state.add_root(node);
                                if let Some(clip) = source.animation {
                                    if let Err(e) = state.animate(id, clip, settings.animation_fps) {
                                        log::error!("{}: {e}", source.gltf_path);
                                    }
                                }
                            }
                            None => log::warn!("{} contains no nodes", source.gltf_path),
                        },
                        Err(e) => log::error!("{}: {e:#}", source.gltf_path),
                    });
                    mutation
                };
                Box::new(fut) as Box<dyn Future<Output = StateMutation>>
            })
            .collect();
        Out::FutFn(futures)
    }
}

pub(crate) enum FlowEvent {
    Initialized(Context),
    Mut(StateMutation),
    #[allow(dead_code)]
    Exit,
}

impl Debug for FlowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(ctx) => f.debug_tuple("Initialized").field(ctx).finish(),
            Self::Mut(_) => f.write_str("Mut(|&mut EditorState| -> {...})"),
            Self::Exit => f.write_str("Exit"),
        }
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: winit::event_loop::EventLoopProxy<FlowEvent>,
    settings: Settings,
    ctx: Option<Context>,
    state: Option<EditorState>,
    flows: Vec<Box<dyn EditorFlow>>,
    last_time: Instant,
    time_since_tick: Duration,
}

impl App {
    fn new(event_loop: &EventLoop<FlowEvent>, flows: Vec<Box<dyn EditorFlow>>, settings: Settings) -> anyhow::Result<Self> {
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy: event_loop.create_proxy(),
            settings,
            ctx: None,
            state: None,
            flows,
            last_time: Instant::now(),
            time_since_tick: Duration::from_millis(0),
        })
    }

    fn initialized(&mut self, mut ctx: Context) {
        let mut state = EditorState::with_default_scene(ctx.aspect());
        for flow in self.flows.iter_mut() {
            let out = flow.on_init(&mut ctx, &mut state);
            handle_flow_output(
                #[cfg(not(target_arch = "wasm32"))]
                &self.async_runtime,
                &mut state,
                &mut ctx,
                self.proxy.clone(),
                out,
            );
        }
        ctx.window.request_redraw();
        self.ctx = Some(ctx);
        self.state = Some(state);
    }

    fn redraw(&mut self) {
        let (Some(ctx), Some(state)) = (self.ctx.as_mut(), self.state.as_mut()) else {
            return;
        };
        let dt = self.last_time.elapsed();
        self.last_time = Instant::now();
        self.time_since_tick += dt;

        if let Err(e) = state.advance(dt) {
            log::error!("animation step failed: {e}");
        }
        for flow in self.flows.iter_mut() {
            let out = flow.on_update(ctx, state, dt);
            handle_flow_output(
                #[cfg(not(target_arch = "wasm32"))]
                &self.async_runtime,
                state,
                ctx,
                self.proxy.clone(),
                out,
            );
        }
        if self.time_since_tick >= Duration::from_millis(ctx.settings.tick_duration_millis) {
            for flow in self.flows.iter_mut() {
                let out = flow.on_tick(ctx, state);
                handle_flow_output(
                    #[cfg(not(target_arch = "wasm32"))]
                    &self.async_runtime,
                    state,
                    ctx,
                    self.proxy.clone(),
                    out,
                );
            }
            self.time_since_tick = Duration::from_millis(0);
        }

        if let Err(e) = state.render(&mut ctx.renderer) {
            log::error!("Unable to render: {e}");
        }
        match ctx.surface.get_current_texture() {
            Ok(output) => {
                let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
                ctx.renderer.backend_mut().submit(&view);
                output.present();
            }
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = ctx.window.inner_size();
                ctx.resize(size.width, size.height);
            }
            Err(e) => log::error!("Unable to render {}", e),
        }
        ctx.window.request_redraw();
    }
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.ctx.is_some() {
            return;
        }
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("scene-ngin");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let canvas = web_sys::window()
                .and_then(|window| window.document())
                .and_then(|document| document.get_element_by_id(CANVAS_ID));
            match canvas {
                Some(canvas) => window_attributes = window_attributes.with_canvas(Some(canvas.unchecked_into())),
                None => log::warn!("no #{CANVAS_ID} element; winit creates its own canvas"),
            }
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Cannot create the main window: {e}");
                event_loop.exit();
                return;
            }
        };
        let init = Context::new(window, self.settings.clone());

        #[cfg(not(target_arch = "wasm32"))]
        match self.async_runtime.block_on(init) {
            Ok(ctx) => self.initialized(ctx),
            Err(e) => {
                log::error!("App initialization failed. Cannot create the main context: {e:#}");
                event_loop.exit();
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match init.await {
                    Ok(ctx) => {
                        if proxy.send_event(FlowEvent::Initialized(ctx)).is_err() {
                            log::error!("event loop closed before initialization finished");
                        }
                    }
                    Err(e) => log::error!("App initialization failed. Cannot create the main context: {e:#}"),
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            FlowEvent::Initialized(ctx) => {
                let size = ctx.window.inner_size();
                self.initialized(ctx);
                if let Some(ctx) = self.ctx.as_mut() {
                    ctx.resize(size.width, size.height);
                }
            }
            FlowEvent::Mut(mutation) => {
                if let Some(state) = &mut self.state {
                    mutation(state);
                }
            }
            FlowEvent::Exit => event_loop.exit(),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: winit::window::WindowId, event: WindowEvent) {
        let (Some(ctx), Some(state)) = (self.ctx.as_mut(), self.state.as_mut()) else {
            return;
        };
        for flow in self.flows.iter_mut() {
            let out = flow.on_window_events(ctx, state, &event);
            handle_flow_output(
                #[cfg(not(target_arch = "wasm32"))]
                &self.async_runtime,
                state,
                ctx,
                self.proxy.clone(),
                out,
            );
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                ctx.resize(size.width, size.height);
                if let Err(e) = state.set_aspect(ctx.aspect()) {
                    log::warn!("camera did not follow the resize: {e}");
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }
}

fn handle_flow_output(
    #[cfg(not(target_arch = "wasm32"))] async_runtime: &tokio::runtime::Runtime,
    state: &mut EditorState,
    ctx: &mut Context,
    #[allow(unused_variables)] proxy: winit::event_loop::EventLoopProxy<FlowEvent>,
    out: Out,
) {
    match out {
        Out::FutFn(futures) => {
            let pinned: Vec<Pin<Box<dyn Future<Output = StateMutation>>>> = futures.into_iter().map(Pin::from).collect();
            let fut = async move { futures::future::join_all(pinned).await };
            #[cfg(not(target_arch = "wasm32"))]
            {
                let resolved = async_runtime.block_on(fut);
                resolved.into_iter().for_each(|mutation| mutation(state));
            }

            #[cfg(target_arch = "wasm32")]
            {
                let _ = state;
                wasm_bindgen_futures::spawn_local(async move {
                    for mutation in fut.await {
                        if proxy.send_event(FlowEvent::Mut(mutation)).is_err() {
                            log::error!("event loop closed before a state update arrived");
                        }
                    }
                });
            }
        }
        Out::Configure(f) => f(ctx),
        Out::Empty => (),
    }
}

/// Installs `env_logger` natively and `console_log` in the browser.
pub fn init_logger() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            eprintln!("Warning: Could not initialize logger: {}", e);
        }
    }

    #[cfg(target_arch = "wasm32")]
    {
        // a second call finds the logger already installed
        let _ = console_log::init_with_level(log::Level::Info);
    }
}

pub fn run(flows: Vec<Box<dyn EditorFlow>>, settings: Settings) -> anyhow::Result<()> {
    init_logger();

    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, flows, settings)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}

/// Browser entry point: an editor with an empty default scene.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    run(Vec::new(), Settings::default()).map_err(|e| JsValue::from_str(&format!("{e:#}")))
}
