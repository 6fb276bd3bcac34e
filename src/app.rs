use cgmath::Vector3;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{KeyEvent, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes},
};

use crate::gfx::{
    camera::{CameraController, FlyCamera, MoveDir},
    render_engine::RenderEngine,
    transform::TransformArena,
};
use crate::ui::UiManager;

/// Compile-time-ish window settings; there is no CLI surface beyond these.
#[derive(Clone, Debug)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub clear_color: wgpu::Color,
    pub camera_position: Vector3<f32>,
    /// Degrees of camera yaw/pitch per cursor pixel.
    pub look_sensitivity: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "cairn".to_string(),
            width: 1200,
            height: 800,
            clear_color: wgpu::Color {
                r: 0.2,
                g: 0.3,
                b: 0.3,
                a: 1.0,
            },
            camera_position: Vector3::new(0.0, 0.0, 3.0),
            look_sensitivity: 0.05,
        }
    }
}

/// Engine state handed to every user callback.
///
/// GPU objects (shaders, buffers, textures, models) can only be created from
/// the device/queue handles in here, which keeps all GPU work between setup
/// and teardown.
pub struct EngineContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub surface_format: wgpu::TextureFormat,
    pub camera: FlyCamera,
    pub transforms: TransformArena,
    /// Seconds since the previous frame.
    pub dt: f32,
    /// Seconds since setup finished.
    pub elapsed: f32,
    /// Set to true to leave the render loop after the current frame.
    pub should_exit: bool,
}

// User callback slots
pub type SetupFn = Box<dyn FnMut(&mut EngineContext)>;
pub type UpdateFn = Box<dyn FnMut(&mut EngineContext, &mut wgpu::RenderPass<'_>)>;
pub type UiFn = Box<dyn FnMut(&imgui::Ui)>;
pub type TeardownFn = Box<dyn FnMut(&mut EngineContext)>;
pub type KeyFn = Box<dyn FnMut(&mut EngineContext, &KeyEvent)>;
pub type CursorFn = Box<dyn FnMut(&mut EngineContext, f64, f64)>;
pub type ScrollFn = Box<dyn FnMut(&mut EngineContext, f32)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LoopState {
    Setup,
    Running,
    Teardown,
}

/// The windowed application: one window + GPU context, a camera, an imgui
/// overlay, and the user's callbacks.
///
/// Lifecycle: SETUP (window/context creation, setup callback) -> RUNNING
/// (one update + draw per display refresh) -> TEARDOWN (teardown callback,
/// then the context drops). Everything runs on the event-loop thread.
pub struct CairnApp {
    event_loop: Option<EventLoop<()>>,
    state: AppState,
}

struct AppState {
    config: WindowConfig,
    loop_state: LoopState,
    window: Option<Arc<Window>>,
    engine: Option<RenderEngine>,
    ui: Option<UiManager>,
    ctx: Option<EngineContext>,
    controller: CameraController,
    pressed: HashSet<KeyCode>,
    last_frame: Instant,

    setup: Option<SetupFn>,
    update: Option<UpdateFn>,
    ui_callback: Option<UiFn>,
    teardown: Option<TeardownFn>,
    key_hook: Option<KeyFn>,
    cursor_hook: Option<CursorFn>,
    scroll_hook: Option<ScrollFn>,
}

impl CairnApp {
    pub fn new(config: WindowConfig) -> Self {
        let event_loop = EventLoop::new().expect("Failed to create event loop");
        let controller = CameraController::new(config.look_sensitivity);
        Self {
            event_loop: Some(event_loop),
            state: AppState {
                config,
                loop_state: LoopState::Setup,
                window: None,
                engine: None,
                ui: None,
                ctx: None,
                controller,
                pressed: HashSet::new(),
                last_frame: Instant::now(),
                setup: None,
                update: None,
                ui_callback: None,
                teardown: None,
                key_hook: None,
                cursor_hook: None,
                scroll_hook: None,
            },
        }
    }

    /// One-time setup callback, invoked once the GPU context exists.
    pub fn set_setup<F: FnMut(&mut EngineContext) + 'static>(&mut self, f: F) {
        self.state.setup = Some(Box::new(f));
    }

    /// Per-frame callback; update transforms and the camera, then issue draw
    /// calls into the provided scene pass.
    pub fn set_update<F>(&mut self, f: F)
    where
        F: FnMut(&mut EngineContext, &mut wgpu::RenderPass<'_>) + 'static,
    {
        self.state.update = Some(Box::new(f));
    }

    /// Debug-UI callback, run inside the imgui frame.
    pub fn set_ui<F: FnMut(&imgui::Ui) + 'static>(&mut self, f: F) {
        self.state.ui_callback = Some(Box::new(f));
    }

    /// Teardown callback, invoked once when the window closes.
    pub fn set_teardown<F: FnMut(&mut EngineContext) + 'static>(&mut self, f: F) {
        self.state.teardown = Some(Box::new(f));
    }

    /// Raw keyboard hook, after the built-in camera bindings.
    pub fn set_key_hook<F: FnMut(&mut EngineContext, &KeyEvent) + 'static>(&mut self, f: F) {
        self.state.key_hook = Some(Box::new(f));
    }

    /// Raw cursor-position hook, after the built-in camera look.
    pub fn set_cursor_hook<F: FnMut(&mut EngineContext, f64, f64) + 'static>(&mut self, f: F) {
        self.state.cursor_hook = Some(Box::new(f));
    }

    /// Raw scroll hook, after the built-in fov zoom.
    pub fn set_scroll_hook<F: FnMut(&mut EngineContext, f32) + 'static>(&mut self, f: F) {
        self.state.scroll_hook = Some(Box::new(f));
    }

    /// Runs the window loop until the window is closed (consumes self).
    pub fn run(mut self) {
        if let Err(err) = env_logger::try_init() {
            log::debug!("logger already initialized: {}", err);
        }

        let event_loop = self.event_loop.take().expect("Event loop already consumed");
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop
            .run_app(&mut self.state)
            .expect("Failed to run event loop");
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        assert!(
            self.loop_state == LoopState::Setup,
            "window loop resumed after setup"
        );

        let window = event_loop
            .create_window(
                WindowAttributes::default()
                    .with_title(self.config.title.clone())
                    .with_inner_size(winit::dpi::LogicalSize::new(
                        self.config.width,
                        self.config.height,
                    )),
            )
            .expect("Failed to create window");
        let window = Arc::new(window);
        self.window = Some(window.clone());

        let (width, height) = window.inner_size().into();
        let engine = pollster::block_on(RenderEngine::new(
            window.clone(),
            width,
            height,
            self.config.clear_color,
        ));

        let ui = UiManager::new(engine.device(), engine.queue(), engine.surface_format(), &window);

        let mut ctx = EngineContext {
            device: engine.device().clone(),
            queue: engine.queue().clone(),
            surface_format: engine.surface_format(),
            camera: FlyCamera::new(width as f32 / height as f32, self.config.camera_position),
            transforms: TransformArena::new(),
            dt: 0.0,
            elapsed: 0.0,
            should_exit: false,
        };

        if let Some(setup) = self.setup.as_mut() {
            setup(&mut ctx);
        }

        self.engine = Some(engine);
        self.ui = Some(ui);
        self.ctx = Some(ctx);
        self.loop_state = LoopState::Running;
        self.last_frame = Instant::now();
        log::info!("window loop running ({}x{})", width, height);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };
        if self.engine.is_none() {
            return;
        }

        // the overlay gets first refusal on input
        if let Some(ui) = self.ui.as_mut() {
            let ui_event: winit::event::Event<()> = winit::event::Event::WindowEvent {
                window_id,
                event: event.clone(),
            };
            if ui.handle_input(&window, &ui_event) {
                window.request_redraw();
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(engine) = self.engine.as_mut() {
                    engine.resize(width, height);
                }
                if let Some(ctx) = self.ctx.as_mut() {
                    ctx.camera.resize(width, height);
                }
                if let Some(ui) = self.ui.as_mut() {
                    ui.update_display_size(width, height);
                }
            }
            WindowEvent::KeyboardInput {
                event: key_event, ..
            } => {
                if let PhysicalKey::Code(code) = key_event.physical_key {
                    if key_event.state.is_pressed() {
                        self.pressed.insert(code);
                        if code == KeyCode::Escape {
                            self.controller.toggle_look();
                        }
                    } else {
                        self.pressed.remove(&code);
                    }
                }
                if let (Some(hook), Some(ctx)) = (self.key_hook.as_mut(), self.ctx.as_mut()) {
                    hook(ctx, &key_event);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(ctx) = self.ctx.as_mut() {
                    self.controller
                        .handle_cursor(&mut ctx.camera, position.x, position.y);
                    if let Some(hook) = self.cursor_hook.as_mut() {
                        hook(ctx, position.x, position.y);
                    }
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let amount = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32,
                };
                if let Some(ctx) = self.ctx.as_mut() {
                    self.controller.handle_scroll(&mut ctx.camera, amount);
                    if let Some(hook) = self.scroll_hook.as_mut() {
                        hook(ctx, amount);
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if self.loop_state != LoopState::Running {
            return;
        }
        self.loop_state = LoopState::Teardown;
        if let (Some(teardown), Some(ctx)) = (self.teardown.as_mut(), self.ctx.as_mut()) {
            teardown(ctx);
        }
        log::info!("window loop torn down");
        // window/context release happens on drop
    }
}

impl AppState {
    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        let Some(ctx) = self.ctx.as_mut() else {
            return;
        };
        ctx.dt = dt;
        ctx.elapsed += dt;

        for key in &self.pressed {
            let dir = match key {
                KeyCode::KeyW => Some(MoveDir::Forward),
                KeyCode::KeyS => Some(MoveDir::Backward),
                KeyCode::KeyA => Some(MoveDir::Left),
                KeyCode::KeyD => Some(MoveDir::Right),
                _ => None,
            };
            if let Some(dir) = dir {
                ctx.camera.input_move(dir, dt);
            }
        }

        // explicit once-per-frame recompute
        ctx.camera.calc_view();
        ctx.camera.calc_projection();

        let engine = self.engine.as_ref().expect("redraw before setup");
        let mut frame = match engine.begin_frame() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = self.window.as_ref().unwrap().inner_size();
                self.engine.as_mut().unwrap().resize(size.width, size.height);
                return;
            }
            Err(err) => {
                log::error!("unable to render: {}", err);
                return;
            }
        };

        {
            let mut pass = engine.scene_pass(&mut frame);
            if let Some(update) = self.update.as_mut() {
                update(ctx, &mut pass);
            }
        }

        if let (Some(ui), Some(ui_callback)) = (self.ui.as_mut(), self.ui_callback.as_mut()) {
            let window = self.window.as_ref().unwrap();
            ui.draw(
                engine.device(),
                engine.queue(),
                &mut frame.encoder,
                window,
                &frame.view,
                |imgui_ui| ui_callback(imgui_ui),
            );
        }

        engine.end_frame(frame);

        if ctx.should_exit {
            event_loop.exit();
        }
    }
}
