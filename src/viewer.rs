//! Standalone window backed by winit.
//!
//! Creates the window, the engine, and a [`DemoSimulation`], forwards
//! pointer events through an [`InputProcessor`], maps keys through the
//! configured keybindings, and ticks the simulation at a fixed rate.
//!
//! ```no_run
//! # use particle_view::Viewer;
//! Viewer::builder()
//!     .with_title("Particles")
//!     .build()
//!     .run()
//!     .unwrap();
//! ```

use std::sync::Arc;

use web_time::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::{Window, WindowId},
};

use crate::{
    engine::Engine,
    error::ViewError,
    gpu::{FrameError, WgpuBackend},
    input::{InputEvent, InputProcessor, KeyAction, MouseButton},
    options::Options,
    simulation::{
        random_position, DemoSimulation, EffectKind, ParticleSimulation,
        SourceKind,
    },
    util::TickTimer,
};

/// Strength given to sources and effects added from the keyboard.
const KEYBOARD_VALUE: f32 = 0.5;
/// Minimum time between particle count log lines.
const COUNT_LOG_INTERVAL: Duration = Duration::from_secs(1);

// ── Builder ──────────────────────────────────────────────────────────────

/// Fluent builder for [`Viewer`].
pub struct ViewerBuilder {
    options: Option<Options>,
    title: String,
}

impl ViewerBuilder {
    fn new() -> Self {
        Self {
            options: None,
            title: "Particle System".into(),
        }
    }

    /// Override the default options.
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }

    /// Set the window title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Consume the builder and produce a [`Viewer`].
    #[must_use]
    pub fn build(self) -> Viewer {
        Viewer {
            options: self.options.unwrap_or_default(),
            title: self.title,
        }
    }
}

// ── Viewer ───────────────────────────────────────────────────────────────

/// A window showing the demo particle system.
///
/// Construct via [`Viewer::builder`], then call [`run`](Self::run).
pub struct Viewer {
    options: Options,
    title: String,
}

impl Viewer {
    /// Start a new builder.
    #[must_use]
    pub fn builder() -> ViewerBuilder {
        ViewerBuilder::new()
    }

    /// Open the window and run the event loop. Blocks until the window is
    /// closed.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::Viewer`] if the event loop or window cannot be
    /// created, and [`ViewError::Gpu`] if the GPU cannot drive the window.
    pub fn run(self) -> Result<(), ViewError> {
        let event_loop =
            EventLoop::new().map_err(|e| ViewError::Viewer(e.to_string()))?;

        let simulation = DemoSimulation::new(&self.options.simulation);
        let mut app = ViewerApp {
            window: None,
            engine: None,
            simulation,
            input: InputProcessor::default(),
            timer: TickTimer::new(self.options.display.tick_hz),
            last_count_log: Instant::now(),
            options: self.options,
            title: self.title,
            fatal: None,
        };

        event_loop
            .run_app(&mut app)
            .map_err(|e| ViewError::Viewer(e.to_string()))?;
        app.fatal.map_or(Ok(()), Err)
    }
}

// ── Winit app ────────────────────────────────────────────────────────────

struct ViewerApp {
    window: Option<Arc<Window>>,
    engine: Option<Engine<WgpuBackend>>,
    simulation: DemoSimulation,
    input: InputProcessor,
    timer: TickTimer,
    last_count_log: Instant,
    options: Options,
    title: String,
    /// Startup or device failure that ended the loop.
    fatal: Option<ViewError>,
}

impl ViewerApp {
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: ViewError) {
        log::error!("{error}");
        self.fatal = Some(error);
        event_loop.exit();
    }

    fn tick(&mut self, event_loop: &ActiveEventLoop) {
        let dt = self.timer.tick();
        let Some(engine) = &mut self.engine else {
            return;
        };
        let result = engine.tick(&mut self.simulation, dt);
        self.handle_frame_result(event_loop, result);

        let now = Instant::now();
        if now.duration_since(self.last_count_log) >= COUNT_LOG_INTERVAL {
            self.last_count_log = now;
            if let Some(engine) = &self.engine {
                log::info!(
                    "particles: {} ({:.0} ticks/s)",
                    engine.current_particle_count(),
                    self.timer.rate()
                );
            }
        }
    }

    fn handle_frame_result(
        &mut self,
        event_loop: &ActiveEventLoop,
        result: Result<(), FrameError>,
    ) {
        match result {
            Ok(()) => {}
            Err(FrameError::Lost) => {
                if let (Some(window), Some(engine)) = (&self.window, &mut self.engine)
                {
                    let size = window.inner_size();
                    engine.resize(size.width, size.height);
                }
            }
            Err(FrameError::Timeout) => log::warn!("frame timed out"),
            Err(e @ FrameError::OutOfMemory) => {
                self.fail(event_loop, ViewError::Viewer(e.to_string()));
            }
        }
    }

    fn apply(&mut self, action: KeyAction) {
        let Some(engine) = &mut self.engine else {
            return;
        };
        let sim = &mut self.simulation;
        match action {
            KeyAction::ToggleGround => {
                engine.set_ground_visible(!engine.renderer().ground_visible());
            }
            KeyAction::ToggleSkybox => {
                engine.set_skybox_visible(!engine.renderer().skybox_visible());
            }
            KeyAction::ToggleCameraLimit => {
                let enabled = !engine.camera_limit_enabled();
                log::info!("camera limits {}", if enabled { "on" } else { "off" });
                engine.set_camera_limit_enabled(enabled);
            }
            KeyAction::AddPointSource => {
                let position = random_position(sim.rng());
                sim.add_source(SourceKind::Point, position, KEYBOARD_VALUE);
            }
            KeyAction::AddConeSource => {
                let position = random_position(sim.rng());
                sim.add_source(SourceKind::Cone, position, KEYBOARD_VALUE);
            }
            KeyAction::AddGravity => {
                let position = random_position(sim.rng());
                sim.add_effect(EffectKind::Gravity, position, KEYBOARD_VALUE);
            }
            KeyAction::AddWind => {
                let position = random_position(sim.rng());
                sim.add_effect(EffectKind::Wind, position, KEYBOARD_VALUE);
            }
            KeyAction::RemoveAll => sim.remove_all(),
            KeyAction::ReloadAssets => engine.reload_assets(),
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attrs = Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(1024, 768));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.fail(event_loop, ViewError::Viewer(e.to_string()));
                return;
            }
        };

        let size = window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));
        let mut engine = match pollster::block_on(Engine::with_window(
            Arc::clone(&window),
            (width, height),
            &self.options,
        )) {
            Ok(engine) => engine,
            Err(e) => {
                self.fail(event_loop, e);
                return;
            }
        };

        engine.set_particle_source(&self.simulation.positions());
        self.input.set_viewport(width, height);
        window.request_redraw();
        self.window = Some(window);
        self.engine = Some(engine);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.timer.should_tick() {
            self.tick(event_loop);
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(
            self.timer.next_deadline(),
        ));
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: WindowId,
        event: WindowEvent,
    ) {
        if matches!(event, WindowEvent::CloseRequested) {
            event_loop.exit();
            return;
        }
        let Some(engine) = &mut self.engine else {
            return;
        };

        match event {
            WindowEvent::Resized(size) => {
                engine.resize(size.width, size.height);
                self.input.set_viewport(size.width, size.height);
            }

            WindowEvent::RedrawRequested => {
                let result = engine.render();
                self.handle_frame_result(event_loop, result);
            }

            WindowEvent::Focused(false) => self.input.release_all(),

            WindowEvent::MouseInput { button, state, .. } => {
                let command = self.input.handle_event(InputEvent::MouseButton {
                    button: MouseButton::from(button),
                    pressed: state == ElementState::Pressed,
                });
                if let Some(command) = command {
                    let _ = engine.handle_pointer(command);
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                #[allow(clippy::cast_possible_truncation)]
                let command = self.input.handle_event(InputEvent::CursorMoved {
                    x: position.x as f32,
                    y: position.y as f32,
                });
                if let Some(command) = command {
                    let _ = engine.handle_pointer(command);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                let key = format!("{code:?}");
                if let Some(action) = self.options.keybindings.lookup(&key) {
                    self.apply(action);
                }
            }

            _ => (),
        }
    }
}
