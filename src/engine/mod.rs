//! The engine ties the camera, the frame renderer, and a GPU backend
//! together and exposes the plain methods a windowing layer calls.

mod accessors;
mod input;

use glam::Vec2;

use crate::camera::{CameraController, ViewProjectionCache};
use crate::error::ViewError;
use crate::gpu::{DrawUniforms, FrameError, Gpu, WgpuBackend};
use crate::options::{LightingOptions, Options};
use crate::renderer::{FrameRenderer, ParticleSource};
use crate::simulation::ParticleSimulation;

/// Camera, renderer, and backend for one viewport.
///
/// Everything runs on the caller's thread. Pointer methods update the
/// camera and the view-projection matrix immediately, so the next draw
/// always sees them. [`tick`](Self::tick) runs one simulation step, the
/// particle resync, and the draw, in that order.
///
/// GPU handles are released when the engine is dropped.
pub struct Engine<G: Gpu> {
    gpu: G,
    controller: CameraController,
    view_projection: ViewProjectionCache,
    renderer: FrameRenderer,
    lighting: LightingOptions,
    /// Normalized pointer position of the last drag event.
    previous_pointer: Vec2,
}

impl Engine<WgpuBackend> {
    /// Create a wgpu backend for `window` and build the engine on it.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::Gpu`] if no usable adapter, device, or surface
    /// configuration exists.
    pub async fn with_window(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        size: (u32, u32),
        options: &Options,
    ) -> Result<Self, ViewError> {
        let gpu = WgpuBackend::new(window, size).await?;
        Ok(Self::new(gpu, options))
    }
}

impl<G: Gpu> Engine<G> {
    /// Build the engine and create every subsystem's resources.
    ///
    /// Asset failures are logged and leave their subsystem undrawn; they
    /// do not fail construction.
    pub fn new(mut gpu: G, options: &Options) -> Self {
        let controller = CameraController::new(
            options.camera.initial_pose(),
            options.camera_constraints(),
        );
        let view_projection = ViewProjectionCache::new(
            options.camera.projection(),
            gpu.viewport_size(),
            controller.pose(),
        );
        let mut renderer = FrameRenderer::new(options);
        renderer.initialize(&mut gpu);

        Self {
            gpu,
            controller,
            view_projection,
            renderer,
            lighting: options.lighting.clone(),
            previous_pointer: Vec2::ZERO,
        }
    }

    /// Resize the surface and the projection. Zero sizes (minimized
    /// windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        log::debug!("viewport resized to {width}x{height}");
        self.gpu.resize(width, height);
        self.view_projection
            .set_viewport(width, height, self.controller.pose());
    }

    /// Bind the particle positions to draw. The caller keeps ownership;
    /// once every strong reference is dropped the stream reads as empty.
    pub fn set_particle_source(&mut self, source: &ParticleSource) {
        self.renderer.stream_mut().set_source(source);
    }

    /// Stop drawing particles.
    pub fn clear_particle_source(&mut self) {
        self.renderer.stream_mut().clear_source();
    }

    /// Copy the current particle positions to the GPU.
    pub fn resync_particles(&mut self) {
        self.renderer.stream_mut().resync(&mut self.gpu);
        log::debug!("resynced {} particles", self.renderer.stream().count());
    }

    /// Draw one frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError`] if the surface could not be acquired or
    /// presented.
    pub fn render(&mut self) -> Result<(), FrameError> {
        let uniforms = self.uniforms();
        self.renderer.draw(&mut self.gpu, &uniforms)
    }

    /// Advance `simulation` by `dt` seconds, resync the particles, and draw.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError`] from the draw.
    pub fn tick<S: ParticleSimulation + ?Sized>(
        &mut self,
        simulation: &mut S,
        dt: f32,
    ) -> Result<(), FrameError> {
        simulation.update(dt);
        self.resync_particles();
        self.render()
    }

    /// Re-read textures and shaders from disk.
    pub fn reload_assets(&mut self) {
        log::info!("reloading assets");
        self.renderer.reload(&mut self.gpu);
    }

    /// Release every GPU handle now instead of at drop. Later frames draw
    /// nothing until [`reload_assets`](Self::reload_assets).
    pub fn teardown(&mut self) {
        self.renderer.teardown(&mut self.gpu);
    }

    /// Uniform block for the current camera and lighting.
    #[must_use]
    pub fn uniforms(&self) -> DrawUniforms {
        DrawUniforms {
            view_proj: self.view_projection.matrix().to_cols_array_2d(),
            camera_position: self.controller.pose().position().to_array(),
            ambient: self.lighting.ambient,
            light_position: self.lighting.light_position,
            sprite_size: self.lighting.particle_size,
        }
    }
}

impl<G: Gpu> Drop for Engine<G> {
    fn drop(&mut self) {
        self.renderer.teardown(&mut self.gpu);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec3;

    use super::*;
    use crate::gpu::testing::{Call, RecordingGpu};
    use crate::gpu::{BufferUsage, SubsystemKind};
    use crate::input::DragButton;

    fn engine() -> Engine<RecordingGpu> {
        Engine::new(RecordingGpu::new(), &Options::default())
    }

    #[test]
    fn construction_initializes_every_subsystem() {
        let engine = engine();
        assert!(engine.renderer().ground().is_ready());
        assert!(engine.renderer().skybox().is_ready());
        assert!(engine.renderer().particles().is_ready());
        assert_eq!(engine.current_particle_count(), 0);
    }

    #[test]
    fn tick_updates_then_resyncs_then_draws() {
        let mut engine = engine();
        let source: ParticleSource = Rc::new(RefCell::new(Vec::new()));
        engine.set_particle_source(&source);
        engine.gpu_mut().clear_calls();

        let positions = Rc::clone(&source);
        let mut simulation = move |_dt: f32| {
            positions.borrow_mut().extend([Vec3::Z; 5]);
        };
        assert!(engine.tick(&mut simulation, 1.0 / 60.0).is_ok());

        // The upload sees the simulation's output, and precedes the frame.
        let calls = &engine.gpu().calls;
        let upload = calls.iter().position(|c| {
            matches!(c, Call::Upload { bytes: 60, usage: BufferUsage::Stream, .. })
        });
        let begin = calls.iter().position(|c| *c == Call::BeginFrame);
        assert!(upload.is_some() && begin.is_some());
        assert!(upload < begin);
        assert_eq!(engine.current_particle_count(), 5);
        assert_eq!(
            engine.gpu().drawn_subsystems().last(),
            Some(&SubsystemKind::Particles)
        );
    }

    #[test]
    fn uniforms_follow_the_camera() {
        let mut engine = engine();
        let before = engine.uniforms();
        engine.on_drag_start(Vec2::ZERO);
        assert!(engine.on_drag_move(Vec2::new(0.1, 0.0), DragButton::Primary));
        let after = engine.uniforms();
        assert_ne!(before.view_proj, after.view_proj);
        assert_eq!(after.camera_position, engine.pose().position().to_array());
    }

    #[test]
    fn resize_updates_projection_and_backend() {
        let mut engine = engine();
        let before = engine.view_projection();
        engine.resize(1600, 600);
        assert!(engine.gpu().calls.contains(&Call::Resize(1600, 600)));
        assert_ne!(before, engine.view_projection());

        engine.gpu_mut().clear_calls();
        engine.resize(0, 600);
        assert!(engine.gpu().calls.is_empty());
    }

    #[test]
    fn reload_retries_failed_assets() {
        let options = Options::default();
        let normal = options.assets.resolve(&options.assets.ground_normal_map);
        let mut engine = Engine::new(RecordingGpu::new().fail_path(normal), &options);
        assert!(!engine.renderer().ground().is_ready());

        engine.gpu_mut().heal();
        engine.reload_assets();
        assert!(engine.renderer().ground().is_ready());
    }

    #[test]
    fn teardown_then_drop_releases_once() {
        let mut engine = engine();
        engine.teardown();
        assert_eq!(engine.gpu().live_handles(), 0);
        // Drop tears down again; a double release would panic here.
        drop(engine);
    }
}
