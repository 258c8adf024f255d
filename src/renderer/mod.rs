//! Fixed-order frame rendering: ground, skybox, then particles.
//!
//! Each subsystem owns its GPU handles through [`SubsystemResources`] and is
//! skipped while not ready. Every subsystem draw runs inside a
//! [`BoundDraw`] scope that unbinds all state when it ends.

/// Ground plane geometry and draw.
pub mod ground;
/// Stream of external particle positions into a GPU buffer.
pub mod particle_stream;
/// Particle sprite draw.
pub mod particles;
/// Skybox cube geometry and draw.
pub mod skybox;
/// Per-subsystem resource lifecycle and readiness.
pub mod subsystem;

use crate::gpu::{
    BufferHandle, DrawUniforms, FrameError, Gpu, Primitive, ProgramHandle,
    RenderBackend,
};
use crate::options::Options;
pub use particle_stream::{ParticleSource, ParticleStream};
pub use subsystem::SubsystemResources;

/// Draws the three subsystems in order and owns their resources.
#[derive(Debug)]
pub struct FrameRenderer {
    ground: SubsystemResources,
    skybox: SubsystemResources,
    particles: SubsystemResources,
    stream: ParticleStream,
    show_ground: bool,
    show_skybox: bool,
    clear_color: [f32; 4],
}

impl FrameRenderer {
    /// Renderer with nothing created yet. Call
    /// [`initialize`](Self::initialize) before the first frame.
    #[must_use]
    pub fn new(options: &Options) -> Self {
        Self {
            ground: ground::resources(options),
            skybox: skybox::resources(options),
            particles: particles::resources(options),
            stream: ParticleStream::new(),
            show_ground: options.display.show_ground,
            show_skybox: options.display.show_skybox,
            clear_color: options.display.clear_color,
        }
    }

    /// Create missing resources for every subsystem. Safe to repeat.
    pub fn initialize<G: Gpu + ?Sized>(&mut self, gpu: &mut G) {
        self.ground.initialize(gpu);
        self.skybox.initialize(gpu);
        self.particles.initialize(gpu);
    }

    /// Show or hide the ground.
    pub fn set_ground_visible(&mut self, visible: bool) {
        self.show_ground = visible;
    }

    /// Show or hide the skybox.
    pub fn set_skybox_visible(&mut self, visible: bool) {
        self.show_skybox = visible;
    }

    /// Whether the ground is drawn when ready.
    #[must_use]
    pub fn ground_visible(&self) -> bool {
        self.show_ground
    }

    /// Whether the skybox is drawn when ready.
    #[must_use]
    pub fn skybox_visible(&self) -> bool {
        self.show_skybox
    }

    /// Ground resources.
    #[must_use]
    pub fn ground(&self) -> &SubsystemResources {
        &self.ground
    }

    /// Skybox resources.
    #[must_use]
    pub fn skybox(&self) -> &SubsystemResources {
        &self.skybox
    }

    /// Particle resources.
    #[must_use]
    pub fn particles(&self) -> &SubsystemResources {
        &self.particles
    }

    /// Particle resources are ready and the stream has a buffer.
    #[must_use]
    pub fn particles_ready(&self) -> bool {
        self.particles.is_ready() && self.stream.buffer().is_some()
    }

    /// The particle stream.
    #[must_use]
    pub fn stream(&self) -> &ParticleStream {
        &self.stream
    }

    /// The particle stream, for binding a source and resyncing.
    pub fn stream_mut(&mut self) -> &mut ParticleStream {
        &mut self.stream
    }

    /// Clear, draw every visible and ready subsystem, and present.
    ///
    /// Particles are not toggleable; they are skipped only while unready or
    /// empty.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError`] if the frame could not be acquired or
    /// presented.
    pub fn draw<G: RenderBackend + ?Sized>(
        &self,
        gpu: &mut G,
        uniforms: &DrawUniforms,
    ) -> Result<(), FrameError> {
        gpu.begin_frame(self.clear_color);
        if self.show_ground && self.ground.is_ready() {
            ground::draw(gpu, &self.ground, uniforms);
        }
        if self.show_skybox && self.skybox.is_ready() {
            skybox::draw(gpu, &self.skybox, uniforms);
        }
        if self.particles_ready() {
            particles::draw(gpu, &self.particles, &self.stream, uniforms);
        }
        gpu.end_frame()
    }

    /// Release and re-create the subsystem resources from disk. The particle
    /// stream keeps its source and buffer.
    pub fn reload<G: Gpu + ?Sized>(&mut self, gpu: &mut G) {
        self.ground.teardown(gpu);
        self.skybox.teardown(gpu);
        self.particles.teardown(gpu);
        self.initialize(gpu);
    }

    /// Release every GPU handle. Safe to call more than once.
    pub fn teardown<G: RenderBackend + ?Sized>(&mut self, gpu: &mut G) {
        self.ground.teardown(gpu);
        self.skybox.teardown(gpu);
        self.particles.teardown(gpu);
        self.stream.teardown(gpu);
    }
}

/// One subsystem's draw scope: binds the program and uniforms on creation
/// and unbinds everything on drop.
pub(crate) struct BoundDraw<'a, G: RenderBackend + ?Sized> {
    gpu: &'a mut G,
}

impl<'a, G: RenderBackend + ?Sized> BoundDraw<'a, G> {
    pub(crate) fn new(
        gpu: &'a mut G,
        program: ProgramHandle,
        uniforms: &DrawUniforms,
    ) -> Self {
        gpu.bind_program(program);
        gpu.set_uniforms(uniforms);
        Self { gpu }
    }

    /// Bind each loaded texture of `resources` to its own unit.
    pub(crate) fn textures(&mut self, resources: &SubsystemResources) {
        for (unit, texture) in resources.bound_textures() {
            self.gpu.bind_texture(unit, texture);
        }
    }

    pub(crate) fn vertex_buffer(&mut self, buffer: BufferHandle) {
        self.gpu.bind_vertex_buffer(buffer);
    }

    pub(crate) fn index_buffer(&mut self, buffer: BufferHandle) {
        self.gpu.bind_index_buffer(buffer);
    }

    pub(crate) fn draw(&mut self, primitive: Primitive, count: u32) {
        self.gpu.draw(primitive, count);
    }

    pub(crate) fn draw_indexed(&mut self, index_count: u32) {
        self.gpu.draw_indexed(index_count);
    }
}

impl<G: RenderBackend + ?Sized> Drop for BoundDraw<'_, G> {
    fn drop(&mut self) {
        self.gpu.unbind_all();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec3;

    use super::*;
    use crate::gpu::testing::{Call, RecordingGpu};
    use crate::gpu::SubsystemKind;

    fn ready_renderer(gpu: &mut RecordingGpu) -> (FrameRenderer, ParticleSource) {
        let mut renderer = FrameRenderer::new(&Options::default());
        renderer.initialize(gpu);
        let source: ParticleSource = Rc::new(RefCell::new(vec![Vec3::ONE; 10]));
        renderer.stream_mut().set_source(&source);
        renderer.stream_mut().resync(gpu);
        (renderer, source)
    }

    #[test]
    fn draw_order_holds_for_every_toggle_combination() {
        use SubsystemKind::{Ground, Particles, Skybox};
        for (show_ground, show_skybox, expected) in [
            (true, true, vec![Ground, Skybox, Particles]),
            (true, false, vec![Ground, Particles]),
            (false, true, vec![Skybox, Particles]),
            (false, false, vec![Particles]),
        ] {
            let mut gpu = RecordingGpu::new();
            let (mut renderer, _source) = ready_renderer(&mut gpu);
            renderer.set_ground_visible(show_ground);
            renderer.set_skybox_visible(show_skybox);
            gpu.clear_calls();
            assert!(renderer.draw(&mut gpu, &DrawUniforms::default()).is_ok());
            assert_eq!(gpu.drawn_subsystems(), expected);
            assert_eq!(gpu.calls.first(), Some(&Call::BeginFrame));
            assert_eq!(gpu.calls.last(), Some(&Call::EndFrame));
        }
    }

    #[test]
    fn every_draw_is_followed_by_unbind() {
        let mut gpu = RecordingGpu::new();
        let (renderer, _source) = ready_renderer(&mut gpu);
        gpu.clear_calls();
        assert!(renderer.draw(&mut gpu, &DrawUniforms::default()).is_ok());
        let binds = gpu.count(|c| matches!(c, Call::BindProgram(_)));
        let unbinds = gpu.count(|c| matches!(c, Call::UnbindAll));
        assert_eq!(binds, 3);
        assert_eq!(unbinds, 3);
        // Ground binds diffuse and normal maps to separate units.
        assert!(gpu.calls.iter().any(|c| matches!(c, Call::BindTexture(1, _))));
    }

    #[test]
    fn failed_ground_diffuse_only_disables_ground() {
        let options = Options::default();
        let diffuse = options.assets.resolve(&options.assets.ground_texture);
        let mut gpu = RecordingGpu::new().fail_path(diffuse);
        let (renderer, _source) = ready_renderer(&mut gpu);

        assert!(!renderer.ground().is_ready());
        assert!(renderer.skybox().is_ready());
        assert!(renderer.particles_ready());

        gpu.clear_calls();
        assert!(renderer.draw(&mut gpu, &DrawUniforms::default()).is_ok());
        assert_eq!(
            gpu.drawn_subsystems(),
            vec![SubsystemKind::Skybox, SubsystemKind::Particles]
        );
    }

    #[test]
    fn missing_cube_face_disables_skybox() {
        let options = Options::default();
        let face = options.assets.skybox_face_paths()[3].clone();
        let mut gpu = RecordingGpu::new().fail_path(face);
        let (renderer, _source) = ready_renderer(&mut gpu);
        assert!(!renderer.skybox().is_ready());
        assert!(renderer.ground().is_ready());
    }

    #[test]
    fn empty_particles_are_not_drawn() {
        let mut gpu = RecordingGpu::new();
        let (mut renderer, source) = ready_renderer(&mut gpu);
        source.borrow_mut().clear();
        renderer.stream_mut().resync(&mut gpu);
        gpu.clear_calls();
        assert!(renderer.draw(&mut gpu, &DrawUniforms::default()).is_ok());
        assert!(!gpu.drawn_subsystems().contains(&SubsystemKind::Particles));
    }

    #[test]
    fn particle_draw_uses_stream_count() {
        let mut gpu = RecordingGpu::new();
        let (renderer, _source) = ready_renderer(&mut gpu);
        gpu.clear_calls();
        assert!(renderer.draw(&mut gpu, &DrawUniforms::default()).is_ok());
        assert!(gpu.calls.contains(&Call::Draw(Primitive::Sprites, 10)));
        assert!(gpu.calls.contains(&Call::DrawIndexed(36)));
        assert!(gpu.calls.contains(&Call::Draw(Primitive::Triangles, 6)));
    }

    #[test]
    fn teardown_releases_everything() {
        let mut gpu = RecordingGpu::new();
        let (mut renderer, _source) = ready_renderer(&mut gpu);
        assert!(gpu.live_handles() > 0);
        renderer.teardown(&mut gpu);
        assert_eq!(gpu.live_handles(), 0);
        renderer.teardown(&mut gpu);
    }
}
