//! Read-only queries on [`Engine`].

use glam::Mat4;

use super::Engine;
use crate::camera::{CameraController, CameraPose};
use crate::gpu::Gpu;
use crate::renderer::FrameRenderer;

impl<G: Gpu> Engine<G> {
    /// Particles drawn by the next frame, as of the last resync.
    #[must_use]
    pub fn current_particle_count(&self) -> u32 {
        self.renderer.stream().count()
    }

    /// Current camera pose.
    #[must_use]
    pub fn pose(&self) -> &CameraPose {
        self.controller.pose()
    }

    /// The camera controller.
    #[must_use]
    pub fn controller(&self) -> &CameraController {
        &self.controller
    }

    /// Whether the distance and height clamps are active.
    #[must_use]
    pub fn camera_limit_enabled(&self) -> bool {
        self.controller.constraints().limit_enabled
    }

    /// Cached projection * view matrix.
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        self.view_projection.matrix()
    }

    /// The frame renderer.
    #[must_use]
    pub fn renderer(&self) -> &FrameRenderer {
        &self.renderer
    }

    /// The GPU backend.
    #[must_use]
    pub fn gpu(&self) -> &G {
        &self.gpu
    }

    /// The GPU backend, mutably.
    pub fn gpu_mut(&mut self) -> &mut G {
        &mut self.gpu
    }
}
