//! Pointer and toggle entry points for [`Engine`].

use glam::Vec2;

use super::Engine;
use crate::gpu::Gpu;
use crate::input::{DragButton, PointerCommand};

impl<G: Gpu> Engine<G> {
    /// Dispatch a command produced by
    /// [`InputProcessor`](crate::input::InputProcessor).
    ///
    /// Returns `true` if the camera moved.
    pub fn handle_pointer(&mut self, command: PointerCommand) -> bool {
        match command {
            PointerCommand::DragStart { position } => {
                self.on_drag_start(position);
                false
            }
            PointerCommand::DragMove { position, button } => {
                self.on_drag_move(position, button)
            }
        }
    }

    /// A button went down at normalized `position`.
    pub fn on_drag_start(&mut self, position: Vec2) {
        self.previous_pointer = position;
    }

    /// The pointer moved to normalized `position` while `button` is held:
    /// primary orbits, secondary zooms.
    ///
    /// The view-projection matrix is recomputed before returning. Returns
    /// `true` if the camera moved.
    pub fn on_drag_move(&mut self, position: Vec2, button: DragButton) -> bool {
        if position == self.previous_pointer {
            return false;
        }
        let previous = std::mem::replace(&mut self.previous_pointer, position);
        let moved = match button {
            DragButton::Primary => self.controller.orbit(previous, position),
            DragButton::Secondary => self.controller.zoom(previous, position),
            DragButton::None => false,
        };
        if moved {
            self.view_projection.update(self.controller.pose());
        }
        moved
    }

    /// Show or hide the ground plane.
    pub fn set_ground_visible(&mut self, visible: bool) {
        self.renderer.set_ground_visible(visible);
    }

    /// Show or hide the skybox.
    pub fn set_skybox_visible(&mut self, visible: bool) {
        self.renderer.set_skybox_visible(visible);
    }

    /// Toggle the camera's distance and height clamps. Tilt bounds always
    /// apply.
    pub fn set_camera_limit_enabled(&mut self, enabled: bool) {
        self.controller.set_limit_enabled(enabled);
    }
}
