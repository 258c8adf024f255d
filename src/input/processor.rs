//! Converts raw window events into camera drag commands.
//!
//! The `InputProcessor` owns the transient pointer state (cursor position,
//! held buttons, viewport size). It is the only thing between raw window
//! events and the engine's
//! [`handle_pointer`](crate::engine::Engine::handle_pointer) method.

use glam::Vec2;

use super::event::{InputEvent, MouseButton};

/// Which camera gesture a drag performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragButton {
    /// Only the primary button is held: orbit.
    Primary,
    /// Only the secondary button is held: zoom.
    Secondary,
    /// No button, or a chord: the camera does not move.
    None,
}

/// Pointer input in the normalized `[-1, 1]` viewport domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerCommand {
    /// A button went down; `position` becomes the drag origin.
    DragStart {
        /// Normalized pointer position.
        position: Vec2,
    },
    /// The pointer moved.
    DragMove {
        /// Normalized pointer position.
        position: Vec2,
        /// Gesture selected by the held buttons.
        button: DragButton,
    },
}

/// Converts raw window events into [`PointerCommand`]s.
///
/// # Usage
///
/// ```ignore
/// processor.set_viewport(width, height);
/// if let Some(cmd) = processor.handle_event(event) {
///     engine.handle_pointer(cmd);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct InputProcessor {
    /// Last cursor position in physical pixels.
    cursor: (f32, f32),
    viewport: (u32, u32),
    left_held: bool,
    right_held: bool,
    middle_held: bool,
}

impl Default for InputProcessor {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl InputProcessor {
    /// Processor for a viewport of the given pixel size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            cursor: (0.0, 0.0),
            viewport: (width, height),
            left_held: false,
            right_held: false,
            middle_held: false,
        }
    }

    /// Update the pixel size used for normalization.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    /// Map a pixel position into `[-1, 1]` on both axes. A zero-sized
    /// viewport maps everything to the center.
    #[must_use]
    pub fn normalize(&self, x: f32, y: f32) -> Vec2 {
        let (width, height) = self.viewport;
        if width == 0 || height == 0 {
            return Vec2::ZERO;
        }
        Vec2::new(
            2.0 * x / width as f32 - 1.0,
            2.0 * y / height as f32 - 1.0,
        )
    }

    /// The gesture the currently held buttons select.
    #[must_use]
    pub fn active_button(&self) -> DragButton {
        match (self.left_held, self.right_held, self.middle_held) {
            (true, false, false) => DragButton::Primary,
            (false, true, false) => DragButton::Secondary,
            _ => DragButton::None,
        }
    }

    /// Forget held buttons, e.g. when the window loses focus mid-drag.
    pub fn release_all(&mut self) {
        self.left_held = false;
        self.right_held = false;
        self.middle_held = false;
    }

    /// Process a raw input event and return zero or one commands.
    pub fn handle_event(&mut self, event: InputEvent) -> Option<PointerCommand> {
        match event {
            InputEvent::CursorMoved { x, y } => {
                self.cursor = (x, y);
                Some(PointerCommand::DragMove {
                    position: self.normalize(x, y),
                    button: self.active_button(),
                })
            }
            InputEvent::MouseButton { button, pressed } => {
                match button {
                    MouseButton::Left => self.left_held = pressed,
                    MouseButton::Right => self.right_held = pressed,
                    MouseButton::Middle => self.middle_held = pressed,
                    MouseButton::Other => return None,
                }
                pressed.then(|| PointerCommand::DragStart {
                    position: self.normalize(self.cursor.0, self.cursor.1),
                })
            }
        }
    }
}
