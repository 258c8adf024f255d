//! Input handling: event types, key actions, and the processor that turns
//! raw pointer events into normalized camera drag commands.

/// Platform-agnostic input events.
pub mod event;
/// Bindable viewer actions.
pub mod keyboard;
/// Converts raw events into drag commands.
pub mod processor;

pub use event::{InputEvent, MouseButton};
pub use keyboard::KeyAction;
pub use processor::{DragButton, InputProcessor, PointerCommand};
