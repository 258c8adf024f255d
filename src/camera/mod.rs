//! Camera system for viewing the particle scene.
//!
//! An orbital camera around a fixed focus point, driven by normalized
//! pointer drags, plus the cached view-projection matrix the renderer
//! uploads every frame.

/// Orbit and zoom under distance, height, and tilt constraints.
pub mod controller;
/// Camera pose, projection parameters, and the view-projection cache.
pub mod core;

pub use controller::{CameraConstraints, CameraController};
pub use self::core::{CameraPose, Projection, ViewProjectionCache};
