use serde::{Deserialize, Serialize};

/// Viewer actions that can be bound to keys.
///
/// Serde serializes as `snake_case` strings so TOML presets stay readable:
/// ```toml
/// [keybindings.bindings]
/// toggle_ground = "KeyG"
/// add_point_source = "KeyP"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyAction {
    /// Show or hide the ground plane.
    ToggleGround,
    /// Show or hide the skybox.
    ToggleSkybox,
    /// Enable or disable the camera distance/height clamps.
    ToggleCameraLimit,
    /// Add a point emitter at a random position.
    AddPointSource,
    /// Add a cone emitter at a random position.
    AddConeSource,
    /// Add a gravity well at a random position.
    AddGravity,
    /// Add a wind effect with a random direction.
    AddWind,
    /// Remove every particle, source, and effect.
    RemoveAll,
    /// Reload every texture and shader from disk.
    ReloadAssets,
}
