//! Centralized viewer options with TOML preset support.
//!
//! Camera constraints, display toggles, lighting, asset locations, the demo
//! simulation, and keybindings are consolidated here. Options serialize
//! to/from TOML for presets stored in `assets/presets/`.

mod assets;
mod camera;
mod display;
mod keybindings;
mod lighting;
mod simulation;

use std::path::Path;

pub use assets::{AssetOptions, ShaderPaths};
pub use camera::CameraOptions;
pub use display::DisplayOptions;
pub use keybindings::KeybindingOptions;
pub use lighting::LightingOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
pub use simulation::SimulationOptions;

use crate::camera::CameraConstraints;
use crate::error::ViewError;

/// Top-level options container. All sub-structs use `#[serde(default)]` so
/// partial TOML files (e.g. only overriding `[lighting]`) work correctly.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[serde(default)]
pub struct Options {
    /// Scene toggles and frame pacing.
    pub display: DisplayOptions,
    /// Camera projection and motion constraints.
    pub camera: CameraOptions,
    /// Point light and sprite shading.
    pub lighting: LightingOptions,
    /// Demo particle system parameters.
    pub simulation: SimulationOptions,
    /// Texture and shader locations.
    #[schemars(skip)]
    pub assets: AssetOptions,
    /// Keyboard binding options.
    #[schemars(skip)]
    pub keybindings: KeybindingOptions,
}

impl Options {
    /// Generate JSON Schema describing the UI-exposed options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Parse options from TOML text. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::OptionsParse`] on malformed TOML or
    /// inconsistent camera bounds.
    pub fn from_toml(content: &str) -> Result<Self, ViewError> {
        let mut opts: Self = toml::from_str(content)
            .map_err(|e| ViewError::OptionsParse(e.to_string()))?;
        opts.keybindings.rebuild_reverse_map();
        opts.validate()?;
        Ok(opts)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::Io`] if the file cannot be read and
    /// [`ViewError::OptionsParse`] if it does not describe valid options.
    pub fn load(path: &Path) -> Result<Self, ViewError> {
        let content = std::fs::read_to_string(path).map_err(ViewError::Io)?;
        Self::from_toml(&content)
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), ViewError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ViewError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ViewError::Io)?;
        }
        std::fs::write(path, content).map_err(ViewError::Io)
    }

    /// List available preset names (TOML file stems) in a directory.
    #[must_use]
    pub fn list_presets(dir: &Path) -> Vec<String> {
        let mut names = Vec::new();
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) =
                        path.file_stem().and_then(|s| s.to_str())
                    {
                        names.push(stem.to_owned());
                    }
                }
            }
        }
        names.sort();
        names
    }

    /// Camera constraints sized to the configured skybox.
    #[must_use]
    pub fn camera_constraints(&self) -> CameraConstraints {
        self.camera.constraints(self.display.skybox_size)
    }

    fn validate(&self) -> Result<(), ViewError> {
        if self.display.skybox_size <= 0.0 {
            return Err(ViewError::OptionsParse(format!(
                "display: skybox_size {} must be positive",
                self.display.skybox_size
            )));
        }
        self.camera
            .validate(self.display.skybox_size)
            .map_err(ViewError::OptionsParse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyAction;

    #[test]
    fn default_round_trips_through_toml() {
        let opts = Options::default();
        let toml_str = toml::to_string_pretty(&opts).unwrap();
        let parsed = Options::from_toml(&toml_str).unwrap();
        assert_eq!(opts, parsed);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r"
[lighting]
particle_size = 0.1
";
        let opts = Options::from_toml(toml_str).unwrap();
        assert_eq!(opts.lighting.particle_size, 0.1);
        // Everything else should be default
        assert_eq!(opts.lighting.ambient, 0.15);
        assert_eq!(opts.lighting.light_position, [0.0, 2.0, 10.0]);
        assert!(opts.display.show_ground);
        assert_eq!(opts.camera.max_distance, 4.9);
    }

    #[test]
    fn far_bound_stays_inside_a_smaller_skybox() {
        let mut opts = Options::default();
        opts.display.skybox_size = 3.0;
        assert_eq!(opts.camera_constraints().max_distance, 3.0);
    }

    #[test]
    fn defaults_match_viewer_constants() {
        let c = Options::default().camera_constraints();
        assert_eq!(c.rotational_factor, 60.0);
        assert_eq!(c.min_height, 0.1);
        assert_eq!(c.min_distance, 0.25);
        assert_eq!(c.max_distance, 4.9);
        assert_eq!(c.min_tilt, 0.1);
        assert!((c.max_tilt - (std::f32::consts::PI - 0.1)).abs() < 1e-6);
        assert!(c.limit_enabled);
    }

    #[test]
    fn rejects_max_distance_outside_skybox() {
        let toml_str = r"
[camera]
max_distance = 6.0
";
        let err = Options::from_toml(toml_str).unwrap_err();
        assert!(matches!(err, ViewError::OptionsParse(_)));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = Options::from_toml("[camera\nfovy = ").unwrap_err();
        assert!(matches!(err, ViewError::OptionsParse(_)));
    }

    #[test]
    fn keybinding_lookup() {
        let opts = Options::default();
        assert_eq!(
            opts.keybindings.lookup("KeyG"),
            Some(KeyAction::ToggleGround)
        );
        assert_eq!(opts.keybindings.lookup("Delete"), Some(KeyAction::RemoveAll));
        assert_eq!(opts.keybindings.lookup("KeyZ"), None);
    }

    #[test]
    fn custom_keybindings_rebuild_lookup() {
        let toml_str = r#"
[keybindings.bindings]
toggle_ground = "KeyX"
"#;
        let opts = Options::from_toml(toml_str).unwrap();
        assert_eq!(
            opts.keybindings.lookup("KeyX"),
            Some(KeyAction::ToggleGround)
        );
        assert_eq!(opts.keybindings.lookup("KeyG"), None);
    }

    #[test]
    fn asset_paths_resolve_under_root() {
        let assets = AssetOptions::default();
        let faces = assets.skybox_face_paths();
        assert_eq!(
            faces[0],
            Path::new("assets").join("textures/skybox/xpos.png")
        );
        assert_eq!(
            assets.resolve(&assets.shaders(crate::gpu::SubsystemKind::Ground).vertex),
            Path::new("assets").join("shaders/ground.vert.wgsl")
        );
    }

    #[test]
    fn list_presets_finds_shipped_default() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/presets");
        assert!(Options::list_presets(&dir).contains(&"default".to_owned()));
        let shipped = Options::load(&dir.join("default.toml")).unwrap();
        assert_eq!(shipped, Options::default());
    }

    #[test]
    fn schema_has_expected_properties() {
        let schema_value =
            serde_json::to_value(Options::json_schema()).unwrap();
        let props = schema_value["properties"].as_object().unwrap();

        assert!(props.contains_key("display"));
        assert!(props.contains_key("camera"));
        assert!(props.contains_key("lighting"));
        assert!(props.contains_key("simulation"));

        // Skipped sections should be absent
        assert!(!props.contains_key("assets"));
        assert!(!props.contains_key("keybindings"));

        let camera = &props["camera"]["properties"];
        assert!(camera.get("fovy").is_some());
        assert!(camera.get("limit_enabled").is_some());
        assert!(camera.get("znear").is_none());
    }
}
