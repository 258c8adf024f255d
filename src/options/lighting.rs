use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Lighting", inline)]
#[serde(default)]
/// Point light and sprite shading parameters.
pub struct LightingOptions {
    /// World-space position of the single point light.
    #[schemars(skip)]
    pub light_position: [f32; 3],
    #[schemars(title = "Ambient", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    /// Ambient light floor.
    pub ambient: f32,
    /// Edge length of a particle sprite in world units.
    #[schemars(title = "Particle Size", range(min = 0.005, max = 0.5), extend("step" = 0.005))]
    pub particle_size: f32,
}

impl Default for LightingOptions {
    fn default() -> Self {
        Self {
            light_position: [0.0, 2.0, 10.0],
            ambient: 0.15,
            particle_size: 0.05,
        }
    }
}
