use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Display", inline)]
#[serde(default)]
/// Scene toggles and frame pacing.
pub struct DisplayOptions {
    /// Draw the textured ground plane.
    #[schemars(title = "Show Ground")]
    pub show_ground: bool,
    /// Draw the skybox.
    #[schemars(title = "Show Skybox")]
    pub show_skybox: bool,
    /// Half-extent of the skybox cube and the ground quad.
    #[schemars(skip)]
    pub skybox_size: f32,
    /// RGBA color the frame is cleared to.
    #[schemars(skip)]
    pub clear_color: [f32; 4],
    /// Simulation ticks per second (0 = as fast as possible).
    #[schemars(title = "Tick Rate", range(min = 0, max = 240))]
    pub tick_hz: u32,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_ground: true,
            show_skybox: true,
            skybox_size: 5.0,
            clear_color: [0.0, 0.0, 0.0, 0.0],
            tick_hz: 60,
        }
    }
}
