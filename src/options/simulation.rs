use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Simulation", inline)]
#[serde(default)]
/// Parameters of the built-in demo particle system.
pub struct SimulationOptions {
    /// Seed for the random generator driving emission and placement.
    #[schemars(skip)]
    pub seed: u64,
    /// Particles emitted per second by a source of value 1.0.
    #[schemars(title = "Emission Rate", range(min = 0.0, max = 5000.0), extend("step" = 10.0))]
    pub emission_rate: f32,
    /// Initial particle speed for a source of value 1.0.
    #[schemars(title = "Emission Speed", range(min = 0.0, max = 10.0), extend("step" = 0.1))]
    pub emission_speed: f32,
    /// Seconds a particle lives before it is removed.
    #[schemars(title = "Lifetime", range(min = 0.1, max = 60.0), extend("step" = 0.1))]
    pub particle_lifetime: f32,
    /// Hard cap on live particles.
    #[schemars(skip)]
    pub max_particles: usize,
    /// Constant downward acceleration applied to every particle.
    #[schemars(title = "World Gravity", range(min = 0.0, max = 20.0), extend("step" = 0.1))]
    pub world_gravity: f32,
    /// Whether the demo starts with a point source above the origin.
    #[schemars(skip)]
    pub initial_source: bool,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            emission_rate: 400.0,
            emission_speed: 2.0,
            particle_lifetime: 6.0,
            max_particles: 20_000,
            world_gravity: 1.5,
            initial_source: true,
        }
    }
}
