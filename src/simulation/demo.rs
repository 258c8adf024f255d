use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{EffectKind, ParticleSimulation, SourceKind};
use crate::options::SimulationOptions;
use crate::renderer::ParticleSource;

/// Half-angle of a cone source, radians.
const CONE_HALF_ANGLE: f32 = 0.3;
/// Acceleration of a gravity effect of strength 1 at unit distance.
const GRAVITY_STRENGTH: f32 = 4.0;
/// Acceleration of a wind effect of strength 1 at its own position.
const WIND_STRENGTH: f32 = 3.0;
/// Squared distance below which effect falloff stops growing.
const MIN_FALLOFF_DISTANCE_SQ: f32 = 0.05;
/// Longest step integrated in one update, seconds.
const MAX_STEP: f32 = 0.1;

#[derive(Debug, Clone, Copy)]
struct Source {
    kind: SourceKind,
    position: Vec3,
    strength: f32,
    /// Fractional particles carried over to the next update.
    pending: f32,
}

#[derive(Debug, Clone, Copy)]
struct Effect {
    kind: EffectKind,
    position: Vec3,
    strength: f32,
}

#[derive(Debug, Clone, Copy)]
struct Motion {
    velocity: Vec3,
    age: f32,
}

/// A small emitter system: sources spawn particles, effects and world
/// gravity accelerate them, and particles die below the ground or when
/// they outlive their lifetime.
///
/// Positions live in a shared [`ParticleSource`] so the renderer can read
/// them after every update; per-particle motion is kept alongside at the
/// same index.
#[derive(Debug)]
pub struct DemoSimulation {
    options: SimulationOptions,
    rng: StdRng,
    sources: Vec<Source>,
    effects: Vec<Effect>,
    motion: Vec<Motion>,
    positions: ParticleSource,
}

impl DemoSimulation {
    /// Build a simulation seeded from `options.seed`.
    #[must_use]
    pub fn new(options: &SimulationOptions) -> Self {
        Self::with_rng(options, StdRng::seed_from_u64(options.seed))
    }

    /// Build a simulation drawing randomness from `rng`.
    #[must_use]
    pub fn with_rng(options: &SimulationOptions, rng: StdRng) -> Self {
        let mut sim = Self {
            options: options.clone(),
            rng,
            sources: Vec::new(),
            effects: Vec::new(),
            motion: Vec::new(),
            positions: Rc::new(RefCell::new(Vec::new())),
        };
        if options.initial_source {
            sim.add_source(SourceKind::Point, Vec3::new(0.0, 0.0, 1.0), 0.5);
        }
        sim
    }

    /// Shared handle to the particle positions.
    #[must_use]
    pub fn positions(&self) -> ParticleSource {
        Rc::clone(&self.positions)
    }

    /// Live particles.
    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.motion.len()
    }

    /// Emitters currently active.
    #[must_use]
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Force fields currently active.
    #[must_use]
    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    /// The generator used for emission, shared with callers that place new
    /// sources at random.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    fn emit(&mut self, dt: f32, positions: &mut Vec<Vec3>) {
        let rate = self.options.emission_rate;
        let speed = self.options.emission_speed;
        for source in &mut self.sources {
            source.pending += rate * source.strength * dt;
            while source.pending >= 1.0 {
                source.pending -= 1.0;
                if positions.len() >= self.options.max_particles {
                    continue;
                }
                let direction = match source.kind {
                    SourceKind::Point => random_direction(&mut self.rng),
                    SourceKind::Cone => cone_direction(&mut self.rng),
                };
                positions.push(source.position);
                self.motion.push(Motion {
                    velocity: direction * speed * (0.5 + source.strength),
                    age: 0.0,
                });
            }
        }
    }

    fn step(&mut self, dt: f32) {
        let positions_rc = Rc::clone(&self.positions);
        let Ok(mut positions) = positions_rc.try_borrow_mut() else {
            log::warn!("particle positions are borrowed; skipping update");
            return;
        };

        self.emit(dt, &mut positions);

        let gravity = self.options.world_gravity;
        for (position, motion) in positions.iter_mut().zip(&mut self.motion) {
            let accel = acceleration(&self.effects, gravity, *position);
            motion.velocity += accel * dt;
            *position += motion.velocity * dt;
            motion.age += dt;
        }

        let lifetime = self.options.particle_lifetime;
        let mut i = 0;
        while i < positions.len() {
            if positions[i].z < 0.0 || self.motion[i].age > lifetime {
                let _ = positions.swap_remove(i);
                let _ = self.motion.swap_remove(i);
            } else {
                i += 1;
            }
        }
    }
}

impl ParticleSimulation for DemoSimulation {
    fn update(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        // Long stalls (window drags, debugger pauses) integrate in slices.
        let mut remaining = dt;
        while remaining > 0.0 {
            let step = remaining.min(MAX_STEP);
            self.step(step);
            remaining -= step;
        }
    }

    fn add_source(&mut self, kind: SourceKind, position: Vec3, value: f32) {
        log::info!("{kind:?} source at {position} [{value}]");
        self.sources.push(Source {
            kind,
            position,
            strength: value.clamp(0.0, 1.0),
            pending: 0.0,
        });
    }

    fn add_effect(&mut self, kind: EffectKind, position: Vec3, value: f32) {
        log::info!("{kind:?} effect at {position} [{value}]");
        self.effects.push(Effect {
            kind,
            position,
            strength: value.clamp(0.0, 1.0),
        });
    }

    fn remove_all(&mut self) {
        log::info!("removing all sources, effects, and particles");
        self.sources.clear();
        self.effects.clear();
        self.motion.clear();
        match self.positions.try_borrow_mut() {
            Ok(mut positions) => positions.clear(),
            Err(_) => log::warn!("particle positions are borrowed; not cleared"),
        }
    }
}

/// World gravity plus the pull or push of every effect at `position`.
fn acceleration(effects: &[Effect], world_gravity: f32, position: Vec3) -> Vec3 {
    let mut accel = Vec3::NEG_Z * world_gravity;
    for effect in effects {
        let offset = position - effect.position;
        let falloff = offset.length_squared().max(MIN_FALLOFF_DISTANCE_SQ);
        accel += match effect.kind {
            EffectKind::Gravity => {
                -offset.normalize_or_zero() * effect.strength * GRAVITY_STRENGTH
                    / falloff
            }
            EffectKind::Wind => {
                offset.with_z(0.0).normalize_or_zero()
                    * effect.strength
                    * WIND_STRENGTH
                    / (1.0 + falloff)
            }
        };
    }
    accel
}

/// Uniform direction on the unit sphere.
fn random_direction(rng: &mut StdRng) -> Vec3 {
    let theta = rng.random_range(0.0..std::f32::consts::TAU);
    let cos_phi: f32 = rng.random_range(-1.0..=1.0);
    let sin_phi = (1.0 - cos_phi * cos_phi).sqrt();
    Vec3::new(sin_phi * theta.cos(), sin_phi * theta.sin(), cos_phi)
}

/// Direction within [`CONE_HALF_ANGLE`] of +Z.
fn cone_direction(rng: &mut StdRng) -> Vec3 {
    let theta = rng.random_range(0.0..std::f32::consts::TAU);
    let cos_phi = rng.random_range(CONE_HALF_ANGLE.cos()..=1.0);
    let sin_phi = (1.0 - cos_phi * cos_phi).sqrt();
    Vec3::new(sin_phi * theta.cos(), sin_phi * theta.sin(), cos_phi)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> SimulationOptions {
        SimulationOptions {
            initial_source: false,
            ..SimulationOptions::default()
        }
    }

    #[test]
    fn starts_with_configured_source() {
        let sim = DemoSimulation::new(&SimulationOptions::default());
        assert_eq!(sim.source_count(), 1);
        assert_eq!(sim.particle_count(), 0);
        assert!(DemoSimulation::new(&quiet()).source_count() == 0);
    }

    #[test]
    fn emission_follows_rate_and_strength() {
        let mut sim = DemoSimulation::new(&quiet());
        sim.add_source(SourceKind::Cone, Vec3::new(0.0, 0.0, 1.0), 0.5);
        sim.update(0.1);
        // 400/s * 0.5 * 0.1 s
        assert_eq!(sim.particle_count(), 20);
        assert_eq!(sim.positions().borrow().len(), 20);
    }

    #[test]
    fn same_seed_same_positions() {
        let run = || {
            let mut sim = DemoSimulation::new(&SimulationOptions::default());
            for _ in 0..30 {
                sim.update(1.0 / 60.0);
            }
            sim.positions().borrow().clone()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn particles_stay_above_ground() {
        let mut sim = DemoSimulation::new(&SimulationOptions::default());
        sim.add_effect(EffectKind::Wind, Vec3::new(0.5, 0.0, 0.5), 1.0);
        for _ in 0..240 {
            sim.update(1.0 / 60.0);
            assert!(sim.positions().borrow().iter().all(|p| p.z >= 0.0));
        }
        assert!(sim.particle_count() > 0);
    }

    #[test]
    fn particles_expire_after_lifetime() {
        let options = SimulationOptions {
            particle_lifetime: 0.5,
            world_gravity: 0.0,
            ..quiet()
        };
        let mut sim = DemoSimulation::new(&options);
        sim.add_source(SourceKind::Cone, Vec3::new(0.0, 0.0, 1.0), 1.0);
        sim.update(0.05);
        assert!(sim.particle_count() > 0);
        sim.remove_all();
        assert_eq!(sim.particle_count(), 0);

        sim.add_source(SourceKind::Cone, Vec3::new(0.0, 0.0, 1.0), 1.0);
        sim.update(0.05);
        let emitted = sim.particle_count();
        sim.sources.clear();
        sim.update(0.6);
        assert!(emitted > 0);
        assert_eq!(sim.particle_count(), 0);
    }

    #[test]
    fn gravity_effect_pulls_toward_itself() {
        let mut sim = DemoSimulation::new(&SimulationOptions {
            world_gravity: 0.0,
            ..quiet()
        });
        sim.add_effect(EffectKind::Gravity, Vec3::new(1.0, 0.0, 1.0), 1.0);
        let accel = acceleration(&sim.effects, 0.0, Vec3::new(0.0, 0.0, 1.0));
        assert!(accel.x > 0.0);
        assert!(accel.y.abs() < 1e-6 && accel.z.abs() < 1e-6);
    }

    #[test]
    fn max_particles_caps_emission() {
        let mut sim = DemoSimulation::new(&SimulationOptions {
            max_particles: 50,
            ..quiet()
        });
        sim.add_source(SourceKind::Point, Vec3::new(0.0, 0.0, 2.0), 1.0);
        sim.update(1.0);
        assert!(sim.particle_count() <= 50);
    }

    #[test]
    fn cone_directions_point_up() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let d = cone_direction(&mut rng);
            assert!((d.length() - 1.0).abs() < 1e-4);
            assert!(d.z >= CONE_HALF_ANGLE.cos() - 1e-6);
        }
    }
}
