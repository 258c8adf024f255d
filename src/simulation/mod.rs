//! The particle simulation seam.
//!
//! The renderer never looks inside a simulation. Once per tick it calls
//! [`ParticleSimulation::update`] and then reads whatever positions the
//! simulation left in its shared [`ParticleSource`](crate::renderer::ParticleSource).

/// Seeded emitter system used by the viewer binary.
pub mod demo;

use glam::Vec3;
use rand::Rng;

pub use demo::DemoSimulation;

/// Shape of an emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Emits in every direction.
    Point,
    /// Emits upward inside a narrow cone.
    Cone,
}

/// Force field acting on every particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    /// Pulls particles toward the effect position.
    Gravity,
    /// Pushes particles horizontally away from the effect position.
    Wind,
}

/// Something that moves particles forward in time.
///
/// Only [`update`](Self::update) is required; the editing hooks default to
/// doing nothing. Closures taking the elapsed seconds implement this trait,
/// which is convenient for tests and scripted scenes.
pub trait ParticleSimulation {
    /// Advance by `dt` seconds, mutating the shared positions in place.
    fn update(&mut self, dt: f32);

    /// Add an emitter. `value` is a strength in `[0, 1]`.
    fn add_source(&mut self, _kind: SourceKind, _position: Vec3, _value: f32) {}

    /// Add a force field. `value` is a strength in `[0, 1]`.
    fn add_effect(&mut self, _kind: EffectKind, _position: Vec3, _value: f32) {}

    /// Remove every source, effect, and particle.
    fn remove_all(&mut self) {}
}

impl<F: FnMut(f32)> ParticleSimulation for F {
    fn update(&mut self, dt: f32) {
        self(dt);
    }
}

/// Uniform point in `[-1, 1]³`, used when a source or effect is placed
/// without explicit coordinates.
pub fn random_position<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    Vec3::new(
        rng.random_range(-1.0..=1.0),
        rng.random_range(-1.0..=1.0),
        rng.random_range(-1.0..=1.0),
    )
}
