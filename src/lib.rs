// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits (thresholds in clippy.toml)
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::too_many_lines)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![warn(unused_results)]
#![warn(unused_qualifications)]
// Cast hygiene
#![warn(trivial_casts)]
#![warn(trivial_numeric_casts)]

//! Interactive 3D viewer for particle simulations, built on wgpu.
//!
//! Draws a textured ground plane, a cube-mapped skybox, and one
//! camera-facing sprite per particle, and lets the user orbit and zoom an
//! eye around the scene with pointer drags.
//!
//! # Key entry points
//!
//! - [`engine::Engine`] - camera, renderer, and GPU backend for one viewport
//! - [`camera::CameraController`] - constrained orbit and zoom
//! - [`renderer::FrameRenderer`] - fixed-order ground, skybox, particle
//!   draws with per-subsystem readiness
//! - [`simulation::ParticleSimulation`] - the per-tick update seam
//! - [`options::Options`] - runtime configuration (camera, display,
//!   lighting, assets, keybindings)
//!
//! # Architecture
//!
//! Everything runs on one thread. Pointer drags mutate the camera and
//! recompute the view-projection matrix immediately. A fixed-rate tick
//! runs the simulation update, copies the particle positions into a GPU
//! buffer, and draws the frame, in that order. The renderer reaches the GPU
//! only through the [`gpu::RenderBackend`] and [`gpu::AssetLoader`]
//! traits, so asset failures degrade to skipped subsystems and the whole
//! draw path is testable without a device.

pub mod camera;
pub mod engine;
pub mod error;
pub mod gpu;
pub mod input;
pub mod options;
pub mod renderer;
pub mod simulation;
pub mod util;
#[cfg(feature = "viewer")]
pub mod viewer;

pub use engine::Engine;
pub use error::ViewError;
pub use options::Options;
#[cfg(feature = "viewer")]
pub use viewer::Viewer;
