//! Shared utilities.

/// Fixed-rate tick scheduling.
pub mod tick_timer;

pub use tick_timer::TickTimer;
