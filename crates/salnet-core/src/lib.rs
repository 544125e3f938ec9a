//! Orchestration for the salnet simulation.
//!
//! This crate owns everything above the agents and the river: the
//! weekly clock, YAML-backed configuration, the model that holds the
//! population arenas, the tick that steps one week in dominance order,
//! and the run loop that ticks to a horizon or extinction.
//!
//! # Modules
//!
//! - [`clock`] -- The week counter and its derived calendar
//!   ([`SimulationClock`])
//! - [`config`] -- Run, time, and component settings loaded from YAML
//!   ([`SimulationConfig`])
//! - [`model`] -- Population arenas, id allocation, and reporting
//!   queries ([`SimulationModel`])
//! - [`runner`] -- The run loop and its tick observer hook
//!   ([`run_simulation`])
//! - [`tick`] -- One simulation week in fixed phase order
//!   ([`run_tick`])

pub mod clock;
pub mod config;
pub mod model;
pub mod runner;
pub mod tick;

// Re-export primary types at crate root.
pub use clock::{ClockError, SimulationClock};
pub use config::{ConfigError, RunSettings, SimulationConfig, TimeSettings};
pub use model::{ModelError, SimulationModel};
pub use runner::{
    EndReason, NoOpCallback, RunnerError, SimulationResult, TickCallback, log_simulation_end,
    run_simulation,
};
pub use tick::{TickError, TickSummary, run_tick};
