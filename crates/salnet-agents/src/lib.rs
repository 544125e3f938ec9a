//! Fish and redd agents for the salnet simulation.
//!
//! This crate contains the biological logic layer: everything that
//! advances an individual fish or redd through one simulation week
//! without touching orchestration or I/O. It sits between
//! `salnet-network` (the physical river) and the core/runner crates
//! (scheduling and persistence).
//!
//! # Modules
//!
//! - [`behavior`] -- The weekly fish step and its first-match activity
//!   cascade ([`step_fish`])
//! - [`bioenergetics`] -- Wisconsin-model growth, consumption, and the
//!   length-mass relation as pure functions
//! - [`config`] -- Per-life-history settings ([`FishSettings`]) and
//!   spawning parameters ([`SpawningSettings`])
//! - [`context`] -- The borrowed world a stepping agent sees
//!   ([`StepContext`])
//! - [`error`] -- Error type for agent operations ([`AgentError`])
//! - [`fish`] -- Fish state, lifecycle transitions, and log-backed
//!   history queries ([`Fish`])
//! - [`growth`] -- Weekly growth through the habitat ledger or the
//!   ocean curve
//! - [`movement`] -- Directional, random, and route-following movement
//! - [`redd`] -- Egg incubation, scour, and fry emergence ([`Redd`])
//! - [`spawning`] -- Mate finding, redd deposition, and post-spawn
//! - [`stochastic`] -- Normal draws shared by fish and redd code
//! - [`survival`] -- Seasonal length-dependent survival draws

pub mod behavior;
pub mod bioenergetics;
pub mod config;
pub mod context;
pub mod error;
pub mod fish;
pub mod growth;
pub mod movement;
pub mod redd;
pub mod spawning;
pub mod stochastic;
pub mod survival;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
pub(crate) mod testutil;

// Re-export primary types at crate root.
pub use behavior::step_fish;
pub use config::{FishSettings, SpawningSettings};
pub use context::StepContext;
pub use error::AgentError;
pub use fish::{Fish, NewFishParams};
pub use growth::grow;
pub use movement::move_fish;
pub use redd::{Redd, ReddOutcome};
pub use spawning::{female_spawn, post_spawn};
pub use survival::freshwater_weekly_survival;
