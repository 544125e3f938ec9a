//! Shared type definitions for the SalNet simulation.
//!
//! This crate is the single source of truth for the identifier and
//! enumeration types used across the SalNet workspace.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe integer wrappers for all entity identifiers
//! - [`enums`] -- Enumeration types (demographics, activities, movement,
//!   size classes, death causes)

pub mod enums;
pub mod ids;

// Re-export all public types at crate root for convenience.
pub use enums::{Activity, DeathCause, LifeHistory, MovementMode, Origin, Sex, SizeClass};
pub use ids::{FishId, ReachId, ReddId};
