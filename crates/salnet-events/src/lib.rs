//! Typed append-only event logs for SalNet entities.
//!
//! # Modules
//!
//! - [`log`] -- The generic [`EventLog`] container
//! - [`kinds`] -- Fish and redd event kind enums

pub mod kinds;
pub mod log;

pub use kinds::{FishEvent, ReddEvent, StrayReason};
pub use log::{Event, EventLog};
