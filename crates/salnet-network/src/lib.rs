//! River network, habitat accounting, and movement for the salnet
//! simulation.
//!
//! This crate models the physical side of the system: stream reaches as
//! a directed tree draining to a single mouth, synthetic migration and
//! ocean reaches below it, weekly temperature and productivity per
//! reach, and the habitat ledger that rations drift-feeding territory
//! among competing fish.
//!
//! # Modules
//!
//! - [`config`] -- Deserializable settings for network geometry and
//!   habitat rationing.
//! - [`error`] -- Error type for network construction and queries.
//! - [`habitat`] -- Depth/velocity habitat classes, the per-reach
//!   territory ledger, and NREI-ranked preference tables.
//! - [`network`] -- The [`StreamNetwork`] arena: topology wiring,
//!   random sampling, weekly bookkeeping, and named statistics.
//! - [`reach`] -- Per-reach state: attributes, temperatures, gross
//!   primary production, occupancy, and history.
//! - [`route`] -- Waypoint itineraries toward a destination and
//!   undirected weekly movement with boundary stops.
//! - [`starting_network`] -- Built-in demo basin and a synthetic
//!   habitat preference table.

pub mod config;
pub mod error;
pub mod habitat;
pub mod network;
pub mod reach;
pub mod route;
pub mod starting_network;

// Re-export primary types at crate root.
pub use config::{HabitatSettings, NetworkSettings};
pub use error::NetworkError;
pub use habitat::{
    Grant, HabitatClass, HabitatLedger, HabitatPreferenceTable, LengthEntry, RankedClass,
};
pub use network::{
    MIGRATION_SOURCE_ID, NetworkCensus, NetworkRecord, OCEAN_SOURCE_ID, ReachCensus,
    StreamNetwork,
};
pub use reach::{Reach, ReachAttributes, ReachRecord};
pub use route::{
    DownstreamPath, FlowDirection, MovementOutcome, path_downstream_from,
    position_after_movement, route, uniform_position_in,
};
pub use starting_network::{DemoReachIds, create_demo_network, synthetic_preference_table};
