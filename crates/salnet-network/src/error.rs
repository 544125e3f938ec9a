//! Error types for the `salnet-network` crate.
//!
//! All fallible operations in this crate return [`NetworkError`] through
//! the standard [`Result`] type. Every variant here is an invariant
//! violation rather than a simulation outcome: callers are expected to
//! propagate these until the run terminates.

use salnet_types::ReachId;

/// Errors that can occur during network construction, routing, and queries.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// A reach id did not resolve to a reach in the arena.
    #[error("unknown reach: {0}")]
    UnknownReach(ReachId),

    /// No reach carries the given source line id.
    #[error("no reach with source id {0}")]
    UnknownSourceId(i64),

    /// The reach table describes an impossible topology.
    #[error("invalid topology: {message}")]
    Topology {
        /// What is wrong with the reach table.
        message: String,
    },

    /// A reach has no temperature series to sample.
    #[error("reach {reach} has an empty temperature series")]
    EmptyTemperatureSeries {
        /// The offending reach.
        reach: ReachId,
    },

    /// A computed route's endpoint disagrees with the request.
    #[error("route endpoint mismatch: expected reach {expected}, found {found}")]
    RouteEndpointMismatch {
        /// The requested endpoint reach.
        expected: ReachId,
        /// The endpoint the computation produced.
        found: ReachId,
    },

    /// A statistic name matched neither a reach attribute nor a history
    /// field.
    #[error("unknown reach statistic: {name}")]
    UnknownStatistic {
        /// The requested name.
        name: String,
    },

    /// A per-week statistic was requested without a timestep.
    #[error("reach statistic {name} requires a timestep")]
    StatisticNeedsTimestep {
        /// The requested name.
        name: String,
    },

    /// No history record exists for the requested week.
    #[error("no reach history record for week {week}")]
    NoHistoryForWeek {
        /// The requested absolute week.
        week: u64,
    },

    /// The sampling pool for a random reach draw is empty.
    #[error("no reaches available to sample")]
    EmptySamplePool,

    /// A census passed to the network step does not match the reach arena.
    #[error("census covers {given} reaches, network has {expected}")]
    CensusSizeMismatch {
        /// Entries supplied.
        given: usize,
        /// Reaches in the arena.
        expected: usize,
    },
}
