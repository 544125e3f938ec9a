//! Error types for the salnet-agents crate.
//!
//! All operations that can fail return typed errors rather than panicking.
//! Network lookups bubble up unchanged; the variants here cover failures
//! that originate in agent state itself.

use salnet_network::NetworkError;
use salnet_types::FishId;

/// Errors that can occur while stepping fish and redds.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// A stream network lookup or route computation failed.
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// A fish listed in a reach's membership set was missing from the
    /// population arena.
    #[error("fish not found in population: {0}")]
    UnknownFish(FishId),

    /// An arithmetic overflow occurred while updating a counter.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// Description of what was being computed.
        context: String,
    },
}
