//! Event kinds recorded by fish and redds.
//!
//! One typed log per entity replaces parallel free-text histories: every
//! state transition worth reporting is a variant here, so queries can
//! match on structure instead of parsing strings.

use serde::{Deserialize, Serialize};

use salnet_types::{Activity, DeathCause, FishId, MovementMode, ReachId, ReddId};

/// Why a fish re-targeted its spawning reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StrayReason {
    /// Strayed at creation: the random draw fired, or the natal reach lies
    /// outside the steelhead extent.
    AtCreation,
    /// Redirected on arrival because the spawning reach had no redd
    /// capacity left.
    ReddCapacity,
}

/// Events recorded in a fish's life log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FishEvent {
    /// The fish entered the simulation in the given reach.
    Born {
        /// Natal reach.
        reach: ReachId,
    },
    /// The behavior cascade changed the fish's activity or movement.
    ActivityChanged {
        /// New activity.
        activity: Activity,
        /// New movement mode.
        movement: MovementMode,
    },
    /// The fish crossed into a new reach.
    ReachEntered {
        /// The reach entered.
        reach: ReachId,
    },
    /// The fish re-targeted its spawning reach.
    Strayed {
        /// What triggered the stray.
        reason: StrayReason,
    },
    /// A female built a redd.
    SpawnedAsFemale {
        /// The redd created.
        redd: ReddId,
    },
    /// A male attended a spawning female.
    SpawnedAsMale,
    /// The fish died.
    Died {
        /// Cause of death.
        cause: DeathCause,
    },
}

/// Events recorded in a redd's log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReddEvent {
    /// The redd was built.
    Created {
        /// The female that built it.
        mother: FishId,
        /// Reach containing the redd.
        reach: ReachId,
    },
    /// A flood destroyed the redd.
    Scoured,
    /// Incubation finished and fry entered the population.
    FryEmerged {
        /// Number of fry released.
        count: u32,
    },
}
