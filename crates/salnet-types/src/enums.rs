//! Enumeration types for the SalNet simulation.
//!
//! The life-history state machine (activities and movement modes), the
//! demographic attributes carried by every fish, and the enumerated causes
//! of death shared by fish and redds.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Demographic attributes
// ---------------------------------------------------------------------------

/// Sex of a fish, drawn uniformly at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sex {
    /// Builds redds and initiates spawning.
    Female,
    /// Competes to attend spawning females.
    Male,
}

/// Life-history strategy of a fish, inherited from the mother with a
/// configured probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LifeHistory {
    /// Ocean-migrating steelhead: smolts out, grows at sea, returns to spawn.
    Anadromous,
    /// Stream-resident rainbow trout: completes its life cycle in freshwater.
    Resident,
}

impl LifeHistory {
    /// True for the ocean-migrating strategy.
    #[must_use]
    pub const fn is_anadromous(self) -> bool {
        matches!(self, Self::Anadromous)
    }
}

/// How a fish entered the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Origin {
    /// Emerged from a redd during the simulation.
    Born,
    /// Seeded at startup to initialize the population.
    Initiated,
}

// ---------------------------------------------------------------------------
// Life-history state machine
// ---------------------------------------------------------------------------

/// The activity a fish is engaged in, updated by the weekly behavior
/// cascade. Exactly one activity is in force at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Activity {
    /// Holding a feeding territory and growing in freshwater.
    FreshwaterGrowth,
    /// Seeking cooler water upstream during summer heat.
    SummerColdSeeking,
    /// Seeking warmer water as temperatures drop in fall.
    FallWarmthSeeking,
    /// Undirected exploratory movement by large fish.
    RandomDispersal,
    /// Displaced by competition, searching for an open territory.
    CompetitiveDispersal,
    /// Smolt migrating downstream toward the ocean.
    SmoltOutmigration,
    /// Growing at sea.
    SaltwaterGrowth,
    /// Traveling to the spawning reach.
    SpawningMigration,
    /// Holding at the spawning grounds, spawning or awaiting a mate.
    Spawning,
    /// Resident survivor returning to its home reach after spawning.
    PostspawnReturnHome,
    /// Anadromous survivor (kelt) migrating back to the ocean.
    KeltOutmigration,
}

impl Activity {
    /// True for activities that hold drift-feeding territory and grow in
    /// freshwater. Saltwater growth and all migrations are excluded.
    #[must_use]
    pub const fn grows_in_freshwater(self) -> bool {
        matches!(
            self,
            Self::FreshwaterGrowth
                | Self::SummerColdSeeking
                | Self::FallWarmthSeeking
                | Self::RandomDispersal
                | Self::CompetitiveDispersal
        )
    }
}

/// How a fish moves this week, set alongside the activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MovementMode {
    /// Holding position.
    Stationary,
    /// Moving toward the headwaters at the movement rate.
    Upstream,
    /// Moving toward the ocean at the movement rate.
    Downstream,
    /// A direction chosen at random on the first tick, then kept.
    Random,
    /// Following a computed route to the spawning reach.
    SeekingSpawningReach,
    /// Following a computed route to the home reach.
    SeekingHomeReach,
}

// ---------------------------------------------------------------------------
// Size classes
// ---------------------------------------------------------------------------

/// Fork length at which a small fish becomes medium, in mm.
const SMALL_MEDIUM_BOUNDARY_MM: f64 = 100.0;

/// Fork length above which a fish leaves the medium class, in mm.
const MEDIUM_LARGE_BOUNDARY_MM: f64 = 180.0;

/// Size class of a fish, derived from fork length after each growth step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SizeClass {
    /// Fork length below 100 mm.
    Small,
    /// Fork length from 100 mm through 180 mm.
    Medium,
    /// Fork length above 180 mm.
    Large,
}

impl SizeClass {
    /// Classify a fork length in mm.
    #[must_use]
    pub const fn for_fork_length(fork_length_mm: f64) -> Self {
        if fork_length_mm < SMALL_MEDIUM_BOUNDARY_MM {
            Self::Small
        } else if fork_length_mm <= MEDIUM_LARGE_BOUNDARY_MM {
            Self::Medium
        } else {
            Self::Large
        }
    }
}

// ---------------------------------------------------------------------------
// Death causes
// ---------------------------------------------------------------------------

/// Why a fish or redd left the simulation. The first four apply to fish,
/// the last two to redds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DeathCause {
    /// Mass fell below the starvation threshold of the lifetime maximum.
    Starvation,
    /// Weekly survival draw failed.
    SurvivalModel,
    /// Post-spawn mortality after a successful spawn.
    PostspawnSuccessful,
    /// Post-spawn mortality after failing to spawn.
    PostspawnUnsuccessful,
    /// Redd destroyed by a scouring flood.
    Scoured,
    /// Redd finished incubation and released its fry.
    FryEmerged,
}
