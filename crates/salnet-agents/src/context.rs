//! Shared context handed to every per-fish rule.
//!
//! A fish is stepped outside the population map, so the rules that need
//! to see or touch other fish (mate search, post-spawn mortality of the
//! chosen mate) work through [`StepContext::others`], which holds every
//! live fish except the one currently stepping.

use std::collections::BTreeMap;

use rand::Rng;

use salnet_network::{HabitatPreferenceTable, HabitatSettings, StreamNetwork};
use salnet_types::{FishId, LifeHistory};

use crate::config::{FishSettings, SpawningSettings};
use crate::fish::Fish;
use crate::redd::Redd;

/// Everything a fish's weekly step needs beyond the fish itself.
pub struct StepContext<'a, R: Rng> {
    /// Current simulation week.
    pub week: u64,
    /// Week of the simulation year, `week` modulo the year length.
    pub week_of_year: u32,
    /// Weeks per simulation year.
    pub weeks_per_year: u32,
    /// Days represented by one weekly tick.
    pub days_per_week: u32,
    /// Random stream shared by the whole simulation.
    pub rng: &'a mut R,
    /// The river, for temperatures, routing, membership, and territory.
    pub network: &'a mut StreamNetwork,
    /// Ranked habitat preferences by temperature and fork length.
    pub preferences: &'a HabitatPreferenceTable,
    /// Territory ledger tuning.
    pub habitat: &'a HabitatSettings,
    /// Spawning parameters shared by both strategies.
    pub spawning: &'a SpawningSettings,
    /// Behavioral parameters for resident fish.
    pub resident: &'a FishSettings,
    /// Behavioral parameters for anadromous fish.
    pub anadromous: &'a FishSettings,
    /// Every live fish except the one being stepped.
    pub others: &'a mut BTreeMap<FishId, Fish>,
    /// Next redd identifier to allocate.
    pub next_redd_id: &'a mut u64,
    /// Redds deposited during this fish phase, for the model to adopt.
    pub spawned_redds: &'a mut Vec<Redd>,
}

impl<'a, R: Rng> StepContext<'a, R> {
    /// The settings block for a life-history strategy.
    ///
    /// The returned borrow carries the context's lifetime, not the
    /// receiver's, so it can outlive the call and be used alongside
    /// mutable borrows of other context fields.
    #[must_use]
    pub const fn settings_for(&self, life_history: LifeHistory) -> &'a FishSettings {
        match life_history {
            LifeHistory::Anadromous => self.anadromous,
            LifeHistory::Resident => self.resident,
        }
    }
}
