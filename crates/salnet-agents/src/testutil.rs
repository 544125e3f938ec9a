//! Shared fixtures for this crate's tests: a demo river with a seeded
//! RNG and everything a [`StepContext`] borrows.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::SmallRng;

use salnet_network::{
    DemoReachIds, HabitatPreferenceTable, HabitatSettings, NetworkSettings, StreamNetwork,
    create_demo_network, synthetic_preference_table,
};
use salnet_types::{FishId, LifeHistory, Origin, ReachId, Sex};

use crate::config::{FishSettings, SpawningSettings};
use crate::context::StepContext;
use crate::fish::{Fish, NewFishParams};
use crate::redd::Redd;

/// Owns everything a step context borrows, so tests can mint contexts
/// at will.
pub struct Host {
    pub network: StreamNetwork,
    pub ids: DemoReachIds,
    pub rng: SmallRng,
    pub others: BTreeMap<FishId, Fish>,
    pub next_fish_id: u64,
    pub next_redd_id: u64,
    pub spawned_redds: Vec<Redd>,
    pub preferences: HabitatPreferenceTable,
    pub habitat: HabitatSettings,
    pub spawning: SpawningSettings,
    pub resident: FishSettings,
    pub anadromous: FishSettings,
}

impl Host {
    /// Build the demo river and a seeded RNG.
    pub fn new(seed: u64) -> Self {
        let (network, ids) = create_demo_network(&NetworkSettings::default(), 46).unwrap();
        Self {
            network,
            ids,
            rng: SmallRng::seed_from_u64(seed),
            others: BTreeMap::new(),
            next_fish_id: 1,
            next_redd_id: 1,
            spawned_redds: Vec::new(),
            preferences: synthetic_preference_table(),
            habitat: HabitatSettings::default(),
            spawning: SpawningSettings::default(),
            resident: FishSettings::default(),
            anadromous: FishSettings::default_anadromous(),
        }
    }

    /// A context for the given week.
    pub fn ctx(&mut self, week: u64) -> StepContext<'_, SmallRng> {
        StepContext {
            week,
            week_of_year: u32::try_from(week % 46).unwrap_or(0),
            weeks_per_year: 46,
            days_per_week: 8,
            rng: &mut self.rng,
            network: &mut self.network,
            preferences: &self.preferences,
            habitat: &self.habitat,
            spawning: &self.spawning,
            resident: &self.resident,
            anadromous: &self.anadromous,
            others: &mut self.others,
            next_redd_id: &mut self.next_redd_id,
            spawned_redds: &mut self.spawned_redds,
        }
    }

    /// Create a fish in the given reach, registered in the reach's
    /// membership set, and hand it to the caller.
    pub fn spawn_fish(&mut self, reach: ReachId, life_history: LifeHistory, week: u64) -> Fish {
        let id = FishId::from_raw(self.next_fish_id);
        self.next_fish_id += 1;
        let position = self.network.reach(reach).unwrap().length_km() / 2.0;
        let fish = Fish::new(
            NewFishParams {
                id,
                reach,
                position_within_reach: position,
                life_history,
                origin: Origin::Initiated,
                week,
            },
            &self.network,
            &mut self.rng,
            &self.spawning,
        )
        .unwrap();
        self.network.reach_mut(reach).unwrap().fish.insert(id);
        fish
    }

    /// A mature adult of the given sex, sized and aged to pass every
    /// spawning precondition.
    pub fn spawn_adult(
        &mut self,
        reach: ReachId,
        life_history: LifeHistory,
        sex: Sex,
        week: u64,
    ) -> Fish {
        let mut fish = self.spawn_fish(reach, life_history, week);
        fish.sex = sex;
        fish.age_weeks = 150;
        fish.fork_length_mm = 320.0;
        fish.mass_g = 250.0;
        fish.lifetime_maximum_mass_g = 250.0;
        fish.should_spawn_this_year = true;
        if life_history.is_anadromous() {
            fish.ocean_entry_week = Some(40);
        }
        fish
    }

    /// Park a fish in the population map so another fish's step can see
    /// it as a potential mate.
    pub fn adopt(&mut self, fish: Fish) -> FishId {
        let id = fish.id;
        self.others.insert(id, fish);
        id
    }
}
