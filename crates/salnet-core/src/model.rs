//! The simulation model: population arenas, id allocation, and
//! reporting queries.
//!
//! [`SimulationModel`] owns everything a run mutates: the stream
//! network, the fish and redd arenas, the live/dead id lists the tick
//! iterates, the monotone id counters, the clock, and the habitat
//! preference table. Fish stay in the arena after death so reporting
//! queries can reach their event logs; dead redds are dropped entirely
//! once purged, their demographic trace surviving in reach histories
//! and fish event logs.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use thiserror::Error;

use salnet_agents::{AgentError, Fish, NewFishParams, Redd, SpawningSettings};
use salnet_network::{
    FlowDirection, HabitatPreferenceTable, NetworkError, StreamNetwork, path_downstream_from,
    uniform_position_in,
};
use salnet_types::{Activity, FishId, LifeHistory, Origin, ReachId, ReddId};

use crate::clock::SimulationClock;

/// Errors from model registration and queries.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A fish id did not resolve to a fish in the arena.
    #[error("unknown fish: {0}")]
    UnknownFish(FishId),

    /// A redd id did not resolve to a live redd in the arena.
    #[error("unknown redd: {0}")]
    UnknownRedd(ReddId),

    /// A random draw was requested from an empty live population.
    #[error("no live fish to sample")]
    EmptyPopulation,

    /// An id counter reached `u64::MAX`.
    #[error("{counter} id counter overflow")]
    IdOverflow {
        /// Which counter overflowed.
        counter: &'static str,
    },

    /// A stream network lookup failed.
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// Fish construction failed.
    #[error(transparent)]
    Agent(#[from] AgentError),
}

/// Authoritative state of one simulation run.
///
/// The live id lists preserve insertion order; the tick re-sorts a copy
/// by fork length each week, so ties fall back to seniority.
pub struct SimulationModel {
    pub(crate) network: StreamNetwork,
    pub(crate) preferences: HabitatPreferenceTable,
    pub(crate) clock: SimulationClock,
    pub(crate) fish: BTreeMap<FishId, Fish>,
    pub(crate) alive_fish: Vec<FishId>,
    pub(crate) dead_fish: Vec<FishId>,
    pub(crate) redds: BTreeMap<ReddId, Redd>,
    pub(crate) alive_redds: Vec<ReddId>,
    pub(crate) next_fish_id: u64,
    pub(crate) next_redd_id: u64,
}

impl SimulationModel {
    /// Create an empty model over a built network.
    #[must_use]
    pub fn new(
        network: StreamNetwork,
        preferences: HabitatPreferenceTable,
        clock: SimulationClock,
    ) -> Self {
        Self {
            network,
            preferences,
            clock,
            fish: BTreeMap::new(),
            alive_fish: Vec::new(),
            dead_fish: Vec::new(),
            redds: BTreeMap::new(),
            alive_redds: Vec::new(),
            next_fish_id: 1,
            next_redd_id: 1,
        }
    }

    /// Seed the starting population before the first tick.
    ///
    /// Each seed draws a life history uniformly and a creation reach at
    /// random, restricted to the steelhead extent for anadromous fish.
    ///
    /// # Errors
    ///
    /// Returns an error when the network has no eligible reach to place
    /// a fish in, or when fish construction fails.
    pub fn seed_initial_population<R: Rng>(
        &mut self,
        count: u32,
        spawning: &SpawningSettings,
        rng: &mut R,
    ) -> Result<(), ModelError> {
        for _ in 0..count {
            let life_history = if rng.random_bool(0.5) {
                LifeHistory::Anadromous
            } else {
                LifeHistory::Resident
            };
            let reach = self.network.random_reach(rng, life_history.is_anadromous())?;
            let position = uniform_position_in(&self.network, rng, reach)?;
            self.add_fish(
                reach,
                life_history,
                Origin::Initiated,
                position,
                spawning,
                rng,
            )?;
        }
        Ok(())
    }

    /// Create a fish and register it as live.
    ///
    /// Allocates the next fish id, runs construction (including the
    /// creation stray draw), inserts the fish into its reach's
    /// membership set, and appends it to the live list. Returns the new
    /// id.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IdOverflow`] when the id counter is
    /// exhausted, or a propagated error when the reach is unknown or
    /// construction fails.
    pub fn add_fish<R: Rng>(
        &mut self,
        reach: ReachId,
        life_history: LifeHistory,
        origin: Origin,
        position_within_reach: f64,
        spawning: &SpawningSettings,
        rng: &mut R,
    ) -> Result<FishId, ModelError> {
        let id = FishId::from_raw(self.next_fish_id);
        let fish = Fish::new(
            NewFishParams {
                id,
                reach,
                position_within_reach,
                life_history,
                origin,
                week: self.clock.week(),
            },
            &self.network,
            rng,
            spawning,
        )?;
        self.next_fish_id = self
            .next_fish_id
            .checked_add(1)
            .ok_or(ModelError::IdOverflow { counter: "fish" })?;
        self.network.reach_mut(reach)?.fish.insert(id);
        self.alive_fish.push(id);
        self.fish.insert(id, fish);
        Ok(id)
    }

    /// Create a redd for a mother fish and register it as live.
    ///
    /// The redd snapshots the mother's identity, life history, and fork
    /// length, and sits at her current reach and position.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownFish`] when the mother is not in the
    /// arena and [`ModelError::IdOverflow`] when the id counter is
    /// exhausted.
    pub fn add_redd(&mut self, mother: FishId) -> Result<ReddId, ModelError> {
        let week = self.clock.week();
        let mother_fish = self.fish.get(&mother).ok_or(ModelError::UnknownFish(mother))?;
        let id = ReddId::from_raw(self.next_redd_id);
        let redd = Redd::new(id, mother_fish, week);
        self.next_redd_id = self
            .next_redd_id
            .checked_add(1)
            .ok_or(ModelError::IdOverflow { counter: "redd" })?;
        self.network.reach_mut(redd.reach)?.redds.insert(id);
        self.alive_redds.push(id);
        self.redds.insert(id, redd);
        Ok(id)
    }

    /// Look up a fish by id, live or dead.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownFish`] when the id was never
    /// allocated.
    pub fn fish_with_id(&self, id: FishId) -> Result<&Fish, ModelError> {
        self.fish.get(&id).ok_or(ModelError::UnknownFish(id))
    }

    /// Mutable fish lookup, live or dead.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownFish`] when the id was never
    /// allocated.
    pub fn fish_with_id_mut(&mut self, id: FishId) -> Result<&mut Fish, ModelError> {
        self.fish.get_mut(&id).ok_or(ModelError::UnknownFish(id))
    }

    /// Look up a redd by id. Only redds that have not been purged
    /// resolve; dead redds leave the arena at the end of their final
    /// tick.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownRedd`] for an absent id.
    pub fn redd_with_id(&self, id: ReddId) -> Result<&Redd, ModelError> {
        self.redds.get(&id).ok_or(ModelError::UnknownRedd(id))
    }

    /// Draw a uniformly random live fish.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EmptyPopulation`] when no fish are alive.
    pub fn random_live_fish<R: Rng>(&self, rng: &mut R) -> Result<&Fish, ModelError> {
        if self.alive_fish.is_empty() {
            return Err(ModelError::EmptyPopulation);
        }
        let index = rng.random_range(0..self.alive_fish.len());
        let id = self
            .alive_fish
            .get(index)
            .copied()
            .ok_or(ModelError::EmptyPopulation)?;
        self.fish.get(&id).ok_or(ModelError::UnknownFish(id))
    }

    /// Every fish, live or dead, that was alive during the given week.
    ///
    /// A fish counts as alive from its birth week through the last week
    /// it was stepped.
    #[must_use]
    pub fn fish_alive_at_week(&self, week: u64) -> Vec<&Fish> {
        self.fish
            .values()
            .filter(|fish| {
                let lived_until = fish.birth_week.saturating_add(u64::from(fish.age_weeks));
                fish.birth_week <= week && week < lived_until
            })
            .collect()
    }

    /// Count gauge passages at a reach over every fish ever simulated.
    ///
    /// The gauge line sits at the downstream end of `gauge`. A
    /// downstream passage is a logged reach transition from the gauge or
    /// above it to strictly below it; an upstream passage is the
    /// reverse. Transitions are classified by the fish's activity in
    /// force during the crossing week, and optionally filtered to one
    /// life history. Weeks-long moves that jump past the gauge entirely
    /// still count as one passage.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Network`] when `gauge` is unknown.
    pub fn passage_count(
        &self,
        gauge: ReachId,
        direction: FlowDirection,
        life_history: Option<LifeHistory>,
        activity: Activity,
    ) -> Result<u32, ModelError> {
        self.network.reach(gauge)?;
        let below: BTreeSet<ReachId> =
            path_downstream_from(&self.network, gauge).skip(1).collect();
        let at_or_above: BTreeSet<ReachId> = self
            .network
            .reaches()
            .map(|reach| reach.id)
            .filter(|&id| path_downstream_from(&self.network, id).any(|step| step == gauge))
            .collect();

        let mut count: u32 = 0;
        for fish in self.fish.values() {
            if life_history.is_some_and(|filter| fish.life_history != filter) {
                continue;
            }
            let history = fish.reach_history();
            for pair in history.windows(2) {
                let [(_, prev), (week, curr)] = pair else {
                    continue;
                };
                let crossed = match direction {
                    FlowDirection::Downstream => {
                        at_or_above.contains(prev) && below.contains(curr)
                    }
                    FlowDirection::Upstream => {
                        below.contains(prev) && at_or_above.contains(curr)
                    }
                };
                if crossed && fish.activity_at_week(*week) == Some(activity) {
                    count = count.saturating_add(1);
                }
            }
        }
        Ok(count)
    }

    /// Number of live fish.
    #[must_use]
    pub fn live_fish_count(&self) -> u32 {
        u32::try_from(self.alive_fish.len()).unwrap_or(u32::MAX)
    }

    /// Number of live redds.
    #[must_use]
    pub fn live_redd_count(&self) -> u32 {
        u32::try_from(self.alive_redds.len()).unwrap_or(u32::MAX)
    }

    /// The stream network.
    #[must_use]
    pub const fn network(&self) -> &StreamNetwork {
        &self.network
    }

    /// Mutable access to the stream network.
    pub const fn network_mut(&mut self) -> &mut StreamNetwork {
        &mut self.network
    }

    /// The simulation clock.
    #[must_use]
    pub const fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// The habitat preference table.
    #[must_use]
    pub const fn preferences(&self) -> &HabitatPreferenceTable {
        &self.preferences
    }

    /// Live fish ids in insertion order.
    #[must_use]
    pub fn alive_fish(&self) -> &[FishId] {
        &self.alive_fish
    }

    /// Ids of fish that have died, in the order their deaths were
    /// recorded.
    #[must_use]
    pub fn dead_fish(&self) -> &[FishId] {
        &self.dead_fish
    }

    /// Live redd ids in insertion order.
    #[must_use]
    pub fn alive_redds(&self) -> &[ReddId] {
        &self.alive_redds
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use salnet_events::FishEvent;
    use salnet_network::{DemoReachIds, NetworkSettings, create_demo_network};

    use super::*;

    fn make_model(seed: u64) -> (SimulationModel, DemoReachIds, SmallRng) {
        let (network, ids) = create_demo_network(&NetworkSettings::default(), 46).unwrap();
        let clock = SimulationClock::from_parts(0, 46, 8).unwrap();
        let model = SimulationModel::new(network, HabitatPreferenceTable::default(), clock);
        (model, ids, SmallRng::seed_from_u64(seed))
    }

    fn spawning() -> SpawningSettings {
        SpawningSettings::default()
    }

    #[test]
    fn adding_a_fish_registers_it_everywhere() {
        let (mut model, ids, mut rng) = make_model(1);
        let id = model
            .add_fish(
                ids.cold_creek,
                LifeHistory::Resident,
                Origin::Initiated,
                1.0,
                &spawning(),
                &mut rng,
            )
            .unwrap();

        assert_eq!(model.alive_fish(), &[id]);
        assert_eq!(model.live_fish_count(), 1);
        assert!(model.dead_fish().is_empty());

        let fish = model.fish_with_id(id).unwrap();
        assert_eq!(fish.reach, ids.cold_creek);
        assert_eq!(fish.natal_reach, ids.cold_creek);
        assert_eq!(fish.position_within_reach, 1.0);
        assert_eq!(fish.origin, Origin::Initiated);
        assert!(
            model
                .network()
                .reach(ids.cold_creek)
                .unwrap()
                .fish
                .contains(&id)
        );
    }

    #[test]
    fn fish_ids_are_monotone_and_distinct() {
        let (mut model, ids, mut rng) = make_model(2);
        let first = model
            .add_fish(
                ids.big_tributary,
                LifeHistory::Resident,
                Origin::Initiated,
                0.5,
                &spawning(),
                &mut rng,
            )
            .unwrap();
        let second = model
            .add_fish(
                ids.big_tributary,
                LifeHistory::Anadromous,
                Origin::Born,
                0.5,
                &spawning(),
                &mut rng,
            )
            .unwrap();

        assert_ne!(first, second);
        assert!(model.fish_with_id(first).is_ok());
        assert!(model.fish_with_id(second).is_ok());
        assert!(matches!(
            model.fish_with_id(FishId::from_raw(999)),
            Err(ModelError::UnknownFish(_))
        ));
    }

    #[test]
    fn adding_a_redd_snapshots_the_mother() {
        let (mut model, ids, mut rng) = make_model(3);
        let mother = model
            .add_fish(
                ids.cold_creek,
                LifeHistory::Anadromous,
                Origin::Initiated,
                1.5,
                &spawning(),
                &mut rng,
            )
            .unwrap();
        model.fish_with_id_mut(mother).unwrap().fork_length_mm = 300.0;

        let redd_id = model.add_redd(mother).unwrap();
        assert_eq!(model.alive_redds(), &[redd_id]);
        assert_eq!(model.live_redd_count(), 1);

        let redd = model.redd_with_id(redd_id).unwrap();
        assert_eq!(redd.mother, mother);
        assert_eq!(redd.mother_life_history, LifeHistory::Anadromous);
        assert_eq!(redd.mother_fork_length_mm, 300.0);
        assert_eq!(redd.reach, ids.cold_creek);
        assert!(
            model
                .network()
                .reach(ids.cold_creek)
                .unwrap()
                .redds
                .contains(&redd_id)
        );
    }

    #[test]
    fn redd_for_an_unknown_mother_is_rejected() {
        let (mut model, _ids, _rng) = make_model(4);
        assert!(matches!(
            model.add_redd(FishId::from_raw(7)),
            Err(ModelError::UnknownFish(_))
        ));
    }

    #[test]
    fn random_live_fish_needs_a_population() {
        let (mut model, ids, mut rng) = make_model(5);
        assert!(matches!(
            model.random_live_fish(&mut rng),
            Err(ModelError::EmptyPopulation)
        ));

        let id = model
            .add_fish(
                ids.middle_mainstem,
                LifeHistory::Resident,
                Origin::Initiated,
                0.2,
                &spawning(),
                &mut rng,
            )
            .unwrap();
        assert_eq!(model.random_live_fish(&mut rng).unwrap().id, id);
    }

    #[test]
    fn seeding_places_anadromous_fish_inside_the_extent() {
        let (mut model, _ids, mut rng) = make_model(6);
        model
            .seed_initial_population(30, &spawning(), &mut rng)
            .unwrap();

        assert_eq!(model.live_fish_count(), 30);
        for &id in model.alive_fish() {
            let fish = model.fish_with_id(id).unwrap();
            assert_eq!(fish.origin, Origin::Initiated);
            let reach = model.network().reach(fish.natal_reach).unwrap();
            assert!(!reach.is_terminal());
            assert!(fish.position_within_reach >= 0.0);
            assert!(fish.position_within_reach <= reach.length_km());
            if fish.life_history.is_anadromous() {
                assert!(reach.attributes.is_within_steelhead_extent);
            }
        }
    }

    #[test]
    fn alive_at_week_spans_birth_through_last_step() {
        let (mut model, ids, mut rng) = make_model(7);
        let id = model
            .add_fish(
                ids.spring_brook,
                LifeHistory::Resident,
                Origin::Initiated,
                0.1,
                &spawning(),
                &mut rng,
            )
            .unwrap();
        {
            let fish = model.fish_with_id_mut(id).unwrap();
            fish.birth_week = 2;
            fish.age_weeks = 5;
        }

        assert!(model.fish_alive_at_week(1).is_empty());
        assert_eq!(model.fish_alive_at_week(2).len(), 1);
        assert_eq!(model.fish_alive_at_week(6).len(), 1);
        assert!(model.fish_alive_at_week(7).is_empty());
    }

    #[test]
    #[allow(clippy::too_many_lines)]
    fn passages_classify_direction_activity_and_life_history() {
        let (mut model, ids, mut rng) = make_model(8);
        let migration = model.network().migration();
        let ocean = model.network().ocean();

        let smolt = model
            .add_fish(
                ids.big_tributary,
                LifeHistory::Anadromous,
                Origin::Initiated,
                1.0,
                &spawning(),
                &mut rng,
            )
            .unwrap();
        {
            let fish = model.fish_with_id_mut(smolt).unwrap();
            fish.set_activity(3, Activity::SmoltOutmigration);
            fish.events
                .append(4, FishEvent::ReachEntered { reach: ids.lower_mainstem });
            fish.events
                .append(5, FishEvent::ReachEntered { reach: migration });
            fish.events.append(6, FishEvent::ReachEntered { reach: ocean });
            fish.set_activity(40, Activity::SpawningMigration);
            fish.events
                .append(41, FishEvent::ReachEntered { reach: ids.lower_mainstem });
            fish.events
                .append(42, FishEvent::ReachEntered { reach: ids.big_tributary });
        }

        let resident = model
            .add_fish(
                ids.big_tributary,
                LifeHistory::Resident,
                Origin::Initiated,
                1.0,
                &spawning(),
                &mut rng,
            )
            .unwrap();
        model
            .fish_with_id_mut(resident)
            .unwrap()
            .events
            .append(2, FishEvent::ReachEntered { reach: ids.lower_mainstem });

        // The mouth gauge sees the smolt leave and the adult return.
        let gauge = ids.lower_mainstem;
        assert_eq!(
            model
                .passage_count(
                    gauge,
                    FlowDirection::Downstream,
                    Some(LifeHistory::Anadromous),
                    Activity::SmoltOutmigration,
                )
                .unwrap(),
            1
        );
        assert_eq!(
            model
                .passage_count(
                    gauge,
                    FlowDirection::Upstream,
                    Some(LifeHistory::Anadromous),
                    Activity::SpawningMigration,
                )
                .unwrap(),
            1
        );
        assert_eq!(
            model
                .passage_count(
                    gauge,
                    FlowDirection::Downstream,
                    Some(LifeHistory::Resident),
                    Activity::SmoltOutmigration,
                )
                .unwrap(),
            0
        );
        assert_eq!(
            model
                .passage_count(
                    gauge,
                    FlowDirection::Upstream,
                    None,
                    Activity::SmoltOutmigration,
                )
                .unwrap(),
            0
        );

        // A gauge on the tributary counts the in-basin move too, split
        // by the activity in force at the crossing.
        assert_eq!(
            model
                .passage_count(
                    ids.big_tributary,
                    FlowDirection::Downstream,
                    None,
                    Activity::FreshwaterGrowth,
                )
                .unwrap(),
            1
        );
        assert_eq!(
            model
                .passage_count(
                    ids.big_tributary,
                    FlowDirection::Downstream,
                    None,
                    Activity::SmoltOutmigration,
                )
                .unwrap(),
            1
        );
    }
}
