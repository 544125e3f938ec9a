//! The weekly tick.
//!
//! One tick is the simulation's unit of time: a fixed phase order that
//! steps every agent once, settles the network's bookkeeping, and
//! advances the clock. Competition is expressed entirely through the
//! phase order: bigger fish step earlier, so they drain the habitat
//! ledgers and redd capacity that smaller fish then see.

use std::cmp::Ordering;

use rand::Rng;
use thiserror::Error;
use tracing::info;

use salnet_agents::{AgentError, Fish, Redd, ReddOutcome, StepContext, step_fish};
use salnet_network::{NetworkCensus, NetworkError};
use salnet_types::{FishId, Origin, ReddId};

use crate::clock::ClockError;
use crate::config::SimulationConfig;
use crate::model::{ModelError, SimulationModel};

/// Errors that abort a tick partway through.
#[derive(Debug, Error)]
pub enum TickError {
    /// A fish step failed.
    #[error("failed to step fish {fish}: {source}")]
    Fish {
        /// The fish being stepped.
        fish: FishId,
        /// The underlying agent error.
        source: AgentError,
    },

    /// A redd step failed.
    #[error("failed to step redd {redd}: {source}")]
    Redd {
        /// The redd being stepped.
        redd: ReddId,
        /// The underlying agent error.
        source: AgentError,
    },

    /// Fry from an emerged redd could not be registered.
    #[error("failed to register fry from redd {redd}: {source}")]
    Emergence {
        /// The redd the fry came from.
        redd: ReddId,
        /// The underlying model error.
        source: ModelError,
    },

    /// The network's weekly bookkeeping failed.
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// The clock could not advance.
    #[error(transparent)]
    Clock(#[from] ClockError),
}

/// What one tick did, for logging and run-loop decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    /// The week that was simulated.
    pub week: u64,
    /// Year of that week.
    pub year: u64,
    /// Week within the year.
    pub week_of_year: u32,
    /// Live fish after the tick.
    pub fish_alive: u32,
    /// Fish that died during the tick.
    pub fish_died: u32,
    /// Live redds after the tick.
    pub redds_alive: u32,
    /// Redds deposited during the tick.
    pub redds_created: u32,
    /// Fry that emerged during the tick.
    pub fry_emerged: u32,
}

/// Runs one simulation week.
///
/// Order within the week:
///
/// 1. Every live fish steps once, largest fork length first, so
///    dominant fish claim territory and mates before subordinates. A
///    fish killed earlier in the same week is skipped, not stepped.
/// 2. Redds deposited during the fish phase join the arena, then every
///    live redd accrues degree-days and may scour or emerge. Emerging
///    fry are registered at the redd's reach and position; their first
///    step comes next week.
/// 3. The network logs per-reach occupancy, applies the week's deaths
///    to reach membership, and restores the habitat ledgers.
/// 4. Dead fish move to the dead list but stay in the arena for
///    reporting; dead redds leave the arena. The clock then advances.
///
/// # Errors
///
/// Returns the first fish, redd, fry-registration, network, or clock
/// error. The model keeps whatever progress the week had made.
pub fn run_tick<R: Rng>(
    model: &mut SimulationModel,
    config: &SimulationConfig,
    rng: &mut R,
) -> Result<TickSummary, TickError> {
    let week = model.clock.week();
    let year = model.clock.year();
    let week_of_year = model.clock.week_of_year();

    let mut spawned_redds: Vec<Redd> = Vec::new();
    step_all_fish(model, config, rng, &mut spawned_redds)?;

    let redds_created = u32::try_from(spawned_redds.len()).unwrap_or(u32::MAX);
    for redd in spawned_redds {
        let id = redd.id;
        model.alive_redds.push(id);
        model.redds.insert(id, redd);
    }
    let fry_emerged = step_redds(model, config, rng)?;

    roll_network(model)?;
    let fish_died = purge_dead(model);

    model.clock.advance()?;

    let summary = TickSummary {
        week,
        year,
        week_of_year,
        fish_alive: model.live_fish_count(),
        fish_died,
        redds_alive: model.live_redd_count(),
        redds_created,
        fry_emerged,
    };
    info!(
        week = summary.week,
        year = summary.year,
        week_of_year = summary.week_of_year,
        fish_alive = summary.fish_alive,
        fish_died = summary.fish_died,
        redds_alive = summary.redds_alive,
        redds_created = summary.redds_created,
        fry_emerged = summary.fry_emerged,
        "tick complete"
    );
    Ok(summary)
}

/// Live fish ids, largest fork length first. The sort is stable, so
/// equal lengths fall back to arrival order.
fn dominance_order(model: &SimulationModel) -> Vec<FishId> {
    let mut order = model.alive_fish.clone();
    order.sort_by(|a, b| {
        let length_a = model.fish.get(a).map_or(0.0, |fish| fish.fork_length_mm);
        let length_b = model.fish.get(b).map_or(0.0, |fish| fish.fork_length_mm);
        length_b.partial_cmp(&length_a).unwrap_or(Ordering::Equal)
    });
    order
}

/// Steps every live fish once in dominance order.
///
/// Each fish is lifted out of the arena for its step so the context can
/// hand it a mutable view of everyone else, then put back whatever the
/// outcome. Redds deposited by spawning females collect in
/// `spawned_redds` for the caller to adopt.
fn step_all_fish<R: Rng>(
    model: &mut SimulationModel,
    config: &SimulationConfig,
    rng: &mut R,
    spawned_redds: &mut Vec<Redd>,
) -> Result<(), TickError> {
    let week = model.clock.week();
    let week_of_year = model.clock.week_of_year();
    let weeks_per_year = model.clock.weeks_per_year();
    let days_per_week = model.clock.days_per_week();

    for id in dominance_order(model) {
        let Some(mut fish) = model.fish.remove(&id) else {
            continue;
        };
        if !fish.is_alive() {
            model.fish.insert(id, fish);
            continue;
        }
        let result = {
            let mut ctx = StepContext {
                week,
                week_of_year,
                weeks_per_year,
                days_per_week,
                rng: &mut *rng,
                network: &mut model.network,
                preferences: &model.preferences,
                habitat: &config.habitat,
                spawning: &config.spawning,
                resident: &config.resident,
                anadromous: &config.anadromous,
                others: &mut model.fish,
                next_redd_id: &mut model.next_redd_id,
                spawned_redds: &mut *spawned_redds,
            };
            step_fish(&mut fish, &mut ctx)
        };
        model.fish.insert(id, fish);
        result.map_err(|source| TickError::Fish { fish: id, source })?;
    }
    Ok(())
}

/// Steps every live redd, including those deposited this week, and
/// registers any emerging fry. Returns how many fry were created.
fn step_redds<R: Rng>(
    model: &mut SimulationModel,
    config: &SimulationConfig,
    rng: &mut R,
) -> Result<u32, TickError> {
    let week = model.clock.week();
    let days_per_week = model.clock.days_per_week();

    let mut fry_emerged: u32 = 0;
    for id in model.alive_redds.clone() {
        let (outcome, reach, position) = {
            let Some(redd) = model.redds.get_mut(&id) else {
                continue;
            };
            if !redd.is_alive() {
                continue;
            }
            let reach = redd.reach;
            let position = redd.position_within_reach;
            let outcome = redd
                .step(week, &model.network, rng, &config.spawning, days_per_week)
                .map_err(|source| TickError::Redd { redd: id, source })?;
            (outcome, reach, position)
        };
        if let ReddOutcome::Emerged { life_histories } = outcome {
            for life_history in life_histories {
                model
                    .add_fish(
                        reach,
                        life_history,
                        Origin::Born,
                        position,
                        &config.spawning,
                        rng,
                    )
                    .map_err(|source| TickError::Emergence { redd: id, source })?;
                fry_emerged = fry_emerged.saturating_add(1);
            }
        }
    }
    Ok(fry_emerged)
}

/// Builds the week's census and hands it to the network, which logs
/// occupancy, strips the dead from reach membership, and restores the
/// habitat ledgers.
fn roll_network(model: &mut SimulationModel) -> Result<(), TickError> {
    let week = model.clock.week();
    let mut census = NetworkCensus::new(model.network.reach_count());
    for id in &model.alive_fish {
        match model.fish.get(id) {
            Some(fish) if fish.is_alive() => {
                census.record_fish(fish.reach, fish.life_history);
            }
            _ => {
                census.dead_fish.insert(*id);
            }
        }
    }
    for id in &model.alive_redds {
        match model.redds.get(id) {
            Some(redd) if redd.is_alive() => {
                census.record_redd(redd.reach, redd.mother_life_history);
            }
            _ => {
                census.dead_redds.insert(*id);
            }
        }
    }
    model.network.step(week, &census)?;
    Ok(())
}

/// Moves this week's dead fish to the dead list and drops dead redds
/// from the arena. Returns the number of fish that died.
fn purge_dead(model: &mut SimulationModel) -> u32 {
    let fish_arena = &model.fish;
    let dead_fish_log = &mut model.dead_fish;
    let mut fish_died: u32 = 0;
    model.alive_fish.retain(|id| {
        if fish_arena.get(id).is_some_and(Fish::is_alive) {
            true
        } else {
            dead_fish_log.push(*id);
            fish_died = fish_died.saturating_add(1);
            false
        }
    });

    let redd_arena = &model.redds;
    let mut finished: Vec<ReddId> = Vec::new();
    model.alive_redds.retain(|id| {
        if redd_arena.get(id).is_some_and(Redd::is_alive) {
            true
        } else {
            finished.push(*id);
            false
        }
    });
    for id in &finished {
        model.redds.remove(id);
    }
    fish_died
}
