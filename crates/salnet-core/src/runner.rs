//! The run loop: ticks until the configured horizon or extinction.

use rand::Rng;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::SimulationConfig;
use crate::model::SimulationModel;
use crate::tick::{TickError, TickSummary, run_tick};

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The configured number of weeks completed.
    MaxWeeksReached,
    /// No live fish and no live redds remained.
    Extinction,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationResult {
    /// Why the run stopped.
    pub end_reason: EndReason,
    /// Summary of the last completed tick. `None` for a zero-week run.
    pub final_summary: Option<TickSummary>,
    /// Number of weeks that actually ran.
    pub total_weeks: u64,
}

/// Errors that stop a run.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// A tick failed partway through the run.
    #[error("simulation stopped at week {week}: {source}")]
    Tick {
        /// The week that failed.
        week: u64,
        /// The underlying tick error.
        source: TickError,
    },
}

/// Observer invoked after every completed tick.
///
/// Implementations can inspect the model mid-run to collect statistics
/// or drive output without the runner knowing about either.
pub trait TickCallback {
    /// Called once per completed tick, after the clock has advanced.
    fn after_tick(&mut self, model: &SimulationModel, summary: TickSummary);
}

/// Callback that ignores every tick.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn after_tick(&mut self, _model: &SimulationModel, _summary: TickSummary) {}
}

/// Runs the simulation to its configured horizon.
///
/// Ticks repeat until `config.run.weeks_to_run` weeks complete, or
/// until a tick ends with no live fish and no live redds, whichever
/// comes first. The extinction check runs after the callback, so an
/// observer always sees the final week.
///
/// # Errors
///
/// Returns [`RunnerError::Tick`] wrapping the first tick failure.
pub fn run_simulation<R: Rng, C: TickCallback>(
    model: &mut SimulationModel,
    config: &SimulationConfig,
    rng: &mut R,
    callback: &mut C,
) -> Result<SimulationResult, RunnerError> {
    let mut final_summary: Option<TickSummary> = None;
    let mut completed: u64 = 0;

    while completed < config.run.weeks_to_run {
        let week = model.clock().week();
        let summary =
            run_tick(model, config, rng).map_err(|source| RunnerError::Tick { week, source })?;
        callback.after_tick(model, summary);
        final_summary = Some(summary);
        completed = completed.saturating_add(1);

        if model.live_fish_count() == 0 && model.live_redd_count() == 0 {
            info!(week, "population extinct, stopping early");
            return Ok(SimulationResult {
                end_reason: EndReason::Extinction,
                final_summary,
                total_weeks: completed,
            });
        }
    }

    Ok(SimulationResult {
        end_reason: EndReason::MaxWeeksReached,
        final_summary,
        total_weeks: completed,
    })
}

/// Logs how a run ended.
pub fn log_simulation_end(result: &SimulationResult) {
    match result.final_summary {
        Some(summary) => info!(
            total_weeks = result.total_weeks,
            end_reason = ?result.end_reason,
            fish_alive = summary.fish_alive,
            redds_alive = summary.redds_alive,
            "simulation finished"
        ),
        None => warn!("simulation finished without running a single week"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use salnet_agents::SpawningSettings;
    use salnet_network::{DemoReachIds, create_demo_network, synthetic_preference_table};
    use salnet_types::{LifeHistory, Origin};

    use super::*;
    use crate::clock::SimulationClock;

    fn make_model(seed: u64) -> (SimulationModel, SimulationConfig, DemoReachIds, SmallRng) {
        let config = SimulationConfig::default();
        let (network, ids) =
            create_demo_network(&config.network, config.time.weeks_per_year).unwrap();
        let clock = SimulationClock::new(config.time).unwrap();
        let model = SimulationModel::new(network, synthetic_preference_table(), clock);
        (model, config, ids, SmallRng::seed_from_u64(seed))
    }

    struct CountingCallback {
        ticks: u64,
        last: Option<TickSummary>,
    }

    impl TickCallback for CountingCallback {
        fn after_tick(&mut self, _model: &SimulationModel, summary: TickSummary) {
            self.ticks += 1;
            self.last = Some(summary);
        }
    }

    #[test]
    fn a_zero_week_run_does_nothing() {
        let (mut model, mut config, _ids, mut rng) = make_model(31);
        config.run.weeks_to_run = 0;
        let mut callback = CountingCallback { ticks: 0, last: None };

        let result = run_simulation(&mut model, &config, &mut rng, &mut callback).unwrap();
        assert_eq!(result.end_reason, EndReason::MaxWeeksReached);
        assert_eq!(result.total_weeks, 0);
        assert!(result.final_summary.is_none());
        assert_eq!(callback.ticks, 0);
        assert_eq!(model.clock().week(), 0);
        log_simulation_end(&result);
    }

    #[test]
    fn an_empty_population_goes_extinct_after_one_week() {
        let (mut model, mut config, _ids, mut rng) = make_model(32);
        config.run.weeks_to_run = 50;
        let mut callback = NoOpCallback;

        let result = run_simulation(&mut model, &config, &mut rng, &mut callback).unwrap();
        assert_eq!(result.end_reason, EndReason::Extinction);
        assert_eq!(result.total_weeks, 1);
        let summary = result.final_summary.unwrap();
        assert_eq!(summary.week, 0);
        assert_eq!(summary.fish_alive, 0);
        assert_eq!(model.clock().week(), 1);
    }

    #[test]
    fn a_single_week_run_reports_its_tick() {
        let (mut model, mut config, ids, mut rng) = make_model(33);
        config.run.weeks_to_run = 1;
        let fish = model
            .add_fish(
                ids.cold_creek,
                LifeHistory::Resident,
                Origin::Initiated,
                0.5,
                &SpawningSettings::default(),
                &mut rng,
            )
            .unwrap();
        model.fish_with_id_mut(fish).unwrap().lifetime_maximum_mass_g = 0.1;
        let mut callback = CountingCallback { ticks: 0, last: None };

        let result = run_simulation(&mut model, &config, &mut rng, &mut callback).unwrap();
        assert_eq!(result.end_reason, EndReason::MaxWeeksReached);
        assert_eq!(result.total_weeks, 1);
        assert_eq!(callback.ticks, 1);
        assert_eq!(callback.last, result.final_summary);

        let summary = result.final_summary.unwrap();
        assert_eq!(summary.week, 0);
        assert_eq!(summary.fish_alive, 1);
        assert_eq!(model.clock().week(), 1);
    }

    #[test]
    fn a_seeded_run_keeps_history_and_clock_in_step() {
        let (mut model, mut config, _ids, mut rng) = make_model(34);
        config.run.weeks_to_run = 10;
        model
            .seed_initial_population(6, &config.spawning, &mut rng)
            .unwrap();
        let mut callback = CountingCallback { ticks: 0, last: None };

        let result = run_simulation(&mut model, &config, &mut rng, &mut callback).unwrap();
        assert!(result.total_weeks >= 1);
        assert!(result.total_weeks <= 10);
        assert_eq!(callback.ticks, result.total_weeks);
        assert_eq!(model.clock().week(), result.total_weeks);
        assert_eq!(
            model.network().history().len(),
            usize::try_from(result.total_weeks).unwrap()
        );
        match result.end_reason {
            EndReason::MaxWeeksReached => assert_eq!(result.total_weeks, 10),
            EndReason::Extinction => {
                assert_eq!(model.live_fish_count(), 0);
                assert_eq!(model.live_redd_count(), 0);
            }
        }
        log_simulation_end(&result);
    }
}
