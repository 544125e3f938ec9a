//! End-to-end runs over the built-in demo basin.
//!
//! Each test drives the public API the way the binary does: build the
//! demo network, assemble a model, and tick it. Assertions target
//! whole-run bookkeeping and event-log traces rather than any single
//! survival draw, so a changed seed shifts outcomes without breaking
//! the invariants under test.

// Tests unwrap freely; a panic is a test failure.
#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects, clippy::float_cmp)]

use rand::SeedableRng;
use rand::rngs::SmallRng;

use salnet_core::{
    EndReason, NoOpCallback, SimulationClock, SimulationConfig, SimulationModel, run_simulation,
    run_tick,
};
use salnet_network::{DemoReachIds, create_demo_network, synthetic_preference_table};
use salnet_types::{Activity, LifeHistory, Origin};

fn build_model(config: &SimulationConfig, week: u64) -> (SimulationModel, DemoReachIds) {
    let (network, ids) =
        create_demo_network(&config.network, config.time.weeks_per_year).unwrap();
    let clock = SimulationClock::from_parts(
        week,
        config.time.weeks_per_year,
        config.time.days_per_week,
    )
    .unwrap();
    let model = SimulationModel::new(network, synthetic_preference_table(), clock);
    (model, ids)
}

#[test]
fn a_seeded_run_stays_internally_consistent() {
    let mut config = SimulationConfig::default();
    config.run.weeks_to_run = 60;
    let (mut model, _ids) = build_model(&config, 0);
    let mut rng = SmallRng::seed_from_u64(101);
    model
        .seed_initial_population(40, &config.spawning, &mut rng)
        .unwrap();

    let mut callback = NoOpCallback;
    let result = run_simulation(&mut model, &config, &mut rng, &mut callback).unwrap();

    assert!(result.total_weeks >= 1);
    assert!(result.total_weeks <= 60);
    assert_eq!(model.clock().week(), result.total_weeks);

    // One network record and one record per reach for every week run.
    let weeks = usize::try_from(result.total_weeks).unwrap();
    assert_eq!(model.network().history().len(), weeks);
    for reach in model.network().reaches() {
        assert_eq!(reach.history().len(), weeks);
    }

    // The final summary and the final network record describe the same
    // population.
    let last = result.final_summary.unwrap();
    assert_eq!(last.week, result.total_weeks - 1);
    let totals = model.network().record_for_week(last.week).unwrap();
    assert_eq!(totals.anadromous_fish + totals.resident_fish, last.fish_alive);
    assert_eq!(totals.anadromous_redds + totals.resident_redds, last.redds_alive);

    for &id in model.alive_fish() {
        assert!(model.fish_with_id(id).unwrap().is_alive());
    }
    for &id in model.dead_fish() {
        let fish = model.fish_with_id(id).unwrap();
        assert!(!fish.is_alive());
        assert!(fish.death_cause.is_some());
        assert!(fish.death_week.is_some());
    }

    match result.end_reason {
        EndReason::MaxWeeksReached => assert_eq!(result.total_weeks, 60),
        EndReason::Extinction => {
            assert_eq!(model.live_fish_count(), 0);
            assert_eq!(model.live_redd_count(), 0);
        }
    }
}

#[test]
fn a_smolt_runs_the_corridor_and_turns_marine() {
    let mut config = SimulationConfig::default();
    // A short corridor lets one week at smolt speed reach salt water.
    config.network.network_to_ocean_distance_km = 40.0;
    let (mut model, ids) = build_model(&config, 20);
    let mut rng = SmallRng::seed_from_u64(102);

    let smolt = model
        .add_fish(
            ids.lower_mainstem,
            LifeHistory::Anadromous,
            Origin::Initiated,
            1.0,
            &config.spawning,
            &mut rng,
        )
        .unwrap();
    {
        let fish = model.fish_with_id_mut(smolt).unwrap();
        fish.fork_length_mm = 200.0;
        fish.mass_g = 80.0;
        fish.lifetime_maximum_mass_g = 80.0;
        fish.is_stray = false;
    }

    let first = run_tick(&mut model, &config, &mut rng).unwrap();
    assert_eq!(first.week, 20);

    let migration = model.network().migration();
    let ocean = model.network().ocean();
    {
        let fish = model.fish_with_id(smolt).unwrap();
        assert_eq!(fish.activity_at_week(20), Some(Activity::SmoltOutmigration));
        assert_eq!(fish.reach, ocean);
        let visited: Vec<_> = fish
            .reach_history()
            .into_iter()
            .map(|(_, reach)| reach)
            .collect();
        assert_eq!(visited, vec![ids.lower_mainstem, migration, ocean]);
        assert!(fish.is_alive());
    }

    // The marine switch happens at the start of the next week the fish
    // spends in salt water.
    run_tick(&mut model, &config, &mut rng).unwrap();
    let fish = model.fish_with_id(smolt).unwrap();
    assert_eq!(fish.ocean_entry_week, Some(21));
    assert_eq!(fish.activity_at_week(21), Some(Activity::SaltwaterGrowth));
    assert!(fish.fork_length_mm > 200.0);
}

#[test]
fn incubation_follows_accumulated_degree_days() {
    let config = SimulationConfig::default();
    let (mut model, ids) = build_model(&config, 0);
    let mut rng = SmallRng::seed_from_u64(103);

    // A flat 12 C series accrues 96 degree-days per 8-day week, so the
    // 340 degree-day requirement is crossed on the fourth tick.
    model
        .network_mut()
        .reach_mut(ids.cold_creek)
        .unwrap()
        .attributes
        .temperatures = vec![12.0; 46];

    let mother = model
        .add_fish(
            ids.cold_creek,
            LifeHistory::Resident,
            Origin::Initiated,
            0.8,
            &config.spawning,
            &mut rng,
        )
        .unwrap();
    {
        let fish = model.fish_with_id_mut(mother).unwrap();
        fish.fork_length_mm = 290.0;
        fish.mass_g = 240.0;
        fish.lifetime_maximum_mass_g = 240.0;
    }
    let redd = model.add_redd(mother).unwrap();
    assert_eq!(model.redd_with_id(redd).unwrap().accrued_degree_days, 0.0);

    for expected_week in 0..3 {
        let summary = run_tick(&mut model, &config, &mut rng).unwrap();
        assert_eq!(summary.week, expected_week);
        assert_eq!(summary.fry_emerged, 0);
        assert_eq!(summary.redds_alive, 1);
    }

    let fourth = run_tick(&mut model, &config, &mut rng).unwrap();
    assert!(fourth.fry_emerged > 0);
    assert_eq!(fourth.redds_alive, 0);

    let fry: Vec<_> = model
        .alive_fish()
        .iter()
        .map(|&id| model.fish_with_id(id).unwrap())
        .filter(|fish| fish.origin == Origin::Born)
        .collect();
    assert_eq!(u32::try_from(fry.len()).unwrap(), fourth.fry_emerged);
    for fish in &fry {
        assert_eq!(fish.birth_week, 3);
        assert_eq!(fish.reach, ids.cold_creek);
        assert_eq!(fish.position_within_reach, 0.8);
    }
}
