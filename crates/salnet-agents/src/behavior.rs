//! The weekly fish step and its behavior cascade.
//!
//! `step_fish` runs the phases of one simulation week for one fish:
//! annual reset, history, the activity cascade, movement, clocks,
//! growth, and the survival draw. The cascade is a single first-match
//! chain, so at most one transition fires per week.

use rand::Rng;

use salnet_events::{FishEvent, StrayReason};
use salnet_types::{Activity, MovementMode, Sex, SizeClass};

use crate::context::StepContext;
use crate::error::AgentError;
use crate::fish::Fish;
use crate::{growth, movement, spawning, survival};

// ----- Cascade constants -----

/// Temperature above which growing fish start seeking cold water, deg C.
const COLD_SEEKING_ONSET_C: f64 = 24.0;
/// Temperature at which cold-seeking fish settle back down, deg C.
const COLD_SEEKING_RELEASE_C: f64 = 20.0;
/// Upstream rate for small cold-seeking fish, km/week.
const COLD_SEEKING_RATE_SMALL_KM_PER_WEEK: f64 = 0.4;
/// Upstream rate for cold-seeking fish past their first year, km/week.
const COLD_SEEKING_RATE_KM_PER_WEEK: f64 = 1.0;
/// Weekly probability that a large growing fish starts dispersing. Works
/// out to about a nine percent annual chance.
const RANDOM_DISPERSAL_PROBABILITY: f64 = 0.002;
/// Movement rate while randomly dispersing, km/week.
const RANDOM_DISPERSAL_RATE_KM_PER_WEEK: f64 = 5.0;
/// Weekly probability that a dispersing fish settles where it is.
const DISPERSAL_SETTLE_PROBABILITY: f64 = 0.25;
/// Wander rate for a displaced fish that had been holding position,
/// km/week.
const DISPLACED_WANDER_RATE_KM_PER_WEEK: f64 = 1.0;

/// Probability that an anadromous fish commits to spawning this year,
/// by completed years at sea. First-year fish stay in the ocean.
const fn anadromous_spawn_probability(ocean_years: u32) -> f64 {
    match ocean_years {
        0 => 0.0,
        1 => 0.07,
        2 => 0.60,
        3 => 0.76,
        _ => 1.0,
    }
}

/// Advances one fish through one simulation week.
///
/// Phase order: annual reset on week zero of the year, history append,
/// the behavior cascade, movement when not stationary, clock advances,
/// growth for growth-eligible activities, then the survival draw. A
/// fish can die mid-step; later phases still run and `die` keeps the
/// first recorded cause.
///
/// # Errors
///
/// Returns [`AgentError::Network`] when the fish's reach identifier is
/// stale and [`AgentError::ArithmeticOverflow`] when a clock or id
/// counter overflows.
pub fn step_fish<R: Rng>(fish: &mut Fish, ctx: &mut StepContext<'_, R>) -> Result<(), AgentError> {
    if ctx.week_of_year == 0 {
        annual_reset(fish, ctx);
    }

    let temperature = ctx.network.temperature_at_week(fish.reach, ctx.week)?;
    fish.length_history_mm.push(fish.fork_length_mm);
    fish.mass_history_g.push(fish.mass_g);
    fish.temperature_history_c.push(temperature);

    dispatch(fish, ctx, temperature)?;

    if fish.movement_mode != MovementMode::Stationary {
        movement::move_fish(fish, ctx)?;
    }

    fish.activity_duration_weeks = fish
        .activity_duration_weeks
        .checked_add(1)
        .ok_or_else(|| AgentError::ArithmeticOverflow {
            context: String::from("activity duration increment"),
        })?;
    fish.age_weeks = fish
        .age_weeks
        .checked_add(1)
        .ok_or_else(|| AgentError::ArithmeticOverflow {
            context: String::from("age increment"),
        })?;
    if ctx.network.reach(fish.reach)?.is_ocean {
        fish.ocean_age_weeks =
            fish.ocean_age_weeks
                .checked_add(1)
                .ok_or_else(|| AgentError::ArithmeticOverflow {
                    context: String::from("ocean age increment"),
                })?;
    }

    if fish.activity == Activity::SaltwaterGrowth || fish.activity.grows_in_freshwater() {
        growth::grow(fish, ctx)?;
    }

    survival::apply_survival(fish, ctx)?;
    Ok(())
}

/// Start-of-year bookkeeping. Residents always intend to spawn;
/// anadromous fish commit with a probability that climbs with their
/// completed years at sea.
fn annual_reset<R: Rng>(fish: &mut Fish, ctx: &mut StepContext<'_, R>) {
    fish.has_spawned_this_year = false;
    if fish.life_history.is_anadromous() {
        let ocean_years = fish
            .ocean_age_weeks
            .checked_div(ctx.weeks_per_year)
            .unwrap_or(0);
        let probability = anadromous_spawn_probability(ocean_years);
        fish.should_spawn_this_year = ctx.rng.random::<f64>() < probability;
    } else {
        fish.should_spawn_this_year = true;
    }
}

/// The first-match behavior chain. `temperature` is this week's water
/// temperature in the fish's current reach.
#[allow(clippy::too_many_lines)]
fn dispatch<R: Rng>(
    fish: &mut Fish,
    ctx: &mut StepContext<'_, R>,
    temperature: f64,
) -> Result<(), AgentError> {
    let settings = ctx.settings_for(fish.life_history);
    let week = ctx.week;
    let week_of_year = ctx.week_of_year;

    let reach = ctx.network.reach(fish.reach)?;
    let in_ocean = reach.is_ocean;
    let capacity_redds = reach.capacity_redds();
    let has_redd_capacity = reach.has_redd_capacity();

    // Anadromous juveniles big enough to smolt head for the ocean.
    if fish.activity == Activity::FreshwaterGrowth
        && fish.life_history.is_anadromous()
        && fish.fork_length_mm >= settings.smolt_min_fork_length_mm
        && settings.smolt_window_contains(week_of_year)
    {
        fish.set_movement(
            MovementMode::Downstream,
            settings.smolt_outmigration_speed_km_per_week,
        );
        fish.set_activity(week, Activity::SmoltOutmigration);

    // Smolts arriving at the ocean stay there.
    } else if fish.activity == Activity::SmoltOutmigration && in_ocean {
        fish.ocean_entry_week = Some(week);
        fish.set_movement(MovementMode::Stationary, 0.0);
        fish.set_activity(week, Activity::SaltwaterGrowth);

    // Fish in hot water during summer climb toward cold headwaters.
    } else if fish.activity == Activity::FreshwaterGrowth
        && temperature > COLD_SEEKING_ONSET_C
        && settings.cold_seeking_window_contains(week_of_year)
    {
        let rate = if fish.size_class() == SizeClass::Small {
            COLD_SEEKING_RATE_SMALL_KM_PER_WEEK
        } else {
            COLD_SEEKING_RATE_KM_PER_WEEK
        };
        fish.set_movement(MovementMode::Upstream, rate);
        fish.set_activity(week, Activity::SummerColdSeeking);

    // Cold-seekers stop once the water is cool enough.
    } else if fish.activity == Activity::SummerColdSeeking
        && temperature <= COLD_SEEKING_RELEASE_C
    {
        fish.set_movement(MovementMode::Stationary, 0.0);
        fish.set_activity(week, Activity::FreshwaterGrowth);

    // A small share of large fish take off wandering.
    } else if fish.activity == Activity::FreshwaterGrowth
        && fish.size_class() == SizeClass::Large
        && ctx.rng.random::<f64>() < RANDOM_DISPERSAL_PROBABILITY
    {
        fish.set_movement(MovementMode::Random, RANDOM_DISPERSAL_RATE_KM_PER_WEEK);
        fish.set_activity(week, Activity::RandomDispersal);

    // Wanderers settle and adopt a new home.
    } else if fish.activity == Activity::RandomDispersal
        && ctx.rng.random::<f64>() < DISPERSAL_SETTLE_PROBABILITY
    {
        fish.set_movement(MovementMode::Stationary, 0.0);
        fish.set_activity(week, Activity::FreshwaterGrowth);
        fish.home_reach = fish.reach;
        if !fish.life_history.is_anadromous() && capacity_redds > 0.0 {
            fish.spawning_reach = fish.reach;
        }

    // A shorted territory grant displaces the fish; a full one lets a
    // displaced fish settle where it stands.
    } else if fish.activity.grows_in_freshwater() && fish.last_ration_fraction < 1.0 {
        if fish.activity != Activity::CompetitiveDispersal {
            if fish.movement_mode == MovementMode::Stationary {
                fish.set_movement(MovementMode::Random, DISPLACED_WANDER_RATE_KM_PER_WEEK);
            }
            fish.set_activity(week, Activity::CompetitiveDispersal);
        }
    } else if fish.activity == Activity::CompetitiveDispersal {
        fish.set_movement(MovementMode::Stationary, 0.0);
        fish.set_activity(week, Activity::FreshwaterGrowth);
        fish.home_reach = fish.reach;

    // Mature fish in their window head for the spawning grounds. This
    // can fire out of saltwater growth.
    } else if fish.is_mature(settings.age_at_maturity_weeks)
        && !fish.has_spawned_this_year
        && !matches!(
            fish.activity,
            Activity::SpawningMigration | Activity::Spawning
        )
        && settings.spawning_window_contains(week_of_year)
        && fish.should_spawn_this_year
    {
        fish.set_movement(
            MovementMode::SeekingSpawningReach,
            settings.spawning_migration_speed_km_per_week,
        );
        fish.set_activity(week, Activity::SpawningMigration);

    // Arrival arbitration at the spawning grounds.
    } else if fish.activity == Activity::SpawningMigration {
        if fish.reach == fish.spawning_reach && !fish.is_stray {
            if has_redd_capacity {
                fish.set_activity(week, Activity::Spawning);
            } else {
                fish.is_stray = true;
                fish.events.append(
                    week,
                    FishEvent::Strayed {
                        reason: StrayReason::ReddCapacity,
                    },
                );
                fish.set_movement(MovementMode::Random, fish.movement_rate_km_per_week);
            }
        } else if fish.is_stray {
            match fish.sex {
                // Female strays stop at the first open spawning gravel.
                Sex::Female => {
                    if has_redd_capacity {
                        fish.set_activity(week, Activity::Spawning);
                    }
                }
                // Male strays stop at the first spawning females.
                Sex::Male => {
                    if spawning::colocated_spawning_female_exists(fish, ctx)? {
                        fish.set_movement(MovementMode::Stationary, 0.0);
                        fish.set_activity(week, Activity::Spawning);
                    }
                }
            }
        }

    // Spawning females attempt to spawn; lone males time out.
    } else if fish.activity == Activity::Spawning && fish.sex == Sex::Female {
        spawning::female_spawn(fish, ctx)?;
    } else if fish.activity == Activity::Spawning
        && fish.sex == Sex::Male
        && fish.activity_duration_weeks >= ctx.spawning.max_weeks_to_wait_without_mate
    {
        spawning::post_spawn(fish, week, ctx.rng, settings, false);

    // Kelts arriving back at the ocean stay there.
    } else if fish.activity == Activity::KeltOutmigration && in_ocean {
        fish.set_movement(MovementMode::Stationary, 0.0);
        fish.set_activity(week, Activity::SaltwaterGrowth);

    // Homeward residents stand down on arrival.
    } else if fish.activity == Activity::PostspawnReturnHome && fish.reach == fish.home_reach {
        fish.set_movement(MovementMode::Stationary, 0.0);
        fish.set_activity(week, Activity::FreshwaterGrowth);
    }
    Ok(())
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::float_cmp,
    clippy::arithmetic_side_effects,
    clippy::panic
)]
mod tests {
    use salnet_types::{LifeHistory, ReddId};

    use super::*;
    use crate::testutil::Host;

    #[test]
    fn spawn_commitment_climbs_with_ocean_years() {
        assert_eq!(anadromous_spawn_probability(0), 0.0);
        assert_eq!(anadromous_spawn_probability(1), 0.07);
        assert_eq!(anadromous_spawn_probability(2), 0.60);
        assert_eq!(anadromous_spawn_probability(3), 0.76);
        assert_eq!(anadromous_spawn_probability(4), 1.0);
        assert_eq!(anadromous_spawn_probability(9), 1.0);
    }

    #[test]
    fn big_anadromous_juveniles_smolt_in_the_window() {
        let mut host = Host::new(41);
        let reach = host.ids.lower_mainstem;
        let mut fish = host.spawn_fish(reach, LifeHistory::Anadromous, 0);
        fish.fork_length_mm = 185.0;
        fish.mass_g = 60.0;
        fish.lifetime_maximum_mass_g = 60.0;

        let mut ctx = host.ctx(20);
        step_fish(&mut fish, &mut ctx).unwrap();

        assert_eq!(fish.activity, Activity::SmoltOutmigration);
        assert_eq!(fish.movement_mode, MovementMode::Downstream);
        assert_eq!(fish.movement_rate_km_per_week, 50.0);
        assert!(host.network.reach(fish.reach).unwrap().is_migration);
    }

    #[test]
    fn undersized_or_out_of_window_fish_do_not_smolt() {
        let mut host = Host::new(42);
        let reach = host.ids.lower_mainstem;

        // In the window but too short.
        let mut small = host.spawn_fish(reach, LifeHistory::Anadromous, 0);
        small.fork_length_mm = 100.0;
        let mut ctx = host.ctx(20);
        step_fish(&mut small, &mut ctx).unwrap();
        assert_eq!(small.activity, Activity::FreshwaterGrowth);

        // Long enough but outside the window, and too young to fall
        // through to the spawning rule.
        let mut late = host.spawn_fish(reach, LifeHistory::Anadromous, 0);
        late.fork_length_mm = 185.0;
        late.age_weeks = 50;
        let mut ctx = host.ctx(30);
        step_fish(&mut late, &mut ctx).unwrap();
        assert_eq!(late.activity, Activity::FreshwaterGrowth);
    }

    #[test]
    fn smolts_entering_the_ocean_switch_to_saltwater_growth() {
        let mut host = Host::new(43);
        let ocean = host.network.ocean();
        let mut fish = host.spawn_fish(ocean, LifeHistory::Anadromous, 0);
        fish.fork_length_mm = 190.0;
        fish.mass_g = 70.0;
        fish.activity = Activity::SmoltOutmigration;

        let mut ctx = host.ctx(30);
        step_fish(&mut fish, &mut ctx).unwrap();

        assert_eq!(fish.activity, Activity::SaltwaterGrowth);
        assert_eq!(fish.movement_mode, MovementMode::Stationary);
        assert_eq!(fish.ocean_entry_week, Some(30));
        assert_eq!(fish.ocean_age_weeks, 1);
    }

    #[test]
    fn hot_water_triggers_cold_seeking_and_cooling_releases_it() {
        let mut host = Host::new(44);
        let reach = host.ids.middle_mainstem;
        let mut fish = host.spawn_fish(reach, LifeHistory::Resident, 0);
        host.network.reach_mut(reach).unwrap().attributes.temperatures = vec![26.0; 46];

        let mut ctx = host.ctx(30);
        step_fish(&mut fish, &mut ctx).unwrap();
        assert_eq!(fish.activity, Activity::SummerColdSeeking);
        assert_eq!(fish.movement_rate_km_per_week, 0.4);

        let cooled = host.network.reach(fish.reach).unwrap().id;
        host.network.reach_mut(cooled).unwrap().attributes.temperatures = vec![18.0; 46];
        let mut ctx = host.ctx(31);
        step_fish(&mut fish, &mut ctx).unwrap();
        assert_eq!(fish.activity, Activity::FreshwaterGrowth);
        assert_eq!(fish.movement_mode, MovementMode::Stationary);
    }

    #[test]
    fn older_cold_seekers_climb_faster() {
        let mut host = Host::new(45);
        let reach = host.ids.middle_mainstem;
        host.network.reach_mut(reach).unwrap().attributes.temperatures = vec![26.0; 46];
        let mut fish = host.spawn_fish(reach, LifeHistory::Resident, 0);
        fish.fork_length_mm = 140.0;
        fish.mass_g = 25.0;
        fish.lifetime_maximum_mass_g = 25.0;

        let mut ctx = host.ctx(30);
        step_fish(&mut fish, &mut ctx).unwrap();
        assert_eq!(fish.activity, Activity::SummerColdSeeking);
        assert_eq!(fish.movement_rate_km_per_week, 1.0);
    }

    #[test]
    fn settling_wanderers_adopt_a_new_home() {
        // Settling is a 1-in-4 weekly draw, so try fresh seeds until one
        // settles on its first step.
        for seed in 0..50 {
            let mut host = Host::new(seed);
            let reach = host.ids.big_tributary;
            let mut fish = host.spawn_adult(reach, LifeHistory::Resident, Sex::Female, 0);
            fish.activity = Activity::RandomDispersal;
            fish.set_movement(MovementMode::Random, RANDOM_DISPERSAL_RATE_KM_PER_WEEK);

            let mut ctx = host.ctx(4);
            step_fish(&mut fish, &mut ctx).unwrap();
            if fish.activity == Activity::FreshwaterGrowth {
                assert_eq!(fish.movement_mode, MovementMode::Stationary);
                assert_eq!(fish.home_reach, fish.reach);
                assert_eq!(fish.spawning_reach, fish.reach);
                return;
            }
        }
        panic!("no seed settled a wandering fish on its first step");
    }

    #[test]
    fn short_rations_displace_and_a_full_grant_resettles() {
        let mut host = Host::new(46);
        let reach = host.ids.cold_creek;
        let mut fish = host.spawn_adult(reach, LifeHistory::Resident, Sex::Male, 0);
        fish.should_spawn_this_year = false;
        fish.last_ration_fraction = 0.5;

        let mut ctx = host.ctx(5);
        step_fish(&mut fish, &mut ctx).unwrap();
        assert_eq!(fish.activity, Activity::CompetitiveDispersal);
        assert_eq!(fish.movement_rate_km_per_week, 1.0);
        assert!(matches!(
            fish.movement_mode,
            MovementMode::Upstream | MovementMode::Downstream
        ));
        // The demo ledger is far from full, so the displaced week's own
        // allocation restores a full ration.
        assert_eq!(fish.last_ration_fraction, 1.0);

        let mut ctx = host.ctx(6);
        step_fish(&mut fish, &mut ctx).unwrap();
        assert_eq!(fish.activity, Activity::FreshwaterGrowth);
        assert_eq!(fish.movement_mode, MovementMode::Stationary);
        assert_eq!(fish.home_reach, fish.reach);
    }

    #[test]
    fn mature_residents_migrate_arrive_and_start_spawning() {
        for seed in 0..10 {
            let mut host = Host::new(seed);
            let start = host.ids.big_tributary;
            let target = host.ids.spring_brook;
            let mut fish = host.spawn_adult(start, LifeHistory::Resident, Sex::Female, 0);
            fish.spawning_reach = target;

            let mut week = 368u64; // week of year 0 in year 8
            let mut ctx = host.ctx(week + 8);
            step_fish(&mut fish, &mut ctx).unwrap();
            assert_eq!(fish.activity, Activity::SpawningMigration);
            assert_eq!(fish.movement_mode, MovementMode::SeekingSpawningReach);
            assert_eq!(fish.movement_rate_km_per_week, 5.0);

            week += 9;
            while fish.is_alive() && fish.activity == Activity::SpawningMigration && week < 390 {
                let mut ctx = host.ctx(week);
                step_fish(&mut fish, &mut ctx).unwrap();
                week += 1;
            }
            if fish.is_alive() && fish.activity == Activity::Spawning {
                assert_eq!(fish.reach, target);
                assert!(!fish.is_stray);
                return;
            }
        }
        panic!("no seed carried a migrant alive to its spawning reach");
    }

    #[test]
    fn full_spawning_grounds_turn_arrivals_into_strays() {
        let mut host = Host::new(48);
        // The middle mainstem has open neighbors both upstream and
        // downstream, so the stray lands on open gravel either way.
        let reach = host.ids.middle_mainstem;
        let mut fish = host.spawn_adult(reach, LifeHistory::Resident, Sex::Female, 0);
        fish.activity = Activity::SpawningMigration;
        fish.set_movement(MovementMode::SeekingSpawningReach, 5.0);

        let mut raw = 1_000u64;
        while host.network.reach(reach).unwrap().has_redd_capacity() {
            host.network
                .reach_mut(reach)
                .unwrap()
                .redds
                .insert(ReddId::from_raw(raw));
            raw += 1;
        }

        let mut ctx = host.ctx(10);
        step_fish(&mut fish, &mut ctx).unwrap();

        assert!(fish.is_stray);
        assert_eq!(fish.activity, Activity::SpawningMigration);
        assert_eq!(fish.movement_rate_km_per_week, 5.0);
        assert!(fish.events.iter().any(|entry| {
            entry.kind
                == FishEvent::Strayed {
                    reason: StrayReason::ReddCapacity,
                }
        }));

        // Wherever the stray wandered to, the demo network has open
        // gravel, so she starts spawning on the next step.
        let mut ctx = host.ctx(11);
        step_fish(&mut fish, &mut ctx).unwrap();
        assert_eq!(fish.activity, Activity::Spawning);
    }

    #[test]
    fn stray_males_stop_for_spawning_females() {
        let mut host = Host::new(49);
        let reach = host.ids.tributary_fork;
        let mut female = host.spawn_adult(reach, LifeHistory::Resident, Sex::Female, 0);
        female.activity = Activity::Spawning;
        host.adopt(female);

        let mut male = host.spawn_adult(reach, LifeHistory::Resident, Sex::Male, 0);
        male.activity = Activity::SpawningMigration;
        male.is_stray = true;
        male.spawning_reach = host.ids.headwaters;
        male.set_movement(MovementMode::Random, 5.0);

        let mut ctx = host.ctx(10);
        step_fish(&mut male, &mut ctx).unwrap();

        assert_eq!(male.activity, Activity::Spawning);
        assert_eq!(male.movement_mode, MovementMode::Stationary);
    }

    #[test]
    fn kelts_reaching_the_ocean_resume_saltwater_growth() {
        let mut host = Host::new(50);
        let ocean = host.network.ocean();
        let mut fish = host.spawn_adult(ocean, LifeHistory::Anadromous, Sex::Female, 0);
        fish.activity = Activity::KeltOutmigration;
        fish.set_movement(MovementMode::Downstream, 200.0);

        let mut ctx = host.ctx(44);
        step_fish(&mut fish, &mut ctx).unwrap();

        assert_eq!(fish.activity, Activity::SaltwaterGrowth);
        assert_eq!(fish.movement_mode, MovementMode::Stationary);
        assert_eq!(fish.ocean_entry_week, Some(40));
    }

    #[test]
    fn homeward_residents_stand_down_at_home() {
        let mut host = Host::new(51);
        let reach = host.ids.upper_mainstem;
        let mut fish = host.spawn_adult(reach, LifeHistory::Resident, Sex::Male, 0);
        fish.should_spawn_this_year = false;
        fish.activity = Activity::PostspawnReturnHome;
        fish.home_reach = reach;

        let mut ctx = host.ctx(25);
        step_fish(&mut fish, &mut ctx).unwrap();

        assert_eq!(fish.activity, Activity::FreshwaterGrowth);
        assert_eq!(fish.movement_mode, MovementMode::Stationary);
    }

    #[test]
    fn new_year_resets_spawning_state() {
        let mut host = Host::new(52);
        let reach = host.ids.upper_mainstem;

        let mut resident = host.spawn_adult(reach, LifeHistory::Resident, Sex::Female, 0);
        resident.has_spawned_this_year = true;
        resident.should_spawn_this_year = false;
        resident.activity = Activity::PostspawnReturnHome;
        resident.home_reach = host.ids.headwaters;
        let mut ctx = host.ctx(92);
        step_fish(&mut resident, &mut ctx).unwrap();
        assert!(!resident.has_spawned_this_year);
        assert!(resident.should_spawn_this_year);

        // An anadromous fish in its first ocean year never commits.
        let ocean = host.network.ocean();
        let mut fresh = host.spawn_adult(ocean, LifeHistory::Anadromous, Sex::Female, 0);
        fresh.activity = Activity::SaltwaterGrowth;
        fresh.set_movement(MovementMode::Stationary, 0.0);
        fresh.ocean_age_weeks = 30;
        fresh.should_spawn_this_year = true;
        let mut ctx = host.ctx(92);
        step_fish(&mut fresh, &mut ctx).unwrap();
        assert!(!fresh.should_spawn_this_year);
    }
}
