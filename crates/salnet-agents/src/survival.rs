//! Weekly survival draws.
//!
//! Freshwater survival is a seasonal, length-dependent schedule fit to
//! juvenile O. mykiss field estimates. Ocean and migration-corridor
//! fish share a flat adult rate.

use rand::Rng;

use salnet_types::DeathCause;

use crate::context::StepContext;
use crate::error::AgentError;
use crate::fish::Fish;

/// Flat weekly survival for fish at sea or in the migration corridor.
const MARINE_WEEKLY_SURVIVAL: f64 = 0.995_2;

/// Fork length above which the freshwater schedule goes flat, mm.
const LENGTH_SCHEDULE_CEILING_MM: f64 = 100.0;

/// Weekly freshwater survival probability by season and fork length.
///
/// Weeks 1..=19 are winter into spring, 20..=32 the warm season, and the
/// remainder of the year the fall schedule. The fall line exceeds 1.0
/// for fish near the length ceiling, which simply means certain
/// survival.
#[must_use]
pub fn freshwater_weekly_survival(week_of_year: u32, fork_length_mm: f64) -> f64 {
    let length = fork_length_mm;
    match week_of_year {
        1..=19 => {
            if length <= LENGTH_SCHEDULE_CEILING_MM {
                length.mul_add(0.000_55, 0.921)
            } else {
                0.976
            }
        }
        20..=32 => {
            if length <= LENGTH_SCHEDULE_CEILING_MM {
                length.mul_add(0.000_26, 0.968)
            } else {
                0.994
            }
        }
        _ => {
            if length <= LENGTH_SCHEDULE_CEILING_MM {
                length.mul_add(0.000_39, 0.988)
            } else {
                0.988
            }
        }
    }
}

/// Draws once against this week's survival probability and kills the
/// fish on failure. A no-op for fish that already died this week.
///
/// # Errors
///
/// Returns [`AgentError::Network`] when the fish's reach identifier is
/// stale.
pub fn apply_survival<R: Rng>(
    fish: &mut Fish,
    ctx: &mut StepContext<'_, R>,
) -> Result<(), AgentError> {
    let reach = ctx.network.reach(fish.reach)?;
    let probability = if reach.is_ocean || reach.is_migration {
        MARINE_WEEKLY_SURVIVAL
    } else {
        freshwater_weekly_survival(ctx.week_of_year, fish.fork_length_mm)
    };
    if ctx.rng.random::<f64>() > probability {
        fish.die(ctx.week, DeathCause::SurvivalModel);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::arithmetic_side_effects)]
mod tests {
    use salnet_types::{LifeHistory, Sex};

    use super::*;
    use crate::testutil::Host;

    #[test]
    fn winter_schedule_is_harshest_for_small_fish() {
        let winter = freshwater_weekly_survival(10, 50.0);
        let summer = freshwater_weekly_survival(25, 50.0);
        let fall = freshwater_weekly_survival(40, 50.0);
        assert!((winter - 0.9485).abs() < 1e-12);
        assert!((summer - 0.981).abs() < 1e-12);
        assert!(winter < summer);
        assert!(summer < fall);
    }

    #[test]
    fn schedule_goes_flat_above_the_length_ceiling() {
        assert_eq!(freshwater_weekly_survival(10, 150.0), 0.976);
        assert_eq!(freshwater_weekly_survival(25, 150.0), 0.994);
        assert_eq!(freshwater_weekly_survival(40, 150.0), 0.988);
    }

    #[test]
    fn survival_rises_with_length_within_a_season() {
        let short = freshwater_weekly_survival(10, 40.0);
        let long = freshwater_weekly_survival(10, 90.0);
        assert!(long > short);
    }

    #[test]
    fn fall_small_fish_never_die_when_the_line_tops_one() {
        let probability = freshwater_weekly_survival(40, 60.0);
        assert!(probability > 1.0);

        let mut host = Host::new(21);
        let reach = host.ids.cold_creek;
        let mut fish = host.spawn_fish(reach, LifeHistory::Resident, 0);
        fish.fork_length_mm = 60.0;
        for week in 0..100u64 {
            let mut ctx = host.ctx(40 + week * 46);
            apply_survival(&mut fish, &mut ctx).unwrap();
        }
        assert!(fish.is_alive());
    }

    #[test]
    fn marine_rate_applies_in_the_migration_corridor() {
        let mut host = Host::new(22);
        let corridor = host.network.migration();
        let mut fish = host.spawn_adult(corridor, LifeHistory::Anadromous, Sex::Female, 50);

        // Surviving ten thousand draws at 0.9952 has probability on the
        // order of 1e-21, so the loop always ends in a death.
        let mut week = 50u64;
        while fish.is_alive() && week < 10_000 {
            let mut ctx = host.ctx(week);
            apply_survival(&mut fish, &mut ctx).unwrap();
            week += 1;
        }
        assert!(!fish.is_alive());
        assert_eq!(fish.death_cause, Some(DeathCause::SurvivalModel));
        assert!(fish.death_week.is_some());
    }
}
