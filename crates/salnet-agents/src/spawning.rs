//! Mate finding, redd deposition, and the post-spawn transition.
//!
//! Females drive spawning. A spawning female scans her reach for live
//! spawning males, deposits a redd with a chosen mate, and both fish go
//! through post-spawn in the same tick. Males on their own only time
//! out of the spawning state.

use rand::Rng;

use salnet_events::FishEvent;
use salnet_types::{Activity, DeathCause, FishId, MovementMode, ReddId, Sex};

use crate::config::FishSettings;
use crate::context::StepContext;
use crate::error::AgentError;
use crate::fish::Fish;
use crate::redd::Redd;

/// One spawning attempt by a female in the `Spawning` activity.
///
/// Candidate mates are live co-located `Spawning` males that have not
/// spawned this year, preferring males of her own life history. With a
/// mate she deposits a redd at her current position and both fish run
/// post-spawn as successful. Without one she waits, giving up
/// unsuccessfully once her activity duration reaches the configured
/// limit.
///
/// The new redd's id and reach membership are claimed immediately so
/// fish stepped later this week see the reduced capacity; the redd
/// value itself is handed to the model through the context.
///
/// # Errors
///
/// Returns [`AgentError::Network`] when the fish's reach identifier is
/// stale and [`AgentError::ArithmeticOverflow`] when the redd id space
/// is exhausted.
pub fn female_spawn<R: Rng>(
    fish: &mut Fish,
    ctx: &mut StepContext<'_, R>,
) -> Result<(), AgentError> {
    let mut candidates: Vec<FishId> = Vec::new();
    let mut preferred: Vec<FishId> = Vec::new();
    for id in &ctx.network.reach(fish.reach)?.fish {
        if *id == fish.id {
            continue;
        }
        if let Some(other) = ctx.others.get(id)
            && other.is_alive()
            && other.sex == Sex::Male
            && other.activity == Activity::Spawning
            && !other.has_spawned_this_year
        {
            candidates.push(*id);
            if other.life_history == fish.life_history {
                preferred.push(*id);
            }
        }
    }

    if candidates.is_empty() {
        if fish.activity_duration_weeks >= ctx.spawning.max_weeks_to_wait_without_mate {
            let settings = ctx.settings_for(fish.life_history);
            post_spawn(fish, ctx.week, ctx.rng, settings, false);
        }
        return Ok(());
    }

    let pool = if preferred.is_empty() {
        &candidates
    } else {
        &preferred
    };
    let index = ctx.rng.random_range(0..pool.len());
    let Some(&mate_id) = pool.get(index) else {
        return Ok(());
    };

    let redd_id = ReddId::from_raw(*ctx.next_redd_id);
    *ctx.next_redd_id =
        ctx.next_redd_id
            .checked_add(1)
            .ok_or_else(|| AgentError::ArithmeticOverflow {
                context: String::from("redd id allocation"),
            })?;
    let redd = Redd::new(redd_id, fish, ctx.week);
    ctx.network.reach_mut(fish.reach)?.redds.insert(redd_id);
    ctx.spawned_redds.push(redd);
    fish.events
        .append(ctx.week, FishEvent::SpawnedAsFemale { redd: redd_id });
    tracing::debug!(mother = %fish.id, redd = %redd_id, week = ctx.week, "redd deposited");

    let settings = ctx.settings_for(fish.life_history);
    post_spawn(fish, ctx.week, ctx.rng, settings, true);

    let resident = ctx.resident;
    let anadromous = ctx.anadromous;
    let week = ctx.week;
    if let Some(mate) = ctx.others.get_mut(&mate_id) {
        mate.events.append(week, FishEvent::SpawnedAsMale);
        let mate_settings = if mate.life_history.is_anadromous() {
            anadromous
        } else {
            resident
        };
        post_spawn(mate, week, ctx.rng, mate_settings, true);
    }
    Ok(())
}

/// Closes out a spawning season for one fish.
///
/// Marks the year spawned, then draws against the sex-specific
/// post-spawn survival probability. Casualties die with a cause keyed
/// to whether the season succeeded. Surviving anadromous fish turn into
/// kelts heading downstream; surviving residents head for their home
/// reach.
pub fn post_spawn(
    fish: &mut Fish,
    week: u64,
    rng: &mut impl Rng,
    settings: &FishSettings,
    succeeded: bool,
) {
    fish.has_spawned_this_year = true;
    let survival_probability = match fish.sex {
        Sex::Male => settings.male_postspawn_survival_probability,
        Sex::Female => settings.female_postspawn_survival_probability,
    };
    if rng.random::<f64>() > survival_probability {
        let cause = if succeeded {
            DeathCause::PostspawnSuccessful
        } else {
            DeathCause::PostspawnUnsuccessful
        };
        fish.die(week, cause);
        return;
    }
    if fish.life_history.is_anadromous() {
        fish.set_movement(
            MovementMode::Downstream,
            settings.postspawn_return_rate_km_per_week,
        );
        fish.set_activity(week, Activity::KeltOutmigration);
    } else {
        fish.set_movement(
            MovementMode::SeekingHomeReach,
            settings.postspawn_return_rate_km_per_week,
        );
        fish.set_activity(week, Activity::PostspawnReturnHome);
    }
}

/// Whether any live spawning female shares the fish's reach. Stray
/// males stop to spawn where this holds.
///
/// # Errors
///
/// Returns [`AgentError::Network`] when the fish's reach identifier is
/// stale.
pub fn colocated_spawning_female_exists<R: Rng>(
    fish: &Fish,
    ctx: &StepContext<'_, R>,
) -> Result<bool, AgentError> {
    for id in &ctx.network.reach(fish.reach)?.fish {
        if *id == fish.id {
            continue;
        }
        if let Some(other) = ctx.others.get(id)
            && other.is_alive()
            && other.sex == Sex::Female
            && other.activity == Activity::Spawning
        {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use salnet_events::ReddEvent;
    use salnet_types::LifeHistory;

    use super::*;
    use crate::testutil::Host;

    #[test]
    fn pair_spawns_and_deposits_a_redd() {
        let mut host = Host::new(31);
        let reach = host.ids.upper_mainstem;
        let mut female = host.spawn_adult(reach, LifeHistory::Resident, Sex::Female, 10);
        female.activity = Activity::Spawning;
        let mut male = host.spawn_adult(reach, LifeHistory::Resident, Sex::Male, 10);
        male.activity = Activity::Spawning;
        let male_id = host.adopt(male);

        let mut ctx = host.ctx(12);
        female_spawn(&mut female, &mut ctx).unwrap();

        assert_eq!(host.spawned_redds.len(), 1);
        let redd = host.spawned_redds.first().unwrap();
        assert_eq!(redd.mother, female.id);
        assert_eq!(redd.reach, reach);
        assert_eq!(
            redd.events.last().map(|entry| entry.kind),
            Some(ReddEvent::Created {
                mother: female.id,
                reach
            })
        );
        assert_eq!(host.next_redd_id, 1);
        assert!(
            host.network
                .reach(reach)
                .unwrap()
                .redds
                .contains(&redd.id)
        );

        assert!(female.has_spawned_this_year);
        assert!(
            female
                .events
                .iter()
                .any(|entry| matches!(entry.kind, FishEvent::SpawnedAsFemale { .. }))
        );
        let mate = host.others.get(&male_id).unwrap();
        assert!(mate.has_spawned_this_year);
        assert!(
            mate.events
                .iter()
                .any(|entry| entry.kind == FishEvent::SpawnedAsMale)
        );
    }

    #[test]
    fn females_prefer_mates_of_their_own_life_history() {
        let mut host = Host::new(32);
        let reach = host.ids.upper_mainstem;
        let mut female = host.spawn_adult(reach, LifeHistory::Resident, Sex::Female, 10);
        female.activity = Activity::Spawning;
        let mut resident_male = host.spawn_adult(reach, LifeHistory::Resident, Sex::Male, 10);
        resident_male.activity = Activity::Spawning;
        let mut anadromous_male = host.spawn_adult(reach, LifeHistory::Anadromous, Sex::Male, 10);
        anadromous_male.activity = Activity::Spawning;
        let resident_id = host.adopt(resident_male);
        let anadromous_id = host.adopt(anadromous_male);

        let mut ctx = host.ctx(12);
        female_spawn(&mut female, &mut ctx).unwrap();

        assert!(host.others.get(&resident_id).unwrap().has_spawned_this_year);
        assert!(!host.others.get(&anadromous_id).unwrap().has_spawned_this_year);
    }

    #[test]
    fn lone_female_waits_then_gives_up() {
        let mut host = Host::new(33);
        let reach = host.ids.upper_mainstem;
        let mut female = host.spawn_adult(reach, LifeHistory::Resident, Sex::Female, 10);
        female.activity = Activity::Spawning;
        female.activity_duration_weeks = 3;

        let mut ctx = host.ctx(13);
        female_spawn(&mut female, &mut ctx).unwrap();
        assert!(host.spawned_redds.is_empty());
        assert!(!female.has_spawned_this_year);
        assert_eq!(female.activity, Activity::Spawning);

        female.activity_duration_weeks = 6;
        let mut ctx = host.ctx(14);
        female_spawn(&mut female, &mut ctx).unwrap();
        assert!(host.spawned_redds.is_empty());
        assert!(female.has_spawned_this_year);
        if female.is_alive() {
            assert_eq!(female.activity, Activity::PostspawnReturnHome);
            assert_eq!(female.movement_mode, MovementMode::SeekingHomeReach);
        } else {
            assert_eq!(female.death_cause, Some(DeathCause::PostspawnUnsuccessful));
        }
    }

    #[test]
    fn surviving_anadromous_spawners_become_kelts() {
        let mut host = Host::new(34);
        let reach = host.ids.upper_mainstem;
        let mut fish = host.spawn_adult(reach, LifeHistory::Anadromous, Sex::Female, 10);
        fish.activity = Activity::Spawning;
        let settings = FishSettings {
            female_postspawn_survival_probability: 1.0,
            ..FishSettings::default_anadromous()
        };

        post_spawn(&mut fish, 12, &mut host.rng, &settings, true);

        assert!(fish.is_alive());
        assert!(fish.has_spawned_this_year);
        assert_eq!(fish.activity, Activity::KeltOutmigration);
        assert_eq!(fish.movement_mode, MovementMode::Downstream);
        assert_eq!(
            fish.movement_rate_km_per_week,
            settings.postspawn_return_rate_km_per_week
        );
    }

    #[test]
    fn anadromous_males_never_survive_the_spawn() {
        let mut host = Host::new(35);
        let reach = host.ids.upper_mainstem;
        let mut fish = host.spawn_adult(reach, LifeHistory::Anadromous, Sex::Male, 10);
        fish.activity = Activity::Spawning;
        let settings = FishSettings::default_anadromous();

        post_spawn(&mut fish, 12, &mut host.rng, &settings, true);

        assert!(!fish.is_alive());
        assert_eq!(fish.death_cause, Some(DeathCause::PostspawnSuccessful));
    }

    #[test]
    fn stray_males_detect_spawning_females() {
        let mut host = Host::new(36);
        let reach = host.ids.cold_creek;
        let male = host.spawn_adult(reach, LifeHistory::Resident, Sex::Male, 10);
        let mut female = host.spawn_adult(reach, LifeHistory::Resident, Sex::Female, 10);

        let ctx = host.ctx(12);
        assert!(!colocated_spawning_female_exists(&male, &ctx).unwrap());
        drop(ctx);

        female.activity = Activity::Spawning;
        host.adopt(female);
        let ctx = host.ctx(12);
        assert!(colocated_spawning_female_exists(&male, &ctx).unwrap());
    }
}
