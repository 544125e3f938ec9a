//! Redds: egg nests deposited by spawning females.
//!
//! A redd accumulates degree-days at its reach's temperature until
//! incubation completes and its fry emerge, each inheriting the mother's
//! life history with a configured probability. Every week before
//! emergence it risks destruction by a scouring flood, with odds scaled
//! by the reach's flood metric.

use rand::Rng;

use salnet_events::{EventLog, ReddEvent};
use salnet_network::StreamNetwork;
use salnet_types::{DeathCause, FishId, LifeHistory, ReachId, ReddId};

use crate::config::SpawningSettings;
use crate::error::AgentError;
use crate::fish::Fish;
use crate::stochastic;

/// Eggs per unit of the fork-length power law.
const FECUNDITY_LENGTH_COEF: f64 = 0.000_2;

/// Exponent of fecundity on the mother's fork length.
const FECUNDITY_LENGTH_EXPONENT: f64 = 2.598_9;

/// Fraction of eggs that survive to emerge as fry.
const EGG_TO_FRY_SURVIVAL: f64 = 0.15;

/// Standard deviation of the fry count draw.
const FRY_COUNT_SD: f64 = 10.0;

/// Scale of the weekly scour draw against the reach flood metric.
const SCOUR_COEF: f64 = 0.07;

/// What happened to a redd this week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReddOutcome {
    /// Still accumulating degree-days.
    Incubating,
    /// Destroyed by a flood.
    Scoured,
    /// Incubation finished. One fry is created per entry, with the
    /// listed life history, at the redd's reach and position.
    Emerged {
        /// Life history drawn for each emerging fry.
        life_histories: Vec<LifeHistory>,
    },
}

/// One redd in a reach.
///
/// The mother's identity and size are snapshots from the moment of
/// spawning: fecundity is fixed when the eggs are laid, whatever happens
/// to her afterwards.
#[derive(Debug, Clone)]
pub struct Redd {
    /// Identifier, unique for the lifetime of the simulation.
    pub id: ReddId,
    /// The female that built this redd.
    pub mother: FishId,
    /// The mother's life history at spawning.
    pub mother_life_history: LifeHistory,
    /// The mother's fork length at spawning, mm.
    pub mother_fork_length_mm: f64,
    /// Reach containing the redd.
    pub reach: ReachId,
    /// Position within the reach, km from its downstream end.
    pub position_within_reach: f64,
    /// Week the redd was deposited.
    pub created_week: u64,
    /// Degree-days accumulated so far.
    pub accrued_degree_days: f64,
    /// Week the redd left the simulation, if it has.
    pub death_week: Option<u64>,
    /// Why the redd left the simulation.
    pub death_cause: Option<DeathCause>,
    /// Everything that has happened to this redd.
    pub events: EventLog<ReddEvent>,
}

impl Redd {
    /// Deposit a redd at the mother's current reach and position.
    #[must_use]
    pub fn new(id: ReddId, mother: &Fish, week: u64) -> Self {
        let mut events = EventLog::new();
        events.append(week, ReddEvent::Created { mother: mother.id, reach: mother.reach });
        Self {
            id,
            mother: mother.id,
            mother_life_history: mother.life_history,
            mother_fork_length_mm: mother.fork_length_mm,
            reach: mother.reach,
            position_within_reach: mother.position_within_reach,
            created_week: week,
            accrued_degree_days: 0.0,
            death_week: None,
            death_cause: None,
            events,
        }
    }

    /// True while the redd is incubating.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.death_week.is_none()
    }

    /// Advance incubation by one week: accrue degree-days, then emerge
    /// or risk scour.
    ///
    /// # Errors
    ///
    /// Returns a network error when the redd's reach is unknown or
    /// carries no temperature series.
    pub fn step(
        &mut self,
        week: u64,
        network: &StreamNetwork,
        rng: &mut impl Rng,
        spawning: &SpawningSettings,
        days_per_week: u32,
    ) -> Result<ReddOutcome, AgentError> {
        let temperature = network.temperature_at_week(self.reach, week)?;
        self.accrued_degree_days += f64::from(days_per_week) * temperature;

        if self.accrued_degree_days > spawning.required_degree_days_to_emerge {
            let life_histories = self.draw_fry(rng, spawning);
            let count = u32::try_from(life_histories.len()).unwrap_or(u32::MAX);
            self.events.append(week, ReddEvent::FryEmerged { count });
            self.die(week, DeathCause::FryEmerged);
            tracing::debug!(redd = %self.id, week, count, "fry emerged");
            return Ok(ReddOutcome::Emerged { life_histories });
        }

        let spring95 = network.reach(self.reach)?.attributes.spring95;
        if SCOUR_COEF * stochastic::standard_normal(rng) * spring95 > 1.0 {
            self.events.append(week, ReddEvent::Scoured);
            self.die(week, DeathCause::Scoured);
            return Ok(ReddOutcome::Scoured);
        }

        Ok(ReddOutcome::Incubating)
    }

    /// Number of fry and the life history of each, drawn around the
    /// fecundity implied by the mother's length.
    fn draw_fry(&self, rng: &mut impl Rng, spawning: &SpawningSettings) -> Vec<LifeHistory> {
        let mean = EGG_TO_FRY_SURVIVAL
            * FECUNDITY_LENGTH_COEF
            * self.mother_fork_length_mm.powf(FECUNDITY_LENGTH_EXPONENT);
        let drawn = stochastic::normal(rng, mean, FRY_COUNT_SD).round();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let count = if drawn.is_finite() && drawn > 0.0 {
            drawn.min(f64::from(u32::MAX)) as u32
        } else {
            0
        };

        let inherited = self.mother_life_history;
        let flipped = match inherited {
            LifeHistory::Anadromous => LifeHistory::Resident,
            LifeHistory::Resident => LifeHistory::Anadromous,
        };
        (0..count)
            .map(|_| {
                if rng.random_bool(spawning.life_history_inheritance_probability) {
                    inherited
                } else {
                    flipped
                }
            })
            .collect()
    }

    /// Mark the redd dead. A second call does nothing.
    fn die(&mut self, week: u64, cause: DeathCause) {
        if self.death_week.is_some() {
            return;
        }
        self.death_week = Some(week);
        self.death_cause = Some(cause);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use salnet_network::{NetworkSettings, create_demo_network};
    use salnet_types::{Origin, Sex};

    use crate::fish::NewFishParams;

    use super::*;

    fn demo_mother() -> (Fish, StreamNetwork) {
        let (network, ids) =
            create_demo_network(&NetworkSettings::default(), 46).unwrap();
        let mut rng = SmallRng::seed_from_u64(3);
        let mut fish = Fish::new(
            NewFishParams {
                id: FishId::from_raw(1),
                reach: ids.cold_creek,
                position_within_reach: 1.0,
                life_history: LifeHistory::Resident,
                origin: Origin::Initiated,
                week: 0,
            },
            &network,
            &mut rng,
            &SpawningSettings::default(),
        )
        .unwrap();
        fish.sex = Sex::Female;
        fish.fork_length_mm = 300.0;
        (fish, network)
    }

    #[test]
    fn redd_snapshots_the_mother_at_deposit() {
        let (mother, _) = demo_mother();
        let redd = Redd::new(ReddId::from_raw(1), &mother, 12);

        assert_eq!(redd.mother, mother.id);
        assert_eq!(redd.reach, mother.reach);
        assert!((redd.mother_fork_length_mm - 300.0).abs() < f64::EPSILON);
        assert_eq!(redd.created_week, 12);
        assert!(redd.is_alive());
        assert_eq!(redd.events.len(), 1);
    }

    #[test]
    fn incubation_accrues_degree_days_until_emergence() {
        let (mother, network) = demo_mother();
        let mut redd = Redd::new(ReddId::from_raw(1), &mother, 0);
        let mut rng = SmallRng::seed_from_u64(17);
        let spawning = SpawningSettings::default();

        let mut emerged_week = None;
        for week in 0..40 {
            let outcome = redd.step(week, &network, &mut rng, &spawning, 8).unwrap();
            match outcome {
                ReddOutcome::Incubating => {}
                ReddOutcome::Emerged { life_histories } => {
                    assert!(!life_histories.is_empty());
                    emerged_week = Some(week);
                    break;
                }
                ReddOutcome::Scoured => break,
            }
        }

        if emerged_week.is_some() {
            assert!(redd.accrued_degree_days > spawning.required_degree_days_to_emerge);
            assert_eq!(redd.death_cause, Some(DeathCause::FryEmerged));
            assert!(!redd.is_alive());
        }
    }

    #[test]
    fn emergence_crosses_the_threshold_on_schedule() {
        // At single-digit spring temperatures a week accrues some tens
        // of degree-days, so the 340 threshold takes a handful of weeks.
        let (mother, network) = demo_mother();
        let mut redd = Redd::new(ReddId::from_raw(1), &mother, 0);
        let mut rng = SmallRng::seed_from_u64(99);
        let spawning = SpawningSettings::default();

        let mut steps = 0;
        for week in 0..20 {
            steps += 1;
            let outcome = redd.step(week, &network, &mut rng, &spawning, 8).unwrap();
            if let ReddOutcome::Emerged { .. } = outcome {
                break;
            }
        }
        assert!((3..=14).contains(&steps), "emerged after {steps} steps");
    }

    #[test]
    fn fry_mostly_inherit_the_mothers_life_history() {
        let (mut mother, _) = demo_mother();
        mother.fork_length_mm = 600.0;
        mother.life_history = LifeHistory::Anadromous;
        let redd = Redd::new(ReddId::from_raw(2), &mother, 0);
        let mut rng = SmallRng::seed_from_u64(5);

        let fry = redd.draw_fry(&mut rng, &SpawningSettings::default());
        assert!(fry.len() > 100, "expected a large brood, got {}", fry.len());
        let inherited =
            fry.iter().filter(|lh| **lh == LifeHistory::Anadromous).count();
        let share = inherited * 100 / fry.len();
        assert!((60..=90).contains(&share), "inheritance share was {share}%");
    }

    #[test]
    fn tiny_mothers_can_produce_zero_fry() {
        let (mut mother, _) = demo_mother();
        mother.fork_length_mm = 40.0;
        let redd = Redd::new(ReddId::from_raw(3), &mother, 0);

        // Mean fecundity at 40 mm is far below the draw's spread, so
        // some draws land negative and must clamp to an empty brood.
        let mut saw_empty = false;
        for seed in 0..40 {
            let mut rng = SmallRng::seed_from_u64(seed);
            if redd.draw_fry(&mut rng, &SpawningSettings::default()).is_empty() {
                saw_empty = true;
                break;
            }
        }
        assert!(saw_empty);
    }
}
