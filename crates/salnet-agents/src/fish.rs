//! The fish: state, identity, and the mutators the behavior rules use.
//!
//! A [`Fish`] owns everything about one individual: where it is, how big
//! it is, which activity and movement mode are in force, and an
//! append-only event log from which its past can be reconstructed. The
//! weekly rules that drive it live in the sibling behavior, movement,
//! growth, survival, and spawning modules.

use rand::Rng;

use salnet_events::{EventLog, FishEvent, StrayReason};
use salnet_network::StreamNetwork;
use salnet_types::{
    Activity, DeathCause, FishId, LifeHistory, MovementMode, Origin, ReachId, Sex, SizeClass,
};

use crate::config::SpawningSettings;
use crate::error::AgentError;
use crate::stochastic;

/// Fork length of a newly emerged fry, mm.
const FRY_FORK_LENGTH_MM: f64 = 35.0;

/// Mass of a newly emerged fry, grams.
const FRY_MASS_G: f64 = 0.5;

/// Mean of the ration share drawn at creation.
const RATION_SHARE_MEAN: f64 = 0.4;

/// Standard deviation of the ration share drawn at creation.
const RATION_SHARE_SD: f64 = 0.05;

/// Parameters for creating a fish.
///
/// Bundles identity, placement, and timing into a single struct to keep
/// the constructor signature manageable. The caller supplies the
/// position: uniform for seeded fish, the redd's position for fry.
#[derive(Debug, Clone, Copy)]
pub struct NewFishParams {
    /// Identifier allocated by the model.
    pub id: FishId,
    /// Reach the fish enters the simulation in.
    pub reach: ReachId,
    /// Position within that reach, km from its downstream end.
    pub position_within_reach: f64,
    /// Life-history strategy.
    pub life_history: LifeHistory,
    /// How the fish entered the simulation.
    pub origin: Origin,
    /// Simulation week of creation.
    pub week: u64,
}

/// One fish in the population.
#[derive(Debug, Clone)]
pub struct Fish {
    /// Identifier, unique for the lifetime of the simulation.
    pub id: FishId,
    /// Biological sex, drawn uniformly at creation.
    pub sex: Sex,
    /// Life-history strategy, fixed at creation.
    pub life_history: LifeHistory,
    /// How the fish entered the simulation.
    pub origin: Origin,
    /// Reach the fish currently occupies.
    pub reach: ReachId,
    /// Position within the current reach, km from its downstream end.
    pub position_within_reach: f64,
    /// Reach the fish was created in.
    pub natal_reach: ReachId,
    /// Reach the fish will travel to when it spawns.
    pub spawning_reach: ReachId,
    /// Reach the fish returns to after spawning or settles in after
    /// dispersal.
    pub home_reach: ReachId,
    /// Fork length, mm. Never shrinks.
    pub fork_length_mm: f64,
    /// Wet mass, grams.
    pub mass_g: f64,
    /// The largest mass ever reached, the baseline for starvation.
    pub lifetime_maximum_mass_g: f64,
    /// The fish's intrinsic ration share `p`, drawn at creation.
    pub base_ration_share: f64,
    /// Simulation week of creation.
    pub birth_week: u64,
    /// Week the fish died, if it has.
    pub death_week: Option<u64>,
    /// Why the fish died, if it has.
    pub death_cause: Option<DeathCause>,
    /// Age in completed weeks.
    pub age_weeks: u32,
    /// Week the fish first reached the ocean, if it has.
    pub ocean_entry_week: Option<u64>,
    /// Weeks spent in the ocean.
    pub ocean_age_weeks: u32,
    /// True once the fish has abandoned its spawning reach for lack of
    /// redd capacity and wanders in search of another.
    pub is_stray: bool,
    /// Whether this year's spawning draw came up yes.
    pub should_spawn_this_year: bool,
    /// Whether the fish has already spawned this year.
    pub has_spawned_this_year: bool,
    /// Activity currently in force.
    pub activity: Activity,
    /// Consecutive weeks spent in the current activity.
    pub activity_duration_weeks: u32,
    /// Movement mode currently in force.
    pub movement_mode: MovementMode,
    /// Movement rate, km per week.
    pub movement_rate_km_per_week: f64,
    /// Planned weekly itinerary while seeking a destination reach.
    pub current_route: Option<Vec<(ReachId, f64)>>,
    /// Index of the itinerary waypoint the fish occupies.
    pub route_cursor: usize,
    /// Ration fraction granted by last week's territory allocation.
    pub last_ration_fraction: f64,
    /// Everything that has happened to this fish.
    pub events: EventLog<FishEvent>,
    /// Fork length at the start of each week of life, mm.
    pub length_history_mm: Vec<f64>,
    /// Mass at the start of each week of life, grams.
    pub mass_history_g: Vec<f64>,
    /// Temperature experienced each week of life, degrees C.
    pub temperature_history_c: Vec<f64>,
}

impl Fish {
    /// Create a fish in the given reach.
    ///
    /// Anadromous fish may re-target their spawning reach immediately:
    /// a stray draw, or a natal reach outside the steelhead extent,
    /// redirects them to a random reach within the extent.
    ///
    /// The caller owns reach membership: the new fish must be inserted
    /// into its reach's fish set.
    ///
    /// # Errors
    ///
    /// Returns a network error when the natal reach is unknown or the
    /// steelhead extent is empty.
    pub fn new(
        params: NewFishParams,
        network: &StreamNetwork,
        rng: &mut impl Rng,
        spawning: &SpawningSettings,
    ) -> Result<Self, AgentError> {
        let sex = if rng.random_bool(0.5) { Sex::Female } else { Sex::Male };
        let base_ration_share = stochastic::normal(rng, RATION_SHARE_MEAN, RATION_SHARE_SD);

        let mut events = EventLog::new();
        events.append(params.week, FishEvent::Born { reach: params.reach });

        let mut spawning_reach = params.reach;
        if params.life_history.is_anadromous() {
            let within_extent =
                network.reach(params.reach)?.attributes.is_within_steelhead_extent;
            if rng.random::<f64>() < spawning.stray_probability || !within_extent {
                spawning_reach = network.random_reach(rng, true)?;
                events.append(params.week, FishEvent::Strayed { reason: StrayReason::AtCreation });
            }
        }

        Ok(Self {
            id: params.id,
            sex,
            life_history: params.life_history,
            origin: params.origin,
            reach: params.reach,
            position_within_reach: params.position_within_reach,
            natal_reach: params.reach,
            spawning_reach,
            home_reach: params.reach,
            fork_length_mm: FRY_FORK_LENGTH_MM,
            mass_g: FRY_MASS_G,
            lifetime_maximum_mass_g: FRY_MASS_G,
            base_ration_share,
            birth_week: params.week,
            death_week: None,
            death_cause: None,
            age_weeks: 0,
            ocean_entry_week: None,
            ocean_age_weeks: 0,
            is_stray: false,
            should_spawn_this_year: false,
            has_spawned_this_year: false,
            activity: Activity::FreshwaterGrowth,
            activity_duration_weeks: 0,
            movement_mode: MovementMode::Stationary,
            movement_rate_km_per_week: 0.0,
            current_route: None,
            route_cursor: 0,
            last_ration_fraction: 1.0,
            events,
            length_history_mm: Vec::new(),
            mass_history_g: Vec::new(),
            temperature_history_c: Vec::new(),
        })
    }

    /// True while the fish has not died.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.death_week.is_none()
    }

    /// Kill the fish. A second call on an already dead fish does
    /// nothing, so a fish killed mid-tick by a mate's spawning cannot
    /// die twice.
    pub fn die(&mut self, week: u64, cause: DeathCause) {
        if self.death_week.is_some() {
            return;
        }
        self.death_week = Some(week);
        self.death_cause = Some(cause);
        self.events.append(week, FishEvent::Died { cause });
        tracing::debug!(fish = %self.id, week, ?cause, "fish died");
    }

    /// True once the fish is old enough to spawn. Anadromous fish must
    /// also have reached the ocean at least once.
    #[must_use]
    pub const fn is_mature(&self, age_at_maturity_weeks: u32) -> bool {
        self.age_weeks >= age_at_maturity_weeks
            && (!self.life_history.is_anadromous() || self.ocean_entry_week.is_some())
    }

    /// Size class for the current fork length.
    #[must_use]
    pub const fn size_class(&self) -> SizeClass {
        SizeClass::for_fork_length(self.fork_length_mm)
    }

    /// Switch to a new activity, resetting the duration counter and
    /// logging the change. Re-asserting the current activity does
    /// nothing: the duration keeps counting.
    ///
    /// When a rule changes activity and movement together, it sets the
    /// movement first so the logged event carries the final pair.
    pub fn set_activity(&mut self, week: u64, activity: Activity) {
        if activity == self.activity {
            return;
        }
        self.activity = activity;
        self.activity_duration_weeks = 0;
        self.events
            .append(week, FishEvent::ActivityChanged { activity, movement: self.movement_mode });
    }

    /// Switch to a new movement mode and rate. Any planned itinerary is
    /// discarded: a route only ever belongs to the seeking mode that
    /// computed it.
    pub fn set_movement(&mut self, mode: MovementMode, rate_km_per_week: f64) {
        self.movement_mode = mode;
        self.movement_rate_km_per_week = rate_km_per_week;
        self.current_route = None;
        self.route_cursor = 0;
    }

    /// The activity in force at the end of the given week, or `None`
    /// before birth. Weeks after death answer with the terminal
    /// activity; callers that care filter on liveness first.
    #[must_use]
    pub fn activity_at_week(&self, week: u64) -> Option<Activity> {
        if week < self.birth_week {
            return None;
        }
        let mut current = Activity::FreshwaterGrowth;
        for event in &self.events {
            if event.week > week {
                break;
            }
            if let FishEvent::ActivityChanged { activity, .. } = event.kind {
                current = activity;
            }
        }
        Some(current)
    }

    /// Age in weeks at the given simulation week, or `None` outside the
    /// fish's lifetime.
    #[must_use]
    pub fn age_at_week(&self, week: u64) -> Option<u32> {
        if let Some(death) = self.death_week
            && week > death
        {
            return None;
        }
        let delta = week.checked_sub(self.birth_week)?;
        u32::try_from(delta).ok()
    }

    /// Fork length at the start of the given week of life, mm.
    #[must_use]
    pub fn length_at_age(&self, age_weeks: u32) -> Option<f64> {
        self.length_history_mm.get(usize::try_from(age_weeks).ok()?).copied()
    }

    /// The reaches this fish has occupied, oldest first, with the week
    /// each was entered. The natal reach opens the sequence.
    #[must_use]
    pub fn reach_history(&self) -> Vec<(u64, ReachId)> {
        let mut history = Vec::new();
        for event in &self.events {
            match event.kind {
                FishEvent::Born { reach } | FishEvent::ReachEntered { reach } => {
                    history.push((event.week, reach));
                }
                _ => {}
            }
        }
        history
    }
}
