//! Configuration sections for fish behavior and spawning.
//!
//! A [`FishSettings`] block parameterizes one life-history strategy; the
//! simulation carries one for residents and one for anadromous fish.
//! [`SpawningSettings`] is shared by both. All sections are loaded from
//! the top-level simulation config and fall back to the stock
//! parameterization when absent.
//!
//! Per-field serde defaults are the resident values. A config that
//! overrides part of the anadromous section should supply the whole
//! section, otherwise the omitted fields fall back to resident values.

use serde::Deserialize;

/// Behavioral parameters for one life-history strategy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FishSettings {
    /// First week of year (inclusive) in which spawning migration starts.
    #[serde(default = "default_spawning_migration_start_week")]
    pub spawning_migration_start_week: u32,

    /// Last week of year (inclusive) in which spawning migration starts.
    #[serde(default = "default_spawning_migration_end_week")]
    pub spawning_migration_end_week: u32,

    /// Travel rate toward the spawning reach, km per week.
    #[serde(default = "default_spawning_migration_speed")]
    pub spawning_migration_speed_km_per_week: f64,

    /// Age at which a fish becomes eligible to spawn, weeks.
    #[serde(default = "default_age_at_maturity_weeks")]
    pub age_at_maturity_weeks: u32,

    /// Probability that a male survives its post-spawn mortality draw.
    #[serde(default = "default_male_postspawn_survival")]
    pub male_postspawn_survival_probability: f64,

    /// Probability that a female survives its post-spawn mortality draw.
    #[serde(default = "default_female_postspawn_survival")]
    pub female_postspawn_survival_probability: f64,

    /// Travel rate of a post-spawn survivor heading home or back to sea,
    /// km per week.
    #[serde(default = "default_postspawn_return_rate")]
    pub postspawn_return_rate_km_per_week: f64,

    /// First week of year (inclusive) in which hot water drives fish
    /// upstream toward cooler reaches.
    #[serde(default = "default_summer_cold_seeking_start_week")]
    pub summer_cold_seeking_start_week: u32,

    /// Last week of year (inclusive) for the cold-seeking response.
    #[serde(default = "default_summer_cold_seeking_end_week")]
    pub summer_cold_seeking_end_week: u32,

    /// First week of year (inclusive) of the fall warmth-seeking window.
    #[serde(default = "default_fall_warmth_seeking_start_week")]
    pub fall_warmth_seeking_start_week: u32,

    /// Last week of year (inclusive) of the fall warmth-seeking window.
    #[serde(default = "default_fall_warmth_seeking_end_week")]
    pub fall_warmth_seeking_end_week: u32,

    /// Travel rate while seeking warmer water, km per week.
    #[serde(default = "default_fall_warmth_seeking_rate")]
    pub fall_warmth_seeking_rate_km_per_week: f64,

    /// Fraction of lifetime maximum mass below which a fish starves.
    #[serde(default = "default_starvation_mass_fraction")]
    pub starvation_mass_fraction: f64,

    /// Ration multiplier applied to a fish displaced from its territory.
    #[serde(default = "default_displaced_ration_factor")]
    pub displaced_ration_factor: f64,

    /// First week of year (inclusive) of the smolt outmigration window.
    #[serde(default = "default_smolt_outmigration_start_week")]
    pub smolt_outmigration_start_week: u32,

    /// Last week of year (inclusive) of the smolt outmigration window.
    #[serde(default = "default_smolt_outmigration_end_week")]
    pub smolt_outmigration_end_week: u32,

    /// Travel rate of an outmigrating smolt, km per week.
    #[serde(default = "default_smolt_outmigration_speed")]
    pub smolt_outmigration_speed_km_per_week: f64,

    /// Minimum fork length to smolt, mm.
    #[serde(default = "default_smolt_min_fork_length")]
    pub smolt_min_fork_length_mm: f64,
}

impl FishSettings {
    /// Stock parameterization for the anadromous strategy: a later and
    /// faster spawning migration, near-total male post-spawn mortality,
    /// and a fast return to sea for surviving kelts.
    #[must_use]
    pub fn default_anadromous() -> Self {
        Self {
            spawning_migration_start_week: 30,
            spawning_migration_end_week: 41,
            spawning_migration_speed_km_per_week: 50.0,
            male_postspawn_survival_probability: 0.0,
            female_postspawn_survival_probability: 0.2,
            postspawn_return_rate_km_per_week: 200.0,
            ..Self::default()
        }
    }

    /// True when the week of year lies in the spawning migration window.
    #[must_use]
    pub fn spawning_window_contains(&self, week_of_year: u32) -> bool {
        (self.spawning_migration_start_week..=self.spawning_migration_end_week)
            .contains(&week_of_year)
    }

    /// True when the week of year lies in the smolt outmigration window.
    #[must_use]
    pub fn smolt_window_contains(&self, week_of_year: u32) -> bool {
        (self.smolt_outmigration_start_week..=self.smolt_outmigration_end_week)
            .contains(&week_of_year)
    }

    /// True when the week of year lies in the summer cold-seeking window.
    #[must_use]
    pub fn cold_seeking_window_contains(&self, week_of_year: u32) -> bool {
        (self.summer_cold_seeking_start_week..=self.summer_cold_seeking_end_week)
            .contains(&week_of_year)
    }
}

impl Default for FishSettings {
    fn default() -> Self {
        Self {
            spawning_migration_start_week: default_spawning_migration_start_week(),
            spawning_migration_end_week: default_spawning_migration_end_week(),
            spawning_migration_speed_km_per_week: default_spawning_migration_speed(),
            age_at_maturity_weeks: default_age_at_maturity_weeks(),
            male_postspawn_survival_probability: default_male_postspawn_survival(),
            female_postspawn_survival_probability: default_female_postspawn_survival(),
            postspawn_return_rate_km_per_week: default_postspawn_return_rate(),
            summer_cold_seeking_start_week: default_summer_cold_seeking_start_week(),
            summer_cold_seeking_end_week: default_summer_cold_seeking_end_week(),
            fall_warmth_seeking_start_week: default_fall_warmth_seeking_start_week(),
            fall_warmth_seeking_end_week: default_fall_warmth_seeking_end_week(),
            fall_warmth_seeking_rate_km_per_week: default_fall_warmth_seeking_rate(),
            starvation_mass_fraction: default_starvation_mass_fraction(),
            displaced_ration_factor: default_displaced_ration_factor(),
            smolt_outmigration_start_week: default_smolt_outmigration_start_week(),
            smolt_outmigration_end_week: default_smolt_outmigration_end_week(),
            smolt_outmigration_speed_km_per_week: default_smolt_outmigration_speed(),
            smolt_min_fork_length_mm: default_smolt_min_fork_length(),
        }
    }
}

/// Parameters shared by redds and the spawning rules of both strategies.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpawningSettings {
    /// Accumulated degree-days at which a redd's fry emerge.
    #[serde(default = "default_required_degree_days")]
    pub required_degree_days_to_emerge: f64,

    /// Probability that a fry inherits its mother's life history.
    #[serde(default = "default_inheritance_probability")]
    pub life_history_inheritance_probability: f64,

    /// Weeks a fish holds at the spawning grounds without a mate before
    /// giving up.
    #[serde(default = "default_max_weeks_to_wait")]
    pub max_weeks_to_wait_without_mate: u32,

    /// Probability that a newly created anadromous fish re-targets a
    /// random spawning reach.
    #[serde(default = "default_stray_probability")]
    pub stray_probability: f64,
}

impl Default for SpawningSettings {
    fn default() -> Self {
        Self {
            required_degree_days_to_emerge: default_required_degree_days(),
            life_history_inheritance_probability: default_inheritance_probability(),
            max_weeks_to_wait_without_mate: default_max_weeks_to_wait(),
            stray_probability: default_stray_probability(),
        }
    }
}

const fn default_spawning_migration_start_week() -> u32 {
    8
}

const fn default_spawning_migration_end_week() -> u32 {
    19
}

const fn default_spawning_migration_speed() -> f64 {
    5.0
}

const fn default_age_at_maturity_weeks() -> u32 {
    92
}

const fn default_male_postspawn_survival() -> f64 {
    0.8
}

const fn default_female_postspawn_survival() -> f64 {
    0.8
}

const fn default_postspawn_return_rate() -> f64 {
    10.0
}

const fn default_summer_cold_seeking_start_week() -> u32 {
    28
}

const fn default_summer_cold_seeking_end_week() -> u32 {
    36
}

const fn default_fall_warmth_seeking_start_week() -> u32 {
    35
}

const fn default_fall_warmth_seeking_end_week() -> u32 {
    39
}

const fn default_fall_warmth_seeking_rate() -> f64 {
    5.0
}

const fn default_starvation_mass_fraction() -> f64 {
    0.8
}

const fn default_displaced_ration_factor() -> f64 {
    0.2
}

const fn default_smolt_outmigration_start_week() -> u32 {
    16
}

const fn default_smolt_outmigration_end_week() -> u32 {
    25
}

const fn default_smolt_outmigration_speed() -> f64 {
    50.0
}

const fn default_smolt_min_fork_length() -> f64 {
    180.0
}

const fn default_required_degree_days() -> f64 {
    340.0
}

const fn default_inheritance_probability() -> f64 {
    0.75
}

const fn default_max_weeks_to_wait() -> u32 {
    6
}

const fn default_stray_probability() -> f64 {
    0.02
}
