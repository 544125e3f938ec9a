//! The top-level simulation configuration and its YAML loader.
//!
//! [`SimulationConfig`] aggregates every tunable in the system: the
//! simulated calendar, the run parameters, and the settings sections
//! owned by the network and agents crates. Every field carries a serde
//! default, so a YAML file may supply any subset of sections, including
//! none at all.
//!
//! [`SimulationConfig::parse`] and [`SimulationConfig::from_file`]
//! validate after deserializing, so a loaded config never carries an
//! impossible calendar, an out-of-year behavior window, or a probability
//! outside `[0, 1]`.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use salnet_agents::{FishSettings, SpawningSettings};
use salnet_network::{HabitatSettings, NetworkSettings};

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The file contents are not valid YAML for the config schema.
    #[error("failed to parse config: {source}")]
    Yaml {
        /// Underlying YAML error.
        source: serde_yml::Error,
    },

    /// The parsed values are unusable.
    #[error("invalid configuration: {message}")]
    Validation {
        /// Human-readable description of the problem.
        message: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Calendar geometry of the simulated year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TimeSettings {
    /// Days of physical time represented by one simulated week. Scales
    /// weekly rates such as redd degree-day accrual.
    #[serde(default = "default_days_per_week")]
    pub days_per_week: u32,

    /// Number of simulated weeks in a year. Behavior windows are weeks
    /// of year in `0..weeks_per_year`.
    #[serde(default = "default_weeks_per_year")]
    pub weeks_per_year: u32,
}

impl Default for TimeSettings {
    fn default() -> Self {
        Self {
            days_per_week: default_days_per_week(),
            weeks_per_year: default_weeks_per_year(),
        }
    }
}

/// Run-level parameters: seeding, duration, and determinism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RunSettings {
    /// Number of fish seeded into the network before the first tick.
    #[serde(default = "default_initial_population")]
    pub initial_population: u32,

    /// Number of weekly ticks to run before stopping.
    #[serde(default = "default_weeks_to_run")]
    pub weeks_to_run: u64,

    /// Seed for the run's random number generator. Equal seeds with
    /// equal configs reproduce a run exactly.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            initial_population: default_initial_population(),
            weeks_to_run: default_weeks_to_run(),
            seed: default_seed(),
        }
    }
}

/// Every tunable of a simulation run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Calendar geometry.
    #[serde(default)]
    pub time: TimeSettings,

    /// Run duration, seeding, and seed.
    #[serde(default)]
    pub run: RunSettings,

    /// Synthetic terminal reach geometry.
    #[serde(default)]
    pub network: NetworkSettings,

    /// Territory ledger tuning.
    #[serde(default)]
    pub habitat: HabitatSettings,

    /// Redd incubation and spawning arbitration parameters.
    #[serde(default)]
    pub spawning: SpawningSettings,

    /// Behavioral parameters for the resident strategy.
    #[serde(default)]
    pub resident: FishSettings,

    /// Behavioral parameters for the anadromous strategy.
    #[serde(default = "FishSettings::default_anadromous")]
    pub anadromous: FishSettings,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time: TimeSettings::default(),
            run: RunSettings::default(),
            network: NetworkSettings::default(),
            habitat: HabitatSettings::default(),
            spawning: SpawningSettings::default(),
            resident: FishSettings::default(),
            anadromous: FishSettings::default_anadromous(),
        }
    }
}

impl SimulationConfig {
    /// Load and validate configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Validation`] if the values are unusable.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string. A blank
    /// document yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Validation`] if the values are unusable.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every cross-field constraint the loaders enforce.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the offending field
    /// when the calendar is empty, a probability falls outside `[0, 1]`,
    /// or a behavior window is inverted or runs past the end of the
    /// year.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time.weeks_per_year == 0 {
            return Err(ConfigError::Validation {
                message: String::from("time.weeks_per_year must be at least 1"),
            });
        }
        if self.time.days_per_week == 0 {
            return Err(ConfigError::Validation {
                message: String::from("time.days_per_week must be at least 1"),
            });
        }
        if self.habitat.drift_conversion <= 0.0 {
            return Err(ConfigError::Validation {
                message: String::from("habitat.drift_conversion must be positive"),
            });
        }
        check_probability(
            "spawning.life_history_inheritance_probability",
            self.spawning.life_history_inheritance_probability,
        )?;
        check_probability("spawning.stray_probability", self.spawning.stray_probability)?;
        check_strategy_windows("resident", &self.resident, self.time.weeks_per_year)?;
        check_strategy_windows("anadromous", &self.anadromous, self.time.weeks_per_year)?;
        Ok(())
    }
}

fn check_probability(label: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Validation {
            message: format!("{label} must lie in [0, 1], got {value}"),
        })
    }
}

/// Validate the four seasonal windows of one strategy. Windows are
/// inclusive at both ends and must not wrap the year boundary, so the
/// start may not exceed the end and the end must stay inside the year.
fn check_strategy_windows(
    strategy: &str,
    settings: &FishSettings,
    weeks_per_year: u32,
) -> Result<(), ConfigError> {
    let windows = [
        (
            "spawning_migration",
            settings.spawning_migration_start_week,
            settings.spawning_migration_end_week,
        ),
        (
            "summer_cold_seeking",
            settings.summer_cold_seeking_start_week,
            settings.summer_cold_seeking_end_week,
        ),
        (
            "fall_warmth_seeking",
            settings.fall_warmth_seeking_start_week,
            settings.fall_warmth_seeking_end_week,
        ),
        (
            "smolt_outmigration",
            settings.smolt_outmigration_start_week,
            settings.smolt_outmigration_end_week,
        ),
    ];
    for (window, start_week, end_week) in windows {
        if start_week > end_week {
            return Err(ConfigError::Validation {
                message: format!(
                    "{strategy}.{window}: start week {start_week} is after end week {end_week}"
                ),
            });
        }
        if end_week >= weeks_per_year {
            return Err(ConfigError::Validation {
                message: format!(
                    "{strategy}.{window}: end week {end_week} falls outside the \
                     {weeks_per_year}-week year"
                ),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_days_per_week() -> u32 {
    8
}

const fn default_weeks_per_year() -> u32 {
    46
}

const fn default_initial_population() -> u32 {
    100
}

const fn default_weeks_to_run() -> u64 {
    460
}

const fn default_seed() -> u64 {
    42
}
