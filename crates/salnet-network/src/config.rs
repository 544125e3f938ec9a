//! Configuration sections consumed by the network crate.
//!
//! [`NetworkSettings`] shapes the synthetic terminal reaches appended
//! below the river mouth; [`HabitatSettings`] tunes the territory ledger.
//! Both are loaded as sections of the top-level simulation config and
//! fall back to the stock parameterization when absent.

use serde::Deserialize;

/// Settings for network construction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NetworkSettings {
    /// Length of the migration corridor between the river mouth and the
    /// ocean, km.
    #[serde(default = "default_network_to_ocean_distance_km")]
    pub network_to_ocean_distance_km: f64,

    /// Length assigned to the synthetic ocean reach, km.
    #[serde(default = "default_ocean_reach_length_km")]
    pub ocean_reach_length_km: f64,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            network_to_ocean_distance_km: default_network_to_ocean_distance_km(),
            ocean_reach_length_km: default_ocean_reach_length_km(),
        }
    }
}

/// Settings for the habitat territory ledger.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HabitatSettings {
    /// Floor applied to the ration fraction a shorted fish feeds at.
    #[serde(default = "default_minimum_ration_fraction")]
    pub minimum_ration_fraction: f64,

    /// Grams of drift prey supplied per square meter of territory per
    /// gram of gross primary production. Converts reach productivity
    /// into the area a fish needs to meet its target consumption.
    #[serde(default = "default_drift_conversion")]
    pub drift_conversion: f64,
}

impl Default for HabitatSettings {
    fn default() -> Self {
        Self {
            minimum_ration_fraction: default_minimum_ration_fraction(),
            drift_conversion: default_drift_conversion(),
        }
    }
}

const fn default_network_to_ocean_distance_km() -> f64 {
    1115.0
}

const fn default_ocean_reach_length_km() -> f64 {
    10.0
}

const fn default_minimum_ration_fraction() -> f64 {
    0.2
}

const fn default_drift_conversion() -> f64 {
    0.05
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_parameterization() {
        let settings = NetworkSettings::default();
        assert!((settings.network_to_ocean_distance_km - 1115.0).abs() < f64::EPSILON);
        assert!((settings.ocean_reach_length_km - 10.0).abs() < f64::EPSILON);

        let habitat = HabitatSettings::default();
        assert!((habitat.minimum_ration_fraction - 0.2).abs() < f64::EPSILON);
    }
}
