//! Stream reach state: attributes, temperatures, productivity, occupancy.
//!
//! A [`Reach`] wraps the immutable [`ReachAttributes`] loaded at build
//! time and adds the mutable per-week state: fish and redd membership,
//! the habitat ledger, and the population history appended when the
//! network steps.
//!
//! Two synthetic terminal reaches (migration corridor and ocean) share
//! this type; they carry empty temperature series and no habitat ledger,
//! and temperature queries against them are redirected to the river
//! mouth by the network.

use std::collections::BTreeSet;

use salnet_types::{FishId, ReachId, ReddId};
use serde::{Deserialize, Serialize};

use crate::error::NetworkError;
use crate::habitat::HabitatLedger;

// ---------------------------------------------------------------------------
// Gross primary production model
// ---------------------------------------------------------------------------

/// Intercept of the log-GPP regression.
const GPP_LOG_INTERCEPT: f64 = -11.538;
/// Conductivity coefficient of the log-GPP regression, per uS/cm.
const GPP_CONDUCTIVITY_COEF: f64 = 0.008_27;
/// Solar-exposed-area coefficient of the log-GPP regression, per m^2.
const GPP_AREA_SOLAR_COEF: f64 = 0.000_004_11;
/// Temperature coefficient of the log-GPP regression, per degree C.
const GPP_TEMPERATURE_COEF: f64 = 0.538;

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// Immutable physical attributes of a reach, fixed when the network is
/// built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReachAttributes {
    /// External identifier from the source data. Real reaches carry
    /// non-negative values; the synthetic migration reach uses -2 and the
    /// ocean -1.
    pub source_id: i64,
    /// Node the reach flows from.
    pub from_node: i64,
    /// Node the reach flows to.
    pub to_node: i64,
    /// Reach length, km.
    pub length_km: f64,
    /// Bank-full width, m.
    pub bank_full_width_m: f64,
    /// Strahler stream order.
    pub strahler_order: u32,
    /// Channel gradient, dimensionless.
    pub gradient: f64,
    /// Specific conductivity, uS/cm.
    pub conductivity: f64,
    /// Solar-exposed area, m^2.
    pub area_solar: f64,
    /// Spring 95th-percentile flow index used by redd scour.
    pub spring95: f64,
    /// Redd capacity per square meter of wetted area.
    pub redd_density_per_m2: f64,
    /// Whether the reach lies within the anadromous extent.
    pub is_within_steelhead_extent: bool,
    /// Weekly water temperatures, degrees C. The series repeats
    /// cyclically, so one year of values covers any simulation length.
    pub temperatures: Vec<f64>,
}

// ---------------------------------------------------------------------------
// Per-week history
// ---------------------------------------------------------------------------

/// Population snapshot for one completed week of one reach.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReachRecord {
    /// Simulation week the record describes.
    pub week: u64,
    /// Live anadromous fish present at the end of the week.
    pub anadromous: u32,
    /// Live resident fish present at the end of the week.
    pub resident: u32,
    /// Live redds incubating at the end of the week.
    pub n_redds: u32,
    /// Fraction of the habitat ledger consumed during the week. Zero on
    /// reaches without a ledger.
    pub habitat_used_fraction: f64,
}

impl ReachRecord {
    /// Total live fish of both life histories.
    #[must_use]
    pub const fn population(&self) -> u32 {
        self.anadromous.saturating_add(self.resident)
    }
}

// ---------------------------------------------------------------------------
// Reach
// ---------------------------------------------------------------------------

/// One reach of the stream network with its mutable runtime state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reach {
    /// Arena identifier of this reach.
    pub id: ReachId,
    /// Physical attributes fixed at build time.
    pub attributes: ReachAttributes,
    /// True for the synthetic saltwater terminal.
    pub is_ocean: bool,
    /// True for the synthetic migration corridor between the river mouth
    /// and the ocean.
    pub is_migration: bool,
    /// Fish currently located in this reach.
    pub fish: BTreeSet<FishId>,
    /// Redds currently incubating in this reach.
    pub redds: BTreeSet<ReddId>,
    /// Weekly territory ledger. Absent on terminal reaches.
    pub habitat: Option<HabitatLedger>,
    wetted_area_m2: f64,
    capacity_redds: f64,
    history: Vec<ReachRecord>,
}

impl Reach {
    /// Build a reach from its attributes. Wetted area and redd capacity
    /// are derived here and never change afterwards.
    #[must_use]
    pub fn new(id: ReachId, attributes: ReachAttributes) -> Self {
        let wetted_area_m2 = attributes.length_km * 1000.0 * attributes.bank_full_width_m;
        let capacity_redds = attributes.redd_density_per_m2 * wetted_area_m2;
        Self {
            id,
            attributes,
            is_ocean: false,
            is_migration: false,
            fish: BTreeSet::new(),
            redds: BTreeSet::new(),
            habitat: None,
            wetted_area_m2,
            capacity_redds,
            history: Vec::new(),
        }
    }

    /// Reach length, km.
    #[must_use]
    pub const fn length_km(&self) -> f64 {
        self.attributes.length_km
    }

    /// Wetted area, m^2.
    #[must_use]
    pub const fn wetted_area_m2(&self) -> f64 {
        self.wetted_area_m2
    }

    /// Number of redds this reach can hold before spawners are displaced.
    #[must_use]
    pub const fn capacity_redds(&self) -> f64 {
        self.capacity_redds
    }

    /// True for the migration corridor and the ocean.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.is_ocean || self.is_migration
    }

    /// Number of fish currently present.
    ///
    /// Saturates at `u32::MAX` if the set somehow exceeds it.
    #[must_use]
    pub fn fish_count(&self) -> u32 {
        u32::try_from(self.fish.len()).unwrap_or(u32::MAX)
    }

    /// Number of redds currently present.
    #[must_use]
    pub fn redd_count(&self) -> u32 {
        u32::try_from(self.redds.len()).unwrap_or(u32::MAX)
    }

    /// Whether another redd fits under this reach's capacity.
    #[must_use]
    pub fn has_redd_capacity(&self) -> bool {
        f64::from(self.redd_count()) < self.capacity_redds
    }

    /// Water temperature for a simulation week, degrees C.
    ///
    /// The configured series repeats cyclically, so a one-year series
    /// covers any simulation length.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::EmptyTemperatureSeries`] when the reach has
    /// no temperature data. Terminal reaches never carry their own series;
    /// query them through the network, which redirects to the river mouth.
    pub fn temperature_at_week(&self, week: u64) -> Result<f64, NetworkError> {
        let series = &self.attributes.temperatures;
        if series.is_empty() {
            return Err(NetworkError::EmptyTemperatureSeries { reach: self.id });
        }
        let len = u64::try_from(series.len()).unwrap_or(u64::MAX);
        let index = week
            .checked_rem(len)
            .and_then(|rem| usize::try_from(rem).ok())
            .unwrap_or(0);
        Ok(series.get(index).copied().unwrap_or(0.0))
    }

    /// Gross primary production for a simulation week, grams of carbon
    /// per square meter per day.
    ///
    /// A log-linear regression on conductivity, solar-exposed area, and
    /// the week's water temperature.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::EmptyTemperatureSeries`] when the reach has
    /// no temperature data.
    pub fn gpp_at_week(&self, week: u64) -> Result<f64, NetworkError> {
        let temperature = self.temperature_at_week(week)?;
        let log_gpp = GPP_TEMPERATURE_COEF.mul_add(
            temperature,
            GPP_AREA_SOLAR_COEF.mul_add(
                self.attributes.area_solar,
                GPP_CONDUCTIVITY_COEF.mul_add(self.attributes.conductivity, GPP_LOG_INTERCEPT),
            ),
        );
        Ok(log_gpp.exp())
    }

    /// Completed weekly records, oldest first.
    #[must_use]
    pub fn history(&self) -> &[ReachRecord] {
        &self.history
    }

    /// The record for one simulation week, if that week has completed.
    #[must_use]
    pub fn record_for_week(&self, week: u64) -> Option<&ReachRecord> {
        self.history.iter().find(|record| record.week == week)
    }

    pub(crate) fn push_record(&mut self, record: ReachRecord) {
        self.history.push(record);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn make_attributes() -> ReachAttributes {
        ReachAttributes {
            source_id: 7,
            from_node: 2,
            to_node: 1,
            length_km: 2.5,
            bank_full_width_m: 4.0,
            strahler_order: 3,
            gradient: 0.012,
            conductivity: 120.0,
            area_solar: 150_000.0,
            spring95: 1.1,
            redd_density_per_m2: 0.001,
            is_within_steelhead_extent: true,
            temperatures: vec![4.0, 8.0, 14.0],
        }
    }

    #[test]
    fn derived_area_and_capacity_follow_attributes() {
        let reach = Reach::new(ReachId::from_raw(0), make_attributes());
        assert!((reach.wetted_area_m2() - 10_000.0).abs() < 1e-9);
        assert!((reach.capacity_redds() - 10.0).abs() < 1e-9);
        assert!(reach.has_redd_capacity());
    }

    #[test]
    fn temperature_series_repeats_cyclically() {
        let reach = Reach::new(ReachId::from_raw(0), make_attributes());
        assert!((reach.temperature_at_week(0).unwrap() - 4.0).abs() < f64::EPSILON);
        assert!((reach.temperature_at_week(2).unwrap() - 14.0).abs() < f64::EPSILON);
        assert!((reach.temperature_at_week(3).unwrap() - 4.0).abs() < f64::EPSILON);
        assert!((reach.temperature_at_week(7).unwrap() - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_temperature_series_is_an_error() {
        let mut attributes = make_attributes();
        attributes.temperatures.clear();
        let reach = Reach::new(ReachId::from_raw(3), make_attributes());
        let bare = Reach::new(ReachId::from_raw(3), attributes);
        assert!(reach.temperature_at_week(0).is_ok());
        assert!(matches!(
            bare.temperature_at_week(0),
            Err(NetworkError::EmptyTemperatureSeries { .. })
        ));
    }

    #[test]
    fn gpp_grows_with_temperature() {
        let reach = Reach::new(ReachId::from_raw(0), make_attributes());
        let cold = reach.gpp_at_week(0).unwrap();
        let warm = reach.gpp_at_week(2).unwrap();
        assert!(cold > 0.0);
        assert!(warm > cold);
    }

    #[test]
    fn redd_capacity_closes_when_full() {
        let mut attributes = make_attributes();
        attributes.redd_density_per_m2 = 0.0002;
        let mut reach = Reach::new(ReachId::from_raw(1), attributes);
        assert!((reach.capacity_redds() - 2.0).abs() < 1e-9);
        reach.redds.insert(ReddId::from_raw(1));
        assert!(reach.has_redd_capacity());
        reach.redds.insert(ReddId::from_raw(2));
        assert!(!reach.has_redd_capacity());
    }

    #[test]
    fn history_lookup_matches_week() {
        let mut reach = Reach::new(ReachId::from_raw(0), make_attributes());
        reach.push_record(ReachRecord {
            week: 0,
            anadromous: 2,
            resident: 3,
            n_redds: 1,
            habitat_used_fraction: 0.25,
        });
        reach.push_record(ReachRecord {
            week: 1,
            anadromous: 1,
            resident: 4,
            n_redds: 0,
            habitat_used_fraction: 0.5,
        });
        let record = reach.record_for_week(1).unwrap();
        assert_eq!(record.population(), 5);
        assert!(reach.record_for_week(9).is_none());
    }
}
