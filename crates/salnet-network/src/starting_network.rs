//! Built-in demo river network and synthetic habitat preferences.
//!
//! Real runs load reach attributes from survey data. The demo network
//! here is a small but fully featured basin used by the binary and the
//! integration tests: a four-reach mainstem, two tributary branches
//! with their own forks, a headwater above an impassable falls (outside
//! the anadromous extent), and the usual synthetic migration and ocean
//! reaches below the mouth.
//!
//! Layout, drawn with the mouth at the bottom:
//!
//! ```text
//!   headwaters*      tributary_fork   spring_brook
//!        |                  \            /
//!   upper_mainstem           big_tributary
//!        |    cold_creek          |
//!        |   /                    |
//!   middle_mainstem               |
//!              \                  |
//!               lower_mainstem ---+
//!                    |
//!               (migration)
//!                    |
//!                 (ocean)
//!
//!   * outside the anadromous extent
//! ```

use std::collections::BTreeMap;
use std::f64::consts::TAU;

use salnet_types::ReachId;

use crate::config::NetworkSettings;
use crate::error::NetworkError;
use crate::habitat::{
    HabitatClass, HabitatLedger, HabitatPreferenceTable, LengthEntry, RankedClass,
};
use crate::network::StreamNetwork;
use crate::reach::ReachAttributes;

/// Share of a reach's wetted area usable as drift-feeding territory.
const DEMO_USABLE_AREA_FRACTION: f64 = 0.3;

/// Week of the temperature sinusoid's zero crossing, so the peak falls
/// in midsummer of a 46-week year.
const TEMPERATURE_PHASE_WEEKS: f64 = 14.0;

/// Identifiers of the named demo reaches.
#[derive(Debug, Clone, Copy)]
pub struct DemoReachIds {
    /// Mouth of the basin, draining to the migration corridor.
    pub lower_mainstem: ReachId,
    /// Mainstem between the two major junctions.
    pub middle_mainstem: ReachId,
    /// Mainstem above the cold creek junction.
    pub upper_mainstem: ReachId,
    /// Headwater above an impassable falls, outside the anadromous
    /// extent.
    pub headwaters: ReachId,
    /// Major tributary joining the lower mainstem.
    pub big_tributary: ReachId,
    /// Left fork at the top of the big tributary.
    pub tributary_fork: ReachId,
    /// Small cold tributary joining the middle mainstem.
    pub cold_creek: ReachId,
    /// Spring-fed right fork at the top of the big tributary.
    pub spring_brook: ReachId,
}

/// Build the demo network with habitat ledgers attached to every real
/// reach.
///
/// `weeks_per_year` sets the length of each synthetic temperature
/// series so the seasonal cycle lines up with the simulation calendar.
///
/// # Errors
///
/// Returns [`NetworkError`] when the wiring or lookup of the hand-built
/// rows fails.
#[allow(clippy::too_many_lines)]
pub fn create_demo_network(
    settings: &NetworkSettings,
    weeks_per_year: u32,
) -> Result<(StreamNetwork, DemoReachIds), NetworkError> {
    let rows = vec![
        reach_row(DemoRow {
            source_id: 1,
            from_node: 1,
            to_node: 0,
            length_km: 8.0,
            bank_full_width_m: 18.0,
            strahler_order: 5,
            gradient: 0.004,
            base_temperature_c: 9.0,
            temperature_amplitude_c: 7.0,
            is_within_steelhead_extent: true,
            weeks_per_year,
        }),
        reach_row(DemoRow {
            source_id: 2,
            from_node: 2,
            to_node: 1,
            length_km: 6.5,
            bank_full_width_m: 14.0,
            strahler_order: 4,
            gradient: 0.007,
            base_temperature_c: 8.4,
            temperature_amplitude_c: 6.5,
            is_within_steelhead_extent: true,
            weeks_per_year,
        }),
        reach_row(DemoRow {
            source_id: 3,
            from_node: 3,
            to_node: 2,
            length_km: 5.0,
            bank_full_width_m: 10.0,
            strahler_order: 3,
            gradient: 0.012,
            base_temperature_c: 7.6,
            temperature_amplitude_c: 6.0,
            is_within_steelhead_extent: true,
            weeks_per_year,
        }),
        reach_row(DemoRow {
            source_id: 4,
            from_node: 4,
            to_node: 3,
            length_km: 4.0,
            bank_full_width_m: 6.0,
            strahler_order: 2,
            gradient: 0.028,
            base_temperature_c: 6.8,
            temperature_amplitude_c: 5.0,
            is_within_steelhead_extent: false,
            weeks_per_year,
        }),
        reach_row(DemoRow {
            source_id: 5,
            from_node: 5,
            to_node: 1,
            length_km: 7.0,
            bank_full_width_m: 8.0,
            strahler_order: 3,
            gradient: 0.010,
            base_temperature_c: 8.0,
            temperature_amplitude_c: 6.2,
            is_within_steelhead_extent: true,
            weeks_per_year,
        }),
        reach_row(DemoRow {
            source_id: 6,
            from_node: 6,
            to_node: 5,
            length_km: 3.5,
            bank_full_width_m: 5.0,
            strahler_order: 2,
            gradient: 0.022,
            base_temperature_c: 7.2,
            temperature_amplitude_c: 5.4,
            is_within_steelhead_extent: true,
            weeks_per_year,
        }),
        reach_row(DemoRow {
            source_id: 7,
            from_node: 7,
            to_node: 2,
            length_km: 2.5,
            bank_full_width_m: 4.0,
            strahler_order: 2,
            gradient: 0.025,
            base_temperature_c: 6.5,
            temperature_amplitude_c: 2.5,
            is_within_steelhead_extent: true,
            weeks_per_year,
        }),
        reach_row(DemoRow {
            source_id: 8,
            from_node: 8,
            to_node: 5,
            length_km: 2.0,
            bank_full_width_m: 3.5,
            strahler_order: 1,
            gradient: 0.030,
            base_temperature_c: 7.0,
            temperature_amplitude_c: 2.0,
            is_within_steelhead_extent: true,
            weeks_per_year,
        }),
    ];

    let mut network = StreamNetwork::from_attributes(rows, settings)?;

    let real: Vec<ReachId> = network.real_reaches().to_vec();
    for id in real {
        let reach = network.reach_mut(id)?;
        let ledger = demo_ledger(
            reach.wetted_area_m2(),
            reach.attributes.strahler_order,
        );
        reach.habitat = Some(ledger);
    }

    let ids = DemoReachIds {
        lower_mainstem: network.reach_with_source_id(1)?.id,
        middle_mainstem: network.reach_with_source_id(2)?.id,
        upper_mainstem: network.reach_with_source_id(3)?.id,
        headwaters: network.reach_with_source_id(4)?.id,
        big_tributary: network.reach_with_source_id(5)?.id,
        tributary_fork: network.reach_with_source_id(6)?.id,
        cold_creek: network.reach_with_source_id(7)?.id,
        spring_brook: network.reach_with_source_id(8)?.id,
    };
    Ok((network, ids))
}

/// Inputs for one hand-built demo reach.
struct DemoRow {
    source_id: i64,
    from_node: i64,
    to_node: i64,
    length_km: f64,
    bank_full_width_m: f64,
    strahler_order: u32,
    gradient: f64,
    base_temperature_c: f64,
    temperature_amplitude_c: f64,
    is_within_steelhead_extent: bool,
    weeks_per_year: u32,
}

fn reach_row(row: DemoRow) -> ReachAttributes {
    let wetted_area_m2 = row.length_km * 1000.0 * row.bank_full_width_m;
    ReachAttributes {
        source_id: row.source_id,
        from_node: row.from_node,
        to_node: row.to_node,
        length_km: row.length_km,
        bank_full_width_m: row.bank_full_width_m,
        strahler_order: row.strahler_order,
        gradient: row.gradient,
        conductivity: 40.0f64.mul_add(f64::from(row.strahler_order), 70.0),
        area_solar: wetted_area_m2 * 0.6,
        spring95: 40.0f64.mul_add(row.gradient, 0.5),
        redd_density_per_m2: 0.002,
        is_within_steelhead_extent: row.is_within_steelhead_extent,
        temperatures: seasonal_temperatures(
            row.base_temperature_c,
            row.temperature_amplitude_c,
            row.weeks_per_year,
        ),
    }
}

/// One year of weekly temperatures on a sinusoid peaking in midsummer,
/// floored at 0.5 degrees C.
fn seasonal_temperatures(base_c: f64, amplitude_c: f64, weeks_per_year: u32) -> Vec<f64> {
    (0..weeks_per_year)
        .map(|week| {
            let phase =
                (f64::from(week) - TEMPERATURE_PHASE_WEEKS) / f64::from(weeks_per_year) * TAU;
            amplitude_c.mul_add(phase.sin(), base_c).max(0.5)
        })
        .collect()
}

/// Spread a reach's usable territory across habitat classes.
///
/// Bigger (higher-order) channels hold their area in deeper, faster
/// classes; small creeks in shallow, slow ones. The spread is a
/// deterministic kernel around a mode that shifts with stream order.
fn demo_ledger(wetted_area_m2: f64, strahler_order: u32) -> HabitatLedger {
    let mode_depth_bin = i32::try_from(strahler_order.saturating_mul(2).min(16)).unwrap_or(16);
    let mode_velocity_bin = i32::try_from(strahler_order.saturating_add(4).min(16)).unwrap_or(16);

    let mut weights: BTreeMap<HabitatClass, f64> = BTreeMap::new();
    let mut total_weight = 0.0;
    for class in HabitatClass::all() {
        let depth_distance = i32::from(class.depth_bin())
            .saturating_sub(mode_depth_bin)
            .unsigned_abs()
            .saturating_add(1);
        let velocity_distance = i32::from(class.velocity_bin())
            .saturating_sub(mode_velocity_bin)
            .unsigned_abs()
            .saturating_add(1);
        let weight = 1.0 / (f64::from(depth_distance) * f64::from(velocity_distance));
        total_weight += weight;
        weights.insert(class, weight);
    }

    let usable_area = wetted_area_m2 * DEMO_USABLE_AREA_FRACTION;
    let areas: BTreeMap<HabitatClass, f64> = weights
        .into_iter()
        .map(|(class, weight)| (class, usable_area * weight / total_weight))
        .collect();
    HabitatLedger::new(areas)
}

/// Fork lengths tabulated in the synthetic preference table, mm.
const PREFERENCE_LENGTHS_MM: [f64; 11] = [
    35.0, 60.0, 90.0, 120.0, 160.0, 200.0, 250.0, 300.0, 400.0, 500.0, 600.0,
];

/// Ranked classes kept per table entry.
const PREFERENCE_CLASSES_PER_ENTRY: usize = 40;

/// Build a deterministic stand-in for field-derived NREI preference
/// data.
///
/// For each tabulated temperature and fork length, classes are scored
/// with a separable Gaussian around a preferred depth that grows with
/// fish size and a preferred velocity that grows with temperature, less
/// a flat swimming cost. Positive scores are kept, best first.
#[must_use]
pub fn synthetic_preference_table() -> HabitatPreferenceTable {
    let mut by_temperature: BTreeMap<u8, Vec<LengthEntry>> = BTreeMap::new();
    for temperature in 1..=20_u8 {
        let mut entries = Vec::with_capacity(PREFERENCE_LENGTHS_MM.len());
        for &fork_length_mm in &PREFERENCE_LENGTHS_MM {
            let preferred_depth_m = (fork_length_mm / 600.0).mul_add(1.2, 0.2);
            let preferred_velocity = (f64::from(temperature) / 20.0).mul_add(0.3, 0.1);
            let mut ranked: Vec<RankedClass> = HabitatClass::all()
                .filter_map(|class| {
                    let depth_term =
                        gaussian(class.depth_m(), preferred_depth_m, 0.25);
                    let velocity_term =
                        gaussian(class.velocity_m_per_s(), preferred_velocity, 0.12);
                    let nrei = depth_term.mul_add(velocity_term, -0.05);
                    (nrei > 0.0).then_some(RankedClass { class, nrei })
                })
                .collect();
            ranked.sort_by(|a, b| {
                b.nrei
                    .partial_cmp(&a.nrei)
                    .unwrap_or(core::cmp::Ordering::Equal)
            });
            ranked.truncate(PREFERENCE_CLASSES_PER_ENTRY);
            entries.push(LengthEntry {
                fork_length_mm,
                ranked,
            });
        }
        by_temperature.insert(temperature, entries);
    }
    HabitatPreferenceTable::new(by_temperature)
}

fn gaussian(value: f64, mean: f64, sigma: f64) -> f64 {
    let z = (value - mean) / sigma;
    (-0.5 * z * z).exp()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn demo_network_builds_with_terminals_and_ledgers() {
        let (network, ids) = create_demo_network(&NetworkSettings::default(), 46).unwrap();
        assert_eq!(network.reach_count(), 10);
        assert_eq!(network.mouth(), ids.lower_mainstem);
        assert!(
            !network
                .reach(ids.headwaters)
                .unwrap()
                .attributes
                .is_within_steelhead_extent
        );
        for reach in network.reaches() {
            if reach.is_terminal() {
                assert!(reach.habitat.is_none());
            } else {
                let ledger = reach.habitat.as_ref().unwrap();
                assert!(ledger.initial_total() > 0.0);
            }
        }
    }

    #[test]
    fn demo_junctions_match_the_layout() {
        let (network, ids) = create_demo_network(&NetworkSettings::default(), 46).unwrap();
        let into_lower = network.upstream_of(ids.lower_mainstem);
        assert!(into_lower.contains(&ids.middle_mainstem));
        assert!(into_lower.contains(&ids.big_tributary));
        let into_big = network.upstream_of(ids.big_tributary);
        assert!(into_big.contains(&ids.tributary_fork));
        assert!(into_big.contains(&ids.spring_brook));
        assert!(network.upstream_of(ids.headwaters).is_empty());
    }

    #[test]
    fn seasonal_temperatures_peak_in_midsummer() {
        let series = seasonal_temperatures(9.0, 7.0, 46);
        assert_eq!(series.len(), 46);
        assert!(series.iter().all(|&t| t >= 0.5));
        let peak_week = series
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(week, _)| week)
            .unwrap();
        assert!((20..=30).contains(&peak_week));
    }

    #[test]
    fn ledger_areas_sum_to_the_usable_share() {
        let ledger = demo_ledger(10_000.0, 3);
        let expected = 10_000.0 * DEMO_USABLE_AREA_FRACTION;
        assert!((ledger.initial_total() - expected).abs() < 1e-6);
    }

    #[test]
    fn preference_table_is_ranked_and_positive() {
        let table = synthetic_preference_table();
        assert_eq!(table.temperature_count(), 20);
        let ranked = table.preferences(10.0, 100.0);
        assert!(!ranked.is_empty());
        assert!(ranked.len() <= PREFERENCE_CLASSES_PER_ENTRY);
        for pair in ranked.windows(2) {
            if let [a, b] = pair {
                assert!(a.nrei >= b.nrei);
            }
        }
        assert!(ranked.iter().all(|entry| entry.nrei > 0.0));
    }

    #[test]
    fn bigger_fish_prefer_deeper_classes() {
        let table = synthetic_preference_table();
        let small_best = table.preferences(12.0, 40.0).first().copied().unwrap();
        let large_best = table.preferences(12.0, 550.0).first().copied().unwrap();
        assert!(large_best.class.depth_m() > small_best.class.depth_m());
    }
}
