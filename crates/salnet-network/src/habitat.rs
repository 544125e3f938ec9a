//! Drift-feeding territory ledger and habitat preferences.
//!
//! Each real reach carries a [`HabitatLedger`]: a fixed budget of usable
//! area per depth/velocity [`HabitatClass`], drawn down as fish claim
//! territory during a week and restored when the network steps. Because
//! the scheduler serves fish in descending fork-length order, larger fish
//! draw against fuller ledgers; smaller fish absorb the shortfall as a
//! reduced ration fraction.
//!
//! [`HabitatPreferenceTable`] supplies, per water temperature and fish
//! size, the classes a fish can use ranked by net rate of energy intake
//! (NREI), best first.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Habitat classes
// ---------------------------------------------------------------------------

/// Number of depth bins: 0.0 to 2.0 m in 0.1 m steps.
pub const DEPTH_BIN_COUNT: u8 = 21;

/// Number of velocity bins: 0.0 to 1.0 m/s in 0.05 m/s steps.
pub const VELOCITY_BIN_COUNT: u8 = 21;

/// Width of one depth bin, m.
pub const DEPTH_BIN_WIDTH_M: f64 = 0.1;

/// Width of one velocity bin, m/s.
pub const VELOCITY_BIN_WIDTH_M_PER_S: f64 = 0.05;

/// A depth/velocity habitat class, quantized to the preference grid.
///
/// Classes are ordered and hashable so they can key the ledger maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HabitatClass {
    depth_bin: u8,
    velocity_bin: u8,
}

impl HabitatClass {
    /// Build a class from bin indices. Returns `None` when either index
    /// falls outside the grid.
    #[must_use]
    pub const fn from_bins(depth_bin: u8, velocity_bin: u8) -> Option<Self> {
        if depth_bin < DEPTH_BIN_COUNT && velocity_bin < VELOCITY_BIN_COUNT {
            Some(Self {
                depth_bin,
                velocity_bin,
            })
        } else {
            None
        }
    }

    /// Depth bin index within the grid.
    #[must_use]
    pub const fn depth_bin(self) -> u8 {
        self.depth_bin
    }

    /// Velocity bin index within the grid.
    #[must_use]
    pub const fn velocity_bin(self) -> u8 {
        self.velocity_bin
    }

    /// Depth at the lower edge of this class, m.
    #[must_use]
    pub fn depth_m(self) -> f64 {
        f64::from(self.depth_bin) * DEPTH_BIN_WIDTH_M
    }

    /// Velocity at the lower edge of this class, m/s.
    #[must_use]
    pub fn velocity_m_per_s(self) -> f64 {
        f64::from(self.velocity_bin) * VELOCITY_BIN_WIDTH_M_PER_S
    }

    /// Iterate over every class in the grid, depth-major.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..DEPTH_BIN_COUNT).flat_map(|depth_bin| {
            (0..VELOCITY_BIN_COUNT).map(move |velocity_bin| Self {
                depth_bin,
                velocity_bin,
            })
        })
    }
}

impl core::fmt::Display for HabitatClass {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:.1}_{:.2}", self.depth_m(), self.velocity_m_per_s())
    }
}

// ---------------------------------------------------------------------------
// Territory ledger
// ---------------------------------------------------------------------------

/// Outcome of a territory request against a reach's ledger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grant {
    /// Class the territory came from, when any area was granted.
    pub class: Option<HabitatClass>,
    /// Area actually granted, m^2.
    pub area: f64,
    /// Granted area over desired area, in `[0, 1]`.
    pub ration_fraction: f64,
}

impl Grant {
    /// True when the request was met in full.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.ration_fraction >= 1.0
    }
}

/// One entry of a ranked habitat preference list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedClass {
    /// The habitat class.
    pub class: HabitatClass,
    /// Net rate of energy intake a fish of the keyed size obtains there.
    /// Only positive values are tabulated.
    pub nrei: f64,
}

/// Per-reach ledger of drift-feeding territory by habitat class.
///
/// `initial` is fixed at build time from the reach's class-area
/// composition; `current` is drawn down within a week and restored by
/// [`HabitatLedger::reset`] when the network steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitatLedger {
    initial: BTreeMap<HabitatClass, f64>,
    current: BTreeMap<HabitatClass, f64>,
}

impl HabitatLedger {
    /// Build a ledger from initial class areas. Non-positive areas are
    /// dropped.
    #[must_use]
    pub fn new(areas: BTreeMap<HabitatClass, f64>) -> Self {
        let initial: BTreeMap<HabitatClass, f64> =
            areas.into_iter().filter(|(_, area)| *area > 0.0).collect();
        let current = initial.clone();
        Self { initial, current }
    }

    /// Restore the full class areas for a new week.
    pub fn reset(&mut self) {
        self.current = self.initial.clone();
    }

    /// Total area available at the start of a week, m^2.
    #[must_use]
    pub fn initial_total(&self) -> f64 {
        self.initial.values().sum()
    }

    /// Total area still unallocated this week, m^2.
    #[must_use]
    pub fn remaining_total(&self) -> f64 {
        self.current.values().sum()
    }

    /// Remaining area for one class, m^2.
    #[must_use]
    pub fn remaining(&self, class: HabitatClass) -> f64 {
        self.current.get(&class).copied().unwrap_or(0.0)
    }

    /// Fraction of the initial area allocated so far this week.
    #[must_use]
    pub fn used_fraction(&self) -> f64 {
        let initial = self.initial_total();
        if initial > 0.0 {
            1.0 - self.remaining_total() / initial
        } else {
            0.0
        }
    }

    /// Allocate territory for one fish.
    ///
    /// The first ranked class whose remaining area covers the request wins
    /// a full grant. When none can, the ranked class with the most area
    /// left is drained entirely and the ration fraction scales to what was
    /// granted. A fish whose ranked classes are all empty receives
    /// nothing.
    ///
    /// `current` never goes negative and the granted area never exceeds
    /// what the ledger held.
    pub fn allocate(&mut self, ranked: &[RankedClass], desired_area: f64) -> Grant {
        if !desired_area.is_finite() || desired_area <= 0.0 {
            return Grant {
                class: None,
                area: 0.0,
                ration_fraction: 1.0,
            };
        }

        for entry in ranked {
            let remaining = self.remaining(entry.class);
            if remaining >= desired_area {
                self.current.insert(entry.class, remaining - desired_area);
                return Grant {
                    class: Some(entry.class),
                    area: desired_area,
                    ration_fraction: 1.0,
                };
            }
        }

        let fallback = ranked.iter().max_by(|a, b| {
            self.remaining(a.class)
                .partial_cmp(&self.remaining(b.class))
                .unwrap_or(Ordering::Equal)
        });

        match fallback {
            Some(entry) if self.remaining(entry.class) > 0.0 => {
                let granted = self.remaining(entry.class);
                self.current.insert(entry.class, 0.0);
                Grant {
                    class: Some(entry.class),
                    area: granted,
                    ration_fraction: (granted / desired_area).min(1.0),
                }
            }
            _ => Grant {
                class: None,
                area: 0.0,
                ration_fraction: 0.0,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Preference tables
// ---------------------------------------------------------------------------

/// Ranked classes for one fork length at one temperature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LengthEntry {
    /// Fork length this entry was computed for, mm.
    pub fork_length_mm: f64,
    /// Usable classes ranked by declining energy intake.
    pub ranked: Vec<RankedClass>,
}

/// Habitat preference lists keyed by integer water temperature.
///
/// Temperatures are tabulated over 1 to 20 degrees C; lookups clamp to
/// the nearest tabulated temperature and pick the fork-length entry with
/// the smallest absolute difference from the queried length.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HabitatPreferenceTable {
    by_temperature: BTreeMap<u8, Vec<LengthEntry>>,
}

impl HabitatPreferenceTable {
    /// Build a table from per-temperature entries.
    #[must_use]
    pub const fn new(by_temperature: BTreeMap<u8, Vec<LengthEntry>>) -> Self {
        Self { by_temperature }
    }

    /// Ranked classes for a temperature and fork length. Returns an empty
    /// slice when the table has no entries.
    #[must_use]
    pub fn preferences(&self, temperature_c: f64, fork_length_mm: f64) -> &[RankedClass] {
        let nearest_temp = self.by_temperature.keys().copied().min_by(|a, b| {
            let da = (f64::from(*a) - temperature_c).abs();
            let db = (f64::from(*b) - temperature_c).abs();
            da.partial_cmp(&db).unwrap_or(Ordering::Equal)
        });
        let Some(temp_key) = nearest_temp else {
            return &[];
        };
        let Some(entries) = self.by_temperature.get(&temp_key) else {
            return &[];
        };
        let nearest_entry = entries.iter().min_by(|a, b| {
            let da = (a.fork_length_mm - fork_length_mm).abs();
            let db = (b.fork_length_mm - fork_length_mm).abs();
            da.partial_cmp(&db).unwrap_or(Ordering::Equal)
        });
        nearest_entry.map_or(&[], |entry| entry.ranked.as_slice())
    }

    /// Number of tabulated temperatures.
    #[must_use]
    pub fn temperature_count(&self) -> usize {
        self.by_temperature.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn class(depth_bin: u8, velocity_bin: u8) -> HabitatClass {
        HabitatClass::from_bins(depth_bin, velocity_bin).unwrap()
    }

    fn ranked(classes: &[HabitatClass]) -> Vec<RankedClass> {
        let mut nrei = 10.0;
        classes
            .iter()
            .map(|&c| {
                let entry = RankedClass { class: c, nrei };
                nrei -= 1.0;
                entry
            })
            .collect()
    }

    fn make_ledger(areas: &[(HabitatClass, f64)]) -> HabitatLedger {
        HabitatLedger::new(areas.iter().copied().collect())
    }

    #[test]
    fn class_grid_has_expected_size_and_labels() {
        assert_eq!(HabitatClass::all().count(), 21 * 21);
        let c = class(4, 3);
        assert!((c.depth_m() - 0.4).abs() < 1e-12);
        assert!((c.velocity_m_per_s() - 0.15).abs() < 1e-12);
        assert_eq!(c.to_string(), "0.4_0.15");
        assert!(HabitatClass::from_bins(21, 0).is_none());
        assert!(HabitatClass::from_bins(0, 21).is_none());
    }

    #[test]
    fn full_grant_comes_from_first_sufficient_class() {
        let a = class(1, 1);
        let b = class(2, 2);
        let mut ledger = make_ledger(&[(a, 3.0), (b, 50.0)]);
        let grant = ledger.allocate(&ranked(&[a, b]), 5.0);
        assert!(grant.is_full());
        assert_eq!(grant.class, Some(b));
        assert!((ledger.remaining(b) - 45.0).abs() < 1e-12);
        assert!((ledger.remaining(a) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn shortfall_drains_largest_ranked_class() {
        let a = class(1, 1);
        let b = class(2, 2);
        let mut ledger = make_ledger(&[(a, 2.0), (b, 4.0)]);
        let grant = ledger.allocate(&ranked(&[a, b]), 10.0);
        assert!(!grant.is_full());
        assert_eq!(grant.class, Some(b));
        assert!((grant.area - 4.0).abs() < 1e-12);
        assert!((grant.ration_fraction - 0.4).abs() < 1e-12);
        assert!(ledger.remaining(b).abs() < 1e-12);
        assert!((ledger.remaining(a) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn empty_ranked_classes_grant_nothing() {
        let a = class(1, 1);
        let b = class(2, 2);
        let mut ledger = make_ledger(&[(a, 2.0)]);
        let grant = ledger.allocate(&ranked(&[b]), 5.0);
        assert_eq!(grant.class, None);
        assert!(grant.area.abs() < f64::EPSILON);
        assert!(grant.ration_fraction.abs() < f64::EPSILON);
    }

    #[test]
    fn allocation_conserves_total_area() {
        let classes: Vec<HabitatClass> = (0..5).map(|i| class(i, i)).collect();
        let areas: Vec<(HabitatClass, f64)> =
            classes.iter().map(|&c| (c, 10.0)).collect();
        let mut ledger = make_ledger(&areas);
        let initial_total = ledger.initial_total();

        let prefs = ranked(&classes);
        let mut granted_total = 0.0;
        for request in [12.0, 7.0, 30.0, 9.0, 25.0, 40.0] {
            let grant = ledger.allocate(&prefs, request);
            assert!(grant.ration_fraction <= 1.0);
            granted_total += grant.area;
        }

        assert!(granted_total <= initial_total + 1e-9);
        assert!(ledger.remaining_total() >= -1e-9);
        assert!((granted_total + ledger.remaining_total() - initial_total).abs() < 1e-9);
    }

    #[test]
    fn reset_restores_initial_areas() {
        let a = class(3, 3);
        let mut ledger = make_ledger(&[(a, 8.0)]);
        let _ = ledger.allocate(&ranked(&[a]), 8.0);
        assert!(ledger.remaining(a).abs() < f64::EPSILON);
        assert!((ledger.used_fraction() - 1.0).abs() < 1e-12);

        ledger.reset();
        assert!((ledger.remaining(a) - 8.0).abs() < f64::EPSILON);
        assert!(ledger.used_fraction().abs() < f64::EPSILON);
    }

    #[test]
    fn zero_desired_area_is_trivially_full() {
        let a = class(1, 1);
        let mut ledger = make_ledger(&[(a, 2.0)]);
        let grant = ledger.allocate(&ranked(&[a]), 0.0);
        assert!(grant.is_full());
        assert!((ledger.remaining(a) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn preference_lookup_clamps_temperature_and_picks_nearest_length() {
        let c_hot = class(5, 5);
        let c_cold = class(6, 6);
        let mut by_temperature = BTreeMap::new();
        by_temperature.insert(
            1,
            vec![LengthEntry {
                fork_length_mm: 35.0,
                ranked: ranked(&[c_cold]),
            }],
        );
        by_temperature.insert(
            20,
            vec![
                LengthEntry {
                    fork_length_mm: 35.0,
                    ranked: ranked(&[c_hot]),
                },
                LengthEntry {
                    fork_length_mm: 600.0,
                    ranked: ranked(&[c_cold, c_hot]),
                },
            ],
        );
        let table = HabitatPreferenceTable::new(by_temperature);

        // Temperature above the tabulated range clamps to 20.
        let prefs = table.preferences(31.0, 40.0);
        assert_eq!(prefs.first().map(|r| r.class), Some(c_hot));

        // A long fish picks the 600 mm entry.
        let prefs = table.preferences(20.0, 450.0);
        assert_eq!(prefs.len(), 2);
        assert_eq!(prefs.first().map(|r| r.class), Some(c_cold));

        // Temperature below the range clamps to 1.
        let prefs = table.preferences(-4.0, 35.0);
        assert_eq!(prefs.first().map(|r| r.class), Some(c_cold));

        // An empty table yields no preferences.
        let empty = HabitatPreferenceTable::default();
        assert!(empty.preferences(10.0, 100.0).is_empty());
    }
}
