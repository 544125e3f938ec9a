//! Stream network graph: reaches as nodes, flow as directed edges.
//!
//! The [`StreamNetwork`] is the spatial backbone of the simulation. It
//! owns every [`Reach`] in a dense arena indexed by [`ReachId`], wires
//! the flow topology from node attributes, and appends the two synthetic
//! terminal reaches (migration corridor and ocean) below the river
//! mouth.
//!
//! Topology invariants enforced at build time:
//!
//! - every reach except the mouth has exactly one downstream reach
//! - exactly one reach has none (the mouth)
//! - following downstream links never revisits a reach
//!
//! Weekly bookkeeping happens in [`StreamNetwork::step`]: the caller
//! supplies a [`NetworkCensus`] of live counts and dead identifiers, and
//! the network appends history records, drops dead members, and resets
//! every habitat ledger for the coming week.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use salnet_types::{FishId, LifeHistory, ReachId, ReddId};
use serde::{Deserialize, Serialize};

use crate::config::NetworkSettings;
use crate::error::NetworkError;
use crate::habitat::HabitatLedger;
use crate::reach::{Reach, ReachAttributes, ReachRecord};

/// External identifier of the synthetic migration-corridor reach.
pub const MIGRATION_SOURCE_ID: i64 = -2;

/// External identifier of the synthetic ocean reach.
pub const OCEAN_SOURCE_ID: i64 = -1;

// ---------------------------------------------------------------------------
// Census input
// ---------------------------------------------------------------------------

/// Live counts for one reach, split by life history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReachCensus {
    /// Live anadromous fish in the reach.
    pub anadromous_fish: u32,
    /// Live resident fish in the reach.
    pub resident_fish: u32,
    /// Live redds with an anadromous mother.
    pub anadromous_redds: u32,
    /// Live redds with a resident mother.
    pub resident_redds: u32,
}

/// Per-week census the scheduler hands to [`StreamNetwork::step`].
///
/// Built by the model, which knows each fish's life history; the network
/// itself only tracks identifiers.
#[derive(Debug, Clone, Default)]
pub struct NetworkCensus {
    /// One entry per reach, indexed like the network's arena.
    pub per_reach: Vec<ReachCensus>,
    /// Fish that died this week and must leave reach membership.
    pub dead_fish: BTreeSet<FishId>,
    /// Redds that finished this week and must leave reach membership.
    pub dead_redds: BTreeSet<ReddId>,
}

impl NetworkCensus {
    /// Create an empty census sized for a network.
    #[must_use]
    pub fn new(reach_count: usize) -> Self {
        Self {
            per_reach: vec![ReachCensus::default(); reach_count],
            dead_fish: BTreeSet::new(),
            dead_redds: BTreeSet::new(),
        }
    }

    /// Count one live fish in its reach.
    pub fn record_fish(&mut self, reach: ReachId, life_history: LifeHistory) {
        if let Some(entry) = self.per_reach.get_mut(reach.raw()) {
            match life_history {
                LifeHistory::Anadromous => {
                    entry.anadromous_fish = entry.anadromous_fish.saturating_add(1);
                }
                LifeHistory::Resident => {
                    entry.resident_fish = entry.resident_fish.saturating_add(1);
                }
            }
        }
    }

    /// Count one live redd in its reach, keyed by the mother's life
    /// history.
    pub fn record_redd(&mut self, reach: ReachId, mother_life_history: LifeHistory) {
        if let Some(entry) = self.per_reach.get_mut(reach.raw()) {
            match mother_life_history {
                LifeHistory::Anadromous => {
                    entry.anadromous_redds = entry.anadromous_redds.saturating_add(1);
                }
                LifeHistory::Resident => {
                    entry.resident_redds = entry.resident_redds.saturating_add(1);
                }
            }
        }
    }
}

/// Network-wide population snapshot for one completed week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRecord {
    /// Simulation week the record describes.
    pub week: u64,
    /// Live anadromous fish across the whole network.
    pub anadromous_fish: u32,
    /// Live resident fish across the whole network.
    pub resident_fish: u32,
    /// Live redds with anadromous mothers.
    pub anadromous_redds: u32,
    /// Live redds with resident mothers.
    pub resident_redds: u32,
}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

/// The river network holding every reach and the flow topology.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamNetwork {
    reaches: Vec<Reach>,
    downstream: Vec<Option<ReachId>>,
    upstream: Vec<Vec<ReachId>>,
    mouth: ReachId,
    migration: ReachId,
    ocean: ReachId,
    real_reaches: Vec<ReachId>,
    steelhead_reaches: Vec<ReachId>,
    history: Vec<NetworkRecord>,
}

impl StreamNetwork {
    /// Build a network from reach attribute rows.
    ///
    /// Reaches are wired by matching each reach's `to_node` against the
    /// `from_node` of every other reach. The single reach with no
    /// downstream match becomes the river mouth, and the synthetic
    /// migration and ocean reaches are appended below it using lengths
    /// from `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::Topology`] for an empty row set, duplicate
    /// source identifiers, a reach with more than one downstream match,
    /// zero or multiple mouths, or a downstream cycle, and
    /// [`NetworkError::EmptyTemperatureSeries`] when a row has no
    /// temperature data.
    #[allow(clippy::too_many_lines)]
    pub fn from_attributes(
        rows: Vec<ReachAttributes>,
        settings: &NetworkSettings,
    ) -> Result<Self, NetworkError> {
        if rows.is_empty() {
            return Err(NetworkError::Topology {
                message: "network has no reaches".to_owned(),
            });
        }

        let mut seen_source_ids = BTreeSet::new();
        for (index, row) in rows.iter().enumerate() {
            if !seen_source_ids.insert(row.source_id) {
                return Err(NetworkError::Topology {
                    message: format!("duplicate source id {}", row.source_id),
                });
            }
            if row.temperatures.is_empty() {
                return Err(NetworkError::EmptyTemperatureSeries {
                    reach: ReachId::from_raw(index),
                });
            }
        }

        // Index rows by the node they start from, then wire each reach to
        // the unique reach beginning at its end node.
        let mut by_from_node: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (index, row) in rows.iter().enumerate() {
            by_from_node.entry(row.from_node).or_default().push(index);
        }

        let mut downstream: Vec<Option<ReachId>> = Vec::with_capacity(rows.len());
        let mut mouths: Vec<usize> = Vec::new();
        for (index, row) in rows.iter().enumerate() {
            let candidates: Vec<usize> = by_from_node
                .get(&row.to_node)
                .map(Vec::as_slice)
                .unwrap_or_default()
                .iter()
                .copied()
                .filter(|&candidate| candidate != index)
                .collect();
            match candidates.as_slice() {
                [] => {
                    mouths.push(index);
                    downstream.push(None);
                }
                [single] => downstream.push(Some(ReachId::from_raw(*single))),
                _ => {
                    return Err(NetworkError::Topology {
                        message: format!(
                            "reach {} has {} downstream candidates",
                            row.source_id,
                            candidates.len()
                        ),
                    });
                }
            }
        }

        let mouth_index = match mouths.as_slice() {
            [single] => *single,
            [] => {
                return Err(NetworkError::Topology {
                    message: "no mouth: every reach has a downstream reach".to_owned(),
                });
            }
            _ => {
                return Err(NetworkError::Topology {
                    message: format!("{} reaches have no downstream reach", mouths.len()),
                });
            }
        };

        // Walking downstream from any reach must hit the mouth within
        // one visit per reach, otherwise the links loop.
        for start in 0..rows.len() {
            let mut cursor = Some(ReachId::from_raw(start));
            let mut steps = 0_usize;
            while let Some(current) = cursor {
                if steps > rows.len() {
                    return Err(NetworkError::Topology {
                        message: "downstream links form a cycle".to_owned(),
                    });
                }
                steps = steps.saturating_add(1);
                cursor = downstream.get(current.raw()).copied().flatten();
            }
        }

        let mouth_attributes = rows
            .get(mouth_index)
            .cloned()
            .ok_or(NetworkError::UnknownReach(ReachId::from_raw(mouth_index)))?;

        let mut reaches: Vec<Reach> = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| Reach::new(ReachId::from_raw(index), row))
            .collect();

        let mouth = ReachId::from_raw(mouth_index);
        let migration = ReachId::from_raw(reaches.len());
        let ocean = ReachId::from_raw(reaches.len().saturating_add(1));

        let mut migration_reach = Reach::new(
            migration,
            terminal_attributes(
                &mouth_attributes,
                MIGRATION_SOURCE_ID,
                settings.network_to_ocean_distance_km,
            ),
        );
        migration_reach.is_migration = true;
        reaches.push(migration_reach);

        let mut ocean_reach = Reach::new(
            ocean,
            terminal_attributes(
                &mouth_attributes,
                OCEAN_SOURCE_ID,
                settings.ocean_reach_length_km,
            ),
        );
        ocean_reach.is_ocean = true;
        reaches.push(ocean_reach);

        downstream.push(Some(ocean));
        downstream.push(None);
        if let Some(slot) = downstream.get_mut(mouth.raw()) {
            *slot = Some(migration);
        }

        let mut upstream: Vec<Vec<ReachId>> = vec![Vec::new(); reaches.len()];
        for (index, target) in downstream.iter().enumerate() {
            if let Some(target) = target
                && let Some(list) = upstream.get_mut(target.raw())
            {
                list.push(ReachId::from_raw(index));
            }
        }

        let real_reaches: Vec<ReachId> = reaches
            .iter()
            .filter(|reach| !reach.is_terminal())
            .map(|reach| reach.id)
            .collect();
        let steelhead_reaches: Vec<ReachId> = reaches
            .iter()
            .filter(|reach| !reach.is_terminal() && reach.attributes.is_within_steelhead_extent)
            .map(|reach| reach.id)
            .collect();

        tracing::debug!(
            reaches = reaches.len(),
            mouth = %mouth,
            "stream network wired"
        );
        Ok(Self {
            reaches,
            downstream,
            upstream,
            mouth,
            migration,
            ocean,
            real_reaches,
            steelhead_reaches,
            history: Vec::new(),
        })
    }

    // -------------------------------------------------------------------
    // Reach access
    // -------------------------------------------------------------------

    /// Look up a reach.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::UnknownReach`] for an identifier outside
    /// the arena.
    pub fn reach(&self, id: ReachId) -> Result<&Reach, NetworkError> {
        self.reaches.get(id.raw()).ok_or(NetworkError::UnknownReach(id))
    }

    /// Look up a reach mutably.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::UnknownReach`] for an identifier outside
    /// the arena.
    pub fn reach_mut(&mut self, id: ReachId) -> Result<&mut Reach, NetworkError> {
        self.reaches
            .get_mut(id.raw())
            .ok_or(NetworkError::UnknownReach(id))
    }

    /// Look up a reach by its external source identifier.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::UnknownSourceId`] when no reach carries it.
    pub fn reach_with_source_id(&self, source_id: i64) -> Result<&Reach, NetworkError> {
        self.reaches
            .iter()
            .find(|reach| reach.attributes.source_id == source_id)
            .ok_or(NetworkError::UnknownSourceId(source_id))
    }

    /// Total number of reaches including the two synthetic terminals.
    #[must_use]
    pub fn reach_count(&self) -> usize {
        self.reaches.len()
    }

    /// Iterate over all reaches in arena order.
    pub fn reaches(&self) -> impl Iterator<Item = &Reach> {
        self.reaches.iter()
    }

    /// The most downstream real reach.
    #[must_use]
    pub const fn mouth(&self) -> ReachId {
        self.mouth
    }

    /// The synthetic migration corridor below the mouth.
    #[must_use]
    pub const fn migration(&self) -> ReachId {
        self.migration
    }

    /// The synthetic ocean reach below the migration corridor.
    #[must_use]
    pub const fn ocean(&self) -> ReachId {
        self.ocean
    }

    /// The reach one step downstream, if any.
    #[must_use]
    pub fn downstream_of(&self, id: ReachId) -> Option<ReachId> {
        self.downstream.get(id.raw()).copied().flatten()
    }

    /// The reaches joining from upstream, in arena order.
    #[must_use]
    pub fn upstream_of(&self, id: ReachId) -> &[ReachId] {
        self.upstream.get(id.raw()).map_or(&[], Vec::as_slice)
    }

    /// Identifiers of all real (non-terminal) reaches.
    #[must_use]
    pub fn real_reaches(&self) -> &[ReachId] {
        &self.real_reaches
    }

    /// Draw a uniformly random real reach, optionally restricted to the
    /// anadromous extent.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::EmptySamplePool`] when the pool is empty.
    pub fn random_reach(
        &self,
        rng: &mut impl Rng,
        require_steelhead_extent: bool,
    ) -> Result<ReachId, NetworkError> {
        let pool = if require_steelhead_extent {
            &self.steelhead_reaches
        } else {
            &self.real_reaches
        };
        if pool.is_empty() {
            return Err(NetworkError::EmptySamplePool);
        }
        let index = rng.random_range(0..pool.len());
        pool.get(index).copied().ok_or(NetworkError::EmptySamplePool)
    }

    /// Water temperature of a reach for a simulation week, degrees C.
    ///
    /// Terminal reaches carry no series of their own; queries against
    /// them answer with the river mouth's temperature.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::UnknownReach`] for a bad identifier and
    /// [`NetworkError::EmptyTemperatureSeries`] when the resolved reach
    /// has no temperature data.
    pub fn temperature_at_week(&self, id: ReachId, week: u64) -> Result<f64, NetworkError> {
        let reach = self.reach(id)?;
        if reach.is_terminal() {
            return self.reach(self.mouth)?.temperature_at_week(week);
        }
        reach.temperature_at_week(week)
    }

    // -------------------------------------------------------------------
    // Weekly bookkeeping
    // -------------------------------------------------------------------

    /// Close out one simulation week.
    ///
    /// Appends the network-wide record, then per reach: appends the weekly
    /// history record from the census, drops dead fish and redds from
    /// membership, and resets the habitat ledger. The used fraction is
    /// captured before the reset.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::CensusSizeMismatch`] when the census does
    /// not cover every reach.
    pub fn step(&mut self, week: u64, census: &NetworkCensus) -> Result<(), NetworkError> {
        if census.per_reach.len() != self.reaches.len() {
            return Err(NetworkError::CensusSizeMismatch {
                given: census.per_reach.len(),
                expected: self.reaches.len(),
            });
        }

        let mut totals = NetworkRecord {
            week,
            anadromous_fish: 0,
            resident_fish: 0,
            anadromous_redds: 0,
            resident_redds: 0,
        };
        for entry in &census.per_reach {
            totals.anadromous_fish = totals.anadromous_fish.saturating_add(entry.anadromous_fish);
            totals.resident_fish = totals.resident_fish.saturating_add(entry.resident_fish);
            totals.anadromous_redds = totals.anadromous_redds.saturating_add(entry.anadromous_redds);
            totals.resident_redds = totals.resident_redds.saturating_add(entry.resident_redds);
        }
        self.history.push(totals);

        for (reach, entry) in self.reaches.iter_mut().zip(census.per_reach.iter()) {
            reach.fish.retain(|fish| !census.dead_fish.contains(fish));
            reach.redds.retain(|redd| !census.dead_redds.contains(redd));
            let habitat_used_fraction = reach
                .habitat
                .as_ref()
                .map_or(0.0, HabitatLedger::used_fraction);
            reach.push_record(ReachRecord {
                week,
                anadromous: entry.anadromous_fish,
                resident: entry.resident_fish,
                n_redds: entry.anadromous_redds.saturating_add(entry.resident_redds),
                habitat_used_fraction,
            });
            if let Some(ledger) = reach.habitat.as_mut() {
                ledger.reset();
            }
        }
        Ok(())
    }

    /// Completed network-wide records, oldest first.
    #[must_use]
    pub fn history(&self) -> &[NetworkRecord] {
        &self.history
    }

    /// The network-wide record for one week, if that week has completed.
    #[must_use]
    pub fn record_for_week(&self, week: u64) -> Option<&NetworkRecord> {
        self.history.iter().find(|record| record.week == week)
    }

    // -------------------------------------------------------------------
    // Statistics
    // -------------------------------------------------------------------

    /// Retrieve a named statistic for one reach.
    ///
    /// Static attributes (`length`, `area`, `capacity_redds`, `gradient`,
    /// `conductivity`, `strahler_order`, `spring95`, `bank_full_width`,
    /// `area_solar`) answer with or without a timestep. History values
    /// (`anadromous`, `resident`, `n_redds`, `habitat_used_fraction`) and
    /// derived values (`temperature`, `population`,
    /// `proportion_capacity_redds`) need one.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::StatisticNeedsTimestep`] when a history
    /// value is requested without a timestep,
    /// [`NetworkError::NoHistoryForWeek`] when the week has not completed,
    /// and [`NetworkError::UnknownStatistic`] for an unrecognized name.
    pub fn reach_statistic(
        &self,
        id: ReachId,
        name: &str,
        timestep: Option<u64>,
    ) -> Result<f64, NetworkError> {
        let reach = self.reach(id)?;
        match name {
            "length" => return Ok(reach.length_km()),
            "area" => return Ok(reach.wetted_area_m2()),
            "capacity_redds" => return Ok(reach.capacity_redds()),
            "gradient" => return Ok(reach.attributes.gradient),
            "conductivity" => return Ok(reach.attributes.conductivity),
            "strahler_order" => return Ok(f64::from(reach.attributes.strahler_order)),
            "spring95" => return Ok(reach.attributes.spring95),
            "bank_full_width" => return Ok(reach.attributes.bank_full_width_m),
            "area_solar" => return Ok(reach.attributes.area_solar),
            _ => {}
        }

        let Some(week) = timestep else {
            return Err(NetworkError::StatisticNeedsTimestep {
                name: name.to_owned(),
            });
        };
        if name == "temperature" {
            return self.temperature_at_week(id, week);
        }

        let record = reach
            .record_for_week(week)
            .ok_or(NetworkError::NoHistoryForWeek { week })?;
        match name {
            "anadromous" => Ok(f64::from(record.anadromous)),
            "resident" => Ok(f64::from(record.resident)),
            "n_redds" => Ok(f64::from(record.n_redds)),
            "habitat_used_fraction" => Ok(record.habitat_used_fraction),
            "population" => Ok(f64::from(record.population())),
            "proportion_capacity_redds" => {
                let capacity = reach.capacity_redds();
                if capacity > 0.0 {
                    Ok(f64::from(record.n_redds) / capacity)
                } else {
                    Ok(0.0)
                }
            }
            _ => Err(NetworkError::UnknownStatistic {
                name: name.to_owned(),
            }),
        }
    }
}

fn terminal_attributes(mouth: &ReachAttributes, source_id: i64, length_km: f64) -> ReachAttributes {
    ReachAttributes {
        source_id,
        from_node: 0,
        to_node: 0,
        length_km,
        redd_density_per_m2: 0.0,
        is_within_steelhead_extent: false,
        temperatures: Vec::new(),
        ..mouth.clone()
    }
}
