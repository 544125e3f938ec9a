//! Waypoint routing and within-week movement along the network.
//!
//! Positions are measured in km from a reach's downstream end: 0 is the
//! outlet, `length_km` is the inlet. Descending fish move toward 0 and
//! cross into the next reach at its inlet; ascending fish move toward
//! the inlet and cross into a tributary at its outlet.
//!
//! [`route`] plans a multi-week itinerary toward a known destination:
//! one waypoint per week of travel at the given rate, ending with a
//! uniformly random position inside the destination. Undirected weekly
//! moves use [`position_after_movement`], which walks reach by reach and
//! reports whether a barrier (river mouth, tributary tip, or the ocean
//! boundary) cut the move short.

use std::collections::BTreeMap;

use rand::Rng;
use salnet_types::ReachId;

use crate::error::NetworkError;
use crate::network::StreamNetwork;

/// Direction of flow-relative movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowDirection {
    /// Against the current, toward tributary tips.
    Upstream,
    /// With the current, toward the mouth and ocean.
    Downstream,
}

/// Where a weekly move ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementOutcome {
    /// Reach the mover occupies after the move.
    pub reach: ReachId,
    /// Position within that reach, km from the downstream end.
    pub position: f64,
    /// True when a network boundary cut the move short.
    pub stopped: bool,
}

/// Lazy walk from a reach to the ocean, yielding the starting reach
/// first.
#[derive(Debug, Clone)]
pub struct DownstreamPath<'a> {
    network: &'a StreamNetwork,
    next: Option<ReachId>,
}

impl Iterator for DownstreamPath<'_> {
    type Item = ReachId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.network.downstream_of(current);
        Some(current)
    }
}

/// Iterate from `origin` downstream to the ocean, inclusive of both.
#[must_use]
pub fn path_downstream_from(network: &StreamNetwork, origin: ReachId) -> DownstreamPath<'_> {
    DownstreamPath {
        network,
        next: Some(origin),
    }
}

/// Draw a uniformly random position within a reach, km from its
/// downstream end. Zero-length reaches place at 0.
///
/// # Errors
///
/// Returns [`NetworkError::UnknownReach`] for a bad identifier.
pub fn uniform_position_in(
    network: &StreamNetwork,
    rng: &mut impl Rng,
    reach_id: ReachId,
) -> Result<f64, NetworkError> {
    let length = network.reach(reach_id)?.length_km();
    if length > 0.0 {
        Ok(rng.random_range(0.0..length))
    } else {
        Ok(0.0)
    }
}

// ---------------------------------------------------------------------------
// Directed routes
// ---------------------------------------------------------------------------

/// Which way a spine reach is traversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leg {
    Down,
    Up,
}

/// Plan the weekly itinerary from `origin` to `destination`.
///
/// Waypoint `k` is the traveler's reach and position `k` weeks after
/// departure. Short reaches may be skipped within a week and long
/// reaches may take several weeks. The final waypoint always lies at a
/// uniformly random position inside the destination.
///
/// Routing to the current reach yields the single waypoint the traveler
/// already occupies. A rate that is zero, negative, or non-finite yields
/// a direct two-waypoint route.
///
/// # Errors
///
/// Returns [`NetworkError::UnknownReach`] for bad endpoints,
/// [`NetworkError::Topology`] when the endpoints share no downstream
/// path, and [`NetworkError::RouteEndpointMismatch`] when the planned
/// itinerary fails to start and end where asked.
pub fn route(
    network: &StreamNetwork,
    rng: &mut impl Rng,
    origin: ReachId,
    position_within_origin: f64,
    destination: ReachId,
    rate_km_per_week: f64,
) -> Result<Vec<(ReachId, f64)>, NetworkError> {
    network.reach(origin)?;
    network.reach(destination)?;

    if origin == destination {
        return Ok(vec![(origin, position_within_origin)]);
    }
    if !rate_km_per_week.is_finite() || rate_km_per_week <= 0.0 {
        let final_position = uniform_position_in(network, rng, destination)?;
        return Ok(vec![
            (origin, position_within_origin),
            (destination, final_position),
        ]);
    }

    let spine = route_spine(network, origin, destination)?;
    let waypoints = march(
        network,
        rng,
        &spine,
        position_within_origin,
        destination,
        rate_km_per_week,
    )?;

    match (waypoints.first().copied(), waypoints.last().copied()) {
        (Some((first, _)), Some((last, _))) if first == origin && last == destination => {
            Ok(waypoints)
        }
        (Some((first, _)), _) if first != origin => Err(NetworkError::RouteEndpointMismatch {
            expected: origin,
            found: first,
        }),
        (_, Some((last, _))) => Err(NetworkError::RouteEndpointMismatch {
            expected: destination,
            found: last,
        }),
        _ => Err(NetworkError::Topology {
            message: "route produced no waypoints".to_owned(),
        }),
    }
}

/// Reaches traversed from origin to destination with their travel
/// direction.
///
/// A route that descends one branch and ascends another turns at the
/// junction node, so the shared reach below the junction is never
/// entered.
fn route_spine(
    network: &StreamNetwork,
    origin: ReachId,
    destination: ReachId,
) -> Result<Vec<(ReachId, Leg)>, NetworkError> {
    let descent_from_origin: Vec<ReachId> = path_downstream_from(network, origin).collect();
    if let Some(index) = descent_from_origin.iter().position(|&r| r == destination) {
        return Ok(descent_from_origin
            .iter()
            .take(index.saturating_add(1))
            .map(|&r| (r, Leg::Down))
            .collect());
    }

    let descent_from_destination: Vec<ReachId> =
        path_downstream_from(network, destination).collect();
    if let Some(index) = descent_from_destination.iter().position(|&r| r == origin) {
        return Ok(descent_from_destination
            .iter()
            .take(index.saturating_add(1))
            .rev()
            .map(|&r| (r, Leg::Up))
            .collect());
    }

    let on_destination_path: BTreeMap<ReachId, usize> = descent_from_destination
        .iter()
        .enumerate()
        .map(|(index, &reach)| (reach, index))
        .collect();
    let confluence = descent_from_origin
        .iter()
        .enumerate()
        .find_map(|(origin_index, reach)| {
            on_destination_path
                .get(reach)
                .map(|&destination_index| (origin_index, destination_index))
        });
    let Some((origin_index, destination_index)) = confluence else {
        return Err(NetworkError::Topology {
            message: "origin and destination share no downstream reach".to_owned(),
        });
    };

    let mut spine: Vec<(ReachId, Leg)> = descent_from_origin
        .iter()
        .take(origin_index)
        .map(|&r| (r, Leg::Down))
        .collect();
    spine.extend(
        descent_from_destination
            .iter()
            .take(destination_index)
            .rev()
            .map(|&r| (r, Leg::Up)),
    );
    Ok(spine)
}

/// Discretize travel along a spine into one waypoint per week.
fn march(
    network: &StreamNetwork,
    rng: &mut impl Rng,
    spine: &[(ReachId, Leg)],
    position_within_origin: f64,
    destination: ReachId,
    rate_km_per_week: f64,
) -> Result<Vec<(ReachId, f64)>, NetworkError> {
    let mut waypoints: Vec<(ReachId, f64)> = Vec::new();
    let mut index = 0_usize;
    let mut position = position_within_origin;
    'march: loop {
        let Some(&(reach_id, _)) = spine.get(index) else {
            break 'march;
        };
        waypoints.push((reach_id, position));
        let mut remaining = rate_km_per_week;
        loop {
            let Some(&(current_id, current_leg)) = spine.get(index) else {
                break 'march;
            };
            let length = network.reach(current_id)?.length_km();
            let available = match current_leg {
                Leg::Down => position,
                Leg::Up => length - position,
            };
            if remaining <= available {
                position = match current_leg {
                    Leg::Down => position - remaining,
                    Leg::Up => position + remaining,
                };
                break;
            }
            remaining -= available;
            index = index.saturating_add(1);
            match spine.get(index) {
                Some(&(next_id, next_leg)) => {
                    position = match next_leg {
                        Leg::Down => network.reach(next_id)?.length_km(),
                        Leg::Up => 0.0,
                    };
                }
                None => {
                    let final_position = uniform_position_in(network, rng, destination)?;
                    waypoints.push((destination, final_position));
                    break 'march;
                }
            }
        }
    }
    Ok(waypoints)
}

// ---------------------------------------------------------------------------
// Undirected weekly movement
// ---------------------------------------------------------------------------

/// Move one week's distance up or down the network from a starting
/// position.
///
/// Downstream movement stops, clamped to the reach outlet, when the
/// mover would leave the network: at the ocean for anadromous movers,
/// and at the river mouth otherwise. Upstream movement picks a random
/// tributary at each junction and stops, clamped to the reach inlet, at
/// tributary tips. A rate that is zero, negative, or non-finite leaves
/// the mover in place.
///
/// # Errors
///
/// Returns [`NetworkError::UnknownReach`] when the walk reaches an
/// identifier outside the arena.
pub fn position_after_movement(
    network: &StreamNetwork,
    rng: &mut impl Rng,
    origin: ReachId,
    direction: FlowDirection,
    position_within_origin: f64,
    rate_km_per_week: f64,
    anadromy_allowed: bool,
) -> Result<MovementOutcome, NetworkError> {
    if !rate_km_per_week.is_finite() || rate_km_per_week <= 0.0 {
        return Ok(MovementOutcome {
            reach: origin,
            position: position_within_origin,
            stopped: false,
        });
    }

    let mut current = origin;
    let mut position = position_within_origin;
    match direction {
        FlowDirection::Downstream => {
            position -= rate_km_per_week;
            while position < 0.0 {
                let blocked = match network.downstream_of(current) {
                    None => true,
                    Some(next) => {
                        let next_reach = network.reach(next)?;
                        (network.reach(current)?.is_ocean && anadromy_allowed)
                            || (!anadromy_allowed
                                && (next_reach.is_migration || next_reach.is_ocean))
                    }
                };
                if blocked {
                    return Ok(MovementOutcome {
                        reach: current,
                        position: 0.0,
                        stopped: true,
                    });
                }
                if let Some(next) = network.downstream_of(current) {
                    current = next;
                    position += network.reach(current)?.length_km();
                }
            }
        }
        FlowDirection::Upstream => {
            position += rate_km_per_week;
            loop {
                let length = network.reach(current)?.length_km();
                if position <= length {
                    break;
                }
                let tributaries = network.upstream_of(current);
                if tributaries.is_empty() {
                    return Ok(MovementOutcome {
                        reach: current,
                        position: length,
                        stopped: true,
                    });
                }
                let choice = rng.random_range(0..tributaries.len());
                let Some(&next) = tributaries.get(choice) else {
                    return Err(NetworkError::UnknownReach(current));
                };
                position -= length;
                current = next;
            }
        }
    }

    Ok(MovementOutcome {
        reach: current,
        position,
        stopped: false,
    })
}
