//! Weekly movement: directional travel, random wandering, and route
//! following.
//!
//! The mover's reach membership is kept in sync with the network here;
//! every reach change appends a `ReachEntered` event to the fish's log.
//! Directional travel delegates the river walk to the network crate and
//! parks the fish when the walk reports a stop. Seeking modes plan a
//! route to the target reach on their first tick and then replay one
//! waypoint per week.

use rand::Rng;

use salnet_events::FishEvent;
use salnet_network::{FlowDirection, position_after_movement, route};
use salnet_types::{Activity, MovementMode, ReachId};

use crate::context::StepContext;
use crate::error::AgentError;
use crate::fish::Fish;

/// Apply one week of movement to a fish.
///
/// Random movement draws an up-or-downstream heading and keeps it: the
/// movement mode is permanently replaced by the drawn direction.
///
/// # Errors
///
/// Returns a network error when a reach lookup or route computation
/// fails.
pub fn move_fish<R: Rng>(
    fish: &mut Fish,
    ctx: &mut StepContext<'_, R>,
) -> Result<(), AgentError> {
    match fish.movement_mode {
        MovementMode::Stationary => Ok(()),
        MovementMode::Random => {
            let direction = if ctx.rng.random_bool(0.5) {
                MovementMode::Upstream
            } else {
                MovementMode::Downstream
            };
            fish.set_movement(direction, fish.movement_rate_km_per_week);
            travel(fish, ctx)
        }
        MovementMode::Upstream | MovementMode::Downstream => travel(fish, ctx),
        MovementMode::SeekingSpawningReach | MovementMode::SeekingHomeReach => {
            follow_route(fish, ctx)
        }
    }
}

/// Walk the river in the fish's current direction at its movement rate.
///
/// Only outmigrating smolts and kelts may pass the river mouth into the
/// migration corridor and the ocean; everyone else is stopped there.
fn travel<R: Rng>(fish: &mut Fish, ctx: &mut StepContext<'_, R>) -> Result<(), AgentError> {
    let direction = match fish.movement_mode {
        MovementMode::Upstream => FlowDirection::Upstream,
        _ => FlowDirection::Downstream,
    };
    let anadromy_allowed = matches!(
        fish.activity,
        Activity::SmoltOutmigration | Activity::KeltOutmigration
    );

    let outcome = position_after_movement(
        ctx.network,
        ctx.rng,
        fish.reach,
        direction,
        fish.position_within_reach,
        fish.movement_rate_km_per_week,
        anadromy_allowed,
    )?;

    if outcome.stopped {
        fish.set_movement(MovementMode::Stationary, 0.0);
    }
    relocate(fish, ctx, outcome.reach, outcome.position)
}

/// Advance along the planned route, computing it on the first tick.
///
/// The first tick applies waypoint zero, the departure point, so a
/// seeking fish spends its first week holding. Arrival at the last
/// waypoint parks the fish and discards the route.
fn follow_route<R: Rng>(fish: &mut Fish, ctx: &mut StepContext<'_, R>) -> Result<(), AgentError> {
    let destination = if fish.movement_mode == MovementMode::SeekingSpawningReach {
        fish.spawning_reach
    } else {
        fish.home_reach
    };

    if fish.current_route.is_none() {
        if fish.reach == destination {
            fish.set_movement(MovementMode::Stationary, 0.0);
            return Ok(());
        }
        let planned = route(
            ctx.network,
            ctx.rng,
            fish.reach,
            fish.position_within_reach,
            destination,
            fish.movement_rate_km_per_week,
        )?;
        fish.current_route = Some(planned);
        fish.route_cursor = 0;
    } else if let Some(planned) = fish.current_route.as_ref()
        && fish.route_cursor < planned.len().saturating_sub(1)
    {
        fish.route_cursor = fish.route_cursor.saturating_add(1);
    }

    let Some(planned) = fish.current_route.as_ref() else {
        return Ok(());
    };
    let Some(&(next_reach, next_position)) = planned.get(fish.route_cursor) else {
        return Ok(());
    };
    let arrived = fish.route_cursor >= planned.len().saturating_sub(1);

    relocate(fish, ctx, next_reach, next_position)?;
    if arrived {
        // Parking also discards the spent route.
        fish.set_movement(MovementMode::Stationary, 0.0);
    }
    Ok(())
}

/// Put the fish at a reach and position, updating reach membership and
/// logging the crossing when the reach changed.
fn relocate<R: Rng>(
    fish: &mut Fish,
    ctx: &mut StepContext<'_, R>,
    reach: ReachId,
    position: f64,
) -> Result<(), AgentError> {
    if reach != fish.reach {
        ctx.network.reach_mut(fish.reach)?.fish.remove(&fish.id);
        ctx.network.reach_mut(reach)?.fish.insert(fish.id);
        fish.events.append(ctx.week, FishEvent::ReachEntered { reach });
        fish.reach = reach;
    }
    fish.position_within_reach = position;
    Ok(())
}
