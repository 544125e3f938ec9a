//! Weekly growth.
//!
//! Freshwater fish stake a drift-feeding territory against the reach
//! habitat ledger and grow by the bioenergetics model at whatever ration
//! the ledger left them. Ocean fish follow a fitted length-at-age curve
//! with no habitat interaction.

use rand::Rng;

use salnet_types::{Activity, DeathCause};

use crate::bioenergetics;
use crate::context::StepContext;
use crate::error::AgentError;
use crate::fish::Fish;

// ----- Ocean growth curve -----

/// Weekly fork length increment at one week of ocean age, mm.
const OCEAN_GROWTH_COEF: f64 = 20.337;
/// Exponent on ocean age in weeks. Marine growth decelerates with age.
const OCEAN_GROWTH_EXPONENT: f64 = -0.476;

/// Grows the fish for one week, branching on whether its current reach
/// is the ocean.
///
/// # Errors
///
/// Returns [`AgentError::Network`] when the fish's reach identifier is
/// stale or the reach lacks temperature data.
pub fn grow<R: Rng>(fish: &mut Fish, ctx: &mut StepContext<'_, R>) -> Result<(), AgentError> {
    if ctx.network.reach(fish.reach)?.is_ocean {
        grow_at_sea(fish);
        Ok(())
    } else {
        grow_in_freshwater(fish, ctx)
    }
}

/// Marine growth: fork length follows the age curve and mass tracks the
/// length-mass relation. Ocean age is floored at one week so the curve
/// stays finite on an arrival tick.
fn grow_at_sea(fish: &mut Fish) {
    let weeks_at_sea = f64::from(fish.ocean_age_weeks.max(1));
    fish.fork_length_mm = OCEAN_GROWTH_COEF.mul_add(
        weeks_at_sea.powf(OCEAN_GROWTH_EXPONENT),
        fish.fork_length_mm,
    );
    fish.mass_g = bioenergetics::mass_at_length(fish.fork_length_mm);
    fish.lifetime_maximum_mass_g = fish.mass_g;
}

/// Freshwater growth through the habitat ledger.
///
/// The fish requests enough territory to supply a full ration at the
/// reach's current food production. The secured share of that request
/// becomes `last_ration_fraction`, which the behavior rules read as the
/// scarcity signal. Displaced fish grow at the flat displaced ration
/// regardless of what the ledger granted.
fn grow_in_freshwater<R: Rng>(
    fish: &mut Fish,
    ctx: &mut StepContext<'_, R>,
) -> Result<(), AgentError> {
    let temperature = ctx.network.temperature_at_week(fish.reach, ctx.week)?;
    let production = ctx.network.reach(fish.reach)?.gpp_at_week(ctx.week)?;

    let desired_area = bioenergetics::preferred_territory_area(
        temperature,
        fish.mass_g,
        1.0,
        production,
        ctx.habitat.drift_conversion,
    );
    let table = ctx.preferences;
    let ranked = table.preferences(temperature, fish.fork_length_mm);
    let fraction = match ctx.network.reach_mut(fish.reach)?.habitat.as_mut() {
        Some(ledger) => ledger.allocate(ranked, desired_area).ration_fraction,
        None => 1.0,
    };
    fish.last_ration_fraction = fraction;

    let settings = ctx.settings_for(fish.life_history);
    let ration_share = if fish.activity == Activity::CompetitiveDispersal {
        settings.displaced_ration_factor * fish.base_ration_share
    } else {
        fish.base_ration_share * fraction.max(ctx.habitat.minimum_ration_fraction)
    };

    let daily_growth = bioenergetics::daily_growth_fraction(temperature, fish.mass_g, ration_share);
    let days = i32::try_from(ctx.days_per_week).unwrap_or(i32::MAX);
    fish.mass_g *= (1.0 + daily_growth).powi(days);

    if fish.mass_g > fish.lifetime_maximum_mass_g {
        fish.lifetime_maximum_mass_g = fish.mass_g;
        fish.fork_length_mm = bioenergetics::length_at_mass(fish.mass_g);
    }
    if fish.mass_g < settings.starvation_mass_fraction * fish.lifetime_maximum_mass_g {
        fish.die(ctx.week, DeathCause::Starvation);
    }
    Ok(())
}
