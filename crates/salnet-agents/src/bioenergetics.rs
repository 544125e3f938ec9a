//! Wisconsin-style bioenergetics for stream-dwelling rainbow trout and
//! steelhead.
//!
//! Daily growth is the energy balance between consumption and the costs
//! of respiration, egestion, excretion, and digestion, converted to grams
//! of fish through the predator energy density. Consumption scales
//! allometrically with mass and is throttled by the ration share `p`, the
//! realized fraction of maximum daily consumption.
//!
//! Temperatures are degrees C, masses grams, lengths mm. The respiration
//! temperature function is valid below [`RESPIRATION_TEMP_MAX`].

// ---------------------------------------------------------------------------
// Physiological constants
// ---------------------------------------------------------------------------

/// Intercept of maximum consumption, g prey per g fish per day at 1 g.
const CONSUMPTION_INTERCEPT: f64 = 0.628;

/// Mass exponent of maximum consumption.
const CONSUMPTION_MASS_EXPONENT: f64 = -0.3;

/// Intercept of standard respiration, g oxygen per g fish per day at 1 g.
const RESPIRATION_INTERCEPT: f64 = 0.013;

/// Mass exponent of standard respiration.
const RESPIRATION_MASS_EXPONENT: f64 = -0.217;

/// Activity multiplier applied to standard respiration.
const ACTIVITY_MULTIPLIER: f64 = 1.3;

/// Specific dynamic action, the fraction of assimilated energy spent on
/// digestion.
const SPECIFIC_DYNAMIC_ACTION: f64 = 0.172;

/// Energy density of oxygen, joules per gram.
const OXYGEN_ENERGY_DENSITY: f64 = 13_562.0;

/// Energy density of drift prey, joules per gram.
const PREY_ENERGY_DENSITY: f64 = 3_636.0;

/// Energy density of the fish itself, joules per gram.
const PREDATOR_ENERGY_DENSITY: f64 = 5_900.0;

/// Proportion of maximum consumption realized at the lower temperature
/// threshold.
const CONSUMPTION_K1: f64 = 0.2;

/// Proportion of maximum consumption realized at the upper temperature
/// threshold.
const CONSUMPTION_K4: f64 = 0.2;

/// Lower temperature threshold for consumption, degrees C.
const CONSUMPTION_TEMP_LOWER: f64 = 3.5;

/// Temperature of peak consumption, degrees C.
const CONSUMPTION_TEMP_OPTIMUM: f64 = 25.0;

/// Temperature at which the consumption decline begins, degrees C.
const CONSUMPTION_TEMP_DECLINE: f64 = 22.5;

/// Upper temperature threshold for consumption, degrees C.
const CONSUMPTION_TEMP_UPPER: f64 = 24.3;

/// Q10-like slope of the respiration temperature response.
const RESPIRATION_Q: f64 = 2.2;

/// Temperature at which respiration collapses, degrees C.
pub const RESPIRATION_TEMP_MAX: f64 = 26.0;

/// Temperature of peak respiration scope, degrees C.
const RESPIRATION_TEMP_OPTIMUM: f64 = 22.0;

/// Egestion intercept.
const EGESTION_INTERCEPT: f64 = 0.212;

/// Egestion temperature exponent.
const EGESTION_TEMP_EXPONENT: f64 = -0.222;

/// Egestion ration coefficient.
const EGESTION_RATION_COEF: f64 = 0.631;

/// Excretion intercept.
const EXCRETION_INTERCEPT: f64 = 0.031_4;

/// Excretion temperature exponent.
const EXCRETION_TEMP_EXPONENT: f64 = 0.58;

/// Excretion ration coefficient.
const EXCRETION_RATION_COEF: f64 = -0.299;

/// Slope of the log-log length-mass regression.
const LENGTH_MASS_LOG_SLOPE: f64 = 2.9;

/// Intercept of the log-log length-mass regression.
const LENGTH_MASS_LOG_INTERCEPT: f64 = -4.7;

// ---------------------------------------------------------------------------
// Temperature dependence
// ---------------------------------------------------------------------------

/// Temperature dependence of consumption: the product of a rising and a
/// falling logistic, near 1 between the optimum and decline temperatures
/// and pinched toward [`CONSUMPTION_K1`] and [`CONSUMPTION_K4`] at the
/// thresholds.
#[must_use]
pub fn consumption_temperature_factor(temperature_c: f64) -> f64 {
    let rising_rate = (1.0 / (CONSUMPTION_TEMP_OPTIMUM - CONSUMPTION_TEMP_LOWER))
        * (0.98 * (1.0 - CONSUMPTION_K1) / (0.02 * CONSUMPTION_K1)).ln();
    let falling_rate = (1.0 / (CONSUMPTION_TEMP_UPPER - CONSUMPTION_TEMP_DECLINE))
        * (0.98 * (1.0 - CONSUMPTION_K4) / (0.02 * CONSUMPTION_K4)).ln();

    let rising_exp = (rising_rate * (temperature_c - CONSUMPTION_TEMP_LOWER)).exp();
    let rising = CONSUMPTION_K1 * rising_exp / CONSUMPTION_K1.mul_add(rising_exp - 1.0, 1.0);

    let falling_exp = (falling_rate * (CONSUMPTION_TEMP_UPPER - temperature_c)).exp();
    let falling = CONSUMPTION_K4 * falling_exp / CONSUMPTION_K4.mul_add(falling_exp - 1.0, 1.0);

    rising * falling
}

/// Temperature dependence of respiration. Equals 1 at the respiration
/// optimum and falls to 0 at [`RESPIRATION_TEMP_MAX`].
#[must_use]
pub fn respiration_temperature_factor(temperature_c: f64) -> f64 {
    let span = RESPIRATION_TEMP_MAX - RESPIRATION_TEMP_OPTIMUM;
    let slope = RESPIRATION_Q.ln() * span;
    let shifted = RESPIRATION_Q.ln() * (span + 2.0);
    let exponent = (slope * slope) * (1.0 + (1.0 + 40.0 / shifted).sqrt()).powi(2) / 400.0;

    let scope = (RESPIRATION_TEMP_MAX - temperature_c) / span;
    scope.powf(exponent) * (exponent * (temperature_c - RESPIRATION_TEMP_OPTIMUM) / span).exp()
}

/// Temperature dependence of egestion. Held at 1 below 1 degree C, where
/// the power law would misbehave.
#[must_use]
pub fn egestion_temperature_factor(temperature_c: f64) -> f64 {
    if temperature_c > 1.0 {
        temperature_c.powf(EGESTION_TEMP_EXPONENT)
    } else {
        1.0
    }
}

/// Temperature dependence of excretion. Held at 1 below 1 degree C.
#[must_use]
pub fn excretion_temperature_factor(temperature_c: f64) -> f64 {
    if temperature_c > 1.0 {
        temperature_c.powf(EXCRETION_TEMP_EXPONENT)
    } else {
        1.0
    }
}

// ---------------------------------------------------------------------------
// Growth and consumption
// ---------------------------------------------------------------------------

/// Specific daily growth rate, grams of new tissue per gram of fish per
/// day, for a fish of the given mass feeding at ration share `p`.
///
/// Negative values are starvation: metabolic costs exceeding intake.
#[must_use]
pub fn daily_growth_fraction(temperature_c: f64, mass_g: f64, ration_share: f64) -> f64 {
    let consumption_energy = PREY_ENERGY_DENSITY
        * CONSUMPTION_INTERCEPT
        * mass_g.powf(CONSUMPTION_MASS_EXPONENT)
        * ration_share
        * consumption_temperature_factor(temperature_c);

    let egestion_share = EGESTION_INTERCEPT
        * egestion_temperature_factor(temperature_c)
        * (EGESTION_RATION_COEF * ration_share).exp();

    let excretion_share = EXCRETION_INTERCEPT
        * excretion_temperature_factor(temperature_c)
        * (EXCRETION_RATION_COEF * ration_share).exp();

    let after_egestion = 1.0 - egestion_share;
    let after_excretion = 1.0 - SPECIFIC_DYNAMIC_ACTION - excretion_share;

    let respiration_energy = RESPIRATION_INTERCEPT
        * ACTIVITY_MULTIPLIER
        * OXYGEN_ENERGY_DENSITY
        * mass_g.powf(RESPIRATION_MASS_EXPONENT)
        * respiration_temperature_factor(temperature_c);

    let retained_energy = consumption_energy * after_egestion * after_excretion;
    (retained_energy - respiration_energy) / PREDATOR_ENERGY_DENSITY
}

/// Grams of drift prey a fish of the given mass eats per day at ration
/// share `p`.
#[must_use]
pub fn daily_grams_consumed(temperature_c: f64, mass_g: f64, ration_share: f64) -> f64 {
    mass_g
        * CONSUMPTION_INTERCEPT
        * mass_g.powf(CONSUMPTION_MASS_EXPONENT)
        * ration_share
        * consumption_temperature_factor(temperature_c)
}

/// Territory area, square meters, that supplies a fish's daily
/// consumption given the reach's gross primary production (g per square
/// meter per day) and the drift conversion efficiency.
#[must_use]
pub fn preferred_territory_area(
    temperature_c: f64,
    mass_g: f64,
    ration_share: f64,
    gross_primary_production: f64,
    drift_conversion: f64,
) -> f64 {
    daily_grams_consumed(temperature_c, mass_g, ration_share)
        / (gross_primary_production * drift_conversion)
}

// ---------------------------------------------------------------------------
// Length-mass conversion
// ---------------------------------------------------------------------------

/// Mass in grams of a fish at the given fork length, from the log-log
/// regression.
#[must_use]
pub fn mass_at_length(fork_length_mm: f64) -> f64 {
    10.0_f64.powf(fork_length_mm.log10().mul_add(LENGTH_MASS_LOG_SLOPE, LENGTH_MASS_LOG_INTERCEPT))
}

/// Fork length in mm of a fish at the given mass, inverting
/// [`mass_at_length`].
#[must_use]
pub fn length_at_mass(mass_g: f64) -> f64 {
    10.0_f64.powf((mass_g.log10() - LENGTH_MASS_LOG_INTERCEPT) / LENGTH_MASS_LOG_SLOPE)
}
