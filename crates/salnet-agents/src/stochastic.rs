//! Normally distributed draws used by growth, fecundity, and scour checks.
//!
//! A Box-Muller transform over the uniform source keeps the simulation's
//! randomness on a single [`rand::Rng`] stream, so a seeded run is fully
//! reproducible.

use rand::Rng;

/// Draw from the standard normal distribution, mean 0 and standard
/// deviation 1.
pub fn standard_normal(rng: &mut impl Rng) -> f64 {
    // The uniform draw lands in [0, 1); the floor keeps ln() finite.
    let u1 = rng.random::<f64>().max(f64::EPSILON);
    let u2 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (core::f64::consts::TAU * u2).cos()
}

/// Draw from a normal distribution with the given mean and standard
/// deviation.
pub fn normal(rng: &mut impl Rng, mean: f64, standard_deviation: f64) -> f64 {
    standard_normal(rng).mul_add(standard_deviation, mean)
}
