//! Simulation binary for salnet.
//!
//! Builds the demo basin, seeds a starting population, and runs the
//! weekly loop to the configured horizon or extinction.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `salnet-config.yaml`
//! 3. Create the simulation clock
//! 4. Build the demo stream network and preference table
//! 5. Assemble the model and seed the starting population
//! 6. Run the simulation loop
//! 7. Log the result

use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use salnet_core::{
    ConfigError, NoOpCallback, SimulationClock, SimulationConfig, SimulationModel,
    log_simulation_end, run_simulation,
};
use salnet_network::{create_demo_network, synthetic_preference_table};

/// Application entry point.
///
/// # Errors
///
/// Returns an error when configuration, network construction, seeding,
/// or the simulation loop fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("salnet-run starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        seed = config.run.seed,
        weeks_to_run = config.run.weeks_to_run,
        initial_population = config.run.initial_population,
        weeks_per_year = config.time.weeks_per_year,
        "Configuration loaded"
    );

    // 3. Create the simulation clock.
    let clock = SimulationClock::new(config.time)?;
    info!("Simulation clock initialized");

    // 4. Build the demo stream network and preference table.
    let (network, reach_ids) = create_demo_network(&config.network, config.time.weeks_per_year)?;
    info!(
        reach_count = network.reach_count(),
        mouth = %reach_ids.lower_mainstem,
        "Demo network created"
    );
    let preferences = synthetic_preference_table();

    // 5. Assemble the model and seed the starting population.
    let mut model = SimulationModel::new(network, preferences, clock);
    let mut rng = StdRng::seed_from_u64(config.run.seed);
    model.seed_initial_population(config.run.initial_population, &config.spawning, &mut rng)?;
    info!(fish = model.live_fish_count(), "Starting population seeded");

    // 6. Run the simulation.
    let mut callback = NoOpCallback;
    let result = run_simulation(&mut model, &config, &mut rng, &mut callback)?;

    // 7. Log results.
    log_simulation_end(&result);
    info!(
        end_reason = ?result.end_reason,
        total_weeks = result.total_weeks,
        "salnet-run shutdown complete"
    );

    Ok(())
}

/// Load the simulation configuration from `salnet-config.yaml`.
///
/// Looks for the config file relative to the current working directory
/// and falls back to defaults when it is absent.
fn load_config() -> Result<SimulationConfig, ConfigError> {
    let config_path = Path::new("salnet-config.yaml");
    if config_path.exists() {
        SimulationConfig::from_file(config_path)
    } else {
        info!("Config file not found, using defaults");
        Ok(SimulationConfig::default())
    }
}
