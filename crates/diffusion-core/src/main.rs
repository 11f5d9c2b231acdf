//! Opinion Diffusion Simulation
//!
//! Builds a directed Erdos-Renyi network of agents, seeds a handful of them,
//! and runs the configured number of update steps, exporting per-step state
//! to the step log.

use clap::Parser;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::process;

use diffusion_core::{config::DEFAULT_CONFIG_PATH, setup, Config};
use diffusion_log::StepLogger;

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "diffusion_sim")]
#[command(about = "An opinion diffusion network simulator")]
struct Args {
    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Tuning file path
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Override the number of steps to simulate
    #[arg(long)]
    steps: Option<u64>,

    /// Override the number of agents
    #[arg(long)]
    agents: Option<usize>,

    /// Override the edge probability
    #[arg(long)]
    edge_probability: Option<f64>,

    /// Override the step log path
    #[arg(long)]
    step_log: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(Args::parse()) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut config = if Path::new(&args.config).exists() {
        Config::load(&args.config)?
    } else {
        Config::default()
    };
    if let Some(steps) = args.steps {
        config.simulation.steps = steps;
    }
    if let Some(agents) = args.agents {
        config.network.agents = agents;
    }
    if let Some(p) = args.edge_probability {
        config.network.edge_probability = p;
    }
    if let Some(path) = args.step_log {
        config.output.step_log = path;
    }
    config.validate()?;

    println!("Opinion Diffusion Simulator");
    println!("===========================");
    println!("Seed: {}", args.seed);
    println!("Agents: {}", config.network.agents);
    println!("Edge probability: {}", config.network.edge_probability);
    println!("Steps: {}", config.simulation.steps);
    println!(
        "Update: {} / {}",
        config.simulation.update_type, config.simulation.algorithm
    );
    println!();

    if let Some(parent) = Path::new(&config.output.step_log).parent() {
        fs::create_dir_all(parent)?;
    }

    let mut rng = SmallRng::seed_from_u64(args.seed);

    println!("Creating network...");
    let mut network = setup::build_network(&config, &mut rng)?;
    println!(
        "  Created {} agents, {} edges",
        network.agent_count(),
        network.edge_count()
    );

    if let Some(dot_path) = &config.output.dot_file {
        if let Err(e) = network.write_dot(dot_path) {
            eprintln!("Warning: Could not write topology export: {}", e);
        } else {
            println!("  Wrote {}", dot_path);
        }
    }

    println!("Seeding agents...");
    let seeded = setup::seed_network(&mut network, &config, &mut rng)?;
    for id in &seeded {
        println!("  Seeded agent {}", id);
    }

    let discipline = config.discipline()?;
    let policy = config.policy()?;
    let k = setup::batch_size(&network, config.simulation.update_fraction);
    let mut logger = StepLogger::new(&config.output.step_log, config.output.append)?;

    println!();
    println!("Starting simulation ({} agents per step)...", k);
    println!();

    for step in 0..config.simulation.steps {
        let report = network.step(discipline, policy, k, &mut rng)?;
        network.export_step(step, &mut logger)?;

        println!(
            "[Step {:>4}] updated: {}, unchanged: {}, skipped: {}",
            step, report.updated, report.unchanged, report.skipped
        );
    }

    logger.flush()?;
    println!();
    println!(
        "Simulation complete. Ran {} steps, wrote {} records to {}.",
        config.simulation.steps,
        logger.record_count(),
        config.output.step_log
    );
    Ok(())
}
