//! Run Setup
//!
//! Topology generation, network construction from configuration, and
//! pre-run seeding.

use rand::rngs::SmallRng;
use rand::Rng;

use diffusion_log::codec;

use crate::agents::{AgentId, AgentKind};
use crate::config::{Config, ConfigError};
use crate::inference::lens::LensProcess;
use crate::network::{Network, NetworkBuilder, NetworkError};

/// Errors from building a run out of configuration.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error("unparseable seed prototype: {0}")]
    SeedPrototype(#[from] codec::CodecError),
}

/// Generate a directed Erdos-Renyi G(n, p) edge list.
///
/// Every ordered pair (u, v) with u != v becomes an edge with independent
/// probability `p`.
pub fn gnp_edge_list(n: usize, p: f64, rng: &mut SmallRng) -> Vec<(u64, u64)> {
    let mut edges = Vec::new();
    for u in 0..n as u64 {
        for v in 0..n as u64 {
            if u != v && rng.gen::<f64>() < p {
                edges.push((u, v));
            }
        }
    }
    edges
}

/// Construct the network described by the configuration.
///
/// Attitude networks get the file hand-off inference adapter wired in with
/// the configured command and noise parameters.
pub fn build_network(config: &Config, rng: &mut SmallRng) -> Result<Network, SetupError> {
    config.validate()?;
    let kind = config.agent_kind()?;
    let edges = gnp_edge_list(config.network.agents, config.network.edge_probability, rng);

    let mut builder = NetworkBuilder::new(kind);
    if matches!(kind, AgentKind::Attitude { .. }) {
        builder = builder.with_inference(
            Box::new(LensProcess::new(config.inference.command.clone())),
            config.inference_config(),
        );
    }
    Ok(builder.build(config.network.agents, &edges)?)
}

/// Seed the configured number of agents before the run begins.
///
/// Binary networks force the sampled agents to state 1. Attitude networks
/// plant the configured prototype vector, when one is given; with no
/// prototype the agents stay at the variant's zero state.
pub fn seed_network(
    network: &mut Network,
    config: &Config,
    rng: &mut SmallRng,
) -> Result<Vec<AgentId>, SetupError> {
    let seeded = network.sample_without_replacement(config.simulation.seed_count, rng)?;

    match config.agent_kind()? {
        AgentKind::Binary => {
            for &id in &seeded {
                network.seed_binary(id, 1)?;
            }
        }
        AgentKind::Attitude { .. } => {
            if let Some(prototype) = &config.network.seed_prototype {
                let state: Vec<f64> = codec::parse_delim_str(prototype, ",")?;
                for &id in &seeded {
                    network.seed_state(id, state.clone())?;
                }
            }
        }
    }
    Ok(seeded)
}

/// Batch size for one step: the configured fraction of the network, at
/// least one agent.
pub fn batch_size(network: &Network, update_fraction: f64) -> usize {
    let k = (network.agent_count() as f64 * update_fraction).floor() as usize;
    k.max(1).min(network.agent_count())
}
