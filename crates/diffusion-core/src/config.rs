//! Configuration System
//!
//! Loads run parameters from diffusion.toml for easy adjustment without
//! recompiling, and maps the string-typed knobs onto the engine's typed
//! enums at the boundary.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::agents::AgentKind;
use crate::inference::InferenceConfig;
use crate::protocol::{SelectionPolicy, UpdateDiscipline};

/// Default tuning file path
pub const DEFAULT_CONFIG_PATH: &str = "diffusion.toml";

/// Top-level configuration structure
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub simulation: SimulationConfig,
    pub network: NetworkConfig,
    pub inference: InferenceSection,
    pub output: OutputConfig,
}

/// Simulation parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of steps to run.
    pub steps: u64,
    /// Fraction of the network sampled for update each step.
    pub update_fraction: f64,
    /// Number of agents seeded before the run.
    pub seed_count: usize,
    /// Timing discipline: "sequential" or "simultaneous".
    pub update_type: String,
    /// Neighbor-selection policy: "random_1" or "random_all".
    pub algorithm: String,
}

/// Network topology parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub agents: usize,
    /// Erdos-Renyi edge probability in [0, 1].
    pub edge_probability: f64,
    /// Agent variant: "binary" or "attitude".
    pub agent_kind: String,
    /// Units per bank for attitude agents.
    pub units_per_bank: usize,
    /// Optional comma-delimited state prototype planted into seeded
    /// attitude agents.
    pub seed_prototype: Option<String>,
}

/// External inference collaborator parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InferenceSection {
    /// Program invoked for each attitude update.
    pub command: String,
    pub between_mean: f64,
    pub between_sd: f64,
    pub within_mean: f64,
    pub within_sd: f64,
    pub clamp_strength: f64,
    pub ex_file: String,
    pub out_file: String,
    pub instructions_file: String,
}

/// Output parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub step_log: String,
    /// Append to an existing step log instead of truncating it.
    pub append: bool,
    /// Optional Graphviz DOT export of the topology.
    pub dot_file: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from default path, or use defaults if not found
    pub fn load_or_default() -> Self {
        Self::load(DEFAULT_CONFIG_PATH).unwrap_or_else(|e| {
            eprintln!(
                "Warning: Could not load {}: {}. Using defaults.",
                DEFAULT_CONFIG_PATH, e
            );
            Self::default()
        })
    }

    /// Typed timing discipline.
    pub fn discipline(&self) -> Result<UpdateDiscipline, ConfigError> {
        self.simulation
            .update_type
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                field: "simulation.update_type",
                value: self.simulation.update_type.clone(),
            })
    }

    /// Typed selection policy.
    pub fn policy(&self) -> Result<SelectionPolicy, ConfigError> {
        self.simulation
            .algorithm
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                field: "simulation.algorithm",
                value: self.simulation.algorithm.clone(),
            })
    }

    /// Typed agent variant.
    pub fn agent_kind(&self) -> Result<AgentKind, ConfigError> {
        match self.network.agent_kind.as_str() {
            "binary" => Ok(AgentKind::Binary),
            "attitude" => {
                if self.network.units_per_bank == 0 {
                    return Err(ConfigError::InvalidValue {
                        field: "network.units_per_bank",
                        value: self.network.units_per_bank.to_string(),
                    });
                }
                Ok(AgentKind::Attitude {
                    units_per_bank: self.network.units_per_bank,
                })
            }
            other => Err(ConfigError::UnknownAgentKind(other.to_string())),
        }
    }

    /// Inference configuration for the file hand-off adapter.
    pub fn inference_config(&self) -> InferenceConfig {
        InferenceConfig {
            between_mean: self.inference.between_mean,
            between_sd: self.inference.between_sd,
            within_mean: self.inference.within_mean,
            within_sd: self.inference.within_sd,
            clamp_strength: self.inference.clamp_strength,
            ex_file: PathBuf::from(&self.inference.ex_file),
            out_file: PathBuf::from(&self.inference.out_file),
            instructions_file: PathBuf::from(&self.inference.instructions_file),
        }
    }

    /// Check every string-typed knob and numeric range at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.discipline()?;
        self.policy()?;
        self.agent_kind()?;
        if !(0.0..=1.0).contains(&self.network.edge_probability) {
            return Err(ConfigError::InvalidValue {
                field: "network.edge_probability",
                value: self.network.edge_probability.to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.simulation.update_fraction) {
            return Err(ConfigError::InvalidValue {
                field: "simulation.update_fraction",
                value: self.simulation.update_fraction.to_string(),
            });
        }
        if self.simulation.seed_count > self.network.agents {
            return Err(ConfigError::InvalidValue {
                field: "simulation.seed_count",
                value: self.simulation.seed_count.to_string(),
            });
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            network: NetworkConfig::default(),
            inference: InferenceSection::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            steps: 5,
            update_fraction: 0.1,
            seed_count: 1,
            update_type: "sequential".to_string(),
            algorithm: "random_1".to_string(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            agents: 20,
            edge_probability: 0.1,
            agent_kind: "binary".to_string(),
            units_per_bank: 5,
            seed_prototype: None,
        }
    }
}

impl Default for InferenceSection {
    fn default() -> Self {
        let defaults = InferenceConfig::default();
        Self {
            command: "lens".to_string(),
            between_mean: defaults.between_mean,
            between_sd: defaults.between_sd,
            within_mean: defaults.within_mean,
            within_sd: defaults.within_sd,
            clamp_strength: defaults.clamp_strength,
            ex_file: defaults.ex_file.display().to_string(),
            out_file: defaults.out_file.display().to_string(),
            instructions_file: defaults.instructions_file.display().to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            step_log: "output/steps.csv".to_string(),
            append: false,
            dot_file: None,
        }
    }
}

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("unknown agent kind {0:?}")]
    UnknownAgentKind(String),
    #[error("invalid value for {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.simulation.steps, 5);
        assert_eq!(config.network.agents, 20);
        assert_eq!(config.discipline().unwrap(), UpdateDiscipline::Sequential);
        assert_eq!(config.policy().unwrap(), SelectionPolicy::RandomOne);
        assert_eq!(config.agent_kind().unwrap(), AgentKind::Binary);
    }

    #[test]
    fn test_parse_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [simulation]
            steps = 50
            algorithm = "random_all"

            [network]
            agents = 100
            agent_kind = "attitude"
            units_per_bank = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.simulation.steps, 50);
        assert_eq!(config.policy().unwrap(), SelectionPolicy::RandomAll);
        assert_eq!(
            config.agent_kind().unwrap(),
            AgentKind::Attitude { units_per_bank: 10 }
        );
        // Untouched sections keep their defaults.
        assert_eq!(config.output.step_log, "output/steps.csv");
        assert_eq!(config.inference.command, "lens");
    }

    #[test]
    fn test_unknown_strings_fail_fast() {
        let mut config = Config::default();
        config.simulation.update_type = "threaded".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "simulation.update_type",
                ..
            })
        ));

        let mut config = Config::default();
        config.simulation.algorithm = "random_7".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.network.agent_kind = "ternary".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownAgentKind(_))
        ));
    }

    #[test]
    fn test_range_checks() {
        let mut config = Config::default();
        config.network.edge_probability = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.simulation.seed_count = 21;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.network.agent_kind = "attitude".to_string();
        config.network.units_per_bank = 0;
        assert!(config.validate().is_err());
    }
}
