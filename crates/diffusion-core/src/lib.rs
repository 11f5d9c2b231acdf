//! Opinion diffusion over a directed network of agents.
//!
//! Agents occupy nodes in a directed multigraph; an edge u -> v makes u a
//! predecessor (upstream influence) of v. Each simulation step samples a
//! subset of agents without replacement and updates them under a configured
//! timing discipline: sequential (compute-and-commit one agent at a time) or
//! simultaneous (stage every new state, then commit the whole batch).
//!
//! Binary agents update in-process with a majority rule. Attitude agents
//! carry a two-bank state vector and delegate the state computation to an
//! external inference collaborator behind the [`inference::Inference`] trait.

pub mod agents;
pub mod config;
pub mod inference;
pub mod network;
pub mod protocol;
pub mod setup;

pub use agents::{Agent, AgentError, AgentId, AgentKind, IdAllocator};
pub use config::{Config, ConfigError};
pub use inference::{BatchSpec, Inference, InferenceConfig, InferenceError};
pub use network::{Network, NetworkBuilder, NetworkError, StepReport};
pub use protocol::{SelectionPolicy, UpdateDiscipline, UpdateError};
pub use setup::SetupError;
