//! Update protocol: timing disciplines, selection policies, and commits.
//!
//! The protocol decides which predecessors influence an update, how the new
//! state is committed, and under which timing discipline a sampled batch
//! runs. The network orchestrator drives it; agents never commit themselves.

use std::str::FromStr;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use thiserror::Error;

use crate::agents::{Agent, AgentError, AgentId};
use crate::inference::InferenceError;

/// Timing discipline for one sampled batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateDiscipline {
    /// Compute and commit one agent at a time, in sampling order. Later
    /// agents in the batch observe already-committed neighbors.
    Sequential,
    /// Two phases with a barrier between them: stage every computed state
    /// first, then commit the whole batch. No sampled agent observes another
    /// sampled agent's new state within the step.
    Simultaneous,
}

impl FromStr for UpdateDiscipline {
    type Err = UpdateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sequential" => Ok(UpdateDiscipline::Sequential),
            "simultaneous" => Ok(UpdateDiscipline::Simultaneous),
            other => Err(UpdateError::UnknownUpdateType(other.to_string())),
        }
    }
}

/// Neighbor-selection policy: which predecessors influence an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Sample exactly one predecessor uniformly at random.
    RandomOne,
    /// Use every predecessor.
    RandomAll,
}

impl FromStr for SelectionPolicy {
    type Err = UpdateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random_1" => Ok(SelectionPolicy::RandomOne),
            "random_all" => Ok(SelectionPolicy::RandomAll),
            other => Err(UpdateError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Errors from driving an update.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("unknown update type {0:?}")]
    UnknownUpdateType(String),
    #[error("unknown update algorithm {0:?}")]
    UnknownAlgorithm(String),
    #[error("requested {requested} predecessors but only {available} exist")]
    InsufficientPredecessors { requested: usize, available: usize },
    #[error("inference collaborator unavailable for this agent variant")]
    InferenceUnavailable,
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error(transparent)]
    Agent(#[from] AgentError),
}

/// Select influencing predecessors from the candidate pool per the policy.
///
/// Sampling is uniform and without replacement. Requesting more predecessors
/// than exist is a precondition violation, never a silent truncation.
pub fn choose_influencers(
    candidates: &[AgentId],
    policy: SelectionPolicy,
    rng: &mut SmallRng,
) -> Result<Vec<AgentId>, UpdateError> {
    let n = match policy {
        SelectionPolicy::RandomOne => 1,
        SelectionPolicy::RandomAll => candidates.len(),
    };
    select_n(candidates, n, rng)
}

fn select_n(
    candidates: &[AgentId],
    n: usize,
    rng: &mut SmallRng,
) -> Result<Vec<AgentId>, UpdateError> {
    if n > candidates.len() {
        return Err(UpdateError::InsufficientPredecessors {
            requested: n,
            available: candidates.len(),
        });
    }
    Ok(candidates.choose_multiple(rng, n).copied().collect())
}

/// Commit a computed state: replace the state vector and increment the
/// update count, together. The state length is validated before either
/// mutation happens, so a failed commit changes nothing.
pub fn commit(agent: &mut Agent, new_state: Vec<f64>) -> Result<(), UpdateError> {
    if new_state.len() != agent.state().len() {
        return Err(AgentError::StateLength {
            expected: agent.state().len(),
            got: new_state.len(),
        }
        .into());
    }
    let next_count = agent.update_count() + 1;
    agent.set_state(new_state)?;
    agent.set_update_count(next_count)?;
    Ok(())
}
