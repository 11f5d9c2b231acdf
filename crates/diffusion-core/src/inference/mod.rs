//! External inference collaborator interface.
//!
//! Attitude agents do not compute their own state transitions. The update
//! protocol packages the acting agent and its selected influencers into a
//! [`BatchSpec`] and hands it to an [`Inference`] implementation, which is
//! treated as a synchronous, blocking black box: it either returns the full
//! new state vector or fails. Failures are surfaced, never retried; the step
//! that triggered them is considered failed and no stale state is committed.

pub mod lens;

use std::collections::VecDeque;
use std::path::PathBuf;

use thiserror::Error;

use crate::agents::AgentId;

/// One inference request: the acting agent plus its selected influencers,
/// all by id and state snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSpec {
    pub agent_id: AgentId,
    pub agent_state: Vec<f64>,
    /// Selected influencers in selection order.
    pub influencers: Vec<(AgentId, Vec<f64>)>,
    /// Bank boundary for decoding the result: the new state covers two banks
    /// of this many units each.
    pub units_per_bank: usize,
}

impl BatchSpec {
    /// Expected length of the returned state vector.
    pub fn expected_len(&self) -> usize {
        2 * self.units_per_bank
    }
}

/// Noise parameters and file locations handed to the collaborator.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub between_mean: f64,
    pub between_sd: f64,
    pub within_mean: f64,
    pub within_sd: f64,
    pub clamp_strength: f64,
    /// Hand-off file the protocol writes before invoking the collaborator.
    pub ex_file: PathBuf,
    /// Result file the collaborator writes before returning.
    pub out_file: PathBuf,
    /// Instructions file passed to the collaborator process.
    pub instructions_file: PathBuf,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            between_mean: 0.0,
            between_sd: 1.0,
            within_mean: 0.0,
            within_sd: 0.5,
            clamp_strength: 0.5,
            ex_file: PathBuf::from("output/lens/agent.ex"),
            out_file: PathBuf::from("output/lens/agent.out"),
            instructions_file: PathBuf::from("lens/attitude.in"),
        }
    }
}

/// Errors from the inference collaborator or its file protocol.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("inference output file missing: {0}")]
    MissingOutput(PathBuf),
    #[error("malformed inference output at line {line}: {content:?}")]
    MalformedLine { line: usize, content: String },
    #[error("inference output has {got} values, expected {expected}")]
    WrongLineCount { expected: usize, got: usize },
    #[error("inference process exited with {0}")]
    ProcessFailed(std::process::ExitStatus),
    #[error("scripted inference has no response queued")]
    Exhausted,
}

/// Synchronous black-box state computation for attitude agents.
///
/// The contract: the caller finishes writing any hand-off data before
/// `infer` is invoked, and the collaborator finishes producing the result
/// before returning. No bounded-latency assumption is made.
pub trait Inference {
    fn infer(
        &mut self,
        batch: &BatchSpec,
        config: &InferenceConfig,
    ) -> Result<Vec<f64>, InferenceError>;
}

/// Inference double that replays a queue of canned responses.
///
/// Used by tests and offline runs; records the batches it was asked about.
#[derive(Debug, Default)]
pub struct ScriptedInference {
    responses: VecDeque<Vec<f64>>,
    batches: Vec<BatchSpec>,
}

impl ScriptedInference {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response; responses are consumed in FIFO order.
    pub fn push_response(&mut self, state: Vec<f64>) {
        self.responses.push_back(state);
    }

    /// Batches seen so far, in call order.
    pub fn batches(&self) -> &[BatchSpec] {
        &self.batches
    }

    pub fn call_count(&self) -> usize {
        self.batches.len()
    }
}

impl Inference for ScriptedInference {
    fn infer(
        &mut self,
        batch: &BatchSpec,
        _config: &InferenceConfig,
    ) -> Result<Vec<f64>, InferenceError> {
        self.batches.push(batch.clone());
        self.responses.pop_front().ok_or(InferenceError::Exhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch() -> BatchSpec {
        BatchSpec {
            agent_id: AgentId::new(1),
            agent_state: vec![0.0, 0.0],
            influencers: vec![(AgentId::new(0), vec![1.0, 1.0])],
            units_per_bank: 1,
        }
    }

    #[test]
    fn test_scripted_replays_in_order() {
        let mut scripted = ScriptedInference::new();
        scripted.push_response(vec![1.0, 0.0]);
        scripted.push_response(vec![0.0, 1.0]);

        let cfg = InferenceConfig::default();
        assert_eq!(scripted.infer(&batch(), &cfg).unwrap(), vec![1.0, 0.0]);
        assert_eq!(scripted.infer(&batch(), &cfg).unwrap(), vec![0.0, 1.0]);
        assert_eq!(scripted.call_count(), 2);
    }

    #[test]
    fn test_scripted_fails_when_exhausted() {
        let mut scripted = ScriptedInference::new();
        let cfg = InferenceConfig::default();
        assert!(matches!(
            scripted.infer(&batch(), &cfg),
            Err(InferenceError::Exhausted)
        ));
    }

    #[test]
    fn test_batch_expected_len_covers_both_banks() {
        assert_eq!(batch().expected_len(), 2);
    }
}
