//! Step record schema.
//!
//! One record captures one node at one time step. On disk a record is a
//! single comma-delimited line; the state vector is space-joined so it
//! occupies exactly one field, with no bracket characters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::{self, CodecError};

/// Number of comma-delimited fields in a serialized record.
const FIELD_COUNT: usize = 5;

/// Errors from parsing a step-log line.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("expected {FIELD_COUNT} comma-delimited fields, got {0}")]
    FieldCount(usize),
    #[error("unparseable {field} field: {value:?}")]
    BadField { field: &'static str, value: String },
    #[error("unparseable state vector: {0}")]
    State(#[from] CodecError),
}

/// State of one node at one time step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub time_step: u64,
    pub agent_id: u64,
    pub update_count: u64,
    pub state: Vec<f64>,
    /// Id of the agent whose state drove this step's update, when the
    /// selection policy picked exactly one. Transient: cleared every step.
    pub influenced_by: Option<u64>,
}

impl StepRecord {
    /// Serialize to one comma-delimited log line (no trailing newline).
    pub fn to_line(&self) -> String {
        let influencer = self
            .influenced_by
            .map(|id| id.to_string())
            .unwrap_or_default();
        format!(
            "{},{},{},{},{}",
            self.time_step,
            self.agent_id,
            self.update_count,
            codec::to_delim_str(&self.state, " "),
            influencer,
        )
    }

    /// Parse a log line produced by [`StepRecord::to_line`].
    pub fn parse_line(line: &str) -> Result<Self, RecordError> {
        let fields: Vec<&str> = line.trim_end().split(',').collect();
        if fields.len() != FIELD_COUNT {
            return Err(RecordError::FieldCount(fields.len()));
        }

        let parse_u64 = |field: &'static str, value: &str| {
            value.parse::<u64>().map_err(|_| RecordError::BadField {
                field,
                value: value.to_string(),
            })
        };

        let influenced_by = if fields[4].is_empty() {
            None
        } else {
            Some(parse_u64("influenced_by", fields[4])?)
        };

        Ok(Self {
            time_step: parse_u64("time_step", fields[0])?,
            agent_id: parse_u64("agent_id", fields[1])?,
            update_count: parse_u64("update_count", fields[2])?,
            state: codec::parse_delim_str(fields[3], " ")?,
            influenced_by,
        })
    }
}
