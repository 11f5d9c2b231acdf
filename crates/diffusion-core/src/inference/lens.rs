//! File hand-off adapter for the external inference process.
//!
//! Protocol, per call:
//! 1. Encode the batch into the example file: one line per example, an
//!    identifier token followed by the space-delimited state vector. The
//!    acting agent comes first and its token carries a `-1` suffix;
//!    influencers follow under their bare ids.
//! 2. Invoke the configured program with the instructions file as its
//!    argument. The noise parameters, clamp strength, file locations, and
//!    the zero-padded acting-agent id are passed as named environment
//!    variables.
//! 3. Read the result file: the new state is the first whitespace-delimited
//!    column of the lines covering the agent's two banks, in written order.
//!
//! The process is synchronous and failures are not retried.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use diffusion_log::codec;

use super::{BatchSpec, Inference, InferenceConfig, InferenceError};

/// Width of the zero-padded agent id token handed to the collaborator.
const AGENT_ID_PAD: usize = 6;

/// Runs the external inference program over the file hand-off protocol.
pub struct LensProcess {
    program: PathBuf,
}

impl LensProcess {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Inference for LensProcess {
    fn infer(
        &mut self,
        batch: &BatchSpec,
        config: &InferenceConfig,
    ) -> Result<Vec<f64>, InferenceError> {
        write_example_file(&config.ex_file, batch)?;

        let status = Command::new(&self.program)
            .arg(&config.instructions_file)
            .env("AGENT_ID", padded_id(batch))
            .env("BETWEEN_MEAN", config.between_mean.to_string())
            .env("BETWEEN_SD", config.between_sd.to_string())
            .env("WITHIN_MEAN", config.within_mean.to_string())
            .env("WITHIN_SD", config.within_sd.to_string())
            .env("CLAMP_STRENGTH", config.clamp_strength.to_string())
            .env("EX_FILE", &config.ex_file)
            .env("OUT_FILE", &config.out_file)
            .status()?;
        if !status.success() {
            return Err(InferenceError::ProcessFailed(status));
        }

        read_new_state(&config.out_file, batch.units_per_bank)
    }
}

/// Zero-padded id token for the acting agent.
fn padded_id(batch: &BatchSpec) -> String {
    format!("{:0width$}", batch.agent_id.value(), width = AGENT_ID_PAD)
}

/// Encode a batch into the example-file text.
pub fn encode_batch(batch: &BatchSpec) -> String {
    let mut lines = Vec::with_capacity(1 + batch.influencers.len());
    lines.push(format!(
        "{}-1 {}",
        batch.agent_id,
        codec::to_delim_str(&batch.agent_state, " ")
    ));
    for (id, state) in &batch.influencers {
        lines.push(format!("{} {}", id, codec::to_delim_str(state, " ")));
    }
    lines.join("\n")
}

/// Write the example file, creating parent directories as needed. The file
/// is fully written before this returns, per the hand-off contract.
fn write_example_file(path: &Path, batch: &BatchSpec) -> Result<(), InferenceError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, encode_batch(batch))?;
    Ok(())
}

/// Line ranges (1-based, inclusive) of the agent's two banks in the result
/// file.
fn bank_line_ranges(units_per_bank: usize) -> ((usize, usize), (usize, usize)) {
    (
        (1, units_per_bank),
        (units_per_bank + 1, 2 * units_per_bank),
    )
}

/// Read the new state back from the result file.
///
/// Takes the first whitespace-delimited column of every line inside the two
/// bank ranges; lines past the second bank are the collaborator's own
/// business and are ignored.
pub fn read_new_state(path: &Path, units_per_bank: usize) -> Result<Vec<f64>, InferenceError> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            InferenceError::MissingOutput(path.to_path_buf())
        } else {
            InferenceError::Io(e)
        }
    })?;

    let ((start1, end1), (start2, end2)) = bank_line_ranges(units_per_bank);
    let expected = 2 * units_per_bank;
    let mut values = Vec::with_capacity(expected);

    for (idx, line) in content.lines().enumerate() {
        let line_num = idx + 1;
        let in_bank1 = start1 <= line_num && line_num <= end1;
        let in_bank2 = start2 <= line_num && line_num <= end2;
        if !(in_bank1 || in_bank2) {
            continue;
        }
        let column = line
            .split_whitespace()
            .next()
            .ok_or_else(|| InferenceError::MalformedLine {
                line: line_num,
                content: line.to_string(),
            })?;
        let value = column
            .parse::<f64>()
            .map_err(|_| InferenceError::MalformedLine {
                line: line_num,
                content: line.to_string(),
            })?;
        values.push(value);
    }

    if values.len() != expected {
        return Err(InferenceError::WrongLineCount {
            expected,
            got: values.len(),
        });
    }
    Ok(values)
}
