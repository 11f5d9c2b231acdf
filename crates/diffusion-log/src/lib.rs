//! Step-log schema and delimited codec.
//!
//! Shared between the simulation engine (which writes one record per node per
//! time step) and analysis tooling (which reads the log back). The format is
//! plain comma-delimited text, one line per record, with state vectors joined
//! by spaces so a record stays on a single line.

pub mod codec;
pub mod record;
pub mod writer;

pub use codec::{parse_delim_str, to_delim_str, CodecError};
pub use record::{RecordError, StepRecord};
pub use writer::StepLogger;
