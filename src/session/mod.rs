//! Interactive session layer: the workbench, sample queries and the REPL.

mod repl;
mod samples;
mod workbench;

pub use repl::{Repl, ReplConfig};
pub use samples::{sample, SampleQuery, DEFAULT_QUERY, SAMPLE_QUERIES};
pub use workbench::{SessionError, SessionResult, Workbench, WorkbenchConfig};
