//! Errors that end the demo flow abnormally.

use agents::AgentsError;
use thiserror::Error;

/// Failures that propagate out of the demo flow.
///
/// Configuration problems, telemetry problems and failed runs are *not*
/// represented here; they are reported on the console and end the flow
/// normally.
#[derive(Debug, Error)]
pub enum DemoError {
    /// A call to the agent service failed.
    #[error(transparent)]
    Service(#[from] AgentsError),

    /// The console report could not be written.
    #[error("Could not write to the console: {0}")]
    Console(#[from] std::io::Error),
}
