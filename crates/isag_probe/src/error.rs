//! Errors raised while talking to a simulator through a [`SignalProbe`](crate::SignalProbe).

use std::io;

/// Errors that can occur while probing, driving or advancing a simulator.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The simulator has no signal at the given path.
    #[error("unknown signal '{path}'")]
    UnknownSignal {
        /// The requested hierarchical path.
        path: String,
    },

    /// A recorded trace ended before the requested time.
    #[error("trace ended at {end} time units, cannot advance to {requested}")]
    EndOfTrace {
        /// Last time covered by the trace, in time units.
        end: u64,
        /// The time the caller tried to advance to.
        requested: u64,
    },

    /// The simulator backend reported a failure.
    #[error("simulator error: {0}")]
    Backend(String),

    /// An I/O error occurred while communicating with the simulator.
    #[error("simulator I/O error: {0}")]
    Io(#[from] io::Error),
}
