//! The simulator boundary of the isag test bench runner.
//!
//! The runner never owns a simulator. It samples and drives one through the
//! [`SignalProbe`] trait: read a signal by hierarchical path, force a signal,
//! and advance simulated time. Two implementations live here:
//!
//! - [`MemoryProbe`]: an in-memory signal table with time-scheduled value
//!   changes, used to script processor behaviour in tests.
//! - [`VcdReplayProbe`]: replays a recorded Value Change Dump so a test
//!   bench can be checked against a previous simulation run.
//!
//! # Modules
//!
//! - `error`: Probe error types
//! - `time`: Time-unit parsing
//! - `memory`: Scripted in-memory simulator
//! - `vcd`: VCD loading and trace replay

#![warn(missing_docs)]

pub mod error;
pub mod memory;
pub mod time;
pub mod vcd;

use isag_common::LogicVec;

pub use error::ProbeError;
pub use memory::{MemoryProbe, RecordedWrite};
pub use vcd::{load_vcd, load_vcd_file, LoadedWaveform, VcdLoadError, VcdReplayProbe};

/// Access to the signals and clock of a running simulation.
///
/// Calls are blocking and never overlap: the runner issues one request at a
/// time and waits for it to complete.
pub trait SignalProbe {
    /// Reads the current value of the signal at `path`.
    fn get_signal_state(&mut self, path: &str) -> Result<LogicVec, ProbeError>;

    /// Drives the signal at `path` with `value`.
    fn set_signal_state(&mut self, path: &str, value: LogicVec) -> Result<(), ProbeError>;

    /// Advances simulated time by `time_units`.
    fn run_for(&mut self, time_units: u64) -> Result<(), ProbeError>;

    /// Current simulated time in time units.
    fn now(&self) -> u64;
}

impl<P: SignalProbe + ?Sized> SignalProbe for Box<P> {
    fn get_signal_state(&mut self, path: &str) -> Result<LogicVec, ProbeError> {
        (**self).get_signal_state(path)
    }

    fn set_signal_state(&mut self, path: &str, value: LogicVec) -> Result<(), ProbeError> {
        (**self).set_signal_state(path, value)
    }

    fn run_for(&mut self, time_units: u64) -> Result<(), ProbeError> {
        (**self).run_for(time_units)
    }

    fn now(&self) -> u64 {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boxed_probe_forwards() {
        let mut probe: Box<dyn SignalProbe> =
            Box::new(MemoryProbe::new().with_signal("clk", LogicVec::from_u64(0, 1)));
        probe
            .set_signal_state("clk", LogicVec::from_u64(1, 1))
            .unwrap();
        assert_eq!(probe.get_signal_state("clk").unwrap().to_u64(), Some(1));
        probe.run_for(5).unwrap();
        assert_eq!(probe.now(), 5);
    }
}
