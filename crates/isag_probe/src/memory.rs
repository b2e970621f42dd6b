//! An in-memory simulator whose signals follow a pre-scripted schedule.
//!
//! [`MemoryProbe`] holds a table of named signals and a queue of value
//! changes keyed by simulated time. Advancing time applies every change
//! due on or before the new time, in the order it was scheduled. Writes
//! through [`SignalProbe::set_signal_state`] take effect immediately and
//! are recorded so callers can inspect what was driven and when.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use isag_common::LogicVec;

use crate::{ProbeError, SignalProbe};

/// A value change waiting in the schedule.
#[derive(Debug, Clone)]
struct ScheduledChange {
    /// When the change is applied.
    time: u64,
    /// Insertion order, so changes at the same time apply first-in first-out.
    seq: u64,
    /// The target signal.
    path: String,
    /// The new value.
    value: LogicVec,
}

impl PartialEq for ScheduledChange {
    fn eq(&self, other: &Self) -> bool {
        (self.time, self.seq) == (other.time, other.seq)
    }
}

impl Eq for ScheduledChange {}

impl PartialOrd for ScheduledChange {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledChange {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.time, self.seq).cmp(&(other.time, other.seq))
    }
}

/// A signal write observed by the probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    /// Simulated time of the write.
    pub time: u64,
    /// The signal that was driven.
    pub path: String,
    /// The value driven onto it.
    pub value: LogicVec,
}

/// A scripted simulator for exercising the runner without an HDL tool.
#[derive(Debug, Default)]
pub struct MemoryProbe {
    now: u64,
    signals: HashMap<String, LogicVec>,
    pending: BinaryHeap<Reverse<ScheduledChange>>,
    next_seq: u64,
    writes: Vec<RecordedWrite>,
}

impl MemoryProbe {
    /// Creates an empty probe at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set`](Self::set).
    pub fn with_signal(mut self, path: impl Into<String>, value: LogicVec) -> Self {
        self.set(path, value);
        self
    }

    /// Declares a signal or replaces its current value without recording a write.
    pub fn set(&mut self, path: impl Into<String>, value: LogicVec) {
        self.signals.insert(path.into(), value);
    }

    /// Schedules `path` to take `value` once simulated time reaches `time`.
    ///
    /// A change scheduled at or before the current time applies on the next
    /// call to [`run_for`](SignalProbe::run_for).
    pub fn schedule(&mut self, time: u64, path: impl Into<String>, value: LogicVec) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Reverse(ScheduledChange {
            time,
            seq,
            path: path.into(),
            value,
        }));
    }

    /// Returns the current value of a signal, if declared.
    pub fn value(&self, path: &str) -> Option<&LogicVec> {
        self.signals.get(path)
    }

    /// Returns every write made through [`SignalProbe::set_signal_state`].
    pub fn writes(&self) -> &[RecordedWrite] {
        &self.writes
    }

    /// Returns the number of changes still waiting in the schedule.
    pub fn pending_changes(&self) -> usize {
        self.pending.len()
    }
}

impl SignalProbe for MemoryProbe {
    fn get_signal_state(&mut self, path: &str) -> Result<LogicVec, ProbeError> {
        self.signals
            .get(path)
            .cloned()
            .ok_or_else(|| ProbeError::UnknownSignal {
                path: path.to_string(),
            })
    }

    fn set_signal_state(&mut self, path: &str, value: LogicVec) -> Result<(), ProbeError> {
        let slot = self
            .signals
            .get_mut(path)
            .ok_or_else(|| ProbeError::UnknownSignal {
                path: path.to_string(),
            })?;
        *slot = value.clone();
        self.writes.push(RecordedWrite {
            time: self.now,
            path: path.to_string(),
            value,
        });
        Ok(())
    }

    fn run_for(&mut self, time_units: u64) -> Result<(), ProbeError> {
        let target = self
            .now
            .checked_add(time_units)
            .ok_or_else(|| ProbeError::Backend("simulated time overflow".to_string()))?;

        while let Some(Reverse(change)) = self.pending.peek() {
            if change.time > target {
                break;
            }
            if let Some(Reverse(change)) = self.pending.pop() {
                log::trace!("t={} {} <= {}", change.time, change.path, change.value);
                self.signals.insert(change.path, change.value);
            }
        }

        self.now = target;
        Ok(())
    }

    fn now(&self) -> u64 {
        self.now
    }
}
