//! Cycle-by-cycle matching and firing of test commands.
//!
//! Every cycle the scheduler reads the program counter, queues each command
//! bound to that instruction with a countdown of its `cycles_after_event`,
//! then walks the queue in insertion order: entries at zero fire and leave
//! the queue, the rest count down by one. A command queued with countdown
//! N therefore fires on the Nth step after the one that matched it.

use isag_config::ArchConfig;
use isag_probe::SignalProbe;

use crate::bench::TestBench;
use crate::command::CommandOutcome;
use crate::error::RunError;
use crate::processor::Processor;

/// A command waiting to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedCommand {
    /// Index into [`TestBench::commands`].
    pub command: usize,
    /// Steps left before it fires.
    pub remaining: u32,
}

/// Matches commands against the program counter and fires them when due.
#[derive(Debug, Clone)]
pub struct Scheduler {
    arch: ArchConfig,
    queue: Vec<QueuedCommand>,
}

impl Scheduler {
    /// Creates an empty scheduler for the given architecture.
    pub fn new(arch: &ArchConfig) -> Self {
        Self {
            arch: arch.clone(),
            queue: Vec::new(),
        }
    }

    /// Commands queued and not yet fired.
    pub fn pending(&self) -> &[QueuedCommand] {
        &self.queue
    }

    /// Drops every queued command.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Runs one cycle of matching and firing.
    ///
    /// Outcomes are recorded on `bench`; irq actions are applied through
    /// `processor`. An unknown program counter matches no command but
    /// already queued commands still count down.
    pub fn step<P: SignalProbe>(
        &mut self,
        bench: &mut TestBench,
        processor: &mut Processor<P>,
    ) -> Result<(), RunError> {
        let state = processor.state()?.clone();

        match state.instruction_address(self.arch.stride) {
            Some(address) => {
                for (index, command) in bench.commands().iter().enumerate() {
                    if command.address == address {
                        log::debug!(
                            "queued {} '{}' at instruction {address}",
                            command.kind.name(),
                            command.parameters
                        );
                        self.queue.push(QueuedCommand {
                            command: index,
                            remaining: command.cycles_after_event,
                        });
                    }
                }
            }
            None => log::debug!("program counter unknown, nothing matched"),
        }

        let mut due = Vec::new();
        self.queue.retain_mut(|queued| {
            if queued.remaining == 0 {
                due.push(queued.command);
                false
            } else {
                queued.remaining -= 1;
                true
            }
        });

        for index in due {
            let command = &bench.commands()[index];
            log::debug!(
                "executing {} '{}' (line {})",
                command.kind.name(),
                command.parameters,
                command.line
            );
            let outcome = command.execute(&state, &self.arch);
            if let CommandOutcome::Irq(action) = outcome {
                processor.set_irqs(action.mask, action.value)?;
            }
            bench.record(&outcome);
        }
        Ok(())
    }
}
