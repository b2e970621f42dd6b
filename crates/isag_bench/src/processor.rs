//! The processor under test, seen through a [`SignalProbe`].
//!
//! [`Processor`] owns the probe and a per-cycle cache of the architectural
//! state. The cache is filled on the first [`state`](Processor::state) call
//! of a cycle and dropped whenever simulated time advances.

use isag_common::LogicVec;
use isag_config::{ArchConfig, RunConfig, RunnerConfig, SignalPaths};
use isag_probe::{ProbeError, SignalProbe};

use crate::error::RunError;
use crate::state::ProcessorState;

/// A simulated processor core driven cycle by cycle.
#[derive(Debug)]
pub struct Processor<P: SignalProbe> {
    probe: P,
    arch: ArchConfig,
    signals: SignalPaths,
    run: RunConfig,
    state: ProcessorState,
    dirty: bool,
    cycles: u64,
}

impl<P: SignalProbe> Processor<P> {
    /// Wraps a probe using the architecture, signal paths and timing of `config`.
    pub fn new(probe: P, config: &RunnerConfig) -> Self {
        Self {
            probe,
            arch: config.arch.clone(),
            signals: config.signals.clone(),
            run: config.run.clone(),
            state: ProcessorState::default(),
            dirty: true,
            cycles: 0,
        }
    }

    /// The wrapped probe.
    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Mutable access to the probe. Invalidates the cached state.
    pub fn probe_mut(&mut self) -> &mut P {
        self.dirty = true;
        &mut self.probe
    }

    /// Unwraps the probe.
    pub fn into_probe(self) -> P {
        self.probe
    }

    /// Architecture parameters.
    pub fn arch(&self) -> &ArchConfig {
        &self.arch
    }

    /// Cycles advanced since creation.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Returns the state of the current cycle, sampling it if needed.
    pub fn state(&mut self) -> Result<&ProcessorState, ProbeError> {
        if self.dirty {
            self.state = self.sample()?;
            self.dirty = false;
        }
        Ok(&self.state)
    }

    fn sample(&mut self) -> Result<ProcessorState, ProbeError> {
        let word_size = self.arch.word_size;
        let pc_path = self.signals.pc.clone();
        let pc = self.read(&pc_path)?.to_u64();

        let mut gp_registers = Vec::with_capacity(self.arch.gp_registers);
        for i in 0..self.arch.gp_registers {
            let path = self.signals.gp_register_path(i, word_size);
            gp_registers.push(self.read(&path)?.to_u64());
        }
        let mut sp_registers = Vec::with_capacity(self.arch.sp_registers);
        for i in 0..self.arch.sp_registers {
            let path = self.signals.sp_register_path(i, word_size);
            sp_registers.push(self.read(&path)?.to_u64());
        }

        Ok(ProcessorState {
            pc,
            gp_registers,
            sp_registers,
        })
    }

    fn read(&mut self, path: &str) -> Result<LogicVec, ProbeError> {
        let value = self.probe.get_signal_state(path)?;
        Ok(if self.signals.flip { value.flip() } else { value })
    }

    fn write(&mut self, path: &str, value: LogicVec) -> Result<(), ProbeError> {
        let value = if self.signals.flip { value.flip() } else { value };
        self.probe.set_signal_state(path, value)
    }

    /// Advances past the clock edge once after start.
    pub fn settle(&mut self) -> Result<(), ProbeError> {
        self.dirty = true;
        self.probe.run_for(self.run.settle_time)
    }

    /// Advances one clock cycle.
    pub fn run_cycle(&mut self) -> Result<(), ProbeError> {
        self.dirty = true;
        self.probe.run_for(self.run.cycle_time)?;
        self.cycles += 1;
        Ok(())
    }

    /// Advances until the instruction-valid strobe is high.
    ///
    /// Returns immediately when no strobe is configured. Gives up with
    /// [`RunError::CycleLimit`] once `max_cycles` cycles have elapsed.
    pub fn run_to_next_valid_instruction(&mut self, max_cycles: Option<u64>) -> Result<(), RunError> {
        let Some(path) = self.signals.instr_valid_path().map(str::to_string) else {
            return Ok(());
        };
        loop {
            if self.probe.get_signal_state(&path)?.to_u64_lossy() > 0 {
                return Ok(());
            }
            if let Some(limit) = max_cycles.filter(|&limit| self.cycles >= limit) {
                return Err(RunError::CycleLimit { limit });
            }
            self.run_cycle()?;
        }
    }

    /// Read-modify-writes the interrupt lines: `x = (x & !mask) | (mask & value)`.
    ///
    /// Undefined bits of the current value are read as zero.
    pub fn set_irqs(&mut self, mask: u64, value: u64) -> Result<(), ProbeError> {
        let path = self.signals.irq.clone();
        let current = self.read(&path)?;
        if !current.is_definite() {
            log::warn!("irq lines '{path}' hold undefined bits ({current}), treating them as 0");
        }
        let next = (current.to_u64_lossy() & !mask) | (mask & value);
        log::debug!("irq {path}: {current} -> {next:#x}");
        self.write(&path, LogicVec::from_u64(next, self.arch.irq_lines))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isag_common::Logic;
    use isag_probe::MemoryProbe;

    fn config() -> RunnerConfig {
        let mut config = RunnerConfig::default();
        config.arch.gp_registers = 2;
        config.arch.sp_registers = 1;
        config.signals.pc = "pc".into();
        config.signals.gp_register = "r{index}".into();
        config.signals.sp_register = "s{index}".into();
        config.signals.instr_valid = None;
        config.signals.flip = false;
        config
    }

    fn probe() -> MemoryProbe {
        MemoryProbe::new()
            .with_signal("pc", LogicVec::from_u64(8, 32))
            .with_signal("r0", LogicVec::from_u64(1, 32))
            .with_signal("r1", LogicVec::filled(32, Logic::X))
            .with_signal("s0", LogicVec::from_u64(7, 32))
            .with_signal("irq", LogicVec::from_u64(0b1010, 4))
    }

    #[test]
    fn samples_state() {
        let mut cpu = Processor::new(probe(), &config());
        let state = cpu.state().unwrap();
        assert_eq!(state.pc, Some(8));
        assert_eq!(state.gp_registers, vec![Some(1), None]);
        assert_eq!(state.sp_registers, vec![Some(7)]);
    }

    #[test]
    fn state_is_cached_until_cycle_advances() {
        let mut probe = probe();
        probe.schedule(10, "pc", LogicVec::from_u64(12, 32));
        let mut cpu = Processor::new(probe, &config());

        assert_eq!(cpu.state().unwrap().pc, Some(8));
        cpu.probe.set("pc", LogicVec::from_u64(99, 32));
        assert_eq!(cpu.state().unwrap().pc, Some(8));

        cpu.run_cycle().unwrap();
        assert_eq!(cpu.state().unwrap().pc, Some(12));
        assert_eq!(cpu.cycles(), 1);
        assert_eq!(cpu.probe().now(), 10);
    }

    #[test]
    fn flip_reverses_reads() {
        let mut config = config();
        config.signals.flip = true;
        let probe = MemoryProbe::new()
            .with_signal("pc", LogicVec::from_binary_str("0010").unwrap())
            .with_signal("r0", LogicVec::from_u64(0, 4))
            .with_signal("r1", LogicVec::from_u64(0, 4))
            .with_signal("s0", LogicVec::from_u64(0, 4));
        let mut cpu = Processor::new(probe, &config);
        assert_eq!(cpu.state().unwrap().pc, Some(0b0100));
    }

    #[test]
    fn unknown_signal_propagates() {
        let mut cpu = Processor::new(MemoryProbe::new(), &config());
        assert!(matches!(cpu.state(), Err(ProbeError::UnknownSignal { .. })));
    }

    #[test]
    fn settle_advances_settle_time() {
        let mut cpu = Processor::new(probe(), &config());
        cpu.settle().unwrap();
        assert_eq!(cpu.probe().now(), 1);
        assert_eq!(cpu.cycles(), 0);
    }

    #[test]
    fn waits_for_valid_instruction() {
        let mut config = config();
        config.signals.instr_valid = Some("valid".into());
        let mut probe = probe().with_signal("valid", LogicVec::from_u64(0, 1));
        probe.schedule(30, "valid", LogicVec::from_u64(1, 1));
        let mut cpu = Processor::new(probe, &config);

        cpu.run_to_next_valid_instruction(None).unwrap();
        assert_eq!(cpu.cycles(), 3);
        cpu.run_to_next_valid_instruction(None).unwrap();
        assert_eq!(cpu.cycles(), 3);
    }

    #[test]
    fn valid_instruction_wait_respects_limit() {
        let mut config = config();
        config.signals.instr_valid = Some("valid".into());
        let probe = probe().with_signal("valid", LogicVec::from_u64(0, 1));
        let mut cpu = Processor::new(probe, &config);
        assert!(matches!(
            cpu.run_to_next_valid_instruction(Some(5)),
            Err(RunError::CycleLimit { limit: 5 })
        ));
        assert_eq!(cpu.cycles(), 5);
    }

    #[test]
    fn set_irqs_read_modify_write() {
        let mut cpu = Processor::new(probe(), &config());
        cpu.set_irqs(0b0001, 0b0001).unwrap();
        let probe = cpu.into_probe();
        assert_eq!(probe.value("irq").and_then(LogicVec::to_u64), Some(0b1011));
        assert_eq!(probe.writes().len(), 1);
    }

    #[test]
    fn set_irqs_treats_undefined_bits_as_zero() {
        let probe = probe().with_signal("irq", LogicVec::from_binary_str("1XZ0").unwrap());
        let mut cpu = Processor::new(probe, &config());
        cpu.set_irqs(0b0010, 0b0010).unwrap();
        let probe = cpu.into_probe();
        assert_eq!(probe.value("irq").and_then(LogicVec::to_u64), Some(0b1010));
    }

    #[test]
    fn set_irqs_flips_on_write() {
        let mut config = config();
        config.signals.flip = true;
        let probe = MemoryProbe::new().with_signal("irq", LogicVec::from_u64(0, 4));
        let mut cpu = Processor::new(probe, &config);
        cpu.set_irqs(0b0001, 0b0001).unwrap();
        let probe = cpu.into_probe();
        assert_eq!(probe.value("irq").and_then(LogicVec::to_u64), Some(0b1000));
    }
}
