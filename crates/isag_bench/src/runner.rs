//! The run loop tying a test bench to a simulated processor.

use isag_config::RunnerConfig;
use isag_probe::SignalProbe;

use crate::bench::TestBench;
use crate::error::RunError;
use crate::processor::Processor;
use crate::scheduler::Scheduler;

/// Drives one test bench to completion.
#[derive(Debug, Clone)]
pub struct Runner {
    scheduler: Scheduler,
    max_cycles: Option<u64>,
}

impl Runner {
    /// Creates a runner with the architecture and cycle budget of `config`.
    pub fn new(config: &RunnerConfig) -> Self {
        Self {
            scheduler: Scheduler::new(&config.arch),
            max_cycles: config.run.max_cycles,
        }
    }

    /// Overrides the cycle budget. `None` runs until `#end`.
    pub fn with_max_cycles(mut self, max_cycles: Option<u64>) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    /// Runs `bench` on `processor` until an `end` command fires.
    ///
    /// The bench counters are reset first. Returns the number of cycles
    /// simulated.
    pub fn run<P: SignalProbe>(
        &mut self,
        bench: &mut TestBench,
        processor: &mut Processor<P>,
    ) -> Result<u64, RunError> {
        bench.reset();
        self.scheduler.clear();
        let start = processor.cycles();

        processor.settle()?;
        log::info!(
            "running {} commands over {} instructions",
            bench.commands().len(),
            bench.instructions().len()
        );

        loop {
            processor
                .run_to_next_valid_instruction(self.limit(start))
                .map_err(|e| match e {
                    RunError::CycleLimit { .. } => RunError::CycleLimit {
                        limit: self.max_cycles.unwrap_or_default(),
                    },
                    other => other,
                })?;
            self.scheduler.step(bench, processor)?;
            if bench.is_complete() {
                break;
            }
            if let Some(limit) = self.max_cycles {
                if processor.cycles() - start >= limit {
                    return Err(RunError::CycleLimit { limit });
                }
            }
            processor.run_cycle()?;
        }

        let cycles = processor.cycles() - start;
        log::info!(
            "test bench complete after {cycles} cycles: {} passed, {} failed",
            bench.passed(),
            bench.failed()
        );
        Ok(cycles)
    }

    fn limit(&self, start: u64) -> Option<u64> {
        self.max_cycles.map(|limit| start.saturating_add(limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isag_common::LogicVec;
    use isag_probe::{MemoryProbe, ProbeError};

    fn config() -> RunnerConfig {
        let mut config = RunnerConfig::default();
        config.arch.gp_registers = 1;
        config.arch.sp_registers = 0;
        config.signals.pc = "pc".into();
        config.signals.gp_register = "r{index}".into();
        config.signals.instr_valid = None;
        config.signals.flip = false;
        config
    }

    /// A probe whose program counter steps by 4 every 10 time units,
    /// starting at 0 just after settling.
    fn counting_probe(instructions: u64) -> MemoryProbe {
        let mut probe = MemoryProbe::new()
            .with_signal("pc", LogicVec::from_u64(0, 32))
            .with_signal("r0", LogicVec::from_u64(7, 32));
        for i in 1..instructions {
            probe.schedule(1 + 10 * i, "pc", LogicVec::from_u64(4 * i, 32));
        }
        probe
    }

    #[test]
    fn runs_until_end() {
        let config = config();
        let mut bench = TestBench::parse("nop\nnop\n#assert(r0==7)\nnop\n#end()", &config.arch).unwrap();
        let mut cpu = Processor::new(counting_probe(8), &config);
        let cycles = Runner::new(&config).run(&mut bench, &mut cpu).unwrap();

        assert!(bench.is_complete());
        assert_eq!((bench.passed(), bench.failed()), (1, 0));
        assert_eq!(cycles, 3);
    }

    #[test]
    fn stops_at_cycle_limit() {
        let config = config();
        let mut bench = TestBench::parse("nop\n#assert(r0==7)", &config.arch).unwrap();
        let mut cpu = Processor::new(counting_probe(4), &config);
        let err = Runner::new(&config)
            .with_max_cycles(Some(20))
            .run(&mut bench, &mut cpu)
            .unwrap_err();

        assert!(matches!(err, RunError::CycleLimit { limit: 20 }));
        assert_eq!(cpu.cycles(), 20);
        assert_eq!(bench.passed(), 1);
    }

    #[test]
    fn config_budget_is_used() {
        let mut config = config();
        config.run.max_cycles = Some(2);
        let mut bench = TestBench::parse("nop", &config.arch).unwrap();
        let mut cpu = Processor::new(counting_probe(4), &config);
        assert!(matches!(
            Runner::new(&config).run(&mut bench, &mut cpu),
            Err(RunError::CycleLimit { limit: 2 })
        ));
    }

    #[test]
    fn probe_errors_abort_the_run() {
        let config = config();
        let mut bench = TestBench::parse("nop\n#end()", &config.arch).unwrap();
        let mut cpu = Processor::new(MemoryProbe::new(), &config);
        let err = Runner::new(&config).run(&mut bench, &mut cpu).unwrap_err();
        assert!(matches!(
            err,
            RunError::Probe(ProbeError::UnknownSignal { .. })
        ));
    }

    #[test]
    fn rerun_resets_counters() {
        let config = config();
        let mut bench = TestBench::parse("nop\n#assert(r0==7)\n#end@2()", &config.arch).unwrap();
        let mut runner = Runner::new(&config);

        let mut cpu = Processor::new(counting_probe(4), &config);
        runner.run(&mut bench, &mut cpu).unwrap();
        let mut cpu = Processor::new(counting_probe(4), &config);
        runner.run(&mut bench, &mut cpu).unwrap();
        assert_eq!(bench.passed(), 1);
    }
}
