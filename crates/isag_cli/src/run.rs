//! `isag run`: check test benches against a recorded simulation.
//!
//! The VCD trace is loaded once and replayed for every bench through a
//! fresh [`VcdReplayProbe`]. Reports go to stdout as text or JSON; the exit
//! code is 0 only when every bench passed.

use std::path::Path;

use isag_bench::{BenchReport, Processor, Runner};
use isag_config::RunnerConfig;
use isag_probe::time::parse_time_unit;
use isag_probe::{load_vcd_file, LoadedWaveform, VcdReplayProbe};

use crate::pipeline::{bench_name, load_bench, resolve_config};
use crate::{GlobalArgs, ReportFormat, RunArgs, SourceArgs};

/// Runs the `isag run` command.
pub fn run(args: &RunArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = resolve_config(global)?;
    let fs_per_unit = parse_time_unit(&config.run.time_unit)
        .map_err(|e| format!("run.time_unit: {e}"))?;
    let waveform = load_vcd_file(Path::new(&args.trace))
        .map_err(|e| format!("{}: {e}", args.trace))?;
    log::info!(
        "loaded {} signals from {}",
        waveform.signals.len(),
        args.trace
    );

    let max_cycles = args.max_cycles.or(config.run.max_cycles);
    let reports: Vec<BenchReport> = args
        .benches
        .iter()
        .map(|bench| {
            run_bench(
                Path::new(bench),
                &args.source,
                &config,
                &waveform,
                fs_per_unit,
                max_cycles,
            )
        })
        .collect();

    let failed = reports.iter().filter(|r| !r.is_passed()).count();
    match args.format {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        ReportFormat::Text => {
            for report in &reports {
                if !global.quiet || !report.is_passed() {
                    print!("{report}");
                }
            }
            if !global.quiet {
                eprintln!(
                    "   {} passed, {failed} failed",
                    reports.len() - failed
                );
            }
        }
    }

    Ok(if failed == 0 { 0 } else { 1 })
}

/// Loads and runs one bench. Load and run errors end up in the report.
fn run_bench(
    path: &Path,
    source: &SourceArgs,
    config: &RunnerConfig,
    waveform: &LoadedWaveform,
    fs_per_unit: u64,
    max_cycles: Option<u64>,
) -> BenchReport {
    let name = bench_name(path);
    let mut bench = match load_bench(path, source, &config.arch) {
        Ok(bench) => bench,
        Err(e) => return BenchReport::errored(name, e),
    };

    let probe = VcdReplayProbe::new(waveform.clone(), fs_per_unit);
    let mut processor = Processor::new(probe, config);
    let mut runner = Runner::new(config).with_max_cycles(max_cycles);

    match runner.run(&mut bench, &mut processor) {
        Ok(cycles) => BenchReport::new(name, &bench, cycles, None),
        Err(e) => {
            log::error!("{name}: {e}");
            BenchReport::new(name, &bench, processor.cycles(), Some(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const CONFIG: &str = "\
[arch]
gp_registers = 1
sp_registers = 0

[signals]
pc = \"UUT/pc\"
gp_register = \"UUT/r{index}\"
irq = \"UUT/irq\"
instr_valid = \"\"
flip = false

[run]
cycle_time = 10
settle_time = 1
time_unit = \"1ns\"
";

    /// A core that issues one instruction every 10ns with r0 = 0x10.
    const TRACE: &str = "\
$timescale 1ns $end
$scope module tb $end
$scope module UUT $end
$var wire 32 ! pc $end
$var wire 32 \" r0 $end
$var wire 4 # irq $end
$upscope $end
$upscope $end
$enddefinitions $end
#0
b0 !
b10000 \"
b0 #
#10
b100 !
#20
b1000 !
#30
b1100 !
#40
b10000 !
#50
";

    struct Project {
        dir: TempDir,
    }

    impl Project {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            fs::write(dir.path().join("isag.toml"), CONFIG).unwrap();
            fs::write(dir.path().join("trace.vcd"), TRACE).unwrap();
            Self { dir }
        }

        fn bench(&self, name: &str, text: &str) -> String {
            let path = self.dir.path().join(name);
            fs::write(&path, text).unwrap();
            path.display().to_string()
        }

        fn run(&self, benches: Vec<String>, max_cycles: Option<u64>) -> i32 {
            let args = RunArgs {
                benches,
                trace: self.dir.path().join("trace.vcd").display().to_string(),
                max_cycles,
                format: ReportFormat::Json,
                source: SourceArgs::default(),
            };
            let global = GlobalArgs {
                quiet: true,
                verbose: false,
                config: Some(self.dir.path().display().to_string()),
            };
            run(&args, &global).unwrap()
        }

        fn report(&self, bench: &str) -> BenchReport {
            let config = isag_config::load_config_from_str(CONFIG).unwrap();
            let waveform = load_vcd_file(&self.dir.path().join("trace.vcd")).unwrap();
            run_bench(
                Path::new(bench),
                &SourceArgs::default(),
                &config,
                &waveform,
                parse_time_unit("1ns").unwrap(),
                None,
            )
        }
    }

    #[test]
    fn passing_bench() {
        let project = Project::new();
        let bench = project.bench("ok.S", "nop\n#assert(r0==0x10)\nnop\n#end()\n");
        let report = project.report(&bench);
        assert!(report.is_passed(), "{report}");
        assert_eq!(report.name, "ok.S");
        assert_eq!(report.cycles, 2);
        assert_eq!(project.run(vec![bench], None), 0);
    }

    #[test]
    fn failing_assertion_fails_the_run() {
        let project = Project::new();
        let ok = project.bench("ok.S", "nop\n#assert(r0==0x10)\nnop\n#end()\n");
        let bad = project.bench("bad.S", "nop\n#assert(r0==0x11)\nnop\n#end()\n");
        let report = project.report(&bad);
        assert_eq!(
            report.failures,
            ["Assertion failed 0x00000000@1, 'r0==0x11' <> '00000010 == 00000011'"]
        );
        assert_eq!(project.run(vec![ok, bad], None), 1);
    }

    #[test]
    fn trace_ending_before_end_directive() {
        let project = Project::new();
        let bench = project.bench("long.S", "nop\n#assert(r0==0x10)\nnop\n#end@10()\n");
        let report = project.report(&bench);
        assert!(!report.is_passed());
        assert!(report.error.is_some());
        assert_eq!(report.passed, 1);
    }

    #[test]
    fn cycle_limit_from_flag() {
        let project = Project::new();
        let bench = project.bench("slow.S", "nop\n#assert(r0==0x10)\nnop\n#end@3()\n");
        assert_eq!(project.run(vec![bench.clone()], Some(2)), 1);
        assert_eq!(project.run(vec![bench], None), 0);
    }

    #[test]
    fn unparsable_bench_is_reported() {
        let project = Project::new();
        let bench = project.bench("broken.S", "nop\n#assert(r99==0)\n");
        let report = project.report(&bench);
        assert!(!report.is_passed());
        assert!(report.error.unwrap().contains("broken.S"));
    }

    #[test]
    fn missing_trace_is_an_error() {
        let project = Project::new();
        let args = RunArgs {
            benches: vec![project.bench("ok.S", "nop\n#end()\n")],
            trace: project.dir.path().join("missing.vcd").display().to_string(),
            max_cycles: None,
            format: ReportFormat::Text,
            source: SourceArgs::default(),
        };
        let global = GlobalArgs {
            quiet: true,
            verbose: false,
            config: Some(project.dir.path().display().to_string()),
        };
        assert!(run(&args, &global).unwrap_err().to_string().contains("missing.vcd"));
    }
}
