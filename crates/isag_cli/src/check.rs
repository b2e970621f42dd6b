//! `isag check`: load test benches and summarise their contents.
//!
//! Every bench is parsed with the configured architecture. A bench that
//! fails to load is reported and the command exits with code 1 after
//! checking the rest.

use std::path::Path;

use isag_bench::{CommandKind, TestBench};

use crate::pipeline::{bench_name, load_bench, resolve_config};
use crate::{CheckArgs, GlobalArgs};

/// Runs the `isag check` command.
pub fn run(args: &CheckArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = resolve_config(global)?;
    let mut errors = 0;

    for bench in &args.benches {
        let path = Path::new(bench);
        match load_bench(path, &args.source, &config.arch) {
            Ok(loaded) => {
                if !global.quiet {
                    println!("{}: {}", bench_name(path), summarize(&loaded));
                }
                if global.verbose {
                    for todo in loaded.todos() {
                        println!("    {todo}");
                    }
                }
            }
            Err(e) => {
                eprintln!("error: {e}");
                errors += 1;
            }
        }
    }

    Ok(if errors == 0 { 0 } else { 1 })
}

/// One-line description of a loaded bench.
fn summarize(bench: &TestBench) -> String {
    let mut asserts = 0;
    let mut irqs = 0;
    let mut ends = 0;
    for command in bench.commands() {
        match command.kind {
            CommandKind::Assert(_) => asserts += 1,
            CommandKind::Irq(_) => irqs += 1,
            CommandKind::End => ends += 1,
        }
    }

    let mut summary = format!(
        "{} instructions, {asserts} assertions, {irqs} irqs, {} aliases",
        bench.instructions().len(),
        bench.aliases().len()
    );
    if ends == 0 {
        summary.push_str(" (no end directive)");
    }
    if !bench.todos().is_empty() {
        summary.push_str(&format!(", {} todos", bench.todos().len()));
    }
    summary
}
