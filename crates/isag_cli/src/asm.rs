//! `isag asm`: print the instruction stream of a test bench.

use std::path::Path;

use crate::pipeline::{load_bench, resolve_config, write_output};
use crate::{AsmArgs, GlobalArgs};

/// Runs the `isag asm` command.
///
/// Each instruction is printed on its own line, tagged with its index.
pub fn run(args: &AsmArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = resolve_config(global)?;
    let bench = load_bench(Path::new(&args.bench), &args.source, &config.arch)?;
    write_output(args.output.as_deref(), &bench.generate_assembly())?;
    Ok(0)
}
