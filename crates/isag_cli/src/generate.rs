//! `isag generate`: assemble a test bench and render its VHDL image.
//!
//! The instruction stream is extracted from the bench, assembled with the
//! `$CROSS_COMPILE` toolchain and rendered into the template in one step.

use std::path::Path;

use isag_bench::{fill_template, render_data_array};

use crate::pipeline::{load_bench, resolve_config, write_output};
use crate::toolchain::Toolchain;
use crate::{GenerateArgs, GlobalArgs};

/// Runs the `isag generate` command.
pub fn run(args: &GenerateArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = resolve_config(global)?;
    let template = std::fs::read_to_string(&args.template)
        .map_err(|e| format!("cannot read {}: {e}", args.template))?;
    let bench = load_bench(Path::new(&args.bench), &args.source, &config.arch)?;

    let code = Toolchain::from_env().assemble(&bench.generate_assembly())?;
    log::info!(
        "{}: assembled {} instructions into {} bytes",
        args.bench,
        bench.instructions().len(),
        code.len()
    );

    let data = render_data_array(&code, &config.arch);
    let filled = fill_template(&template, &data).map_err(|e| format!("{}: {e}", args.template))?;
    write_output(args.output.as_deref(), &filled)?;
    Ok(0)
}
