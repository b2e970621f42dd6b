//! `isag image`: render an assembled binary into a VHDL test bench template.

use isag_bench::{fill_template, render_data_array};

use crate::pipeline::{resolve_config, write_output};
use crate::{GlobalArgs, ImageArgs};

/// Runs the `isag image` command.
pub fn run(args: &ImageArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = resolve_config(global)?;
    let code = std::fs::read(&args.bin).map_err(|e| format!("cannot read {}: {e}", args.bin))?;
    let template = std::fs::read_to_string(&args.template)
        .map_err(|e| format!("cannot read {}: {e}", args.template))?;

    if code.len() % config.arch.instr_size_bytes != 0 {
        log::warn!(
            "{}: {} trailing bytes do not fill an instruction and are dropped",
            args.bin,
            code.len() % config.arch.instr_size_bytes
        );
    }
    let data = render_data_array(&code, &config.arch);
    let filled = fill_template(&template, &data).map_err(|e| format!("{}: {e}", args.template))?;
    write_output(args.output.as_deref(), &filled)?;
    Ok(0)
}
