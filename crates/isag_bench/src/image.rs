//! Rendering assembled machine code into the VHDL test bench template.
//!
//! The template carries a `##DATAARRAY` marker where the instruction memory
//! initialiser goes. Each instruction word becomes one
//! `ipif_addr_data_pair_format(x"<address>", x"<data>")` entry; a final
//! all-zero entry at address `FFFFFFFF` terminates the array.

use isag_config::{ArchConfig, Endianness};

use crate::error::TemplateError;

/// Marker replaced by [`fill_template`].
pub const DATA_ARRAY_MARKER: &str = "##DATAARRAY";

/// Renders machine code as VHDL address/data pairs.
///
/// Code is taken in `instr_size_bytes` blocks; a trailing partial block is
/// dropped. Blocks are byte-reversed for little-endian targets so the data
/// always reads most significant byte first.
pub fn render_data_array(code: &[u8], arch: &ArchConfig) -> String {
    let size = arch.instr_size_bytes.max(1);
    let mut out = String::new();

    for (n, block) in code.chunks_exact(size).enumerate() {
        let mut word = block.to_vec();
        if arch.endianness == Endianness::Little {
            word.reverse();
        }
        out.push_str(&format!(
            "\t\t\tipif_addr_data_pair_format(x\"{:08X}\", x\"{}\"),\n",
            n * size,
            hex(&word)
        ));
    }

    out.push_str(&format!(
        "\t\t\tipif_addr_data_pair_format(x\"FFFFFFFF\", x\"{}\")\n",
        hex(&vec![0; size])
    ));
    out
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

/// Substitutes the data array into a template.
pub fn fill_template(template: &str, data: &str) -> Result<String, TemplateError> {
    if !template.contains(DATA_ARRAY_MARKER) {
        return Err(TemplateError::MissingMarker {
            marker: DATA_ARRAY_MARKER,
        });
    }
    Ok(template.replace(DATA_ARRAY_MARKER, data))
}
