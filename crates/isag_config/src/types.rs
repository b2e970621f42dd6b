//! Configuration types deserialized from `isag.toml`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The complete runner configuration.
///
/// Every section is optional in the file; missing sections and fields take
/// the defaults of the reference processor wrapper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Processor architecture parameters.
    #[serde(default)]
    pub arch: ArchConfig,
    /// Simulator signal paths used to sample and drive the processor.
    #[serde(default)]
    pub signals: SignalPaths,
    /// Run-loop timing.
    #[serde(default)]
    pub run: RunConfig,
}

/// Architecture parameters of the processor under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchConfig {
    /// Register width in bits (1 to 64).
    pub word_size: u32,
    /// Number of general-purpose registers (`r0`, `r1`, ...).
    pub gp_registers: usize,
    /// Number of special registers (`s0`, `s1`, ...).
    pub sp_registers: usize,
    /// Number of interrupt request lines.
    pub irq_lines: u32,
    /// Size of one encoded instruction in bytes.
    pub instr_size_bytes: usize,
    /// Address units per instruction; the program counter divided by the
    /// stride gives the instruction index.
    pub stride: u64,
    /// Byte order of instruction words in the assembled image.
    pub endianness: Endianness,
}

impl Default for ArchConfig {
    fn default() -> Self {
        Self {
            word_size: 32,
            gp_registers: 16,
            sp_registers: 4,
            irq_lines: 4,
            instr_size_bytes: 4,
            stride: 4,
            endianness: Endianness::Big,
        }
    }
}

impl ArchConfig {
    /// Number of hex digits needed to print one register value.
    pub fn hex_digits(&self) -> usize {
        self.word_size.div_ceil(4) as usize
    }

    /// Mask selecting the low `bits` bits; full mask for 64 or more.
    pub fn mask(bits: u32) -> u64 {
        if bits >= 64 {
            u64::MAX
        } else {
            (1u64 << bits) - 1
        }
    }

    /// Mask covering every configured IRQ line.
    pub fn irq_mask(&self) -> u64 {
        Self::mask(self.irq_lines)
    }
}

/// Byte order of instruction words.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    /// Most significant byte first (default).
    #[default]
    Big,
    /// Least significant byte first.
    Little,
}

impl FromStr for Endianness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "big" | "be" | "1" | "true" => Ok(Endianness::Big),
            "little" | "le" | "0" | "false" => Ok(Endianness::Little),
            other => Err(format!("unknown endianness '{other}'")),
        }
    }
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endianness::Big => write!(f, "big"),
            Endianness::Little => write!(f, "little"),
        }
    }
}

/// Hierarchical simulator paths of the processor signals.
///
/// Register paths are templates: `{index}` expands to the register number
/// and `{msb}` to `word_size - 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalPaths {
    /// Program counter of the instruction being issued.
    pub pc: String,
    /// General register file entry template.
    pub gp_register: String,
    /// Special register entry template.
    pub sp_register: String,
    /// Interrupt request input vector.
    pub irq: String,
    /// Optional "instruction valid" strobe; cycles where it is low are
    /// skipped by the run loop. An empty string disables it.
    pub instr_valid: Option<String>,
    /// Reverse the bit order of every vector read from or written to the
    /// simulator.
    pub flip: bool,
}

impl Default for SignalPaths {
    fn default() -> Self {
        Self {
            pc: "UUT/pcs(1)".to_string(),
            gp_register: "UUT/gprf/ISO_REG_FILE_INST/ram({index})({msb}:0)".to_string(),
            sp_register: "UUT/state_1.rs({index})({msb}:0)".to_string(),
            irq: "irq".to_string(),
            instr_valid: Some("UUT/instr_valid(1)".to_string()),
            flip: true,
        }
    }
}

impl SignalPaths {
    /// Expands the general register template for `index`.
    pub fn gp_register_path(&self, index: usize, word_size: u32) -> String {
        expand_register_path(&self.gp_register, index, word_size)
    }

    /// Path of the instruction-valid strobe, if one is configured.
    pub fn instr_valid_path(&self) -> Option<&str> {
        self.instr_valid.as_deref().filter(|path| !path.trim().is_empty())
    }

    /// Expands the special register template for `index`.
    pub fn sp_register_path(&self, index: usize, word_size: u32) -> String {
        expand_register_path(&self.sp_register, index, word_size)
    }
}

fn expand_register_path(template: &str, index: usize, word_size: u32) -> String {
    template
        .replace("{index}", &index.to_string())
        .replace("{msb}", &word_size.saturating_sub(1).to_string())
}

/// Timing of the cycle loop, in simulator time units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Time units per processor clock cycle.
    pub cycle_time: u64,
    /// Time units to advance after start so sampling happens just past the
    /// clock edge.
    pub settle_time: u64,
    /// Length of one simulator time unit (e.g. `"1ns"`), used when replaying
    /// recorded traces.
    pub time_unit: String,
    /// Stop with an error after this many cycles without reaching `#end`.
    pub max_cycles: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            cycle_time: 10,
            settle_time: 1,
            time_unit: "1ns".to_string(),
            max_cycles: None,
        }
    }
}
