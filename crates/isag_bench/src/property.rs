//! Assertion operands and their evaluation against a processor state.
//!
//! An operand is one of:
//!
//! - a register slice `r<n>[hi:lo]` or `s<n>[hi:lo]`; `[b]` selects a single
//!   bit and no range selects the whole word,
//! - a constant, decimal or `0x` hexadecimal,
//! - the program counter, `pc`.
//!
//! Operands are resolved through the bench's [`AliasTable`] before parsing,
//! and every index is checked against the [`ArchConfig`] at parse time so
//! evaluation can only fail on values the simulator left undefined.

use std::fmt;

use isag_config::ArchConfig;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::alias::AliasTable;
use crate::error::{EvalError, PropertyError};
use crate::state::ProcessorState;

static REGISTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<kind>[rRsS])(?P<index>\d+)$").expect("register regex"));

/// An inclusive bit range of one register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterSlice {
    /// Register number.
    pub index: usize,
    /// Most significant bit of the slice.
    pub hi: u32,
    /// Least significant bit of the slice.
    pub lo: u32,
}

impl RegisterSlice {
    /// Extracts the slice from a register value.
    pub fn extract(&self, value: u64) -> u64 {
        (value >> self.lo) & ArchConfig::mask(self.hi - self.lo + 1)
    }
}

/// A value an assertion compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    /// A literal value.
    Constant(u64),
    /// The program counter.
    ProgramCounter,
    /// A slice of a general register.
    GeneralRegister(RegisterSlice),
    /// A slice of a special register.
    SpecialRegister(RegisterSlice),
}

impl Property {
    /// Evaluates the property against a sampled state.
    pub fn evaluate(&self, state: &ProcessorState) -> Result<u64, EvalError> {
        match self {
            Property::Constant(value) => Ok(*value),
            Property::ProgramCounter => state.pc.ok_or_else(|| EvalError::Unknown {
                operand: self.to_string(),
            }),
            Property::GeneralRegister(slice) => {
                self.read_slice(state.gp_registers.get(slice.index), slice)
            }
            Property::SpecialRegister(slice) => {
                self.read_slice(state.sp_registers.get(slice.index), slice)
            }
        }
    }

    fn read_slice(
        &self,
        entry: Option<&Option<u64>>,
        slice: &RegisterSlice,
    ) -> Result<u64, EvalError> {
        match entry {
            None => Err(EvalError::Missing {
                operand: self.to_string(),
            }),
            Some(None) => Err(EvalError::Unknown {
                operand: self.to_string(),
            }),
            Some(Some(value)) => Ok(slice.extract(*value)),
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::Constant(value) => write!(f, "{value:#x}"),
            Property::ProgramCounter => write!(f, "pc"),
            Property::GeneralRegister(s) => write!(f, "r{}[{}:{}]", s.index, s.hi, s.lo),
            Property::SpecialRegister(s) => write!(f, "s{}[{}:{}]", s.index, s.hi, s.lo),
        }
    }
}

/// Parses operands for one bench under a fixed architecture.
#[derive(Debug, Clone, Copy)]
pub struct PropertyParser<'a> {
    arch: &'a ArchConfig,
    aliases: &'a AliasTable,
}

impl<'a> PropertyParser<'a> {
    /// Creates a parser resolving names through `aliases`.
    pub fn new(arch: &'a ArchConfig, aliases: &'a AliasTable) -> Self {
        Self { arch, aliases }
    }

    /// Parses one operand as written in a directive.
    pub fn parse(&self, raw: &str) -> Result<Property, PropertyError> {
        let operand = self.aliases.resolve(raw);
        let has_range = operand.start.is_some() || operand.end.is_some();

        if let Some(caps) = REGISTER_RE.captures(&operand.base) {
            let index = parse_decimal(&caps["index"])?;
            let special = caps["kind"].eq_ignore_ascii_case("s");
            let count = if special {
                self.arch.sp_registers
            } else {
                self.arch.gp_registers
            };
            if index >= count {
                return Err(PropertyError::RegisterOutOfRange {
                    name: operand.base.clone(),
                    count,
                });
            }

            let (hi, lo) = match (&operand.start, &operand.end) {
                (None, None) => {
                    let msb = self.arch.word_size.checked_sub(1).ok_or(
                        PropertyError::BitOutOfRange {
                            bit: 0,
                            word_size: 0,
                        },
                    )?;
                    (msb, 0)
                }
                (Some(bit), None) | (None, Some(bit)) => {
                    let bit = self.parse_bit(bit)?;
                    (bit, bit)
                }
                (Some(start), Some(end)) => (self.parse_bit(start)?, self.parse_bit(end)?),
            };
            if hi < lo {
                return Err(PropertyError::ReversedRange { start: hi, end: lo });
            }

            let slice = RegisterSlice { index, hi, lo };
            return Ok(if special {
                Property::SpecialRegister(slice)
            } else {
                Property::GeneralRegister(slice)
            });
        }

        let unknown = || PropertyError::UnknownOperand {
            token: operand.to_string(),
            original: raw.trim().to_string(),
        };
        if has_range {
            return Err(unknown());
        }

        let base = operand.base.as_str();
        if let Some(hex) = base
            .strip_prefix("0x")
            .or_else(|| base.strip_prefix("0X"))
        {
            let invalid = || PropertyError::InvalidNumber {
                text: base.to_string(),
            };
            if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            return u64::from_str_radix(hex, 16)
                .map(Property::Constant)
                .map_err(|_| invalid());
        }
        if !base.is_empty() && base.bytes().all(|b| b.is_ascii_digit()) {
            return base
                .parse::<u64>()
                .map(Property::Constant)
                .map_err(|_| PropertyError::InvalidNumber {
                    text: base.to_string(),
                });
        }
        if base
            .get(..2)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("pc"))
        {
            return Ok(Property::ProgramCounter);
        }
        Err(unknown())
    }

    fn parse_bit(&self, text: &str) -> Result<u32, PropertyError> {
        let digits = text.trim();
        let bit = digits
            .bytes()
            .all(|b| b.is_ascii_digit())
            .then(|| digits.parse::<u32>().ok())
            .flatten()
            .ok_or_else(|| PropertyError::InvalidNumber {
                text: text.to_string(),
            })?;
        if bit >= self.arch.word_size {
            return Err(PropertyError::BitOutOfRange {
                bit,
                word_size: self.arch.word_size,
            });
        }
        Ok(bit)
    }
}

fn parse_decimal(text: &str) -> Result<usize, PropertyError> {
    text.parse().map_err(|_| PropertyError::InvalidNumber {
        text: text.to_string(),
    })
}
