//! IEEE 1164 four-state logic values as reported by a simulator probe.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single 4-state logic value.
///
/// Simulators that model the full nine-valued `std_logic` are folded onto
/// these four states: strong and weak drivers become `Zero`/`One`,
/// uninitialized, unknown and don't-care become `X`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum Logic {
    /// Logic low (0).
    #[default]
    Zero,
    /// Logic high (1).
    One,
    /// Unknown or uninitialized.
    X,
    /// High-impedance (tri-state).
    Z,
}

impl Logic {
    /// Converts a character to a [`Logic`] value.
    ///
    /// Accepts the VCD characters `0`, `1`, `x`, `z` and the `std_logic`
    /// characters `U`, `W`, `L`, `H`, `-` in either case.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0' | 'l' | 'L' => Some(Logic::Zero),
            '1' | 'h' | 'H' => Some(Logic::One),
            'x' | 'X' | 'u' | 'U' | 'w' | 'W' | '-' => Some(Logic::X),
            'z' | 'Z' => Some(Logic::Z),
            _ => None,
        }
    }

    /// Returns `true` for `Zero` and `One`.
    pub fn is_definite(self) -> bool {
        matches!(self, Logic::Zero | Logic::One)
    }

    /// Returns the bit value if this logic value is definite.
    pub fn to_bit(self) -> Option<bool> {
        match self {
            Logic::Zero => Some(false),
            Logic::One => Some(true),
            Logic::X | Logic::Z => None,
        }
    }
}

impl From<bool> for Logic {
    fn from(bit: bool) -> Self {
        if bit {
            Logic::One
        } else {
            Logic::Zero
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Logic::Zero => write!(f, "0"),
            Logic::One => write!(f, "1"),
            Logic::X => write!(f, "X"),
            Logic::Z => write!(f, "Z"),
        }
    }
}
