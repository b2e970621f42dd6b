//! Vectors of 4-state logic values as read from and written to simulator signals.

use crate::logic::Logic;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A vector of [`Logic`] values, index 0 being the least significant bit.
///
/// Some simulators report vectors declared `(0 to N)` or sampled through a
/// console in the opposite bit order; [`flip`](Self::flip) reverses the
/// vector before it is converted with [`to_u64`](Self::to_u64).
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LogicVec {
    bits: Vec<Logic>,
}

impl LogicVec {
    /// Creates a vector of the given width with every bit `Zero`.
    pub fn new(width: u32) -> Self {
        Self {
            bits: vec![Logic::Zero; width as usize],
        }
    }

    /// Creates a vector of the given width with every bit set to `value`.
    pub fn filled(width: u32, value: Logic) -> Self {
        Self {
            bits: vec![value; width as usize],
        }
    }

    /// Returns the number of bits in this vector.
    pub fn width(&self) -> u32 {
        self.bits.len() as u32
    }

    /// Gets the logic value at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn get(&self, index: u32) -> Logic {
        assert!(
            index < self.width(),
            "index {index} out of bounds for width {}",
            self.width()
        );
        self.bits[index as usize]
    }

    /// Sets the logic value at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn set(&mut self, index: u32, value: Logic) {
        assert!(
            index < self.width(),
            "index {index} out of bounds for width {}",
            self.width()
        );
        self.bits[index as usize] = value;
    }

    /// Creates a vector from the low `width` bits of `value`.
    ///
    /// Bits above 64 are `Zero`.
    pub fn from_u64(value: u64, width: u32) -> Self {
        let bits = (0..width)
            .map(|i| Logic::from(i < 64 && (value >> i) & 1 != 0))
            .collect();
        Self { bits }
    }

    /// Converts the vector to an integer if every bit is definite.
    ///
    /// Returns `None` if any bit is `X` or `Z`, or if a bit above index 63
    /// is set.
    pub fn to_u64(&self) -> Option<u64> {
        let mut result = 0u64;
        for (i, bit) in self.bits.iter().enumerate() {
            if bit.to_bit()? {
                if i >= 64 {
                    return None;
                }
                result |= 1 << i;
            }
        }
        Some(result)
    }

    /// Converts the vector to an integer, treating `X` and `Z` bits as zero.
    ///
    /// Bits above index 63 are dropped.
    pub fn to_u64_lossy(&self) -> u64 {
        self.bits
            .iter()
            .take(64)
            .enumerate()
            .filter(|(_, bit)| **bit == Logic::One)
            .fold(0u64, |acc, (i, _)| acc | (1 << i))
    }

    /// Returns `true` if no bit is `X` or `Z`.
    pub fn is_definite(&self) -> bool {
        self.bits.iter().all(|b| b.is_definite())
    }

    /// Returns a copy of this vector with the bit order reversed.
    pub fn flip(&self) -> Self {
        let mut bits = self.bits.clone();
        bits.reverse();
        Self { bits }
    }

    /// Parses a binary string such as `"10XZ"`, most significant bit first.
    ///
    /// Accepts every character [`Logic::from_char`] does, so `std_logic`
    /// renderings like `"UU01"` parse as well. Returns `None` on any other
    /// character.
    pub fn from_binary_str(s: &str) -> Option<Self> {
        let bits = s
            .chars()
            .rev()
            .map(Logic::from_char)
            .collect::<Option<Vec<_>>>()?;
        Some(Self { bits })
    }

    /// Returns a copy resized to `width`, extending with `fill` or truncating
    /// the most significant bits.
    pub fn resized(&self, width: u32, fill: Logic) -> Self {
        let mut bits = self.bits.clone();
        bits.resize(width as usize, fill);
        Self { bits }
    }

    /// Iterates over the bits from least to most significant.
    pub fn iter(&self) -> impl Iterator<Item = Logic> + '_ {
        self.bits.iter().copied()
    }
}

impl fmt::Display for LogicVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.bits.iter().rev() {
            write!(f, "{bit}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for LogicVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogicVec({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_zero() {
        let v = LogicVec::new(8);
        assert_eq!(v.width(), 8);
        assert_eq!(v.to_u64(), Some(0));
    }

    #[test]
    fn from_u64_to_u64() {
        let v = LogicVec::from_u64(0xA5, 8);
        assert_eq!(format!("{v}"), "10100101");
        assert_eq!(v.to_u64(), Some(0xA5));
    }

    #[test]
    fn from_u64_truncates_to_width() {
        let v = LogicVec::from_u64(0x1FF, 4);
        assert_eq!(v.to_u64(), Some(0xF));
    }

    #[test]
    fn full_64_bit_value() {
        let v = LogicVec::from_u64(u64::MAX, 64);
        assert_eq!(v.to_u64(), Some(u64::MAX));
    }

    #[test]
    fn wide_vector_with_high_bit_set_does_not_convert() {
        let mut v = LogicVec::new(70);
        v.set(68, Logic::One);
        assert_eq!(v.to_u64(), None);
        assert_eq!(v.to_u64_lossy(), 0);
    }

    #[test]
    fn unknown_bits_block_conversion() {
        let v = LogicVec::from_binary_str("10X1").unwrap();
        assert_eq!(v.to_u64(), None);
        assert!(!v.is_definite());
        assert_eq!(v.to_u64_lossy(), 0b1001);
    }

    #[test]
    fn flip_reverses_bit_order() {
        let v = LogicVec::from_binary_str("0001").unwrap();
        assert_eq!(v.flip().to_u64(), Some(0b1000));
        assert_eq!(v.flip().flip(), v);
    }

    #[test]
    fn from_binary_str_msb_first() {
        let v = LogicVec::from_binary_str("10XZ").unwrap();
        assert_eq!(v.get(3), Logic::One);
        assert_eq!(v.get(2), Logic::Zero);
        assert_eq!(v.get(1), Logic::X);
        assert_eq!(v.get(0), Logic::Z);
    }

    #[test]
    fn from_binary_str_std_logic() {
        let v = LogicVec::from_binary_str("UU01").unwrap();
        assert_eq!(format!("{v}"), "XX01");
    }

    #[test]
    fn from_binary_str_invalid() {
        assert!(LogicVec::from_binary_str("10A1").is_none());
    }

    #[test]
    fn resized_extends_and_truncates() {
        let v = LogicVec::from_u64(0b101, 3);
        assert_eq!(v.resized(6, Logic::Zero).to_u64(), Some(0b101));
        assert_eq!(v.resized(2, Logic::Zero).to_u64(), Some(0b01));
        assert_eq!(format!("{}", v.resized(4, Logic::X)), "X101");
    }

    #[test]
    fn set_get() {
        let mut v = LogicVec::new(4);
        v.set(2, Logic::Z);
        assert_eq!(v.get(2), Logic::Z);
        assert_eq!(v.get(0), Logic::Zero);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn get_out_of_bounds_panics() {
        LogicVec::new(2).get(2);
    }

    #[test]
    fn debug_format() {
        let v = LogicVec::from_binary_str("1Z").unwrap();
        assert_eq!(format!("{v:?}"), "LogicVec(1Z)");
    }

    #[test]
    fn serde_roundtrip() {
        let v = LogicVec::from_binary_str("10XZ1010").unwrap();
        let json = serde_json::to_string(&v).unwrap();
        let back: LogicVec = serde_json::from_str(&json).unwrap();
        assert_eq!(v, back);
    }
}
