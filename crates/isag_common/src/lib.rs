//! Shared signal value types for the isag test bench runner.
//!
//! Simulators report signal state as vectors of IEEE 1164 logic values.
//! This crate provides the [`Logic`] scalar and the [`LogicVec`] vector,
//! including the bit-order reversal and integer conversions needed to turn
//! a probed signal into a register value.

#![warn(missing_docs)]

pub mod logic;
pub mod logic_vec;

pub use logic::Logic;
pub use logic_vec::LogicVec;
