//! A snapshot of the architectural state of the processor under test.

/// Program counter and register contents sampled in one cycle.
///
/// Entries are `None` when the simulator reported undefined bits, so an
/// assertion against them can fail loudly instead of comparing garbage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessorState {
    /// Byte address of the instruction being issued.
    pub pc: Option<u64>,
    /// General registers `r0..`.
    pub gp_registers: Vec<Option<u64>>,
    /// Special registers `s0..`.
    pub sp_registers: Vec<Option<u64>>,
}

impl ProcessorState {
    /// Creates a fully known state.
    pub fn known(pc: u64, gp_registers: &[u64], sp_registers: &[u64]) -> Self {
        Self {
            pc: Some(pc),
            gp_registers: gp_registers.iter().copied().map(Some).collect(),
            sp_registers: sp_registers.iter().copied().map(Some).collect(),
        }
    }

    /// Instruction index of the program counter for the given stride.
    pub fn instruction_address(&self, stride: u64) -> Option<u64> {
        self.pc.map(|pc| pc / stride.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_address_divides_by_stride() {
        let state = ProcessorState::known(12, &[], &[]);
        assert_eq!(state.instruction_address(4), Some(3));
        assert_eq!(state.instruction_address(1), Some(12));
    }

    #[test]
    fn unknown_pc_has_no_address() {
        let state = ProcessorState::default();
        assert_eq!(state.instruction_address(4), None);
    }
}
