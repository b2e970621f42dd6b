//! Error types for test bench loading, operand parsing and execution.

use isag_probe::ProbeError;

/// Errors from parsing an operand into a [`Property`](crate::Property).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropertyError {
    /// The token is not a register, constant or program counter reference.
    #[error("unknown operand '{token}' (from '{original}')")]
    UnknownOperand {
        /// The token after alias substitution.
        token: String,
        /// The operand as written.
        original: String,
    },

    /// A register index beyond the configured register count.
    #[error("register {name} out of range, {count} available")]
    RegisterOutOfRange {
        /// The register as written after substitution, e.g. `r16`.
        name: String,
        /// Number of registers of that kind.
        count: usize,
    },

    /// A bit position at or above the word size.
    #[error("bit {bit} out of range for {word_size}-bit registers")]
    BitOutOfRange {
        /// The offending bit position.
        bit: u32,
        /// Configured register width.
        word_size: u32,
    },

    /// A bit range written low-to-high.
    #[error("reversed bit range [{start}:{end}]")]
    ReversedRange {
        /// First bit of the range.
        start: u32,
        /// Last bit of the range.
        end: u32,
    },

    /// A malformed number in an index, bit position or constant.
    #[error("invalid number '{text}'")]
    InvalidNumber {
        /// The text that failed to parse.
        text: String,
    },
}

/// Errors from parsing a single directive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectiveError {
    /// The directive type is not one of `end`, `assert`, `test`, `skip`, `alias`, `irq`.
    #[error("unknown directive type '{kind}'")]
    UnknownType {
        /// The type as written.
        kind: String,
    },

    /// A known directive type without a well-formed `(...)` body.
    #[error("malformed directive '{text}'")]
    MalformedDirective {
        /// The statement as written.
        text: String,
    },

    /// The `@cycles` offset is not a non-negative integer.
    #[error("invalid cycle offset '{cycles}'")]
    InvalidCycles {
        /// The offset as written.
        cycles: String,
    },

    /// Assert content without an `==` or `!=` comparison.
    #[error("malformed assertion '{text}'")]
    MalformedAssert {
        /// The directive content.
        text: String,
    },

    /// An operand of an assertion failed to parse.
    #[error("invalid operand in '{text}': {source}")]
    Operand {
        /// The directive content.
        text: String,
        /// The operand error.
        #[source]
        source: PropertyError,
    },

    /// Irq content that is not `mask->value`.
    #[error("malformed irq action '{text}'")]
    MalformedIrq {
        /// The directive content.
        text: String,
    },

    /// An irq mask that selects lines the processor does not have.
    #[error("irq mask {mask:#x} exceeds {lines} interrupt lines")]
    IrqMaskOutOfRange {
        /// The requested mask.
        mask: u64,
        /// Configured number of interrupt lines.
        lines: u32,
    },

    /// Alias content that is not `name[labels]=expr`, `name=expr[labels]`
    /// or `name=expr(labels)`.
    #[error("malformed alias '{text}'")]
    MalformedAlias {
        /// The directive content.
        text: String,
    },

    /// A range label that is not `label=value`.
    #[error("malformed range label '{text}'")]
    MalformedLabel {
        /// The offending label text.
        text: String,
    },

    /// An alias name that is already defined.
    #[error("alias '{name}' is already defined")]
    DuplicateAlias {
        /// The repeated name.
        name: String,
    },

    /// A runtime directive before any instruction it could attach to.
    #[error("'{kind}' directive before the first instruction")]
    NoInstruction {
        /// The directive type.
        kind: String,
    },
}

/// A directive error located in the test bench source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {kind} in '{statement}'")]
pub struct BenchError {
    /// 1-based line of the preprocessed source.
    pub line: usize,
    /// The statement that failed.
    pub statement: String,
    /// What went wrong.
    #[source]
    pub kind: DirectiveError,
}

/// Errors from evaluating a property against a processor state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    /// The simulator reported undefined (`X`/`Z`) bits.
    #[error("value of {operand} is unknown")]
    Unknown {
        /// The operand being evaluated.
        operand: String,
    },

    /// The state has no entry for the register.
    #[error("{operand} is not part of the sampled state")]
    Missing {
        /// The operand being evaluated.
        operand: String,
    },
}

/// Errors that stop a test bench run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The simulator failed.
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// The cycle budget ran out before `#end` was reached.
    #[error("no end directive reached within {limit} cycles")]
    CycleLimit {
        /// The configured budget.
        limit: u64,
    },
}

/// Errors from filling a VHDL test bench template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// The template has no `##DATAARRAY` marker to replace.
    #[error("template has no {marker} marker")]
    MissingMarker {
        /// The marker that was looked for.
        marker: &'static str,
    },
}
