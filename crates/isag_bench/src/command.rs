//! Runtime test commands: assertions, interrupt requests and end of test.

use std::fmt;

use isag_config::ArchConfig;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::DirectiveError;
use crate::property::{Property, PropertyParser};
use crate::state::ProcessorState;

static ASSERT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<a>.*?)(?P<op>==|!=)(?P<b>.*)$").expect("assert regex"));

/// Comparison performed by an assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
}

impl CompareOp {
    /// Applies the comparison.
    pub fn holds(self, a: u64, b: u64) -> bool {
        match self {
            CompareOp::Eq => a == b,
            CompareOp::Ne => a != b,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "=="),
            CompareOp::Ne => write!(f, "!="),
        }
    }
}

/// A comparison between two properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assertion {
    /// Left operand.
    pub lhs: Property,
    /// Comparison.
    pub op: CompareOp,
    /// Right operand.
    pub rhs: Property,
}

impl Assertion {
    /// Parses `<a> == <b>` or `<a> != <b>`.
    pub fn parse(text: &str, parser: &PropertyParser<'_>) -> Result<Self, DirectiveError> {
        let caps = ASSERT_RE
            .captures(text)
            .ok_or_else(|| DirectiveError::MalformedAssert {
                text: text.to_string(),
            })?;
        let operand = |side: &str| {
            parser
                .parse(&caps[side])
                .map_err(|source| DirectiveError::Operand {
                    text: text.to_string(),
                    source,
                })
        };
        let op = if &caps["op"] == "==" {
            CompareOp::Eq
        } else {
            CompareOp::Ne
        };
        Ok(Self {
            lhs: operand("a")?,
            op,
            rhs: operand("b")?,
        })
    }
}

/// A read-modify-write of the interrupt request lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrqAction {
    /// Lines to change.
    pub mask: u64,
    /// New values of the masked lines.
    pub value: u64,
}

impl IrqAction {
    /// Parses `<mask>-><value>`, each decimal or `0x` hexadecimal.
    pub fn parse(text: &str, arch: &ArchConfig) -> Result<Self, DirectiveError> {
        let malformed = || DirectiveError::MalformedIrq {
            text: text.to_string(),
        };
        let (mask, value) = text.split_once("->").ok_or_else(malformed)?;
        let mask = parse_int(mask).ok_or_else(malformed)?;
        let value = parse_int(value).ok_or_else(malformed)?;

        if mask & !arch.irq_mask() != 0 {
            return Err(DirectiveError::IrqMaskOutOfRange {
                mask,
                lines: arch.irq_lines,
            });
        }
        Ok(Self { mask, value })
    }

    /// Applies the action to the current line values.
    pub fn apply(&self, current: u64) -> u64 {
        (current & !self.mask) | (self.mask & self.value)
    }
}

fn parse_int(text: &str) -> Option<u64> {
    let text = text.trim();
    let (digits, radix) = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (text, 10),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u64::from_str_radix(digits, radix).ok()
}

/// What a command does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Compare two properties.
    Assert(Assertion),
    /// Drive interrupt lines.
    Irq(IrqAction),
    /// Finish the test.
    End,
}

impl CommandKind {
    /// Directive name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::Assert(_) => "assert",
            CommandKind::Irq(_) => "irq",
            CommandKind::End => "end",
        }
    }
}

/// The result of firing a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The assertion held.
    Passed,
    /// The assertion did not hold, or could not be evaluated.
    Failed(String),
    /// The interrupt lines must be updated.
    Irq(IrqAction),
    /// The test is complete.
    Ended,
}

/// A directive bound to an instruction address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCommand {
    /// What to do.
    pub kind: CommandKind,
    /// Instruction index that triggers the command.
    pub address: u64,
    /// Cycles between the trigger and execution.
    pub cycles_after_event: u32,
    /// Directive content as written.
    pub parameters: String,
    /// Source line of the directive.
    pub line: usize,
}

impl TestCommand {
    /// Fires the command against the state sampled this cycle.
    pub fn execute(&self, state: &ProcessorState, arch: &ArchConfig) -> CommandOutcome {
        match &self.kind {
            CommandKind::End => CommandOutcome::Ended,
            CommandKind::Irq(action) => CommandOutcome::Irq(*action),
            CommandKind::Assert(assertion) => self.check(assertion, state, arch),
        }
    }

    fn check(
        &self,
        assertion: &Assertion,
        state: &ProcessorState,
        arch: &ArchConfig,
    ) -> CommandOutcome {
        let width = arch.hex_digits();
        let location = format!(
            "Assertion failed 0x{:0width$X}@{}, '{}'",
            self.address.wrapping_mul(arch.stride),
            self.cycles_after_event,
            self.parameters,
        );

        let values = assertion
            .lhs
            .evaluate(state)
            .and_then(|a| Ok((a, assertion.rhs.evaluate(state)?)));
        match values {
            Ok((a, b)) if assertion.op.holds(a, b) => CommandOutcome::Passed,
            Ok((a, b)) => CommandOutcome::Failed(format!(
                "{location} <> '{a:0width$X} {} {b:0width$X}'",
                assertion.op
            )),
            Err(e) => CommandOutcome::Failed(format!("{location} <> {e}")),
        }
    }
}
