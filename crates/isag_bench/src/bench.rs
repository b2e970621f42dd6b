//! The test bench document: instructions interleaved with directives.
//!
//! A test bench is preprocessed assembly. Each line is trimmed and split
//! into statements on `$` (so one macro can expand to several statements),
//! and every statement is one of:
//!
//! | form                          | meaning                                   |
//! |-------------------------------|-------------------------------------------|
//! | `##todo ...`                  | warning, kept in [`TestBench::todos`]     |
//! | `## ...`                      | comment, ignored                          |
//! | `#<type>[@<cycles>](<args>)`  | directive                                 |
//! | anything else                 | an instruction                            |
//!
//! Directive types are `end`, `assert` (or `test`), `irq`, `skip` and
//! `alias`, matched case-insensitively. A `#...(...)` statement with any
//! other type, or a directive type without its `(...)` body, is an error.
//!
//! # Addressing
//!
//! The instruction counter starts at -1 and is incremented after each
//! instruction is appended, so a directive attaches to the most recently
//! emitted instruction. `#skip@N()` adds N to the counter without emitting
//! anything. `end`, `assert` and `irq` directives before the first
//! instruction are rejected.

use isag_config::ArchConfig;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::alias::AliasTable;
use crate::command::{Assertion, CommandKind, CommandOutcome, IrqAction, TestCommand};
use crate::error::{BenchError, DirectiveError};
use crate::property::PropertyParser;

static DIRECTIVE_HEAD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<type>\w+)\s*(?:@(?P<cycles>.*))?$").expect("directive head regex")
});

/// A parsed directive statement.
struct Directive<'s> {
    kind: String,
    cycles: u32,
    content: &'s str,
}

const DIRECTIVE_TYPES: [&str; 6] = ["end", "assert", "test", "skip", "alias", "irq"];

/// Splits `#<type>[@<cycles>](<content>)`.
///
/// Returns `None` for `#` statements that are neither shaped like a
/// directive nor start with a directive type, so `# comment` lines pass
/// through as instructions.
fn split_directive(statement: &str) -> Option<Result<Directive<'_>, DirectiveError>> {
    let rest = statement.strip_prefix('#')?;
    let body = rest
        .find('(')
        .and_then(|open| rest.rfind(')').filter(|&close| close > open).map(|close| (open, close)));

    let Some((open, close)) = body else {
        let word = rest
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        return DIRECTIVE_TYPES.contains(&word.as_str()).then(|| {
            Err(DirectiveError::MalformedDirective {
                text: statement.to_string(),
            })
        });
    };

    let head = rest[..open].trim();
    let Some(caps) = DIRECTIVE_HEAD_RE.captures(head) else {
        return Some(Err(DirectiveError::UnknownType {
            kind: head.to_string(),
        }));
    };

    let cycles = match caps.name("cycles").map(|m| m.as_str().trim()) {
        None | Some("") => Ok(1),
        Some(text) => text.parse::<u32>().map_err(|_| DirectiveError::InvalidCycles {
            cycles: text.to_string(),
        }),
    };
    Some(cycles.map(|cycles| Directive {
        kind: caps["type"].to_ascii_lowercase(),
        cycles,
        content: rest[open + 1..close].trim(),
    }))
}

/// A loaded test bench with its run-time counters.
#[derive(Debug, Clone)]
pub struct TestBench {
    instructions: Vec<String>,
    commands: Vec<TestCommand>,
    aliases: AliasTable,
    todos: Vec<String>,
    passed: usize,
    failures: Vec<String>,
    complete: bool,
}

impl TestBench {
    /// Parses preprocessed test bench text.
    ///
    /// Stops at the first malformed directive.
    pub fn parse(text: &str, arch: &ArchConfig) -> Result<Self, BenchError> {
        let mut bench = Self {
            instructions: Vec::new(),
            commands: Vec::new(),
            aliases: AliasTable::new(),
            todos: Vec::new(),
            passed: 0,
            failures: Vec::new(),
            complete: false,
        };
        let mut counter: i64 = -1;

        for (idx, line) in text.lines().enumerate() {
            for statement in line.trim().split('$').map(str::trim) {
                if statement.is_empty() {
                    continue;
                }
                let line = idx + 1;
                bench
                    .parse_statement(statement, line, &mut counter, arch)
                    .map_err(|kind| BenchError {
                        line,
                        statement: statement.to_string(),
                        kind,
                    })?;
            }
        }

        log::debug!(
            "loaded test bench: {} instructions, {} commands, {} aliases",
            bench.instructions.len(),
            bench.commands.len(),
            bench.aliases.len()
        );
        Ok(bench)
    }

    fn parse_statement(
        &mut self,
        statement: &str,
        line: usize,
        counter: &mut i64,
        arch: &ArchConfig,
    ) -> Result<(), DirectiveError> {
        if statement
            .get(..6)
            .is_some_and(|p| p.eq_ignore_ascii_case("##todo"))
        {
            log::warn!("TODO: {statement}");
            self.todos.push(statement.to_string());
            return Ok(());
        }
        if statement.starts_with("##") {
            return Ok(());
        }

        let Some(directive) = split_directive(statement) else {
            self.instructions.push(statement.to_string());
            *counter += 1;
            return Ok(());
        };
        let Directive {
            kind,
            cycles,
            content,
        } = directive?;
        log::debug!("directive {kind}@{cycles}({content}) at instruction {counter}");

        let command_kind = match kind.as_str() {
            "skip" => {
                *counter += i64::from(cycles);
                return Ok(());
            }
            "alias" => {
                self.aliases.define(content)?;
                return Ok(());
            }
            "end" => CommandKind::End,
            "assert" | "test" => {
                let parser = PropertyParser::new(arch, &self.aliases);
                CommandKind::Assert(Assertion::parse(content, &parser)?)
            }
            "irq" => CommandKind::Irq(IrqAction::parse(content, arch)?),
            _ => return Err(DirectiveError::UnknownType { kind: kind.clone() }),
        };

        let address =
            u64::try_from(*counter).map_err(|_| DirectiveError::NoInstruction { kind })?;
        self.commands.push(TestCommand {
            kind: command_kind,
            address,
            cycles_after_event: cycles,
            parameters: content.to_string(),
            line,
        });
        Ok(())
    }

    /// Instructions in source order.
    pub fn instructions(&self) -> &[String] {
        &self.instructions
    }

    /// Runtime commands in source order.
    pub fn commands(&self) -> &[TestCommand] {
        &self.commands
    }

    /// Aliases defined by the bench.
    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// `##todo` statements found while loading.
    pub fn todos(&self) -> &[String] {
        &self.todos
    }

    /// Renders the instruction stream, one per line, tagged with its index.
    pub fn generate_assembly(&self) -> String {
        self.instructions
            .iter()
            .enumerate()
            .map(|(n, instr)| format!("{instr}   // INSTRUCTION {n}\n"))
            .collect()
    }

    /// Number of assertions that held.
    pub fn passed(&self) -> usize {
        self.passed
    }

    /// Number of assertions that failed.
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Diagnostic of every failed assertion, in order.
    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    /// Returns `true` once an `end` command has fired.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Clears the counters and the end flag for another run.
    pub fn reset(&mut self) {
        self.passed = 0;
        self.failures.clear();
        self.complete = false;
    }

    /// Records the outcome of an assertion or `end` command.
    ///
    /// Irq outcomes are handled by the caller and ignored here.
    pub fn record(&mut self, outcome: &CommandOutcome) {
        match outcome {
            CommandOutcome::Passed => self.passed += 1,
            CommandOutcome::Failed(message) => {
                log::error!("{message}");
                self.failures.push(message.clone());
            }
            CommandOutcome::Ended => self.complete = true,
            CommandOutcome::Irq(_) => {}
        }
    }
}
