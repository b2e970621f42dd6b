//! Test bench parsing and execution for processor cores.
//!
//! A test bench is a preprocessed assembly program annotated with
//! directives: assertions about register values, interrupt stimuli and an
//! end marker, each bound to the instruction it follows. [`TestBench`]
//! parses the document, [`Processor`] samples the core through a
//! [`SignalProbe`](isag_probe::SignalProbe) and [`Runner`] drives the
//! cycle loop, firing commands through the [`Scheduler`] as the program
//! counter reaches them.
//!
//! # Modules
//!
//! - `alias`: Named register slices (`#alias(...)`)
//! - `bench`: Test bench document parsing
//! - `command`: Assertions, irq actions and their execution
//! - `error`: Error types for every stage
//! - `image`: VHDL instruction memory rendering
//! - `processor`: Cycle control and state sampling
//! - `property`: Operand parsing and evaluation
//! - `report`: Per-bench pass/fail summary
//! - `runner`: The run loop
//! - `scheduler`: Matching and firing commands by program counter
//! - `state`: Sampled architectural state

#![warn(missing_docs)]

pub mod alias;
pub mod bench;
pub mod command;
pub mod error;
pub mod image;
pub mod processor;
pub mod property;
pub mod report;
pub mod runner;
pub mod scheduler;
pub mod state;

pub use alias::{Alias, AliasTable, Operand};
pub use bench::TestBench;
pub use command::{Assertion, CommandKind, CommandOutcome, CompareOp, IrqAction, TestCommand};
pub use error::{
    BenchError, DirectiveError, EvalError, PropertyError, RunError, TemplateError,
};
pub use image::{fill_template, render_data_array, DATA_ARRAY_MARKER};
pub use processor::Processor;
pub use property::{Property, PropertyParser, RegisterSlice};
pub use report::BenchReport;
pub use runner::Runner;
pub use scheduler::{QueuedCommand, Scheduler};
pub use state::ProcessorState;
