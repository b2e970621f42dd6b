//! The external cross toolchain: C preprocessor, assembler and objcopy.
//!
//! Tool names are prefixed with `$CROSS_COMPILE`, so
//! `CROSS_COMPILE=mips-elf-` runs `mips-elf-gcc` and `mips-elf-objcopy`.
//! Intermediate files live in a temporary directory removed on return.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

/// Errors from running the cross toolchain.
#[derive(Debug, Error)]
pub enum ToolchainError {
    /// The tool could not be started.
    #[error("failed to run {tool}: {source}")]
    Spawn {
        /// The program that was invoked.
        tool: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The tool ran and reported failure.
    #[error("{tool} exited with {status}:\n{stderr}")]
    Failed {
        /// The program that was invoked.
        tool: String,
        /// Its exit status.
        status: std::process::ExitStatus,
        /// What it printed to stderr.
        stderr: String,
    },
    /// An intermediate file could not be written or read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A cross toolchain identified by its tool-name prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Toolchain {
    prefix: String,
}

impl Toolchain {
    /// Creates a toolchain whose tools are named `<prefix>gcc` and so on.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Uses the `CROSS_COMPILE` environment variable as the prefix.
    pub fn from_env() -> Self {
        Self::new(std::env::var("CROSS_COMPILE").unwrap_or_default())
    }

    /// Name of the tool with the prefix applied.
    pub fn tool(&self, name: &str) -> String {
        format!("{}{name}", self.prefix)
    }

    /// Runs the C preprocessor over `input` and returns its output.
    ///
    /// Comments are kept so `##` directives survive; line markers and
    /// warnings are suppressed.
    pub fn preprocess(&self, input: &Path, include: &[PathBuf]) -> Result<String, ToolchainError> {
        let dir = tempfile::tempdir()?;
        let output = dir.path().join("preprocessed.S");
        self.invoke("gcc", preprocess_args(input, include, &output), None)?;
        Ok(std::fs::read_to_string(&output)?)
    }

    /// Assembles `assembly` into raw machine code.
    pub fn assemble(&self, assembly: &str) -> Result<Vec<u8>, ToolchainError> {
        let dir = tempfile::tempdir()?;
        let source = dir.path().join("program.S");
        std::fs::write(&source, assembly)?;

        self.invoke("gcc", assemble_args(&source), Some(dir.path()))?;
        self.invoke(
            "objcopy",
            ["-O", "binary", "a.out", "a.bin"].map(OsString::from).to_vec(),
            Some(dir.path()),
        )?;
        Ok(std::fs::read(dir.path().join("a.bin"))?)
    }

    fn invoke(
        &self,
        name: &str,
        args: Vec<OsString>,
        cwd: Option<&Path>,
    ) -> Result<(), ToolchainError> {
        let tool = self.tool(name);
        let mut command = Command::new(&tool);
        command.args(&args);
        if let Some(cwd) = cwd {
            command.current_dir(cwd);
        }
        log::debug!("running {tool} {args:?}");

        let output = command.output().map_err(|source| ToolchainError::Spawn {
            tool: tool.clone(),
            source,
        })?;
        if !output.status.success() {
            return Err(ToolchainError::Failed {
                tool,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(())
    }
}

fn preprocess_args(input: &Path, include: &[PathBuf], output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-E", "-P", "-CC", "-w"].map(OsString::from).to_vec();
    for dir in include {
        let mut flag = OsString::from("-I");
        flag.push(dir);
        args.push(flag);
    }
    args.extend(["-x", "assembler-with-cpp"].map(OsString::from));
    args.push(input.into());
    args.push("-o".into());
    args.push(output.into());
    args
}

fn assemble_args(source: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-x", "assembler-with-cpp"].map(OsString::from).to_vec();
    args.push(source.into());
    args.extend(["-nostartfiles", "-nodefaultlibs"].map(OsString::from));
    args
}
