//! isag: the command-line front end of the processor test bench runner.
//!
//! Provides `isag check` to validate test benches, `isag asm` to extract the
//! instruction stream, `isag image` and `isag generate` to build the VHDL
//! instruction memory, and `isag run` to check benches against a recorded
//! simulation trace.

#![warn(missing_docs)]

mod asm;
mod check;
mod generate;
mod image;
mod pipeline;
mod run;
mod toolchain;

use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// isag: assembly test benches for soft processor cores.
#[derive(Parser, Debug)]
#[command(name = "isag", version, about = "Processor test bench runner")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `isag.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load test benches and report what they contain.
    Check(CheckArgs),
    /// Print the instruction stream of a test bench.
    Asm(AsmArgs),
    /// Render an assembled binary into a VHDL template.
    Image(ImageArgs),
    /// Assemble a test bench and render it into a VHDL template.
    Generate(GenerateArgs),
    /// Run test benches against a recorded simulation trace.
    Run(RunArgs),
}

/// Options controlling how test bench sources are read.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Include directory for the preprocessor (repeatable).
    #[arg(short = 'I', long = "include", value_name = "DIR")]
    pub include: Vec<String>,

    /// Run the C preprocessor over each bench before parsing.
    #[arg(long)]
    pub preprocess: bool,
}

/// Arguments for the `isag check` subcommand.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Test bench files.
    #[arg(required = true)]
    pub benches: Vec<String>,

    /// Source options.
    #[command(flatten)]
    pub source: SourceArgs,
}

/// Arguments for the `isag asm` subcommand.
#[derive(Parser, Debug)]
pub struct AsmArgs {
    /// Test bench file.
    pub bench: String,

    /// Output path (stdout if omitted).
    #[arg(short, long)]
    pub output: Option<String>,

    /// Source options.
    #[command(flatten)]
    pub source: SourceArgs,
}

/// Arguments for the `isag image` subcommand.
#[derive(Parser, Debug)]
pub struct ImageArgs {
    /// Raw machine code, as produced by `objcopy -O binary`.
    #[arg(long)]
    pub bin: String,

    /// VHDL template containing the `##DATAARRAY` marker.
    #[arg(long)]
    pub template: String,

    /// Output path (stdout if omitted).
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Arguments for the `isag generate` subcommand.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Test bench file.
    pub bench: String,

    /// VHDL template containing the `##DATAARRAY` marker.
    #[arg(long)]
    pub template: String,

    /// Output path (stdout if omitted).
    #[arg(short, long)]
    pub output: Option<String>,

    /// Source options.
    #[command(flatten)]
    pub source: SourceArgs,
}

/// Arguments for the `isag run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Test bench files.
    #[arg(required = true)]
    pub benches: Vec<String>,

    /// VCD trace of the processor running the assembled benches.
    #[arg(long)]
    pub trace: String,

    /// Give up on a bench after this many cycles (overrides `run.max_cycles`).
    #[arg(long)]
    pub max_cycles: Option<u64>,

    /// Output format for the reports.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Source options.
    #[command(flatten)]
    pub source: SourceArgs,
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Check(ref args) => check::run(args, &global),
        Command::Asm(ref args) => asm::run(args, &global),
        Command::Image(ref args) => image::run(args, &global),
        Command::Generate(ref args) => generate::run(args, &global),
        Command::Run(ref args) => run::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Default log level for the given flags; `RUST_LOG` still wins.
fn log_level(quiet: bool, verbose: bool) -> &'static str {
    if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    }
}

fn init_logging(quiet: bool, verbose: bool) {
    let env = env_logger::Env::default().default_filter_or(log_level(quiet, verbose));
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}
