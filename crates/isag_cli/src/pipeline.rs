//! Shared helpers for CLI commands.
//!
//! Configuration discovery, test bench loading (with optional
//! preprocessing) and output writing used by every subcommand.

use std::path::{Path, PathBuf};

use isag_bench::TestBench;
use isag_config::{ArchConfig, RunnerConfig, CONFIG_FILE_NAME};

use crate::toolchain::Toolchain;
use crate::{GlobalArgs, SourceArgs};

/// Walks up from `start` looking for the nearest `isag.toml`.
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Resolves the runner configuration from global CLI args.
///
/// If `--config` is given it must name a file, or a directory holding
/// `isag.toml`. Otherwise the nearest `isag.toml` above the current
/// directory is used, falling back to built-in defaults plus `ISAG_*`
/// environment overrides.
pub fn resolve_config(global: &GlobalArgs) -> Result<RunnerConfig, Box<dyn std::error::Error>> {
    let path = match &global.config {
        Some(config) => {
            let p = PathBuf::from(config);
            Some(if p.is_dir() { p.join(CONFIG_FILE_NAME) } else { p })
        }
        None => find_config_file(&std::env::current_dir()?),
    };

    match path {
        Some(path) => {
            log::debug!("using configuration {}", path.display());
            isag_config::load_config(&path)
                .map_err(|e| format!("{}: {e}", path.display()).into())
        }
        None => {
            log::debug!("no {CONFIG_FILE_NAME} found, using defaults");
            Ok(isag_config::load_default_config()?)
        }
    }
}

/// Reads a test bench source, preprocessing it first if requested.
pub fn read_bench_source(
    path: &Path,
    source: &SourceArgs,
) -> Result<String, Box<dyn std::error::Error>> {
    if source.preprocess {
        let include: Vec<PathBuf> = source.include.iter().map(PathBuf::from).collect();
        Ok(Toolchain::from_env().preprocess(path, &include)?)
    } else {
        std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()).into())
    }
}

/// Reads and parses a test bench. Errors are prefixed with the file name.
pub fn load_bench(
    path: &Path,
    source: &SourceArgs,
    arch: &ArchConfig,
) -> Result<TestBench, Box<dyn std::error::Error>> {
    let text = read_bench_source(path, source)?;
    TestBench::parse(&text, arch).map_err(|e| format!("{}: {e}", path.display()).into())
}

/// Short display name of a bench: its file name, or the path as given.
pub fn bench_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Writes `content` to `output`, or to stdout when no path is given.
pub fn write_output(output: Option<&str>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) => {
            std::fs::write(path, content).map_err(|e| format!("cannot write {path}: {e}"))?;
            log::info!("wrote {path}");
        }
        None => print!("{content}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn global(config: Option<String>) -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            config,
        }
    }

    #[test]
    fn find_config_in_current_dir() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("isag.toml"), "").unwrap();
        assert_eq!(
            find_config_file(tmp.path()),
            Some(tmp.path().join("isag.toml"))
        );
    }

    #[test]
    fn find_config_in_parent() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("isag.toml"), "").unwrap();
        let sub = tmp.path().join("benches").join("alu");
        fs::create_dir_all(&sub).unwrap();
        assert_eq!(find_config_file(&sub), Some(tmp.path().join("isag.toml")));
    }

    #[test]
    fn explicit_config_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("core.toml");
        fs::write(&path, "[arch]\nword_size = 16\ngp_registers = 8\n").unwrap();
        let config = resolve_config(&global(Some(path.display().to_string()))).unwrap();
        assert_eq!(config.arch.word_size, 16);
        assert_eq!(config.arch.gp_registers, 8);
    }

    #[test]
    fn explicit_config_directory() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("isag.toml"), "[arch]\nstride = 2\n").unwrap();
        let config = resolve_config(&global(Some(tmp.path().display().to_string()))).unwrap();
        assert_eq!(config.arch.stride, 2);
    }

    #[test]
    fn invalid_config_names_the_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("isag.toml");
        fs::write(&path, "[arch]\nword_size = 0\n").unwrap();
        let err = resolve_config(&global(Some(path.display().to_string()))).unwrap_err();
        assert!(err.to_string().contains("isag.toml"));
        assert!(err.to_string().contains("word_size"));
    }

    #[test]
    fn load_bench_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("alu.S");
        fs::write(&path, "nop\n#assert(r0==0)\n#end()\n").unwrap();
        let bench = load_bench(&path, &SourceArgs::default(), &ArchConfig::default()).unwrap();
        assert_eq!(bench.instructions().len(), 1);
        assert_eq!(bench.commands().len(), 2);
    }

    #[test]
    fn load_bench_errors_carry_file_name() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.S");
        fs::write(&path, "nop\n#frobnicate()\n").unwrap();
        let err = load_bench(&path, &SourceArgs::default(), &ArchConfig::default()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("bad.S"));
        assert!(msg.contains("line 2"));
    }

    #[test]
    fn missing_bench_file() {
        let err = load_bench(
            Path::new("/nonexistent/bench.S"),
            &SourceArgs::default(),
            &ArchConfig::default(),
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("cannot read /nonexistent/bench.S"));
    }

    #[test]
    fn bench_name_is_file_name() {
        assert_eq!(bench_name(Path::new("benches/alu.S")), "alu.S");
    }

    #[test]
    fn write_output_to_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.txt");
        write_output(Some(path.to_str().unwrap()), "hello\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
    }
}
