//! Configuration file loading, environment overrides and validation.

use crate::error::ConfigError;
use crate::types::RunnerConfig;
use std::path::Path;
use std::str::FromStr;

/// Name of the configuration file looked up in project directories.
pub const CONFIG_FILE_NAME: &str = "isag.toml";

/// Loads a configuration file, applies `ISAG_*` environment overrides from
/// the process environment and validates the result.
pub fn load_config(path: &Path) -> Result<RunnerConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config = parse(&content)?;
    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config)?;
    Ok(config)
}

/// Builds the default configuration with environment overrides applied.
///
/// Used when no `isag.toml` exists; the reference wrapper was configured
/// purely through the environment.
pub fn load_default_config() -> Result<RunnerConfig, ConfigError> {
    let mut config = RunnerConfig::default();
    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config)?;
    Ok(config)
}

/// Parses and validates a configuration from a string.
///
/// The environment is not consulted, which keeps this usable in tests.
pub fn load_config_from_str(content: &str) -> Result<RunnerConfig, ConfigError> {
    let config = parse(content)?;
    validate_config(&config)?;
    Ok(config)
}

fn parse(content: &str) -> Result<RunnerConfig, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Overrides architecture fields from `ISAG_*` variables.
///
/// `lookup` maps a variable name to its value; pass
/// `|v| std::env::var(v).ok()` for the process environment.
pub fn apply_env_overrides<F>(config: &mut RunnerConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let arch = &mut config.arch;
    override_from(&lookup, "ISAG_WORD_SIZE", &mut arch.word_size)?;
    override_from(&lookup, "ISAG_NUM_GPR", &mut arch.gp_registers)?;
    override_from(&lookup, "ISAG_NUM_SPR", &mut arch.sp_registers)?;
    override_from(&lookup, "ISAG_NUM_IRQS", &mut arch.irq_lines)?;
    override_from(&lookup, "ISAG_STRIDE", &mut arch.stride)?;
    override_from(&lookup, "ISAG_INSTR_SIZE", &mut arch.instr_size_bytes)?;
    override_from(&lookup, "ISAG_ENDIAN", &mut arch.endianness)?;
    Ok(())
}

fn override_from<F, T>(lookup: &F, var: &str, slot: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(value) = lookup(var) else {
        return Ok(());
    };
    *slot = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var: var.to_string(),
        value,
    })?;
    Ok(())
}

/// Checks that configuration values are usable by the runner.
pub fn validate_config(config: &RunnerConfig) -> Result<(), ConfigError> {
    let arch = &config.arch;
    if arch.word_size == 0 || arch.word_size > 64 {
        return Err(ConfigError::ValidationError(format!(
            "arch.word_size must be between 1 and 64, got {}",
            arch.word_size
        )));
    }
    if arch.stride == 0 {
        return Err(ConfigError::ValidationError(
            "arch.stride must be at least 1".to_string(),
        ));
    }
    if arch.instr_size_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "arch.instr_size_bytes must be at least 1".to_string(),
        ));
    }
    if arch.irq_lines > 64 {
        return Err(ConfigError::ValidationError(format!(
            "arch.irq_lines must be at most 64, got {}",
            arch.irq_lines
        )));
    }
    if config.run.cycle_time == 0 {
        return Err(ConfigError::ValidationError(
            "run.cycle_time must be at least 1".to_string(),
        ));
    }
    if config.signals.pc.is_empty() {
        return Err(ConfigError::ValidationError(
            "signals.pc must not be empty".to_string(),
        ));
    }
    Ok(())
}
