pub mod schema;

pub use schema::{MonitorConfig, SamplerConfig, SourceConfig};

use cpumon_core::{MonitorError, Result};
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file.  Returns `MonitorConfig::default()` if
/// the file doesn't exist so the monitor always has sensible defaults.
pub fn load(path: impl AsRef<Path>) -> Result<MonitorConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(
            "Config file not found at '{}'; using defaults.",
            path.display()
        );
        return Ok(MonitorConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| MonitorError::Config(format!("cannot read '{}': {e}", path.display())))?;

    parse(&raw)
}

/// Parse and validate a TOML document.
pub fn parse(raw: &str) -> Result<MonitorConfig> {
    let config: MonitorConfig =
        toml::from_str(raw).map_err(|e| MonitorError::Config(format!("TOML parse error: {e}")))?;
    validate(&config)?;
    Ok(config)
}

/// Reject settings the sampler cannot run with.
pub fn validate(config: &MonitorConfig) -> Result<()> {
    if config.sampler.interval_ms == 0 {
        return Err(MonitorError::Config("sampler.interval_ms must be > 0".into()));
    }
    if config.sampler.window_capacity == 0 {
        return Err(MonitorError::Config("sampler.window_capacity must be > 0".into()));
    }
    Ok(())
}

/// Return the default config path, honouring `$XDG_CONFIG_HOME`.
pub fn default_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("cpumon").join("cpumon.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config, MonitorConfig::default());
        assert_eq!(config.sampler.interval_ms, 1_000);
        assert_eq!(config.sampler.window_capacity, 11);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = parse("[sampler]\ninterval_ms = 250\n").unwrap();
        assert_eq!(config.sampler.interval_ms, 250);
        assert_eq!(config.sampler.window_capacity, 11);
        assert_eq!(config.source.proc_stat, PathBuf::from("/proc/stat"));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = parse("[sampler]\ninterval_ms = 0\n").unwrap_err();
        assert!(matches!(err, MonitorError::Config(_)));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = parse("[sampler]\nwindow_capacity = 0\n").unwrap_err();
        assert!(matches!(err, MonitorError::Config(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load("/nonexistent/cpumon.toml").unwrap();
        assert_eq!(config, MonitorConfig::default());
    }
}
