use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunable knobs for the temporal engine.
///
/// Every field has a default matching the organization's standard workflow;
/// a TOML file can override individual values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Days between automatic priority escalations of an unblocked milestone.
    #[serde(default = "default_escalation_interval")]
    pub escalation_interval_days: i64,
    /// Days before the due date at which the one-time deadline warning fires.
    #[serde(default = "default_due_soon_window")]
    pub due_soon_window_days: i64,
    /// Minimum accepted comment length.
    #[serde(default = "default_min_comment_len")]
    pub min_comment_len: usize,
    /// Days after which the organization phase rotates one step.
    #[serde(default = "default_phase_length")]
    pub phase_length_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            escalation_interval_days: default_escalation_interval(),
            due_soon_window_days: default_due_soon_window(),
            min_comment_len: default_min_comment_len(),
            phase_length_days: default_phase_length(),
        }
    }
}

const fn default_escalation_interval() -> i64 {
    3
}

const fn default_due_soon_window() -> i64 {
    1
}

const fn default_min_comment_len() -> usize {
    10
}

const fn default_phase_length() -> i64 {
    12
}

/// Load an [`EngineConfig`] from a TOML file, falling back to defaults when
/// the file does not exist.
pub fn load_engine_config(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        return Ok(EngineConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read config file {}", path.display()))?;
    let config: EngineConfig =
        toml::from_str(&raw).with_context(|| format!("parse config file {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::{EngineConfig, load_engine_config};
    use std::io::Write;

    #[test]
    fn defaults_match_the_standard_workflow() {
        let config = EngineConfig::default();
        assert_eq!(config.escalation_interval_days, 3);
        assert_eq!(config.due_soon_window_days, 1);
        assert_eq!(config.min_comment_len, 10);
        assert_eq!(config.phase_length_days, 12);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = load_engine_config(&dir.path().join("cadence.toml")).expect("load");
        assert_eq!(config.escalation_interval_days, 3);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("cadence.toml");
        let mut file = std::fs::File::create(&path).expect("create file");
        writeln!(file, "escalation_interval_days = 5").expect("write");

        let config = load_engine_config(&path).expect("load");
        assert_eq!(config.escalation_interval_days, 5);
        assert_eq!(config.min_comment_len, 10);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("cadence.toml");
        std::fs::write(&path, "escalation_interval_days = \"soon\"").expect("write");
        assert!(load_engine_config(&path).is_err());
    }
}
