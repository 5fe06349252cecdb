// Tue Jan 13 2026 - Alex

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Cap on tasks registered at the same time. `None` is unbounded.
    pub max_live_tasks: Option<usize>,
    /// Adding a step to a completed task resets it first instead of failing.
    pub implicit_reset: bool,
    /// Completed steps remembered per task for snapshots.
    pub history_limit: usize,
    /// Resumptions a single run may dispatch before it gives up.
    pub max_turns: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_live_tasks: None,
            implicit_reset: true,
            history_limit: 64,
            max_turns: None,
        }
    }
}

impl SchedulerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_live_tasks(mut self, max: Option<usize>) -> Self {
        self.max_live_tasks = max;
        self
    }

    pub fn with_implicit_reset(mut self, enabled: bool) -> Self {
        self.implicit_reset = enabled;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_max_turns(mut self, max: Option<usize>) -> Self {
        self.max_turns = max;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_live_tasks == Some(0) {
            return Err(ConfigError::ValidationError("max_live_tasks must be greater than 0".to_string()));
        }
        if let Some(max) = self.max_live_tasks {
            if max > u32::MAX as usize {
                return Err(ConfigError::ValidationError(format!(
                    "max_live_tasks must not exceed {}",
                    u32::MAX
                )));
            }
        }
        if self.max_turns == Some(0) {
            return Err(ConfigError::ValidationError("max_turns must be greater than 0".to_string()));
        }
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let config: Self = match ext.to_lowercase().as_str() {
            "json" => serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?,
            _ => return Err(ConfigError::UnsupportedFormat(ext.to_string())),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        if ext.to_lowercase() != "json" {
            return Err(ConfigError::UnsupportedFormat(ext.to_string()));
        }

        let contents = self.to_json()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        fs::write(path, contents).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::load(path).unwrap_or_default()
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Config file not found: {0:?}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Serialize error: {0}")]
    SerializeError(String),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SchedulerConfig::default();
        assert!(config.implicit_reset);
        assert_eq!(config.max_live_tasks, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_caps() {
        let config = SchedulerConfig::new().with_max_live_tasks(Some(0));
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        let config = SchedulerConfig::new().with_max_turns(Some(0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SchedulerConfig = serde_json::from_str(r#"{"max_live_tasks": 10}"#).unwrap();
        assert_eq!(config.max_live_tasks, Some(10));
        assert_eq!(config.history_limit, 64);
        assert!(config.implicit_reset);
    }

    #[test]
    fn test_save_then_load() {
        let dir = std::env::temp_dir().join(format!("taskline-config-{}", std::process::id()));
        let path = dir.join("scheduler.json");
        let config = SchedulerConfig::new().with_history_limit(4).with_implicit_reset(false);

        config.save(&path).unwrap();
        assert_eq!(SchedulerConfig::load(&path).unwrap(), config);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_errors() {
        assert!(matches!(
            SchedulerConfig::load("/nonexistent/taskline.json"),
            Err(ConfigError::NotFound(_))
        ));
        assert!(matches!(
            SchedulerConfig::new().save("scheduler.yaml"),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }
}
