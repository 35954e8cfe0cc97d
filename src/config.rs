use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Optional settings read from `<config dir>/timer-tui/config.json`.
/// A missing file means defaults. `database_path` loses to `--database`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: Option<String>,
    pub sound_default: bool,
    pub auto_repeat_default: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            sound_default: true,
            auto_repeat_default: false,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path: PathBuf = Self::path();
        if path.exists() {
            let data = fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&data)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    fn path() -> PathBuf {
        let base: PathBuf = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("timer-tui").join("config.json")
    }
}

// Tests
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_keep_sound_on() {
        let config = AppConfig::default();
        assert!(config.sound_default);
        assert!(!config.auto_repeat_default);
        assert!(config.database_path.is_none());
    }

    #[test]
    fn test_partial_file_falls_back_per_field() {
        let config: AppConfig = serde_json::from_str(r#"{"auto_repeat_default": true}"#).unwrap();
        assert!(config.sound_default);
        assert!(config.auto_repeat_default);
    }

    #[test]
    fn test_full_file_round_trips() {
        let config: AppConfig = serde_json::from_str(
            r#"{"database_path": "/tmp/timers.db", "sound_default": false, "auto_repeat_default": true}"#,
        )
        .unwrap();
        assert_eq!(config.database_path.as_deref(), Some("/tmp/timers.db"));
        assert!(!config.sound_default);
        assert!(config.auto_repeat_default);
    }
}
