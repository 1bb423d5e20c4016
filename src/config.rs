use crate::leaderboard::DEFAULT_LIMIT;
use crate::timer::{TimerSettings, DEFAULT_BREAK_MINUTES, DEFAULT_WORK_MINUTES};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub work_minutes: u32,
    pub break_minutes: u32,
    pub leaderboard_size: usize,
    pub server_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_minutes: DEFAULT_WORK_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
            leaderboard_size: DEFAULT_LIMIT,
            server_port: 3000,
        }
    }
}

impl Config {
    pub fn timer_settings(&self) -> TimerSettings {
        TimerSettings::clamped(self.work_minutes, self.break_minutes)
    }
}

pub fn load_config(base_dir: &Path) -> Result<Config> {
    let path = base_dir.join("config.json");

    if !path.exists() {
        let config = Config::default();
        let data = serde_json::to_string_pretty(&config)?;
        fs::write(&path, data)?;
        return Ok(config);
    }

    let data = fs::read_to_string(&path)?;
    let config = serde_json::from_str(&data)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_config_writes_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = load_config(dir.path())?;
        assert_eq!(config, Config::default());
        assert!(dir.path().join("config.json").exists());
        Ok(())
    }

    #[test]
    fn test_load_config_partial_file() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("config.json"), r#"{"work_minutes": 500, "leaderboard_size": 5}"#)?;
        let config = load_config(dir.path())?;
        assert_eq!(config.leaderboard_size, 5);
        assert_eq!(config.break_minutes, DEFAULT_BREAK_MINUTES);
        assert_eq!(config.timer_settings().work_minutes, 120);
        Ok(())
    }
}
