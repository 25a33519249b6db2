use crate::core::window::ActiveWindow;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::success;
use crate::utils::path::expand_tilde;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_remote_database")]
    pub remote_database: String,
    #[serde(default)]
    pub default_user_id: Option<i64>,
    #[serde(default = "default_start_hour")]
    pub active_start_hour: u32,
    #[serde(default = "default_end_hour")]
    pub active_end_hour: u32,
    #[serde(default)]
    pub include_end_hour: bool,
    #[serde(default = "default_min_interval")]
    pub min_interval_secs: u64,
    #[serde(default = "default_movement_threshold")]
    pub movement_threshold_m: f64,
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
    #[serde(default = "default_reconcile_interval")]
    pub reconcile_interval_secs: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_database() -> String {
    Config::database_file().to_string_lossy().to_string()
}
fn default_remote_database() -> String {
    Config::config_dir()
        .join("remote.sqlite")
        .to_string_lossy()
        .to_string()
}
fn default_start_hour() -> u32 {
    8
}
fn default_end_hour() -> u32 {
    18
}
fn default_min_interval() -> u64 {
    60
}
fn default_movement_threshold() -> f64 {
    100.0
}
fn default_check_interval() -> u64 {
    60
}
fn default_reconcile_interval() -> u64 {
    300
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            remote_database: default_remote_database(),
            default_user_id: None,
            active_start_hour: default_start_hour(),
            active_end_hour: default_end_hour(),
            include_end_hour: false,
            min_interval_secs: default_min_interval(),
            movement_threshold_m: default_movement_threshold(),
            check_interval_secs: default_check_interval(),
            reconcile_interval_secs: default_reconcile_interval(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".rtracklogger")
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("rtracklogger.conf")
    }

    /// Return the full path of the outbox database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("outbox.sqlite")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        let path = Self::config_file();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let mut cfg: Config = serde_yaml::from_str(&content)?;
        cfg.validate()?;

        cfg.database = expand_tilde(&cfg.database).to_string_lossy().to_string();
        cfg.remote_database = expand_tilde(&cfg.remote_database)
            .to_string_lossy()
            .to_string();
        Ok(cfg)
    }

    fn validate(&self) -> AppResult<()> {
        if self.active_start_hour > 23 || self.active_end_hour > 23 {
            return Err(AppError::Config(format!(
                "active hours must be between 0 and 23 (got {}..{})",
                self.active_start_hour, self.active_end_hour
            )));
        }
        if self.check_interval_secs == 0 || self.reconcile_interval_secs == 0 {
            return Err(AppError::Config(
                "check_interval_secs and reconcile_interval_secs must be positive".into(),
            ));
        }
        if !self.movement_threshold_m.is_finite() || self.movement_threshold_m < 0.0 {
            return Err(AppError::Config(format!(
                "invalid movement_threshold_m: {}",
                self.movement_threshold_m
            )));
        }
        Ok(())
    }

    pub fn active_window(&self) -> ActiveWindow {
        ActiveWindow::new(
            self.active_start_hour,
            self.active_end_hour,
            self.include_end_hour,
        )
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_secs(self.min_interval_secs)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_secs)
    }

    /// Initialize the configuration file.
    /// Relative database names are resolved inside the config directory.
    pub fn init_all(
        custom_db: Option<String>,
        custom_remote: Option<String>,
        is_test: bool,
    ) -> io::Result<Config> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;

        let resolve = |name: String| {
            let p = expand_tilde(&name);
            if p.is_absolute() {
                p
            } else {
                dir.join(p)
            }
            .to_string_lossy()
            .to_string()
        };

        let mut config = Config::default();
        if let Some(name) = custom_db {
            config.database = resolve(name);
        }
        if let Some(name) = custom_remote {
            config.remote_database = resolve(name);
        }

        if !is_test {
            let yaml = serde_yaml::to_string(&config).map_err(io::Error::other)?;
            let mut file = fs::File::create(Self::config_file())?;
            file.write_all(yaml.as_bytes())?;
            success(format!("Config file: {:?}", Self::config_file()));
        }

        Ok(config)
    }
}
