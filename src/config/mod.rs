use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::errors::{AppError, AppResult};
use crate::models::rules::Rules;

/// On-disk configuration: database location plus classifier thresholds.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub database: String,
    #[serde(default)]
    pub rules: Rules,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: Self::database_file().to_string_lossy().to_string(),
            rules: Rules::default(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("chargewatch")
        } else {
            let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
            home.join(".chargewatch")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("chargewatch.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("chargewatch.sqlite")
    }

    /// Load configuration from file, or return defaults if not found.
    /// The `CHARGEWATCH_DB` environment variable overrides the database
    /// path from either source.
    pub fn load() -> AppResult<Self> {
        let path = Self::config_file();
        let mut config = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|_| AppError::ConfigLoad)?;
            serde_yaml::from_str(&content).map_err(|_| AppError::ConfigLoad)?
        } else {
            Config::default()
        };
        if let Ok(db) = env::var("CHARGEWATCH_DB") {
            config.database = db;
        }
        Ok(config)
    }

    /// Write the configuration file, creating the config directory first.
    pub fn save(&self) -> AppResult<()> {
        fs::create_dir_all(Self::config_dir())?;
        let yaml = serde_yaml::to_string(self).map_err(|_| AppError::ConfigSave)?;
        let mut file = fs::File::create(Self::config_file())?;
        file.write_all(yaml.as_bytes())?;
        Ok(())
    }

    /// Initialize the configuration file and database path.
    pub fn init_all(custom_db: Option<String>) -> AppResult<Self> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;

        let db_path = if let Some(name) = custom_db {
            let p = std::path::Path::new(&name);
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                PathBuf::from(name)
            }
        } else {
            Self::database_file()
        };

        let config = Config {
            database: db_path.to_string_lossy().to_string(),
            rules: Rules::default(),
        };
        config.save()?;
        Ok(config)
    }
}
