//! Configuration structures for the collector

use crate::{Result, SmdrError};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Minute-granularity timestamp embedded in output and log file names.
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%Hh%Mm";

/// Collector configuration, loaded once at startup and read-only afterwards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Network settings
    pub network: NetworkSettings,
    /// Naming of the SMDR output CSV files
    pub output_file: FileNaming,
    /// Naming of the event log file
    pub log_file: FileNaming,
    /// Output file rollover settings
    #[serde(alias = "smdr")]
    pub rotation: RotationSettings,
}

/// Listening socket settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSettings {
    /// Address to bind the listening socket to
    #[serde(alias = "SYS_IP_ADDRESS")]
    pub bind_address: String,
    /// Port to bind the listening socket to, 0 for an ephemeral port
    #[serde(alias = "PORT_NUM")]
    pub port: u16,
    /// Address the exchange is expected to connect from
    #[serde(default, alias = "PBX_IP_ADDRESS")]
    pub pbx_address: Option<String>,
    /// Exchange model, informational only
    #[serde(default, alias = "PBX_MODEL")]
    pub pbx_model: Option<String>,
    /// Upper bound on a single accept or receive wait, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Receive buffer size in bytes
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

/// Naming template `<title>-<YYYY-MM-DD-HHhMMm>.<extension>` inside `directory`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNaming {
    /// File name prefix
    #[serde(alias = "OUTPUT_FILE_TITLE", alias = "LOG_FILE_TITLE")]
    pub title: String,
    /// File extension, without the leading dot
    #[serde(alias = "OUTPUT_FILE_EXT", alias = "LOG_FILE_EXT")]
    pub extension: String,
    /// Directory the files are created in
    #[serde(alias = "OUTPUT_FILE_DIR", alias = "LOG_FILE_DIR")]
    pub directory: PathBuf,
}

/// Output file rollover configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationSettings {
    /// Age in hours after which the output file is rolled over
    #[serde(alias = "SMDR_LOG_ROLLOVER")]
    pub interval_hours: f64,
    /// Size in megabytes at which the output file is rolled over
    #[serde(alias = "SMDR_MAX_SIZE_MBS")]
    pub max_size_mb: f64,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_buffer_size() -> usize {
    1024
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            network: NetworkSettings {
                bind_address: "0.0.0.0".to_string(),
                port: 9000,
                pbx_address: None,
                pbx_model: None,
                poll_interval_ms: default_poll_interval_ms(),
                buffer_size: default_buffer_size(),
            },
            output_file: FileNaming {
                title: "SMDR".to_string(),
                extension: "csv".to_string(),
                directory: PathBuf::from("records"),
            },
            log_file: FileNaming {
                title: "collector".to_string(),
                extension: "log".to_string(),
                directory: PathBuf::from("logs"),
            },
            rotation: RotationSettings {
                interval_hours: 24.0,
                max_size_mb: 10.0,
            },
        }
    }
}

impl FileNaming {
    /// Path of the file this template names for the given creation time
    pub fn timestamped_path(&self, at: DateTime<Local>) -> PathBuf {
        self.directory.join(format!(
            "{}-{}.{}",
            self.title,
            at.format(FILE_TIMESTAMP_FORMAT),
            self.extension
        ))
    }

    /// Extract the timestamp part of a file name produced by this template
    pub fn timestamp_part<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        file_name
            .strip_prefix(self.title.as_str())?
            .strip_prefix('-')?
            .strip_suffix(self.extension.as_str())?
            .strip_suffix('.')
    }

    fn validate(&self, section: &str) -> Result<()> {
        if self.title.is_empty() {
            return Err(SmdrError::Config(format!("{}.title cannot be empty", section)));
        }
        if self.extension.is_empty() {
            return Err(SmdrError::Config(format!("{}.extension cannot be empty", section)));
        }
        if self.directory.as_os_str().is_empty() {
            return Err(SmdrError::Config(format!("{}.directory cannot be empty", section)));
        }
        Ok(())
    }
}

impl NetworkSettings {
    /// Poll interval bounding every accept and receive wait
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl CollectorConfig {
    /// Load configuration from a TOML file, or a JSON file when the extension is `.json`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SmdrError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config: CollectorConfig = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| SmdrError::Config(format!("Invalid JSON in config file: {}", e)))?,
            _ => toml::from_str(&content)
                .map_err(|e| SmdrError::Config(format!("Failed to parse config: {}", e)))?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.network.bind_address.is_empty() {
            return Err(SmdrError::Config("Bind address cannot be empty".to_string()));
        }
        if self.network.poll_interval_ms == 0 {
            return Err(SmdrError::Config("Poll interval must be positive".to_string()));
        }
        if self.network.buffer_size == 0 {
            return Err(SmdrError::Config("Buffer size must be positive".to_string()));
        }
        self.output_file.validate("output_file")?;
        self.log_file.validate("log_file")?;

        let rotation = &self.rotation;
        if !(rotation.interval_hours.is_finite() && rotation.interval_hours > 0.0) {
            return Err(SmdrError::Config(format!(
                "Rollover interval must be a positive number of hours, got {}",
                rotation.interval_hours
            )));
        }
        if !(rotation.max_size_mb.is_finite() && rotation.max_size_mb > 0.0) {
            return Err(SmdrError::Config(format!(
                "Maximum file size must be a positive number of megabytes, got {}",
                rotation.max_size_mb
            )));
        }
        Ok(())
    }

    /// Create the output and log directories if they do not exist yet
    pub fn prepare_directories(&self) -> Result<()> {
        for dir in [&self.output_file.directory, &self.log_file.directory] {
            std::fs::create_dir_all(dir).map_err(|e| {
                SmdrError::Config(format!("Failed to create directory {}: {}", dir.display(), e))
            })?;
        }
        Ok(())
    }

    /// `address:port` string for the listening socket
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.network.bind_address, self.network.port)
    }
}
