use std::{env, fs, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schedule::{BreakWindow, SlotCatalog};

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
const DEFAULT_DAYS: &[&str] = &["Lunes", "Martes", "Miércoles", "Jueves", "Viernes"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid port {value:?}")]
    InvalidPort { value: String },
    #[error("invalid slot grid: {reason}")]
    InvalidGrid { reason: String },
    #[error("failed to read grid file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse grid file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Shape of the working day: slot length, bounds, breaks and day names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    pub start: String,
    pub end: String,
    pub interval_minutes: u32,
    #[serde(default)]
    pub breaks: Vec<BreakWindow>,
    #[serde(default = "default_days")]
    pub days: Vec<String>,
}

fn default_days() -> Vec<String> {
    DEFAULT_DAYS.iter().map(|d| d.to_string()).collect()
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            start: "09:00".to_string(),
            end: "14:00".to_string(),
            interval_minutes: 30,
            breaks: vec![BreakWindow::new("11:00", "11:30")],
            days: default_days(),
        }
    }
}

impl GridConfig {
    pub fn catalog(&self) -> Result<SlotCatalog, ConfigError> {
        let catalog = SlotCatalog::from_grid(&self.start, &self.end, self.interval_minutes, &self.breaks)
            .ok_or_else(|| ConfigError::InvalidGrid {
                reason: format!(
                    "cannot build {}-minute slots from {} to {}",
                    self.interval_minutes, self.start, self.end
                ),
            })?;
        if catalog.is_empty() {
            return Err(ConfigError::InvalidGrid {
                reason: "grid has no slots outside its breaks".to_string(),
            });
        }
        Ok(catalog)
    }
}

/// Runtime configuration for the CLI and the web server
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub port: u16,
    pub admin_password: String,
    pub catalog: SlotCatalog,
    pub days: Vec<String>,
}

impl AppConfig {
    /// Reads `SUBSTITUTE_DATA_DIR`, `PORT`, `ADMIN_PASSWORD` and the optional
    /// `SUBSTITUTE_GRID_FILE`; anything unset keeps its default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let grid = match env::var("SUBSTITUTE_GRID_FILE") {
            Ok(path) => load_grid(PathBuf::from(path))?,
            Err(_) => GridConfig::default(),
        };
        let port = match env::var("PORT") {
            Ok(value) => parse_port(&value)?,
            Err(_) => DEFAULT_PORT,
        };
        Self::build(
            env::var("SUBSTITUTE_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string()),
            port,
            env::var("ADMIN_PASSWORD").unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string()),
            &grid,
        )
    }

    pub fn build(
        data_dir: impl Into<PathBuf>,
        port: u16,
        admin_password: impl Into<String>,
        grid: &GridConfig,
    ) -> Result<Self, ConfigError> {
        if grid.days.is_empty() {
            return Err(ConfigError::InvalidGrid {
                reason: "no working days configured".to_string(),
            });
        }
        Ok(Self {
            data_dir: data_dir.into(),
            port,
            admin_password: admin_password.into(),
            catalog: grid.catalog()?,
            days: grid.days.clone(),
        })
    }

    pub fn is_working_day(&self, day: &str) -> bool {
        self.days.iter().any(|d| d == day)
    }
}

pub fn parse_port(value: &str) -> Result<u16, ConfigError> {
    value.trim().parse::<u16>().map_err(|_| ConfigError::InvalidPort {
        value: value.to_string(),
    })
}

fn load_grid(path: PathBuf) -> Result<GridConfig, ConfigError> {
    let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Json { path, source })
}
