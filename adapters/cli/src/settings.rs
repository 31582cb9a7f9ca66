//! Settings and level files read by the command-line driver.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use stronghold_core::{LevelDescriptor, SimulationConfig};
use stronghold_system_bot::Config as BotConfig;
use stronghold_system_campaign::Arena;
use thiserror::Error;

/// Errors raised while reading settings or level files.
#[derive(Debug, Error)]
pub(crate) enum SettingsError {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {} as TOML", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to parse {} as JSON", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{} has no .json or .toml extension", path.display())]
    UnsupportedFormat { path: PathBuf },
    #[error("tick rate must be positive")]
    InvalidTickRate,
    #[error("level contains no towers")]
    EmptyLevel,
}

/// Settings file contents; every table is optional.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Settings {
    pub(crate) simulation: SimulationConfig,
    pub(crate) bot: BotConfig,
    pub(crate) run: RunSettings,
}

/// Parameters of the headless run loop.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RunSettings {
    pub(crate) tick_hz: u32,
    pub(crate) max_seconds: f32,
    pub(crate) rounds: u32,
    pub(crate) first_round: u32,
    pub(crate) max_rounds: u32,
    pub(crate) arena: Arena,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            tick_hz: 60,
            max_seconds: 300.0,
            rounds: 1,
            first_round: 1,
            max_rounds: 20,
            arena: Arena::default(),
        }
    }
}

impl Settings {
    /// Reads a TOML settings file.
    pub(crate) fn load(path: &Path) -> Result<Self, SettingsError> {
        let contents = read(path)?;
        Self::from_toml(path, &contents)
    }

    fn from_toml(path: &Path, contents: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(contents).map_err(|source| SettingsError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn validate(&self) -> Result<(), SettingsError> {
        if self.run.tick_hz == 0 {
            return Err(SettingsError::InvalidTickRate);
        }
        Ok(())
    }
}

/// Reads a level descriptor from a `.json` or `.toml` file.
pub(crate) fn load_level(path: &Path) -> Result<LevelDescriptor, SettingsError> {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);

    let contents = read(path)?;
    let level: LevelDescriptor = match extension.as_deref() {
        Some("json") => serde_json::from_str(&contents).map_err(|source| SettingsError::Json {
            path: path.to_path_buf(),
            source,
        })?,
        Some("toml") => toml::from_str(&contents).map_err(|source| SettingsError::Toml {
            path: path.to_path_buf(),
            source,
        })?,
        _ => {
            return Err(SettingsError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    };

    if level.towers.is_empty() {
        return Err(SettingsError::EmptyLevel);
    }
    Ok(level)
}

fn read(path: &Path) -> Result<String, SettingsError> {
    fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })
}
