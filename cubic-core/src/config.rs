//! World settings loaded from `cubic_config.json5`.

use std::{fs, path::Path};

use cubic_utils::xyz_map::MAX_INITIAL_CAPACITY;
use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_CONFIG: &str = include_str!("../../package-content/cubic_config.json5");

/// Where columns are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// One compressed file per column.
    Disk,
    /// In memory, lost on shutdown.
    Ram,
}

/// Column storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// The backend.
    pub kind: StorageKind,
    /// Directory for the disk backend.
    pub path: String,
}

/// World settings read from `cubic_config.json5`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// Whether the world has a sky.
    pub has_sky: bool,
    /// Load factor of the world-wide sub-chunk map.
    pub column_map_load_factor: f32,
    /// Initial capacity of the world-wide sub-chunk map.
    pub column_map_capacity: usize,
    /// Column storage.
    pub storage: StorageConfig,
    /// Ticks the headless driver runs.
    pub simulation_ticks: u64,
    /// Radius in columns loaded around the origin by the headless driver.
    pub view_radius: u8,
}

impl WorldConfig {
    /// Reads the config at `path`, writing the default there first if it is missing.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, DEFAULT_CONFIG)?;
            log::info!("Wrote default config to {}", path.display());
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(path)?;
        Self::parse(&config_str)
    }

    /// Parses and validates a JSON5 config.
    pub fn parse(config_str: &str) -> Result<Self, ConfigError> {
        let config: WorldConfig = serde_json5::from_str(config_str)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Checks value ranges the schema cannot express.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(self.column_map_load_factor > 0.0 && self.column_map_load_factor <= 1.0) {
            return Err("Column map load factor must be in range (0, 1]");
        }
        if !(1..=MAX_INITIAL_CAPACITY).contains(&self.column_map_capacity) {
            return Err("Column map capacity must be in range 1..2^30");
        }
        if !(1..=32).contains(&self.view_radius) {
            return Err("View radius must be in range 1..32");
        }
        if self.storage.kind == StorageKind::Disk && self.storage.path.is_empty() {
            return Err("Disk storage needs a path");
        }
        Ok(())
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            has_sky: true,
            column_map_load_factor: 0.75,
            column_map_capacity: 1024,
            storage: StorageConfig {
                kind: StorageKind::Disk,
                path: "world".to_string(),
            },
            simulation_ticks: 200,
            view_radius: 4,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shipped_default_matches() {
        assert_eq!(WorldConfig::parse(DEFAULT_CONFIG).unwrap(), WorldConfig::default());
    }

    #[test]
    fn test_rejects_bad_load_factor() {
        let config = DEFAULT_CONFIG.replace("0.75", "1.5");
        assert!(matches!(
            WorldConfig::parse(&config),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_rejects_huge_capacity() {
        let config = DEFAULT_CONFIG.replace("1024", "18446744073709551615");
        assert!(matches!(
            WorldConfig::parse(&config),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            WorldConfig::parse("{ has_sky: "),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_or_create_writes_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("cubic_config.json5");

        let created = WorldConfig::load_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(created, WorldConfig::default());

        fs::write(&path, DEFAULT_CONFIG.replace("\"disk\"", "\"ram\"")).unwrap();
        let read = WorldConfig::load_or_create(&path).unwrap();
        assert_eq!(read.storage.kind, StorageKind::Ram);
    }
}
