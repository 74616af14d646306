use std::path::Path;

use config::{Config, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

use crate::{options::SearchOptions, pawn_table::PawnTable, tt::TranspositionTable};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to read the configuration: {0}")]
    UnableToReadConfig(#[from] config::ConfigError),
}

/// Configuration of an engine instance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Size of the transposition table in MiB.
    pub hash_megabytes: usize,

    /// Number of entries of the pawn structure cache.
    pub pawn_table_entries: usize,

    /// Tuning of the search.
    pub search: SearchOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hash_megabytes: TranspositionTable::DEFAULT_MB_SIZE,
            pawn_table_entries: PawnTable::DEFAULT_ENTRIES,
            search: SearchOptions::default(),
        }
    }
}

impl EngineConfig {
    /// Loads the configuration from a file. The format is deduced from the file extension.
    ///
    /// # Errors
    /// * `UnableToReadConfig` - If the file cannot be read or does not describe an `EngineConfig`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let settings = Config::builder().add_source(File::from(path)).build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Parses the configuration from a TOML document.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder().add_source(File::from_str(toml, FileFormat::Toml)).build()?;
        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        assert_eq!(EngineConfig::from_toml("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_from_toml() {
        let config = EngineConfig::from_toml(
            r#"
            hash_megabytes = 64

            [search]
            null_move_pruning = false
            lmr_min_depth = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.hash_megabytes, 64);
        assert_eq!(config.pawn_table_entries, PawnTable::DEFAULT_ENTRIES);
        assert!(!config.search.null_move_pruning);
        assert_eq!(config.search.lmr_min_depth, 4);
        assert_eq!(config.search.null_move_reduction, 2);
    }

    #[test]
    fn test_invalid_document() {
        assert!(EngineConfig::from_toml("hash_megabytes = \"lots\"").is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = EngineConfig::load(Path::new("/nonexistent/pawnstorm.toml"));
        assert!(matches!(result, Err(ConfigError::UnableToReadConfig(_))));
    }
}
