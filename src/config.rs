// Store configuration
//
// Loaded from a RON file so a document session can tune history size and the
// store policies without recompiling. Missing fields fall back to defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default number of commands kept in the undo history
pub const DEFAULT_UNDO_CAPACITY: usize = 50;

/// Default length of the recently-used command list
pub const DEFAULT_RECENT_CAPACITY: usize = 20;

const CONFIG_DIR_NAME: &str = "cardplay";
const CONFIG_FILE_NAME: &str = "store.ron";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("RON error: {0}")]
    Ron(#[from] ron::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// How a stream keeps its events ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EventOrdering {
    /// Stable sort by start tick after every mutation
    #[default]
    SortedByStart,
    /// Keep the order in which events were added
    Insertion,
}

/// Tunables shared by the stores of one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum number of undoable commands; the oldest is evicted beyond this
    pub undo_capacity: usize,
    /// Maximum length of the recently-used command list
    pub recent_capacity: usize,
    pub event_ordering: EventOrdering,
    /// Undoable deletions also drop deleted ids from the selection
    pub prune_selection_on_delete: bool,
    /// Allow routing edges whose source and target are the same node
    pub allow_self_connections: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            undo_capacity: DEFAULT_UNDO_CAPACITY,
            recent_capacity: DEFAULT_RECENT_CAPACITY,
            event_ordering: EventOrdering::default(),
            prune_selection_on_delete: true,
            allow_self_connections: false,
        }
    }
}

impl StoreConfig {
    /// Parse a configuration from RON text
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: StoreConfig = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty RON
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config = Self::from_ron_str(&text)?;
        log::debug!("Loaded store config from {}", path.display());
        Ok(config)
    }

    /// Load a configuration file, using defaults if it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!(
                "No store config at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Write the configuration, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }

    /// Per-user config location (`<config dir>/cardplay/store.ron`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.undo_capacity == 0 {
            return Err(ConfigError::Invalid(
                "undo_capacity must be at least 1".to_string(),
            ));
        }
        if self.recent_capacity == 0 {
            return Err(ConfigError::Invalid(
                "recent_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
