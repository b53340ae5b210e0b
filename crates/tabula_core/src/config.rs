//! # Store Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! document is a valid configuration.
//!
//! ```toml
//! id_lower = 0
//! id_upper = 65535
//! column_capacity = 256
//! archetype_capacity = 64
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{StoreError, StoreResult};

/// Configuration for a [`crate::World`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// First data value handed out by the identifier allocator.
    pub id_lower: u32,
    /// Inclusive last data value, or unbounded when absent.
    pub id_upper: Option<u32>,
    /// Rows reserved up front in every newly created archetype.
    pub column_capacity: usize,
    /// Archetypes reserved up front in the graph arena.
    pub archetype_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            id_lower: 0,
            id_upper: None,
            column_capacity: 0,
            archetype_capacity: 16,
        }
    }
}

impl StoreConfig {
    /// Parses a configuration from a TOML string and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] on malformed TOML, unknown
    /// keys, or an inverted identifier range.
    pub fn from_toml_str(source: &str) -> StoreResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| StoreError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] if the file can't be read or
    /// fails [`StoreConfig::from_toml_str`].
    pub fn from_toml_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| StoreError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Checks the identifier window.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] if `id_lower > id_upper`.
    pub fn validate(&self) -> StoreResult<()> {
        match self.id_upper {
            Some(upper) if self.id_lower > upper => Err(StoreError::InvalidConfig(format!(
                "id_lower {} exceeds id_upper {}",
                self.id_lower, upper
            ))),
            _ => Ok(()),
        }
    }
}
