//! Schema configuration.
//!
//! Configuration can be embedded in a host's TOML file, for example under a
//! `[schema]` section.
//!
//! # Example Configuration
//!
//! ```toml
//! [schema]
//! introspection = true
//! max_depth = 15
//! sdl_cache = true
//! implicit_list_coercion = true
//! ```

use serde::{Deserialize, Serialize};

/// Options applied when building and serving a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Add the `__schema` and `__type` fields to the query root.
    /// Default: true
    #[serde(default = "default_introspection")]
    pub introspection: bool,

    /// Maximum nesting of selections accepted by validation.
    /// Default: 15
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Cache SDL dumps per visibility outcome.
    /// Default: true
    #[serde(default = "default_sdl_cache")]
    pub sdl_cache: bool,

    /// Accept a single value where a list is expected.
    /// Default: true
    #[serde(default = "default_implicit_list_coercion")]
    pub implicit_list_coercion: bool,
}

fn default_introspection() -> bool {
    true
}

fn default_max_depth() -> usize {
    15
}

fn default_sdl_cache() -> bool {
    true
}

fn default_implicit_list_coercion() -> bool {
    true
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            introspection: default_introspection(),
            max_depth: default_max_depth(),
            sdl_cache: default_sdl_cache(),
            implicit_list_coercion: default_implicit_list_coercion(),
        }
    }
}

impl SchemaConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration values are invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_depth == 0 {
            return Err("schema.max_depth must be > 0".into());
        }
        Ok(())
    }

    /// Parses a configuration from TOML text and validates it.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or fails validation.
    pub fn from_toml(text: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(text).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }
}
