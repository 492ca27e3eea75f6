//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Environment variable selecting the [`UnknownRelationPolicy`].
pub const UNKNOWN_RELATIONS_VAR: &str = "ATTRSYNC_UNKNOWN_RELATIONS";

/// Environment variable toggling payload validation on save.
pub const VALIDATE_PAYLOADS_VAR: &str = "ATTRSYNC_VALIDATE_PAYLOADS";

/// What to do with sync rules that name a relation the collection does not
/// declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownRelationPolicy {
    /// Fail when the store is created.
    #[default]
    Reject,
    /// Accept the schema and skip those rules on every save, with a warning.
    Skip,
}

impl FromStr for UnknownRelationPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "skip" => Ok(Self::Skip),
            _ => Err(ConfigError::InvalidUnknownRelations(s.to_string())),
        }
    }
}

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Handling of sync rules naming undeclared relations
    pub unknown_relations: UnknownRelationPolicy,
    /// Validate payloads against the collection schema on save
    pub validate_payloads: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            unknown_relations: UnknownRelationPolicy::Reject,
            validate_payloads: true,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(UNKNOWN_RELATIONS_VAR) {
            config.unknown_relations = value.parse()?;
        }

        if let Some(value) = lookup(VALIDATE_PAYLOADS_VAR) {
            config.validate_payloads = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValidatePayloads(value.clone()))?;
        }

        Ok(config)
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid ATTRSYNC_UNKNOWN_RELATIONS value '{0}', expected 'reject' or 'skip'")]
    InvalidUnknownRelations(String),

    #[error("Invalid ATTRSYNC_VALIDATE_PAYLOADS value '{0}', expected 'true' or 'false'")]
    InvalidValidatePayloads(String),
}
