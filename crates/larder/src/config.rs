/*
 *  Copyright 2025 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Registry configuration.
//!
//! Loaded from a TOML file; every field has a default except the artifact
//! secret, which must be provided. The secret keys the bucket derivation —
//! it is injected here rather than read from ambient process state so it
//! stays testable and rotatable (with the caveat documented on
//! [`crate::registry::ArtifactStore`]).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LarderConfig {
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path, `sqlite://` URL, or `:memory:`.
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for stored archives and images.
    pub asset_root: PathBuf,
    /// Staging area for uploaded archives and extraction scratch space.
    pub temp_dir: PathBuf,
    /// Base URL that public-relative asset paths are served under.
    pub public_base_url: String,
    /// Server-held secret keying the storage bucket derivation.
    pub secret: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "larder.db".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("public"),
            temp_dir: std::env::temp_dir(),
            public_base_url: "http://localhost:8080".to_string(),
            secret: String::new(),
        }
    }
}

impl Default for LarderConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl LarderConfig {
    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        if self.storage.secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if self.storage.public_base_url.trim().is_empty() {
            return Err(ConfigError::MissingPublicBaseUrl);
        }
        Ok(())
    }
}

/// Configuration loading and validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML configuration: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("database.url must not be empty")]
    MissingDatabaseUrl,

    #[error("storage.secret must be set (it keys artifact path derivation)")]
    MissingSecret,

    #[error("storage.public_base_url must not be empty")]
    MissingPublicBaseUrl,
}
