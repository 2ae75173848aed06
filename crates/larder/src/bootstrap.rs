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

//! Service startup.
//!
//! Everything the embedding host used to do through lifecycle hooks —
//! registering the package content types, their public metadata keys, and
//! wiring the pipeline — happens here as one explicit initialization call.

use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::catalog::Catalog;
use crate::config::{ConfigError, LarderConfig};
use crate::dal::DAL;
use crate::database::Database;
use crate::inspect::ZipInspector;
use crate::models::package::{
    META_AUTHORS, META_DOWNLOAD, META_ENTRYPOINT, META_HOMEPAGE, META_LOGO, META_MIN_HOST,
    META_MIN_RUNTIME, META_SCREENSHOT, META_VERSION,
};
use crate::models::PackageType;
use crate::registry::{ArtifactStore, PackageRegistry};

/// Public metadata keys registered per package type.
///
/// Catalog projections only expose keys registered here; anything else a
/// package carries stays internal.
#[derive(Debug, Clone, Default)]
pub struct MetaKeyRegistry {
    keys: HashMap<PackageType, Vec<String>>,
}

impl MetaKeyRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a public metadata key for a package type.
    pub fn register(&mut self, package_type: PackageType, key: &str) {
        let keys = self.keys.entry(package_type).or_default();
        if !keys.iter().any(|existing| existing == key) {
            keys.push(key.to_string());
        }
    }

    /// Keys registered for a package type.
    pub fn keys_for(&self, package_type: PackageType) -> &[String] {
        self.keys
            .get(&package_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The default registration performed at startup. Themes carry no
    /// entrypoint; everything else is shared.
    pub fn defaults() -> Self {
        let mut registry = Self::new();
        for key in [
            META_VERSION,
            META_ENTRYPOINT,
            META_LOGO,
            META_SCREENSHOT,
            META_AUTHORS,
            META_HOMEPAGE,
            META_MIN_HOST,
            META_MIN_RUNTIME,
            META_DOWNLOAD,
        ] {
            registry.register(PackageType::Plugin, key);
        }
        for key in [
            META_VERSION,
            META_LOGO,
            META_SCREENSHOT,
            META_AUTHORS,
            META_HOMEPAGE,
            META_MIN_HOST,
            META_MIN_RUNTIME,
            META_DOWNLOAD,
        ] {
            registry.register(PackageType::Theme, key);
        }
        registry
    }
}

/// Startup failures.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to prepare directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("database initialization failed: {0}")]
    Database(String),
}

/// The wired registry service: the submission pipeline plus the catalog
/// read path, sharing one content repository and artifact store.
pub struct Larder {
    pub registry: PackageRegistry<DAL, ZipInspector>,
    pub catalog: Catalog<DAL>,
}

impl Larder {
    /// Initializes the service from configuration.
    ///
    /// Validates the config, prepares the storage directories, runs the
    /// database migrations, registers the public metadata keys, and wires
    /// the pipeline and catalog.
    pub async fn init(config: LarderConfig) -> Result<Self, BootstrapError> {
        config.validate()?;

        for dir in [&config.storage.asset_root, &config.storage.temp_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| BootstrapError::Io {
                    path: dir.clone(),
                    source,
                })?;
        }

        let database = Database::new(&config.database.url);
        database
            .run_migrations()
            .await
            .map_err(BootstrapError::Database)?;
        let dal = DAL::new(database);

        let artifacts = ArtifactStore::new(
            &config.storage.asset_root,
            &config.storage.secret,
            &config.storage.public_base_url,
        );
        let inspector = ZipInspector::new(&config.storage.temp_dir);
        let meta_keys = MetaKeyRegistry::defaults();

        info!("content types and metadata keys registered; registry ready");

        Ok(Self {
            registry: PackageRegistry::new(dal.clone(), inspector, artifacts.clone()),
            catalog: Catalog::new(dal, artifacts, meta_keys),
        })
    }
}
