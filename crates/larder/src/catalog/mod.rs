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

//! Catalog read path and download bookkeeping.
//!
//! Listings and single-package views project only the metadata keys
//! registered for the package's type; a key with no stored value is simply
//! omitted, so consumers treat missing keys as "unset". Stored image paths
//! are rewritten onto the public base URL.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::bootstrap::MetaKeyRegistry;
use crate::content::{ContentError, ContentRepository};
use crate::models::package::{META_LOGO, META_SCREENSHOT};
use crate::models::{Package, PackageFilter, PackageStatus, PackageType, User};
use crate::registry::ArtifactStore;

/// Failures on the catalog read path.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No package record for the requested name.
    #[error("`{name}` not found for name")]
    NotFound { name: String },

    /// The package exists but its archive is missing from storage.
    #[error("no stored artifact for package '{name}' version '{version}'")]
    MissingArtifact { name: String, version: String },

    /// Persistence failure in the content repository.
    #[error("content repository failure: {0}")]
    Content(#[from] ContentError),
}

/// Public projection of one package.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageView {
    pub package_name: String,
    pub name: String,
    pub description: String,
    pub keywords: Vec<String>,
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, Value>,
}

/// A resolved download: the on-disk path and the filename to serve it as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedArtifact {
    pub path: PathBuf,
    pub filename: String,
}

/// Read-side catalog over the content repository.
pub struct Catalog<R> {
    repository: R,
    artifacts: ArtifactStore,
    meta_keys: MetaKeyRegistry,
}

impl<R> Catalog<R>
where
    R: ContentRepository,
{
    /// Creates a catalog reader.
    pub fn new(repository: R, artifacts: ArtifactStore, meta_keys: MetaKeyRegistry) -> Self {
        Self {
            repository,
            artifacts,
            meta_keys,
        }
    }

    /// Looks up one package by name, any status.
    pub async fn get_package(&self, name: &str) -> Result<PackageView, CatalogError> {
        let package = self
            .repository
            .find_package_by_name(name)
            .await?
            .ok_or_else(|| CatalogError::NotFound {
                name: name.to_string(),
            })?;
        Ok(self.project(&package))
    }

    /// Lists published packages of one type, optionally restricted to a
    /// set of names.
    pub async fn list_packages(
        &self,
        package_type: PackageType,
        names: &[String],
    ) -> Result<Vec<PackageView>, CatalogError> {
        let packages = self
            .repository
            .list_packages(PackageFilter {
                package_type: Some(package_type),
                names: names.to_vec(),
                status: Some(PackageStatus::Published),
            })
            .await?;
        Ok(packages.iter().map(|package| self.project(package)).collect())
    }

    /// Lists the acting user's own packages, drafts included.
    pub async fn list_own_packages(&self, user: &User) -> Result<Vec<Package>, CatalogError> {
        Ok(self.repository.list_packages_by_author(user.id).await?)
    }

    /// Resolves a download for the package's current version and records
    /// it on the usage counter.
    ///
    /// Counter failures are logged and never block the file response.
    pub async fn download(&self, name: &str) -> Result<DownloadedArtifact, CatalogError> {
        let package = self
            .repository
            .find_package_by_name(name)
            .await?
            .ok_or_else(|| CatalogError::NotFound {
                name: name.to_string(),
            })?;

        let version = package.metadata.version.clone().unwrap_or_default();
        if version.is_empty()
            || !self
                .artifacts
                .archive_exists(package.package_type, &package.name, &version)
                .await
        {
            return Err(CatalogError::MissingArtifact {
                name: package.name,
                version,
            });
        }

        match self.repository.increment_download(package.id).await {
            Ok(count) => info!(package = %package.name, count, "download recorded"),
            Err(error) => warn!(
                package = %package.name,
                error = %error,
                "failed to record download; serving file anyway"
            ),
        }

        Ok(DownloadedArtifact {
            path: self
                .artifacts
                .archive_path(package.package_type, &package.name, &version),
            filename: format!("{}_{}.zip", package.name, version),
        })
    }

    /// Projects the metadata keys registered for the package's type,
    /// rewriting stored image paths onto the public base URL.
    fn project(&self, package: &Package) -> PackageView {
        let mut metadata = serde_json::Map::new();
        for key in self.meta_keys.keys_for(package.package_type) {
            let key = key.as_str();
            let Some(mut value) = package.metadata.value_for(key) else {
                continue;
            };
            if key == META_LOGO || key == META_SCREENSHOT {
                if let Some(relative) = value.as_str() {
                    if !relative.is_empty() {
                        value = Value::String(self.artifacts.public_url(relative));
                    }
                }
            }
            metadata.insert(key.to_string(), value);
        }

        PackageView {
            package_name: package.name.clone(),
            name: package.title.clone(),
            description: package.excerpt.clone(),
            keywords: package.tags.iter().map(|term| term.name.clone()).collect(),
            metadata,
        }
    }
}
