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

//! Archive inspection.
//!
//! An uploaded bundle is a zip archive carrying a JSON descriptor at its
//! root (or below one wrapping directory): `plugin.json` marks a plugin,
//! `theme.json` marks a theme. The inspector extracts the archive into a
//! scratch directory, locates the descriptor, and parses it into a
//! [`Manifest`]. The extracted tree stays alive for the rest of the
//! submission so the pipeline can resolve README and preview-image paths
//! relative to the descriptor's directory.

pub mod error;
pub mod zip;

pub use error::InspectError;
pub use zip::ZipInspector;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

use crate::models::{ManifestAuthor, PackageType};

/// Descriptor filename that marks a plugin bundle.
pub const PLUGIN_DESCRIPTOR: &str = "plugin.json";
/// Descriptor filename that marks a theme bundle.
pub const THEME_DESCRIPTOR: &str = "theme.json";

/// Parsed package metadata extracted from an archive's descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Declared package identity, possibly namespaced with `/`.
    pub package_name: String,
    /// Declared version string (lenient semantic version).
    pub version: String,
    #[serde(default)]
    pub description: String,
    pub entrypoint: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub authors: Vec<ManifestAuthor>,
    pub homepage: Option<String>,
    pub logo: Option<String>,
    pub screenshot: Option<String>,
    /// Minimum host version requirement (stored under the `miniOP` key).
    #[serde(rename = "miniOP")]
    pub min_host_version: Option<String>,
    /// Minimum runtime version requirement (stored under the `miniPHP` key).
    #[serde(rename = "miniPHP")]
    pub min_runtime_version: Option<String>,
}

/// Result of inspecting an uploaded archive.
///
/// Holds the parsed manifest, the detected package type, and the directory
/// the descriptor was found in. When produced by [`ZipInspector`] the
/// extraction scratch directory is owned here and removed on drop.
#[derive(Debug)]
pub struct InspectedArchive {
    pub manifest: Manifest,
    pub package_type: PackageType,
    base_dir: PathBuf,
    _workdir: Option<TempDir>,
}

impl InspectedArchive {
    /// Builds an inspection result over an existing directory.
    pub fn new(manifest: Manifest, package_type: PackageType, base_dir: PathBuf) -> Self {
        Self {
            manifest,
            package_type,
            base_dir,
            _workdir: None,
        }
    }

    /// Attaches the extraction scratch directory, tying its lifetime to
    /// this inspection result.
    pub fn with_workdir(mut self, workdir: TempDir) -> Self {
        self._workdir = Some(workdir);
        self
    }

    /// Directory containing the descriptor; README and preview-image paths
    /// are resolved relative to it.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

/// Parses an uploaded archive into a manifest.
#[async_trait]
pub trait ArchiveInspector: Send + Sync {
    /// Inspects the archive at `archive_path`.
    ///
    /// Fails when the file is not a readable zip bundle or no recognizable
    /// descriptor is present.
    async fn inspect(&self, archive_path: &Path) -> Result<InspectedArchive, InspectError>;
}
