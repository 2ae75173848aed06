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

//! Zip-backed archive inspector.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tempfile::TempDir;
use tracing::debug;

use crate::inspect::{
    ArchiveInspector, InspectError, InspectedArchive, Manifest, PLUGIN_DESCRIPTOR,
    THEME_DESCRIPTOR,
};
use crate::models::{ManifestAuthor, PackageType};
use crate::registry::version;

/// Inspector for zip bundles.
///
/// Extraction happens on the blocking thread pool; entry paths are
/// validated with `enclosed_name` so an archive cannot write outside its
/// scratch directory.
#[derive(Debug, Clone)]
pub struct ZipInspector {
    temp_root: PathBuf,
}

impl ZipInspector {
    /// Creates an inspector that extracts under `temp_root`.
    pub fn new(temp_root: impl Into<PathBuf>) -> Self {
        Self {
            temp_root: temp_root.into(),
        }
    }
}

#[async_trait]
impl ArchiveInspector for ZipInspector {
    async fn inspect(&self, archive_path: &Path) -> Result<InspectedArchive, InspectError> {
        let archive_path = archive_path.to_path_buf();
        let temp_root = self.temp_root.clone();

        tokio::task::spawn_blocking(move || inspect_blocking(&archive_path, &temp_root))
            .await
            .map_err(|e| InspectError::Task(e.to_string()))?
    }
}

/// Raw descriptor shape. Keywords are kept loosely typed so non-string
/// entries can be dropped instead of failing the parse.
#[derive(Debug, Deserialize)]
struct RawDescriptor {
    name: String,
    version: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    entrypoint: Option<String>,
    #[serde(default)]
    keywords: Vec<serde_json::Value>,
    #[serde(default)]
    authors: Vec<ManifestAuthor>,
    #[serde(default)]
    homepage: Option<String>,
    #[serde(default)]
    logo: Option<String>,
    #[serde(default)]
    screenshot: Option<String>,
    #[serde(rename = "miniOP", default)]
    min_host_version: Option<String>,
    #[serde(rename = "miniPHP", default)]
    min_runtime_version: Option<String>,
}

fn inspect_blocking(
    archive_path: &Path,
    temp_root: &Path,
) -> Result<InspectedArchive, InspectError> {
    let workdir = extract_archive(archive_path, temp_root)?;

    let (descriptor_path, package_type) =
        locate_descriptor(workdir.path())?.ok_or(InspectError::MissingDescriptor)?;

    let raw = fs::read_to_string(&descriptor_path).map_err(|source| InspectError::Io {
        path: descriptor_path.clone(),
        source,
    })?;
    let descriptor: RawDescriptor =
        serde_json::from_str(&raw).map_err(|source| InspectError::InvalidDescriptor {
            path: descriptor_path.clone(),
            source,
        })?;

    if version::parse_lenient(&descriptor.version).is_err() {
        return Err(InspectError::InvalidVersion {
            version: descriptor.version,
        });
    }

    let keywords = descriptor
        .keywords
        .into_iter()
        .filter_map(|value| match value {
            serde_json::Value::String(keyword) => Some(keyword),
            _ => None,
        })
        .collect();

    let manifest = Manifest {
        package_name: descriptor.name,
        version: descriptor.version,
        description: descriptor.description.unwrap_or_default(),
        entrypoint: descriptor.entrypoint,
        keywords,
        authors: descriptor.authors,
        homepage: descriptor.homepage,
        logo: descriptor.logo,
        screenshot: descriptor.screenshot,
        min_host_version: descriptor.min_host_version,
        min_runtime_version: descriptor.min_runtime_version,
    };

    let base_dir = descriptor_path
        .parent()
        .unwrap_or(workdir.path())
        .to_path_buf();

    debug!(
        package = %manifest.package_name,
        version = %manifest.version,
        package_type = %package_type,
        "inspected archive"
    );

    Ok(InspectedArchive::new(manifest, package_type, base_dir).with_workdir(workdir))
}

fn extract_archive(archive_path: &Path, temp_root: &Path) -> Result<TempDir, InspectError> {
    let workdir = tempfile::Builder::new()
        .prefix("larder-inspect-")
        .tempdir_in(temp_root)
        .map_err(|source| InspectError::Io {
            path: temp_root.to_path_buf(),
            source,
        })?;

    let file = fs::File::open(archive_path).map_err(|source| InspectError::Io {
        path: archive_path.to_path_buf(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(file)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let relative = match entry.enclosed_name() {
            Some(relative) => relative,
            None => {
                debug!(index, "skipping archive entry with unsafe path");
                continue;
            }
        };
        let dest = workdir.path().join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&dest).map_err(|source| InspectError::Io {
                path: dest.clone(),
                source,
            })?;
            continue;
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|source| InspectError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let mut out = fs::File::create(&dest).map_err(|source| InspectError::Io {
            path: dest.clone(),
            source,
        })?;
        std::io::copy(&mut entry, &mut out).map_err(|source| InspectError::Io {
            path: dest.clone(),
            source,
        })?;
    }

    Ok(workdir)
}

/// Finds the descriptor nearest to the archive root. A plugin descriptor
/// anywhere in the tree takes precedence over a theme descriptor.
fn locate_descriptor(root: &Path) -> Result<Option<(PathBuf, PackageType)>, InspectError> {
    let mut first_theme: Option<PathBuf> = None;
    let mut queue = VecDeque::from([root.to_path_buf()]);

    while let Some(dir) = queue.pop_front() {
        let plugin = dir.join(PLUGIN_DESCRIPTOR);
        if plugin.is_file() {
            return Ok(Some((plugin, PackageType::Plugin)));
        }
        let theme = dir.join(THEME_DESCRIPTOR);
        if first_theme.is_none() && theme.is_file() {
            first_theme = Some(theme);
        }

        let entries = fs::read_dir(&dir).map_err(|source| InspectError::Io {
            path: dir.clone(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| InspectError::Io {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_dir() {
                queue.push_back(path);
            }
        }
    }

    Ok(first_theme.map(|path| (path, PackageType::Theme)))
}
