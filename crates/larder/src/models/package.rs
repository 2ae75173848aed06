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

//! Domain model for packages, their metadata record, and taxonomy terms.
//!
//! The metadata record is a typed projection of the per-package key-value
//! rows. Every field is optional: absent fields produce no stored row, and
//! missing rows deserialize back to `None`, so callers always treat a
//! missing key as "unset" rather than zero or empty.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Storage key for the package version.
pub const META_VERSION: &str = "version";
/// Storage key for the plugin entrypoint.
pub const META_ENTRYPOINT: &str = "entrypoint";
/// Storage key for the logo image path.
pub const META_LOGO: &str = "logo";
/// Storage key for the screenshot image path.
pub const META_SCREENSHOT: &str = "screenshot";
/// Storage key for the author list.
pub const META_AUTHORS: &str = "authors";
/// Storage key for the project homepage.
pub const META_HOMEPAGE: &str = "homepage";
/// Storage key for the minimum host version requirement.
pub const META_MIN_HOST: &str = "miniOP";
/// Storage key for the minimum runtime version requirement.
pub const META_MIN_RUNTIME: &str = "miniPHP";
/// Storage key for the download counter.
pub const META_DOWNLOAD: &str = "download";

/// Kind of package, fixed at creation from the archive's descriptor shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    Plugin,
    Theme,
}

impl PackageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageType::Plugin => "plugin",
            PackageType::Theme => "theme",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "plugin" => Some(PackageType::Plugin),
            "theme" => Some(PackageType::Theme),
            _ => None,
        }
    }
}

impl std::fmt::Display for PackageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visibility lifecycle state. Submissions are always written as `Draft`;
/// promotion to `Published` is an editorial action outside this library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageStatus {
    Draft,
    Published,
}

impl PackageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageStatus::Draft => "draft",
            PackageStatus::Published => "published",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(PackageStatus::Draft),
            "published" => Some(PackageStatus::Published),
            _ => None,
        }
    }
}

impl std::fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a descriptor's author list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestAuthor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
}

/// Typed metadata record for a package.
///
/// Values are stored as JSON-encoded text in the key-value rows; the
/// download counter is written by the catalog's increment path and is never
/// part of a submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub version: Option<String>,
    pub entrypoint: Option<String>,
    pub logo: Option<String>,
    pub screenshot: Option<String>,
    pub authors: Option<Vec<ManifestAuthor>>,
    pub homepage: Option<String>,
    pub min_host_version: Option<String>,
    pub min_runtime_version: Option<String>,
    pub downloads: Option<i64>,
}

impl PackageMetadata {
    /// Serializes the present fields into `(key, json_value)` rows.
    ///
    /// The download counter is intentionally excluded: it has its own
    /// write path and survives metadata replacement on resubmission.
    pub fn to_rows(&self) -> Result<Vec<(String, String)>, serde_json::Error> {
        let mut rows = Vec::new();
        let mut push = |key: &str, value: Value| {
            rows.push((key.to_string(), value.to_string()));
        };

        if let Some(version) = &self.version {
            push(META_VERSION, Value::String(version.clone()));
        }
        if let Some(entrypoint) = &self.entrypoint {
            push(META_ENTRYPOINT, Value::String(entrypoint.clone()));
        }
        if let Some(logo) = &self.logo {
            push(META_LOGO, Value::String(logo.clone()));
        }
        if let Some(screenshot) = &self.screenshot {
            push(META_SCREENSHOT, Value::String(screenshot.clone()));
        }
        if let Some(authors) = &self.authors {
            push(META_AUTHORS, serde_json::to_value(authors)?);
        }
        if let Some(homepage) = &self.homepage {
            push(META_HOMEPAGE, Value::String(homepage.clone()));
        }
        if let Some(min_host) = &self.min_host_version {
            push(META_MIN_HOST, Value::String(min_host.clone()));
        }
        if let Some(min_runtime) = &self.min_runtime_version {
            push(META_MIN_RUNTIME, Value::String(min_runtime.clone()));
        }
        Ok(rows)
    }

    /// Rebuilds the record from stored `(key, json_value)` rows.
    ///
    /// Unknown keys and rows that fail to decode are skipped; a corrupt row
    /// degrades to an unset field instead of failing the whole read.
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut metadata = PackageMetadata::default();
        for (key, raw) in rows {
            let value: Value = match serde_json::from_str(raw) {
                Ok(value) => value,
                Err(_) => continue,
            };
            match key {
                META_VERSION => metadata.version = value.as_str().map(str::to_string),
                META_ENTRYPOINT => metadata.entrypoint = value.as_str().map(str::to_string),
                META_LOGO => metadata.logo = value.as_str().map(str::to_string),
                META_SCREENSHOT => metadata.screenshot = value.as_str().map(str::to_string),
                META_AUTHORS => metadata.authors = serde_json::from_value(value).ok(),
                META_HOMEPAGE => metadata.homepage = value.as_str().map(str::to_string),
                META_MIN_HOST => metadata.min_host_version = value.as_str().map(str::to_string),
                META_MIN_RUNTIME => {
                    metadata.min_runtime_version = value.as_str().map(str::to_string)
                }
                META_DOWNLOAD => metadata.downloads = value.as_i64(),
                _ => {}
            }
        }
        metadata
    }

    /// Returns the JSON value stored under `key`, if the field is set.
    pub fn value_for(&self, key: &str) -> Option<Value> {
        match key {
            META_VERSION => self.version.clone().map(Value::String),
            META_ENTRYPOINT => self.entrypoint.clone().map(Value::String),
            META_LOGO => self.logo.clone().map(Value::String),
            META_SCREENSHOT => self.screenshot.clone().map(Value::String),
            META_AUTHORS => self
                .authors
                .as_ref()
                .and_then(|authors| serde_json::to_value(authors).ok()),
            META_HOMEPAGE => self.homepage.clone().map(Value::String),
            META_MIN_HOST => self.min_host_version.clone().map(Value::String),
            META_MIN_RUNTIME => self.min_runtime_version.clone().map(Value::String),
            META_DOWNLOAD => self.downloads.map(Value::from),
            _ => None,
        }
    }
}

/// A taxonomy term. In this registry the kind is always `"tag"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub kind: String,
}

/// Identity handle for the acting user, resolved by the (external)
/// identity layer before the pipeline runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub account: String,
}

/// A stored package with its metadata record and tag associations.
#[derive(Debug, Clone)]
pub struct Package {
    pub id: i64,
    pub name: String,
    pub package_type: PackageType,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub status: PackageStatus,
    pub author_id: Option<i64>,
    pub metadata: PackageMetadata,
    pub tags: Vec<Term>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Desired package state handed to the content repository for persistence.
///
/// `author` is applied only when the package does not exist yet; an
/// existing package keeps its original owner.
#[derive(Debug, Clone)]
pub struct PackageDraft {
    pub name: String,
    pub package_type: PackageType,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub status: PackageStatus,
    pub metadata: PackageMetadata,
    pub tag_ids: Vec<i64>,
    pub author: Option<i64>,
}

/// Filter for catalog listings.
#[derive(Debug, Clone, Default)]
pub struct PackageFilter {
    pub package_type: Option<PackageType>,
    pub names: Vec<String>,
    pub status: Option<PackageStatus>,
}
