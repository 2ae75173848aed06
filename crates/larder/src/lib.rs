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

//! # Larder
//!
//! A package registry library for plugin and theme distribution. Authors
//! submit zip bundles; the registry validates the bundled descriptor,
//! enforces name ownership and strict version monotonicity, lays artifacts
//! out on secret-derived storage paths, and serves catalog views and
//! downloads with a usage counter.
//!
//! ## Architecture
//!
//! - [`inspect`]: extracts an uploaded zip and parses its descriptor
//! - [`registry`]: the submission pipeline, version policy, taxonomy
//!   resolution, and artifact store
//! - [`catalog`]: the read path (listings, single-package views, downloads)
//! - [`content`] / [`dal`]: the content repository boundary and its SQLite
//!   implementation
//! - [`bootstrap`]: one-call service wiring
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use larder::{Larder, LarderConfig};
//! use larder::models::User;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = LarderConfig::default();
//! config.storage.secret = "server-secret".to_string();
//!
//! let larder = Larder::init(config).await?;
//!
//! let author = User { id: 7, account: "jo".to_string() };
//! let package = larder
//!     .registry
//!     .submit("/tmp/upload/sample-plugin.zip".as_ref(), &author)
//!     .await?;
//!
//! let download = larder.catalog.download(&package.name).await?;
//! println!("serve {} as {}", download.path.display(), download.filename);
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod catalog;
pub mod config;
pub mod content;
pub mod dal;
pub mod database;
pub mod inspect;
pub mod logging;
pub mod models;
pub mod registry;

// Re-export the service surface
pub use bootstrap::{BootstrapError, Larder, MetaKeyRegistry};
pub use catalog::{Catalog, CatalogError, DownloadedArtifact, PackageView};
pub use config::{ConfigError, LarderConfig};
pub use content::{ContentError, ContentRepository};
pub use inspect::{ArchiveInspector, InspectError, Manifest, ZipInspector};
pub use registry::{
    ArtifactStore, ImageKind, PackagePreview, PackageRegistry, StorageError, SubmissionError,
};
