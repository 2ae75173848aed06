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

//! Error types for archive inspection.

use std::path::PathBuf;
use thiserror::Error;

/// Failures while inspecting an uploaded archive.
#[derive(Debug, Error)]
pub enum InspectError {
    /// Filesystem failure while reading or extracting the archive.
    #[error("I/O failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a readable zip archive.
    #[error("archive is not a readable zip bundle: {0}")]
    Archive(#[from] ::zip::result::ZipError),

    /// Neither a plugin nor a theme descriptor was found.
    #[error("no plugin or theme descriptor found in archive")]
    MissingDescriptor,

    /// The descriptor exists but is not valid JSON for the expected shape.
    #[error("invalid descriptor {path}: {source}")]
    InvalidDescriptor {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The descriptor's version does not parse as a semantic version.
    #[error("descriptor declares unparseable version '{version}'")]
    InvalidVersion { version: String },

    /// The blocking inspection task was cancelled or panicked.
    #[error("archive inspection task failed: {0}")]
    Task(String),
}
