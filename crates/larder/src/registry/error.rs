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

//! Error types for submission and artifact storage.

use std::path::PathBuf;
use thiserror::Error;

use crate::content::ContentError;
use crate::inspect::InspectError;

/// Failures reported by the submission pipeline.
///
/// Validation failures (format, ownership, version) are detected before any
/// persistence and leave no trace beyond temp-file cleanup; later failures
/// may leave a persisted draft behind, which the next successful submission
/// overwrites.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// The uploaded file does not carry a `.zip` extension.
    #[error("uploaded file is not a zip package")]
    InvalidArchiveFormat,

    /// The archive could not be parsed into a plugin/theme manifest.
    #[error("archive does not contain a recognizable package manifest: {source}")]
    UnparseableManifest {
        #[source]
        source: InspectError,
    },

    /// The name is already claimed by a different owner.
    #[error("package name '{name}' is already claimed by another author")]
    NameOwnershipConflict { name: String },

    /// The candidate version does not supersede the stored one.
    #[error("submitted version {candidate} does not supersede stored version {current}")]
    VersionNotNewer { candidate: String, current: String },

    /// Persistence failure in the content repository.
    #[error("content repository failure: {0}")]
    Content(#[from] ContentError),

    /// Artifact placement failure.
    #[error("artifact storage failure: {0}")]
    Storage(#[from] StorageError),
}

/// Failures while placing files in the artifact store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Could not create an intermediate directory.
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not copy a file into place.
    #[error("failed to copy {src} to {dest}: {source}")]
    Copy {
        src: PathBuf,
        dest: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source path carries no usable filename.
    #[error("artifact source {path} has no usable filename")]
    InvalidFilename { path: PathBuf },
}
