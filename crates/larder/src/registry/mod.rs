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

//! # Package Registry
//!
//! This module implements the submission, versioning, and artifact-storage
//! pipeline. An uploaded archive flows through inspection, the ownership
//! gate, the version policy, asset extraction, taxonomy resolution, and
//! README rendering before the package state is persisted and the archive
//! is copied into the artifact store.
//!
//! ## Key Components
//!
//! - [`submission`]: the pipeline orchestrator
//! - [`artifacts`]: derived storage paths and file placement
//! - [`version`]: strict version monotonicity policy
//! - [`taxonomy`]: best-effort keyword-to-tag resolution
//! - [`error`]: submission and storage error types

pub mod artifacts;
pub mod error;
pub mod markdown;
pub mod submission;
pub mod taxonomy;
pub mod version;

// Re-export commonly used types
pub use artifacts::{ArtifactStore, ImageKind};
pub use error::{StorageError, SubmissionError};
pub use submission::{PackagePreview, PackageRegistry};
pub use taxonomy::TagResolution;
