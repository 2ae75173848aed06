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

//! Error types for the content repository boundary.

use thiserror::Error;

/// Failures reported by a [`super::ContentRepository`] implementation.
#[derive(Debug, Error)]
pub enum ContentError {
    /// The package name is already taken (unique constraint on `name`).
    #[error("package name '{name}' already exists")]
    NameConflict { name: String },

    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(String),

    /// Connection pool failure.
    #[error("connection pool error: {0}")]
    Pool(String),

    /// Metadata value could not be serialized.
    #[error("metadata serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
