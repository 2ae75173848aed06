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

//! Content repository boundary.
//!
//! The registry core treats package/tag persistence as an external
//! collaborator behind the [`ContentRepository`] trait. The shipped
//! implementation is the SQLite-backed [`crate::dal::DAL`]; tests substitute
//! their own implementations to exercise failure paths.

pub mod error;

pub use error::ContentError;

use async_trait::async_trait;

use crate::models::{Package, PackageDraft, PackageFilter, Term};

/// Persistence operations the registry core requires.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Looks up a package by its unique name slug.
    async fn find_package_by_name(&self, name: &str) -> Result<Option<Package>, ContentError>;

    /// Creates or updates a package, keyed by name.
    ///
    /// On create the draft's `author` becomes the permanent owner and a
    /// concurrent create for the same name surfaces as
    /// [`ContentError::NameConflict`] for the loser. On update the stored
    /// owner and the download counter are left untouched; metadata rows and
    /// tag associations are replaced with the draft's.
    async fn save_package(&self, draft: PackageDraft) -> Result<Package, ContentError>;

    /// Looks up a tag by slug, creating it when absent.
    async fn find_or_create_tag(&self, name: &str, slug: &str) -> Result<Term, ContentError>;

    /// Lists packages matching the filter.
    async fn list_packages(&self, filter: PackageFilter) -> Result<Vec<Package>, ContentError>;

    /// Lists every package owned by `author_id`, drafts included.
    async fn list_packages_by_author(&self, author_id: i64)
        -> Result<Vec<Package>, ContentError>;

    /// Atomically increments the download counter, returning the new value.
    async fn increment_download(&self, package_id: i64) -> Result<i64, ContentError>;
}
