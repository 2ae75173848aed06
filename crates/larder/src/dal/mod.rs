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

//! Data Access Layer for the SQLite content repository.
//!
//! The [`DAL`] struct is the single entry point; per-entity sub-DALs borrow
//! it for the duration of an operation. It also implements
//! [`ContentRepository`], making it the shipped persistence backend for the
//! registry core.

mod models;
mod packages;
mod terms;

pub use packages::PackagesDAL;
pub use terms::{TermsDAL, TAG_KIND};

use async_trait::async_trait;

use crate::content::{ContentError, ContentRepository};
use crate::database::Database;
use crate::models::{Package, PackageDraft, PackageFilter, Term};

/// Data access layer over the SQLite content database.
#[derive(Clone)]
pub struct DAL {
    /// Database connection pool
    pub database: Database,
}

impl DAL {
    /// Creates a new DAL instance.
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Package and metadata operations.
    pub fn packages(&self) -> PackagesDAL<'_> {
        PackagesDAL { dal: self }
    }

    /// Taxonomy term operations.
    pub fn terms(&self) -> TermsDAL<'_> {
        TermsDAL { dal: self }
    }
}

#[async_trait]
impl ContentRepository for DAL {
    async fn find_package_by_name(&self, name: &str) -> Result<Option<Package>, ContentError> {
        self.packages().find_by_name(name).await
    }

    async fn save_package(&self, draft: PackageDraft) -> Result<Package, ContentError> {
        self.packages().save(draft).await
    }

    async fn find_or_create_tag(&self, name: &str, slug: &str) -> Result<Term, ContentError> {
        self.terms().find_or_create(name, slug).await
    }

    async fn list_packages(&self, filter: PackageFilter) -> Result<Vec<Package>, ContentError> {
        self.packages().list(filter).await
    }

    async fn list_packages_by_author(
        &self,
        author_id: i64,
    ) -> Result<Vec<Package>, ContentError> {
        self.packages().list_by_author(author_id).await
    }

    async fn increment_download(&self, package_id: i64) -> Result<i64, ContentError> {
        self.packages().increment_download(package_id).await
    }
}
