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

//! Row types for the content repository tables and their conversion into
//! domain models.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::content::ContentError;
use crate::database::schema::{packages, terms};
use crate::models::{Package, PackageMetadata, PackageStatus, PackageType, Term};

/// Raw `packages` row.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = packages)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PackageRow {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub status: String,
    pub package_type: String,
    pub author_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

/// Raw `terms` row.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = terms)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TermRow {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub kind: String,
}

impl From<TermRow> for Term {
    fn from(row: TermRow) -> Self {
        Term {
            id: row.id,
            name: row.name,
            slug: row.slug,
            kind: row.kind,
        }
    }
}

/// A package row together with its metadata rows and tag rows, as loaded
/// inside one connection closure.
pub(crate) type PackageBundle = (PackageRow, Vec<(String, String)>, Vec<TermRow>);

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ContentError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| ContentError::Database(format!("invalid stored timestamp '{}': {}", raw, e)))
}

/// Converts a loaded bundle into the domain [`Package`].
pub(crate) fn into_package(bundle: PackageBundle) -> Result<Package, ContentError> {
    let (row, metas, tag_rows) = bundle;

    let package_type = PackageType::parse(&row.package_type).ok_or_else(|| {
        ContentError::Database(format!("unknown package type '{}'", row.package_type))
    })?;
    let status = PackageStatus::parse(&row.status)
        .ok_or_else(|| ContentError::Database(format!("unknown package status '{}'", row.status)))?;

    let metadata =
        PackageMetadata::from_rows(metas.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    Ok(Package {
        id: row.id,
        name: row.name,
        package_type,
        title: row.title,
        content: row.content,
        excerpt: row.excerpt,
        status,
        author_id: row.author_id,
        metadata,
        tags: tag_rows.into_iter().map(Term::from).collect(),
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
    })
}
