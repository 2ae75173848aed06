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

//! DAL for package and package-metadata operations.
//!
//! All write paths run inside a single immediate transaction so a
//! submission's package row, metadata rows, and tag associations land
//! atomically, and the download counter's read-modify-write cannot lose
//! updates at this storage layer.

use chrono::Utc;
use diesel::prelude::*;
use diesel::QueryResult;

use crate::content::ContentError;
use crate::dal::models::{into_package, PackageBundle, PackageRow, TermRow};
use crate::dal::DAL;
use crate::database::schema::{package_meta, package_terms, packages, terms};
use crate::models::{package::META_DOWNLOAD, Package, PackageDraft, PackageFilter};

/// DAL for package rows and their metadata.
pub struct PackagesDAL<'a> {
    /// Reference to the main DAL instance
    pub dal: &'a DAL,
}

fn load_bundle(conn: &mut SqliteConnection, row: PackageRow) -> QueryResult<PackageBundle> {
    let metas = package_meta::table
        .filter(package_meta::package_id.eq(row.id))
        .select((package_meta::meta_key, package_meta::meta_value))
        .load::<(String, String)>(conn)?;

    let tags = package_terms::table
        .inner_join(terms::table)
        .filter(package_terms::package_id.eq(row.id))
        .select(TermRow::as_select())
        .load::<TermRow>(conn)?;

    Ok((row, metas, tags))
}

impl<'a> PackagesDAL<'a> {
    /// Looks up one package by its unique name slug.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Package>, ContentError> {
        let conn = self
            .dal
            .database
            .get_connection()
            .await
            .map_err(|e| ContentError::Pool(e.to_string()))?;

        let name = name.to_string();
        let bundle: Option<PackageBundle> = conn
            .interact(move |conn| -> QueryResult<Option<PackageBundle>> {
                let row = packages::table
                    .filter(packages::name.eq(&name))
                    .select(PackageRow::as_select())
                    .first::<PackageRow>(conn)
                    .optional()?;
                match row {
                    Some(row) => load_bundle(conn, row).map(Some),
                    None => Ok(None),
                }
            })
            .await
            .map_err(|e| ContentError::Database(e.to_string()))?
            .map_err(|e| ContentError::Database(format!("Database error: {}", e)))?;

        bundle.map(into_package).transpose()
    }

    /// Creates or updates a package keyed by name.
    ///
    /// The owner column is written only on the create path; metadata rows
    /// other than the download counter are replaced, as are the tag
    /// associations.
    pub async fn save(&self, draft: PackageDraft) -> Result<Package, ContentError> {
        let meta_rows = draft.metadata.to_rows()?;
        let draft_name = draft.name.clone();

        let conn = self
            .dal
            .database
            .get_connection()
            .await
            .map_err(|e| ContentError::Pool(e.to_string()))?;

        let bundle = conn
            .interact(move |conn| {
                conn.immediate_transaction(|conn| -> QueryResult<PackageBundle> {
                    let existing = packages::table
                        .filter(packages::name.eq(&draft.name))
                        .select(PackageRow::as_select())
                        .first::<PackageRow>(conn)
                        .optional()?;

                    let now = Utc::now().to_rfc3339();
                    let row: PackageRow = match existing {
                        Some(found) => diesel::update(
                            packages::table.filter(packages::id.eq(found.id)),
                        )
                        .set((
                            packages::title.eq(&draft.title),
                            packages::content.eq(&draft.content),
                            packages::excerpt.eq(&draft.excerpt),
                            packages::status.eq(draft.status.as_str()),
                            packages::package_type.eq(draft.package_type.as_str()),
                            packages::updated_at.eq(&now),
                        ))
                        .returning(PackageRow::as_returning())
                        .get_result(conn)?,
                        None => diesel::insert_into(packages::table)
                            .values((
                                packages::name.eq(&draft.name),
                                packages::title.eq(&draft.title),
                                packages::content.eq(&draft.content),
                                packages::excerpt.eq(&draft.excerpt),
                                packages::status.eq(draft.status.as_str()),
                                packages::package_type.eq(draft.package_type.as_str()),
                                packages::author_id.eq(draft.author),
                                packages::created_at.eq(&now),
                                packages::updated_at.eq(&now),
                            ))
                            .returning(PackageRow::as_returning())
                            .get_result(conn)?,
                    };

                    // Replace the metadata record; the download counter has
                    // its own write path and must survive resubmission.
                    diesel::delete(
                        package_meta::table
                            .filter(package_meta::package_id.eq(row.id))
                            .filter(package_meta::meta_key.ne(META_DOWNLOAD)),
                    )
                    .execute(conn)?;
                    for (key, value) in &meta_rows {
                        diesel::insert_into(package_meta::table)
                            .values((
                                package_meta::package_id.eq(row.id),
                                package_meta::meta_key.eq(key),
                                package_meta::meta_value.eq(value),
                            ))
                            .execute(conn)?;
                    }

                    diesel::delete(
                        package_terms::table.filter(package_terms::package_id.eq(row.id)),
                    )
                    .execute(conn)?;
                    for term_id in &draft.tag_ids {
                        diesel::insert_or_ignore_into(package_terms::table)
                            .values((
                                package_terms::package_id.eq(row.id),
                                package_terms::term_id.eq(*term_id),
                            ))
                            .execute(conn)?;
                    }

                    load_bundle(conn, row)
                })
            })
            .await
            .map_err(|e| ContentError::Database(e.to_string()))?
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(
                    diesel::result::DatabaseErrorKind::UniqueViolation,
                    _info,
                ) => ContentError::NameConflict {
                    name: draft_name.clone(),
                },
                other => ContentError::Database(format!("Database error: {}", other)),
            })?;

        into_package(bundle)
    }

    /// Lists packages matching the filter, newest first.
    pub async fn list(&self, filter: PackageFilter) -> Result<Vec<Package>, ContentError> {
        let conn = self
            .dal
            .database
            .get_connection()
            .await
            .map_err(|e| ContentError::Pool(e.to_string()))?;

        let bundles = conn
            .interact(move |conn| -> QueryResult<Vec<PackageBundle>> {
                let mut query = packages::table
                    .select(PackageRow::as_select())
                    .into_boxed();
                if let Some(package_type) = filter.package_type {
                    query = query.filter(packages::package_type.eq(package_type.as_str()));
                }
                if !filter.names.is_empty() {
                    query = query.filter(packages::name.eq_any(filter.names));
                }
                if let Some(status) = filter.status {
                    query = query.filter(packages::status.eq(status.as_str()));
                }

                let rows = query
                    .order(packages::created_at.desc())
                    .load::<PackageRow>(conn)?;
                rows.into_iter()
                    .map(|row| load_bundle(conn, row))
                    .collect()
            })
            .await
            .map_err(|e| ContentError::Database(e.to_string()))?
            .map_err(|e| ContentError::Database(format!("Database error: {}", e)))?;

        bundles.into_iter().map(into_package).collect()
    }

    /// Lists every package owned by `author_id`, regardless of status.
    pub async fn list_by_author(&self, author_id: i64) -> Result<Vec<Package>, ContentError> {
        let conn = self
            .dal
            .database
            .get_connection()
            .await
            .map_err(|e| ContentError::Pool(e.to_string()))?;

        let bundles = conn
            .interact(move |conn| -> QueryResult<Vec<PackageBundle>> {
                let rows = packages::table
                    .filter(packages::author_id.eq(author_id))
                    .select(PackageRow::as_select())
                    .order(packages::created_at.desc())
                    .load::<PackageRow>(conn)?;
                rows.into_iter()
                    .map(|row| load_bundle(conn, row))
                    .collect()
            })
            .await
            .map_err(|e| ContentError::Database(e.to_string()))?
            .map_err(|e| ContentError::Database(format!("Database error: {}", e)))?;

        bundles.into_iter().map(into_package).collect()
    }

    /// Atomically increments the download counter and returns the new value.
    ///
    /// The read and the upsert share one immediate transaction, so
    /// concurrent downloads serialize on SQLite's write lock instead of
    /// losing increments.
    pub async fn increment_download(&self, package_id: i64) -> Result<i64, ContentError> {
        let conn = self
            .dal
            .database
            .get_connection()
            .await
            .map_err(|e| ContentError::Pool(e.to_string()))?;

        conn.interact(move |conn| {
            conn.immediate_transaction(|conn| -> QueryResult<i64> {
                let current = package_meta::table
                    .filter(package_meta::package_id.eq(package_id))
                    .filter(package_meta::meta_key.eq(META_DOWNLOAD))
                    .select(package_meta::meta_value)
                    .first::<String>(conn)
                    .optional()?;

                let count = current
                    .as_deref()
                    .and_then(|raw| serde_json::from_str::<i64>(raw).ok())
                    .unwrap_or(0);
                let next = count + 1;

                diesel::insert_into(package_meta::table)
                    .values((
                        package_meta::package_id.eq(package_id),
                        package_meta::meta_key.eq(META_DOWNLOAD),
                        package_meta::meta_value.eq(next.to_string()),
                    ))
                    .on_conflict((package_meta::package_id, package_meta::meta_key))
                    .do_update()
                    .set(package_meta::meta_value.eq(next.to_string()))
                    .execute(conn)?;

                Ok(next)
            })
        })
        .await
        .map_err(|e| ContentError::Database(e.to_string()))?
        .map_err(|e| ContentError::Database(format!("Database error: {}", e)))
    }
}
