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

//! DAL for taxonomy terms.

use diesel::prelude::*;
use diesel::QueryResult;

use crate::content::ContentError;
use crate::dal::models::TermRow;
use crate::dal::DAL;
use crate::database::schema::terms;
use crate::models::Term;

/// Taxonomy kind used for package keywords.
pub const TAG_KIND: &str = "tag";

/// DAL for taxonomy term operations.
pub struct TermsDAL<'a> {
    /// Reference to the main DAL instance
    pub dal: &'a DAL,
}

impl<'a> TermsDAL<'a> {
    /// Looks up a tag by `(slug, kind)`, creating it when absent.
    pub async fn find_or_create(&self, name: &str, slug: &str) -> Result<Term, ContentError> {
        let conn = self
            .dal
            .database
            .get_connection()
            .await
            .map_err(|e| ContentError::Pool(e.to_string()))?;

        let name = name.to_string();
        let slug = slug.to_string();

        let row = conn
            .interact(move |conn| {
                conn.immediate_transaction(|conn| -> QueryResult<TermRow> {
                    if let Some(found) = terms::table
                        .filter(terms::slug.eq(&slug))
                        .filter(terms::kind.eq(TAG_KIND))
                        .select(TermRow::as_select())
                        .first::<TermRow>(conn)
                        .optional()?
                    {
                        return Ok(found);
                    }

                    match diesel::insert_into(terms::table)
                        .values((
                            terms::name.eq(&name),
                            terms::slug.eq(&slug),
                            terms::kind.eq(TAG_KIND),
                        ))
                        .returning(TermRow::as_returning())
                        .get_result(conn)
                    {
                        Ok(created) => Ok(created),
                        Err(diesel::result::Error::DatabaseError(
                            diesel::result::DatabaseErrorKind::UniqueViolation,
                            _info,
                        )) => {
                            // Lost a concurrent create; the row exists now.
                            terms::table
                                .filter(terms::slug.eq(&slug))
                                .filter(terms::kind.eq(TAG_KIND))
                                .select(TermRow::as_select())
                                .first::<TermRow>(conn)
                        }
                        Err(e) => Err(e),
                    }
                })
            })
            .await
            .map_err(|e| ContentError::Database(e.to_string()))?
            .map_err(|e| ContentError::Database(format!("Database error: {}", e)))?;

        Ok(Term::from(row))
    }
}
