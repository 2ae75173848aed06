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

//! Taxonomy resolution.
//!
//! Manifest keywords are best-effort enrichment: a keyword that cannot be
//! normalized or whose tag cannot be created is skipped, never failing the
//! submission. The fold reports what it dropped so callers (and tests) can
//! observe the skipped set.

use std::collections::HashSet;

use tracing::debug;

use crate::content::ContentRepository;
use crate::models::Term;

/// Outcome of resolving a keyword list.
#[derive(Debug, Default)]
pub struct TagResolution {
    /// Tags that resolved or were created.
    pub resolved: Vec<Term>,
    /// Keywords dropped along the way.
    pub skipped: Vec<String>,
}

/// Normalizes free text into a dash-separated slug.
pub fn sanitize_with_dashes(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_separator = false;
    for ch in input.trim().to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(ch);
        } else {
            pending_separator = true;
        }
    }
    slug
}

/// Resolves keywords to tags, creating missing ones.
///
/// Duplicate keywords (by slug) collapse to a single tag; creation failures
/// are swallowed into `skipped`.
pub async fn resolve_keywords<R>(repository: &R, keywords: &[String]) -> TagResolution
where
    R: ContentRepository + ?Sized,
{
    let mut resolution = TagResolution::default();
    let mut seen = HashSet::new();

    for keyword in keywords {
        let slug = sanitize_with_dashes(keyword);
        if slug.is_empty() {
            resolution.skipped.push(keyword.clone());
            continue;
        }
        if !seen.insert(slug.clone()) {
            continue;
        }
        match repository.find_or_create_tag(keyword, &slug).await {
            Ok(term) => resolution.resolved.push(term),
            Err(error) => {
                debug!(keyword = %keyword, error = %error, "skipping unresolvable keyword");
                resolution.skipped.push(keyword.clone());
            }
        }
    }

    resolution
}
