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

//! Submission pipeline.
//!
//! `submit` sequences inspection, the ownership gate, the version policy,
//! preview-image extraction, taxonomy resolution, README rendering,
//! persistence, and artifact placement. The first hard-gate failure aborts
//! the pipeline; the uploaded temp archive is deleted on every exit path,
//! success included.
//!
//! Failures after persistence (a failed artifact copy) can leave a draft
//! behind with no archive on disk; the next accepted submission overwrites
//! it, so this inconsistency is recoverable and not rolled back here.

use std::ffi::OsStr;
use std::path::Path;

use serde::Serialize;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use crate::content::{ContentError, ContentRepository};
use crate::inspect::{ArchiveInspector, InspectError, Manifest};
use crate::models::{Package, PackageDraft, PackageMetadata, PackageStatus, PackageType, User};
use crate::registry::artifacts::{is_supported_image, ArtifactStore, ImageKind};
use crate::registry::error::SubmissionError;
use crate::registry::{markdown, taxonomy, version};

/// Manifest report produced by an upload preview, before anything is
/// persisted.
#[derive(Debug, Serialize)]
pub struct PackagePreview {
    pub package_type: PackageType,
    pub manifest: Manifest,
}

/// Orchestrates package submissions against a content repository, an
/// archive inspector, and the artifact store.
pub struct PackageRegistry<R, I> {
    repository: R,
    inspector: I,
    artifacts: ArtifactStore,
}

impl<R, I> PackageRegistry<R, I>
where
    R: ContentRepository,
    I: ArchiveInspector,
{
    /// Creates a new registry pipeline.
    pub fn new(repository: R, inspector: I, artifacts: ArtifactStore) -> Self {
        Self {
            repository,
            inspector,
            artifacts,
        }
    }

    /// The artifact store this registry writes to.
    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    /// Submits an uploaded archive on behalf of `user`.
    ///
    /// Returns the persisted package, or the first gate failure. The temp
    /// archive at `archive_path` is deleted exactly once on every exit
    /// path.
    pub async fn submit(
        &self,
        archive_path: &Path,
        user: &User,
    ) -> Result<Package, SubmissionError> {
        if !has_zip_extension(archive_path) {
            remove_temp_archive(archive_path).await;
            return Err(SubmissionError::InvalidArchiveFormat);
        }

        let result = self.run_pipeline(archive_path, user).await;
        remove_temp_archive(archive_path).await;
        result
    }

    /// Inspects an uploaded archive without persisting anything.
    ///
    /// The temp archive is kept on success (and on manifest failures) so a
    /// subsequent `submit` can consume it; only a non-zip upload is deleted
    /// outright.
    pub async fn preview(&self, archive_path: &Path) -> Result<PackagePreview, SubmissionError> {
        if !has_zip_extension(archive_path) {
            remove_temp_archive(archive_path).await;
            return Err(SubmissionError::InvalidArchiveFormat);
        }

        let inspected = self
            .inspector
            .inspect(archive_path)
            .await
            .map_err(|source| SubmissionError::UnparseableManifest { source })?;

        Ok(PackagePreview {
            package_type: inspected.package_type,
            manifest: inspected.manifest,
        })
    }

    async fn run_pipeline(
        &self,
        archive_path: &Path,
        user: &User,
    ) -> Result<Package, SubmissionError> {
        let inspected = self
            .inspector
            .inspect(archive_path)
            .await
            .map_err(|source| SubmissionError::UnparseableManifest { source })?;

        let package_type = inspected.package_type;
        let name = inspected.manifest.package_name.replace('/', "_");

        // Ownership is permanent once a name is claimed; nothing is written
        // before this gate passes.
        let existing = self.repository.find_package_by_name(&name).await?;
        if let Some(existing_package) = &existing {
            if let Some(owner) = existing_package.author_id {
                if owner != user.id {
                    return Err(SubmissionError::NameOwnershipConflict { name });
                }
            }
        }

        let candidate = version::parse_lenient(&inspected.manifest.version).map_err(|_| {
            SubmissionError::UnparseableManifest {
                source: InspectError::InvalidVersion {
                    version: inspected.manifest.version.clone(),
                },
            }
        })?;
        if let Some(existing_package) = &existing {
            if let Some(current_raw) = existing_package.metadata.version.as_deref() {
                match version::parse_lenient(current_raw) {
                    Ok(current) => {
                        if !version::accepts(&candidate, Some(&current)) {
                            return Err(SubmissionError::VersionNotNewer {
                                candidate: inspected.manifest.version.clone(),
                                current: current_raw.to_string(),
                            });
                        }
                    }
                    Err(_) => warn!(
                        package = %name,
                        stored = %current_raw,
                        "stored version does not parse; accepting candidate"
                    ),
                }
            }
        }

        let logo = self
            .extract_preview_image(
                inspected.base_dir(),
                &name,
                ImageKind::Logo,
                inspected.manifest.logo.as_deref(),
            )
            .await;
        let screenshot = self
            .extract_preview_image(
                inspected.base_dir(),
                &name,
                ImageKind::Screenshot,
                inspected.manifest.screenshot.as_deref(),
            )
            .await;

        let resolution =
            taxonomy::resolve_keywords(&self.repository, &inspected.manifest.keywords).await;
        if !resolution.skipped.is_empty() {
            debug!(
                package = %name,
                skipped = ?resolution.skipped,
                "some keywords were not resolved to tags"
            );
        }

        let content = self
            .render_readme(inspected.base_dir(), &inspected.manifest.description)
            .await;

        let manifest = &inspected.manifest;
        let metadata = PackageMetadata {
            version: Some(manifest.version.clone()),
            entrypoint: manifest.entrypoint.clone(),
            logo,
            screenshot,
            authors: if manifest.authors.is_empty() {
                None
            } else {
                Some(manifest.authors.clone())
            },
            homepage: manifest.homepage.clone(),
            min_host_version: manifest.min_host_version.clone(),
            min_runtime_version: manifest.min_runtime_version.clone(),
            downloads: None,
        };

        let draft = PackageDraft {
            name: name.clone(),
            package_type,
            title: manifest.package_name.clone(),
            content,
            excerpt: manifest.description.clone(),
            status: PackageStatus::Draft,
            metadata,
            tag_ids: resolution.resolved.iter().map(|term| term.id).collect(),
            author: if existing.is_none() {
                Some(user.id)
            } else {
                None
            },
        };

        let package = self
            .repository
            .save_package(draft)
            .await
            .map_err(|error| match error {
                // a concurrent create won the name; the loser reports the
                // ownership conflict
                ContentError::NameConflict { .. } => SubmissionError::NameOwnershipConflict {
                    name: name.clone(),
                },
                other => SubmissionError::Content(other),
            })?;

        self.artifacts
            .store_archive(archive_path, package_type, &name, &manifest.version)
            .await?;

        info!(
            package = %name,
            version = %manifest.version,
            package_type = %package_type,
            "package submission accepted"
        );

        Ok(package)
    }

    /// Resolves a declared preview image against the archive contents.
    ///
    /// Returns `None` when the manifest declares nothing, the stored
    /// public-relative path on success, and an empty value when the
    /// declared file is missing or not a supported image (a bad preview is
    /// never fatal).
    async fn extract_preview_image(
        &self,
        base_dir: &Path,
        name: &str,
        kind: ImageKind,
        declared: Option<&str>,
    ) -> Option<String> {
        let declared = declared?.trim();
        if declared.is_empty() {
            return None;
        }

        let source = base_dir.join(strip_relative_prefix(declared));
        match read_head(&source).await {
            Some(head) if is_supported_image(&head) => {
                match self.artifacts.store_image(&source, kind, name).await {
                    Ok(relative) => Some(relative),
                    Err(error) => {
                        warn!(
                            kind = %kind,
                            error = %error,
                            "failed to store preview image; clearing field"
                        );
                        Some(String::new())
                    }
                }
            }
            _ => {
                debug!(
                    kind = %kind,
                    path = %source.display(),
                    "declared preview image missing or unsupported; clearing field"
                );
                Some(String::new())
            }
        }
    }

    /// Loads and renders the bundle README, falling back to the manifest
    /// description. When both `README.md` and `readme.md` exist, the
    /// lowercase file wins.
    async fn render_readme(&self, base_dir: &Path, fallback: &str) -> String {
        let mut readme = None;
        for candidate in ["README.md", "readme.md"] {
            let path = base_dir.join(candidate);
            if let Ok(text) = tokio::fs::read_to_string(&path).await {
                readme = Some(text);
            }
        }
        match readme {
            Some(text) if !text.trim().is_empty() => markdown::render(&text),
            _ => fallback.to_string(),
        }
    }
}

fn has_zip_extension(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}

fn strip_relative_prefix(mut declared: &str) -> &str {
    loop {
        if let Some(rest) = declared.strip_prefix("./") {
            declared = rest;
        } else if let Some(rest) = declared.strip_prefix('/') {
            declared = rest;
        } else {
            return declared;
        }
    }
}

async fn read_head(path: &Path) -> Option<Vec<u8>> {
    let mut file = tokio::fs::File::open(path).await.ok()?;
    let mut head = Vec::with_capacity(16);
    let mut buf = [0u8; 16];
    while head.len() < 16 {
        let read = file.read(&mut buf[..16 - head.len()]).await.ok()?;
        if read == 0 {
            break;
        }
        head.extend_from_slice(&buf[..read]);
    }
    Some(head)
}

async fn remove_temp_archive(path: &Path) {
    if let Err(error) = tokio::fs::remove_file(path).await {
        if error.kind() != std::io::ErrorKind::NotFound {
            warn!(
                path = %path.display(),
                error = %error,
                "failed to remove temporary archive"
            );
        }
    }
}
