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

//! Integration tests for the submission pipeline.

use async_trait::async_trait;

use larder::content::{ContentError, ContentRepository};
use larder::models::{Package, PackageDraft, PackageFilter, PackageStatus, PackageType, Term};
use larder::registry::taxonomy;
use larder::{CatalogError, PackageRegistry, SubmissionError};

use crate::fixtures;

#[tokio::test]
async fn submit_creates_draft_package() {
    let h = fixtures::harness().await;
    let archive = fixtures::plugin_archive(
        &h.uploads(),
        "sample.zip",
        "acme/sample-plugin",
        "1.0.0",
    );

    let package = h
        .larder
        .registry
        .submit(&archive, &fixtures::user(1, "jo"))
        .await
        .expect("submission should succeed");

    // slashes in the declared identity normalize to underscores
    assert_eq!(package.name, "acme_sample-plugin");
    assert_eq!(package.package_type, PackageType::Plugin);
    assert_eq!(package.status, PackageStatus::Draft);
    assert_eq!(package.author_id, Some(1));
    assert_eq!(package.title, "acme/sample-plugin");
    assert_eq!(package.excerpt, "A sample plugin");
    assert_eq!(package.metadata.version.as_deref(), Some("1.0.0"));
    assert_eq!(package.metadata.min_host_version.as_deref(), Some("1.2"));
    assert_eq!(package.metadata.min_runtime_version.as_deref(), Some("8.0"));

    let mut slugs: Vec<_> = package.tags.iter().map(|t| t.slug.as_str()).collect();
    slugs.sort();
    assert_eq!(slugs, vec!["analytics", "metrics"]);
    assert!(package.tags.iter().all(|t| t.kind == "tag"));

    // temp archive consumed, artifact placed on the derived path
    assert!(!archive.exists());
    let stored = h
        .larder
        .registry
        .artifacts()
        .archive_path(PackageType::Plugin, &package.name, "1.0.0");
    assert!(stored.exists());
    assert!(stored.starts_with(h.asset_root()));
}

#[tokio::test]
async fn version_monotonicity_is_enforced() {
    let h = fixtures::harness().await;
    let jo = fixtures::user(1, "jo");

    let v1 = fixtures::plugin_archive(&h.uploads(), "v1.zip", "acme/sample-plugin", "1.0.0");
    h.larder.registry.submit(&v1, &jo).await.expect("v1.0.0 accepted");

    // resubmitting the same version is rejected
    let same = fixtures::plugin_archive(&h.uploads(), "same.zip", "acme/sample-plugin", "1.0.0");
    let err = h.larder.registry.submit(&same, &jo).await.unwrap_err();
    assert!(matches!(err, SubmissionError::VersionNotNewer { .. }));
    assert!(!same.exists());

    // a lower version is rejected too
    let lower = fixtures::plugin_archive(&h.uploads(), "lower.zip", "acme/sample-plugin", "0.9.0");
    let err = h.larder.registry.submit(&lower, &jo).await.unwrap_err();
    assert!(matches!(err, SubmissionError::VersionNotNewer { .. }));

    // a newer version is accepted and the old archive stays on disk
    let v11 = fixtures::plugin_archive(&h.uploads(), "v11.zip", "acme/sample-plugin", "1.1.0");
    let package = h.larder.registry.submit(&v11, &jo).await.expect("v1.1.0 accepted");
    assert_eq!(package.metadata.version.as_deref(), Some("1.1.0"));

    let artifacts = h.larder.registry.artifacts();
    assert!(artifacts
        .archive_path(PackageType::Plugin, &package.name, "1.0.0")
        .exists());
    assert!(artifacts
        .archive_path(PackageType::Plugin, &package.name, "1.1.0")
        .exists());
}

#[tokio::test]
async fn ownership_is_permanent_once_claimed() {
    let h = fixtures::harness().await;

    let v1 = fixtures::plugin_archive(&h.uploads(), "v1.zip", "acme/sample-plugin", "1.0.0");
    h.larder
        .registry
        .submit(&v1, &fixtures::user(1, "jo"))
        .await
        .expect("first submission");

    // another user cannot take over the name, version regardless
    let v2 = fixtures::plugin_archive(&h.uploads(), "v2.zip", "acme/sample-plugin", "2.0.0");
    let err = h
        .larder
        .registry
        .submit(&v2, &fixtures::user(2, "mallory"))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::NameOwnershipConflict { .. }));

    // the stored package is untouched
    let view = h.larder.catalog.get_package("acme_sample-plugin").await.unwrap();
    assert_eq!(
        view.metadata.get("version"),
        Some(&serde_json::json!("1.0.0"))
    );
}

#[tokio::test]
async fn non_zip_upload_is_rejected_and_deleted() {
    let h = fixtures::harness().await;
    let bogus = h.uploads().join("upload.tar.gz");
    std::fs::write(&bogus, b"whatever").unwrap();

    let err = h
        .larder
        .registry
        .submit(&bogus, &fixtures::user(1, "jo"))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::InvalidArchiveFormat));
    assert!(!bogus.exists());
}

#[tokio::test]
async fn archive_without_descriptor_is_unparseable() {
    let h = fixtures::harness().await;
    let archive = fixtures::write_archive(
        &h.uploads(),
        "junk.zip",
        &[("readme.txt", b"nothing to see".as_slice())],
    );

    let err = h
        .larder
        .registry
        .submit(&archive, &fixtures::user(1, "jo"))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::UnparseableManifest { .. }));
    assert!(!archive.exists());
}

#[tokio::test]
async fn dangling_logo_clears_the_field_without_failing() {
    let h = fixtures::harness().await;
    let mut descriptor = fixtures::plugin_descriptor("acme/sample-plugin", "1.0.0");
    descriptor["logo"] = serde_json::json!("assets/logo.png");
    let archive = fixtures::write_archive(
        &h.uploads(),
        "sample.zip",
        &[("plugin.json", descriptor.to_string().as_bytes())],
    );

    let package = h
        .larder
        .registry
        .submit(&archive, &fixtures::user(1, "jo"))
        .await
        .expect("submission succeeds despite missing logo");
    assert_eq!(package.metadata.logo.as_deref(), Some(""));
}

#[tokio::test]
async fn non_image_logo_clears_the_field() {
    let h = fixtures::harness().await;
    let mut descriptor = fixtures::plugin_descriptor("acme/sample-plugin", "1.0.0");
    descriptor["logo"] = serde_json::json!("assets/logo.png");
    let archive = fixtures::write_archive(
        &h.uploads(),
        "sample.zip",
        &[
            ("plugin.json", descriptor.to_string().as_bytes()),
            ("assets/logo.png", b"this is not a png".as_slice()),
        ],
    );

    let package = h
        .larder
        .registry
        .submit(&archive, &fixtures::user(1, "jo"))
        .await
        .unwrap();
    assert_eq!(package.metadata.logo.as_deref(), Some(""));
}

#[tokio::test]
async fn valid_logo_is_copied_into_the_store() {
    let h = fixtures::harness().await;
    let mut descriptor = fixtures::plugin_descriptor("acme/sample-plugin", "1.0.0");
    descriptor["logo"] = serde_json::json!("./assets/logo.png");
    let archive = fixtures::write_archive(
        &h.uploads(),
        "sample.zip",
        &[
            ("plugin.json", descriptor.to_string().as_bytes()),
            ("assets/logo.png", fixtures::PNG_BYTES),
        ],
    );

    let package = h
        .larder
        .registry
        .submit(&archive, &fixtures::user(1, "jo"))
        .await
        .unwrap();

    // stored under the image layout, filename is the source stem
    let relative = "upload/images/logo/acme_sample-plugin/logo";
    assert_eq!(package.metadata.logo.as_deref(), Some(relative));
    assert!(h.asset_root().join(relative).exists());
}

#[tokio::test]
async fn readme_is_rendered_with_description_fallback() {
    let h = fixtures::harness().await;

    let descriptor = fixtures::plugin_descriptor("acme/with-readme", "1.0.0");
    let archive = fixtures::write_archive(
        &h.uploads(),
        "with-readme.zip",
        &[
            ("plugin.json", descriptor.to_string().as_bytes()),
            ("README.md", b"# Sample Plugin\n\nSome **bold** text".as_slice()),
        ],
    );
    let package = h
        .larder
        .registry
        .submit(&archive, &fixtures::user(1, "jo"))
        .await
        .unwrap();
    assert!(package.content.contains("<h1>"));
    assert!(package.content.contains("<strong>bold</strong>"));

    // no README: the body falls back to the manifest description
    let bare = fixtures::plugin_archive(&h.uploads(), "bare.zip", "acme/bare", "1.0.0");
    let package = h
        .larder
        .registry
        .submit(&bare, &fixtures::user(1, "jo"))
        .await
        .unwrap();
    assert_eq!(package.content, "A sample plugin");
}

#[tokio::test]
async fn preview_reports_the_manifest_without_persisting() {
    let h = fixtures::harness().await;
    let archive = fixtures::plugin_archive(
        &h.uploads(),
        "preview.zip",
        "acme/previewed",
        "1.0.0",
    );

    let preview = h.larder.registry.preview(&archive).await.unwrap();
    assert_eq!(preview.package_type, PackageType::Plugin);
    assert_eq!(preview.manifest.package_name, "acme/previewed");

    // nothing was stored and the upload is kept for a later submit
    let err = h.larder.catalog.get_package("acme_previewed").await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { .. }));
    assert!(archive.exists());
}

/// Repository wrapper that refuses to create one specific tag.
struct FailingTagRepo<R> {
    inner: R,
    poison: String,
}

#[async_trait]
impl<R: ContentRepository> ContentRepository for FailingTagRepo<R> {
    async fn find_package_by_name(&self, name: &str) -> Result<Option<Package>, ContentError> {
        self.inner.find_package_by_name(name).await
    }

    async fn save_package(&self, draft: PackageDraft) -> Result<Package, ContentError> {
        self.inner.save_package(draft).await
    }

    async fn find_or_create_tag(&self, name: &str, slug: &str) -> Result<Term, ContentError> {
        if name == self.poison {
            return Err(ContentError::Database("simulated tag failure".to_string()));
        }
        self.inner.find_or_create_tag(name, slug).await
    }

    async fn list_packages(&self, filter: PackageFilter) -> Result<Vec<Package>, ContentError> {
        self.inner.list_packages(filter).await
    }

    async fn list_packages_by_author(
        &self,
        author_id: i64,
    ) -> Result<Vec<Package>, ContentError> {
        self.inner.list_packages_by_author(author_id).await
    }

    async fn increment_download(&self, package_id: i64) -> Result<i64, ContentError> {
        self.inner.increment_download(package_id).await
    }
}

#[tokio::test]
async fn tag_failures_are_best_effort() {
    let c = fixtures::components().await;
    let repository = FailingTagRepo {
        inner: c.dal.clone(),
        poison: "Broken Keyword".to_string(),
    };

    // the fold reports what it dropped
    let resolution = taxonomy::resolve_keywords(
        &repository,
        &[
            "Data Tools".to_string(),
            "Broken Keyword".to_string(),
            "data tools".to_string(),
        ],
    )
    .await;
    assert_eq!(resolution.resolved.len(), 1);
    assert_eq!(resolution.resolved[0].slug, "data-tools");
    assert_eq!(resolution.skipped, vec!["Broken Keyword".to_string()]);

    // a full submission still goes through with the tags that resolved
    let registry = PackageRegistry::new(repository, c.inspector.clone(), c.artifacts.clone());
    let mut descriptor = fixtures::plugin_descriptor("acme/tagged", "1.0.0");
    descriptor["keywords"] = serde_json::json!(["Data Tools", "Broken Keyword"]);
    let archive = fixtures::write_archive(
        &c.uploads(),
        "tagged.zip",
        &[("plugin.json", descriptor.to_string().as_bytes())],
    );

    let package = registry
        .submit(&archive, &fixtures::user(1, "jo"))
        .await
        .expect("submission succeeds despite the failing keyword");
    assert_eq!(package.tags.len(), 1);
    assert_eq!(package.tags[0].slug, "data-tools");
}
