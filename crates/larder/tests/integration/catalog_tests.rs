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

//! Integration tests for the catalog read path and download counter.

use larder::content::ContentRepository;
use larder::models::{PackageDraft, PackageStatus, PackageType};
use larder::{Catalog, CatalogError, MetaKeyRegistry, PackageRegistry};

use crate::fixtures;

#[tokio::test]
async fn sequential_downloads_increment_the_counter() {
    let h = fixtures::harness().await;
    let archive = fixtures::plugin_archive(
        &h.uploads(),
        "sample.zip",
        "acme/sample-plugin",
        "1.0.0",
    );
    h.larder
        .registry
        .submit(&archive, &fixtures::user(1, "jo"))
        .await
        .unwrap();

    for _ in 0..3 {
        let download = h.larder.catalog.download("acme_sample-plugin").await.unwrap();
        assert!(download.path.exists());
        assert_eq!(download.filename, "acme_sample-plugin_1.0.0.zip");
    }

    let view = h.larder.catalog.get_package("acme_sample-plugin").await.unwrap();
    assert_eq!(view.metadata.get("download"), Some(&serde_json::json!(3)));
}

#[tokio::test]
async fn download_of_unknown_package_is_not_found() {
    let h = fixtures::harness().await;
    let err = h.larder.catalog.download("no-such-package").await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { .. }));
}

#[tokio::test]
async fn download_with_missing_archive_reports_missing_artifact() {
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
        .unwrap();

    let stored = h
        .larder
        .registry
        .artifacts()
        .archive_path(PackageType::Plugin, &package.name, "1.0.0");
    std::fs::remove_file(&stored).unwrap();

    let err = h.larder.catalog.download(&package.name).await.unwrap_err();
    assert!(matches!(err, CatalogError::MissingArtifact { .. }));
}

#[tokio::test]
async fn projection_exposes_only_registered_present_keys() {
    let h = fixtures::harness().await;

    // a theme whose descriptor carries no logo and no homepage
    let descriptor = fixtures::theme_descriptor("acme/aurora", "0.1.0");
    let archive = fixtures::write_archive(
        &h.uploads(),
        "aurora.zip",
        &[
            ("theme.json", descriptor.to_string().as_bytes()),
            ("assets/shot.png", fixtures::PNG_BYTES),
        ],
    );
    h.larder
        .registry
        .submit(&archive, &fixtures::user(1, "jo"))
        .await
        .unwrap();

    let view = h.larder.catalog.get_package("acme_aurora").await.unwrap();
    assert_eq!(view.package_name, "acme_aurora");
    assert_eq!(view.description, "A sample theme");
    assert_eq!(view.keywords, vec!["dark-mode".to_string()]);

    // present registered keys appear; image paths are public URLs
    assert_eq!(view.metadata.get("version"), Some(&serde_json::json!("0.1.0")));
    assert_eq!(
        view.metadata.get("screenshot"),
        Some(&serde_json::json!(format!(
            "{}/upload/images/screenshot/acme_aurora/shot",
            fixtures::PUBLIC_BASE_URL
        )))
    );

    // entrypoint is not registered for themes; unset keys are omitted, not
    // serialized as null or empty
    assert!(!view.metadata.contains_key("entrypoint"));
    assert!(!view.metadata.contains_key("homepage"));
    assert!(!view.metadata.contains_key("logo"));
    assert!(!view.metadata.contains_key("download"));
}

#[tokio::test]
async fn listings_show_published_packages_only() {
    let c = fixtures::components().await;
    let registry =
        PackageRegistry::new(c.dal.clone(), c.inspector.clone(), c.artifacts.clone());
    let catalog = Catalog::new(c.dal.clone(), c.artifacts.clone(), MetaKeyRegistry::defaults());

    let archive = fixtures::plugin_archive(
        &c.uploads(),
        "sample.zip",
        "acme/sample-plugin",
        "1.0.0",
    );
    let package = registry
        .submit(&archive, &fixtures::user(1, "jo"))
        .await
        .unwrap();

    // fresh submissions are drafts and stay out of public listings
    let listed = catalog.list_packages(PackageType::Plugin, &[]).await.unwrap();
    assert!(listed.is_empty());

    // an editorial promotion flips the status through the repository
    let promoted = PackageDraft {
        name: package.name.clone(),
        package_type: package.package_type,
        title: package.title.clone(),
        content: package.content.clone(),
        excerpt: package.excerpt.clone(),
        status: PackageStatus::Published,
        metadata: package.metadata.clone(),
        tag_ids: package.tags.iter().map(|t| t.id).collect(),
        author: None,
    };
    c.dal.save_package(promoted).await.unwrap();

    let listed = catalog.list_packages(PackageType::Plugin, &[]).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].package_name, "acme_sample-plugin");

    // the name filter narrows the listing
    let filtered = catalog
        .list_packages(PackageType::Plugin, &["acme_sample-plugin".to_string()])
        .await
        .unwrap();
    assert_eq!(filtered.len(), 1);
    let filtered = catalog
        .list_packages(PackageType::Plugin, &["other".to_string()])
        .await
        .unwrap();
    assert!(filtered.is_empty());

    // type filter applies too
    let themes = catalog.list_packages(PackageType::Theme, &[]).await.unwrap();
    assert!(themes.is_empty());
}

#[tokio::test]
async fn owners_see_their_own_drafts() {
    let h = fixtures::harness().await;
    let archive = fixtures::plugin_archive(
        &h.uploads(),
        "sample.zip",
        "acme/sample-plugin",
        "1.0.0",
    );
    h.larder
        .registry
        .submit(&archive, &fixtures::user(1, "jo"))
        .await
        .unwrap();

    let own = h
        .larder
        .catalog
        .list_own_packages(&fixtures::user(1, "jo"))
        .await
        .unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].status, PackageStatus::Draft);

    let other = h
        .larder
        .catalog
        .list_own_packages(&fixtures::user(2, "mallory"))
        .await
        .unwrap();
    assert!(other.is_empty());
}

#[tokio::test]
async fn resubmission_preserves_the_download_counter() {
    let h = fixtures::harness().await;
    let jo = fixtures::user(1, "jo");

    let v1 = fixtures::plugin_archive(&h.uploads(), "v1.zip", "acme/sample-plugin", "1.0.0");
    h.larder.registry.submit(&v1, &jo).await.unwrap();
    h.larder.catalog.download("acme_sample-plugin").await.unwrap();
    h.larder.catalog.download("acme_sample-plugin").await.unwrap();

    let v2 = fixtures::plugin_archive(&h.uploads(), "v2.zip", "acme/sample-plugin", "1.1.0");
    let package = h.larder.registry.submit(&v2, &jo).await.unwrap();

    // the counter survives the metadata replacement on resubmission
    assert_eq!(package.metadata.downloads, Some(2));
}
