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

//! Shared fixtures: a temp-backed service harness and zip archive builders.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use larder::config::{DatabaseConfig, StorageConfig};
use larder::dal::DAL;
use larder::database::Database;
use larder::models::User;
use larder::{ArtifactStore, Larder, LarderConfig, ZipInspector};

pub const TEST_SECRET: &str = "test-secret";
pub const PUBLIC_BASE_URL: &str = "https://packages.example.com";

/// Minimal PNG header, enough to pass the image sniff.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR fake image body";

/// A fully wired service over temp directories.
pub struct TestHarness {
    pub larder: Larder,
    pub scratch: TempDir,
}

impl TestHarness {
    /// Staging directory uploads are written to before submission.
    pub fn uploads(&self) -> PathBuf {
        let dir = self.scratch.path().join("uploads");
        std::fs::create_dir_all(&dir).expect("create uploads dir");
        dir
    }

    pub fn asset_root(&self) -> PathBuf {
        self.scratch.path().join("assets")
    }
}

pub async fn harness() -> TestHarness {
    larder::logging::init();
    let scratch = TempDir::new().expect("create scratch dir");
    let config = LarderConfig {
        database: DatabaseConfig {
            url: scratch.path().join("larder.db").to_string_lossy().into_owned(),
        },
        storage: StorageConfig {
            asset_root: scratch.path().join("assets"),
            temp_dir: scratch.path().join("tmp"),
            public_base_url: PUBLIC_BASE_URL.to_string(),
            secret: TEST_SECRET.to_string(),
        },
    };
    let larder = Larder::init(config).await.expect("initialize larder");
    TestHarness { larder, scratch }
}

/// The individual service components, for tests that wire their own
/// pipeline (custom repositories, editorial status changes).
pub struct Components {
    pub dal: DAL,
    pub inspector: ZipInspector,
    pub artifacts: ArtifactStore,
    pub scratch: TempDir,
}

impl Components {
    pub fn uploads(&self) -> PathBuf {
        let dir = self.scratch.path().join("uploads");
        std::fs::create_dir_all(&dir).expect("create uploads dir");
        dir
    }
}

pub async fn components() -> Components {
    larder::logging::init();
    let scratch = TempDir::new().expect("create scratch dir");
    for sub in ["assets", "tmp"] {
        std::fs::create_dir_all(scratch.path().join(sub)).expect("create scratch subdir");
    }

    let url = scratch.path().join("larder.db").to_string_lossy().into_owned();
    let database = Database::new(&url);
    database.run_migrations().await.expect("run migrations");

    Components {
        dal: DAL::new(database),
        inspector: ZipInspector::new(scratch.path().join("tmp")),
        artifacts: ArtifactStore::new(
            scratch.path().join("assets"),
            TEST_SECRET,
            PUBLIC_BASE_URL,
        ),
        scratch,
    }
}

pub fn user(id: i64, account: &str) -> User {
    User {
        id,
        account: account.to_string(),
    }
}

/// Writes a zip archive with the given entries and returns its path.
pub fn write_archive(dir: &Path, filename: &str, entries: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(filename);
    let file = std::fs::File::create(&path).expect("create zip file");
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    for (name, bytes) in entries {
        writer.start_file(name.to_string(), options).expect("start zip entry");
        writer.write_all(bytes).expect("write zip entry");
    }
    writer.finish().expect("finish zip");
    path
}

pub fn plugin_descriptor(name: &str, version: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "version": version,
        "description": "A sample plugin",
        "entrypoint": "src/entry.rs",
        "keywords": ["Analytics", "metrics"],
        "authors": [{"name": "Jo Doe", "email": "jo@example.com"}],
        "homepage": "https://example.com/sample",
        "miniOP": "1.2",
        "miniPHP": "8.0"
    })
}

pub fn theme_descriptor(name: &str, version: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "version": version,
        "description": "A sample theme",
        "keywords": ["dark-mode"],
        "screenshot": "assets/shot.png"
    })
}

/// Builds a plain plugin archive carrying only its descriptor.
pub fn plugin_archive(dir: &Path, filename: &str, name: &str, version: &str) -> PathBuf {
    let descriptor = plugin_descriptor(name, version).to_string();
    write_archive(dir, filename, &[("plugin.json", descriptor.as_bytes())])
}
