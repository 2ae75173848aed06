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

//! Artifact store.
//!
//! Package zips and auxiliary images live under a root directory on paths
//! derived from the package name alone, so no path column needs persisting:
//!
//! ```text
//! {root}/upload/files/{plugin|theme}/{bucket}/{name}/v{version}.zip
//! {root}/upload/images/{logo|screenshot}/{name}/{filename}
//! ```
//!
//! The bucket is the first 8 hex characters of a keyed hash of the name and
//! a server-held secret: deterministic and reproducible, but not enumerable
//! by guessing sequential identifiers. Note that the bucket is recomputed
//! from the *current* secret on every download, so rotating the secret
//! orphans previously stored archives until a migration relocates them.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::warn;

use crate::registry::error::StorageError;
use crate::models::PackageType;

/// Kind of auxiliary image stored next to a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Logo,
    Screenshot,
}

impl ImageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageKind::Logo => "logo",
            ImageKind::Screenshot => "screenshot",
        }
    }
}

impl std::fmt::Display for ImageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derives storage paths and copies artifacts into place.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
    secret: String,
    public_base_url: String,
}

impl ArtifactStore {
    /// Creates a store rooted at `root`.
    ///
    /// `secret` keys the bucket derivation; `public_base_url` prefixes the
    /// public URLs produced for stored images.
    pub fn new(
        root: impl Into<PathBuf>,
        secret: impl Into<String>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            secret: secret.into(),
            public_base_url: public_base_url.into(),
        }
    }

    /// Derives the storage bucket for a package name.
    ///
    /// Pure and stable: the same name and secret always yield the same
    /// 8-character hex value.
    pub fn bucket(&self, name: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(name.as_bytes());
        hasher.update(self.secret.as_bytes());
        let digest = hex::encode(hasher.finalize());
        digest[..8].to_string()
    }

    /// Absolute path of a package archive for a given version.
    pub fn archive_path(&self, package_type: PackageType, name: &str, version: &str) -> PathBuf {
        self.root
            .join("upload")
            .join("files")
            .join(package_type.as_str())
            .join(self.bucket(name))
            .join(name)
            .join(format!("v{}.zip", version))
    }

    /// Public-relative path of a stored image.
    pub fn relative_image_path(kind: ImageKind, name: &str, filename: &str) -> String {
        format!("upload/images/{}/{}/{}", kind.as_str(), name, filename)
    }

    /// Copies a validated archive into its derived location.
    ///
    /// Each accepted version maps to a distinct filename, so earlier
    /// versions remain on disk. A pre-existing destination means two
    /// submissions of the same version raced; the last writer wins and the
    /// overwrite is logged.
    pub async fn store_archive(
        &self,
        src: &Path,
        package_type: PackageType,
        name: &str,
        version: &str,
    ) -> Result<PathBuf, StorageError> {
        let dest = self.archive_path(package_type, name, version);
        if let Some(parent) = dest.parent() {
            create_dir_0755(parent).await?;
        }
        if tokio::fs::metadata(&dest).await.is_ok() {
            warn!(dest = %dest.display(), "overwriting existing archive for same version");
        }
        copy_file(src, &dest).await?;
        Ok(dest)
    }

    /// Copies an auxiliary image into place, returning its public-relative
    /// path. The stored filename is the source file's stem.
    pub async fn store_image(
        &self,
        src: &Path,
        kind: ImageKind,
        name: &str,
    ) -> Result<String, StorageError> {
        let filename = src
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| StorageError::InvalidFilename {
                path: src.to_path_buf(),
            })?
            .to_string();

        let dir = self
            .root
            .join("upload")
            .join("images")
            .join(kind.as_str())
            .join(name);
        create_dir_0755(&dir).await?;
        copy_file(src, &dir.join(&filename)).await?;

        Ok(Self::relative_image_path(kind, name, &filename))
    }

    /// True when the archive for this package/version exists on disk.
    pub async fn archive_exists(
        &self,
        package_type: PackageType,
        name: &str,
        version: &str,
    ) -> bool {
        tokio::fs::metadata(self.archive_path(package_type, name, version))
            .await
            .is_ok()
    }

    /// Maps a stored public-relative path onto the public base URL.
    pub fn public_url(&self, relative: &str) -> String {
        format!(
            "{}/{}",
            self.public_base_url.trim_end_matches('/'),
            relative.trim_start_matches('/')
        )
    }
}

/// Sniffs whether a byte prefix looks like a supported raster image
/// (png, jpeg, gif, webp, or bmp).
pub fn is_supported_image(head: &[u8]) -> bool {
    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n";
    if head.starts_with(PNG) {
        return true;
    }
    if head.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return true;
    }
    if head.starts_with(b"GIF87a") || head.starts_with(b"GIF89a") {
        return true;
    }
    if head.len() >= 12 && head.starts_with(b"RIFF") && &head[8..12] == b"WEBP" {
        return true;
    }
    head.starts_with(b"BM")
}

async fn create_dir_0755(path: &Path) -> Result<(), StorageError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| StorageError::CreateDir {
            path: path.to_path_buf(),
            source,
        })?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .await
            .map_err(|source| StorageError::CreateDir {
                path: path.to_path_buf(),
                source,
            })?;
    }
    Ok(())
}

async fn copy_file(src: &Path, dest: &Path) -> Result<(), StorageError> {
    tokio::fs::copy(src, dest)
        .await
        .map_err(|source| StorageError::Copy {
            src: src.to_path_buf(),
            dest: dest.to_path_buf(),
            source,
        })?;
    Ok(())
}
