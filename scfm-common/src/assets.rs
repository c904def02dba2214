//! Durable storage for uploaded audio and artwork
//!
//! Uploads are written to `<root>/assets/<uuid>.<ext>` as soon as they arrive.
//! Releases and drafts only hold the returned key.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{Error, Result};

/// Reference to a stored asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    /// File name under the asset directory, e.g. `3f2a...c1.wav`
    pub key: String,
    pub content_type: String,
    pub size_bytes: u64,
}

impl AssetRef {
    #[cfg(test)]
    pub(crate) fn for_tests(content_type: &str) -> Self {
        let ext = extension_for(content_type);
        Self {
            key: format!("{}.{}", Uuid::new_v4(), ext),
            content_type: content_type.to_string(),
            size_bytes: 1024,
        }
    }
}

/// Which upload slot an asset fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Audio,
    Artwork,
}

impl AssetKind {
    /// Required content type prefix
    fn mime_prefix(&self) -> &'static str {
        match self {
            AssetKind::Audio => "audio/",
            AssetKind::Artwork => "image/",
        }
    }

    /// Field name used in validation errors
    pub fn field(&self) -> &'static str {
        match self {
            AssetKind::Audio => "audio_file",
            AssetKind::Artwork => "artwork",
        }
    }
}

/// Map a content type to a file extension
fn extension_for(content_type: &str) -> &'static str {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/flac" | "audio/x-flac" => "flac",
        "audio/aac" => "aac",
        "audio/ogg" => "ogg",
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "bin",
    }
}

/// Keys are generated by the store; anything else is rejected before touching disk
fn is_valid_key(key: &str) -> bool {
    match key.split_once('.') {
        Some((stem, ext)) => {
            Uuid::parse_str(stem).is_ok()
                && !ext.is_empty()
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        }
        None => false,
    }
}

/// Filesystem-backed asset store
#[derive(Debug, Clone)]
pub struct AssetStore {
    dir: PathBuf,
}

impl AssetStore {
    /// Store rooted at `<root_folder>/assets`
    pub fn new(root_folder: &Path) -> Self {
        Self {
            dir: root_folder.join("assets"),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Validate and persist an upload
    pub async fn store(
        &self,
        kind: AssetKind,
        content_type: &str,
        bytes: &[u8],
        max_bytes: u64,
    ) -> Result<AssetRef> {
        let content_type = content_type.trim().to_ascii_lowercase();
        if !content_type.starts_with(kind.mime_prefix()) {
            return Err(Error::field(
                kind.field(),
                format!("Expected a {}* file, got '{}'.", kind.mime_prefix(), content_type),
            ));
        }
        if bytes.is_empty() {
            return Err(Error::field(kind.field(), "Uploaded file is empty."));
        }
        let size = bytes.len() as u64;
        if size > max_bytes {
            return Err(Error::field(
                kind.field(),
                format!("File is too large ({} MB max).", max_bytes / (1024 * 1024)),
            ));
        }

        fs::create_dir_all(&self.dir).await?;
        let key = format!("{}.{}", Uuid::new_v4(), extension_for(&content_type));
        fs::write(self.dir.join(&key), bytes).await?;

        info!(key = %key, size, content_type = %content_type, "Stored asset");
        Ok(AssetRef {
            key,
            content_type,
            size_bytes: size,
        })
    }

    /// Look up a previously stored asset by key
    ///
    /// Returns `Ok(None)` when the key is well-formed but no file exists.
    pub async fn resolve(&self, key: &str) -> Result<Option<AssetRef>> {
        if !is_valid_key(key) {
            debug!(key, "Rejected malformed asset key");
            return Ok(None);
        }
        let path = self.dir.join(key);
        let metadata = match fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let ext = key.rsplit('.').next().unwrap_or_default();
        Ok(Some(AssetRef {
            key: key.to_string(),
            content_type: content_type_for(ext).to_string(),
            size_bytes: metadata.len(),
        }))
    }

    pub async fn exists(&self, key: &str) -> bool {
        matches!(self.resolve(key).await, Ok(Some(_)))
    }
}

fn content_type_for(ext: &str) -> &'static str {
    match ext {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "aac" => "audio/aac",
        "ogg" => "audio/ogg",
        "png" => "image/png",
        "jpg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}
