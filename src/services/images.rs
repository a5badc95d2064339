//! Image store — content-addressed storage for images attached to notices.
//!
//! DESIGN
//! ======
//! A submitted image is keyed by the sha256 of its bytes, so the URL stored
//! on a notice is a durable content address rather than a session-scoped
//! handle. Storing identical bytes twice yields the same key.
//!
//! Each `put` takes one reference on the digest and each `remove` drops one;
//! the bytes are freed when the last notice holding the digest goes away.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use axum::body::Bytes;
use sha2::{Digest, Sha256};

use crate::services::session::bytes_to_hex;
use crate::services::validation::FileInfo;

/// URL prefix under which stored images are served.
pub const IMAGE_URL_PREFIX: &str = "/api/images/";

/// An image selected by an operator: MIME type plus raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub mime: String,
    pub bytes: Bytes,
}

impl ImageFile {
    pub fn new(mime: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self { mime: mime.into(), bytes: bytes.into() }
    }

    #[must_use]
    pub fn info(&self) -> FileInfo<'_> {
        FileInfo { mime: &self.mime, size: self.bytes.len() }
    }
}

struct StoredImage {
    file: ImageFile,
    refs: usize,
}

#[derive(Clone, Default)]
pub struct ImageStore {
    images: Arc<RwLock<HashMap<String, StoredImage>>>,
}

impl ImageStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an image (or take another reference on identical bytes) and
    /// return its hex sha256 digest.
    pub fn put(&self, image: &ImageFile) -> String {
        let digest = content_digest(&image.bytes);
        let mut images = self.images.write().unwrap_or_else(PoisonError::into_inner);
        images
            .entry(digest.clone())
            .or_insert_with(|| StoredImage { file: image.clone(), refs: 0 })
            .refs += 1;
        digest
    }

    #[must_use]
    pub fn get(&self, digest: &str) -> Option<ImageFile> {
        let images = self.images.read().unwrap_or_else(PoisonError::into_inner);
        images.get(digest).map(|stored| stored.file.clone())
    }

    /// Drop one reference on `digest`. Returns `true` when that was the last
    /// one and the bytes were freed. Unknown digests are a no-op.
    pub fn remove(&self, digest: &str) -> bool {
        let mut images = self.images.write().unwrap_or_else(PoisonError::into_inner);
        let Some(stored) = images.get_mut(digest) else {
            return false;
        };
        stored.refs = stored.refs.saturating_sub(1);
        if stored.refs > 0 {
            return false;
        }
        images.remove(digest);
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.images.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[must_use]
pub fn content_digest(bytes: &[u8]) -> String {
    bytes_to_hex(&Sha256::digest(bytes))
}

#[must_use]
pub fn image_url(digest: &str) -> String {
    format!("{IMAGE_URL_PREFIX}{digest}")
}

/// The digest behind a stored image URL, if it is one of ours.
#[must_use]
pub fn digest_from_url(url: &str) -> Option<&str> {
    url.strip_prefix(IMAGE_URL_PREFIX).filter(|digest| !digest.is_empty())
}

#[cfg(test)]
#[path = "images_test.rs"]
mod tests;
