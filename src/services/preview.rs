//! Preview registry — transient, revocable handles for images selected in a
//! draft but not yet submitted.
//!
//! LIFECYCLE
//! =========
//! A handle is acquired when a file selection passes validation and released
//! when it is superseded by another selection, when the draft is cleared or
//! reset, or when the owning session ends. `PreviewHandle::release` is the
//! explicit path; dropping an unreleased handle releases it as well. A
//! released handle no longer resolves.
//!
//! Each preview records the session that acquired it and resolves only for
//! that session.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use rand::Rng;
use tracing::debug;

use crate::services::images::ImageFile;
use crate::services::session::bytes_to_hex;

/// URL prefix under which live previews are served.
pub const PREVIEW_URL_PREFIX: &str = "/api/previews/";

struct LivePreview {
    owner: String,
    image: ImageFile,
}

#[derive(Clone, Default)]
pub struct PreviewRegistry {
    live: Arc<RwLock<HashMap<String, LivePreview>>>,
}

impl PreviewRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `image` for the session `owner` and return the handle that
    /// owns it.
    #[must_use]
    pub fn acquire(&self, owner: &str, image: ImageFile) -> PreviewHandle {
        let bytes: [u8; 16] = rand::rng().random();
        let token = bytes_to_hex(&bytes);
        self.live
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.clone(), LivePreview { owner: owner.to_owned(), image });
        debug!(%token, "preview acquired");
        PreviewHandle { token, registry: self.clone(), released: false }
    }

    /// Resolve a live handle token on behalf of the session `owner`. Tokens
    /// acquired by another session do not resolve.
    #[must_use]
    pub fn get(&self, token: &str, owner: &str) -> Option<ImageFile> {
        self.live
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .filter(|preview| preview.owner == owner)
            .map(|preview| preview.image.clone())
    }

    /// Number of live handles.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn revoke(&self, token: &str) {
        let removed = self
            .live
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token);
        if removed.is_some() {
            debug!(%token, "preview released");
        }
    }
}

/// Exclusive owner of one live preview.
pub struct PreviewHandle {
    token: String,
    registry: PreviewRegistry,
    released: bool,
}

impl PreviewHandle {
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub fn url(&self) -> String {
        format!("{PREVIEW_URL_PREFIX}{}", self.token())
    }

    /// Revoke the preview. The handle is consumed.
    pub fn release(mut self) {
        self.revoke_once();
    }

    fn revoke_once(&mut self) {
        if !self.released {
            self.registry.revoke(&self.token);
            self.released = true;
        }
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.revoke_once();
    }
}

impl std::fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewHandle").field("token", &self.token).finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "preview_test.rs"]
mod tests;
