//! Synthesis persistence service.
//!
//! Validates requests, resolves references against the catalog, stores uploads and records, and
//! enforces ownership and visibility. All like-set changes go through
//! [`SynthesisStore::toggle_like`]; there is no second, user-side like list.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::assets::decode::ImageMime;
use crate::catalog::{HairStyleCatalog, HairStyleId};
use crate::foundation::config::ServiceConfig;
use crate::foundation::error::{SynthError, SynthResult, retry_once};
use crate::persistence::blob::BlobStore;
use crate::persistence::model::{
    BlobRef, LikeState, Synthesis, SynthesisId, SynthesisView, UserId, Visibility,
};
use crate::persistence::store::SynthesisStore;
use crate::transform::model::{OverlayTransform, ScaleLimits};

/// An uploaded image as received from the client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Upload {
    /// Declared MIME type.
    pub mime: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Create an upload.
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }
}

/// Payload of a create request.
#[derive(Clone, Debug)]
pub struct NewSynthesis {
    /// Flattened composite produced by the editor.
    pub composite: Upload,
    /// Original photo, when the client sends it separately. Defaults to the composite.
    pub base_image: Option<Upload>,
    /// Overlay style.
    pub hair_style_id: HairStyleId,
    /// Overlay placement; identity when absent.
    pub transform: Option<OverlayTransform>,
    /// Read access.
    pub visibility: Visibility,
}

/// Time source for record timestamps.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Synthesis persistence service.
pub struct SynthesisService {
    store: Arc<dyn SynthesisStore>,
    blobs: Arc<dyn BlobStore>,
    catalog: Arc<dyn HairStyleCatalog>,
    clock: Arc<dyn Clock>,
    config: ServiceConfig,
}

impl SynthesisService {
    /// Create a service using the wall clock.
    pub fn new(
        store: Arc<dyn SynthesisStore>,
        blobs: Arc<dyn BlobStore>,
        catalog: Arc<dyn HairStyleCatalog>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store,
            blobs,
            catalog,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Catalog used for reference checks.
    pub fn catalog(&self) -> &Arc<dyn HairStyleCatalog> {
        &self.catalog
    }

    /// Create a record owned by `owner` with an empty like set.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(owner = %owner, style = %req.hair_style_id)
    )]
    pub fn create(&self, owner: &UserId, req: NewSynthesis) -> SynthResult<Synthesis> {
        let composite_mime = self.check_upload(&req.composite)?;
        let base_mime = req
            .base_image
            .as_ref()
            .map(|u| self.check_upload(u))
            .transpose()?;
        if self.catalog.find(&req.hair_style_id)?.is_none() {
            return Err(SynthError::invalid_reference(format!(
                "hair style '{}' does not exist",
                req.hair_style_id
            )));
        }
        let transform = req
            .transform
            .unwrap_or(OverlayTransform::IDENTITY)
            .sanitized(ScaleLimits::default());

        let composited_image_ref =
            retry_once(|| self.blobs.put(composite_mime, &req.composite.bytes))?;
        let base_image_ref = match (&req.base_image, base_mime) {
            (Some(base), Some(mime)) => match retry_once(|| self.blobs.put(mime, &base.bytes)) {
                Ok(r) => r,
                Err(e) => {
                    self.discard_blobs(&[&composited_image_ref]);
                    return Err(e);
                }
            },
            _ => composited_image_ref.clone(),
        };

        let record = Synthesis {
            id: SynthesisId::new_v4(),
            owner_id: owner.clone(),
            base_image_ref,
            overlay_style_id: req.hair_style_id,
            composited_image_ref,
            transform,
            likes: Default::default(),
            visibility: req.visibility,
            created_at: self.clock.now(),
        };
        if let Err(e) = self.store.insert(record.clone()) {
            self.discard_blobs(&[&record.composited_image_ref, &record.base_image_ref]);
            return Err(e);
        }
        tracing::info!(id = %record.id, "synthesis created");
        Ok(record)
    }

    /// Read a record. Private records are only visible to their owner.
    pub fn get(&self, id: &SynthesisId, viewer: Option<&UserId>) -> SynthResult<Synthesis> {
        let record = self
            .store
            .get(id)?
            .ok_or_else(|| SynthError::not_found(format!("synthesis '{id}'")))?;
        if !record.is_visible_to(viewer) {
            return Err(SynthError::not_found(format!("synthesis '{id}'")));
        }
        Ok(record)
    }

    /// Replace the stored transform. Only the owner may do this.
    #[tracing::instrument(level = "debug", skip_all, fields(id = %id, requester = %requester))]
    pub fn update_transform(
        &self,
        id: &SynthesisId,
        requester: &UserId,
        transform: OverlayTransform,
    ) -> SynthResult<Synthesis> {
        let transform = transform.sanitized(ScaleLimits::default());
        let updated = self.store.update_transform(id, requester, transform)?;
        tracing::info!(%id, "synthesis transform updated");
        Ok(updated)
    }

    /// Delete a record and its images. Only the owner may do this.
    #[tracing::instrument(level = "debug", skip_all, fields(id = %id, requester = %requester))]
    pub fn delete(&self, id: &SynthesisId, requester: &UserId) -> SynthResult<()> {
        let removed = self.store.remove(id, requester)?;
        self.discard_blobs(&[&removed.composited_image_ref, &removed.base_image_ref]);
        tracing::info!(%id, "synthesis deleted");
        Ok(())
    }

    /// Flip `user`'s like on a record they can see.
    #[tracing::instrument(level = "debug", skip_all, fields(id = %id, user = %user))]
    pub fn toggle_like(&self, id: &SynthesisId, user: &UserId) -> SynthResult<LikeState> {
        self.get(id, Some(user))?;
        let state = self.store.toggle_like(id, user)?;
        tracing::info!(%id, liked = state.is_liked, count = state.like_count, "like toggled");
        Ok(state)
    }

    /// Records `user` likes, newest first.
    pub fn list_liked_by(&self, user: &UserId) -> SynthResult<Vec<SynthesisView>> {
        Ok(self
            .store
            .liked_by(user)?
            .into_iter()
            .filter(|r| r.is_visible_to(Some(user)))
            .map(|r| SynthesisView::for_viewer(r, user))
            .collect())
    }

    /// Records `owner` created, newest first, each with the owner's own like state.
    pub fn list_owned_by(&self, owner: &UserId) -> SynthResult<Vec<SynthesisView>> {
        Ok(self
            .store
            .owned_by(owner)?
            .into_iter()
            .map(|r| SynthesisView::for_viewer(r, owner))
            .collect())
    }

    /// Read a stored image.
    pub fn blob(&self, blob: &BlobRef) -> SynthResult<Vec<u8>> {
        self.blobs.get(blob)
    }

    fn check_upload(&self, upload: &Upload) -> SynthResult<ImageMime> {
        let mime = ImageMime::parse(&upload.mime)?;
        if upload.bytes.is_empty() {
            return Err(SynthError::invalid_input("image upload is empty"));
        }
        if upload.bytes.len() as u64 > self.config.max_upload_bytes {
            return Err(SynthError::invalid_input(format!(
                "image upload is {} bytes, limit is {}",
                upload.bytes.len(),
                self.config.max_upload_bytes
            )));
        }
        Ok(mime)
    }

    fn discard_blobs(&self, blobs: &[&BlobRef]) {
        let mut seen: Vec<&BlobRef> = Vec::with_capacity(blobs.len());
        for &b in blobs {
            if seen.contains(&b) {
                continue;
            }
            seen.push(b);
            if let Err(e) = self.blobs.delete(b) {
                tracing::warn!(blob = b.as_str(), error = %e, "failed to delete stored image");
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/persistence/service.rs"]
mod tests;
