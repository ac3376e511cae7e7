use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::catalog::HairStyleId;
use crate::foundation::error::{SynthError, SynthResult};
use crate::transform::model::OverlayTransform;

/// Synthesis identifier.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct SynthesisId(pub uuid::Uuid);

impl SynthesisId {
    /// Fresh random id.
    pub fn new_v4() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Parse an id from a path segment. Malformed ids name no record, so they are `NotFound`.
    pub fn parse(s: &str) -> SynthResult<Self> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| SynthError::not_found(format!("synthesis '{s}'")))
    }
}

impl std::fmt::Display for SynthesisId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// Authenticated user identifier.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Wrap an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Location of a stored image, e.g. `/uploads/upload-<uuid>.jpg`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct BlobRef(pub String);

impl BlobRef {
    /// Borrow as `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Who may read a synthesis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Anyone.
    #[default]
    Public,
    /// The owner only.
    Private,
}

/// Persisted synthesis record.
///
/// `owner_id` never changes after creation, `likes` is a set and only changes through the like
/// toggle, and `transform` is a snapshot taken at save time.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Synthesis {
    /// Identifier.
    pub id: SynthesisId,
    /// Creator.
    pub owner_id: UserId,
    /// Stored base photo.
    pub base_image_ref: BlobRef,
    /// Catalog style used as the overlay.
    pub overlay_style_id: HairStyleId,
    /// Stored flattened composite.
    pub composited_image_ref: BlobRef,
    /// Overlay placement at save time.
    pub transform: OverlayTransform,
    /// Users who like this synthesis.
    pub likes: BTreeSet<UserId>,
    /// Read access.
    pub visibility: Visibility,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Synthesis {
    /// Return `true` when `user` is in the like set.
    pub fn is_liked_by(&self, user: &UserId) -> bool {
        self.likes.contains(user)
    }

    /// Size of the like set.
    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    /// Return `true` when `viewer` may read this record.
    pub fn is_visible_to(&self, viewer: Option<&UserId>) -> bool {
        match self.visibility {
            Visibility::Public => true,
            Visibility::Private => viewer == Some(&self.owner_id),
        }
    }

    /// Fail with [`SynthError::Forbidden`] unless `requester` owns the record.
    pub fn ensure_owner(&self, requester: &UserId) -> SynthResult<()> {
        if &self.owner_id != requester {
            return Err(SynthError::forbidden(format!(
                "synthesis '{}' belongs to another user",
                self.id
            )));
        }
        Ok(())
    }

    /// Flip `user`'s membership in the like set.
    pub fn flip_like(&mut self, user: &UserId) -> LikeState {
        let is_liked = if self.likes.remove(user) {
            false
        } else {
            self.likes.insert(user.clone());
            true
        };
        LikeState {
            is_liked,
            like_count: self.likes.len(),
        }
    }
}

/// Result of a like toggle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeState {
    /// Membership after the toggle.
    pub is_liked: bool,
    /// Like set size after the toggle.
    pub like_count: usize,
}

/// A record as seen by one user.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisView {
    /// The record.
    #[serde(flatten)]
    pub synthesis: Synthesis,
    /// Whether the viewing user likes it.
    pub is_liked: bool,
}

impl SynthesisView {
    /// View of `synthesis` for `viewer`.
    pub fn for_viewer(synthesis: Synthesis, viewer: &UserId) -> Self {
        let is_liked = synthesis.is_liked_by(viewer);
        Self {
            synthesis,
            is_liked,
        }
    }
}

/// Sort newest first; ties break on id so listings are stable.
pub fn sort_newest_first(records: &mut [Synthesis]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
}

#[cfg(test)]
#[path = "../../tests/unit/persistence/model.rs"]
mod tests;
