//! Read-only hair style catalog.
//!
//! The catalog belongs to an external collaborator. Here it is only looked up: the editor uses it
//! to find the overlay image, and the service uses it to check references when a synthesis is
//! created.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{SynthError, SynthResult};

/// Hair style identifier.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct HairStyleId(pub String);

impl HairStyleId {
    /// Wrap an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HairStyleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Catalog entry.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HairStyle {
    /// Identifier.
    pub id: HairStyleId,
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Category label.
    #[serde(default = "default_category")]
    pub category: String,
    /// Overlay image location (URL or path).
    pub image_url: String,
    /// Search tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Number of likes recorded by the catalog.
    #[serde(default)]
    pub like_count: u64,
    /// Whether the style is offered in the gallery.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_category() -> String {
    "other".to_owned()
}

fn default_active() -> bool {
    true
}

/// Lookup interface the core depends on.
pub trait HairStyleCatalog: Send + Sync {
    /// Find a style by id. `Ok(None)` means it does not exist.
    fn find(&self, id: &HairStyleId) -> SynthResult<Option<HairStyle>>;

    /// Find a style or fail with [`SynthError::NotFound`].
    fn get(&self, id: &HairStyleId) -> SynthResult<HairStyle> {
        self.find(id)?
            .ok_or_else(|| SynthError::not_found(format!("hair style '{id}'")))
    }
}

/// In-memory catalog, optionally loaded from a JSON manifest (an array of [`HairStyle`]).
#[derive(Clone, Debug, Default)]
pub struct MemoryCatalog {
    styles: BTreeMap<HairStyleId, HairStyle>,
}

impl MemoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from entries. Later duplicates replace earlier ones.
    pub fn from_styles(styles: impl IntoIterator<Item = HairStyle>) -> Self {
        let mut out = Self::new();
        for s in styles {
            out.insert(s);
        }
        out
    }

    /// Load a JSON manifest.
    pub fn from_json_file(path: &Path) -> SynthResult<Self> {
        let f = std::fs::File::open(path)
            .with_context(|| format!("open hair style manifest '{}'", path.display()))?;
        let styles: Vec<HairStyle> = serde_json::from_reader(std::io::BufReader::new(f))?;
        for s in &styles {
            if s.id.as_str().is_empty() || s.image_url.is_empty() {
                return Err(SynthError::invalid_input(
                    "hair style entries need an id and an imageUrl",
                ));
            }
        }
        tracing::debug!(count = styles.len(), path = %path.display(), "hair style manifest loaded");
        Ok(Self::from_styles(styles))
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, style: HairStyle) {
        self.styles.insert(style.id.clone(), style);
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Return `true` when the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

impl HairStyleCatalog for MemoryCatalog {
    fn find(&self, id: &HairStyleId) -> SynthResult<Option<HairStyle>> {
        Ok(self.styles.get(id).cloned())
    }
}

#[cfg(test)]
#[path = "../tests/unit/catalog.rs"]
mod tests;
