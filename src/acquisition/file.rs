use std::path::Path;

use anyhow::Context as _;

use crate::assets::decode::ImageMime;
use crate::foundation::error::{SynthError, SynthResult};

/// One file offered by the host (picker or drop), before any validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileSelection {
    /// Display name.
    pub name: String,
    /// MIME type declared by the host.
    pub mime: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl FileSelection {
    /// Create a selection from in-memory bytes.
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Read a file from disk, deriving the MIME type from its extension.
    pub fn from_path(path: &Path) -> SynthResult<Self> {
        let mime = ImageMime::from_extension(path)?;
        let bytes =
            std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, mime.as_str(), bytes))
    }
}

/// A selection that passed the intake checks and is ready to decode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcceptedFile {
    /// Display name.
    pub name: String,
    /// Normalized MIME type.
    pub mime: ImageMime,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

/// Validate a host selection: exactly one non-empty image file within `max_bytes`.
///
/// Rejections are [`SynthError::InvalidInput`]; nothing is partially accepted.
pub fn accept_selection(
    mut files: Vec<FileSelection>,
    max_bytes: u64,
) -> SynthResult<AcceptedFile> {
    let file = match files.len() {
        0 => return Err(SynthError::invalid_input("no file selected")),
        1 => files.remove(0),
        n => {
            return Err(SynthError::invalid_input(format!(
                "expected a single image file, got {n}"
            )));
        }
    };
    let mime = ImageMime::parse(&file.mime)?;
    if file.bytes.is_empty() {
        return Err(SynthError::invalid_input(format!("'{}' is empty", file.name)));
    }
    if file.bytes.len() as u64 > max_bytes {
        return Err(SynthError::invalid_input(format!(
            "'{}' is {} bytes, limit is {max_bytes}",
            file.name,
            file.bytes.len()
        )));
    }
    Ok(AcceptedFile {
        name: file.name,
        mime,
        bytes: file.bytes,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/acquisition/file.rs"]
mod tests;
