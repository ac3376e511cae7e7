use std::sync::Arc;

use anyhow::Context;
use image::imageops::FilterType;

use crate::assets::resource::ImageResource;
use crate::foundation::error::{SynthError, SynthResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// Image MIME types accepted for acquisition and upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ImageMime {
    /// `image/jpeg`
    #[serde(rename = "image/jpeg")]
    Jpeg,
    /// `image/png`
    #[serde(rename = "image/png")]
    Png,
    /// `image/gif`
    #[serde(rename = "image/gif")]
    Gif,
}

impl ImageMime {
    /// Parse a declared MIME type. Parameters (`; charset=...`) and case are ignored.
    pub fn parse(mime: &str) -> SynthResult<Self> {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" | "image/jpg" => Ok(Self::Jpeg),
            "image/png" => Ok(Self::Png),
            "image/gif" => Ok(Self::Gif),
            _ => Err(SynthError::invalid_input(format!(
                "unsupported file type '{mime}', expected JPG, PNG or GIF"
            ))),
        }
    }

    /// Canonical MIME string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
        }
    }

    /// File extension used when storing uploads.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
        }
    }

    /// Guess the type from a file name extension.
    pub fn from_extension(path: &std::path::Path) -> SynthResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "gif" => Ok(Self::Gif),
            _ => Err(SynthError::invalid_input(format!(
                "unsupported file extension '{}'",
                path.display()
            ))),
        }
    }
}

/// Largest width or height a decoded image keeps. Pixmaps are addressed with `u16`.
pub const MAX_IMAGE_SIDE: u32 = u16::MAX as u32;

/// Decode an encoded image into a premultiplied [`ImageResource`].
///
/// Bytes that are not a decodable image are reported as [`SynthError::InvalidInput`]. Animated GIFs
/// contribute their first frame. Images with a side over [`MAX_IMAGE_SIDE`] are downscaled to fit,
/// keeping their aspect ratio.
pub fn decode_image(bytes: &[u8]) -> SynthResult<ImageResource> {
    let mut dyn_img = image::load_from_memory(bytes)
        .context("decode image from memory")
        .map_err(|e| SynthError::invalid_input(format!("{e:#}")))?;
    if dyn_img.width() > MAX_IMAGE_SIDE || dyn_img.height() > MAX_IMAGE_SIDE {
        tracing::debug!(
            width = dyn_img.width(),
            height = dyn_img.height(),
            "downscaling oversized image"
        );
        dyn_img = dyn_img.resize(MAX_IMAGE_SIDE, MAX_IMAGE_SIDE, FilterType::Triangle);
    }
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(SynthError::invalid_input("decoded image is empty"));
    }

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(ImageResource {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
