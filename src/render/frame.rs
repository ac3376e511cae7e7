use std::io::Cursor;

use anyhow::Context as _;

use crate::foundation::error::{SynthError, SynthResult};
use crate::foundation::math::unpremultiply_rgba8_in_place;

/// A rendered surface as RGBA8 pixels.
///
/// Frames coming out of the compositor are premultiplied; the flag makes this explicit at API
/// boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Pixel at `(x, y)` as stored.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Straight-alpha copy of the pixel data.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        if self.premultiplied {
            unpremultiply_rgba8_in_place(&mut out);
        }
        out
    }

    /// Encode as PNG (the download format).
    pub fn encode_png(&self) -> SynthResult<Vec<u8>> {
        let img = image::RgbaImage::from_raw(self.width, self.height, self.to_straight_rgba8())
            .ok_or_else(|| SynthError::invalid_input("frame buffer does not match its size"))?;
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .context("encode frame as png")?;
        Ok(buf)
    }

    /// Encode as JPEG (the save payload). Transparent areas are flattened onto white.
    pub fn encode_jpeg(&self, quality: u8) -> SynthResult<Vec<u8>> {
        let straight = self.to_straight_rgba8();
        let mut rgb = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for px in straight.chunks_exact(4) {
            let a = u16::from(px[3]);
            for &c in &px[..3] {
                let v = (u16::from(c) * a + 255 * (255 - a) + 127) / 255;
                rgb.push(v as u8);
            }
        }
        let img = image::RgbImage::from_raw(self.width, self.height, rgb)
            .ok_or_else(|| SynthError::invalid_input("frame buffer does not match its size"))?;

        let mut buf = Vec::new();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
        image::DynamicImage::ImageRgb8(img)
            .write_with_encoder(encoder)
            .context("encode frame as jpeg")?;
        Ok(buf)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
