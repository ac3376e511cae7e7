use std::sync::Arc;

use crate::assets::resource::ImageResource;
use crate::foundation::core::{Affine, Canvas};
use crate::foundation::error::{SynthError, SynthResult};
use crate::render::frame::FrameRGBA;
use crate::render::layout::{base_affine, overlay_affine};
use crate::transform::model::OverlayTransform;

/// CPU compositor for the base + overlay stack.
///
/// Every call to [`Compositor::render`] clears the whole surface and redraws both layers, so the
/// output depends only on the inputs of that call. Missing layers are skipped.
pub struct Compositor {
    canvas: Canvas,
    clear_rgba: Option<[u8; 4]>,
    width: u16,
    height: u16,
    pixmap: vello_cpu::Pixmap,
    base_paint: Option<CachedPaint>,
    overlay_paint: Option<CachedPaint>,
}

struct CachedPaint {
    pixels: Arc<Vec<u8>>,
    paint: vello_cpu::Image,
}

impl Compositor {
    /// Create a compositor for `canvas`. `clear_rgba` is straight RGBA8.
    pub fn new(canvas: Canvas, clear_rgba: Option<[u8; 4]>) -> SynthResult<Self> {
        let width: u16 = canvas
            .width
            .try_into()
            .map_err(|_| SynthError::invalid_input("surface width exceeds u16"))?;
        let height: u16 = canvas
            .height
            .try_into()
            .map_err(|_| SynthError::invalid_input("surface height exceeds u16"))?;
        if width == 0 || height == 0 {
            return Err(SynthError::invalid_input("surface dimensions must be > 0"));
        }
        Ok(Self {
            canvas,
            clear_rgba,
            width,
            height,
            pixmap: vello_cpu::Pixmap::new(width, height),
            base_paint: None,
            overlay_paint: None,
        })
    }

    /// Surface size.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Composite the layers that are ready.
    #[tracing::instrument(
        level = "trace",
        skip_all,
        fields(base = base.is_some(), overlay = overlay.is_some())
    )]
    pub fn render(
        &mut self,
        base: Option<&ImageResource>,
        overlay: Option<&ImageResource>,
        transform: &OverlayTransform,
    ) -> FrameRGBA {
        let clear = self
            .clear_rgba
            .map(|[r, g, b, a]| premul_rgba8(r, g, b, a))
            .unwrap_or([0, 0, 0, 0]);
        clear_pixmap(&mut self.pixmap, clear);

        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        if let Some([r, g, b, a]) = self.clear_rgba {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(self.width),
                f64::from(self.height),
            ));
        }

        if let Some(base) = base
            && let Some(paint) = paint_for(&mut self.base_paint, base)
        {
            let (w, h) = base.size_f64();
            draw_image(&mut ctx, paint, base_affine(self.canvas, w, h), w, h, 1.0);
        }

        if let Some(overlay) = overlay
            && transform.opacity > 0.0
            && let Some(paint) = paint_for(&mut self.overlay_paint, overlay)
        {
            let (w, h) = overlay.size_f64();
            let affine = overlay_affine(self.canvas, transform, w, h);
            draw_image(&mut ctx, paint, affine, w, h, transform.opacity as f32);
        }

        ctx.flush();
        ctx.render_to_pixmap(&mut self.pixmap);

        FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        }
    }
}

fn draw_image(
    ctx: &mut vello_cpu::RenderContext,
    paint: vello_cpu::Image,
    transform: Affine,
    w: f64,
    h: f64,
    opacity: f32,
) {
    ctx.set_transform(affine_to_cpu(transform));
    ctx.set_paint(paint);
    if opacity < 1.0 {
        ctx.push_opacity_layer(opacity);
    }
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
    if opacity < 1.0 {
        ctx.pop_layer();
    }
}

fn paint_for(cache: &mut Option<CachedPaint>, res: &ImageResource) -> Option<vello_cpu::Image> {
    if let Some(cached) = cache.as_ref()
        && Arc::ptr_eq(&cached.pixels, &res.rgba8_premul)
    {
        return Some(cached.paint.clone());
    }

    match image_premul_bytes_to_pixmap(res.rgba8_premul.as_slice(), res.width, res.height) {
        Ok(pixmap) => {
            let paint = vello_cpu::Image {
                image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
                sampler: vello_cpu::peniko::ImageSampler::default(),
            };
            *cache = Some(CachedPaint {
                pixels: Arc::clone(&res.rgba8_premul),
                paint: paint.clone(),
            });
            Some(paint)
        }
        Err(e) => {
            tracing::warn!(error = %e, "skipping layer that cannot be rasterized");
            None
        }
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn premul_rgba8(r: u8, g: u8, b: u8, a: u8) -> [u8; 4] {
    let mut px = [r, g, b, a];
    crate::foundation::math::premultiply_rgba8_in_place(&mut px);
    px
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap, rgba: [u8; 4]) {
    let data = pixmap.data_as_u8_slice_mut();
    for px in data.chunks_exact_mut(4) {
        px.copy_from_slice(&rgba);
    }
}

fn image_premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> SynthResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| SynthError::invalid_input("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| SynthError::invalid_input("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(SynthError::invalid_input("image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
