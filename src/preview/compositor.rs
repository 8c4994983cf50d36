use std::path::Path;

use image::imageops::{self, FilterType};
use image::{GenericImageView, Rgba, RgbaImage};
use tracing::debug;

use crate::config::PreviewConfig;
use crate::error::Result;
use crate::preview::cache::ImageDecodeCache;

/// Builds one composited preview frame per request.
///
/// The frame layout matches what the render pipeline's filter graph asks of
/// the external encoder: the source image stretched over the whole canvas
/// and blurred as the background, with the untouched image centered on top,
/// scaled down only when it exceeds the canvas.
pub struct PreviewCompositor {
    cache: ImageDecodeCache,
    config: PreviewConfig,
}

impl PreviewCompositor {
    pub fn new(config: PreviewConfig) -> Self {
        Self {
            cache: ImageDecodeCache::with_capacity(config.cache_capacity),
            config,
        }
    }

    /// Compose the preview frame for `path` at `target` (width, height).
    ///
    /// Decode errors from the cache propagate; there are no side effects
    /// beyond cache population.
    pub fn compose(&mut self, path: &Path, target: (u32, u32)) -> Result<RgbaImage> {
        let source = self.cache.get(path)?;
        let (target_w, target_h) = target;

        debug!("Compositing {:?} at {}x{}", path, target_w, target_h);

        // Background: stretch over the full canvas ignoring aspect, then
        // two blur passes. The coarse pass does the real work; the lighter
        // second pass smooths its artifacts, which is cheaper than one very
        // large kernel.
        let background = source
            .resize_exact(target_w, target_h, FilterType::Triangle)
            .blur(self.config.blur_radius_coarse)
            .blur(self.config.blur_radius_fine);

        // Foreground: scale down only, never up, preserving aspect ratio.
        let (fg_w, fg_h) = fit_within((source.width(), source.height()), target);
        let foreground = if (fg_w, fg_h) == (source.width(), source.height()) {
            source.as_ref().clone()
        } else {
            source.resize(target_w, target_h, FilterType::CatmullRom)
        };

        let mut canvas = RgbaImage::from_pixel(target_w, target_h, Rgba([0, 0, 0, 0]));
        imageops::overlay(&mut canvas, &background.to_rgba8(), 0, 0);

        let x = (target_w - foreground.width()) / 2;
        let y = (target_h - foreground.height()) / 2;
        imageops::overlay(&mut canvas, &foreground.to_rgba8(), x as i64, y as i64);

        Ok(canvas)
    }

    /// Shared decode cache, exposed so the boundary can pre-validate images
    pub fn cache_mut(&mut self) -> &mut ImageDecodeCache {
        &mut self.cache
    }
}

/// Largest size with `source`'s aspect ratio that fits within `target` on
/// both axes without upscaling.
pub(crate) fn fit_within(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (target_w, target_h) = target;

    if src_w <= target_w && src_h <= target_h {
        return source;
    }

    let scale = f64::min(target_w as f64 / src_w as f64, target_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, target_w);
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, target_h);
    (w, h)
}
