use std::path::Path;

use anyhow::Context as _;
use image::{GrayImage, Luma, RgbImage, RgbaImage};
use imageproc::morphology::{Mask, grayscale_erode};

use crate::foundation::core::Extent;
use crate::foundation::error::{CutPasteError, CutPasteResult};
use crate::foundation::math::lerp_u8;

/// Decode an image from disk and flatten any alpha over white.
pub fn load_background(path: &Path) -> CutPasteResult<RgbImage> {
    let img = image::open(path)
        .with_context(|| format!("decode background '{}'", path.display()))?;
    let rgba = img.to_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(CutPasteError::asset(format!(
            "background '{}' is empty",
            path.display()
        )));
    }
    Ok(flatten_over_white(&rgba))
}

/// Straight-alpha RGBA over an opaque white background.
pub fn flatten_over_white(rgba: &RgbaImage) -> RgbImage {
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (d, s) in out.pixels_mut().zip(rgba.pixels()) {
        let a = s[3];
        if a == 255 {
            d.0 = [s[0], s[1], s[2]];
            continue;
        }
        d.0 = [
            lerp_u8(255, s[0], a),
            lerp_u8(255, s[1], a),
            lerp_u8(255, s[2], a),
        ];
    }
    out
}

/// Square min filter of side `size` (grayscale erosion); pixels outside the mask are ignored.
///
/// Sides above 511 are clamped to 511.
pub fn min_filter(mask: &GrayImage, size: u32) -> GrayImage {
    if size <= 1 {
        return mask.clone();
    }
    let side = size.min(511);
    let centre = (side / 2) as u8;
    let footprint = Mask::from_image(&GrayImage::from_pixel(side, side, Luma([255])), centre, centre);
    grayscale_erode(mask, &footprint)
}

/// Inclusive extent of the non-zero pixels of `mask`, `None` when the mask is empty.
///
/// With `inverted` set, pixels equal to 255 count as background instead of zero pixels.
pub fn mask_extent(mask: &GrayImage, inverted: bool) -> Option<Extent> {
    let mut extent: Option<Extent> = None;
    for (x, y, px) in mask.enumerate_pixels() {
        let v = if inverted { 255 - px[0] } else { px[0] };
        if v == 0 {
            continue;
        }
        let (x, y) = (i64::from(x), i64::from(y));
        extent = Some(match extent {
            None => Extent {
                xmin: x,
                xmax: x,
                ymin: y,
                ymax: y,
            },
            Some(e) => Extent {
                xmin: e.xmin.min(x),
                xmax: e.xmax.max(x),
                ymin: e.ymin.min(y),
                ymax: e.ymax.max(y),
            },
        });
    }
    extent
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
