use image::GrayImage;

use crate::foundation::core::{CanvasSize, ClipRegion, Offset};
use crate::foundation::error::{CutPasteError, CutPasteResult};

/// Full-canvas binary mask (0 or 255) of one placed object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositeMask {
    /// Canvas-sized mask pixels.
    pub pixels: GrayImage,
    /// Category of the object the mask belongs to.
    pub category_id: u32,
}

impl CompositeMask {
    /// Number of set pixels.
    pub fn area(&self) -> u64 {
        self.pixels.pixels().filter(|p| p[0] != 0).count() as u64
    }
}

/// Project a crop mask onto a zeroed canvas at `offset`, binarizing at `threshold`.
///
/// Values strictly above `threshold` become 255; everything else, and every pixel outside
/// the crop, is 0. Parts of the crop that fall off the canvas are dropped.
pub fn project_mask(
    mask: &GrayImage,
    canvas: CanvasSize,
    offset: Offset,
    threshold: u8,
) -> GrayImage {
    let mut full = GrayImage::new(canvas.width, canvas.height);
    let Some(clip) = ClipRegion::new(canvas, offset, mask.width(), mask.height()) else {
        return full;
    };
    for dy in 0..clip.height {
        for dx in 0..clip.width {
            let v = mask.get_pixel(clip.src_x + dx, clip.src_y + dy)[0];
            if v > threshold {
                full.put_pixel(clip.dst_x + dx, clip.dst_y + dy, image::Luma([255]));
            }
        }
    }
    full
}

/// Remove from every mask the pixels claimed by masks placed after it.
///
/// Masks are walked from last placed (topmost) to first; each keeps only the pixels not
/// yet claimed, then claims what it kept. Afterwards no two masks share a set pixel.
pub fn resolve_occlusion(masks: &mut [CompositeMask]) -> CutPasteResult<()> {
    let Some(first) = masks.first() else {
        return Ok(());
    };
    let dims = first.pixels.dimensions();
    if masks.iter().any(|m| m.pixels.dimensions() != dims) {
        return Err(CutPasteError::validation(
            "resolve_occlusion expects masks of identical size",
        ));
    }

    let mut claimed = vec![false; dims.0 as usize * dims.1 as usize];
    for mask in masks.iter_mut().rev() {
        for (px, taken) in mask.pixels.pixels_mut().zip(claimed.iter_mut()) {
            if *taken {
                px[0] = 0;
            } else if px[0] == 255 {
                *taken = true;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/mask/compositor.rs"]
mod tests;
