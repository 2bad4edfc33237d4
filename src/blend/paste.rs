use image::{GrayImage, RgbImage};

use crate::foundation::core::{CanvasSize, ClipRegion, Offset};
use crate::foundation::error::{CutPasteError, CutPasteResult};
use crate::foundation::math::lerp_u8;

/// Blend `fg` into `canvas` at `offset`, weighting by `mask` (0 keeps canvas, 255 takes fg).
///
/// Parts of the crop outside the canvas are ignored.
pub fn paste_with_mask(
    canvas: &mut RgbImage,
    fg: &RgbImage,
    mask: &GrayImage,
    offset: Offset,
) -> CutPasteResult<()> {
    if fg.dimensions() != mask.dimensions() {
        return Err(CutPasteError::validation(
            "paste_with_mask expects foreground and mask of identical size",
        ));
    }
    let size = CanvasSize::new(canvas.width(), canvas.height());
    let Some(clip) = ClipRegion::new(size, offset, fg.width(), fg.height()) else {
        return Ok(());
    };

    for dy in 0..clip.height {
        for dx in 0..clip.width {
            let (sx, sy) = (clip.src_x + dx, clip.src_y + dy);
            let a = mask.get_pixel(sx, sy)[0];
            if a == 0 {
                continue;
            }
            let s = fg.get_pixel(sx, sy);
            let d = canvas.get_pixel_mut(clip.dst_x + dx, clip.dst_y + dy);
            if a == 255 {
                *d = *s;
                continue;
            }
            for c in 0..3 {
                d[c] = lerp_u8(d[c], s[c], a);
            }
        }
    }
    Ok(())
}

/// Hard mask: 255 where the value is strictly above `threshold`, else 0.
pub fn binarize(mask: &GrayImage, threshold: u8) -> GrayImage {
    let mut out = mask.clone();
    for px in out.pixels_mut() {
        px[0] = if px[0] > threshold { 255 } else { 0 };
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/blend/paste.rs"]
mod tests;
