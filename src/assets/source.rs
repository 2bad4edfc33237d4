use std::path::{Path, PathBuf};

use image::{GrayImage, RgbImage, imageops};

use crate::assets::decode::{flatten_over_white, mask_extent, min_filter};
use crate::config::MaskConfig;
use crate::foundation::core::Extent;
use crate::foundation::error::{CutPasteError, CutPasteResult};

/// Foreground crop with its alpha-derived mask, ready for augmentation and placement.
///
/// `foreground` and `mask` always have identical dimensions.
#[derive(Clone, Debug)]
pub struct ObjectAsset {
    /// Foreground pixels flattened over white.
    pub foreground: RgbImage,
    /// 8-bit alpha mask.
    pub mask: GrayImage,
    /// Category the object is labelled with.
    pub category_id: u32,
}

impl ObjectAsset {
    /// Crop width in pixels.
    pub fn width(&self) -> u32 {
        self.foreground.width()
    }

    /// Crop height in pixels.
    pub fn height(&self) -> u32 {
        self.foreground.height()
    }

    /// Extent of the non-zero mask pixels in crop-local coordinates.
    pub fn extent(&self, inverted: bool) -> Option<Extent> {
        mask_extent(&self.mask, inverted)
    }
}

/// Anything that can produce an [`ObjectAsset`] for placement.
pub trait AssetSource: Send + Sync {
    /// File the asset is read from, recorded as provenance.
    fn path(&self) -> &Path;

    /// Category assigned to the produced asset.
    fn category_id(&self) -> u32;

    /// Decode the asset. Errors are recoverable: the caller skips the object.
    fn load(&self, mask_cfg: &MaskConfig) -> CutPasteResult<ObjectAsset>;
}

/// Object image whose alpha channel is the foreground mask.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlphaMaskedSource {
    path: PathBuf,
    category_id: u32,
}

impl AlphaMaskedSource {
    /// Create a source for the RGBA image at `path`.
    pub fn new(path: impl Into<PathBuf>, category_id: u32) -> Self {
        Self {
            path: path.into(),
            category_id,
        }
    }
}

impl AssetSource for AlphaMaskedSource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn category_id(&self) -> u32 {
        self.category_id
    }

    fn load(&self, mask_cfg: &MaskConfig) -> CutPasteResult<ObjectAsset> {
        let img = image::open(&self.path).map_err(|e| {
            CutPasteError::asset(format!("decode object '{}': {e}", self.path.display()))
        })?;
        if !img.color().has_alpha() {
            return Err(CutPasteError::asset(format!(
                "object '{}' has no alpha channel",
                self.path.display()
            )));
        }
        let rgba = img.to_rgba8();
        let alpha = GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            image::Luma([rgba.get_pixel(x, y)[3]])
        });
        let mask = min_filter(&alpha, mask_cfg.min_filter_size);
        let extent = mask_extent(&mask, mask_cfg.inverted).ok_or_else(|| {
            CutPasteError::asset(format!(
                "object '{}' has an empty mask",
                self.path.display()
            ))
        })?;

        let (x, y) = (extent.xmin as u32, extent.ymin as u32);
        let (w, h) = (extent.width() as u32, extent.height() as u32);
        let foreground = flatten_over_white(&rgba);
        Ok(ObjectAsset {
            foreground: imageops::crop_imm(&foreground, x, y, w, h).to_image(),
            mask: imageops::crop_imm(&mask, x, y, w, h).to_image(),
            category_id: self.category_id,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
