//! Scale and rotation augmentation of object crops.
//!
//! Both operations transform foreground and mask together and resample until the result
//! fits strictly inside the canvas. When no fitting sample is found the input is returned
//! unchanged.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use rand::Rng;

use crate::assets::source::ObjectAsset;
use crate::config::AugmentConfig;
use crate::foundation::core::CanvasSize;

const MAX_AUGMENT_SAMPLES: u32 = 100;

/// Resize so the object's largest relative extent is drawn from `[min_scale, max_scale]`.
pub fn augment_scale<R: Rng + ?Sized>(
    asset: &ObjectAsset,
    canvas: CanvasSize,
    cfg: &AugmentConfig,
    rng: &mut R,
) -> ObjectAsset {
    let (fw, fh) = (f64::from(asset.width()), f64::from(asset.height()));
    let relative = (fw / f64::from(canvas.width)).max(fh / f64::from(canvas.height));

    for _ in 0..MAX_AUGMENT_SAMPLES {
        let scale = (rng.gen_range(cfg.min_scale..=cfg.max_scale) / relative).min(cfg.max_upscaling);
        let (ow, oh) = ((scale * fw) as u32, (scale * fh) as u32);
        if ow > 0 && oh > 0 && ow < canvas.width && oh < canvas.height {
            return ObjectAsset {
                foreground: imageops::resize(&asset.foreground, ow, oh, FilterType::Lanczos3),
                mask: imageops::resize(&asset.mask, ow, oh, FilterType::Lanczos3),
                category_id: asset.category_id,
            };
        }
    }
    tracing::debug!("no fitting scale found, keeping original size");
    asset.clone()
}

/// Rotate by whole degrees from `[-max_degrees, max_degrees]`, expanding the crop.
pub fn augment_rotation<R: Rng + ?Sized>(
    asset: &ObjectAsset,
    canvas: CanvasSize,
    cfg: &AugmentConfig,
    rng: &mut R,
) -> ObjectAsset {
    for _ in 0..MAX_AUGMENT_SAMPLES {
        let degrees = rng.gen_range(-cfg.max_degrees..=cfg.max_degrees);
        let rotated = rotate_expand(asset, degrees as f32);
        if rotated.width() < canvas.width && rotated.height() < canvas.height {
            return rotated;
        }
    }
    tracing::debug!("no fitting rotation found, keeping orientation");
    asset.clone()
}

/// Rotate around the crop centre into a canvas large enough to hold every corner.
pub fn rotate_expand(asset: &ObjectAsset, degrees: f32) -> ObjectAsset {
    if degrees == 0.0 {
        return asset.clone();
    }
    let theta = degrees.to_radians();
    let (w, h) = (asset.width() as f32, asset.height() as f32);
    let (sin, cos) = theta.sin_cos();
    let out_w = (w * cos.abs() + h * sin.abs()).ceil().max(1.0) as u32;
    let out_h = (w * sin.abs() + h * cos.abs()).ceil().max(1.0) as u32;

    let projection = Projection::translate(out_w as f32 / 2.0, out_h as f32 / 2.0)
        * Projection::rotate(theta)
        * Projection::translate(-w / 2.0, -h / 2.0);

    let mut foreground = RgbImage::new(out_w, out_h);
    warp_into(
        &asset.foreground,
        &projection,
        Interpolation::Bilinear,
        Rgb([0, 0, 0]),
        &mut foreground,
    );
    let mut mask = GrayImage::new(out_w, out_h);
    warp_into(
        &asset.mask,
        &projection,
        Interpolation::Bilinear,
        Luma([0]),
        &mut mask,
    );

    ObjectAsset {
        foreground,
        mask,
        category_id: asset.category_id,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/augment.rs"]
mod tests;
