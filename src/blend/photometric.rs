//! Per-object photometric perturbations applied to the foreground before pasting.

use image::{GrayImage, Rgb, RgbImage};
use rand::Rng;

use crate::blend::filter::{box_blur_mask, gaussian_blur_mask};
use crate::blend::poisson::{Domain, GuidanceField, Rgbf, clamp_rgb, neighbours, pixel_f, solve_poisson};
use crate::foundation::error::{CutPasteError, CutPasteResult};

/// Lookup table `((i / 255) ^ (1 / gamma)) * 255`, truncated.
pub fn gamma_lut(gamma: f64) -> [u8; 256] {
    let inv = 1.0 / gamma;
    let mut lut = [0u8; 256];
    for (i, v) in lut.iter_mut().enumerate() {
        *v = ((i as f64 / 255.0).powf(inv) * 255.0).clamp(0.0, 255.0) as u8;
    }
    lut
}

/// Map every channel of `fg` through the gamma table.
pub fn apply_gamma(fg: &RgbImage, gamma: f64) -> RgbImage {
    let lut = gamma_lut(gamma);
    let mut out = fg.clone();
    for px in out.pixels_mut() {
        *px = Rgb(px.0.map(|c| lut[c as usize]));
    }
    out
}

/// Gamma correction with `gamma` drawn from `[1.125, 1.375)`.
pub fn apply_gamma_correction<R: Rng + ?Sized>(fg: &RgbImage, rng: &mut R) -> RgbImage {
    let gamma = 1.0 + (rng.r#gen::<f64>() + 0.5) * 0.25;
    apply_gamma(fg, gamma)
}

/// Coefficients of the gradient remapping `alpha^beta * |g|^(-beta) * g`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IlluminationParams {
    /// Gradient magnitude left unchanged by the remapping.
    pub alpha: f64,
    /// Compression strength; zero is the identity.
    pub beta: f64,
}

impl IlluminationParams {
    /// `alpha` from `[1.5, 2.5)`, `beta` from `[0, 0.3)`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let alpha = 1.75 + (rng.r#gen::<f64>() - 0.25);
        let beta = rng.r#gen::<f64>() * 0.3;
        Self { alpha, beta }
    }
}

struct ScaledGradient<'a> {
    source: &'a RgbImage,
    scale: f64,
    beta: f64,
}

impl ScaledGradient<'_> {
    fn remap(&self, g: f64) -> f64 {
        if g.abs() < f64::EPSILON {
            0.0
        } else {
            self.scale * g.abs().powf(-self.beta) * g
        }
    }
}

impl GuidanceField for ScaledGradient<'_> {
    fn divergence(&self, x: u32, y: u32) -> Rgbf {
        let p = pixel_f(self.source, x, y);
        let mut acc = [0.0; 3];
        for (nx, ny) in neighbours(x, y) {
            let q = pixel_f(self.source, nx, ny);
            for c in 0..3 {
                acc[c] += self.remap(p[c] - q[c]);
            }
        }
        acc
    }
}

/// Local illumination change inside the non-zero part of `mask`.
///
/// Pixels outside the mask, and the mask's outer frame, keep their values.
pub fn illumination_change(
    fg: &RgbImage,
    mask: &GrayImage,
    params: IlluminationParams,
) -> CutPasteResult<RgbImage> {
    if fg.dimensions() != mask.dimensions() {
        return Err(CutPasteError::validation(
            "illumination_change expects foreground and mask of identical size",
        ));
    }
    let domain = Domain::from_mask(mask);
    let guidance = ScaledGradient {
        source: fg,
        scale: params.alpha.powf(params.beta),
        beta: params.beta,
    };
    let boundary = |x: u32, y: u32| pixel_f(fg, x, y);
    let solved = solve_poisson(&domain, &boundary, &guidance)?;

    let mut out = fg.clone();
    for ((x, y), v) in solved {
        out.put_pixel(x, y, Rgb(clamp_rgb(v)));
    }
    Ok(out)
}

/// Illumination change with random [`IlluminationParams`].
pub fn apply_illumination_change<R: Rng + ?Sized>(
    fg: &RgbImage,
    mask: &GrayImage,
    rng: &mut R,
) -> CutPasteResult<RgbImage> {
    illumination_change(fg, mask, IlluminationParams::random(rng))
}

/// Edge treatment picked by [`random_mask_adjustment`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaskAdjustment {
    /// Keep the mask.
    None,
    /// 3-tap Gaussian, sigma 2.
    Gaussian,
    /// 3-tap box.
    Box,
}

impl MaskAdjustment {
    /// Apply the adjustment to `mask`.
    pub fn apply(self, mask: &GrayImage) -> CutPasteResult<GrayImage> {
        match self {
            Self::None => Ok(mask.clone()),
            Self::Gaussian => gaussian_blur_mask(mask, 1, 2.0),
            Self::Box => box_blur_mask(mask, 1),
        }
    }
}

/// Smooth `mask` with a uniformly chosen [`MaskAdjustment`].
pub fn random_mask_adjustment<R: Rng + ?Sized>(
    mask: &GrayImage,
    rng: &mut R,
) -> CutPasteResult<GrayImage> {
    let choice = match rng.gen_range(0..3) {
        0 => MaskAdjustment::None,
        1 => MaskAdjustment::Gaussian,
        _ => MaskAdjustment::Box,
    };
    choice.apply(mask)
}

#[cfg(test)]
#[path = "../../tests/unit/blend/photometric.rs"]
mod tests;
