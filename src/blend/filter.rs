//! Separable fixed-point smoothing of 8-bit buffers.

use image::GrayImage;

use crate::foundation::error::{CutPasteError, CutPasteResult};
use crate::foundation::math::buffer_len;

/// Smooth a mask with a Gaussian kernel of `2 * radius + 1` taps.
pub fn gaussian_blur_mask(mask: &GrayImage, radius: u32, sigma: f32) -> CutPasteResult<GrayImage> {
    let kernel = gaussian_kernel_q16(radius, sigma)?;
    blur_gray(mask, &kernel)
}

/// Smooth a mask with a normalized box kernel of `2 * radius + 1` taps.
pub fn box_blur_mask(mask: &GrayImage, radius: u32) -> CutPasteResult<GrayImage> {
    blur_gray(mask, &box_kernel_q16(radius))
}

fn blur_gray(mask: &GrayImage, kernel: &[u32]) -> CutPasteResult<GrayImage> {
    let (w, h) = mask.dimensions();
    let out = blur_channels(mask.as_raw(), w, h, 1, kernel)?;
    GrayImage::from_raw(w, h, out)
        .ok_or_else(|| CutPasteError::validation("blurred mask buffer size mismatch"))
}

/// Horizontal then vertical pass with a Q16 kernel; edges are clamped.
pub(crate) fn blur_channels(
    src: &[u8],
    width: u32,
    height: u32,
    channels: usize,
    kernel: &[u32],
) -> CutPasteResult<Vec<u8>> {
    let len = buffer_len(width, height, channels)?;
    if src.len() != len {
        return Err(CutPasteError::validation(format!(
            "blur input holds {} bytes, expected {len} for {width}x{height}x{channels}",
            src.len()
        )));
    }
    if kernel.len() <= 1 || len == 0 {
        return Ok(src.to_vec());
    }

    let mut tmp = vec![0u8; len];
    let mut out = vec![0u8; len];
    convolve_axis(src, &mut tmp, width, height, channels, kernel, Axis::Horizontal);
    convolve_axis(&tmp, &mut out, width, height, channels, kernel, Axis::Vertical);
    Ok(out)
}

pub(crate) fn gaussian_kernel_q16(radius: u32, sigma: f32) -> CutPasteResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(CutPasteError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let two_sigma_sq = 2.0 * f64::from(sigma).powi(2);
    let taps: Vec<f64> = (-r..=r)
        .map(|i| (-f64::from(i * i) / two_sigma_sq).exp())
        .collect();
    Ok(quantize_q16(&taps))
}

pub(crate) fn box_kernel_q16(radius: u32) -> Vec<u32> {
    quantize_q16(&vec![1.0; 2 * radius as usize + 1])
}

/// Normalize to Q16; rounding drift goes to the centre tap so the taps sum to exactly 1.0.
fn quantize_q16(taps: &[f64]) -> Vec<u32> {
    const ONE: i64 = 1 << 16;
    let sum: f64 = taps.iter().sum();
    let mut q: Vec<i64> = taps
        .iter()
        .map(|t| ((t / sum) * ONE as f64).round().clamp(0.0, ONE as f64) as i64)
        .collect();
    let drift = ONE - q.iter().sum::<i64>();
    let mid = q.len() / 2;
    q[mid] = (q[mid] + drift).clamp(0, ONE);
    q.into_iter().map(|v| v as u32).collect()
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

fn convolve_axis(src: &[u8], dst: &mut [u8], width: u32, height: u32, ch: usize, k: &[u32], axis: Axis) {
    let radius = (k.len() / 2) as i64;
    let (w, h) = (i64::from(width), i64::from(height));
    let at = |x: i64, y: i64, c: usize| src[((y * w + x) as usize) * ch + c];
    for y in 0..h {
        for x in 0..w {
            let out_idx = ((y * w + x) as usize) * ch;
            for c in 0..ch {
                let acc: u64 = k
                    .iter()
                    .enumerate()
                    .map(|(ki, &kw)| {
                        let d = ki as i64 - radius;
                        let v = match axis {
                            Axis::Horizontal => at((x + d).clamp(0, w - 1), y, c),
                            Axis::Vertical => at(x, (y + d).clamp(0, h - 1), c),
                        };
                        u64::from(kw) * u64::from(v)
                    })
                    .sum();
                dst[out_idx + c] = q16_to_u8(acc);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + (1 << 15)) >> 16).min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/blend/filter.rs"]
mod tests;
