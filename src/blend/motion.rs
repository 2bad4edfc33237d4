//! Whole-image linear motion blur.

use image::RgbImage;
use imageproc::filter::Kernel;
use rand::Rng;
use rand::seq::SliceRandom;

/// Kernel side lengths a random blur is drawn from.
pub const LINE_LENGTHS: [u32; 4] = [3, 5, 7, 9];

/// Which part of the line through the kernel centre is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineDirection {
    /// Both halves.
    Full,
    /// Centre towards the angle direction.
    Right,
    /// Centre away from the angle direction.
    Left,
}

const DIRECTIONS: [LineDirection; 3] = [LineDirection::Right, LineDirection::Left, LineDirection::Full];

/// A line kernel of odd side `length` at `angle_degrees` (counter-clockwise from +x).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MotionBlur {
    /// Kernel side length, odd.
    pub length: u32,
    /// Line angle in whole degrees within `[0, 180)`.
    pub angle_degrees: u32,
    /// Drawn part of the line.
    pub direction: LineDirection,
}

impl MotionBlur {
    /// Random kernel: length from [`LINE_LENGTHS`], angle from the evenly spaced grid of
    /// `4 * (length / 2)` angles over `[0, 180)`, and a random direction.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let length = LINE_LENGTHS[rng.gen_range(0..LINE_LENGTHS.len())];
        let angles = angle_grid(length);
        let angle_degrees = angles[rng.gen_range(0..angles.len())];
        let direction = DIRECTIONS.choose(rng).copied().unwrap_or(LineDirection::Full);
        Self {
            length,
            angle_degrees,
            direction,
        }
    }

    /// Normalized `length x length` kernel, row-major.
    pub fn kernel(&self) -> Vec<f32> {
        let n = self.length.max(1) as usize;
        let r = (n / 2) as f64;
        let theta = f64::from(self.angle_degrees).to_radians();
        let (dx, dy) = (theta.cos(), -theta.sin());
        let (t0, t1) = match self.direction {
            LineDirection::Full => (-r, r),
            LineDirection::Right => (0.0, r),
            LineDirection::Left => (-r, 0.0),
        };

        let mut k = vec![0.0f32; n * n];
        let samples = 4 * n;
        for i in 0..=samples {
            let t = t0 + (t1 - t0) * i as f64 / samples as f64;
            let px = (r + t * dx).round().clamp(0.0, (n - 1) as f64) as usize;
            let py = (r + t * dy).round().clamp(0.0, (n - 1) as f64) as usize;
            k[py * n + px] = 1.0;
        }
        let sum: f32 = k.iter().sum();
        if sum > 0.0 {
            for v in &mut k {
                *v /= sum;
            }
        }
        k
    }

    /// Convolve `img` with [`Self::kernel`], clamping samples at the image edges.
    pub fn apply(&self, img: &RgbImage) -> RgbImage {
        let n = self.length.max(1);
        let kernel = self.kernel();
        Kernel::new(&kernel, n, n).filter(img, |c: &mut u8, v: f32| {
            *c = v.round().clamp(0.0, 255.0) as u8;
        })
    }
}

/// `int(180 * i / count)` for `i in 0..count`, `count = 4 * (length / 2)`.
pub fn angle_grid(length: u32) -> Vec<u32> {
    let count = 4 * (length / 2);
    if count == 0 {
        return vec![0];
    }
    (0..count).map(|i| 180 * i / count).collect()
}

#[cfg(test)]
#[path = "../../tests/unit/blend/motion.rs"]
mod tests;
