//! Gradient-domain (Poisson) image editing.
//!
//! Unknowns are the pixels of a masked domain. Each row of the system states that the
//! discrete Laplacian of the result equals a guidance term; neighbours outside the mask
//! are fixed to boundary values and moved to the right-hand side. The matrix is the
//! Dirichlet Laplacian of the domain, which is symmetric positive definite, so it is
//! factored once with a sparse Cholesky and solved for all three channels.

use image::{GrayImage, RgbImage};
use nalgebra::DMatrix;
use nalgebra_sparse::factorization::CscCholesky;
use nalgebra_sparse::{CooMatrix, CscMatrix};

use crate::config::{PoissonConfig, PoissonMethod};
use crate::foundation::core::{CanvasSize, ClipRegion, Offset};
use crate::foundation::error::{CutPasteError, CutPasteResult};

/// RGB triple in floating point, one value per channel.
pub type Rgbf = [f64; 3];

const NEIGHBOURS: [(i64, i64); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

/// Binary solve domain. Border pixels are never part of the domain, so every unknown has
/// four in-range neighbours.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Domain {
    width: u32,
    height: u32,
    inside: Vec<bool>,
}

impl Domain {
    /// Domain of the non-zero pixels of `mask`, minus its one-pixel frame.
    pub fn from_mask(mask: &GrayImage) -> Self {
        let (width, height) = mask.dimensions();
        let inside = mask
            .enumerate_pixels()
            .map(|(x, y, p)| {
                p[0] > 0 && x > 0 && y > 0 && x + 1 < width && y + 1 < height
            })
            .collect();
        Self {
            width,
            height,
            inside,
        }
    }

    /// Domain width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Domain height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `true` when `(x, y)` is an unknown.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.inside[(y * self.width + x) as usize]
    }

    /// Number of unknowns.
    pub fn len(&self) -> usize {
        self.inside.iter().filter(|&&v| v).count()
    }

    /// `true` when there is nothing to solve.
    pub fn is_empty(&self) -> bool {
        !self.inside.iter().any(|&v| v)
    }

    /// Unknown pixel coordinates, ordered along the shorter axis to keep the factor narrow.
    fn unknowns(&self) -> Vec<(u32, u32)> {
        let mut out = Vec::new();
        if self.width <= self.height {
            for y in 0..self.height {
                for x in 0..self.width {
                    if self.contains(x, y) {
                        out.push((x, y));
                    }
                }
            }
        } else {
            for x in 0..self.width {
                for y in 0..self.height {
                    if self.contains(x, y) {
                        out.push((x, y));
                    }
                }
            }
        }
        out
    }
}

/// Guidance term of the Poisson equation at one domain pixel.
pub trait GuidanceField {
    /// Sum over the four neighbours `q` of the guidance vector `v_pq` at `p = (x, y)`.
    fn divergence(&self, x: u32, y: u32) -> Rgbf;
}

/// Laplacian of the source image: `4 * s_p - sum(s_q)`.
pub struct SourceGradient<'a> {
    source: &'a RgbImage,
}

impl<'a> SourceGradient<'a> {
    /// Guidance from `source`, indexed in domain coordinates.
    pub fn new(source: &'a RgbImage) -> Self {
        Self { source }
    }
}

impl GuidanceField for SourceGradient<'_> {
    fn divergence(&self, x: u32, y: u32) -> Rgbf {
        let mut acc = [0.0; 3];
        let p = pixel_f(self.source, x, y);
        for (nx, ny) in neighbours(x, y) {
            let q = pixel_f(self.source, nx, ny);
            for c in 0..3 {
                acc[c] += p[c] - q[c];
            }
        }
        acc
    }
}

/// Per channel and neighbour, the stronger of the source and target gradient.
pub struct MixedGradient<'a> {
    source: &'a RgbImage,
    target: &'a RgbImage,
    origin: (u32, u32),
    weight: f64,
}

impl<'a> MixedGradient<'a> {
    /// `origin` is the target position of domain pixel `(0, 0)`; `weight` scales the source
    /// gradient before the comparison.
    pub fn new(source: &'a RgbImage, target: &'a RgbImage, origin: (u32, u32), weight: f64) -> Self {
        Self {
            source,
            target,
            origin,
            weight,
        }
    }
}

impl GuidanceField for MixedGradient<'_> {
    fn divergence(&self, x: u32, y: u32) -> Rgbf {
        let (ox, oy) = self.origin;
        let sp = pixel_f(self.source, x, y);
        let tp = pixel_f(self.target, x + ox, y + oy);
        let mut acc = [0.0; 3];
        for (nx, ny) in neighbours(x, y) {
            let sq = pixel_f(self.source, nx, ny);
            let tq = pixel_f(self.target, nx + ox, ny + oy);
            for c in 0..3 {
                let fp = sp[c] - sq[c];
                let gp = tp[c] - tq[c];
                acc[c] += if (fp * self.weight).abs() > gp.abs() { fp } else { gp };
            }
        }
        acc
    }
}

/// Solve for the domain pixels of a `width x height` region.
///
/// `boundary(x, y)` supplies the fixed value of a non-domain neighbour. Returns the
/// unclamped solution of each unknown with its domain coordinates.
pub fn solve_poisson(
    domain: &Domain,
    boundary: &dyn Fn(u32, u32) -> Rgbf,
    guidance: &dyn GuidanceField,
) -> CutPasteResult<Vec<((u32, u32), Rgbf)>> {
    let unknowns = domain.unknowns();
    let n = unknowns.len();
    if n == 0 {
        return Ok(Vec::new());
    }

    let mut index = vec![usize::MAX; domain.width as usize * domain.height as usize];
    for (k, &(x, y)) in unknowns.iter().enumerate() {
        index[(y * domain.width + x) as usize] = k;
    }

    let mut coo = CooMatrix::<f64>::new(n, n);
    let mut rhs = DMatrix::<f64>::zeros(n, 3);
    for (k, &(x, y)) in unknowns.iter().enumerate() {
        coo.push(k, k, 4.0);
        let mut b = guidance.divergence(x, y);
        for (nx, ny) in neighbours(x, y) {
            if domain.contains(nx, ny) {
                coo.push(k, index[(ny * domain.width + nx) as usize], -1.0);
            } else {
                let v = boundary(nx, ny);
                for c in 0..3 {
                    b[c] += v[c];
                }
            }
        }
        for c in 0..3 {
            rhs[(k, c)] = b[c];
        }
    }

    let a = CscMatrix::from(&coo);
    let cholesky = CscCholesky::factor(&a)
        .map_err(|e| CutPasteError::solver(format!("poisson factorization failed: {e}")))?;
    let solution = cholesky.solve(&rhs);

    Ok(unknowns
        .into_iter()
        .enumerate()
        .map(|(k, xy)| (xy, [solution[(k, 0)], solution[(k, 1)], solution[(k, 2)]]))
        .collect())
}

/// Gradient-domain blend of `fg` (masked by `mask`) into `target` at `offset`.
///
/// The crop is clipped to the canvas first; pixels outside the solve domain keep their
/// target values.
pub fn poisson_blend(
    target: &mut RgbImage,
    fg: &RgbImage,
    mask: &GrayImage,
    offset: Offset,
    cfg: &PoissonConfig,
) -> CutPasteResult<()> {
    if fg.dimensions() != mask.dimensions() {
        return Err(CutPasteError::validation(
            "poisson_blend expects foreground and mask of identical size",
        ));
    }
    let canvas = CanvasSize::new(target.width(), target.height());
    let Some(clip) = ClipRegion::new(canvas, offset, fg.width(), fg.height()) else {
        return Ok(());
    };
    let (source, region_mask) = crop_to_clip(fg, mask, &clip);
    let domain = Domain::from_mask(&region_mask);
    let origin = (clip.dst_x, clip.dst_y);

    let solved = {
        let tgt: &RgbImage = target;
        let boundary = |x: u32, y: u32| pixel_f(tgt, x + origin.0, y + origin.1);
        match cfg.method {
            PoissonMethod::Normal => {
                solve_poisson(&domain, &boundary, &SourceGradient::new(&source))?
            }
            PoissonMethod::Mixed => solve_poisson(
                &domain,
                &boundary,
                &MixedGradient::new(&source, tgt, origin, cfg.mix_weight),
            )?,
        }
    };

    for ((x, y), v) in solved {
        target.put_pixel(x + origin.0, y + origin.1, image::Rgb(clamp_rgb(v)));
    }
    Ok(())
}

/// Foreground and mask restricted to the on-canvas part of the crop.
pub(crate) fn crop_to_clip(fg: &RgbImage, mask: &GrayImage, clip: &ClipRegion) -> (RgbImage, GrayImage) {
    let fg = image::imageops::crop_imm(fg, clip.src_x, clip.src_y, clip.width, clip.height).to_image();
    let mask =
        image::imageops::crop_imm(mask, clip.src_x, clip.src_y, clip.width, clip.height).to_image();
    (fg, mask)
}

pub(crate) fn pixel_f(img: &RgbImage, x: u32, y: u32) -> Rgbf {
    let p = img.get_pixel(x, y);
    [f64::from(p[0]), f64::from(p[1]), f64::from(p[2])]
}

pub(crate) fn clamp_rgb(v: Rgbf) -> [u8; 3] {
    v.map(|c| c.round().clamp(0.0, 255.0) as u8)
}

/// In-range 4-neighbourhood of an interior pixel.
pub(crate) fn neighbours(x: u32, y: u32) -> impl Iterator<Item = (u32, u32)> {
    NEIGHBOURS.iter().filter_map(move |&(dx, dy)| {
        let nx = i64::from(x) + dx;
        let ny = i64::from(y) + dy;
        (nx >= 0 && ny >= 0).then_some((nx as u32, ny as u32))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/blend/poisson.rs"]
mod tests;
