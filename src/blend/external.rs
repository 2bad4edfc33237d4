//! Gradient-domain blending through an external solver process (`poisson-fast`).
//!
//! Inputs are written as PNG rasters into a per-call scratch directory, the solver is run to
//! completion, and the result raster replaces the target. The scratch directory is removed
//! on every exit path.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context as _;
use image::{GrayImage, Luma, RgbImage};

use crate::blend::poisson::crop_to_clip;
use crate::config::ExternalSolverConfig;
use crate::foundation::core::{CanvasSize, ClipRegion, Offset};
use crate::foundation::error::{CutPasteError, CutPasteResult};

/// Raster paths and placement handed to an [`ExternalBlendSolver`].
#[derive(Clone, Debug)]
pub struct SolverRequest<'a> {
    /// Foreground crop, already clipped to the canvas.
    pub source: &'a Path,
    /// Binary mask matching `source`.
    pub mask: &'a Path,
    /// Full target canvas.
    pub target: &'a Path,
    /// Where the solver must write the blended canvas.
    pub output: &'a Path,
    /// Target column of the crop's first column.
    pub x: u32,
    /// Target row of the crop's first row.
    pub y: u32,
}

/// Port for out-of-process gradient-domain solvers.
pub trait ExternalBlendSolver: Send + Sync {
    /// Run the solver to completion; success means `req.output` holds the result.
    fn solve(&self, req: &SolverRequest<'_>) -> CutPasteResult<()>;
}

/// The `fpie` command-line solver.
#[derive(Clone, Debug)]
pub struct FpieCommand {
    cfg: ExternalSolverConfig,
}

impl FpieCommand {
    /// Solver invoking `cfg.program` with the configured backend and iteration budget.
    pub fn new(cfg: ExternalSolverConfig) -> Self {
        Self { cfg }
    }

    pub(crate) fn command(&self, req: &SolverRequest<'_>) -> Command {
        let mut cmd = Command::new(&self.cfg.program);
        cmd.arg("-s")
            .arg(req.source)
            .arg("-m")
            .arg(req.mask)
            .arg("-t")
            .arg(req.target)
            .arg("-o")
            .arg(req.output)
            .args(["-h1", &req.y.to_string(), "-w1", &req.x.to_string()])
            .args(["-b", &self.cfg.backend])
            .args(["-n", &self.cfg.iterations.to_string()])
            .args(["-g", &self.cfg.gradient]);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd
    }
}

impl ExternalBlendSolver for FpieCommand {
    fn solve(&self, req: &SolverRequest<'_>) -> CutPasteResult<()> {
        let out = self.command(req).output().map_err(|e| {
            CutPasteError::solver(format!(
                "failed to spawn '{}' (is it installed and on PATH?): {e}",
                self.cfg.program.display()
            ))
        })?;
        if !out.status.success() {
            return Err(CutPasteError::solver(format!(
                "'{}' exited with status {}: {}",
                self.cfg.program.display(),
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        Ok(())
    }
}

static SCRATCH_SEQ: AtomicU64 = AtomicU64::new(0);

struct ScratchDirGuard(Option<PathBuf>);

impl ScratchDirGuard {
    fn create() -> CutPasteResult<Self> {
        let path = std::env::temp_dir().join(format!(
            "cutpaste_fpie_{}_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0),
            SCRATCH_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::create_dir_all(&path)
            .with_context(|| format!("failed to create scratch directory '{}'", path.display()))?;
        Ok(Self(Some(path)))
    }

    fn path(&self) -> &Path {
        self.0.as_deref().unwrap_or(Path::new(""))
    }
}

impl Drop for ScratchDirGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_dir_all(path);
        }
    }
}

/// Blend `fg` into `target` at `offset` with `solver`.
///
/// On error `target` is left as it was.
pub fn external_blend(
    target: &mut RgbImage,
    fg: &RgbImage,
    mask: &GrayImage,
    offset: Offset,
    solver: &dyn ExternalBlendSolver,
) -> CutPasteResult<()> {
    if fg.dimensions() != mask.dimensions() {
        return Err(CutPasteError::validation(
            "external_blend expects foreground and mask of identical size",
        ));
    }
    let canvas = CanvasSize::new(target.width(), target.height());
    let Some(clip) = ClipRegion::new(canvas, offset, fg.width(), fg.height()) else {
        return Ok(());
    };
    let (source, region_mask) = crop_to_clip(fg, mask, &clip);
    let binary = GrayImage::from_fn(region_mask.width(), region_mask.height(), |x, y| {
        Luma([if region_mask.get_pixel(x, y)[0] > 0 { 255 } else { 0 }])
    });

    let scratch = ScratchDirGuard::create()?;
    let dir = scratch.path();
    let (src_path, mask_path, target_path, result_path) = (
        dir.join("src.png"),
        dir.join("mask.png"),
        dir.join("target.png"),
        dir.join("result.png"),
    );
    save_raster(&source, &src_path)?;
    save_raster(&binary, &mask_path)?;
    save_raster(target, &target_path)?;

    solver.solve(&SolverRequest {
        source: &src_path,
        mask: &mask_path,
        target: &target_path,
        output: &result_path,
        x: clip.dst_x,
        y: clip.dst_y,
    })?;

    let result = image::open(&result_path)
        .map_err(|e| {
            CutPasteError::solver(format!(
                "failed to read solver output '{}': {e}",
                result_path.display()
            ))
        })?
        .to_rgb8();
    if result.dimensions() != target.dimensions() {
        return Err(CutPasteError::solver(format!(
            "solver output is {}x{}, expected {}x{}",
            result.width(),
            result.height(),
            target.width(),
            target.height()
        )));
    }
    *target = result;
    Ok(())
}

fn save_raster<P, C>(img: &image::ImageBuffer<P, C>, path: &Path) -> CutPasteResult<()>
where
    P: image::PixelWithColorType,
    [P::Subpixel]: image::EncodableLayout,
    C: std::ops::Deref<Target = [P::Subpixel]>,
{
    img.save(path)
        .map_err(|e| CutPasteError::solver(format!("failed to write '{}': {e}", path.display())))
}

#[cfg(test)]
#[path = "../../tests/unit/blend/external.rs"]
mod tests;
