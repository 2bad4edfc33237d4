use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use image::{GrayImage, Luma, Rgb, RgbImage};

use crate::assets::source::{AssetSource, ObjectAsset};
use crate::blend::external::{ExternalBlendSolver, SolverRequest};
use crate::config::MaskConfig;
use crate::foundation::error::{CutPasteError, CutPasteResult};

static SEQ: AtomicU64 = AtomicU64::new(0);

/// Unique directory under the system temp dir, removed on drop.
pub(crate) struct ScratchDir(PathBuf);

impl ScratchDir {
    pub(crate) fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "cutpaste_test_{name}_{}_{}",
            std::process::id(),
            SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        let _ = std::fs::remove_dir_all(&path);
        std::fs::create_dir_all(&path).unwrap();
        Self(path)
    }

    pub(crate) fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

/// Square, fully opaque object of one colour; `side == 0` fails to load.
pub(crate) struct SolidSource {
    pub(crate) path: PathBuf,
    pub(crate) side: u32,
    pub(crate) color: [u8; 3],
    pub(crate) category_id: u32,
}

impl SolidSource {
    pub(crate) fn shared(name: &str, side: u32, category_id: u32) -> std::sync::Arc<dyn AssetSource> {
        std::sync::Arc::new(Self {
            path: PathBuf::from("/assets/objects").join(name),
            side,
            color: [240, 30, 30],
            category_id,
        })
    }
}

impl AssetSource for SolidSource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn category_id(&self) -> u32 {
        self.category_id
    }

    fn load(&self, _mask_cfg: &MaskConfig) -> CutPasteResult<ObjectAsset> {
        if self.side == 0 {
            return Err(CutPasteError::asset("unreadable"));
        }
        Ok(ObjectAsset {
            foreground: RgbImage::from_pixel(self.side, self.side, Rgb(self.color)),
            mask: GrayImage::from_pixel(self.side, self.side, Luma([255])),
            category_id: self.category_id,
        })
    }
}

/// External solver that always fails, as on a host without an accelerator.
pub(crate) struct UnavailableSolver;

impl ExternalBlendSolver for UnavailableSolver {
    fn solve(&self, _req: &SolverRequest<'_>) -> CutPasteResult<()> {
        Err(CutPasteError::solver("no accelerator"))
    }
}

/// Uniform RGB background saved as PNG.
pub(crate) fn write_background(dir: &Path, w: u32, h: u32) -> PathBuf {
    let path = dir.join("bg.png");
    RgbImage::from_pixel(w, h, Rgb([20, 40, 60])).save(&path).unwrap();
    path
}
