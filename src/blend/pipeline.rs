use std::sync::Arc;

use image::{GrayImage, RgbImage};
use rand::Rng;

use crate::assets::source::ObjectAsset;
use crate::blend::external::{ExternalBlendSolver, external_blend};
use crate::blend::filter::{box_blur_mask, gaussian_blur_mask};
use crate::blend::mode::BlendMode;
use crate::blend::motion::MotionBlur;
use crate::blend::paste::{binarize, paste_with_mask};
use crate::blend::photometric::{
    apply_gamma_correction, apply_illumination_change, random_mask_adjustment,
};
use crate::blend::poisson::poisson_blend;
use crate::config::{GeneratorConfig, PoissonConfig};
use crate::foundation::core::Offset;
use crate::foundation::error::CutPasteResult;

/// An augmented object with its accepted offset.
#[derive(Clone, Debug)]
pub struct PlacedObject {
    /// Foreground, mask and category.
    pub asset: ObjectAsset,
    /// Top-left corner of the crop on the canvas.
    pub offset: Offset,
}

/// One rendered output image.
#[derive(Clone, Debug, PartialEq)]
pub struct BlendVariant {
    /// Compositing strategy used.
    pub mode: BlendMode,
    /// Rendered canvas.
    pub image: RgbImage,
}

/// Renders every configured blend mode from a single set of placements.
pub struct BlendingPipeline {
    modes: Vec<BlendMode>,
    binarize_threshold: u8,
    poisson: PoissonConfig,
    solver: Arc<dyn ExternalBlendSolver>,
}

impl std::fmt::Debug for BlendingPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlendingPipeline")
            .field("modes", &self.modes)
            .field("binarize_threshold", &self.binarize_threshold)
            .field("poisson", &self.poisson)
            .finish_non_exhaustive()
    }
}

impl BlendingPipeline {
    /// Parse the configured modes. An unknown mode fails here, before any rendering.
    pub fn new(cfg: &GeneratorConfig, solver: Arc<dyn ExternalBlendSolver>) -> CutPasteResult<Self> {
        Ok(Self {
            modes: cfg.blend_modes()?,
            binarize_threshold: cfg.mask.binarize_threshold,
            poisson: cfg.poisson.clone(),
            solver,
        })
    }

    /// Modes in output order.
    pub fn modes(&self) -> &[BlendMode] {
        &self.modes
    }

    /// Composite `objects` (in placement order) onto a copy of `background` per mode.
    ///
    /// Every variant sees identical offsets and crops; whole-image motion blur runs after
    /// the last paste.
    pub fn render<R: Rng + ?Sized>(
        &self,
        background: &RgbImage,
        objects: &[PlacedObject],
        rng: &mut R,
    ) -> CutPasteResult<Vec<BlendVariant>> {
        let mut variants: Vec<BlendVariant> = self
            .modes
            .iter()
            .map(|&mode| BlendVariant {
                mode,
                image: background.clone(),
            })
            .collect();

        for object in objects {
            for variant in &mut variants {
                self.composite(variant, object, rng)?;
            }
        }

        for variant in &mut variants {
            if variant.mode == BlendMode::Motion {
                let blur = MotionBlur::random(rng);
                tracing::debug!(?blur, "applying motion blur");
                variant.image = blur.apply(&variant.image);
            }
        }
        Ok(variants)
    }

    fn composite<R: Rng + ?Sized>(
        &self,
        variant: &mut BlendVariant,
        object: &PlacedObject,
        rng: &mut R,
    ) -> CutPasteResult<()> {
        let fg = &object.asset.foreground;
        let mask = &object.asset.mask;
        let offset = object.offset;
        let canvas = &mut variant.image;

        match variant.mode {
            BlendMode::None | BlendMode::Motion => {
                paste_with_mask(canvas, fg, &binarize(mask, self.binarize_threshold), offset)
            }
            BlendMode::Gaussian => {
                paste_with_mask(canvas, fg, &gaussian_blur_mask(mask, 2, 2.0)?, offset)
            }
            BlendMode::Box => paste_with_mask(canvas, fg, &box_blur_mask(mask, 1)?, offset),
            BlendMode::Poisson => poisson_blend(canvas, fg, mask, offset, &self.poisson),
            BlendMode::PoissonFast => {
                if let Err(err) = external_blend(canvas, fg, mask, offset, self.solver.as_ref()) {
                    tracing::warn!(%err, "external poisson solve failed; variant left unmodified");
                }
                Ok(())
            }
            BlendMode::GammaCorrection => {
                let fg = apply_gamma_correction(fg, rng);
                paste_with_mask(canvas, &fg, mask, offset)
            }
            BlendMode::Illumination => {
                let fg = apply_illumination_change(fg, mask, rng)?;
                paste_with_mask(canvas, &fg, mask, offset)
            }
            BlendMode::Mixed => {
                let fg = apply_gamma_correction(fg, rng);
                let fg = apply_illumination_change(&fg, mask, rng)?;
                let mask: GrayImage = random_mask_adjustment(mask, rng)?;
                paste_with_mask(canvas, &fg, &mask, offset)
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/blend/pipeline.rs"]
mod tests;
