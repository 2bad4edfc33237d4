//! Immutable generator configuration.
//!
//! One [`GeneratorConfig`] is built (from JSON or defaults) before any work starts and is
//! passed by reference into every component. Defaults reproduce the stock dataset setup.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::annotate::coco::CocoCategory;
use crate::blend::mode::BlendMode;
use crate::foundation::error::{CutPasteError, CutPasteResult};

/// Inclusive `[min, max]` count range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    /// Lower bound (inclusive).
    pub min: u32,
    /// Upper bound (inclusive).
    pub max: u32,
}

impl CountRange {
    /// Create a count range.
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

/// Placement sampling parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Samples drawn per object before the attempt is declared exhausted.
    pub max_attempts: u32,
    /// Fraction of the object extent allowed to fall outside the canvas.
    pub max_truncation_fraction: f64,
    /// Intersection-over-candidate-area threshold above which two rectangles overlap.
    pub max_allowed_overlap: f64,
    /// Reject positions that occlude previously placed objects.
    pub avoid_occlusion: bool,
    /// Whole-image restarts allowed before a job is abandoned; `None` retries forever.
    pub max_restarts: Option<u32>,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            max_truncation_fraction: 0.25,
            max_allowed_overlap: 0.5,
            avoid_occlusion: false,
            max_restarts: None,
        }
    }
}

/// Geometric augmentation of object crops before placement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentConfig {
    /// Enable random scaling relative to the canvas.
    pub scale: bool,
    /// Enable random rotation.
    pub rotation: bool,
    /// Lower bound of the object's largest relative extent after scaling.
    pub min_scale: f64,
    /// Upper bound of the object's largest relative extent after scaling.
    pub max_scale: f64,
    /// Largest allowed upscaling factor of the source crop.
    pub max_upscaling: f64,
    /// Rotation range in whole degrees, symmetric around zero.
    pub max_degrees: i32,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            scale: false,
            rotation: false,
            min_scale: 0.15,
            max_scale: 0.4,
            max_upscaling: 1.2,
            max_degrees: 30,
        }
    }
}

/// Mask handling thresholds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskConfig {
    /// Side length of the square min filter applied to alpha masks on load.
    pub min_filter_size: u32,
    /// Treat white mask pixels as background when computing object extents.
    pub inverted: bool,
    /// Alpha values strictly above this become foreground in composite masks.
    pub binarize_threshold: u8,
    /// Composite-mask values below this are treated as background during annotation.
    pub annotation_threshold: u8,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            min_filter_size: 3,
            inverted: false,
            binarize_threshold: 200,
            annotation_threshold: 250,
        }
    }
}

/// Guidance field used by the in-process gradient-domain blend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoissonMethod {
    /// Match the Laplacian of the source foreground.
    #[default]
    Normal,
    /// Per pixel and channel, keep whichever of source/target gradient is stronger.
    Mixed,
}

/// In-process Poisson blend parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoissonConfig {
    /// Guidance field.
    pub method: PoissonMethod,
    /// Source gradient weight in [`PoissonMethod::Mixed`]; larger favours the source.
    pub mix_weight: f64,
}

impl Default for PoissonConfig {
    fn default() -> Self {
        Self {
            method: PoissonMethod::Normal,
            mix_weight: 1.0,
        }
    }
}

/// Invocation parameters of the external gradient-domain solver (`poisson-fast`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalSolverConfig {
    /// Executable name or path.
    pub program: PathBuf,
    /// Backend selector passed through to the solver.
    pub backend: String,
    /// Iteration budget.
    pub iterations: u32,
    /// Gradient source selector passed through to the solver.
    pub gradient: String,
}

impl Default for ExternalSolverConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("fpie"),
            backend: "cuda".to_string(),
            iterations: 5000,
            gradient: "src".to_string(),
        }
    }
}

/// Complete generator configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Worker threads used for parallel generation.
    pub workers: usize,
    /// Blend modes rendered for every image, in output order.
    pub blend_modes: Vec<String>,
    /// Objects of interest per image.
    pub objects_per_image: CountRange,
    /// Distractor objects per image.
    pub distractors_per_image: CountRange,
    /// Placement sampling.
    pub placement: PlacementConfig,
    /// Scale/rotation augmentation.
    pub augment: AugmentConfig,
    /// Mask thresholds.
    pub mask: MaskConfig,
    /// Category table written into every annotation file.
    pub categories: Vec<CocoCategory>,
    /// Category name assigned to objects of interest.
    pub object_category: String,
    /// Category name assigned to distractors.
    pub distractor_category: String,
    /// Category ids that are composited but never annotated.
    pub ignore_labels: Vec<u32>,
    /// In-process Poisson blend.
    pub poisson: PoissonConfig,
    /// External solver used by `poisson-fast`.
    pub external_solver: ExternalSolverConfig,
    /// Run seed; a random one is drawn and logged when unset.
    pub seed: Option<u64>,
    /// JPEG quality of written images.
    pub jpeg_quality: u8,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            workers: 20,
            blend_modes: vec![
                "gaussian".to_string(),
                "none".to_string(),
                "motion".to_string(),
            ],
            objects_per_image: CountRange::new(1, 4),
            distractors_per_image: CountRange::new(2, 4),
            placement: PlacementConfig::default(),
            augment: AugmentConfig::default(),
            mask: MaskConfig::default(),
            categories: vec![
                CocoCategory::new(0, "box"),
                CocoCategory::new(2, "distractor"),
            ],
            object_category: "box".to_string(),
            distractor_category: "distractor".to_string(),
            ignore_labels: vec![2],
            poisson: PoissonConfig::default(),
            external_solver: ExternalSolverConfig::default(),
            seed: None,
            jpeg_quality: 90,
        }
    }
}

impl GeneratorConfig {
    /// Parse a configuration from a JSON reader; missing fields take their defaults.
    pub fn from_reader<R: std::io::Read>(r: R) -> CutPasteResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| CutPasteError::config(format!("parse generator config JSON: {e}")))
    }

    /// Parse a configuration from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> CutPasteResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            CutPasteError::config(format!("open generator config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Parse the configured blend modes. Any unknown name is a [`CutPasteError::Config`].
    pub fn blend_modes(&self) -> CutPasteResult<Vec<BlendMode>> {
        self.blend_modes.iter().map(|m| m.parse()).collect()
    }

    /// Category id registered under `name`.
    pub fn category_id(&self, name: &str) -> CutPasteResult<u32> {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.id)
            .ok_or_else(|| CutPasteError::config(format!("unknown category name '{name}'")))
    }

    /// Check every value that would otherwise fail deep inside a job.
    pub fn validate(&self) -> CutPasteResult<()> {
        if self.workers == 0 {
            return Err(CutPasteError::config("workers must be >= 1"));
        }
        if self.blend_modes.is_empty() {
            return Err(CutPasteError::config("at least one blend mode is required"));
        }
        self.blend_modes()?;

        for (label, range) in [
            ("objects_per_image", self.objects_per_image),
            ("distractors_per_image", self.distractors_per_image),
        ] {
            if range.min > range.max {
                return Err(CutPasteError::config(format!(
                    "{label}: min ({}) must be <= max ({})",
                    range.min, range.max
                )));
            }
        }

        let p = &self.placement;
        if p.max_attempts == 0 {
            return Err(CutPasteError::config("placement.max_attempts must be >= 1"));
        }
        if !(0.0..=1.0).contains(&p.max_truncation_fraction) {
            return Err(CutPasteError::config(
                "placement.max_truncation_fraction must be within [0, 1]",
            ));
        }
        if !p.max_allowed_overlap.is_finite() || p.max_allowed_overlap < 0.0 {
            return Err(CutPasteError::config(
                "placement.max_allowed_overlap must be finite and >= 0",
            ));
        }

        let a = &self.augment;
        if !(a.min_scale > 0.0 && a.min_scale <= a.max_scale && a.max_upscaling > 0.0) {
            return Err(CutPasteError::config(
                "augment requires 0 < min_scale <= max_scale and max_upscaling > 0",
            ));
        }
        if a.max_degrees < 0 {
            return Err(CutPasteError::config("augment.max_degrees must be >= 0"));
        }
        if self.mask.min_filter_size == 0 {
            return Err(CutPasteError::config("mask.min_filter_size must be >= 1"));
        }
        if self.poisson.mix_weight < 0.0 {
            return Err(CutPasteError::config("poisson.mix_weight must be >= 0"));
        }

        self.category_id(&self.object_category)?;
        self.category_id(&self.distractor_category)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
