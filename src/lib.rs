//! Cut-and-paste synthesis of object-detection datasets.
//!
//! Object crops with a mask are pasted onto background photographs at random,
//! occlusion-aware positions. Every composite is rendered once per configured blend mode
//! and annotated in MS-COCO format; per-image annotation files are merged per split.
//!
//! The usual entry point is [`ParallelOrchestrator`]:
//!
//! - Build a [`GeneratorConfig`] and one [`SplitRequest`] per split
//! - Create the orchestrator with an [`ExternalBlendSolver`] (for `poisson-fast`)
//! - Call [`ParallelOrchestrator::generate`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub(crate) mod annotate;
pub(crate) mod assets;
pub(crate) mod blend;
/// Generator configuration.
pub mod config;
pub(crate) mod foundation;
pub(crate) mod generate;
pub(crate) mod mask;
pub(crate) mod merge;
pub(crate) mod placement;

#[cfg(test)]
mod test_support;

pub use crate::config::{
    AugmentConfig, CountRange, ExternalSolverConfig, GeneratorConfig, MaskConfig,
    PlacementConfig, PoissonConfig, PoissonMethod,
};
pub use crate::foundation::core::{CanvasSize, ClipRegion, Extent, Offset, Rect};
pub use crate::foundation::error::{CutPasteError, CutPasteResult};

pub use crate::assets::augment::{augment_rotation, augment_scale, rotate_expand};
pub use crate::assets::decode::{load_background, mask_extent};
pub use crate::assets::source::{AlphaMaskedSource, AssetSource, ObjectAsset};
pub use crate::assets::splits::{SPLITS, SplitFile, load_split_entries};

pub use crate::mask::compositor::{CompositeMask, project_mask, resolve_occlusion};
pub use crate::placement::resolver::{
    OcclusionRegistry, PlacementOutcome, PlacementRequest, PlacementResolver, overlaps,
};

pub use crate::blend::external::{ExternalBlendSolver, FpieCommand, SolverRequest, external_blend};
pub use crate::blend::filter::{box_blur_mask, gaussian_blur_mask};
pub use crate::blend::mode::BlendMode;
pub use crate::blend::motion::{LineDirection, MotionBlur};
pub use crate::blend::paste::{binarize, paste_with_mask};
pub use crate::blend::photometric::{
    IlluminationParams, MaskAdjustment, apply_gamma, illumination_change,
};
pub use crate::blend::pipeline::{BlendVariant, BlendingPipeline, PlacedObject};
pub use crate::blend::poisson::{
    Domain, GuidanceField, MixedGradient, Rgbf, SourceGradient, poisson_blend, solve_poisson,
};

pub use crate::annotate::coco::{
    AnnotationFile, CocoAnnotation, CocoCategory, CocoImage, MergedDataset, RenderConfig,
    RenderPaths, read_json, write_json_atomic,
};
pub use crate::annotate::contours::mask_polygons;
pub use crate::annotate::extract::{AnnotationExtractor, image_record};
pub use crate::merge::merger::{collect_annotation_files, merge_annotation_files, merge_split_dir};

pub use crate::generate::cancel::CancelToken;
pub use crate::generate::job::{
    ImageJob, JobOutcome, JobReport, SplitSources, VariantOutput, plan_jobs, run_job,
};
pub use crate::generate::orchestrator::{
    DatasetReport, ParallelOrchestrator, SplitReport, SplitRequest, build_thread_pool,
};
