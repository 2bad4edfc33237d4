//! One output image: selection, placement with restarts, rendering and annotation.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::annotate::coco::{AnnotationFile, RenderConfig, RenderPaths, write_json_atomic};
use crate::annotate::extract::{AnnotationExtractor, image_record};
use crate::assets::augment::{augment_rotation, augment_scale};
use crate::assets::decode::load_background;
use crate::assets::source::{AssetSource, ObjectAsset};
use crate::blend::mode::BlendMode;
use crate::blend::pipeline::{BlendingPipeline, PlacedObject};
use crate::config::{CountRange, GeneratorConfig};
use crate::foundation::core::CanvasSize;
use crate::foundation::error::{CutPasteError, CutPasteResult};
use crate::foundation::math::derive_seed;
use crate::generate::cancel::CancelToken;
use crate::mask::compositor::{CompositeMask, project_mask, resolve_occlusion};
use crate::placement::resolver::{OcclusionRegistry, PlacementRequest, PlacementResolver};

/// Candidate assets of one split.
#[derive(Clone, Default)]
pub struct SplitSources {
    /// Objects of interest.
    pub objects: Vec<Arc<dyn AssetSource>>,
    /// Distractors, composited but usually not annotated.
    pub distractors: Vec<Arc<dyn AssetSource>>,
    /// Background image paths.
    pub backgrounds: Vec<PathBuf>,
}

/// Files written for one blend variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariantOutput {
    /// Mode rendered into this file pair.
    pub mode: BlendMode,
    /// JPEG path.
    pub image: PathBuf,
    /// Annotation sidecar path.
    pub annotation: PathBuf,
}

/// Everything a worker needs to produce one image, fixed before any work starts.
#[derive(Clone)]
pub struct ImageJob {
    /// Split name.
    pub split: String,
    /// 1-based index within the split.
    pub index: u64,
    /// RNG seed of this job.
    pub seed: u64,
    /// Selected objects of interest, in placement order.
    pub objects: Vec<Arc<dyn AssetSource>>,
    /// Selected distractors, placed after the objects.
    pub distractors: Vec<Arc<dyn AssetSource>>,
    /// Selected background.
    pub background: PathBuf,
    /// One entry per configured blend mode.
    pub outputs: Vec<VariantOutput>,
}

impl std::fmt::Debug for ImageJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageJob")
            .field("split", &self.split)
            .field("index", &self.index)
            .field("seed", &self.seed)
            .field("objects", &self.objects.iter().map(|s| s.path()).collect::<Vec<_>>())
            .field(
                "distractors",
                &self.distractors.iter().map(|s| s.path()).collect::<Vec<_>>(),
            )
            .field("background", &self.background)
            .finish()
    }
}

/// Summary of a finished job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobReport {
    /// Whole-image restarts before every object was placed.
    pub restarts: u32,
    /// Objects that made it onto the canvas.
    pub placed: usize,
    /// Annotations written per variant.
    pub annotations: usize,
}

/// Terminal state of a job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobOutcome {
    /// All variants and sidecars were written.
    Success(JobReport),
    /// The restart cap was hit; nothing was written.
    Abandoned(String),
}

/// Draw the selection and output paths of `count` jobs for `split`.
///
/// Selection uses one planning RNG per split; each job gets its own seed derived from
/// `base_seed`, so the result does not depend on how jobs are scheduled later.
pub fn plan_jobs(
    split: &str,
    count: u64,
    sources: &SplitSources,
    cfg: &GeneratorConfig,
    modes: &[BlendMode],
    output_dir: &Path,
    base_seed: u64,
) -> CutPasteResult<Vec<ImageJob>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    cfg.validate()?;
    if sources.backgrounds.is_empty() {
        return Err(CutPasteError::validation(format!(
            "split '{split}' has no backgrounds"
        )));
    }
    if sources.objects.is_empty() && sources.distractors.is_empty() {
        return Err(CutPasteError::validation(format!(
            "split '{split}' has neither objects nor distractors"
        )));
    }

    let mut rng = StdRng::seed_from_u64(derive_seed(base_seed, split, 0));
    let mut jobs = Vec::with_capacity(count as usize);
    for index in 1..=count {
        let objects = pick(&sources.objects, cfg.objects_per_image, &mut rng);
        let distractors = pick(&sources.distractors, cfg.distractors_per_image, &mut rng);
        let background =
            sources.backgrounds[rng.gen_range(0..sources.backgrounds.len())].clone();
        let dir = output_dir.join(split).join(format!("{index:05}"));
        jobs.push(ImageJob {
            split: split.to_string(),
            index,
            seed: derive_seed(base_seed, split, index),
            objects,
            distractors,
            background,
            outputs: variant_outputs(&dir, modes),
        });
    }
    Ok(jobs)
}

fn pick<R: Rng + ?Sized>(
    pool: &[Arc<dyn AssetSource>],
    range: CountRange,
    rng: &mut R,
) -> Vec<Arc<dyn AssetSource>> {
    if pool.is_empty() {
        return Vec::new();
    }
    let n = (rng.gen_range(range.min..=range.max) as usize).min(pool.len());
    (0..n).map(|_| pool[rng.gen_range(0..pool.len())].clone()).collect()
}

/// `image_<mode><NN>.jpg` plus `.json`, `NN` counting repeats of the same mode.
pub fn variant_outputs(dir: &Path, modes: &[BlendMode]) -> Vec<VariantOutput> {
    let mut out = Vec::with_capacity(modes.len());
    for (i, &mode) in modes.iter().enumerate() {
        let nn = modes[..i].iter().filter(|&&m| m == mode).count();
        let stem = format!("image_{mode}{nn:02}");
        out.push(VariantOutput {
            mode,
            image: dir.join(format!("{stem}.jpg")),
            annotation: dir.join(format!("{stem}.json")),
        });
    }
    out
}

/// Run one job to completion.
///
/// Assets are decoded once. Every restart re-augments and re-places the same selection
/// from a cleared registry; rendering only starts once every object was accepted.
#[tracing::instrument(skip_all, fields(split = %job.split, index = job.index))]
pub fn run_job(
    job: &ImageJob,
    cfg: &GeneratorConfig,
    pipeline: &BlendingPipeline,
    cancel: &CancelToken,
) -> CutPasteResult<JobOutcome> {
    cancel.check()?;
    let mut rng = StdRng::seed_from_u64(job.seed);

    let background = load_background(&job.background)?;
    let canvas = CanvasSize::new(background.width(), background.height());
    let assets: Vec<ObjectAsset> = job
        .objects
        .iter()
        .chain(&job.distractors)
        .filter_map(|src| match src.load(&cfg.mask) {
            Ok(a) => Some(a),
            Err(err) => {
                tracing::warn!(path = %src.path().display(), %err, "skipping object");
                None
            }
        })
        .collect();

    let resolver = PlacementResolver::new(&cfg.placement);
    let mut registry = OcclusionRegistry::new();
    let mut restarts = 0u32;
    let placed = loop {
        cancel.check()?;
        registry.clear();
        if let Some(placed) = place_all(&assets, canvas, cfg, &resolver, &mut registry, &mut rng) {
            break placed;
        }
        restarts += 1;
        tracing::debug!(restarts, "placement exhausted, restarting image");
        if let Some(max) = cfg.placement.max_restarts
            && restarts > max
        {
            let reason = format!("placement exhausted after {max} restarts");
            tracing::warn!(%reason, "abandoning image");
            return Ok(JobOutcome::Abandoned(reason));
        }
    };

    let variants = pipeline.render(&background, &placed, &mut rng)?;

    let mut masks: Vec<CompositeMask> = placed
        .iter()
        .map(|p| CompositeMask {
            pixels: project_mask(&p.asset.mask, canvas, p.offset, cfg.mask.binarize_threshold),
            category_id: p.asset.category_id,
        })
        .collect();
    resolve_occlusion(&mut masks)?;
    let annotations = AnnotationExtractor::new(cfg.mask.annotation_threshold).extract_all(
        &masks,
        0,
        &cfg.ignore_labels,
    );

    // Nothing is written once cancelled; a job either writes all its variants or none.
    cancel.check()?;
    let render_config = render_config(job);
    for (i, (variant, out)) in variants.iter().zip(&job.outputs).enumerate() {
        let image_id = i as u64;
        write_jpeg(&variant.image, &out.image, cfg.jpeg_quality)?;
        let file = AnnotationFile {
            categories: cfg.categories.clone(),
            annotations: annotations
                .iter()
                .cloned()
                .map(|mut a| {
                    a.image_id = image_id;
                    a
                })
                .collect(),
            images: vec![image_record(&out.image, image_id, canvas)],
            render_config: Some(render_config.clone()),
        };
        write_json_atomic(&out.annotation, &file)?;
    }

    Ok(JobOutcome::Success(JobReport {
        restarts,
        placed: placed.len(),
        annotations: annotations.len(),
    }))
}

/// One placement attempt over every asset; `None` when any object is exhausted.
fn place_all<R: Rng + ?Sized>(
    assets: &[ObjectAsset],
    canvas: CanvasSize,
    cfg: &GeneratorConfig,
    resolver: &PlacementResolver<'_>,
    registry: &mut OcclusionRegistry,
    rng: &mut R,
) -> Option<Vec<PlacedObject>> {
    let mut placed = Vec::with_capacity(assets.len());
    for asset in assets {
        let mut asset = asset.clone();
        if cfg.augment.scale {
            asset = augment_scale(&asset, canvas, &cfg.augment, rng);
        }
        if cfg.augment.rotation {
            asset = augment_rotation(&asset, canvas, &cfg.augment, rng);
        }
        let Some(extent) = asset.extent(cfg.mask.inverted) else {
            tracing::debug!("augmented mask is empty, skipping object");
            continue;
        };
        let req = PlacementRequest {
            canvas,
            width: asset.width(),
            height: asset.height(),
            extent,
        };
        let outcome = resolver.resolve(registry, &req, rng);
        if outcome.is_exhausted() {
            return None;
        }
        placed.push(PlacedObject {
            asset,
            offset: outcome.offset(),
        });
    }
    Some(placed)
}

fn render_config(job: &ImageJob) -> RenderConfig {
    let parent = |list: &[Arc<dyn AssetSource>]| {
        list.first()
            .and_then(|s| s.path().parent())
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    };
    let names = |list: &[Arc<dyn AssetSource>]| {
        list.iter()
            .map(|s| {
                s.path()
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            })
            .collect()
    };
    RenderConfig {
        path: RenderPaths {
            objects: parent(&job.objects),
            distractor_objects: parent(&job.distractors),
        },
        objects: names(&job.objects),
        distractors: names(&job.distractors),
        background: job.background.display().to_string(),
    }
}

fn write_jpeg(img: &RgbImage, path: &Path, quality: u8) -> CutPasteResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    let f = File::create(path).with_context(|| format!("failed to create '{}'", path.display()))?;
    let mut enc = JpegEncoder::new_with_quality(BufWriter::new(f), quality.clamp(1, 100));
    enc.encode_image(img)
        .with_context(|| format!("failed to encode '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/generate/job.rs"]
mod tests;
