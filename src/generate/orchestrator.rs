//! Split-level scheduling of image jobs and the final per-split merge.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use crate::blend::external::ExternalBlendSolver;
use crate::blend::pipeline::BlendingPipeline;
use crate::config::GeneratorConfig;
use crate::foundation::error::{CutPasteError, CutPasteResult};
use crate::generate::cancel::CancelToken;
use crate::generate::job::{ImageJob, JobOutcome, SplitSources, plan_jobs, run_job};
use crate::annotate::coco::write_json_atomic;
use crate::merge::merger::merge_annotation_files;

/// Images requested for one split and the assets they draw from.
#[derive(Clone)]
pub struct SplitRequest {
    /// Split name, also the output subdirectory.
    pub name: String,
    /// Number of images.
    pub count: u64,
    /// Candidate assets.
    pub sources: SplitSources,
}

/// Per-split tallies.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SplitReport {
    /// Split name.
    pub name: String,
    /// Jobs that wrote their outputs.
    pub succeeded: u64,
    /// Jobs that hit the restart cap.
    pub abandoned: u64,
    /// Jobs that failed with an error.
    pub failed: u64,
    /// Merged annotation file, when one was written.
    pub merged: Option<PathBuf>,
}

/// Result of a full run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DatasetReport {
    /// Base seed every job seed was derived from.
    pub seed: u64,
    /// One entry per requested split with a non-zero count.
    pub splits: Vec<SplitReport>,
}

/// Runs image jobs on a fixed-size worker pool (or inline) and merges each split.
pub struct ParallelOrchestrator<'a> {
    cfg: &'a GeneratorConfig,
    pipeline: BlendingPipeline,
    pool: Option<rayon::ThreadPool>,
    cancel: CancelToken,
}

impl<'a> ParallelOrchestrator<'a> {
    /// Validate `cfg` and prepare the pool. `sequential` runs every job on the caller thread.
    pub fn new(
        cfg: &'a GeneratorConfig,
        solver: Arc<dyn ExternalBlendSolver>,
        sequential: bool,
        cancel: CancelToken,
    ) -> CutPasteResult<Self> {
        cfg.validate()?;
        let pipeline = BlendingPipeline::new(cfg, solver)?;
        let pool = if sequential {
            None
        } else {
            Some(build_thread_pool(cfg.workers)?)
        };
        Ok(Self {
            cfg,
            pipeline,
            pool,
            cancel,
        })
    }

    /// Generate every split in order, then merge the annotation files its successful jobs wrote.
    ///
    /// A cancelled run stops scheduling new jobs and returns [`CutPasteError::Cancelled`]
    /// without merging; files already written are left in place.
    pub fn generate(&self, output_dir: &Path, splits: &[SplitRequest]) -> CutPasteResult<DatasetReport> {
        let seed = self.cfg.seed.unwrap_or_else(rand::random);
        tracing::info!(seed, "starting dataset generation");

        let mut report = DatasetReport {
            seed,
            splits: Vec::new(),
        };
        for split in splits {
            if split.count == 0 {
                tracing::info!(split = %split.name, "no images requested, skipping split");
                continue;
            }
            report.splits.push(self.generate_split(output_dir, split, seed)?);
        }
        Ok(report)
    }

    fn generate_split(&self, output_dir: &Path, split: &SplitRequest, seed: u64) -> CutPasteResult<SplitReport> {
        let started = Instant::now();
        let jobs = plan_jobs(
            &split.name,
            split.count,
            &split.sources,
            self.cfg,
            self.pipeline.modes(),
            output_dir,
            seed,
        )?;
        tracing::info!(split = %split.name, jobs = jobs.len(), "generating split");

        let results = match &self.pool {
            Some(pool) => pool.install(|| {
                jobs.par_iter()
                    .map(|job| self.run_one(job))
                    .collect::<Vec<_>>()
            }),
            None => jobs.iter().map(|job| self.run_one(job)).collect(),
        };
        self.cancel.check()?;

        let mut out = SplitReport {
            name: split.name.clone(),
            ..SplitReport::default()
        };
        let mut written = Vec::new();
        for (job, result) in jobs.iter().zip(results) {
            match result {
                Ok(JobOutcome::Success(_)) => {
                    out.succeeded += 1;
                    written.extend(job.outputs.iter().map(|o| o.annotation.clone()));
                }
                Ok(JobOutcome::Abandoned(_)) => out.abandoned += 1,
                Err(CutPasteError::Cancelled) => return Err(CutPasteError::Cancelled),
                Err(err) => {
                    tracing::warn!(split = %job.split, index = job.index, %err, "image job failed");
                    out.failed += 1;
                }
            }
        }

        // Only this run's sidecars; anything else under the split directory is ignored.
        if !written.is_empty() {
            let merged_path = output_dir.join(format!("{}.json", split.name));
            let merged = merge_annotation_files(&written)?;
            write_json_atomic(&merged_path, &merged)?;
            tracing::info!(
                split = %split.name,
                images = merged.images.len(),
                out = %merged_path.display(),
                "wrote merged annotations"
            );
            out.merged = Some(merged_path);
        }
        tracing::info!(
            split = %split.name,
            succeeded = out.succeeded,
            abandoned = out.abandoned,
            failed = out.failed,
            elapsed_sec = started.elapsed().as_secs_f64(),
            "split finished"
        );
        Ok(out)
    }

    fn run_one(&self, job: &ImageJob) -> CutPasteResult<JobOutcome> {
        self.cancel.check()?;
        run_job(job, self.cfg, &self.pipeline, &self.cancel)
    }
}

/// Worker pool with exactly `threads` threads.
pub fn build_thread_pool(threads: usize) -> CutPasteResult<rayon::ThreadPool> {
    if threads == 0 {
        return Err(CutPasteError::config("worker count must be >= 1"));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("cutpaste-worker-{i}"))
        .build()
        .map_err(|e| CutPasteError::config(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/generate/orchestrator.rs"]
mod tests;
