//! Dataset-wide merge of per-image annotation files.
//!
//! Files are consumed in the given order; image ids and annotation ids are reassigned
//! sequentially from zero. Categories are deduplicated by name and each name must map to a
//! single id across every input, otherwise nothing is written.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::annotate::coco::{AnnotationFile, CocoCategory, MergedDataset, read_json, write_json_atomic};
use crate::foundation::error::{CutPasteError, CutPasteResult};

/// Merge the annotation files at `paths`, in order, into one dataset.
pub fn merge_annotation_files(paths: &[PathBuf]) -> CutPasteResult<MergedDataset> {
    let mut merged = MergedDataset::default();
    let mut categories: BTreeMap<String, BTreeSet<u32>> = BTreeMap::new();

    for path in paths {
        let file: AnnotationFile = read_json(path)
            .map_err(|e| CutPasteError::merge(format!("cannot load '{}': {e}", path.display())))?;

        let mut image_ids = HashMap::with_capacity(file.images.len());
        for mut image in file.images {
            let new_id = merged.images.len() as u64;
            image_ids.insert(image.id, new_id);
            image.id = new_id;
            merged.images.push(image);
        }

        for mut annotation in file.annotations {
            let Some(&image_id) = image_ids.get(&annotation.image_id) else {
                return Err(CutPasteError::merge(format!(
                    "'{}': annotation {} references unknown image {}",
                    path.display(),
                    annotation.id,
                    annotation.image_id
                )));
            };
            annotation.image_id = image_id;
            annotation.id = merged.annotations.len() as u64;
            merged.annotations.push(annotation);
        }

        for c in file.categories {
            categories.entry(c.name).or_default().insert(c.id);
        }
    }

    for (name, ids) in &categories {
        if ids.len() > 1 {
            return Err(CutPasteError::merge(format!(
                "category '{name}' maps to several ids: {ids:?}"
            )));
        }
    }
    merged.categories = categories
        .into_iter()
        .filter_map(|(name, ids)| ids.first().map(|&id| CocoCategory { id, name }))
        .collect();
    merged.categories.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.name.cmp(&b.name)));

    tracing::debug!(
        files = paths.len(),
        images = merged.images.len(),
        annotations = merged.annotations.len(),
        "merged annotation files"
    );
    Ok(merged)
}

/// Every `*.json` file below `dir`, recursively, in sorted path order, excluding `exclude`.
pub fn collect_annotation_files(dir: &Path, exclude: Option<&Path>) -> CutPasteResult<Vec<PathBuf>> {
    let mut out = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(d) = pending.pop() {
        for entry in std::fs::read_dir(&d).with_context(|| format!("read_dir '{}'", d.display()))? {
            let path = entry
                .with_context(|| format!("read_dir '{}'", d.display()))?
                .path();
            if path.is_dir() {
                pending.push(path);
                continue;
            }
            let is_json = path
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("json"));
            if is_json && exclude != Some(path.as_path()) {
                out.push(path);
            }
        }
    }
    out.sort();
    Ok(out)
}

/// Merge the per-image files of `<dataset_dir>/<split>` into `<dataset_dir>/<split>.json`.
///
/// Returns `None` without writing when the split has no annotation files.
pub fn merge_split_dir(dataset_dir: &Path, split: &str) -> CutPasteResult<Option<MergedDataset>> {
    let split_dir = dataset_dir.join(split);
    let out_path = dataset_dir.join(format!("{split}.json"));
    if !split_dir.is_dir() {
        return Ok(None);
    }
    let files = collect_annotation_files(&split_dir, Some(&out_path))?;
    if files.is_empty() {
        return Ok(None);
    }
    let merged = merge_annotation_files(&files)?;
    write_json_atomic(&out_path, &merged)?;
    tracing::info!(
        split,
        images = merged.images.len(),
        out = %out_path.display(),
        "wrote merged annotations"
    );
    Ok(Some(merged))
}

#[cfg(test)]
#[path = "../../tests/unit/merge/merger.rs"]
mod tests;
