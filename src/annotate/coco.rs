//! MS-COCO record types and JSON file helpers.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write as _};
use std::path::Path;

use anyhow::Context as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{CutPasteError, CutPasteResult};

/// One entry of the category table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CocoCategory {
    /// Numeric label.
    pub id: u32,
    /// Human-readable name; unique per id across a dataset.
    pub name: String,
}

impl CocoCategory {
    /// Create a category entry.
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Image record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CocoImage {
    /// Image id, unique within a file.
    pub id: u64,
    /// Path relative to the dataset root (`<split>/<index>/<file>`).
    pub file_name: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Instance annotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CocoAnnotation {
    /// Flattened `[x0, y0, x1, y1, ...]` polygons, outer borders and holes alike.
    pub segmentation: Vec<Vec<u32>>,
    /// Always 0: every annotation is a single instance.
    pub iscrowd: u8,
    /// Image the annotation belongs to.
    pub image_id: u64,
    /// Object category.
    pub category_id: u32,
    /// Annotation id, unique within a file.
    pub id: u64,
    /// `[x, y, width, height]` of the visible mask pixels.
    pub bbox: [u32; 4],
    /// Visible mask pixel count.
    pub area: u64,
}

/// Parent directories of the object and distractor files used for one image.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderPaths {
    /// Directory of the first object file, empty when none was used.
    pub objects: String,
    /// Directory of the first distractor file, empty when none was used.
    pub distractor_objects: String,
}

/// Provenance of one rendered image.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Source directories.
    pub path: RenderPaths,
    /// File names of the objects of interest, in placement order.
    pub objects: Vec<String>,
    /// File names of the distractors, in placement order.
    pub distractors: Vec<String>,
    /// Background path.
    pub background: String,
}

/// Self-contained per-image annotation file written by one job.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationFile {
    /// Category table.
    pub categories: Vec<CocoCategory>,
    /// Annotations of the single image.
    pub annotations: Vec<CocoAnnotation>,
    /// Exactly one image record when written by the generator.
    pub images: Vec<CocoImage>,
    /// Provenance; absent in files produced elsewhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_config: Option<RenderConfig>,
}

/// Merged dataset of one split.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedDataset {
    /// Deduplicated category table, sorted by id.
    pub categories: Vec<CocoCategory>,
    /// All annotations with sequential ids.
    pub annotations: Vec<CocoAnnotation>,
    /// All images with sequential ids.
    pub images: Vec<CocoImage>,
}

/// Deserialize a JSON document from `path`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> CutPasteResult<T> {
    let f = File::open(path).with_context(|| format!("failed to open '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(f))
        .map_err(|e| CutPasteError::serde(format!("parse '{}': {e}", path.display())))
}

/// Serialize `value` to `path` through a sibling temporary file and a rename, so readers
/// never observe a partially written document.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> CutPasteResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory '{}'", parent.display()))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);

    let f = File::create(&tmp).with_context(|| format!("failed to create '{}'", tmp.display()))?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer(&mut w, value)?;
    w.flush()
        .with_context(|| format!("failed to write '{}'", tmp.display()))?;
    drop(w);
    std::fs::rename(&tmp, path)
        .with_context(|| format!("failed to move '{}' into place", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/annotate/coco.rs"]
mod tests;
