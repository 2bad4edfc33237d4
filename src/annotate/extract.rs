use std::path::Path;

use image::GrayImage;

use crate::annotate::coco::{CocoAnnotation, CocoImage};
use crate::annotate::contours::{flatten_polygon, mask_polygons};
use crate::foundation::core::CanvasSize;
use crate::mask::compositor::CompositeMask;

/// Turns final composite masks into COCO instance annotations.
#[derive(Clone, Copy, Debug)]
pub struct AnnotationExtractor {
    threshold: u8,
}

impl AnnotationExtractor {
    /// Mask values below `threshold` are treated as background.
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    /// Annotation of one mask, `None` when no polygon survives (fully occluded object).
    pub fn extract(&self, mask: &CompositeMask, image_id: u64, id: u64) -> Option<CocoAnnotation> {
        let clean = self.clean(&mask.pixels);
        let segmentation: Vec<Vec<u32>> = mask_polygons(&clean)
            .iter()
            .map(|p| flatten_polygon(p))
            .collect();
        if segmentation.is_empty() {
            return None;
        }

        let mut area = 0u64;
        let (mut xmin, mut ymin, mut xmax, mut ymax) = (u32::MAX, u32::MAX, 0, 0);
        for (x, y, p) in clean.enumerate_pixels() {
            if p[0] != 0 {
                area += 1;
                xmin = xmin.min(x);
                ymin = ymin.min(y);
                xmax = xmax.max(x);
                ymax = ymax.max(y);
            }
        }

        Some(CocoAnnotation {
            segmentation,
            iscrowd: 0,
            image_id,
            category_id: mask.category_id,
            id,
            bbox: [xmin, ymin, xmax - xmin + 1, ymax - ymin + 1],
            area,
        })
    }

    /// Annotations of every mask of one image, ids being the mask index.
    ///
    /// Fully occluded objects are logged and skipped; categories in `ignore` are removed
    /// after extraction.
    pub fn extract_all(&self, masks: &[CompositeMask], image_id: u64, ignore: &[u32]) -> Vec<CocoAnnotation> {
        let mut out = Vec::with_capacity(masks.len());
        for (i, mask) in masks.iter().enumerate() {
            match self.extract(mask, image_id, i as u64) {
                Some(a) => out.push(a),
                None => tracing::info!(mask_id = i, "could not find mask; object fully occluded"),
            }
        }
        filter_ignored(&mut out, ignore);
        out
    }

    fn clean(&self, pixels: &GrayImage) -> GrayImage {
        let mut clean = pixels.clone();
        for p in clean.pixels_mut() {
            if p[0] < self.threshold {
                p[0] = 0;
            }
        }
        clean
    }
}

/// Remove annotations whose category is listed in `ignore`.
pub fn filter_ignored(annotations: &mut Vec<CocoAnnotation>, ignore: &[u32]) {
    annotations.retain(|a| !ignore.contains(&a.category_id));
}

/// Image record for a written file; `file_name` keeps the last three path components.
pub fn image_record(path: &Path, id: u64, canvas: CanvasSize) -> CocoImage {
    let parts: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    let start = parts.len().saturating_sub(3);
    CocoImage {
        id,
        file_name: parts[start..].join("/"),
        width: canvas.width,
        height: canvas.height,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/annotate/extract.rs"]
mod tests;
