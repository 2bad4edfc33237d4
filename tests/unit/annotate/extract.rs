use super::*;

use image::Luma;

use crate::foundation::core::Offset;
use crate::mask::compositor::{project_mask, resolve_occlusion};

fn square_mask(canvas: CanvasSize, x: i64, y: i64, side: u32, category_id: u32) -> CompositeMask {
    let crop = GrayImage::from_pixel(side, side, Luma([255]));
    CompositeMask {
        pixels: project_mask(&crop, canvas, Offset::new(x, y), 200),
        category_id,
    }
}

#[test]
fn unoccluded_rectangle_yields_its_bounds_and_one_polygon() {
    let canvas = CanvasSize::new(640, 480);
    let mask = square_mask(canvas, 50, 50, 100, 0);
    let a = AnnotationExtractor::new(250).extract(&mask, 3, 7).unwrap();
    assert_eq!(a.bbox, [50, 50, 100, 100]);
    assert_eq!(a.segmentation.len(), 1);
    assert_eq!(a.area, 100 * 100);
    assert_eq!((a.image_id, a.id, a.category_id, a.iscrowd), (3, 7, 0, 0));
}

#[test]
fn antialiasing_noise_below_threshold_is_ignored() {
    let canvas = CanvasSize::new(40, 40);
    let mut mask = square_mask(canvas, 10, 10, 10, 0);
    mask.pixels.put_pixel(1, 1, Luma([1]));
    mask.pixels.put_pixel(30, 30, Luma([249]));
    let a = AnnotationExtractor::new(250).extract(&mask, 0, 0).unwrap();
    assert_eq!(a.bbox, [10, 10, 10, 10]);
    assert_eq!(a.segmentation.len(), 1);
}

#[test]
fn fully_occluded_object_is_skipped() {
    let canvas = CanvasSize::new(40, 40);
    let mut masks = vec![square_mask(canvas, 10, 10, 5, 0), square_mask(canvas, 5, 5, 20, 0)];
    resolve_occlusion(&mut masks).unwrap();
    let annotations = AnnotationExtractor::new(250).extract_all(&masks, 0, &[]);
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0].id, 1);
}

#[test]
fn ignored_category_still_occludes_but_is_not_emitted() {
    let canvas = CanvasSize::new(60, 60);
    let mut masks = vec![square_mask(canvas, 10, 10, 20, 0), square_mask(canvas, 20, 10, 20, 2)];
    resolve_occlusion(&mut masks).unwrap();
    let annotations = AnnotationExtractor::new(250).extract_all(&masks, 0, &[2]);

    assert_eq!(annotations.len(), 1);
    let a = &annotations[0];
    assert_eq!(a.category_id, 0);
    assert_eq!(a.bbox, [10, 10, 10, 20]);
    assert_eq!(a.area, 10 * 20);
}

#[test]
fn filter_keeps_order_of_survivors() {
    let canvas = CanvasSize::new(50, 50);
    let masks = vec![
        square_mask(canvas, 0, 0, 5, 0),
        square_mask(canvas, 10, 10, 5, 2),
        square_mask(canvas, 20, 20, 5, 1),
    ];
    let ids: Vec<u64> = AnnotationExtractor::new(250)
        .extract_all(&masks, 0, &[2])
        .iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(ids, vec![0, 2]);
}

#[test]
fn image_record_keeps_last_three_components() {
    let rec = image_record(
        Path::new("/data/out/train/00004/image_none00.jpg"),
        2,
        CanvasSize::new(640, 480),
    );
    assert_eq!(rec.file_name, "train/00004/image_none00.jpg");
    assert_eq!((rec.id, rec.width, rec.height), (2, 640, 480));

    let short = image_record(Path::new("image.jpg"), 0, CanvasSize::new(1, 1));
    assert_eq!(short.file_name, "image.jpg");
}
