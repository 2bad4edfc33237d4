use super::*;

#[test]
fn flatten_alpha_0_is_white_and_alpha_255_is_identity() {
    let mut rgba = RgbaImage::new(2, 1);
    rgba.put_pixel(0, 0, image::Rgba([10, 20, 30, 0]));
    rgba.put_pixel(1, 0, image::Rgba([10, 20, 30, 255]));
    let out = flatten_over_white(&rgba);
    assert_eq!(out.get_pixel(0, 0).0, [255, 255, 255]);
    assert_eq!(out.get_pixel(1, 0).0, [10, 20, 30]);
}

#[test]
fn min_filter_erodes_single_pixel_border() {
    let mut mask = GrayImage::new(7, 7);
    for y in 1..6 {
        for x in 1..6 {
            mask.put_pixel(x, y, image::Luma([255]));
        }
    }
    let out = min_filter(&mask, 3);
    assert_eq!(out.get_pixel(1, 1)[0], 0);
    assert_eq!(out.get_pixel(2, 2)[0], 255);
    assert_eq!(mask_extent(&out, false).unwrap().width(), 3);
}

#[test]
fn even_min_filter_keeps_the_trailing_edge() {
    let mut mask = GrayImage::new(7, 7);
    for y in 1..6 {
        for x in 1..6 {
            mask.put_pixel(x, y, image::Luma([255]));
        }
    }
    let out = min_filter(&mask, 2);
    assert_eq!(out.get_pixel(1, 1)[0], 0);
    assert_eq!(out.get_pixel(5, 5)[0], 255);
    let e = mask_extent(&out, false).unwrap();
    assert_eq!((e.xmin, e.xmax, e.ymin, e.ymax), (2, 5, 2, 5));
}

#[test]
fn min_filter_at_the_border_ignores_outside_pixels() {
    let mask = GrayImage::from_pixel(4, 3, image::Luma([200]));
    assert_eq!(min_filter(&mask, 3), mask);
}

#[test]
fn extent_of_empty_mask_is_none() {
    assert!(mask_extent(&GrayImage::new(4, 4), false).is_none());
}

#[test]
fn inverted_extent_ignores_white() {
    let mut mask = GrayImage::from_pixel(5, 5, image::Luma([255]));
    mask.put_pixel(3, 1, image::Luma([0]));
    let e = mask_extent(&mask, true).unwrap();
    assert_eq!((e.xmin, e.xmax, e.ymin, e.ymax), (3, 3, 1, 1));
}
