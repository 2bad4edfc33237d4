use super::*;

use image::{Luma, Rgb};

fn ramp(w: u32, h: u32) -> RgbImage {
    RgbImage::from_fn(w, h, |x, y| {
        let v = (10 * x + 5 * y) as u8;
        Rgb([v, v / 2, 255 - v])
    })
}

#[test]
fn domain_excludes_frame_and_zero_pixels() {
    let mut mask = GrayImage::from_pixel(5, 4, Luma([255]));
    mask.put_pixel(2, 2, Luma([0]));
    let d = Domain::from_mask(&mask);
    assert!(!d.contains(0, 1));
    assert!(!d.contains(4, 1));
    assert!(!d.contains(1, 3));
    assert!(!d.contains(2, 2));
    assert!(d.contains(1, 1));
    assert_eq!(d.len(), 5);
}

#[test]
fn empty_mask_leaves_target_untouched() {
    let mut target = RgbImage::from_pixel(10, 10, Rgb([30, 60, 90]));
    let before = target.clone();
    let fg = RgbImage::from_pixel(6, 6, Rgb([255, 0, 0]));
    let mask = GrayImage::new(6, 6);
    poisson_blend(&mut target, &fg, &mask, Offset::new(2, 2), &PoissonConfig::default()).unwrap();
    assert_eq!(target, before);
}

#[test]
fn flat_source_adopts_target_colour() {
    let mut target = RgbImage::from_pixel(12, 12, Rgb([50, 60, 70]));
    let fg = RgbImage::from_pixel(8, 8, Rgb([200, 10, 240]));
    let mask = GrayImage::from_pixel(8, 8, Luma([255]));
    poisson_blend(&mut target, &fg, &mask, Offset::new(2, 2), &PoissonConfig::default()).unwrap();
    for px in target.pixels() {
        assert_eq!(px.0, [50, 60, 70]);
    }
}

#[test]
fn harmonic_ramp_is_reproduced_exactly() {
    let src = ramp(9, 7);
    let mask = GrayImage::from_pixel(9, 7, Luma([255]));
    let domain = Domain::from_mask(&mask);
    let boundary = |x: u32, y: u32| pixel_f(&src, x, y);
    let solved = solve_poisson(&domain, &boundary, &SourceGradient::new(&src)).unwrap();
    assert_eq!(solved.len(), domain.len());
    for ((x, y), v) in solved {
        let expected = pixel_f(&src, x, y);
        for c in 0..3 {
            assert!((v[c] - expected[c]).abs() < 1e-6, "({x},{y}) c{c}: {} vs {}", v[c], expected[c]);
        }
    }
}

#[test]
fn source_gradients_survive_a_shifted_boundary() {
    let src = ramp(8, 8);
    let mut target = RgbImage::from_fn(20, 20, |x, y| {
        let v = (10 * x + 5 * y) as u8 / 2;
        Rgb([v, v, v])
    });
    let offset = Offset::new(4, 5);
    for y in 0..8 {
        for x in 0..8 {
            let s = src.get_pixel(x, y);
            target.put_pixel(x + 4, y + 5, Rgb([s[0] + 20, s[1] + 20, s[2].saturating_sub(20)]));
        }
    }
    let before = target.clone();
    let mask = GrayImage::from_pixel(8, 8, Luma([255]));
    poisson_blend(&mut target, &src, &mask, offset, &PoissonConfig::default()).unwrap();
    assert_eq!(target, before);
}

#[test]
fn frame_pixels_keep_target_values() {
    let mut target = RgbImage::from_pixel(10, 10, Rgb([10, 10, 10]));
    let fg = ramp(6, 6);
    let mask = GrayImage::from_pixel(6, 6, Luma([255]));
    poisson_blend(&mut target, &fg, &mask, Offset::new(2, 2), &PoissonConfig::default()).unwrap();
    for i in 0..6 {
        assert_eq!(target.get_pixel(2 + i, 2).0, [10, 10, 10]);
        assert_eq!(target.get_pixel(2, 2 + i).0, [10, 10, 10]);
        assert_eq!(target.get_pixel(7, 2 + i).0, [10, 10, 10]);
    }
}

#[test]
fn mixed_keeps_stronger_target_texture_under_flat_source() {
    let mut target = RgbImage::from_fn(12, 12, |x, y| {
        let v = (10 * x + 5 * y) as u8;
        Rgb([v, v, v])
    });
    let before = target.clone();
    let fg = RgbImage::from_pixel(6, 6, Rgb([128, 128, 128]));
    let mask = GrayImage::from_pixel(6, 6, Luma([255]));
    let cfg = PoissonConfig {
        method: PoissonMethod::Mixed,
        mix_weight: 1.0,
    };
    poisson_blend(&mut target, &fg, &mask, Offset::new(3, 3), &cfg).unwrap();
    assert_eq!(target, before);
}

#[test]
fn partially_offscreen_crop_is_clipped_before_solving() {
    let mut target = RgbImage::from_pixel(8, 8, Rgb([40, 40, 40]));
    let fg = RgbImage::from_pixel(6, 6, Rgb([220, 220, 220]));
    let mask = GrayImage::from_pixel(6, 6, Luma([255]));
    poisson_blend(&mut target, &fg, &mask, Offset::new(-3, 5), &PoissonConfig::default()).unwrap();
    for px in target.pixels() {
        assert_eq!(px.0, [40, 40, 40]);
    }
}

#[test]
fn mismatched_sizes_are_rejected() {
    let mut target = RgbImage::new(8, 8);
    let fg = RgbImage::new(4, 4);
    let mask = GrayImage::new(3, 4);
    let err = poisson_blend(&mut target, &fg, &mask, Offset::new(0, 0), &PoissonConfig::default())
        .unwrap_err();
    assert!(matches!(err, CutPasteError::Validation(_)));
}
