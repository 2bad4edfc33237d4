use super::*;

use image::Luma;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn unit_gamma_is_near_identity() {
    let lut = gamma_lut(1.0);
    for (i, v) in lut.iter().enumerate() {
        assert!((*v as i32 - i as i32).abs() <= 1);
    }
}

#[test]
fn gamma_above_one_brightens_and_keeps_endpoints() {
    let lut = gamma_lut(1.25);
    assert_eq!(lut[0], 0);
    assert_eq!(lut[255], 255);
    for (i, v) in lut.iter().enumerate() {
        assert!(*v as usize >= i);
    }
    assert!(lut[64] > 64);
}

#[test]
fn random_gamma_correction_never_darkens() {
    let fg = RgbImage::from_fn(16, 16, |x, y| Rgb([(x * 16) as u8, (y * 16) as u8, 128]));
    let mut rng = StdRng::seed_from_u64(11);
    let out = apply_gamma_correction(&fg, &mut rng);
    for (a, b) in fg.pixels().zip(out.pixels()) {
        for c in 0..3 {
            assert!(b[c] >= a[c]);
        }
    }
}

#[test]
fn random_illumination_params_are_in_range() {
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..100 {
        let p = IlluminationParams::random(&mut rng);
        assert!((1.5..2.5).contains(&p.alpha));
        assert!((0.0..0.3).contains(&p.beta));
    }
}

#[test]
fn zero_beta_illumination_is_identity() {
    let fg = RgbImage::from_fn(10, 10, |x, y| Rgb([(x * 20) as u8, (y * 20) as u8, ((x + y) * 10) as u8]));
    let mask = GrayImage::from_pixel(10, 10, Luma([255]));
    let out = illumination_change(&fg, &mask, IlluminationParams { alpha: 2.0, beta: 0.0 }).unwrap();
    assert_eq!(out, fg);
}

#[test]
fn flat_foreground_is_unaffected() {
    let fg = RgbImage::from_pixel(8, 8, Rgb([90, 120, 150]));
    let mask = GrayImage::from_pixel(8, 8, Luma([255]));
    let out = illumination_change(&fg, &mask, IlluminationParams { alpha: 2.2, beta: 0.25 }).unwrap();
    assert_eq!(out, fg);
}

#[test]
fn pixels_outside_the_mask_keep_their_values() {
    let fg = RgbImage::from_fn(12, 12, |x, y| Rgb([(x * 20) as u8, (y * 20) as u8, 40]));
    let mut mask = GrayImage::new(12, 12);
    for y in 3..9 {
        for x in 3..9 {
            mask.put_pixel(x, y, Luma([255]));
        }
    }
    let out = illumination_change(&fg, &mask, IlluminationParams { alpha: 1.6, beta: 0.29 }).unwrap();
    for (x, y, px) in out.enumerate_pixels() {
        if mask.get_pixel(x, y)[0] == 0 {
            assert_eq!(px, fg.get_pixel(x, y));
        }
    }
}

#[test]
fn mask_adjustments_preserve_size_and_solid_interior() {
    let mut mask = GrayImage::new(9, 9);
    for y in 2..7 {
        for x in 2..7 {
            mask.put_pixel(x, y, Luma([255]));
        }
    }
    for adj in [MaskAdjustment::None, MaskAdjustment::Gaussian, MaskAdjustment::Box] {
        let out = adj.apply(&mask).unwrap();
        assert_eq!(out.dimensions(), mask.dimensions());
        assert_eq!(out.get_pixel(4, 4)[0], 255);
    }
    let mut rng = StdRng::seed_from_u64(1);
    let out = random_mask_adjustment(&mask, &mut rng).unwrap();
    assert_eq!(out.dimensions(), (9, 9));
}
