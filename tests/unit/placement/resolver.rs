use super::*;

use rand::SeedableRng;
use rand::rngs::StdRng;

fn full_extent(w: u32, h: u32) -> Extent {
    Extent {
        xmin: 0,
        xmax: i64::from(w) - 1,
        ymin: 0,
        ymax: i64::from(h) - 1,
    }
}

fn request(canvas: (u32, u32), obj: (u32, u32)) -> PlacementRequest {
    PlacementRequest {
        canvas: CanvasSize::new(canvas.0, canvas.1),
        width: obj.0,
        height: obj.1,
        extent: full_extent(obj.0, obj.1),
    }
}

#[test]
fn overlap_predicate_uses_candidate_area_only() {
    let small = Rect {
        xmin: 0,
        ymin: 0,
        xmax: 10,
        ymax: 10,
    };
    let big = Rect {
        xmin: 0,
        ymin: 0,
        xmax: 100,
        ymax: 100,
    };
    // Intersection is all of `small`: 100% of small, 1% of big.
    assert!(overlaps(&small, &big, 0.5));
    assert!(!overlaps(&big, &small, 0.5));
}

#[test]
fn touching_rectangles_do_not_overlap_at_positive_threshold() {
    let a = Rect {
        xmin: 0,
        ymin: 0,
        xmax: 10,
        ymax: 10,
    };
    let b = Rect {
        xmin: 10,
        ymin: 0,
        xmax: 20,
        ymax: 10,
    };
    assert!(!overlaps(&a, &b, 0.0));
}

#[test]
fn disabled_avoidance_accepts_first_sample_and_skips_registry() {
    let cfg = PlacementConfig::default();
    let resolver = PlacementResolver::new(&cfg);
    let mut registry = OcclusionRegistry::new();
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..10 {
        let out = resolver.resolve(&mut registry, &request((640, 480), (100, 100)), &mut rng);
        assert!(matches!(out, PlacementOutcome::Accepted { attempts: 1, .. }));
    }
    assert!(registry.rects().is_empty());
}

#[test]
fn samples_stay_within_truncation_bounds() {
    let cfg = PlacementConfig::default();
    let resolver = PlacementResolver::new(&cfg);
    let mut registry = OcclusionRegistry::new();
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..500 {
        let o = resolver
            .resolve(&mut registry, &request((640, 480), (100, 80)), &mut rng)
            .offset();
        assert!((-25..=565).contains(&o.x), "x = {}", o.x);
        assert!((-20..=420).contains(&o.y), "y = {}", o.y);
    }
}

#[test]
fn accepted_placements_respect_overlap_threshold() {
    let cfg = PlacementConfig {
        avoid_occlusion: true,
        max_attempts: 50,
        ..PlacementConfig::default()
    };
    let resolver = PlacementResolver::new(&cfg);
    let mut rng = StdRng::seed_from_u64(99);

    for _ in 0..20 {
        let mut registry = OcclusionRegistry::new();
        for _ in 0..6 {
            let req = request((400, 300), (80, 60));
            let before = registry.rects().to_vec();
            let out = resolver.resolve(&mut registry, &req, &mut rng);
            if let PlacementOutcome::Accepted { offset, .. } = out {
                let candidate = req.extent.placed_at(offset);
                for prev in &before {
                    let inter = candidate.intersection_area(prev) as f64;
                    assert!(inter <= cfg.max_allowed_overlap * candidate.area() as f64);
                }
                assert_eq!(registry.rects().last(), Some(&candidate));
            } else {
                assert_eq!(registry.rects(), before.as_slice());
            }
        }
    }
}

#[test]
fn crowded_canvas_exhausts_with_attempt_cap() {
    let cfg = PlacementConfig {
        avoid_occlusion: true,
        max_attempts: 5,
        max_truncation_fraction: 0.0,
        max_allowed_overlap: 0.0,
        max_restarts: None,
    };
    let resolver = PlacementResolver::new(&cfg);
    let mut registry = OcclusionRegistry::new();
    let mut rng = StdRng::seed_from_u64(5);

    // The object fills the canvas, so a second one always intersects the first.
    let req = request((50, 50), (50, 50));
    assert!(!resolver.resolve(&mut registry, &req, &mut rng).is_exhausted());
    let second = resolver.resolve(&mut registry, &req, &mut rng);
    assert_eq!(
        second,
        PlacementOutcome::Exhausted {
            offset: Offset::new(0, 0),
            attempts: 5
        }
    );
    assert_eq!(registry.rects().len(), 1);
}

#[test]
fn same_seed_gives_same_offsets() {
    let cfg = PlacementConfig::default();
    let resolver = PlacementResolver::new(&cfg);
    let run = |seed| {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut registry = OcclusionRegistry::new();
        (0..8)
            .map(|_| {
                resolver
                    .resolve(&mut registry, &request((320, 240), (30, 40)), &mut rng)
                    .offset()
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(run(17), run(17));
}
