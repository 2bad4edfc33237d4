use rand::Rng;

use crate::config::PlacementConfig;
use crate::foundation::core::{CanvasSize, Extent, Offset, Rect};

/// Rectangles accepted so far in the current placement attempt.
///
/// Reset at the start of every attempt; only used for overlap testing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OcclusionRegistry {
    rects: Vec<Rect>,
}

impl OcclusionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every accepted rectangle.
    pub fn clear(&mut self) {
        self.rects.clear();
    }

    /// Accepted rectangles in placement order.
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// `true` when `candidate` overlaps any accepted rectangle beyond `threshold`.
    pub fn occludes(&self, candidate: &Rect, threshold: f64) -> bool {
        self.rects
            .iter()
            .any(|prev| overlaps(candidate, prev, threshold))
    }

    fn push(&mut self, rect: Rect) {
        self.rects.push(rect);
    }
}

/// Intersection-over-candidate overlap test.
///
/// The intersection area is compared with `threshold` times the area of `candidate` only,
/// never the union, so the predicate is intentionally asymmetric.
pub fn overlaps(candidate: &Rect, prev: &Rect, threshold: f64) -> bool {
    let (dx, dy) = candidate.intersection_sides(prev);
    dx >= 0 && dy >= 0 && (dx * dy) as f64 > threshold * candidate.area() as f64
}

/// Geometry of one object to place.
#[derive(Clone, Copy, Debug)]
pub struct PlacementRequest {
    /// Canvas the object is placed on.
    pub canvas: CanvasSize,
    /// Crop width.
    pub width: u32,
    /// Crop height.
    pub height: u32,
    /// Mask extent inside the crop.
    pub extent: Extent,
}

/// Terminal state of one object's placement sampling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlacementOutcome {
    /// A valid offset was found after `attempts` samples.
    Accepted {
        /// Accepted crop offset.
        offset: Offset,
        /// Samples drawn, including the accepted one.
        attempts: u32,
    },
    /// Every sample overlapped; `offset` is the last one drawn and `attempts` the cap.
    Exhausted {
        /// Last sampled offset.
        offset: Offset,
        /// Equal to the configured attempt cap.
        attempts: u32,
    },
}

impl PlacementOutcome {
    /// Offset carried by either outcome.
    pub fn offset(&self) -> Offset {
        match *self {
            Self::Accepted { offset, .. } | Self::Exhausted { offset, .. } => offset,
        }
    }

    /// `true` for [`PlacementOutcome::Exhausted`].
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

/// Samples on-canvas offsets for objects, optionally avoiding occlusion.
#[derive(Clone, Copy, Debug)]
pub struct PlacementResolver<'a> {
    cfg: &'a PlacementConfig,
}

impl<'a> PlacementResolver<'a> {
    /// Create a resolver for the given parameters.
    pub fn new(cfg: &'a PlacementConfig) -> Self {
        Self { cfg }
    }

    /// Find an offset for `req`.
    ///
    /// With occlusion avoidance disabled the first sample is accepted and the registry is
    /// left untouched. Otherwise the accepted rectangle is appended to `registry`.
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        registry: &mut OcclusionRegistry,
        req: &PlacementRequest,
        rng: &mut R,
    ) -> PlacementOutcome {
        let max_attempts = self.cfg.max_attempts.max(1);
        let mut attempts = 0;
        loop {
            attempts += 1;
            let offset = self.sample(req, rng);
            if !self.cfg.avoid_occlusion {
                return PlacementOutcome::Accepted { offset, attempts };
            }

            let candidate = req.extent.placed_at(offset);
            if !registry.occludes(&candidate, self.cfg.max_allowed_overlap) {
                registry.push(candidate);
                return PlacementOutcome::Accepted { offset, attempts };
            }
            if attempts >= max_attempts {
                return PlacementOutcome::Exhausted {
                    offset,
                    attempts: max_attempts,
                };
            }
        }
    }

    fn sample<R: Rng + ?Sized>(&self, req: &PlacementRequest, rng: &mut R) -> Offset {
        let f = self.cfg.max_truncation_fraction;
        let x = sample_axis(req.canvas.width, req.width, f, rng);
        let y = sample_axis(req.canvas.height, req.height, f, rng);
        Offset::new(x, y)
    }
}

/// Uniform integer in `[-f*o, len - o + f*o]`, bounds truncated toward zero.
fn sample_axis<R: Rng + ?Sized>(len: u32, object: u32, f: f64, rng: &mut R) -> i64 {
    let o = f64::from(object);
    let lo = (-f * o).trunc() as i64;
    let hi = (f64::from(len) - o + f * o).trunc() as i64;
    if hi <= lo {
        return lo;
    }
    rng.gen_range(lo..=hi)
}

#[cfg(test)]
#[path = "../../tests/unit/placement/resolver.rs"]
mod tests;
