use serde::{Deserialize, Serialize};

/// Pixel dimensions of one output canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanvasSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl CanvasSize {
    /// Create a canvas size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels covered by the canvas.
    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Top-left placement of an object crop in canvas coordinates.
///
/// Either component may be negative or exceed the canvas: objects are allowed to be
/// partially truncated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Offset {
    /// Horizontal offset in pixels.
    pub x: i64,
    /// Vertical offset in pixels.
    pub y: i64,
}

impl Offset {
    /// Create an offset.
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Inclusive pixel extent of the non-zero mask pixels inside an object crop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    /// First column containing a mask pixel.
    pub xmin: i64,
    /// Last column containing a mask pixel.
    pub xmax: i64,
    /// First row containing a mask pixel.
    pub ymin: i64,
    /// Last row containing a mask pixel.
    pub ymax: i64,
}

impl Extent {
    /// Width of the extent counted in pixels.
    pub fn width(&self) -> i64 {
        self.xmax - self.xmin + 1
    }

    /// Height of the extent counted in pixels.
    pub fn height(&self) -> i64 {
        self.ymax - self.ymin + 1
    }

    /// Canvas rectangle covered by this extent when its crop is placed at `offset`.
    pub fn placed_at(&self, offset: Offset) -> Rect {
        Rect {
            xmin: offset.x + self.xmin,
            ymin: offset.y + self.ymin,
            xmax: offset.x + self.xmax,
            ymax: offset.y + self.ymax,
        }
    }
}

/// Axis-aligned rectangle with corner coordinates, used for overlap testing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub xmin: i64,
    /// Top edge.
    pub ymin: i64,
    /// Right edge.
    pub xmax: i64,
    /// Bottom edge.
    pub ymax: i64,
}

impl Rect {
    /// Corner-difference area `(xmax - xmin) * (ymax - ymin)`.
    pub fn area(&self) -> i64 {
        (self.xmax - self.xmin) * (self.ymax - self.ymin)
    }

    /// Signed side lengths of the intersection with `other`.
    ///
    /// Either side is negative when the rectangles are disjoint along that axis.
    pub fn intersection_sides(&self, other: &Rect) -> (i64, i64) {
        let dx = self.xmax.min(other.xmax) - self.xmin.max(other.xmin);
        let dy = self.ymax.min(other.ymax) - self.ymin.max(other.ymin);
        (dx, dy)
    }

    /// Intersection area with `other`, zero when disjoint.
    pub fn intersection_area(&self, other: &Rect) -> i64 {
        let (dx, dy) = self.intersection_sides(other);
        if dx < 0 || dy < 0 { 0 } else { dx * dy }
    }
}

/// Overlap between a crop placed at an offset and the canvas, in both coordinate frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClipRegion {
    /// First canvas column covered.
    pub dst_x: u32,
    /// First canvas row covered.
    pub dst_y: u32,
    /// Matching crop column.
    pub src_x: u32,
    /// Matching crop row.
    pub src_y: u32,
    /// Width of the visible part.
    pub width: u32,
    /// Height of the visible part.
    pub height: u32,
}

impl ClipRegion {
    /// Visible part of a `width x height` crop at `offset`, `None` when fully off-canvas.
    pub fn new(canvas: CanvasSize, offset: Offset, width: u32, height: u32) -> Option<Self> {
        let x0 = offset.x.max(0);
        let y0 = offset.y.max(0);
        let x1 = (offset.x + i64::from(width)).min(i64::from(canvas.width));
        let y1 = (offset.y + i64::from(height)).min(i64::from(canvas.height));
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Self {
            dst_x: x0 as u32,
            dst_y: y0 as u32,
            src_x: (x0 - offset.x) as u32,
            src_y: (y0 - offset.y) as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
