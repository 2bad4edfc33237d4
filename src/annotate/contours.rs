use image::GrayImage;
use imageproc::contours::find_contours;
use imageproc::point::Point;

/// Border polygons of the non-zero regions of `mask`, outer borders and holes alike.
///
/// Runs of collinear border pixels are reduced to their end points. Polygons with fewer
/// than three distinct vertices are dropped.
pub fn mask_polygons(mask: &GrayImage) -> Vec<Vec<(u32, u32)>> {
    find_contours::<u32>(mask)
        .into_iter()
        .filter_map(|c| {
            let poly = simplify_chain(&c.points);
            (distinct_vertices(&poly) >= 3).then_some(poly)
        })
        .collect()
}

/// Flatten a polygon to COCO `[x0, y0, x1, y1, ...]` form.
pub fn flatten_polygon(poly: &[(u32, u32)]) -> Vec<u32> {
    poly.iter().flat_map(|&(x, y)| [x, y]).collect()
}

/// Drop every point whose incoming and outgoing steps point the same way.
fn simplify_chain(points: &[Point<u32>]) -> Vec<(u32, u32)> {
    let mut pts: Vec<(i64, i64)> = Vec::with_capacity(points.len());
    for p in points {
        let p = (i64::from(p.x), i64::from(p.y));
        if pts.last() != Some(&p) {
            pts.push(p);
        }
    }
    while pts.len() > 1 && pts.first() == pts.last() {
        pts.pop();
    }
    let n = pts.len();
    if n < 3 {
        return pts.into_iter().map(|(x, y)| (x as u32, y as u32)).collect();
    }

    let dir = |a: (i64, i64), b: (i64, i64)| ((b.0 - a.0).signum(), (b.1 - a.1).signum());
    (0..n)
        .filter(|&i| {
            let prev = pts[(i + n - 1) % n];
            let next = pts[(i + 1) % n];
            dir(prev, pts[i]) != dir(pts[i], next)
        })
        .map(|i| (pts[i].0 as u32, pts[i].1 as u32))
        .collect()
}

fn distinct_vertices(poly: &[(u32, u32)]) -> usize {
    let mut v = poly.to_vec();
    v.sort_unstable();
    v.dedup();
    v.len()
}

#[cfg(test)]
#[path = "../../tests/unit/annotate/contours.rs"]
mod tests;
