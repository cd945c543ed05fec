//! Polyline geometry: ordered point chains with arc-length operations.

use crate::geom::{BBox, Point};

/// An ordered chain of points.
///
/// Transit edges carry their real-world course as a `PolyLine`; the
/// octilinearizer replaces it with the routed grid course.  Arc-length
/// slicing (`segment`) is used when a combination edge's polyline is split
/// back among its child edges.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct PolyLine {
    pts: Vec<Point>,
}

impl PolyLine {
    pub fn new() -> Self {
        Self { pts: Vec::new() }
    }

    pub fn from_points(pts: Vec<Point>) -> Self {
        Self { pts }
    }

    /// Straight two-point line.
    pub fn straight(from: Point, to: Point) -> Self {
        Self { pts: vec![from, to] }
    }

    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.pts
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pts.is_empty()
    }

    #[inline]
    pub fn first(&self) -> Option<Point> {
        self.pts.first().copied()
    }

    #[inline]
    pub fn last(&self) -> Option<Point> {
        self.pts.last().copied()
    }

    /// Append a point, skipping exact duplicates of the current last point.
    pub fn push(&mut self, p: Point) {
        if self.pts.last() != Some(&p) {
            self.pts.push(p);
        }
    }

    pub fn extend_from(&mut self, other: &PolyLine) {
        for &p in &other.pts {
            self.push(p);
        }
    }

    /// Total arc length.
    pub fn len(&self) -> f64 {
        self.pts.windows(2).map(|w| w[0].dist(w[1])).sum()
    }

    pub fn reverse(&mut self) {
        self.pts.reverse();
    }

    pub fn reversed(&self) -> PolyLine {
        let mut pl = self.clone();
        pl.reverse();
        pl
    }

    pub fn bbox(&self) -> BBox {
        let mut b = BBox::empty();
        for &p in &self.pts {
            b.extend(p);
        }
        b
    }

    /// Point at arc-length fraction `t` in `[0, 1]`.
    ///
    /// Returns `None` on an empty polyline; a single-point polyline returns
    /// that point for every `t`.
    pub fn point_at(&self, t: f64) -> Option<Point> {
        let first = self.first()?;
        let total = self.len();
        if total == 0.0 {
            return Some(first);
        }
        let mut remaining = t.clamp(0.0, 1.0) * total;
        for w in self.pts.windows(2) {
            let seg = w[0].dist(w[1]);
            if remaining <= seg {
                if seg == 0.0 {
                    return Some(w[0]);
                }
                let f = remaining / seg;
                return Some(Point::new(
                    w[0].x + (w[1].x - w[0].x) * f,
                    w[0].y + (w[1].y - w[0].y) * f,
                ));
            }
            remaining -= seg;
        }
        self.last()
    }

    /// Sub-polyline between arc-length fractions `a` and `b` (`a <= b`),
    /// including the interpolated cut points and every original vertex in
    /// between.
    pub fn segment(&self, a: f64, b: f64) -> PolyLine {
        let total = self.len();
        if self.pts.len() < 2 || total == 0.0 {
            return self.clone();
        }
        let (a, b) = (a.clamp(0.0, 1.0), b.clamp(0.0, 1.0));
        let (start, end) = (a.min(b) * total, a.max(b) * total);

        let mut out = PolyLine::new();
        let mut walked = 0.0;
        for w in self.pts.windows(2) {
            let seg = w[0].dist(w[1]);
            let seg_start = walked;
            let seg_end = walked + seg;

            if seg_end >= start && seg_start <= end && seg > 0.0 {
                let lo = ((start - seg_start) / seg).clamp(0.0, 1.0);
                let hi = ((end - seg_start) / seg).clamp(0.0, 1.0);
                out.push(lerp(w[0], w[1], lo));
                out.push(lerp(w[0], w[1], hi));
            }
            walked = seg_end;
        }
        if out.pts.len() < 2 {
            // Degenerate cut (zero-length span): duplicate the cut point so
            // callers always see a well-formed two-point line.
            let p = self.point_at(a.min(b)).unwrap_or_default();
            out = PolyLine::from_points(vec![p, p]);
        }
        out
    }

    /// Rotate every vertex around `center` by `deg` degrees counterclockwise.
    pub fn rotate_around(&mut self, center: Point, deg: f64) {
        for p in &mut self.pts {
            *p = p.rotate_around(center, deg);
        }
    }
}

#[inline]
fn lerp(a: Point, b: Point, t: f64) -> Point {
    Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}
