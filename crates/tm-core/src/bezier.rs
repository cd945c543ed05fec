//! Cubic Bezier interpolation.
//!
//! Used by the octilinearizer to smooth the take-off and touch-down between
//! a station's real geographic position and its grid hub.

use crate::geom::Point;
use crate::polyline::PolyLine;

/// A cubic Bezier curve defined by two endpoints and two control points.
#[derive(Copy, Clone, Debug)]
pub struct CubicBezier {
    pub p0: Point,
    pub c1: Point,
    pub c2: Point,
    pub p1: Point,
}

impl CubicBezier {
    pub fn new(p0: Point, c1: Point, c2: Point, p1: Point) -> Self {
        Self { p0, c1, c2, p1 }
    }

    /// Point on the curve at parameter `t` in `[0, 1]`.
    pub fn at(&self, t: f64) -> Point {
        let u = 1.0 - t;
        let b0 = u * u * u;
        let b1 = 3.0 * u * u * t;
        let b2 = 3.0 * u * t * t;
        let b3 = t * t * t;
        Point::new(
            b0 * self.p0.x + b1 * self.c1.x + b2 * self.c2.x + b3 * self.p1.x,
            b0 * self.p0.y + b1 * self.c1.y + b2 * self.c2.y + b3 * self.p1.y,
        )
    }

    /// Sample the curve at `n + 1` evenly spaced parameters (both endpoints
    /// included).
    pub fn render(&self, n: usize) -> PolyLine {
        let n = n.max(1);
        let mut pl = PolyLine::new();
        for i in 0..=n {
            pl.push(self.at(i as f64 / n as f64));
        }
        pl
    }
}
