//! Planar geometry primitives: points, bounding boxes, polygons.
//!
//! All geometry is in projected planar coordinates (metres or an equivalent
//! uniform unit), not lat/lon — the layout engine measures Euclidean
//! distances and rotates around arbitrary centers, both of which are only
//! meaningful after projection.  `f64` throughout: rotation round-trips and
//! the bit-exactness guarantees of the layout depend on full precision.

/// A point in projected planar coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[inline]
    pub fn dist(self, other: Point) -> f64 {
        self.sq_dist(other).sqrt()
    }

    /// Squared Euclidean distance — cheaper when only comparing.
    #[inline]
    pub fn sq_dist(self, other: Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    /// Angle of the vector from `self` to `other`, in radians in
    /// `(-π, π]`, measured counterclockwise from the positive x axis.
    #[inline]
    pub fn angle_to(self, other: Point) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    /// Midpoint between `self` and `other`.
    #[inline]
    pub fn mid(self, other: Point) -> Point {
        Point::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }

    /// Rotate `self` around `center` by `deg` degrees counterclockwise.
    pub fn rotate_around(self, center: Point, deg: f64) -> Point {
        let rad = deg.to_radians();
        let (sin, cos) = rad.sin_cos();
        let dx = self.x - center.x;
        let dy = self.y - center.y;
        Point::new(
            center.x + dx * cos - dy * sin,
            center.y + dx * sin + dy * cos,
        )
    }

    /// `true` if both coordinates are finite (rejects NaN/∞ at IO borders).
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

// ── BBox ──────────────────────────────────────────────────────────────────────

/// Axis-aligned bounding box.
///
/// An empty box (`BBox::empty()`) has inverted bounds; extending it with the
/// first point makes it valid.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BBox {
    pub min: Point,
    pub max: Point,
}

impl BBox {
    pub fn empty() -> Self {
        Self {
            min: Point::new(f64::INFINITY, f64::INFINITY),
            max: Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn extend(&mut self, p: Point) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    pub fn width(&self) -> f64 {
        (self.max.x - self.min.x).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.max.y - self.min.y).max(0.0)
    }

    pub fn centroid(&self) -> Point {
        self.min.mid(self.max)
    }

    /// Box grown by `pad` on all four sides.
    pub fn padded(&self, pad: f64) -> BBox {
        BBox {
            min: Point::new(self.min.x - pad, self.min.y - pad),
            max: Point::new(self.max.x + pad, self.max.y + pad),
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

// ── Polygon ───────────────────────────────────────────────────────────────────

/// A simple closed polygon, used for obstacle regions the grid must avoid.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    /// Ring vertices in order; the closing segment back to the first vertex
    /// is implicit.
    pub pts: Vec<Point>,
}

impl Polygon {
    pub fn new(pts: Vec<Point>) -> Self {
        Self { pts }
    }

    /// Ray-cast point-in-polygon test.  Points exactly on the boundary may
    /// fall on either side; obstacle handling tolerates that.
    pub fn contains(&self, p: Point) -> bool {
        let n = self.pts.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let (a, b) = (self.pts[i], self.pts[j]);
            if (a.y > p.y) != (b.y > p.y)
                && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// `true` if the segment `a→b` intersects the polygon (crosses an edge
    /// or lies inside).
    pub fn intersects_segment(&self, a: Point, b: Point) -> bool {
        let n = self.pts.len();
        if n < 3 {
            return false;
        }
        let mut j = n - 1;
        for i in 0..n {
            if segments_intersect(a, b, self.pts[j], self.pts[i]) {
                return true;
            }
            j = i;
        }
        self.contains(a) || self.contains(b)
    }
}

/// Proper or touching intersection of segments `a→b` and `c→d`.
pub fn segments_intersect(a: Point, b: Point, c: Point, d: Point) -> bool {
    fn orient(p: Point, q: Point, r: Point) -> f64 {
        (q.x - p.x) * (r.y - p.y) - (q.y - p.y) * (r.x - p.x)
    }
    fn on_segment(p: Point, q: Point, r: Point) -> bool {
        r.x >= p.x.min(q.x) && r.x <= p.x.max(q.x) && r.y >= p.y.min(q.y) && r.y <= p.y.max(q.y)
    }

    let o1 = orient(a, b, c);
    let o2 = orient(a, b, d);
    let o3 = orient(c, d, a);
    let o4 = orient(c, d, b);

    if ((o1 > 0.0) != (o2 > 0.0)) && ((o3 > 0.0) != (o4 > 0.0)) {
        return true;
    }
    (o1 == 0.0 && on_segment(a, b, c))
        || (o2 == 0.0 && on_segment(a, b, d))
        || (o3 == 0.0 && on_segment(c, d, a))
        || (o4 == 0.0 && on_segment(c, d, b))
}
