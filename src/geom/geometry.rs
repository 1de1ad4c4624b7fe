use geo::{
    Area, BooleanOps, BoundingRect, Intersects, MultiLineString, MultiPoint, MultiPolygon, Rect,
    Relate,
};

/// Geometry family of a layer, as far as reporting cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Polygon,
    Line,
    Point,
}

/// A layer geometry: every shape is held in its multi-part form.
#[derive(Debug, Clone)]
pub enum Geom {
    Polygon(MultiPolygon<f64>),
    Line(MultiLineString<f64>),
    Point(MultiPoint<f64>),
}

impl Geom {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geom::Polygon(_) => GeometryKind::Polygon,
            Geom::Line(_) => GeometryKind::Line,
            Geom::Point(_) => GeometryKind::Point,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Geom::Polygon(mp) => mp.0.is_empty(),
            Geom::Line(mls) => mls.0.is_empty(),
            Geom::Point(mpt) => mpt.0.is_empty(),
        }
    }

    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        match self {
            Geom::Polygon(mp) => mp.bounding_rect(),
            Geom::Line(mls) => mls.bounding_rect(),
            Geom::Point(mpt) => mpt.bounding_rect(),
        }
    }

    /// Planar area in square metres. Zero for anything that isn't a polygon.
    pub fn area_m2(&self) -> f64 {
        match self {
            Geom::Polygon(mp) => mp.unsigned_area(),
            _ => 0.0,
        }
    }

    /// Planar length in metres. Zero for anything that isn't a line.
    pub fn length_m(&self) -> f64 {
        match self {
            Geom::Line(mls) => mls
                .iter()
                .flat_map(|ls| ls.0.windows(2))
                .map(|w| (w[1].x - w[0].x).hypot(w[1].y - w[0].y))
                .sum(),
            _ => 0.0,
        }
    }

    /// True iff the two geometries share interior points (or one contains the
    /// other). Pure boundary touches (edge or point contact) do NOT count.
    pub fn intersects_interior(&self, other: &Geom) -> bool {
        // One relate() call gives the full DE-9IM for any pair of kinds.
        macro_rules! hit {
            ($a:expr, $b:expr) => {{
                let im = $a.relate($b);
                im.is_intersects() && !im.is_touches()
            }};
        }
        use Geom::*;
        match (self, other) {
            (Polygon(a), Polygon(b)) => hit!(a, b),
            (Polygon(a), Line(b)) => hit!(a, b),
            (Polygon(a), Point(b)) => hit!(a, b),
            (Line(a), Polygon(b)) => hit!(a, b),
            (Line(a), Line(b)) => hit!(a, b),
            (Line(a), Point(b)) => hit!(a, b),
            (Point(a), Polygon(b)) => hit!(a, b),
            (Point(a), Line(b)) => hit!(a, b),
            (Point(a), Point(b)) => hit!(a, b),
        }
    }

    /// The overlapping piece of the two geometries, in the lower of the two
    /// dimensions. Line-line pairs clip to an empty point set.
    pub fn clip(&self, other: &Geom) -> Geom {
        use Geom::*;
        match (self, other) {
            (Polygon(a), Polygon(b)) => Polygon(a.intersection(b)),
            (Polygon(a), Line(b)) => Line(a.clip(b, false)),
            (Line(a), Polygon(b)) => Line(b.clip(a, false)),
            (Point(a), _) => Point(points_within(a, other)),
            (_, Point(b)) => Point(points_within(b, self)),
            (Line(_), Line(_)) => Point(MultiPoint::new(vec![])),
        }
    }
}

fn points_within(points: &MultiPoint<f64>, container: &Geom) -> MultiPoint<f64> {
    let kept = points
        .iter()
        .filter(|p| match container {
            Geom::Polygon(mp) => p.intersects(mp),
            Geom::Line(mls) => p.intersects(mls),
            Geom::Point(mpt) => p.intersects(mpt),
        })
        .copied()
        .collect();
    MultiPoint::new(kept)
}
