use anyhow::{Result, bail};
use geo::orient::Direction;
use geo::{Coord, LineString, MultiLineString, MultiPoint, MultiPolygon, Orient, Point, Polygon};
use shapefile::Shape;

use super::Geom;

/// Convert a shapefile shape into a layer geometry. `None` for null shapes.
pub fn shape_to_geom(shape: &Shape) -> Result<Option<Geom>> {
    macro_rules! rings {
        ($p:expr) => {
            rings_to_geom(
                $p.rings()
                    .iter()
                    .map(|ring| {
                        ring.points()
                            .iter()
                            .map(|pt| Coord { x: pt.x, y: pt.y })
                            .collect()
                    })
                    .collect(),
            )
        };
    }
    macro_rules! parts {
        ($p:expr) => {
            parts_to_geom(
                $p.parts()
                    .iter()
                    .map(|part| part.iter().map(|pt| Coord { x: pt.x, y: pt.y }).collect())
                    .collect(),
            )
        };
    }
    macro_rules! multipoint {
        ($p:expr) => {
            points_to_geom($p.points().iter().map(|pt| (pt.x, pt.y)).collect())
        };
    }

    let geom = match shape {
        Shape::NullShape => return Ok(None),
        Shape::Polygon(p) => rings!(p),
        Shape::PolygonM(p) => rings!(p),
        Shape::PolygonZ(p) => rings!(p),
        Shape::Polyline(p) => parts!(p),
        Shape::PolylineM(p) => parts!(p),
        Shape::PolylineZ(p) => parts!(p),
        Shape::Point(p) => points_to_geom(vec![(p.x, p.y)]),
        Shape::PointM(p) => points_to_geom(vec![(p.x, p.y)]),
        Shape::PointZ(p) => points_to_geom(vec![(p.x, p.y)]),
        Shape::Multipoint(p) => multipoint!(p),
        Shape::MultipointM(p) => multipoint!(p),
        Shape::MultipointZ(p) => multipoint!(p),
        Shape::Multipatch(_) => bail!("multipatch geometry is not supported"),
    };
    Ok(Some(geom))
}

/// Group shapefile rings into polygons: each exterior ring claims the holes
/// that follow it (shapefile ring order), with exteriors recognised by their
/// clockwise winding.
fn rings_to_geom(rings: Vec<Vec<Coord<f64>>>) -> Geom {
    /// Ensure first and last are the same for geo::LineString coords
    fn ensure_closed(coords: &mut Vec<Coord<f64>>) {
        if !coords.is_empty() && coords[0] != coords[coords.len() - 1] {
            coords.push(coords[0]);
        }
    }

    /// Get the signed area of a geo::Coord list (negative for exterior in shapefile order)
    fn signed_area(pts: &[Coord<f64>]) -> f64 {
        let mut a = 0.0;
        for w in pts.windows(2) {
            a += w[0].x * w[1].y - w[1].x * w[0].y;
        }
        a / 2.0
    }

    let mut polys: Vec<Polygon<f64>> = Vec::new();
    let mut current_exterior: Option<LineString<f64>> = None;
    let mut current_holes: Vec<LineString<f64>> = Vec::new();

    for mut coords in rings {
        ensure_closed(&mut coords);
        let is_exterior = signed_area(&coords) < 0.0;
        let ls = LineString(coords);
        if is_exterior {
            if let Some(ext) = current_exterior.take() {
                polys.push(Polygon::new(ext, std::mem::take(&mut current_holes)));
            }
            current_exterior = Some(ls);
        } else {
            current_holes.push(ls);
        }
    }
    if let Some(ext) = current_exterior {
        polys.push(Polygon::new(ext, current_holes));
    }

    // Downstream predicates and offsets expect geo winding (CCW exteriors).
    Geom::Polygon(MultiPolygon(polys).orient(Direction::Default))
}

fn parts_to_geom(parts: Vec<Vec<Coord<f64>>>) -> Geom {
    Geom::Line(MultiLineString(parts.into_iter().map(LineString).collect()))
}

fn points_to_geom(points: Vec<(f64, f64)>) -> Geom {
    Geom::Point(MultiPoint(
        points.into_iter().map(|(x, y)| Point::new(x, y)).collect(),
    ))
}
