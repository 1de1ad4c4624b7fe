use anyhow::{Result, ensure};
use geo::{BooleanOps, ConvexHull, MultiPoint, MultiPolygon, Point, Polygon};
use geo_buf::{buffer_multi_polygon_rounded, buffer_point};

use super::Geom;

/// Which part of a buffered zone a subject layer keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferSide {
    /// The whole buffered footprint (lines and points).
    Full,
    /// Only the ring outside the original shape (polygons).
    RingOnly,
}

/// Segments used to approximate one full circle of a round cap.
const ARC_SEGMENTS: usize = 32;

/// Build the planar, round-capped buffer zone of `geom` at `distance` metres.
/// The result is always a polygon geometry.
pub fn buffer_geom(geom: &Geom, distance: f64, side: BufferSide) -> Result<Geom> {
    ensure!(
        distance > 0.0 && distance.is_finite(),
        "buffer distance must be positive, got {distance}"
    );
    let zone = match geom {
        Geom::Polygon(mp) => {
            let grown = buffer_multi_polygon_rounded(mp, distance);
            match side {
                BufferSide::RingOnly => grown.difference(mp),
                BufferSide::Full => grown,
            }
        }
        Geom::Line(mls) => {
            let capsules = mls
                .iter()
                .flat_map(|ls| ls.0.windows(2))
                .map(|seg| capsule(Point::from(seg[0]), Point::from(seg[1]), distance));
            union_all(capsules)
        }
        Geom::Point(mpt) => union_all(mpt.iter().map(|p| buffer_point(p, distance, ARC_SEGMENTS))),
    };
    ensure!(
        !zone.0.is_empty(),
        "buffer construction produced an empty zone"
    );
    Ok(Geom::Polygon(zone))
}

/// Round-capped buffer of one segment: the convex hull of the discs around
/// its endpoints (exact for a single segment).
fn capsule(a: Point<f64>, b: Point<f64>, distance: f64) -> Polygon<f64> {
    let disc_a = buffer_point(&a, distance, ARC_SEGMENTS);
    let disc_b = buffer_point(&b, distance, ARC_SEGMENTS);
    let cloud: MultiPoint<f64> = disc_a
        .exterior()
        .points()
        .chain(disc_b.exterior().points())
        .collect();
    cloud.convex_hull()
}

fn union_all(polys: impl Iterator<Item = Polygon<f64>>) -> MultiPolygon<f64> {
    let mut zone: Option<MultiPolygon<f64>> = None;
    for poly in polys {
        let next = MultiPolygon::new(vec![poly]);
        zone = Some(match zone {
            None => next,
            Some(acc) => acc.union(&next),
        });
    }
    zone.unwrap_or_else(|| MultiPolygon::new(vec![]))
}
