use geo::{EuclideanDistance, Point};

use super::{bounds_of, Corridor, Extent, GeoFix, GeometryEngine};
use crate::error::AnalysisError;
use crate::models::TrackPoint;

/// IUGG mean Earth radius, metres.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Planar geometry over a local tangent plane anchored at a geographic
/// origin. Good to well under a metre across walking-scale routes, which is
/// below GPS accuracy anyway.
#[derive(Debug, Clone)]
pub struct PlanarEngine {
    origin_longitude: f64,
    origin_latitude: f64,
    metres_per_deg_east: f64,
    metres_per_deg_north: f64,
}

impl PlanarEngine {
    /// `origin` is the geographic point mapped to planar `(0, 0)`; usually
    /// the survey district's reference anchor.
    pub fn new(origin_longitude: f64, origin_latitude: f64) -> Self {
        let metres_per_deg_north = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
        Self {
            origin_longitude,
            origin_latitude,
            metres_per_deg_east: metres_per_deg_north * origin_latitude.to_radians().cos(),
            metres_per_deg_north,
        }
    }
}

impl GeometryEngine for PlanarEngine {
    fn distance_m(&self, a: TrackPoint, b: TrackPoint) -> f64 {
        Point::new(a.x, a.y).euclidean_distance(&Point::new(b.x, b.y))
    }

    fn buffer(&self, points: &[TrackPoint], radius_m: f64) -> Result<Corridor, AnalysisError> {
        Corridor::new(points, radius_m)
    }

    fn project(&self, fix: GeoFix) -> TrackPoint {
        TrackPoint::new(
            (fix.longitude - self.origin_longitude) * self.metres_per_deg_east,
            (fix.latitude - self.origin_latitude) * self.metres_per_deg_north,
        )
    }

    fn extent(&self, points: &[TrackPoint]) -> Option<Extent> {
        bounds_of(points.iter().copied())
    }
}
