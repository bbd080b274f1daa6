mod planar;

pub use planar::PlanarEngine;

use geo::{Coord, EuclideanDistance, LineString, Point};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::models::TrackPoint;

/// One raw sample from a positioning source, in the global geographic frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoFix {
    pub longitude: f64,
    pub latitude: f64,
    /// Reported horizontal accuracy, metres.
    pub accuracy: f64,
}

/// Axis-aligned bounds of a route in the local planar frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> TrackPoint {
        TrackPoint::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Scale about the center. A factor above 1 adds framing margin.
    pub fn expand(&self, factor: f64) -> Extent {
        let center = self.center();
        let half_w = self.width() / 2.0 * factor;
        let half_h = self.height() / 2.0 * factor;
        Extent {
            min_x: center.x - half_w,
            min_y: center.y - half_h,
            max_x: center.x + half_w,
            max_y: center.y + half_h,
        }
    }
}

/// Buffered corridor around a walked route. The corridor, not the bare
/// line, is the discovery-query footprint: it models the inspector's reach
/// to either side of the path.
#[derive(Debug, Clone, PartialEq)]
pub struct Corridor {
    path: LineString<f64>,
    radius_m: f64,
}

impl Corridor {
    /// A corridor needs a route with a direction, so at least two points.
    pub fn new(points: &[TrackPoint], radius_m: f64) -> Result<Self, AnalysisError> {
        if points.len() < 2 {
            return Err(AnalysisError::InsufficientRoute);
        }
        if !radius_m.is_finite() || radius_m <= 0.0 {
            return Err(AnalysisError::Geometry(format!(
                "invalid buffer radius {radius_m}"
            )));
        }
        let path: LineString<f64> = points
            .iter()
            .map(|p| Coord { x: p.x, y: p.y })
            .collect();
        Ok(Self { path, radius_m })
    }

    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }

    pub fn path_points(&self) -> impl Iterator<Item = TrackPoint> + '_ {
        self.path.coords().map(|c| TrackPoint::new(c.x, c.y))
    }

    /// Whether a point falls inside the buffered footprint.
    pub fn contains(&self, point: TrackPoint) -> bool {
        let distance = self.path.euclidean_distance(&Point::new(point.x, point.y));
        distance <= self.radius_m
    }

    /// Route bounds grown by the buffer radius on every side.
    pub fn extent(&self) -> Extent {
        let mut extent = bounds_of(self.path.coords().map(|c| TrackPoint::new(c.x, c.y)))
            .expect("corridor path has at least two points");
        extent.min_x -= self.radius_m;
        extent.min_y -= self.radius_m;
        extent.max_x += self.radius_m;
        extent.max_y += self.radius_m;
        extent
    }
}

/// Narrow wrapper over the map engine's planar and spatial primitives.
/// Stateless; every implementation must be cheap to call per fix.
pub trait GeometryEngine: Send + Sync {
    /// Planar distance between two local-frame points, metres.
    fn distance_m(&self, a: TrackPoint, b: TrackPoint) -> f64;

    /// Buffered corridor polygon around an ordered route.
    fn buffer(&self, points: &[TrackPoint], radius_m: f64) -> Result<Corridor, AnalysisError>;

    /// Reproject a geographic fix into the local planar frame.
    fn project(&self, fix: GeoFix) -> TrackPoint;

    /// Bounds of a point sequence; `None` when empty.
    fn extent(&self, points: &[TrackPoint]) -> Option<Extent>;
}

pub(crate) fn bounds_of(points: impl IntoIterator<Item = TrackPoint>) -> Option<Extent> {
    let mut iter = points.into_iter();
    let first = iter.next()?;
    let mut extent = Extent {
        min_x: first.x,
        min_y: first.y,
        max_x: first.x,
        max_y: first.y,
    };
    for p in iter {
        extent.min_x = extent.min_x.min(p.x);
        extent.min_y = extent.min_y.min(p.y);
        extent.max_x = extent.max_x.max(p.x);
        extent.max_y = extent.max_y.max(p.y);
    }
    Some(extent)
}
