use serde::{Deserialize, Serialize};

/// One accepted vertex of the walked route, in the local projected frame
/// (metres). Serialised as an `[x, y]` pair on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct TrackPoint {
    pub x: f64,
    pub y: f64,
}

impl TrackPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for TrackPoint {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<TrackPoint> for (f64, f64) {
    fn from(point: TrackPoint) -> Self {
        (point.x, point.y)
    }
}
