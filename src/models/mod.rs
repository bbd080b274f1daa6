mod artifact;
mod assets;
mod point;

pub use artifact::SessionArtifact;
pub use assets::{AssetCategory, AssetCounts, SpatialAssetRecord};
pub use point::TrackPoint;

use serde::Serialize;

use crate::session::SessionPhase;

/// Read-only view of the live session, for status displays.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub is_tracking: bool,
    pub point_count: usize,
    pub warming_up: bool,
    pub pole_devices: Vec<String>,
    pub other_devices: Vec<String>,
    pub device_counts: AssetCounts,
    pub has_screenshot: bool,
}
