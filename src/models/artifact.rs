use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{AssetCounts, TrackPoint};

/// Everything a completed session produces: the route, the classified asset
/// lists, and the framed screenshot. Immutable once built; persisted for
/// resend and submitted to the host on confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionArtifact {
    pub track_points: Vec<TrackPoint>,
    /// Milliseconds since the Unix epoch, stamped at stop time.
    pub timestamp: i64,
    pub pole_devices: Vec<String>,
    pub other_devices: Vec<String>,
    pub device_counts: AssetCounts,
    /// PNG data URL of the framed route.
    pub screenshot: String,
}

impl SessionArtifact {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("failed to serialise session artifact")
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("failed to parse stored session artifact")
    }
}
