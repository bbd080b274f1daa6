use serde::{Deserialize, Serialize};

/// Infrastructure category of a discovered plant asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetCategory {
    Pole,
    Manhole,
    Handhole,
    Cabinet,
}

impl AssetCategory {
    pub const ALL: [AssetCategory; 4] = [
        AssetCategory::Pole,
        AssetCategory::Manhole,
        AssetCategory::Handhole,
        AssetCategory::Cabinet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetCategory::Pole => "pole",
            AssetCategory::Manhole => "manhole",
            AssetCategory::Handhole => "handhole",
            AssetCategory::Cabinet => "cabinet",
        }
    }
}

/// One deduplicated asset discovered along the corridor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpatialAssetRecord {
    pub identifier: String,
    pub category: AssetCategory,
}

/// Distinct-asset tally per category. All four keys are always present so the
/// confirmation step never has to treat an absent category as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetCounts {
    pub pole: usize,
    pub manhole: usize,
    pub handhole: usize,
    pub cabinet: usize,
}

impl AssetCounts {
    pub fn get(&self, category: AssetCategory) -> usize {
        match category {
            AssetCategory::Pole => self.pole,
            AssetCategory::Manhole => self.manhole,
            AssetCategory::Handhole => self.handhole,
            AssetCategory::Cabinet => self.cabinet,
        }
    }

    pub fn set(&mut self, category: AssetCategory, count: usize) {
        match category {
            AssetCategory::Pole => self.pole = count,
            AssetCategory::Manhole => self.manhole = count,
            AssetCategory::Handhole => self.handhole = count,
            AssetCategory::Cabinet => self.cabinet = count,
        }
    }

    pub fn total(&self) -> usize {
        self.pole + self.manhole + self.handhole + self.cabinet
    }
}
