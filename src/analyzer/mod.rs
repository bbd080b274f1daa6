use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use log::{info, warn};

use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::geometry::{Corridor, GeometryEngine};
use crate::models::{AssetCategory, AssetCounts, SpatialAssetRecord, TrackPoint};

/// One remote asset layer to interrogate: where it lives in the layer tree
/// and which attribute field carries the asset identifier.
#[derive(Debug, Clone)]
pub struct AssetLayerSpec {
    /// Layer-group name as advertised by the map document.
    pub group: String,
    /// Sub-layer title within the group.
    pub sublayer: String,
    /// Attribute field holding the asset identifier.
    pub id_field: String,
    pub category: AssetCategory,
}

impl AssetLayerSpec {
    /// The four outside-plant layers this client inspects.
    pub fn plant_defaults() -> Vec<AssetLayerSpec> {
        vec![
            AssetLayerSpec {
                group: "cable-plant".into(),
                sublayer: "Cable Pole (G69)".into(),
                id_field: "FULLNO_".into(),
                category: AssetCategory::Pole,
            },
            AssetLayerSpec {
                group: "conduit-plant".into(),
                sublayer: "Conduit Manhole (G60)".into(),
                id_field: "FULLNO_".into(),
                category: AssetCategory::Manhole,
            },
            AssetLayerSpec {
                group: "conduit-plant".into(),
                sublayer: "Conduit Handhole (G61)".into(),
                id_field: "FULLNO_".into(),
                category: AssetCategory::Handhole,
            },
            AssetLayerSpec {
                group: "fiber-plant".into(),
                sublayer: "Outdoor Terminal".into(),
                id_field: "ACCNOFULL_".into(),
                category: AssetCategory::Cabinet,
            },
        ]
    }
}

/// A resolvable layer group advertised by the map document.
#[derive(Debug, Clone)]
pub struct LayerGroupRef {
    pub name: String,
    pub endpoint: String,
}

/// One discovery query: which features intersect the corridor. Geometry is
/// never requested back; only the identifier field matters here.
#[derive(Debug, Clone)]
pub struct SpatialQuery {
    pub corridor: Corridor,
    pub out_fields: Vec<String>,
    pub return_geometry: bool,
}

/// Attribute row of one returned feature.
pub type FeatureRow = serde_json::Map<String, serde_json::Value>;

/// Remote feature-service port.
#[async_trait]
pub trait SpatialQueryBackend: Send + Sync {
    /// Resolve the query endpoint of a titled sub-layer within a group
    /// endpoint. `Ok(None)` when the group loads but the title is unknown.
    async fn resolve_sublayer(
        &self,
        group_endpoint: &str,
        sublayer_title: &str,
    ) -> anyhow::Result<Option<String>>;

    /// Run an intersects query and return the matching attribute rows.
    async fn query(&self, endpoint: &str, query: &SpatialQuery) -> anyhow::Result<Vec<FeatureRow>>;
}

/// What one stop-time analysis produced.
#[derive(Debug, Clone, Default)]
pub struct AnalysisReport {
    /// Distinct assets in discovery order, before partitioning.
    pub records: Vec<SpatialAssetRecord>,
    /// Cable-pole identifiers, sorted.
    pub pole_assets: Vec<String>,
    /// Manhole, handhole and cabinet identifiers, sorted.
    pub other_assets: Vec<String>,
    pub counts: AssetCounts,
    pub has_assets: bool,
}

/// Stateless stop-time pipeline stage: corridor construction plus the
/// four-layer discovery sweep.
pub struct SpatialAnalyzer {
    geometry: Arc<dyn GeometryEngine>,
    backend: Arc<dyn SpatialQueryBackend>,
    config: AnalyzerConfig,
    specs: Vec<AssetLayerSpec>,
}

impl SpatialAnalyzer {
    pub fn new(
        geometry: Arc<dyn GeometryEngine>,
        backend: Arc<dyn SpatialQueryBackend>,
        config: AnalyzerConfig,
    ) -> Self {
        Self {
            geometry,
            backend,
            config,
            specs: AssetLayerSpec::plant_defaults(),
        }
    }

    pub fn with_specs(mut self, specs: Vec<AssetLayerSpec>) -> Self {
        self.specs = specs;
        self
    }

    pub async fn analyze(
        &self,
        points: &[TrackPoint],
        catalog: &[LayerGroupRef],
    ) -> Result<AnalysisReport, AnalysisError> {
        if points.len() < 2 {
            return Err(AnalysisError::InsufficientRoute);
        }

        let corridor = self
            .geometry
            .buffer(points, self.config.buffer_distance_m)?;

        // All four layers fan out at once and join at a single barrier; one
        // layer failing or going missing must not starve the other three.
        let queries = self
            .specs
            .iter()
            .map(|spec| self.query_layer(spec, catalog, &corridor));
        let per_layer = join_all(queries).await;

        let mut seen: HashSet<String> = HashSet::new();
        let mut report = AnalysisReport::default();
        for (spec, identifiers) in self.specs.iter().zip(per_layer) {
            let mut distinct = Vec::new();
            for raw in identifiers {
                let id = raw.trim();
                // The same physical object can satisfy two layer predicates;
                // it still counts once.
                if id.is_empty() || !seen.insert(id.to_string()) {
                    continue;
                }
                distinct.push(id.to_string());
            }
            report.counts.set(spec.category, distinct.len());
            for id in &distinct {
                report.records.push(SpatialAssetRecord {
                    identifier: id.clone(),
                    category: spec.category,
                });
            }
            match spec.category {
                AssetCategory::Pole => report.pole_assets.extend(distinct),
                _ => report.other_assets.extend(distinct),
            }
        }

        report.pole_assets.sort();
        report.other_assets.sort();
        report.has_assets = !seen.is_empty();

        info!(
            "corridor sweep found {} distinct assets ({} poles, {} other)",
            seen.len(),
            report.pole_assets.len(),
            report.other_assets.len()
        );
        Ok(report)
    }

    /// Query one layer, degrading every failure mode to zero identifiers.
    async fn query_layer(
        &self,
        spec: &AssetLayerSpec,
        catalog: &[LayerGroupRef],
        corridor: &Corridor,
    ) -> Vec<String> {
        let Some(group) = catalog.iter().find(|g| g.name == spec.group) else {
            warn!("layer group '{}' not present in catalog", spec.group);
            return Vec::new();
        };

        let endpoint = match self
            .backend
            .resolve_sublayer(&group.endpoint, &spec.sublayer)
            .await
        {
            Ok(Some(endpoint)) => endpoint,
            Ok(None) => {
                warn!(
                    "sub-layer '{}' not found under group '{}'",
                    spec.sublayer, spec.group
                );
                return Vec::new();
            }
            Err(err) => {
                warn!("loading layer group '{}' failed: {err:#}", spec.group);
                return Vec::new();
            }
        };

        let query = SpatialQuery {
            corridor: corridor.clone(),
            out_fields: vec![spec.id_field.clone()],
            return_geometry: false,
        };
        match self.backend.query(&endpoint, &query).await {
            Ok(rows) => rows
                .iter()
                .filter_map(|row| row.get(&spec.id_field))
                .filter_map(|value| value.as_str().map(str::to_string))
                .collect(),
            Err(err) => {
                warn!("query against '{}' failed: {err:#}", spec.sublayer);
                Vec::new()
            }
        }
    }
}
