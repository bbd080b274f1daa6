//! Trajectory capture, sampling and spatial analysis for outside-plant
//! field inspection.
//!
//! An operator walks or drives a route while a positioning feed streams
//! fixes. The sampler filters them into an ordered trajectory, and stopping
//! the session frames the route, waits for the map to finish rendering,
//! takes a screenshot and sweeps a buffered corridor across the remote
//! asset layers. The resulting artifact is persisted for resend and handed
//! to the host application on confirmation.
//!
//! The map engine, positioning hardware, feature services and host
//! application are all injected behind narrow ports, so the whole pipeline
//! runs deterministically against scripted fixtures.

mod analyzer;
mod bridge;
mod capture;
mod config;
mod error;
mod geometry;
mod location;
mod models;
mod sampler;
mod session;
mod trajectory;
mod view;

pub use analyzer::{
    AnalysisReport, AssetLayerSpec, FeatureRow, LayerGroupRef, SpatialAnalyzer, SpatialQuery,
    SpatialQueryBackend,
};
pub use bridge::{ArtifactRepository, HostBridge, LocalArtifactStore};
pub use capture::CaptureSynchronizer;
pub use config::{
    AnalyzerConfig, CaptureConfig, FeedConfig, FramingConfig, InspectionConfig, SamplerConfig,
};
pub use error::{AnalysisError, BridgeError, FeedError, SessionError};
pub use geometry::{Corridor, Extent, GeoFix, GeometryEngine, PlanarEngine};
pub use location::{
    parse_fixture_list, BackendEvent, FeedHandle, FeedSignal, LiveLocationSource,
    LocationBackend, LocationSource, ScriptedLocationSource,
};
pub use models::{
    AssetCategory, AssetCounts, SessionArtifact, SessionSnapshot, SpatialAssetRecord, TrackPoint,
};
pub use sampler::{PointSampler, SampleDecision, SamplerPhase};
pub use session::{
    ConfirmationSummary, SessionBackends, SessionController, SessionEvent, SessionEventReceiver,
    SessionEventSender, SessionPhase, StopOutcome,
};
pub use trajectory::TrajectoryStore;
pub use view::{
    GoToOptions, GoToTarget, GraphicHandle, ImageFormat, LayerView, MapView, Screenshot,
    ScreenshotRequest,
};
