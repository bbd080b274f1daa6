//! Shared fakes for driving the pipeline without a map engine, GPS
//! hardware, feature services or a host application.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use routescan::{
    BackendEvent, BridgeError, FeedError, GeoFix, GoToOptions, GoToTarget, GraphicHandle,
    HostBridge, InspectionConfig, LayerGroupRef, LayerView, LocalArtifactStore, LocationBackend,
    MapView, PlanarEngine, Screenshot, ScreenshotRequest, SessionBackends, SessionController,
    SessionEvent, SessionEventReceiver, SpatialQuery, SpatialQueryBackend, TrackPoint,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Map view that records every navigation and route-line mutation.
#[derive(Default)]
pub struct RecordingView {
    pub updating: AtomicBool,
    pub animating: AtomicBool,
    next_handle: AtomicU64,
    pub route_lines: Mutex<Vec<Vec<TrackPoint>>>,
    pub removed: Mutex<Vec<GraphicHandle>>,
    pub goto_targets: Mutex<Vec<GoToTarget>>,
    pub screenshots_taken: AtomicU64,
}

impl RecordingView {
    pub fn last_route_line(&self) -> Option<Vec<TrackPoint>> {
        self.route_lines.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl MapView for RecordingView {
    async fn go_to(&self, target: GoToTarget, _options: GoToOptions) -> anyhow::Result<()> {
        self.goto_targets.lock().unwrap().push(target);
        Ok(())
    }

    fn updating(&self) -> bool {
        self.updating.load(Ordering::SeqCst)
    }

    fn animating(&self) -> bool {
        self.animating.load(Ordering::SeqCst)
    }

    fn layer_views(&self) -> Vec<Arc<dyn LayerView>> {
        Vec::new()
    }

    async fn await_frame(&self) {
        tokio::task::yield_now().await;
    }

    async fn take_screenshot(&self, request: ScreenshotRequest) -> anyhow::Result<Screenshot> {
        self.screenshots_taken.fetch_add(1, Ordering::SeqCst);
        Ok(Screenshot {
            format: request.format,
            data: vec![0x89, b'P', b'N', b'G'],
            width: request.width,
            height: request.height,
        })
    }

    fn view_size(&self) -> (u32, u32) {
        (800, 600)
    }

    fn add_route_line(&self, points: &[TrackPoint]) -> anyhow::Result<GraphicHandle> {
        self.route_lines.lock().unwrap().push(points.to_vec());
        let id = self.next_handle.fetch_add(1, Ordering::SeqCst);
        Ok(GraphicHandle(id))
    }

    fn remove_graphic(&self, handle: GraphicHandle) {
        self.removed.lock().unwrap().push(handle);
    }
}

/// In-memory feature service. Features carry a location; the intersects
/// query evaluates the corridor for real.
#[derive(Default)]
pub struct FakeQueryService {
    /// Sub-layer title to `(identifier, location)` features.
    pub layers: HashMap<String, Vec<(String, TrackPoint)>>,
    /// Sub-layer titles whose queries fail outright.
    pub failing: Vec<String>,
}

impl FakeQueryService {
    pub fn with_layer(
        mut self,
        title: &str,
        features: Vec<(&str, TrackPoint)>,
    ) -> Self {
        self.layers.insert(
            title.to_string(),
            features
                .into_iter()
                .map(|(id, at)| (id.to_string(), at))
                .collect(),
        );
        self
    }
}

#[async_trait]
impl SpatialQueryBackend for FakeQueryService {
    async fn resolve_sublayer(
        &self,
        group_endpoint: &str,
        sublayer_title: &str,
    ) -> anyhow::Result<Option<String>> {
        Ok(Some(format!("{group_endpoint}/{sublayer_title}")))
    }

    async fn query(
        &self,
        endpoint: &str,
        query: &SpatialQuery,
    ) -> anyhow::Result<Vec<routescan::FeatureRow>> {
        let title = endpoint.rsplit('/').next().unwrap_or_default();
        if self.failing.iter().any(|t| t == title) {
            anyhow::bail!("layer service unavailable");
        }
        let field = query.out_fields[0].clone();
        Ok(self
            .layers
            .get(title)
            .map(|features| {
                features
                    .iter()
                    .filter(|(_, at)| query.corridor.contains(*at))
                    .map(|(id, _)| {
                        let mut row = routescan::FeatureRow::new();
                        row.insert(field.clone(), serde_json::Value::String(id.clone()));
                        row
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Scripted positioning hardware. The subscription stays open until the
/// backend is dropped, like a real watch.
#[derive(Default)]
pub struct FakeLocationBackend {
    pub events: Mutex<Vec<BackendEvent>>,
    pub subscribe_error: Mutex<Option<FeedError>>,
    keep_alive: Mutex<Option<mpsc::Sender<BackendEvent>>>,
}

impl FakeLocationBackend {
    pub fn with_fixes(fixes: Vec<GeoFix>) -> Self {
        Self {
            events: Mutex::new(fixes.into_iter().map(BackendEvent::Fix).collect()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl LocationBackend for FakeLocationBackend {
    async fn subscribe(&self) -> Result<mpsc::Receiver<BackendEvent>, FeedError> {
        if let Some(err) = *self.subscribe_error.lock().unwrap() {
            return Err(err);
        }
        let events = self.events.lock().unwrap().clone();
        let (tx, rx) = mpsc::channel(events.len().max(1) + 1);
        for event in events {
            tx.try_send(event).expect("subscription buffer too small");
        }
        *self.keep_alive.lock().unwrap() = Some(tx);
        Ok(rx)
    }
}

/// Host application stand-in with switchable availability per call.
pub struct FakeBridge {
    pub fixture: Mutex<Option<String>>,
    pub saved: Mutex<Option<String>>,
    pub sent: Mutex<Vec<String>>,
    pub send_available: AtomicBool,
    pub save_available: AtomicBool,
    pub load_available: AtomicBool,
}

impl Default for FakeBridge {
    fn default() -> Self {
        Self {
            fixture: Mutex::new(None),
            saved: Mutex::new(None),
            sent: Mutex::new(Vec::new()),
            send_available: AtomicBool::new(true),
            save_available: AtomicBool::new(true),
            load_available: AtomicBool::new(true),
        }
    }
}

impl FakeBridge {
    pub fn with_fixture(fixture: &str) -> Self {
        let bridge = Self::default();
        *bridge.fixture.lock().unwrap() = Some(fixture.to_string());
        bridge
    }
}

#[async_trait]
impl HostBridge for FakeBridge {
    async fn send_artifact(&self, json: &str) -> Result<(), BridgeError> {
        if !self.send_available.load(Ordering::SeqCst) {
            return Err(BridgeError::Unavailable);
        }
        self.sent.lock().unwrap().push(json.to_string());
        Ok(())
    }

    fn get_fixture_list(&self) -> Option<String> {
        self.fixture.lock().unwrap().clone()
    }

    async fn save_artifact(&self, json: &str) -> Result<(), BridgeError> {
        if !self.save_available.load(Ordering::SeqCst) {
            return Err(BridgeError::Unavailable);
        }
        *self.saved.lock().unwrap() = Some(json.to_string());
        Ok(())
    }

    async fn load_artifact(&self) -> Result<Option<String>, BridgeError> {
        if !self.load_available.load(Ordering::SeqCst) {
            return Err(BridgeError::Unavailable);
        }
        Ok(self.saved.lock().unwrap().clone())
    }
}

pub fn plant_catalog() -> Vec<LayerGroupRef> {
    ["cable-plant", "conduit-plant", "fiber-plant"]
        .into_iter()
        .map(|name| LayerGroupRef {
            name: name.into(),
            endpoint: format!("https://plant.example/{name}"),
        })
        .collect()
}

pub fn scratch_store() -> (LocalArtifactStore, PathBuf) {
    let path = std::env::temp_dir()
        .join("routescan-tests")
        .join(format!("{}.json", Uuid::new_v4()));
    (LocalArtifactStore::new(path.clone()), path)
}

pub struct Harness {
    pub controller: SessionController,
    pub events: SessionEventReceiver,
    pub view: Arc<RecordingView>,
    pub bridge: Arc<FakeBridge>,
    pub location: Arc<FakeLocationBackend>,
    pub store_path: PathBuf,
}

pub fn harness(
    queries: FakeQueryService,
    location: FakeLocationBackend,
    bridge: FakeBridge,
) -> Harness {
    init_logging();
    let view = Arc::new(RecordingView::default());
    let bridge = Arc::new(bridge);
    let location = Arc::new(location);
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (store, store_path) = scratch_store();

    let controller = SessionController::new(
        SessionBackends {
            view: view.clone(),
            geometry: Arc::new(PlanarEngine::new(121.0, 25.0)),
            location: location.clone(),
            queries: Arc::new(queries),
            bridge: bridge.clone(),
        },
        plant_catalog(),
        store,
        InspectionConfig::default(),
        events_tx,
    );

    Harness {
        controller,
        events: events_rx,
        view,
        bridge,
        location,
        store_path,
    }
}

/// Await the next event matching the predicate, discarding the rest.
pub async fn next_matching(
    events: &mut SessionEventReceiver,
    mut predicate: impl FnMut(&SessionEvent) -> bool,
) -> SessionEvent {
    loop {
        let event = events
            .recv()
            .await
            .expect("event channel closed while waiting");
        if predicate(&event) {
            return event;
        }
    }
}

pub async fn next_confirmation(events: &mut SessionEventReceiver) -> routescan::ConfirmationSummary {
    match next_matching(events, |e| {
        matches!(e, SessionEvent::ConfirmationRequested { .. })
    })
    .await
    {
        SessionEvent::ConfirmationRequested { summary } => summary,
        _ => unreachable!(),
    }
}

pub async fn next_message_containing(
    events: &mut SessionEventReceiver,
    needle: &str,
) -> String {
    match next_matching(events, |e| {
        matches!(e, SessionEvent::Message { text } if text.contains(needle))
    })
    .await
    {
        SessionEvent::Message { text } => text,
        _ => unreachable!(),
    }
}
