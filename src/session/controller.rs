use std::sync::Arc;

use chrono::Utc;
use log::{debug, error, info, warn};
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use super::{
    ConfirmationSummary, SessionEvent, SessionEventSender, SessionPhase, StopOutcome,
};
use crate::analyzer::{AnalysisReport, LayerGroupRef, SpatialAnalyzer, SpatialQueryBackend};
use crate::bridge::{ArtifactRepository, HostBridge, LocalArtifactStore};
use crate::capture::CaptureSynchronizer;
use crate::config::InspectionConfig;
use crate::error::{BridgeError, FeedError, SessionError};
use crate::geometry::GeometryEngine;
use crate::location::{
    parse_fixture_list, FeedHandle, FeedSignal, LiveLocationSource, LocationBackend,
    LocationSource, ScriptedLocationSource,
};
use crate::models::{SessionArtifact, SessionSnapshot, TrackPoint};
use crate::sampler::PointSampler;
use crate::trajectory::TrajectoryStore;
use crate::view::{GoToOptions, GoToTarget, ImageFormat, MapView, ScreenshotRequest};

/// The external collaborators a session runs against.
pub struct SessionBackends {
    pub view: Arc<dyn MapView>,
    pub geometry: Arc<dyn GeometryEngine>,
    pub location: Arc<dyn LocationBackend>,
    pub queries: Arc<dyn SpatialQueryBackend>,
    pub bridge: Arc<dyn HostBridge>,
}

/// Everything owned by the current session. One mutex, one owner; the
/// rendered route line and the view are only ever touched from here.
struct SessionState {
    session_id: Option<String>,
    phase: SessionPhase,
    sampler: PointSampler,
    trajectory: TrajectoryStore,
    feed: Option<FeedHandle>,
    resend_mode: bool,
    report: Option<AnalysisReport>,
    artifact: Option<SessionArtifact>,
}

/// Orchestrates the capture lifecycle: start, sample, stop, analyze,
/// capture, confirm or cancel, resend.
#[derive(Clone)]
pub struct SessionController {
    state: Arc<Mutex<SessionState>>,
    view: Arc<dyn MapView>,
    geometry: Arc<dyn GeometryEngine>,
    location: Arc<dyn LocationBackend>,
    bridge: Arc<dyn HostBridge>,
    analyzer: Arc<SpatialAnalyzer>,
    capture: CaptureSynchronizer,
    artifacts: Arc<ArtifactRepository>,
    catalog: Arc<Vec<LayerGroupRef>>,
    config: InspectionConfig,
    events: SessionEventSender,
}

impl SessionController {
    pub fn new(
        backends: SessionBackends,
        catalog: Vec<LayerGroupRef>,
        local_store: LocalArtifactStore,
        config: InspectionConfig,
        events: SessionEventSender,
    ) -> Self {
        let analyzer = Arc::new(SpatialAnalyzer::new(
            backends.geometry.clone(),
            backends.queries.clone(),
            config.analyzer.clone(),
        ));
        let artifacts = Arc::new(ArtifactRepository::new(backends.bridge.clone(), local_store));
        let state = SessionState {
            session_id: None,
            phase: SessionPhase::Idle,
            sampler: PointSampler::new(config.sampler.clone(), backends.geometry.clone()),
            trajectory: TrajectoryStore::new(backends.view.clone()),
            feed: None,
            resend_mode: false,
            report: None,
            artifact: None,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            view: backends.view,
            geometry: backends.geometry,
            location: backends.location,
            bridge: backends.bridge,
            analyzer,
            capture: CaptureSynchronizer::new(config.capture.clone()),
            artifacts,
            catalog: Arc::new(catalog),
            config,
            events,
        }
    }

    /// Begin recording. An already-active session is force-stopped first so
    /// a restart can never leave two feeds alive.
    pub async fn start(&self) -> Result<(), SessionError> {
        let fixture = self.bridge.get_fixture_list().and_then(|raw| {
            let trimmed = raw.trim().to_string();
            (!trimmed.is_empty()).then_some(trimmed)
        });
        let test_mode = fixture.is_some();

        let session_id = Uuid::new_v4().to_string();
        {
            let mut state = self.state.lock().await;
            if state.feed.is_some() || state.phase == SessionPhase::Tracking {
                warn!("previous session still active, force-stopping it");
            }
            state.feed = None;
            state.trajectory.clear();
            state.report = None;
            state.artifact = None;
            state.resend_mode = false;
            state.sampler.begin(test_mode, false);
            state.session_id = Some(session_id.clone());
            state.phase = SessionPhase::Tracking;
        }
        info!("session {session_id} started (test_mode={test_mode})");
        self.emit(SessionEvent::Started);

        if let Some(raw) = fixture {
            let points = parse_fixture_list(&raw);
            self.emit_message(format!("replaying {} scripted fixes", points.len()));
            let source = ScriptedLocationSource::new(
                points,
                self.config.feed.replay_interval,
                self.config.feed.settle_delay,
            );
            self.spawn_feed(session_id, Box::new(source)).await;
        } else {
            self.emit_message("live positioning started");
            let source = LiveLocationSource::new(
                self.location.clone(),
                self.geometry.clone(),
                self.config.feed.startup_timeout,
            );
            self.spawn_feed(session_id, Box::new(source)).await;
        }
        Ok(())
    }

    /// End recording and run the analysis pipeline. Tracking ends
    /// immediately; whatever fails afterwards can no longer leave a live
    /// feed dangling.
    pub async fn stop(&self) -> Result<StopOutcome, SessionError> {
        let points = {
            let mut state = self.state.lock().await;
            if state.phase != SessionPhase::Tracking {
                return Err(SessionError::NotTracking);
            }
            state.phase = SessionPhase::Stopping;
            state.feed = None;
            state.trajectory.points().to_vec()
        };
        self.emit(SessionEvent::Stopped);

        if points.len() < 2 {
            self.emit_message("not enough trajectory points, need at least 2");
            self.state.lock().await.phase = SessionPhase::Idle;
            return Ok(StopOutcome::InsufficientPoints { have: points.len() });
        }

        info!("route recording complete, {} points", points.len());
        self.emit_message("analyzing route");
        self.state.lock().await.phase = SessionPhase::Analyzing;

        let (artifact, report) = match self.run_stop_pipeline(&points).await {
            Ok(result) => result,
            Err(err) => {
                error!("route analysis failed: {err}");
                self.emit_message(format!("route analysis failed: {err}"));
                self.state.lock().await.phase = SessionPhase::Idle;
                return Err(err);
            }
        };

        // Persisted before confirmation, and regardless of whether anything
        // was found: a failed or skipped submission must stay resendable.
        match artifact.to_json() {
            Ok(json) => self.artifacts.persist(&json).await,
            Err(err) => warn!("artifact not persisted: {err:#}"),
        }

        let summary = ConfirmationSummary {
            device_counts: report.counts.clone(),
            pole_devices: report.pole_assets.clone(),
            other_devices: report.other_assets.clone(),
            point_count: artifact.track_points.len(),
            screenshot: artifact.screenshot.clone(),
        };
        let has_assets = report.has_assets;
        {
            let mut state = self.state.lock().await;
            state.report = Some(report);
            state.artifact = Some(artifact);
            state.phase = if has_assets {
                SessionPhase::AwaitingConfirmation
            } else {
                SessionPhase::Idle
            };
        }

        if !has_assets {
            self.emit_message("no assets found along the route");
            return Ok(StopOutcome::NoAssets);
        }
        self.emit(SessionEvent::ConfirmationRequested { summary });
        Ok(StopOutcome::ConfirmationPending)
    }

    /// Submit the current artifact through the host bridge. Local state is
    /// not cleared here; the caller clears once the host confirms receipt,
    /// so a failed upload stays resendable.
    pub async fn confirm_and_send(&self) -> Result<(), SessionError> {
        let artifact = self.state.lock().await.artifact.clone();
        let Some(artifact) = artifact else {
            self.emit_message("nothing to send");
            return Err(SessionError::MissingScreenshot);
        };
        if artifact.screenshot.is_empty() {
            self.emit_message("screenshot data is missing");
            return Err(SessionError::MissingScreenshot);
        }
        if artifact.track_points.is_empty() {
            self.emit_message("trajectory data is missing");
            return Err(SessionError::InsufficientPoints { have: 0 });
        }

        let json = artifact
            .to_json()
            .map_err(|err| SessionError::Encoding(err.to_string()))?;
        match self.bridge.send_artifact(&json).await {
            Ok(()) => {
                info!("artifact handed to host, {} bytes", json.len());
                self.state.lock().await.phase = SessionPhase::Sent;
                self.emit_message("uploading inspection record");
                Ok(())
            }
            Err(BridgeError::Unavailable) => {
                self.emit_message("submission bridge unavailable, record kept for resend");
                Err(SessionError::SubmissionUnavailable)
            }
            Err(err) => {
                self.emit_message(format!("submission failed: {err}"));
                Err(SessionError::Submission(err.to_string()))
            }
        }
    }

    /// Abandon the current route and tear everything down.
    pub async fn cancel_track(&self) {
        self.state.lock().await.phase = SessionPhase::Cancelled;
        self.emit_message("cancelled");
        self.clear_track().await;
    }

    /// Unconditional teardown of feed, rendering and session state.
    pub async fn clear_track(&self) {
        let mut state = self.state.lock().await;
        state.feed = None;
        state.trajectory.clear();
        state.sampler.reset();
        state.report = None;
        state.artifact = None;
        state.session_id = None;
        state.resend_mode = false;
        state.phase = SessionPhase::Idle;
        debug!("session state cleared");
    }

    /// Replay the last persisted route and regenerate its screenshot and
    /// analysis against current map state.
    pub async fn resend_last_track(&self) -> Result<(), SessionError> {
        {
            let state = self.state.lock().await;
            if matches!(
                state.phase,
                SessionPhase::Tracking | SessionPhase::Stopping | SessionPhase::Analyzing
            ) {
                drop(state);
                self.emit_message("stop the current recording first");
                return Err(SessionError::AlreadyTracking);
            }
        }

        let Some(json) = self.artifacts.load().await else {
            self.emit_message("no stored route to resend");
            return Err(SessionError::NoStoredArtifact);
        };
        let artifact = match SessionArtifact::from_json(&json) {
            Ok(artifact) => artifact,
            Err(err) => {
                warn!("stored artifact unreadable: {err:#}");
                self.emit_message("stored route data is unreadable");
                return Err(SessionError::IncompleteArtifact("unreadable json"));
            }
        };
        if artifact.track_points.is_empty() {
            self.emit_message("stored route has no trajectory points");
            return Err(SessionError::IncompleteArtifact("no trajectory points"));
        }
        if artifact.screenshot.is_empty() {
            self.emit_message("stored route is missing its screenshot");
            return Err(SessionError::IncompleteArtifact("missing screenshot"));
        }

        info!(
            "resending stored route, {} points",
            artifact.track_points.len()
        );
        self.emit_message("found stored route, replaying");

        let session_id = Uuid::new_v4().to_string();
        {
            let mut state = self.state.lock().await;
            state.feed = None;
            state.trajectory.clear();
            state.report = None;
            state.artifact = None;
            // Replayed points already passed gating once: no warm-up, no
            // spacing checks.
            state.sampler.begin(true, true);
            state.resend_mode = true;
            state.session_id = Some(session_id.clone());
            state.phase = SessionPhase::Tracking;
        }
        self.emit(SessionEvent::Started);

        let source = ScriptedLocationSource::new(
            artifact.track_points,
            self.config.feed.replay_interval,
            self.config.feed.resend_settle_delay,
        );
        self.spawn_feed(session_id, Box::new(source)).await;
        Ok(())
    }

    pub async fn is_tracking(&self) -> bool {
        self.state.lock().await.phase == SessionPhase::Tracking
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().await;
        let report = state.report.as_ref();
        SessionSnapshot {
            phase: state.phase,
            is_tracking: state.phase == SessionPhase::Tracking,
            point_count: state.trajectory.len(),
            warming_up: state.phase == SessionPhase::Tracking && state.sampler.warming_up(),
            pole_devices: report.map(|r| r.pole_assets.clone()).unwrap_or_default(),
            other_devices: report.map(|r| r.other_assets.clone()).unwrap_or_default(),
            device_counts: report.map(|r| r.counts.clone()).unwrap_or_default(),
            has_screenshot: state
                .artifact
                .as_ref()
                .map(|a| !a.screenshot.is_empty())
                .unwrap_or(false),
        }
    }

    async fn spawn_feed(&self, session_id: String, source: Box<dyn LocationSource>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = source.start(tx);
        self.state.lock().await.feed = Some(handle);
        let controller = self.clone();
        tokio::spawn(async move {
            controller.run_feed_pump(session_id, rx).await;
        });
    }

    /// Drain one feed's signals into the sampler. The session id pins the
    /// pump to its own session; signals racing in after a restart are
    /// dropped on the floor.
    async fn run_feed_pump(&self, session_id: String, mut signals: mpsc::UnboundedReceiver<FeedSignal>) {
        while let Some(signal) = signals.recv().await {
            match signal {
                FeedSignal::Fix(point) => self.ingest_fix(&session_id, point).await,
                FeedSignal::Fault(FeedError::PermissionDenied) => {
                    self.abort_session(&session_id, "location permission denied, recording stopped")
                        .await;
                }
                FeedSignal::Fault(err) => {
                    // Transient; the subscription keeps running.
                    self.emit_message(format!("location error: {err}"));
                }
                FeedSignal::Exhausted => {
                    self.emit_message("replay complete, analyzing route");
                    match self.stop().await {
                        Ok(outcome) => debug!("auto-stop finished: {outcome:?}"),
                        Err(err) => warn!("auto-stop failed: {err}"),
                    }
                }
            }
        }
        // Channel closed without a stop() handover: the feed died while we
        // were still tracking.
        self.abort_session(&session_id, "location feed ended, recording stopped")
            .await;
    }

    async fn ingest_fix(&self, session_id: &str, point: TrackPoint) {
        let (accepted, point_count, warming_up, resend_mode) = {
            let mut state = self.state.lock().await;
            if state.phase != SessionPhase::Tracking
                || state.session_id.as_deref() != Some(session_id)
            {
                return;
            }
            let decision = state.sampler.evaluate(point);
            if decision.accepted() {
                state.trajectory.push(point);
            }
            (
                decision.accepted(),
                state.trajectory.len(),
                state.sampler.warming_up(),
                state.resend_mode,
            )
        };

        if accepted {
            debug!("vertex #{point_count} recorded");
            self.emit(SessionEvent::Status {
                point_count,
                warming_up,
            });
        }

        // Keep the camera on the walker whatever the sampler decided.
        let duration = if resend_mode {
            self.config.framing.resend_follow_duration
        } else {
            self.config.framing.follow_duration
        };
        let options = GoToOptions {
            animate: true,
            duration,
        };
        if let Err(err) = self.view.go_to(GoToTarget::Point(point), options).await {
            debug!("map follow failed: {err:#}");
        }
    }

    /// Hard-failure exit from Tracking back to Idle. No-op unless the named
    /// session is still the live one.
    async fn abort_session(&self, session_id: &str, reason: &str) {
        {
            let mut state = self.state.lock().await;
            if state.phase != SessionPhase::Tracking
                || state.session_id.as_deref() != Some(session_id)
            {
                return;
            }
            state.feed = None;
            state.trajectory.clear();
            state.sampler.reset();
            state.report = None;
            state.artifact = None;
            state.phase = SessionPhase::Idle;
        }
        warn!("session {session_id} aborted: {reason}");
        self.emit_message(reason);
        self.emit(SessionEvent::Stopped);
    }

    /// Frame, settle, photograph, sweep. Runs once per stop; any failure is
    /// fatal to the analysis but never to the session's consistency.
    async fn run_stop_pipeline(
        &self,
        points: &[TrackPoint],
    ) -> Result<(SessionArtifact, AnalysisReport), SessionError> {
        if let Some(extent) = self.geometry.extent(points) {
            // The go_to future can resolve before the animation visually
            // finishes; the updating flag is the real completion signal.
            self.view
                .go_to(
                    GoToTarget::Extent(extent.expand(self.config.framing.extent_expand)),
                    GoToOptions {
                        animate: true,
                        duration: self.config.framing.frame_duration,
                    },
                )
                .await
                .map_err(|err| SessionError::Render(format!("route framing failed: {err:#}")))?;
            self.capture.await_view_idle(&self.view).await;
        }

        self.capture.wait_until_settled(&self.view).await;

        let (width, height) = self.view.view_size();
        let screenshot = self
            .view
            .take_screenshot(ScreenshotRequest {
                format: ImageFormat::Png,
                quality: self.config.framing.screenshot_quality,
                width,
                height,
            })
            .await
            .map_err(|err| SessionError::Render(format!("screenshot failed: {err:#}")))?;
        info!(
            "screenshot captured, {}x{}",
            screenshot.width, screenshot.height
        );

        let report = self.analyzer.analyze(points, &self.catalog).await?;

        let artifact = SessionArtifact {
            track_points: points.to_vec(),
            timestamp: Utc::now().timestamp_millis(),
            pole_devices: report.pole_assets.clone(),
            other_devices: report.other_assets.clone(),
            device_counts: report.counts.clone(),
            screenshot: screenshot.to_data_url(),
        };
        Ok((artifact, report))
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("session event receiver dropped");
        }
    }

    fn emit_message(&self, text: impl Into<String>) {
        self.emit(SessionEvent::Message { text: text.into() });
    }
}
