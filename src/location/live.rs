use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{BackendEvent, FeedHandle, FeedSignal, LocationBackend, LocationSource};
use crate::error::FeedError;
use crate::geometry::GeometryEngine;

/// Continuous device-location feed. Geographic fixes are reprojected into
/// the local planar frame before they reach the sampler.
pub struct LiveLocationSource {
    backend: Arc<dyn LocationBackend>,
    geometry: Arc<dyn GeometryEngine>,
    startup_timeout: Duration,
}

impl LiveLocationSource {
    pub fn new(
        backend: Arc<dyn LocationBackend>,
        geometry: Arc<dyn GeometryEngine>,
        startup_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            geometry,
            startup_timeout,
        }
    }
}

impl LocationSource for LiveLocationSource {
    fn start(&self, sink: mpsc::UnboundedSender<FeedSignal>) -> FeedHandle {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_live_feed(
            self.backend.clone(),
            self.geometry.clone(),
            self.startup_timeout,
            sink,
            cancel.clone(),
        ));
        FeedHandle::new(cancel, task)
    }
}

async fn run_live_feed(
    backend: Arc<dyn LocationBackend>,
    geometry: Arc<dyn GeometryEngine>,
    startup_timeout: Duration,
    sink: mpsc::UnboundedSender<FeedSignal>,
    cancel: CancellationToken,
) {
    let mut events = match backend.subscribe().await {
        Ok(receiver) => receiver,
        Err(err) => {
            warn!("location subscription failed: {err}");
            let _ = sink.send(FeedSignal::Fault(err));
            return;
        }
    };
    info!("live location feed started");

    // The first fix can take a while on a cold receiver. Surface a visible
    // timeout if it never arrives, but keep the subscription running: the
    // watch itself is unbounded.
    let startup_probe = tokio::time::sleep(startup_timeout);
    tokio::pin!(startup_probe);
    let mut probe_armed = true;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("live location feed stopped");
                break;
            }
            _ = &mut startup_probe, if probe_armed => {
                probe_armed = false;
                warn!("no location fix within {startup_timeout:?}");
                let _ = sink.send(FeedSignal::Fault(FeedError::Timeout));
            }
            event = events.recv() => {
                match event {
                    Some(BackendEvent::Fix(fix)) => {
                        probe_armed = false;
                        let point = geometry.project(fix);
                        if sink.send(FeedSignal::Fix(point)).is_err() {
                            break;
                        }
                    }
                    Some(BackendEvent::Fault(err)) => {
                        warn!("location backend fault: {err}");
                        if sink.send(FeedSignal::Fault(err)).is_err() {
                            break;
                        }
                    }
                    None => {
                        info!("location backend closed the subscription");
                        break;
                    }
                }
            }
        }
    }
}
