mod live;
mod scripted;

pub use live::LiveLocationSource;
pub use scripted::{parse_fixture_list, ScriptedLocationSource};

use async_trait::async_trait;
use log::debug;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::FeedError;
use crate::geometry::GeoFix;
use crate::models::TrackPoint;

/// What a running feed delivers to the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeedSignal {
    /// A position in the local planar frame, ready for the sampler.
    Fix(TrackPoint),
    /// A structured feed fault. Surfaced to the user, never swallowed.
    Fault(FeedError),
    /// Scripted feeds only: the script ran out, stop the session.
    Exhausted,
}

/// Raw events from the device positioning backend, in the global frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackendEvent {
    Fix(GeoFix),
    Fault(FeedError),
}

/// Long-lived device position subscription.
#[async_trait]
pub trait LocationBackend: Send + Sync {
    /// Open the subscription. Errors here are startup failures (permission
    /// refusals and the like); once the receiver exists, faults arrive
    /// in-band as [`BackendEvent::Fault`].
    async fn subscribe(&self) -> Result<mpsc::Receiver<BackendEvent>, FeedError>;
}

/// Strategy over the live / scripted feed duality. Both variants push
/// [`FeedSignal`]s into the supplied sink until stopped.
pub trait LocationSource: Send + Sync {
    fn start(&self, sink: mpsc::UnboundedSender<FeedSignal>) -> FeedHandle;
}

/// Owns a running feed task. Stopping (or dropping) the handle cancels the
/// task, so a restarted session can never leave an orphaned feed behind.
pub struct FeedHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl FeedHandle {
    pub(crate) fn new(cancel: CancellationToken, task: JoinHandle<()>) -> Self {
        Self { cancel, task }
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.task.abort();
        debug!("location feed torn down");
    }
}
