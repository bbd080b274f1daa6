use std::sync::Arc;

use log::debug;
use tokio::time::MissedTickBehavior;

use crate::config::CaptureConfig;
use crate::view::MapView;

/// Gates the screenshot on the view's final rendered state.
///
/// The settle sequence is ordered deliberately: the view can start a fresh
/// redraw after its layers finish, and an animation can still be in flight
/// after all redraw flags clear. Skipping a step risks capturing a
/// half-drawn basemap or a mid-pan frame.
#[derive(Clone)]
pub struct CaptureSynchronizer {
    config: CaptureConfig,
}

impl CaptureSynchronizer {
    pub fn new(config: CaptureConfig) -> Self {
        Self { config }
    }

    /// Block until the view is safe to photograph.
    pub async fn wait_until_settled(&self, view: &Arc<dyn MapView>) {
        // View idle first.
        self.wait_for(|| !view.updating()).await;
        debug!("view redraw complete");

        // Then every rendered layer.
        for layer in view.layer_views() {
            self.wait_for(|| !layer.updating()).await;
            debug!("layer settled: {}", layer.title());
        }

        // A late redraw can begin after the first check.
        if view.updating() {
            self.wait_for(|| !view.updating()).await;
        }

        // Any in-flight pan or zoom has to land.
        if view.animating() {
            self.wait_for(|| !view.animating()).await;
            debug!("animation complete");
        }

        // Yield frame boundaries so the compositor settles.
        for _ in 0..self.config.frame_yields {
            view.await_frame().await;
        }

        // Final flag re-check after the yielded frames.
        if view.updating() || view.animating() {
            self.wait_for(|| !view.updating() && !view.animating()).await;
        }

        // Base-layer tiles can keep streaming in past every flag above.
        tokio::time::sleep(self.config.post_settle_delay).await;
        debug!("capture settle complete");
    }

    /// Wait for the view's updating flag to clear. Used after navigations
    /// whose future resolves before the animation visually finishes.
    pub async fn await_view_idle(&self, view: &Arc<dyn MapView>) {
        self.wait_for(|| !view.updating()).await;
    }

    /// The "become true" primitive: poll until the predicate holds.
    async fn wait_for(&self, mut predicate: impl FnMut() -> bool) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if predicate() {
                return;
            }
        }
    }
}
