use std::sync::Arc;

use log::warn;

use crate::models::TrackPoint;
use crate::view::{GraphicHandle, MapView};

/// Owns the accepted route vertices and the single rendered route line.
///
/// The line is replaced, not extended, on every accepted point: the render
/// backend gives no incremental-append guarantee for polyline graphics.
pub struct TrajectoryStore {
    view: Arc<dyn MapView>,
    points: Vec<TrackPoint>,
    line: Option<GraphicHandle>,
}

impl TrajectoryStore {
    pub fn new(view: Arc<dyn MapView>) -> Self {
        Self {
            view,
            points: Vec::new(),
            line: None,
        }
    }

    pub fn push(&mut self, point: TrackPoint) {
        self.points.push(point);
        self.redraw();
    }

    /// Remove the rendered line and drop all vertices.
    pub fn clear(&mut self) {
        if let Some(handle) = self.line.take() {
            self.view.remove_graphic(handle);
        }
        self.points.clear();
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn redraw(&mut self) {
        // A line needs two vertices; with fewer there is nothing to draw.
        if self.points.len() < 2 {
            return;
        }
        if let Some(handle) = self.line.take() {
            self.view.remove_graphic(handle);
        }
        match self.view.add_route_line(&self.points) {
            Ok(handle) => self.line = Some(handle),
            // Render failures must never interrupt sampling.
            Err(err) => warn!("route line render failed: {err:#}"),
        }
    }
}
