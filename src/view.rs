use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::geometry::Extent;
use crate::models::TrackPoint;

/// Target of a view navigation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GoToTarget {
    Point(TrackPoint),
    Extent(Extent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoToOptions {
    pub animate: bool,
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    fn mime(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenshotRequest {
    pub format: ImageFormat,
    pub quality: u8,
    pub width: u32,
    pub height: u32,
}

/// An encoded capture as produced by the render backend.
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub format: ImageFormat,
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Screenshot {
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime(),
            BASE64.encode(&self.data)
        )
    }
}

/// Opaque handle to a graphic owned by the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphicHandle(pub u64);

/// Drawing status of one rendered layer.
pub trait LayerView: Send + Sync {
    fn title(&self) -> String;

    /// True while the layer still has redraw work pending.
    fn updating(&self) -> bool;
}

/// The map view this pipeline draws on and photographs. One instance per
/// session controller; nothing else mutates it.
#[async_trait]
pub trait MapView: Send + Sync {
    /// Navigate the camera. The returned future may resolve before the
    /// animation visually completes; callers that depend on final state
    /// must also await the updating flag.
    async fn go_to(&self, target: GoToTarget, options: GoToOptions) -> Result<()>;

    /// True while the view has redraw work pending.
    fn updating(&self) -> bool;

    /// True while a pan or zoom animation is in flight.
    fn animating(&self) -> bool;

    fn layer_views(&self) -> Vec<Arc<dyn LayerView>>;

    /// Resolve at the next render-frame boundary.
    async fn await_frame(&self);

    async fn take_screenshot(&self, request: ScreenshotRequest) -> Result<Screenshot>;

    /// Current viewport size in pixels, `(width, height)`.
    fn view_size(&self) -> (u32, u32);

    /// Draw a route polyline through the given vertices.
    fn add_route_line(&self, points: &[TrackPoint]) -> Result<GraphicHandle>;

    fn remove_graphic(&self, handle: GraphicHandle);
}
