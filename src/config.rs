use std::time::Duration;

/// Tunables for the fix-acceptance state machine.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Fixes discarded up front while the positioning source stabilises.
    pub warmup_fixes: u32,

    /// Reject fixes closer than this to the prior accepted point (jitter).
    pub min_distance_m: f64,

    /// Reject fixes farther than this (fix drift or discontinuity).
    pub max_distance_m: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            warmup_fixes: 2,
            min_distance_m: 2.0,
            max_distance_m: 50.0,
        }
    }
}

/// Cadence and startup behaviour of the location feeds.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Spacing between scripted fixes.
    pub replay_interval: Duration,

    /// Pause after the last scripted fix before the auto-stop signal.
    pub settle_delay: Duration,

    /// Same, for resend replays; slightly longer so the slower follow
    /// animation finishes first.
    pub resend_settle_delay: Duration,

    /// How long the live feed waits for a first fix before surfacing a
    /// visible timeout. The subscription itself is never bounded.
    pub startup_timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            replay_interval: Duration::from_secs(1),
            settle_delay: Duration::from_secs(1),
            resend_settle_delay: Duration::from_millis(1500),
            startup_timeout: Duration::from_secs(10),
        }
    }
}

/// Screenshot settle behaviour.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Polling cadence of the "wait until idle" primitive.
    pub poll_interval: Duration,

    /// Render-frame boundaries yielded so the compositor settles.
    pub frame_yields: u32,

    /// Final fixed wait before the capture is declared ready. Empirical
    /// allowance for slow base-layer tile loads.
    pub post_settle_delay: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(50),
            frame_yields: 3,
            post_settle_delay: Duration::from_secs(3),
        }
    }
}

/// View framing and screenshot parameters.
#[derive(Debug, Clone)]
pub struct FramingConfig {
    /// Recenter animation while following live fixes.
    pub follow_duration: Duration,

    /// Recenter animation while replaying a stored route.
    pub resend_follow_duration: Duration,

    /// Zoom-to-route animation at stop time.
    pub frame_duration: Duration,

    /// Margin applied to the route extent before framing.
    pub extent_expand: f64,

    /// Encoder quality for the captured screenshot.
    pub screenshot_quality: u8,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            follow_duration: Duration::from_millis(200),
            resend_follow_duration: Duration::from_millis(500),
            frame_duration: Duration::from_secs(1),
            extent_expand: 1.5,
            screenshot_quality: 95,
        }
    }
}

/// Corridor width of the stop-time discovery queries.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Buffer radius around the walked route, metres each side.
    pub buffer_distance_m: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            buffer_distance_m: 20.0,
        }
    }
}

/// Aggregate configuration for one inspection pipeline.
#[derive(Debug, Clone, Default)]
pub struct InspectionConfig {
    pub sampler: SamplerConfig,
    pub feed: FeedConfig,
    pub capture: CaptureConfig,
    pub framing: FramingConfig,
    pub analyzer: AnalyzerConfig,
}
