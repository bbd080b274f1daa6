mod controller;

pub use controller::{SessionBackends, SessionController};

use serde::Serialize;
use tokio::sync::mpsc;

use crate::models::AssetCounts;

/// Lifecycle phase of the inspection session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    Idle,
    Tracking,
    Stopping,
    Analyzing,
    AwaitingConfirmation,
    Sent,
    Cancelled,
}

impl Default for SessionPhase {
    fn default() -> Self {
        SessionPhase::Idle
    }
}

/// What the confirmation step needs to render: the classified asset lists,
/// the tallies, and the framed screenshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationSummary {
    pub device_counts: AssetCounts,
    pub pole_devices: Vec<String>,
    pub other_devices: Vec<String>,
    pub point_count: usize,
    /// PNG data URL.
    pub screenshot: String,
}

/// Typed notifications surfaced to the embedding UI.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum SessionEvent {
    Started,
    Stopped,
    Status {
        point_count: usize,
        warming_up: bool,
    },
    Message {
        text: String,
    },
    ConfirmationRequested {
        summary: ConfirmationSummary,
    },
}

/// Terminal result of a completed `stop()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Assets were found; the caller owns the confirm/cancel decision.
    ConfirmationPending,
    /// Analysis ran clean but the corridor was empty.
    NoAssets,
    /// Fewer than two accepted points; no artifact was produced.
    InsufficientPoints { have: usize },
}

pub type SessionEventSender = mpsc::UnboundedSender<SessionEvent>;
pub type SessionEventReceiver = mpsc::UnboundedReceiver<SessionEvent>;
