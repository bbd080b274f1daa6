use std::time::Duration;

use log::{debug, info};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::{FeedHandle, FeedSignal, LocationSource};
use crate::models::TrackPoint;

/// Scripted feed: replays an ordered list of local-frame points on a fixed
/// cadence, then signals exhaustion after a short settle delay. Used for
/// deterministic test fixtures and for resend replays.
pub struct ScriptedLocationSource {
    points: Vec<TrackPoint>,
    replay_interval: Duration,
    settle_delay: Duration,
}

impl ScriptedLocationSource {
    pub fn new(points: Vec<TrackPoint>, replay_interval: Duration, settle_delay: Duration) -> Self {
        Self {
            points,
            replay_interval,
            settle_delay,
        }
    }
}

impl LocationSource for ScriptedLocationSource {
    fn start(&self, sink: mpsc::UnboundedSender<FeedSignal>) -> FeedHandle {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_script(
            self.points.clone(),
            self.replay_interval,
            self.settle_delay,
            sink,
            cancel.clone(),
        ));
        FeedHandle::new(cancel, task)
    }
}

async fn run_script(
    points: Vec<TrackPoint>,
    replay_interval: Duration,
    settle_delay: Duration,
    sink: mpsc::UnboundedSender<FeedSignal>,
    cancel: CancellationToken,
) {
    info!("replaying {} scripted fixes", points.len());
    let mut ticker = tokio::time::interval(replay_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    for (index, point) in points.iter().enumerate() {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("scripted feed cancelled at fix {index}");
                return;
            }
            _ = ticker.tick() => {
                debug!("scripted fix {}/{}", index + 1, points.len());
                if sink.send(FeedSignal::Fix(*point)).is_err() {
                    return;
                }
            }
        }
    }

    // Let the last follow animation land before asking for the stop.
    tokio::select! {
        _ = cancel.cancelled() => {}
        _ = tokio::time::sleep(settle_delay) => {
            info!("scripted feed exhausted");
            let _ = sink.send(FeedSignal::Exhausted);
        }
    }
}

/// Parse a host fixture string of the form `"x1,y1 x2,y2 ..."`. Pairs that
/// do not parse as numbers are skipped; order is preserved.
pub fn parse_fixture_list(raw: &str) -> Vec<TrackPoint> {
    raw.split_whitespace()
        .filter_map(|pair| {
            let (x, y) = pair.split_once(',')?;
            Some(TrackPoint::new(
                x.trim().parse().ok()?,
                y.trim().parse().ok()?,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whitespace_separated_pairs() {
        let points = parse_fixture_list("297627,2772063 297628,2771939  297630,2771754");
        assert_eq!(
            points,
            vec![
                TrackPoint::new(297627.0, 2772063.0),
                TrackPoint::new(297628.0, 2771939.0),
                TrackPoint::new(297630.0, 2771754.0),
            ]
        );
    }

    #[test]
    fn skips_malformed_pairs_and_keeps_order() {
        let points = parse_fixture_list("0,0 nonsense 1,one 2,20 ,5 3,30");
        assert_eq!(
            points,
            vec![
                TrackPoint::new(0.0, 0.0),
                TrackPoint::new(2.0, 20.0),
                TrackPoint::new(3.0, 30.0),
            ]
        );
    }

    #[test]
    fn empty_input_parses_to_nothing() {
        assert!(parse_fixture_list("   ").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn replays_on_cadence_then_signals_exhausted_once() {
        let points = vec![TrackPoint::new(0.0, 0.0), TrackPoint::new(0.0, 10.0)];
        let source = ScriptedLocationSource::new(
            points.clone(),
            Duration::from_secs(1),
            Duration::from_secs(1),
        );

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _handle = source.start(tx);

        assert_eq!(rx.recv().await, Some(FeedSignal::Fix(points[0])));
        assert_eq!(rx.recv().await, Some(FeedSignal::Fix(points[1])));
        assert_eq!(rx.recv().await, Some(FeedSignal::Exhausted));
        // Sender dropped after exhaustion; no further signals.
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_stops_the_replay() {
        let points: Vec<_> = (0..100).map(|i| TrackPoint::new(0.0, i as f64)).collect();
        let source =
            ScriptedLocationSource::new(points, Duration::from_secs(1), Duration::from_secs(1));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = source.start(tx);

        assert!(matches!(rx.recv().await, Some(FeedSignal::Fix(_))));
        handle.stop();

        // Drain whatever raced in; the channel must close without Exhausted.
        while let Some(signal) = rx.recv().await {
            assert!(matches!(signal, FeedSignal::Fix(_)));
        }
    }
}
