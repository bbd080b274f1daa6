use std::sync::Arc;

use log::debug;

use crate::config::SamplerConfig;
use crate::geometry::GeometryEngine;
use crate::models::TrackPoint;

/// Where the sampler sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerPhase {
    Idle,
    WarmingUp,
    Sampling,
}

/// Outcome of feeding one fix through the acceptance gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleDecision {
    /// Fix accepted as route vertex number `index` (1-based).
    Accepted { index: usize },
    /// Fix consumed by the warm-up window.
    WarmingUp { seen: u32, required: u32 },
    /// Closer than the minimum spacing to the prior vertex; jitter.
    TooClose { metres: f64 },
    /// Farther than the maximum spacing; likely drift or a discontinuity.
    TooFar { metres: f64 },
}

impl SampleDecision {
    pub fn accepted(&self) -> bool {
        matches!(self, SampleDecision::Accepted { .. })
    }
}

/// Decides, fix by fix, which raw positions become route vertices.
///
/// Normal sessions discard a short warm-up window and then gate on spacing
/// to the prior accepted point. Scripted fixtures run in test mode, which
/// accepts every fix so replays are deterministic; resend replays
/// additionally mark resend mode, since their points already passed gating
/// when first captured.
pub struct PointSampler {
    config: SamplerConfig,
    geometry: Arc<dyn GeometryEngine>,
    phase: SamplerPhase,
    warmup_seen: u32,
    last_accepted: Option<TrackPoint>,
    accepted_count: usize,
    test_mode: bool,
    resend_mode: bool,
}

impl PointSampler {
    pub fn new(config: SamplerConfig, geometry: Arc<dyn GeometryEngine>) -> Self {
        Self {
            config,
            geometry,
            phase: SamplerPhase::Idle,
            warmup_seen: 0,
            last_accepted: None,
            accepted_count: 0,
            test_mode: false,
            resend_mode: false,
        }
    }

    /// Arm the sampler for a new session.
    pub fn begin(&mut self, test_mode: bool, resend_mode: bool) {
        self.warmup_seen = 0;
        self.last_accepted = None;
        self.accepted_count = 0;
        self.test_mode = test_mode;
        self.resend_mode = resend_mode;
        self.phase = if test_mode || resend_mode || self.config.warmup_fixes == 0 {
            SamplerPhase::Sampling
        } else {
            SamplerPhase::WarmingUp
        };
    }

    /// Return to idle, dropping all per-session state.
    pub fn reset(&mut self) {
        self.begin(false, false);
        self.phase = SamplerPhase::Idle;
    }

    pub fn evaluate(&mut self, point: TrackPoint) -> SampleDecision {
        // Replayed and scripted fixes are pre-validated; no warm-up, no gates.
        if self.resend_mode || self.test_mode {
            return self.accept(point);
        }

        if self.warmup_seen < self.config.warmup_fixes {
            self.warmup_seen += 1;
            if self.warmup_seen >= self.config.warmup_fixes {
                self.phase = SamplerPhase::Sampling;
            }
            debug!(
                "warming up {}/{}",
                self.warmup_seen, self.config.warmup_fixes
            );
            return SampleDecision::WarmingUp {
                seen: self.warmup_seen,
                required: self.config.warmup_fixes,
            };
        }

        // First real vertex establishes the route.
        let Some(prior) = self.last_accepted else {
            return self.accept(point);
        };

        let metres = self.geometry.distance_m(prior, point);
        if metres < self.config.min_distance_m {
            debug!("fix rejected, {metres:.2} m is under the minimum spacing");
            return SampleDecision::TooClose { metres };
        }
        if metres > self.config.max_distance_m {
            debug!("fix rejected, {metres:.2} m looks like drift");
            return SampleDecision::TooFar { metres };
        }
        self.accept(point)
    }

    fn accept(&mut self, point: TrackPoint) -> SampleDecision {
        self.phase = SamplerPhase::Sampling;
        self.last_accepted = Some(point);
        self.accepted_count += 1;
        SampleDecision::Accepted {
            index: self.accepted_count,
        }
    }

    pub fn phase(&self) -> SamplerPhase {
        self.phase
    }

    /// True while the warm-up window is still consuming fixes.
    pub fn warming_up(&self) -> bool {
        !self.test_mode
            && !self.resend_mode
            && self.warmup_seen < self.config.warmup_fixes
    }

    pub fn accepted_count(&self) -> usize {
        self.accepted_count
    }

    pub fn test_mode(&self) -> bool {
        self.test_mode
    }

    pub fn resend_mode(&self) -> bool {
        self.resend_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PlanarEngine;

    fn sampler() -> PointSampler {
        PointSampler::new(
            SamplerConfig::default(),
            Arc::new(PlanarEngine::new(121.0, 25.0)),
        )
    }

    #[test]
    fn warmup_consumes_first_two_fixes() {
        let mut sampler = sampler();
        sampler.begin(false, false);

        // Five fixes, evenly spaced 10 m apart: 1 and 2 warm up, 3 to 5 land.
        let decisions: Vec<_> = (0..5)
            .map(|i| sampler.evaluate(TrackPoint::new(0.0, i as f64 * 10.0)))
            .collect();

        assert_eq!(
            decisions[0],
            SampleDecision::WarmingUp {
                seen: 1,
                required: 2
            }
        );
        assert_eq!(
            decisions[1],
            SampleDecision::WarmingUp {
                seen: 2,
                required: 2
            }
        );
        assert!(decisions[2..].iter().all(SampleDecision::accepted));
        assert_eq!(sampler.accepted_count(), 3);
    }

    #[test]
    fn first_post_warmup_fix_is_always_accepted() {
        let mut sampler = sampler();
        sampler.begin(false, false);
        sampler.evaluate(TrackPoint::new(0.0, 0.0));
        sampler.evaluate(TrackPoint::new(0.0, 0.0));

        // No prior vertex yet, so spacing does not apply.
        assert!(sampler.evaluate(TrackPoint::new(1000.0, 1000.0)).accepted());
    }

    #[test]
    fn spacing_gates_apply_after_first_vertex() {
        let mut sampler = sampler();
        sampler.begin(false, false);
        sampler.evaluate(TrackPoint::new(0.0, 0.0));
        sampler.evaluate(TrackPoint::new(0.0, 0.0));
        assert!(sampler.evaluate(TrackPoint::new(0.0, 0.0)).accepted());

        assert_eq!(
            sampler.evaluate(TrackPoint::new(0.0, 1.0)),
            SampleDecision::TooClose { metres: 1.0 }
        );
        assert_eq!(
            sampler.evaluate(TrackPoint::new(0.0, 60.0)),
            SampleDecision::TooFar { metres: 60.0 }
        );
        assert!(sampler.evaluate(TrackPoint::new(0.0, 10.0)).accepted());
        assert_eq!(sampler.accepted_count(), 2);
    }

    #[test]
    fn test_mode_accepts_every_fix_regardless_of_spacing() {
        let mut sampler = sampler();
        sampler.begin(true, false);

        let points = [
            TrackPoint::new(0.0, 0.0),
            TrackPoint::new(0.0, 0.5),
            TrackPoint::new(0.0, 900.0),
            TrackPoint::new(0.0, 900.1),
        ];
        for p in points {
            assert!(sampler.evaluate(p).accepted());
        }
        assert_eq!(sampler.accepted_count(), points.len());
        assert!(!sampler.warming_up());
    }

    #[test]
    fn resend_mode_bypasses_warmup() {
        let mut sampler = sampler();
        sampler.begin(true, true);
        assert_eq!(sampler.phase(), SamplerPhase::Sampling);
        assert!(sampler.evaluate(TrackPoint::new(5.0, 5.0)).accepted());
        assert_eq!(sampler.accepted_count(), 1);
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut sampler = sampler();
        sampler.begin(true, false);
        sampler.evaluate(TrackPoint::new(0.0, 0.0));
        sampler.reset();
        assert_eq!(sampler.phase(), SamplerPhase::Idle);
        assert_eq!(sampler.accepted_count(), 0);
    }
}
