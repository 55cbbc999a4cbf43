// Slap AI - Detection Pipeline
//
// One tick = MotionEstimator::update followed by SlapDetector::evaluate, in
// that order, at most once per sample interval.

use crate::motion::{AccelSample, MotionEstimator};
use crate::slap::{Evaluation, SlapDetector};

/// 10 Hz sampling.
pub const SAMPLE_INTERVAL_MS: u32 = 100;

#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub sample_interval_ms: u32,
    /// Ticks after boot during which the detector only sees `0.0` while the
    /// gravity filter settles. The reference behaviour uses none.
    pub warmup_ticks: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: SAMPLE_INTERVAL_MS,
            warmup_ticks: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Linear acceleration magnitude computed this tick, in g.
    pub magnitude: f32,
    pub evaluation: Evaluation,
    /// The detector was fed zero because the filter is still warming up.
    pub warming_up: bool,
}

#[derive(Debug, Clone)]
pub struct SlapPipeline {
    estimator: MotionEstimator,
    detector: SlapDetector,
    config: PipelineConfig,
    last_tick_ms: Option<u32>,
    ticks: u32,
}

impl Default for SlapPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl SlapPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_parts(MotionEstimator::new(), SlapDetector::new(), config)
    }

    pub fn with_parts(
        estimator: MotionEstimator,
        detector: SlapDetector,
        config: PipelineConfig,
    ) -> Self {
        Self {
            estimator,
            detector,
            config,
            last_tick_ms: None,
            ticks: 0,
        }
    }

    /// Whether a tick at `now_ms` would be accepted.
    pub fn is_due(&self, now_ms: u32) -> bool {
        match self.last_tick_ms {
            Some(last) => now_ms.wrapping_sub(last) >= self.config.sample_interval_ms,
            None => true,
        }
    }

    /// Run one detection tick, or return `None` if the previous accepted tick
    /// was less than one sample interval ago.
    pub fn tick(&mut self, sample: AccelSample, threshold: f32, now_ms: u32) -> Option<TickReport> {
        if !self.is_due(now_ms) {
            return None;
        }
        self.last_tick_ms = Some(now_ms);

        let magnitude = self.estimator.update(sample);
        let warming_up = self.ticks < self.config.warmup_ticks;
        self.ticks = self.ticks.saturating_add(1);

        let fed = if warming_up { 0.0 } else { magnitude };
        let evaluation = self.detector.evaluate(fed, threshold, now_ms);

        Some(TickReport {
            magnitude,
            evaluation,
            warming_up,
        })
    }

    /// Advance the detector without a sample, as when the sensor read fails.
    /// Gravity is left alone and the detector sees magnitude 0, so an
    /// active window still runs out. Gated like `tick`.
    pub fn skip(&mut self, threshold: f32, now_ms: u32) -> Option<TickReport> {
        if !self.is_due(now_ms) {
            return None;
        }
        self.last_tick_ms = Some(now_ms);

        let evaluation = self.detector.evaluate(0.0, threshold, now_ms);
        Some(TickReport {
            magnitude: 0.0,
            evaluation,
            warming_up: self.ticks < self.config.warmup_ticks,
        })
    }

    pub fn estimator(&self) -> &MotionEstimator {
        &self.estimator
    }

    pub fn detector(&self) -> &SlapDetector {
        &self.detector
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::Vector3;
    use crate::slap::SlapPhase;

    const FLAT: Vector3 = Vector3::new(0.0, 0.0, 1.0);

    #[test]
    fn ticks_faster_than_interval_are_ignored() {
        let mut pipe = SlapPipeline::default();
        assert!(pipe.tick(FLAT, 1.0, 1000).is_some());
        assert!(pipe.tick(FLAT, 1.0, 1050).is_none());
        assert!(pipe.tick(FLAT, 1.0, 1099).is_none());
        assert!(pipe.tick(FLAT, 1.0, 1100).is_some());
        assert_eq!(pipe.ticks(), 2);
    }

    #[test]
    fn is_due_tracks_the_last_accepted_tick() {
        let mut pipe = SlapPipeline::default();
        assert!(pipe.is_due(0));
        pipe.tick(FLAT, 1.0, u32::MAX - 50);
        assert!(!pipe.is_due(u32::MAX));
        assert!(!pipe.is_due(48));
        assert!(pipe.is_due(49));
    }

    #[test]
    fn hard_jolt_is_reported_as_slap() {
        let mut pipe = SlapPipeline::default();
        pipe.tick(FLAT, 1.0, 0);
        let report = pipe.tick(Vector3::new(4.0, 0.0, 1.0), 1.0, 100).unwrap();
        // gravity.x = 0.8, linear.x = 3.2
        assert!((report.magnitude - 3.2).abs() < 1e-5);
        assert!(report.evaluation.just_entered_active);
        assert_eq!(pipe.detector().state().phase, SlapPhase::Active);
    }

    #[test]
    fn active_window_expires_across_skipped_samples() {
        let mut pipe = SlapPipeline::default();
        pipe.tick(FLAT, 1.0, 0);
        let report = pipe.tick(Vector3::new(4.0, 0.0, 1.0), 1.0, 100).unwrap();
        assert!(report.evaluation.just_entered_active);
        let gravity = pipe.estimator().gravity();

        let mut exited_at = None;
        for i in 2..40u32 {
            let now = i * 100;
            let report = pipe.skip(1.0, now).unwrap();
            assert_eq!(report.magnitude, 0.0);
            if report.evaluation.just_exited_active {
                exited_at = Some(now);
                break;
            }
        }
        assert_eq!(exited_at, Some(3100));
        assert_eq!(pipe.detector().state().phase, SlapPhase::Quiet);
        assert_eq!(pipe.estimator().gravity(), gravity);
        assert_eq!(pipe.ticks(), 2);
    }

    #[test]
    fn skip_is_gated_like_tick() {
        let mut pipe = SlapPipeline::default();
        assert!(pipe.skip(1.0, 1000).is_some());
        assert!(pipe.tick(FLAT, 1.0, 1050).is_none());
        assert!(pipe.skip(1.0, 1099).is_none());
        assert!(pipe.tick(FLAT, 1.0, 1100).is_some());
    }

    #[test]
    fn warmup_suppresses_detection_but_keeps_filtering() {
        let config = PipelineConfig {
            warmup_ticks: 3,
            ..PipelineConfig::default()
        };
        let mut pipe = SlapPipeline::new(config);
        let tilted = Vector3::new(0.0, 1.0, 0.0);

        for i in 0..3u32 {
            let report = pipe.tick(tilted, 0.1, i * 100).unwrap();
            assert!(report.warming_up);
            assert!(report.magnitude > 0.1);
            assert!(!report.evaluation.is_active());
        }
        assert!(pipe.estimator().gravity().y > 0.4);

        let report = pipe.tick(tilted, 0.1, 300).unwrap();
        assert!(!report.warming_up);
    }

    #[test]
    fn without_warmup_the_unconverged_filter_can_trigger() {
        let mut pipe = SlapPipeline::default();
        let report = pipe.tick(Vector3::new(0.0, 1.0, 0.0), 1.0, 0).unwrap();
        assert!(report.magnitude > 1.0);
        assert!(report.evaluation.just_entered_active);
    }
}
