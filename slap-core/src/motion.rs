// Slap AI - Motion Estimator
//
// Tracks the gravity vector with a single-pole low-pass filter and reports
// the magnitude of whatever acceleration is left once gravity is removed.

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Smoothing factor for the gravity filter. Higher values track tilt more
/// slowly, so fast jolts stay in the linear term.
pub const GRAVITY_ALPHA: f32 = 0.8;

/// Gravity estimate at boot: 1 g straight down the Z axis.
pub const INITIAL_GRAVITY: Vector3 = Vector3::new(0.0, 0.0, 1.0);

// ---------------------------------------------------------------------------
// Vector type (units of standard gravity)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn norm(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl core::ops::Sub for Vector3 {
    type Output = Vector3;

    fn sub(self, rhs: Vector3) -> Vector3 {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// One raw accelerometer reading, in g.
pub type AccelSample = Vector3;

// ---------------------------------------------------------------------------
// Estimator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct MotionEstimator {
    gravity: Vector3,
    alpha: f32,
    rejected: u32,
}

impl Default for MotionEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionEstimator {
    pub fn new() -> Self {
        Self::with_alpha(GRAVITY_ALPHA)
    }

    /// Build an estimator with a custom smoothing factor, clamped to [0, 1].
    pub fn with_alpha(alpha: f32) -> Self {
        Self {
            gravity: INITIAL_GRAVITY,
            alpha: alpha.clamp(0.0, 1.0),
            rejected: 0,
        }
    }

    /// Fold one sample into the gravity estimate and return the magnitude of
    /// the linear (gravity-removed) acceleration.
    ///
    /// A sample with a NaN or infinite component is dropped: the gravity
    /// estimate is left untouched and the tick reports `0.0`.
    pub fn update(&mut self, sample: AccelSample) -> f32 {
        if !sample.is_finite() {
            self.rejected = self.rejected.wrapping_add(1);
            if self.rejected == 1 || self.rejected % 100 == 0 {
                log::warn!(
                    "Dropping non-finite accel sample ({:?}), {} so far",
                    sample,
                    self.rejected
                );
            }
            return 0.0;
        }

        let a = self.alpha;
        let g = &mut self.gravity;
        g.x = a * g.x + (1.0 - a) * sample.x;
        g.y = a * g.y + (1.0 - a) * sample.y;
        g.z = a * g.z + (1.0 - a) * sample.z;

        (sample - self.gravity).norm()
    }

    pub fn gravity(&self) -> Vector3 {
        self.gravity
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Number of non-finite samples dropped since boot.
    pub fn rejected_samples(&self) -> u32 {
        self.rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn starts_with_unit_gravity_on_z() {
        let est = MotionEstimator::new();
        assert_eq!(est.gravity(), Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(est.alpha(), GRAVITY_ALPHA);
    }

    #[test]
    fn resting_flat_converges_to_zero_motion() {
        let mut est = MotionEstimator::new();
        let mut magnitude = f32::MAX;
        for _ in 0..60 {
            magnitude = est.update(Vector3::new(0.0, 0.0, 1.0));
        }
        let g = est.gravity();
        assert!(close(g.x, 0.0) && close(g.y, 0.0) && close(g.z, 1.0));
        assert!(magnitude < EPS);
    }

    #[test]
    fn tilted_device_converges_from_initial_guess() {
        let mut est = MotionEstimator::new();
        let tilted = Vector3::new(0.0, 1.0, 0.0);

        // The filter starts on Z, so the first reading looks like a big jolt.
        let first = est.update(tilted);
        assert!(first > 1.0);

        let mut last = first;
        for _ in 0..80 {
            last = est.update(tilted);
        }
        assert!(last < 1e-4);
        assert!(close(est.gravity().y, 1.0));
        assert!(est.gravity().z.abs() < 1e-4);
    }

    #[test]
    fn single_step_matches_filter_equation() {
        let mut est = MotionEstimator::new();
        let magnitude = est.update(Vector3::new(0.5, 0.0, 1.0));
        // gravity.x = 0.8 * 0 + 0.2 * 0.5 = 0.1, linear.x = 0.4
        assert!(close(est.gravity().x, 0.1));
        assert!(close(est.gravity().z, 1.0));
        assert!(close(magnitude, 0.4));
    }

    #[test]
    fn non_finite_sample_leaves_gravity_untouched() {
        let mut est = MotionEstimator::new();
        est.update(Vector3::new(0.2, 0.1, 0.9));
        let before = est.gravity();

        assert_eq!(est.update(Vector3::new(f32::NAN, 0.0, 1.0)), 0.0);
        assert_eq!(est.update(Vector3::new(0.0, f32::INFINITY, 1.0)), 0.0);
        assert_eq!(est.update(Vector3::new(0.0, 0.0, f32::NEG_INFINITY)), 0.0);

        assert_eq!(est.gravity(), before);
        assert_eq!(est.rejected_samples(), 3);

        // The filter keeps working normally afterwards.
        let magnitude = est.update(Vector3::new(0.2, 0.1, 0.9));
        assert!(magnitude.is_finite());
    }

    #[test]
    fn alpha_is_clamped() {
        assert_eq!(MotionEstimator::with_alpha(1.5).alpha(), 1.0);
        assert_eq!(MotionEstimator::with_alpha(-0.5).alpha(), 0.0);
    }

    #[test]
    fn magnitude_is_never_negative() {
        let mut est = MotionEstimator::new();
        for sample in [
            Vector3::new(-3.0, 0.0, 0.0),
            Vector3::new(0.0, -2.0, -1.0),
            Vector3::new(1.0, 1.0, 1.0),
        ] {
            assert!(est.update(sample) >= 0.0);
        }
    }
}
