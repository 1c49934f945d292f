//! Scalar Kalman filter for overlay position smoothing
//!
//! One instance per channel (overlay x, overlay y). Static model: the
//! prediction keeps the previous estimate and only grows its uncertainty.

/// One-dimensional Kalman filter
///
/// `measurement_noise` (R) inflates the covariance on every predict step,
/// `process_noise` (Q) sets the weight given to each new measurement.
/// Larger R relative to Q = more responsive, smaller = smoother.
#[derive(Clone, Debug)]
pub struct ScalarKalmanFilter {
    measurement_noise: f32,
    process_noise: f32,

    /// Current estimate, `None` until the first measurement arrives
    estimate: Option<f32>,

    /// Estimate uncertainty
    covariance: f32,
}

impl ScalarKalmanFilter {
    /// Create a filter with fixed tuning constants
    pub fn new(measurement_noise: f32, process_noise: f32) -> Self {
        Self {
            measurement_noise,
            process_noise,
            estimate: None,
            covariance: 0.0,
        }
    }

    /// Fold one measurement into the estimate and return the new estimate
    ///
    /// The first call seeds the filter and returns `z` unchanged.
    pub fn update(&mut self, z: f32) -> f32 {
        let Some(previous) = self.estimate else {
            self.estimate = Some(z);
            self.covariance = self.process_noise;
            return z;
        };

        // Predict: x⁻ = x, P⁻ = P + R
        let predicted = previous;
        let predicted_cov = self.covariance + self.measurement_noise;

        // Gain: K = P⁻ / (P⁻ + Q)
        let gain = predicted_cov / (predicted_cov + self.process_noise);

        // Correct: x = x⁻ + K (z - x⁻), P = P⁻ - K P⁻
        let estimate = predicted + gain * (z - predicted);
        self.covariance = predicted_cov - gain * predicted_cov;
        self.estimate = Some(estimate);

        estimate
    }

    /// Current estimate without feeding a measurement
    pub fn estimate(&self) -> Option<f32> {
        self.estimate
    }

    pub fn covariance(&self) -> f32 {
        self.covariance
    }

    /// Forget all history; the next update seeds the filter again
    pub fn reset(&mut self) {
        self.estimate = None;
        self.covariance = 0.0;
    }
}

/// Pair of scalar filters for the overlay's 2D anchor point
#[derive(Clone, Debug)]
pub struct PositionSmoother {
    pub x: ScalarKalmanFilter,
    pub y: ScalarKalmanFilter,
}

impl PositionSmoother {
    pub fn new(measurement_noise: f32, process_noise: f32) -> Self {
        Self {
            x: ScalarKalmanFilter::new(measurement_noise, process_noise),
            y: ScalarKalmanFilter::new(measurement_noise, process_noise),
        }
    }

    pub fn update(&mut self, pos: (f32, f32)) -> (f32, f32) {
        (self.x.update(pos.0), self.y.update(pos.1))
    }

    pub fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_first_update_is_identity() {
        let mut filter = ScalarKalmanFilter::new(0.01, 3.0);
        assert_eq!(filter.update(123.25), 123.25);
        assert_eq!(filter.covariance(), 3.0);
    }

    #[test]
    fn test_converges_to_constant() {
        for &(r, q) in &[(0.01, 3.0), (1.0, 1.0), (5.0, 0.1), (0.1, 10.0)] {
            let mut filter = ScalarKalmanFilter::new(r, q);
            filter.update(0.0);
            let mut out = 0.0;
            for _ in 0..500 {
                out = filter.update(10.0);
            }
            assert_abs_diff_eq!(out, 10.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_smooths_step_input() {
        let mut filter = ScalarKalmanFilter::new(0.01, 3.0);
        filter.update(0.0);
        let first = filter.update(100.0);
        // One noisy jump must not be taken at face value
        assert!(first > 0.0 && first < 100.0);
        let second = filter.update(100.0);
        assert!(second > first);
    }

    #[test]
    fn test_reset_reseeds() {
        let mut filter = ScalarKalmanFilter::new(0.5, 0.5);
        filter.update(1.0);
        filter.update(2.0);
        filter.reset();
        assert_eq!(filter.estimate(), None);
        assert_eq!(filter.update(42.0), 42.0);
    }

    #[test]
    fn test_channels_are_independent() {
        let mut smoother = PositionSmoother::new(0.01, 3.0);
        assert_eq!(smoother.update((10.0, 20.0)), (10.0, 20.0));
        let (x, y) = smoother.update((10.0, 80.0));
        assert_eq!(x, 10.0);
        assert!(y > 20.0 && y < 80.0);
    }
}
