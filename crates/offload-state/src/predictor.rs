//! Online linear latency predictor
//!
//! Ordinary least squares of latency as a function of payload size, refit
//! from scratch on every `fit` call. The predictor keeps no memory beyond the
//! snapshot it was last fit from.

use offload_core::{Error, Result, Sample, Venue};
use serde::Serialize;
use tracing::debug;

/// Minimum number of samples required to fit a line
pub const MIN_SAMPLES: usize = 2;

/// Simple linear regression estimator for one venue
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencyPredictor {
    venue: Venue,
    slope: f64,
    intercept: f64,
    trained: bool,
}

impl LatencyPredictor {
    /// Create an untrained predictor
    pub fn new(venue: Venue) -> Self {
        Self {
            venue,
            slope: 0.0,
            intercept: 0.0,
            trained: false,
        }
    }

    /// Refit from a history snapshot, overwriting any previous fit.
    ///
    /// Fewer than two samples leaves the predictor untrained. When every
    /// sample has the same size the slope is zero and the intercept is the
    /// mean latency.
    pub fn fit(&mut self, samples: &[Sample]) {
        if samples.len() < MIN_SAMPLES {
            self.slope = 0.0;
            self.intercept = 0.0;
            self.trained = false;
            return;
        }

        let n = samples.len() as f64;
        let mean_size = samples.iter().map(|s| s.size() as f64).sum::<f64>() / n;
        let mean_latency = samples.iter().map(Sample::latency).sum::<f64>() / n;

        let (covariance, variance) =
            samples
                .iter()
                .fold((0.0, 0.0), |(covariance, variance), sample| {
                    let dx = sample.size() as f64 - mean_size;
                    let dy = sample.latency() - mean_latency;
                    (covariance + dx * dy, variance + dx * dx)
                });

        if variance == 0.0 {
            self.slope = 0.0;
            self.intercept = mean_latency;
        } else {
            self.slope = covariance / variance;
            self.intercept = mean_latency - self.slope * mean_size;
        }
        self.trained = true;

        debug!(
            venue = %self.venue,
            samples = samples.len(),
            slope = self.slope,
            intercept = self.intercept,
            "Fitted latency predictor"
        );
    }

    /// Predicted latency in seconds for a payload of `size` bytes.
    ///
    /// Extrapolation may produce negative values; these are not clamped since
    /// only the relative ordering of venues matters.
    pub fn predict(&self, size: u64) -> Result<f64> {
        if !self.trained {
            return Err(Error::UntrainedPredictor(self.venue));
        }
        Ok(self.intercept + self.slope * size as f64)
    }

    pub fn venue(&self) -> Venue {
        self.venue
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    /// Fitted slope in seconds per byte, `None` while untrained
    pub fn slope(&self) -> Option<f64> {
        self.trained.then_some(self.slope)
    }

    /// Fitted intercept in seconds, `None` while untrained
    pub fn intercept(&self) -> Option<f64> {
        self.trained.then_some(self.intercept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn samples(points: &[(f64, u64)]) -> Vec<Sample> {
        points.iter().map(|&(l, s)| Sample::new(l, s)).collect()
    }

    #[test]
    fn test_untrained_predict_fails() {
        let predictor = LatencyPredictor::new(Venue::Local);
        assert!(!predictor.is_trained());
        assert!(matches!(
            predictor.predict(100),
            Err(Error::UntrainedPredictor(Venue::Local))
        ));
        assert_eq!(predictor.slope(), None);
    }

    #[test]
    fn test_single_sample_stays_untrained() {
        let mut predictor = LatencyPredictor::new(Venue::Remote);
        predictor.fit(&samples(&[(1.0, 100)]));
        assert!(!predictor.is_trained());
        assert!(predictor.predict(100).is_err());
    }

    #[test]
    fn test_exact_line() {
        let mut predictor = LatencyPredictor::new(Venue::Local);
        predictor.fit(&samples(&[(1.0, 100), (2.0, 200)]));

        assert!(predictor.is_trained());
        assert!((predictor.slope().unwrap() - 0.01).abs() < EPS);
        assert!(predictor.intercept().unwrap().abs() < EPS);
        assert!((predictor.predict(300).unwrap() - 3.0).abs() < EPS);
    }

    #[test]
    fn test_least_squares_fit() {
        let mut predictor = LatencyPredictor::new(Venue::Remote);
        predictor.fit(&samples(&[(0.5, 100), (0.6, 200)]));
        assert!((predictor.slope().unwrap() - 0.001).abs() < EPS);
        assert!((predictor.intercept().unwrap() - 0.4).abs() < EPS);
        assert!((predictor.predict(300).unwrap() - 0.7).abs() < EPS);

        // Noisy points scattered around y = 1 + 0.5x
        predictor.fit(&samples(&[(1.0, 0), (1.8, 2), (3.2, 4)]));
        assert!((predictor.slope().unwrap() - 0.55).abs() < EPS);
        assert!((predictor.intercept().unwrap() - 0.9).abs() < EPS);
    }

    #[test]
    fn test_degenerate_sizes_predict_mean() {
        let mut predictor = LatencyPredictor::new(Venue::Local);
        predictor.fit(&samples(&[(1.0, 512), (2.0, 512), (6.0, 512)]));

        assert!(predictor.is_trained());
        assert_eq!(predictor.slope(), Some(0.0));
        assert!((predictor.intercept().unwrap() - 3.0).abs() < EPS);
        for size in [0, 512, 1 << 20] {
            assert!((predictor.predict(size).unwrap() - 3.0).abs() < EPS);
        }
    }

    #[test]
    fn test_negative_extrapolation_is_not_clamped() {
        let mut predictor = LatencyPredictor::new(Venue::Local);
        predictor.fit(&samples(&[(2.0, 100), (1.0, 200)]));
        assert!(predictor.predict(1000).unwrap() < 0.0);
    }

    #[test]
    fn test_refit_overwrites_previous_state() {
        let mut predictor = LatencyPredictor::new(Venue::Local);
        predictor.fit(&samples(&[(1.0, 100), (2.0, 200)]));
        assert!(predictor.is_trained());

        predictor.fit(&samples(&[(1.0, 100)]));
        assert!(!predictor.is_trained());
        assert_eq!(predictor.intercept(), None);

        predictor.fit(&samples(&[(4.0, 10), (4.0, 20)]));
        assert_eq!(predictor.slope(), Some(0.0));
        assert!((predictor.predict(15).unwrap() - 4.0).abs() < EPS);
    }
}
