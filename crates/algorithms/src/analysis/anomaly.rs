//! Per-frame z-score anomaly detection
//!
//! A pixel is anomalous when its vegetation index sits more than `threshold`
//! standard deviations below the mean of its own frame:
//!
//! `z = (value - mean[t]) / (std[t] + epsilon)`, flagged iff `z < -threshold`
//!
//! The test is one-sided. Unusually high values are never flagged, and any
//! NaN in the arithmetic (missing pixel, empty frame) compares false.

use ndarray::{Array3, ArrayBase, ArrayView3, Axis, Data, Dimension};
use cropwatch_core::raster::RasterStack;
use cropwatch_core::{Algorithm, Error, Result};

use super::mask::AnomalyMask;
use super::stats::{frame_statistics, frames_view, FrameStatistics};
use crate::maybe_rayon::*;

/// Default sensitivity, in standard deviations below the frame mean
pub const DEFAULT_THRESHOLD: f64 = 1.5;

/// Default stabilizer added to the standard deviation
pub const DEFAULT_EPSILON: f64 = 1e-6;

/// Anomaly detector with a fixed sensitivity.
///
/// The threshold and epsilon are set at construction and never change.
///
/// # Example
/// ```ignore
/// let detector = AnomalyDetector::new(1.5)?;
/// let mask = detector.detect_anomalies(cleaned.data())?;
/// println!("{} anomalous pixels", mask.total());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyDetector {
    threshold: f64,
    epsilon: f64,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl AnomalyDetector {
    /// Create a detector flagging pixels more than `threshold` std below the mean.
    ///
    /// The threshold must be finite and non-negative.
    pub fn new(threshold: f64) -> Result<Self> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(Error::InvalidParameter {
                name: "threshold",
                value: threshold.to_string(),
                reason: "must be a finite, non-negative number of standard deviations".into(),
            });
        }
        Ok(Self {
            threshold,
            epsilon: DEFAULT_EPSILON,
        })
    }

    /// Replace the stabilizer added to the standard deviation
    pub fn with_epsilon(self, epsilon: f64) -> Result<Self> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "epsilon",
                value: epsilon.to_string(),
                reason: "must be finite and positive".into(),
            });
        }
        Ok(Self { epsilon, ..self })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Mean and population std per frame, ignoring NaN.
    pub fn compute_statistics<S, D>(&self, stack: &ArrayBase<S, D>) -> Result<FrameStatistics>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        frame_statistics(stack)
    }

    /// Flag pixels whose z-score is below `-threshold`.
    ///
    /// The mask has the shape of the input. Missing pixels and pixels of
    /// frames without valid samples are never flagged. Fails with
    /// [`Error::Shape`] unless the input is 3-D.
    pub fn detect_anomalies<S, D>(&self, stack: &ArrayBase<S, D>) -> Result<AnomalyMask>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let view = frames_view(stack)?;
        let stats = self.compute_statistics(&view)?;
        self.flag(view, &stats)
    }

    /// Same as [`detect_anomalies`](Self::detect_anomalies), reusing statistics
    /// already computed for this stack.
    pub fn detect_with<S, D>(
        &self,
        stack: &ArrayBase<S, D>,
        stats: &FrameStatistics,
    ) -> Result<AnomalyMask>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let view = frames_view(stack)?;
        if stats.len() != view.len_of(Axis(0)) {
            return Err(Error::shape(
                format!("statistics for {} frames", view.len_of(Axis(0))),
                &[stats.len()],
            ));
        }
        self.flag(view, stats)
    }

    fn flag(&self, view: ArrayView3<'_, f64>, stats: &FrameStatistics) -> Result<AnomalyMask> {
        let limit = -self.threshold;
        let flags = self.per_pixel(view, stats, |z| z < limit)?;
        Ok(AnomalyMask::from_array(flags))
    }

    /// Z-score of every pixel against its frame; NaN where the pixel is missing.
    pub fn z_scores<S, D>(&self, stack: &ArrayBase<S, D>) -> Result<Array3<f64>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let view = frames_view(stack)?;
        let stats = self.compute_statistics(&view)?;
        self.per_pixel(view, &stats, |z| z)
    }

    /// Map every pixel's z-score through `f`, frame by frame
    fn per_pixel<T, F>(
        &self,
        view: ArrayView3<'_, f64>,
        stats: &FrameStatistics,
        f: F,
    ) -> Result<Array3<T>>
    where
        T: Send,
        F: Fn(f64) -> T + Sync + Send,
    {
        let (frames, rows, cols) = view.dim();

        let data: Vec<T> = (0..frames)
            .into_par_iter()
            .flat_map(|t| {
                let mean = stats.mean[t];
                let denom = stats.std[t] + self.epsilon;
                view.index_axis(Axis(0), t)
                    .iter()
                    .map(|&v| f((v - mean) / denom))
                    .collect::<Vec<T>>()
            })
            .collect();

        Ok(Array3::from_shape_vec((frames, rows, cols), data)?)
    }
}

impl Algorithm for AnomalyDetector {
    type Input = RasterStack;
    type Output = AnomalyMask;
    type Params = ();
    type Error = Error;

    fn name(&self) -> &'static str {
        "Anomaly Detection"
    }

    fn description(&self) -> &'static str {
        "Flag pixels far below their frame mean (one-sided z-score test)"
    }

    fn execute(&self, input: Self::Input, _params: Self::Params) -> Result<Self::Output> {
        self.detect_anomalies(input.data())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array, Array3};

    fn uniform_with_dip(value: f64, dip: f64) -> Array3<f64> {
        let mut data = Array3::from_elem((1, 5, 5), value);
        data[(0, 2, 2)] = dip;
        data
    }

    #[test]
    fn test_threshold_sensitivity() {
        let data = uniform_with_dip(0.5, 0.3);

        let strict = AnomalyDetector::new(0.1).unwrap();
        assert!(strict.detect_anomalies(&data).unwrap()[(0, 2, 2)]);

        let loose = AnomalyDetector::new(10.0).unwrap();
        assert!(!loose.detect_anomalies(&data).unwrap()[(0, 2, 2)]);
    }

    #[test]
    fn test_high_values_never_flagged() {
        let data = uniform_with_dip(0.5, 0.9);
        let mask = AnomalyDetector::new(0.0).unwrap().detect_anomalies(&data).unwrap();
        assert!(!mask[(0, 2, 2)]);
    }

    #[test]
    fn test_missing_pixels_not_flagged() {
        let mut data = uniform_with_dip(0.5, 0.1);
        data[(0, 0, 0)] = f64::NAN;
        let mask = AnomalyDetector::new(0.1).unwrap().detect_anomalies(&data).unwrap();
        assert!(!mask[(0, 0, 0)]);
        assert!(mask[(0, 2, 2)]);
    }

    #[test]
    fn test_empty_frame_not_flagged() {
        let data = array![[[f64::NAN, f64::NAN]], [[0.8, 0.1]]];
        let mask = AnomalyDetector::new(0.5).unwrap().detect_anomalies(&data).unwrap();
        assert_eq!(mask.count_per_frame(), vec![0, 1]);
        assert!(mask[(1, 0, 1)]);
    }

    #[test]
    fn test_uniform_frame_not_flagged() {
        let data = Array3::from_elem((2, 3, 3), 0.42);
        let mask = AnomalyDetector::default().detect_anomalies(&data).unwrap();
        assert_eq!(mask.total(), 0);
    }

    #[test]
    fn test_mask_shape_matches_input() {
        let data = Array3::from_elem((3, 4, 5), 0.5);
        let mask = AnomalyDetector::default().detect_anomalies(&data).unwrap();
        assert_eq!(mask.shape(), (3, 4, 5));
    }

    #[test]
    fn test_zero_spatial_elements() {
        let data = Array3::<f64>::zeros((2, 0, 4));
        let mask = AnomalyDetector::default().detect_anomalies(&data).unwrap();
        assert_eq!(mask.shape(), (2, 0, 4));
        assert_eq!(mask.count_per_frame(), vec![0, 0]);
    }

    #[test]
    fn test_non_3d_is_shape_error() {
        let detector = AnomalyDetector::default();
        let flat = Array::<f64, _>::zeros(0);
        assert!(matches!(detector.detect_anomalies(&flat), Err(Error::Shape { .. })));
        assert!(matches!(detector.compute_statistics(&flat), Err(Error::Shape { .. })));

        let plane = array![[0.5, 0.3]];
        assert!(matches!(detector.z_scores(&plane), Err(Error::Shape { .. })));
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(AnomalyDetector::new(-0.5).is_err());
        assert!(AnomalyDetector::new(f64::NAN).is_err());
        assert!(AnomalyDetector::new(f64::INFINITY).is_err());
        assert!(AnomalyDetector::default().with_epsilon(0.0).is_err());
        assert!(AnomalyDetector::default().with_epsilon(-1e-6).is_err());
    }

    #[test]
    fn test_z_scores_use_epsilon() {
        // mean 0.5, population std 0.5
        let data = array![[[0.0, 1.0]]];
        let detector = AnomalyDetector::new(1.0).unwrap().with_epsilon(0.5).unwrap();
        let z = detector.z_scores(&data).unwrap();
        assert_relative_eq!(z[(0, 0, 0)], -0.5, epsilon = 1e-12);
        assert_relative_eq!(z[(0, 0, 1)], 0.5, epsilon = 1e-12);
        assert_eq!(detector.epsilon(), 0.5);
        assert_eq!(detector.threshold(), 1.0);
    }

    #[test]
    fn test_detect_with_reuses_statistics() {
        let data = uniform_with_dip(0.5, 0.3);
        let detector = AnomalyDetector::new(0.1).unwrap();
        let stats = detector.compute_statistics(&data).unwrap();
        assert_eq!(
            detector.detect_with(&data, &stats).unwrap(),
            detector.detect_anomalies(&data).unwrap()
        );

        let other = Array3::from_elem((2, 5, 5), 0.5);
        assert!(matches!(detector.detect_with(&other, &stats), Err(Error::Shape { .. })));
    }

    #[test]
    fn test_algorithm_execute() {
        let stack = RasterStack::from_array(uniform_with_dip(0.5, 0.3));
        let detector = AnomalyDetector::new(0.1).unwrap();
        assert_eq!(detector.name(), "Anomaly Detection");
        let mask = detector.execute_default(stack).unwrap();
        assert_eq!(mask.total(), 1);
    }
}
