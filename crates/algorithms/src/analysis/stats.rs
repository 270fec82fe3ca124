//! Per-frame statistics
//!
//! Mean and population standard deviation of every frame of a stack,
//! computed over non-missing (non-NaN) samples only.

use std::fmt;

use ndarray::{Array1, ArrayBase, ArrayView2, ArrayView3, Axis, Data, Dimension, Ix3};
use cropwatch_core::{Error, Result};

use crate::maybe_rayon::*;

/// Mean, standard deviation and valid-sample count per frame.
///
/// All three arrays are indexed by time, in stack order. A frame without
/// valid samples has NaN for both `mean` and `std`.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameStatistics {
    pub mean: Array1<f64>,
    /// Population standard deviation (divides by the valid count)
    pub std: Array1<f64>,
    pub valid: Array1<usize>,
}

/// A frame whose statistics cannot support a meaningful z-score.
///
/// Expected in sparse or cloud-covered imagery; reported, never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegenerateFrame {
    /// No valid samples: mean and std are NaN, nothing can be flagged
    Empty { frame: usize },
    /// Every valid sample is equal: std is zero, z-scores rest on epsilon
    ZeroVariance { frame: usize },
}

impl fmt::Display for DegenerateFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegenerateFrame::Empty { frame } => write!(f, "frame {} has no valid samples", frame),
            DegenerateFrame::ZeroVariance { frame } => {
                write!(f, "frame {} has zero variance", frame)
            }
        }
    }
}

impl DegenerateFrame {
    /// Time index of the frame
    pub fn frame(&self) -> usize {
        match *self {
            DegenerateFrame::Empty { frame } | DegenerateFrame::ZeroVariance { frame } => frame,
        }
    }
}

impl FrameStatistics {
    /// Number of frames
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    /// Whether there are no frames
    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Frames that are empty or have zero variance, in time order
    pub fn degenerate_frames(&self) -> Vec<DegenerateFrame> {
        self.valid
            .iter()
            .zip(self.std.iter())
            .enumerate()
            .filter_map(|(frame, (&valid, &std))| {
                if valid == 0 {
                    Some(DegenerateFrame::Empty { frame })
                } else if std == 0.0 {
                    Some(DegenerateFrame::ZeroVariance { frame })
                } else {
                    None
                }
            })
            .collect()
    }

    /// Split into `(mean, std)`
    pub fn into_parts(self) -> (Array1<f64>, Array1<f64>) {
        (self.mean, self.std)
    }
}

/// View any array as (time, row, col), or fail with a shape error.
pub(crate) fn frames_view<S, D>(stack: &ArrayBase<S, D>) -> Result<ArrayView3<'_, f64>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    stack
        .view()
        .into_dimensionality::<Ix3>()
        .map_err(|_| Error::shape("3-D (time, row, col) array", stack.shape()))
}

/// Compute mean and population standard deviation for every frame.
///
/// NaN samples are skipped. Frames with no valid samples yield NaN for both
/// statistics instead of an error. Anything other than a 3-D array fails
/// with [`Error::Shape`].
///
/// # Example
/// ```ignore
/// let stats = frame_statistics(stack.data())?;
/// for (t, mean) in stats.mean.iter().enumerate() {
///     println!("{}: {:.3}", stack.labels()[t], mean);
/// }
/// ```
pub fn frame_statistics<S, D>(stack: &ArrayBase<S, D>) -> Result<FrameStatistics>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let view = frames_view(stack)?;
    let frames = view.len_of(Axis(0));

    let reduced: Vec<(f64, f64, usize)> = (0..frames)
        .into_par_iter()
        .map(|t| reduce_frame(view.index_axis(Axis(0), t)))
        .collect();

    let mut mean = Array1::from_elem(frames, f64::NAN);
    let mut std = Array1::from_elem(frames, f64::NAN);
    let mut valid = Array1::zeros(frames);
    for (t, (m, s, n)) in reduced.into_iter().enumerate() {
        mean[t] = m;
        std[t] = s;
        valid[t] = n;
    }

    Ok(FrameStatistics { mean, std, valid })
}

/// Two-pass mean/std over the valid samples of one frame
fn reduce_frame(frame: ArrayView2<'_, f64>) -> (f64, f64, usize) {
    let (sum, count) = frame
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), &v| (s + v, n + 1));

    if count == 0 {
        return (f64::NAN, f64::NAN, 0);
    }

    let mean = sum / count as f64;
    let var = frame
        .iter()
        .filter(|v| !v.is_nan())
        .map(|&v| (v - mean) * (v - mean))
        .sum::<f64>()
        / count as f64;

    (mean, var.sqrt(), count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array, Array3, IxDyn};

    #[test]
    fn test_shape_of_outputs() {
        let stack = Array3::from_elem((3, 4, 5), 0.5);
        let stats = frame_statistics(&stack).unwrap();
        assert_eq!(stats.len(), 3);
        assert_eq!(stats.mean.ndim(), 1);
        assert_eq!(stats.std.ndim(), 1);
        assert_eq!(stats.valid.to_vec(), vec![20, 20, 20]);
    }

    #[test]
    fn test_population_std() {
        // 2, 4, 4, 4, 5, 5, 7, 9: mean 5, population std 2
        let stack = array![[[2.0, 4.0, 4.0, 4.0], [5.0, 5.0, 7.0, 9.0]]];
        let stats = frame_statistics(&stack).unwrap();
        assert_relative_eq!(stats.mean[0], 5.0, epsilon = 1e-12);
        assert_relative_eq!(stats.std[0], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_frames_are_independent() {
        let stack = array![[[1.0, 1.0], [1.0, 1.0]], [[0.0, 2.0], [0.0, 2.0]]];
        let stats = frame_statistics(&stack).unwrap();
        assert_eq!(stats.mean.to_vec(), vec![1.0, 1.0]);
        assert_eq!(stats.std.to_vec(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_nan_skipped() {
        let stack = array![[[0.2, f64::NAN], [0.4, f64::NAN]]];
        let stats = frame_statistics(&stack).unwrap();
        assert_relative_eq!(stats.mean[0], 0.3, epsilon = 1e-12);
        assert_relative_eq!(stats.std[0], 0.1, epsilon = 1e-12);
        assert_eq!(stats.valid[0], 2);
    }

    #[test]
    fn test_all_missing_frame() {
        let stack = array![[[f64::NAN, f64::NAN]], [[0.5, 0.5]]];
        let stats = frame_statistics(&stack).unwrap();
        assert!(stats.mean[0].is_nan());
        assert!(stats.std[0].is_nan());
        assert_eq!(stats.mean[1], 0.5);
        assert_eq!(
            stats.degenerate_frames(),
            vec![
                DegenerateFrame::Empty { frame: 0 },
                DegenerateFrame::ZeroVariance { frame: 1 }
            ]
        );
    }

    #[test]
    fn test_zero_spatial_elements() {
        let stack = Array3::<f64>::zeros((2, 0, 3));
        let stats = frame_statistics(&stack).unwrap();
        assert_eq!(stats.len(), 2);
        assert!(stats.mean.iter().all(|m| m.is_nan()));
    }

    #[test]
    fn test_no_frames() {
        let stack = Array3::<f64>::zeros((0, 4, 4));
        let stats = frame_statistics(&stack).unwrap();
        assert!(stats.is_empty());
    }

    #[test]
    fn test_wrong_dimensionality() {
        let flat = Array::<f64, _>::zeros(0);
        assert!(matches!(frame_statistics(&flat), Err(Error::Shape { .. })));

        let plane = array![[0.1, 0.2], [0.3, 0.4]];
        assert!(matches!(frame_statistics(&plane), Err(Error::Shape { .. })));

        let scalar = Array::<f64, _>::zeros(IxDyn(&[]));
        assert!(matches!(frame_statistics(&scalar), Err(Error::Shape { .. })));
    }

    #[test]
    fn test_dynamic_3d_accepted() {
        let stack = Array::<f64, _>::from_elem(IxDyn(&[2, 2, 2]), 0.25);
        let stats = frame_statistics(&stack).unwrap();
        assert_eq!(stats.mean.to_vec(), vec![0.25, 0.25]);
    }
}
