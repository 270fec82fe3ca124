//! Time-indexed raster stack

use crate::error::{Error, Result};
use ndarray::{s, Array2, Array3, ArrayView2, ArrayView3, Axis};

/// A stack of co-registered frames indexed by (time, row, col).
///
/// Missing samples are stored as `f64::NAN`. Every frame shares the same
/// `(rows, cols)` grid and carries one label (usually an observation date).
///
/// # Example
///
/// ```ignore
/// use cropwatch_core::RasterStack;
/// use ndarray::Array2;
///
/// let june = Array2::from_elem((4, 5), 0.6);
/// let july = Array2::from_elem((4, 5), 0.4);
/// let stack = RasterStack::from_frames(vec![
///     ("2023-06".to_string(), june),
///     ("2023-07".to_string(), july),
/// ])?;
/// assert_eq!(stack.shape(), (2, 4, 5));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RasterStack {
    /// Samples in (time, row, col) order
    data: Array3<f64>,
    /// One label per frame
    labels: Vec<String>,
}

impl RasterStack {
    /// Wrap an existing array, labelling frames `Time-1`, `Time-2`, ...
    pub fn from_array(data: Array3<f64>) -> Self {
        let labels = default_labels(data.len_of(Axis(0)));
        Self { data, labels }
    }

    /// Wrap an existing array with explicit labels
    pub fn with_labels(data: Array3<f64>, labels: Vec<String>) -> Result<Self> {
        let frames = data.len_of(Axis(0));
        if labels.len() != frames {
            return Err(Error::InvalidParameter {
                name: "labels",
                value: labels.len().to_string(),
                reason: format!("stack has {} frames", frames),
            });
        }
        Ok(Self { data, labels })
    }

    /// Stack 2-D frames along a new time axis.
    ///
    /// All frames must share the shape of the first one.
    pub fn from_frames(frames: Vec<(String, Array2<f64>)>) -> Result<Self> {
        let Some((_, first)) = frames.first() else {
            return Err(Error::shape("at least one frame", &[0]));
        };
        let (rows, cols) = first.dim();

        let mut data = Array3::from_elem((frames.len(), rows, cols), f64::NAN);
        let mut labels = Vec::with_capacity(frames.len());

        for (t, (label, frame)) in frames.into_iter().enumerate() {
            let (ar, ac) = frame.dim();
            if (ar, ac) != (rows, cols) {
                return Err(Error::SizeMismatch { er: rows, ec: cols, ar, ac });
            }
            data.slice_mut(s![t, .., ..]).assign(&frame);
            labels.push(label);
        }

        Ok(Self { data, labels })
    }

    // Dimensions

    /// Number of frames
    pub fn frames(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// Rows per frame
    pub fn rows(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    /// Columns per frame
    pub fn cols(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    /// Dimensions as (frames, rows, cols)
    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Total number of samples
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the stack holds no samples
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Data access

    /// Frame labels, in time order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Label of frame `t`
    pub fn label(&self, t: usize) -> Option<&str> {
        self.labels.get(t).map(String::as_str)
    }

    /// View of frame `t`
    pub fn frame(&self, t: usize) -> Result<ArrayView2<'_, f64>> {
        if t >= self.frames() {
            return Err(Error::Other(format!(
                "frame {} out of range (stack has {} frames)",
                t,
                self.frames()
            )));
        }
        Ok(self.data.index_axis(Axis(0), t))
    }

    /// View of the whole stack
    pub fn view(&self) -> ArrayView3<'_, f64> {
        self.data.view()
    }

    /// Get a reference to the underlying array
    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    /// Replace the samples, keeping labels. The new array must have the same shape.
    pub fn map_data(&self, data: Array3<f64>) -> Result<Self> {
        if data.dim() != self.data.dim() {
            return Err(Error::shape(
                format!("{:?}", self.data.shape()),
                data.shape(),
            ));
        }
        Ok(Self {
            data,
            labels: self.labels.clone(),
        })
    }

    /// Consume the stack and return the underlying array and labels
    pub fn into_parts(self) -> (Array3<f64>, Vec<String>) {
        (self.data, self.labels)
    }

    /// Count of non-missing samples
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }
}

/// Labels used when a loader supplies none: `Time-1`, `Time-2`, ...
pub fn default_labels(frames: usize) -> Vec<String> {
    (1..=frames).map(|i| format!("Time-{}", i)).collect()
}
