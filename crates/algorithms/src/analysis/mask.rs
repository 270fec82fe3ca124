//! Boolean anomaly mask

use std::ops::Index;

use ndarray::{Array3, ArrayView2, Axis};
use cropwatch_core::{Error, Result};

/// Per-pixel anomaly flags, shaped like the stack they were computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnomalyMask {
    data: Array3<bool>,
}

impl AnomalyMask {
    /// Wrap an existing flag array
    pub fn from_array(data: Array3<bool>) -> Self {
        Self { data }
    }

    /// Dimensions as (frames, rows, cols)
    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Number of frames
    pub fn frames(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// Flag at (frame, row, col), `None` when out of range
    pub fn get(&self, t: usize, row: usize, col: usize) -> Option<bool> {
        self.data.get((t, row, col)).copied()
    }

    /// View of frame `t`
    pub fn frame(&self, t: usize) -> Result<ArrayView2<'_, bool>> {
        if t >= self.frames() {
            return Err(Error::Other(format!(
                "frame {} out of range (mask has {} frames)",
                t,
                self.frames()
            )));
        }
        Ok(self.data.index_axis(Axis(0), t))
    }

    /// Flagged pixels in each frame, in time order
    pub fn count_per_frame(&self) -> Vec<usize> {
        self.data
            .outer_iter()
            .map(|frame| frame.iter().filter(|&&flag| flag).count())
            .collect()
    }

    /// Flagged pixels across the whole stack
    pub fn total(&self) -> usize {
        self.data.iter().filter(|&&flag| flag).count()
    }

    /// Get a reference to the underlying array
    pub fn data(&self) -> &Array3<bool> {
        &self.data
    }

    /// Consume the mask and return the underlying array
    pub fn into_array(self) -> Array3<bool> {
        self.data
    }
}

impl Index<(usize, usize, usize)> for AnomalyMask {
    type Output = bool;

    fn index(&self, index: (usize, usize, usize)) -> &bool {
        &self.data[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_counts_per_frame() {
        let mask = AnomalyMask::from_array(array![
            [[true, false], [false, true]],
            [[false, false], [false, false]],
            [[false, true], [false, false]]
        ]);
        assert_eq!(mask.count_per_frame(), vec![2, 0, 1]);
        assert_eq!(mask.total(), 3);
        assert!(mask[(2, 0, 1)]);
        assert_eq!(mask.get(3, 0, 0), None);
        assert!(mask.frame(3).is_err());
    }
}
