//! Summary rows and per-pixel records from an analysis run

use ndarray::Axis;
use cropwatch_core::raster::RasterStack;
use cropwatch_core::records::{FrameSummary, PixelRecord};
use cropwatch_core::{Error, Result};

use super::mask::AnomalyMask;
use super::stats::FrameStatistics;

/// One summary row per frame: label, mean, std and anomaly count.
///
/// The anomaly count is the number of `true` flags in the frame's mask.
pub fn summarize(
    stack: &RasterStack,
    stats: &FrameStatistics,
    mask: &AnomalyMask,
) -> Result<Vec<FrameSummary>> {
    check_mask(stack, mask)?;
    if stats.len() != stack.frames() {
        return Err(Error::shape(
            format!("statistics for {} frames", stack.frames()),
            &[stats.len()],
        ));
    }

    let counts = mask.count_per_frame();
    Ok(stack
        .labels()
        .iter()
        .enumerate()
        .map(|(t, label)| FrameSummary {
            label: label.clone(),
            mean: stats.mean[t],
            std: stats.std[t],
            anomaly_pixels: counts[t],
        })
        .collect())
}

/// Flatten stack and mask into (label, row, col, value, flag) records,
/// in (time, row, col) order.
pub fn pixel_records(stack: &RasterStack, mask: &AnomalyMask) -> Result<Vec<PixelRecord>> {
    check_mask(stack, mask)?;

    let mut records = Vec::with_capacity(stack.len());
    for (t, (frame, flags)) in stack
        .data()
        .axis_iter(Axis(0))
        .zip(mask.data().axis_iter(Axis(0)))
        .enumerate()
    {
        let label = &stack.labels()[t];
        for ((row, col), &value) in frame.indexed_iter() {
            records.push(PixelRecord {
                label: label.clone(),
                row,
                col,
                value,
                anomaly: flags[(row, col)],
            });
        }
    }
    Ok(records)
}

fn check_mask(stack: &RasterStack, mask: &AnomalyMask) -> Result<()> {
    if mask.shape() != stack.shape() {
        let (t, r, c) = mask.shape();
        return Err(Error::shape(format!("mask shaped {:?}", stack.shape()), &[t, r, c]));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnomalyDetector;
    use ndarray::{array, Array3};

    fn sample_stack() -> RasterStack {
        RasterStack::with_labels(
            array![[[0.5, 0.5], [0.5, 0.1]], [[0.7, f64::NAN], [0.7, 0.7]]],
            vec!["2023-06".to_string(), "2023-07".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn test_summary_counts_match_mask() {
        let stack = sample_stack();
        let detector = AnomalyDetector::new(1.0).unwrap();
        let stats = detector.compute_statistics(stack.data()).unwrap();
        let mask = detector.detect_anomalies(stack.data()).unwrap();

        let rows = summarize(&stack, &stats, &mask).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label, "2023-06");
        assert_eq!(rows[0].anomaly_pixels, 1);
        assert_eq!(rows[1].anomaly_pixels, 0);
        assert_eq!(rows[1].mean, stats.mean[1]);
    }

    #[test]
    fn test_records_are_time_row_col_ordered() {
        let stack = sample_stack();
        let mask = AnomalyMask::from_array(Array3::from_elem((2, 2, 2), false));

        let records = pixel_records(&stack, &mask).unwrap();
        assert_eq!(records.len(), 8);
        assert_eq!((records[3].row, records[3].col), (1, 1));
        assert_eq!(records[3].value, 0.1);
        assert_eq!(records[4].label, "2023-07");
        assert!(records[5].value.is_nan());
    }

    #[test]
    fn test_mismatched_mask_is_shape_error() {
        let stack = sample_stack();
        let mask = AnomalyMask::from_array(Array3::from_elem((1, 2, 2), false));
        assert!(matches!(pixel_records(&stack, &mask), Err(Error::Shape { .. })));
    }
}
