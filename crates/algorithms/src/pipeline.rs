//! End-to-end analysis of a loaded stack
//!
//! Clean, compute frame statistics, flag anomalies and build summary rows.
//! Loading, storing and exporting stay with the caller.

use cropwatch_core::raster::RasterStack;
use cropwatch_core::records::{FrameSummary, PixelRecord};
use cropwatch_core::Result;
use tracing::{info, warn};

use crate::analysis::{pixel_records, summarize, AnomalyDetector, AnomalyMask, FrameStatistics};
use crate::preprocessing::{clean_stack, CleanParams};

/// Cleaning parameters plus a configured detector
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnalysisPipeline {
    pub clean: CleanParams,
    pub detector: AnomalyDetector,
}

/// Everything one run produces
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    /// Cleaned copy of the input stack
    pub cleaned: RasterStack,
    pub statistics: FrameStatistics,
    pub mask: AnomalyMask,
    /// One row per frame, ready for the result store
    pub summaries: Vec<FrameSummary>,
}

impl AnalysisOutput {
    /// Per-pixel records of the cleaned stack, ready for tabular export
    pub fn pixel_records(&self) -> Result<Vec<PixelRecord>> {
        pixel_records(&self.cleaned, &self.mask)
    }
}

impl AnalysisPipeline {
    pub fn new(clean: CleanParams, detector: AnomalyDetector) -> Self {
        Self { clean, detector }
    }

    /// Run every stage on `stack`. The input is not modified.
    pub fn run(&self, stack: &RasterStack) -> Result<AnalysisOutput> {
        let (frames, rows, cols) = stack.shape();
        info!("Analyzing {} frames of {} x {}", frames, cols, rows);

        let cleaned = clean_stack(stack, &self.clean)?;
        info!(
            "Cleaned: {} of {} samples valid",
            cleaned.valid_count(),
            cleaned.len()
        );

        let statistics = self.detector.compute_statistics(cleaned.data())?;
        for degenerate in statistics.degenerate_frames() {
            warn!("{}: {}", cleaned.label(degenerate.frame()).unwrap_or("?"), degenerate);
        }

        let mask = self.detector.detect_with(cleaned.data(), &statistics)?;
        info!(
            "Flagged {} anomalous pixels (threshold {})",
            mask.total(),
            self.detector.threshold()
        );

        let summaries = summarize(&cleaned, &statistics, &mask)?;

        Ok(AnalysisOutput {
            cleaned,
            statistics,
            mask,
            summaries,
        })
    }
}
