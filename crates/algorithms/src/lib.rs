//! # CropWatch Algorithms
//!
//! Analysis of vegetation-index time series.
//!
//! ## Available Algorithm Categories
//!
//! - **preprocessing**: cleaning of fill values and impossible readings
//! - **analysis**: frame statistics, z-score anomaly detection, summaries
//! - **pipeline**: clean, analyze and summarize a stack in one call

pub mod analysis;
pub mod pipeline;
pub mod preprocessing;
pub(crate) mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::analysis::{
        frame_statistics, pixel_records, summarize, AnomalyDetector, AnomalyMask,
        DegenerateFrame, FrameStatistics,
    };
    pub use crate::pipeline::{AnalysisOutput, AnalysisPipeline};
    pub use crate::preprocessing::{clean, clean_stack, CleanParams, Cleaner};
    pub use cropwatch_core::prelude::*;
}
