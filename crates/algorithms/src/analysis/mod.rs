//! Vegetation anomaly analysis
//!
//! - **stats**: per-frame mean and population standard deviation, NaN-aware
//! - **anomaly**: one-sided z-score detector with fixed sensitivity
//! - **mask**: boolean anomaly mask and per-frame counts
//! - **summary**: summary rows and per-pixel records for storage and export

pub mod anomaly;
pub mod mask;
pub mod stats;
pub mod summary;

pub use anomaly::{AnomalyDetector, DEFAULT_EPSILON, DEFAULT_THRESHOLD};
pub use mask::AnomalyMask;
pub use stats::{frame_statistics, DegenerateFrame, FrameStatistics};
pub use summary::{pixel_records, summarize};
