//! # CropWatch Core
//!
//! Core types, traits and I/O for the CropWatch vegetation monitoring tools.
//!
//! This crate provides:
//! - `RasterStack`: time-indexed (time, row, col) stack of `f64` frames
//! - `RasterElement`: raw sample types a loader may hand over
//! - Algorithm trait for consistent API
//! - TIFF frame loading, per-pixel CSV export and the result store

pub mod error;
pub mod io;
pub mod raster;
pub mod records;
pub mod store;

pub use error::{Error, Result};
pub use raster::{RasterElement, RasterStack};
pub use records::{FrameSummary, PixelRecord};
pub use store::{ResultStore, StoredSummary};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::raster::{RasterElement, RasterStack};
    pub use crate::records::{FrameSummary, PixelRecord};
    pub use crate::Algorithm;
}

/// Core trait for all algorithms in CropWatch.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
