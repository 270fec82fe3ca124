//! Invalid-sample cleaning
//!
//! Turns a raw vegetation-index array into one that is safe to reduce:
//! the sensor fill value and physically impossible readings become NaN,
//! everything else passes through bit-for-bit.

use ndarray::{Array, ArrayBase, Data, Dimension};
use cropwatch_core::raster::{RasterElement, RasterStack};
use cropwatch_core::{Algorithm, Error, Result};
use tracing::debug;

/// Parameters for cleaning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleanParams {
    /// Sentinel written by the sensor for "no reading"; exact matches become NaN
    pub fill_value: f64,
    /// Values strictly below this become NaN
    pub lower_bound: f64,
    /// Values strictly above this become NaN
    pub upper_bound: f64,
}

impl Default for CleanParams {
    fn default() -> Self {
        Self {
            fill_value: -9999.0,
            lower_bound: -10000.0,
            upper_bound: 10000.0,
        }
    }
}

impl CleanParams {
    /// Cleaned value of a single sample
    #[inline]
    pub fn apply(&self, value: f64) -> f64 {
        if value == self.fill_value || value < self.lower_bound || value > self.upper_bound {
            f64::NAN
        } else {
            value
        }
    }
}

/// Cleaning algorithm
#[derive(Debug, Clone, Default)]
pub struct Cleaner;

impl Algorithm for Cleaner {
    type Input = RasterStack;
    type Output = RasterStack;
    type Params = CleanParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Clean"
    }

    fn description(&self) -> &'static str {
        "Replace fill values and out-of-range samples with NaN"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        clean_stack(&input, &params)
    }
}

/// Clean an array of any dimensionality and sample type.
///
/// Returns a new `f64` array of the same shape; the input is untouched.
/// Elements equal to `fill_value`, below `lower_bound` or above
/// `upper_bound` become NaN. Zero is a valid reading and is kept.
///
/// # Example
/// ```ignore
/// let raw = array![[0.2, -9999.0], [0.5, 0.1]];
/// let cleaned = clean(&raw, &CleanParams::default());
/// assert!(cleaned[[0, 1]].is_nan());
/// ```
pub fn clean<T, S, D>(input: &ArrayBase<S, D>, params: &CleanParams) -> Array<f64, D>
where
    T: RasterElement,
    S: Data<Elem = T>,
    D: Dimension,
{
    let cleaned = input.mapv(|v| params.apply(v.to_sample()));

    if tracing::enabled!(tracing::Level::DEBUG) {
        match value_range(input.iter().map(|v| v.to_sample())) {
            Some((min, max)) => debug!("Input min: {}, max: {}", min, max),
            None => debug!("Input has no valid samples"),
        }
        let before = input.iter().filter(|v| v.to_sample().is_nan()).count();
        let after = cleaned.iter().filter(|v| v.is_nan()).count();
        debug!("Cleaning replaced {} of {} samples", after - before, cleaned.len());
    }

    cleaned
}

/// Clean every frame of a stack, keeping its labels
pub fn clean_stack(stack: &RasterStack, params: &CleanParams) -> Result<RasterStack> {
    stack.map_data(clean(stack.data(), params))
}

/// Min and max over non-NaN values
fn value_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.filter(|v| !v.is_nan()).fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}
