//! Preprocessing applied before any statistics are computed
//!
//! - Clean: fill-value and out-of-range samples become NaN

mod clean;

pub use clean::{clean, clean_stack, CleanParams, Cleaner};
