//! Raster data structures

mod element;
mod stack;

pub use element::RasterElement;
pub use stack::{default_labels, RasterStack};
