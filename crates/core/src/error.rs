//! Error types for CropWatch

use thiserror::Error;

/// Main error type for CropWatch operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input cannot be reduced per frame (wrong dimensionality or layout)
    #[error("Shape error: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    #[error("Frame size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Result store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shape error for an array of the wrong dimensionality
    pub fn shape(expected: impl Into<String>, actual: &[usize]) -> Self {
        Error::Shape {
            expected: expected.into(),
            actual: format!("{:?}", actual),
        }
    }
}

impl From<ndarray::ShapeError> for Error {
    fn from(e: ndarray::ShapeError) -> Self {
        Error::Shape {
            expected: "compatible array layout".to_string(),
            actual: e.to_string(),
        }
    }
}

/// Result type alias for CropWatch operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_error_message_lists_dims() {
        let err = Error::shape("3-D (time, row, col) array", &[4]);
        assert_eq!(
            err.to_string(),
            "Shape error: expected 3-D (time, row, col) array, got [4]"
        );
    }
}
