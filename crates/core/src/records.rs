//! Row types produced by an analysis run
//!
//! These are the shapes handed to the result store and the tabular exporter.

use serde::{Deserialize, Serialize};

/// Per-frame summary: the row persisted by the result store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSummary {
    /// Frame label (observation date or `Time-n`)
    pub label: String,
    /// Mean over valid pixels, NaN for an empty frame
    #[serde(with = "nan_as_null")]
    pub mean: f64,
    /// Population standard deviation over valid pixels, NaN for an empty frame
    #[serde(with = "nan_as_null")]
    pub std: f64,
    /// Number of pixels flagged as anomalous
    pub anomaly_pixels: usize,
}

/// One pixel of one frame: the row written by the tabular exporter.
///
/// Field names serialize as the CSV columns `Date,Y,X,NDVI,Anomaly`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PixelRecord {
    #[serde(rename = "Date")]
    pub label: String,
    #[serde(rename = "Y")]
    pub row: usize,
    #[serde(rename = "X")]
    pub col: usize,
    /// Cleaned value, NaN when missing
    #[serde(rename = "NDVI", serialize_with = "pandas_style::float")]
    pub value: f64,
    #[serde(rename = "Anomaly", serialize_with = "pandas_style::flag")]
    pub anomaly: bool,
}

/// JSON has no NaN: store it as `null` and read `null` back as NaN.
pub(crate) mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

/// Cell rendering of a pandas `to_csv` export: floats in Python `repr` form
/// (`5000.0`, `1e-05`), missing values as an empty cell, flags as `True`/`False`.
pub(crate) mod pandas_style {
    use serde::Serializer;

    pub fn float<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_float(*value))
    }

    pub fn flag<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "True" } else { "False" })
    }

    pub fn format_float(value: f64) -> String {
        if value.is_nan() {
            return String::new();
        }
        // Debug switches to exponent form at the same magnitudes as repr;
        // repr writes the exponent signed and at least two digits wide
        let text = format!("{:?}", value);
        match text.split_once('e') {
            Some((mantissa, exp)) => {
                let (sign, digits) = match exp.strip_prefix('-') {
                    Some(digits) => ('-', digits),
                    None => ('+', exp),
                };
                format!("{}e{}{:0>2}", mantissa, sign, digits)
            }
            None => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nan_statistics_serialize_as_null() {
        let summary = FrameSummary {
            label: "Time-1".to_string(),
            mean: f64::NAN,
            std: f64::NAN,
            anomaly_pixels: 0,
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert_eq!(
            json,
            r#"{"label":"Time-1","mean":null,"std":null,"anomaly_pixels":0}"#
        );

        let back: FrameSummary = serde_json::from_str(&json).unwrap();
        assert!(back.mean.is_nan());
        assert!(back.std.is_nan());
    }

    #[test]
    fn test_pandas_float_rendering() {
        use super::pandas_style::format_float;

        assert_eq!(format_float(5000.0), "5000.0");
        assert_eq!(format_float(0.25), "0.25");
        assert_eq!(format_float(-0.7), "-0.7");
        assert_eq!(format_float(0.0001), "0.0001");
        assert_eq!(format_float(1e-5), "1e-05");
        assert_eq!(format_float(2.5e-12), "2.5e-12");
        assert_eq!(format_float(1e16), "1e+16");
        assert_eq!(format_float(f64::NAN), "");
    }

    #[test]
    fn test_finite_statistics_round_trip() {
        let summary = FrameSummary {
            label: "2023-06".to_string(),
            mean: 0.5,
            std: 0.125,
            anomaly_pixels: 3,
        };
        let json = serde_json::to_string(&summary).unwrap();
        let back: FrameSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, summary);
    }
}
