//! Per-pixel CSV export

use crate::error::Result;
use crate::records::PixelRecord;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Header line of the exported table
pub const CSV_HEADER: &str = "Date,Y,X,NDVI,Anomaly";

/// Write every pixel record to `path`, creating the parent directory if needed.
///
/// Cells are rendered as pandas would: missing values as an empty cell,
/// floats like `0.25` or `5000.0`, flags as `True`/`False`.
pub fn write_pixel_csv<P: AsRef<Path>>(records: &[PixelRecord], path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut wtr = csv::Writer::from_path(path)?;
    write_records(records, &mut wtr)?;

    info!("Full pixel table ({} rows) saved to {}", records.len(), path.display());
    Ok(())
}

/// Write the header and one line per record into any writer
pub fn write_pixel_rows<W: Write>(records: &[PixelRecord], writer: &mut W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    write_records(records, &mut wtr)
}

fn write_records<W: Write>(records: &[PixelRecord], wtr: &mut csv::Writer<W>) -> Result<()> {
    // The header comes from the first serialized record
    if records.is_empty() {
        wtr.write_record(CSV_HEADER.split(','))?;
    }
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(label: &str, value: f64, anomaly: bool) -> PixelRecord {
        PixelRecord {
            label: label.to_string(),
            row: 1,
            col: 2,
            value,
            anomaly,
        }
    }

    fn render(records: &[PixelRecord]) -> String {
        let mut out = Vec::new();
        write_pixel_rows(records, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_rows_follow_header() {
        let text = render(&[
            record("Time-1", 0.25, true),
            record("Time-1", f64::NAN, false),
            record("Time-1", 5000.0, false),
        ]);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                CSV_HEADER,
                "Time-1,1,2,0.25,True",
                "Time-1,1,2,,False",
                "Time-1,1,2,5000.0,False"
            ]
        );
    }

    #[test]
    fn test_empty_table_keeps_header() {
        assert_eq!(render(&[]), format!("{}\n", CSV_HEADER));
    }

    #[test]
    fn test_labels_with_commas_are_quoted() {
        let text = render(&[record("June, 2023", 0.5, false)]);
        assert!(text.contains("\"June, 2023\",1,2,0.5,False"));
    }

    #[test]
    fn test_file_export_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data/ndvi_full.csv");
        write_pixel_csv(&[record("2023-06", 1e-5, true)], &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, format!("{}\n2023-06,1,2,1e-05,True\n", CSV_HEADER));
    }
}
