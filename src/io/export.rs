//! CSV export for forecast series.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::forecast::ForecastPoint;

/// Column header for CSV forecast export.
const HEADER: [&str; 4] = ["timestamp", "hour_label", "carbon_intensity", "clean"];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Exports a forecast series to a CSV file at the given path.
///
/// Writes a header row followed by one data row per hour. The `clean`
/// column is `true` when the hour's intensity is below `green_threshold`.
///
/// # Arguments
///
/// * `points` - Forecast series, current hour first
/// * `green_threshold` - Intensity below which an hour counts as clean (gCO2/kWh)
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(points: &[ForecastPoint], green_threshold: f64, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(points, green_threshold, buf)
}

/// Writes a forecast series as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(
    points: &[ForecastPoint],
    green_threshold: f64,
    writer: impl Write,
) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HEADER)?;

    for p in points {
        let clean = f64::from(p.carbon_intensity) < green_threshold;
        wtr.write_record(&[
            p.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            p.hour_label.clone(),
            p.carbon_intensity.to_string(),
            clean.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .unwrap()
    }

    fn series(values: &[u32]) -> Vec<ForecastPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| ForecastPoint::new(at(i as u32), v))
            .collect()
    }

    fn render(points: &[ForecastPoint]) -> String {
        let mut buf = Vec::new();
        write_csv(points, 180.0, &mut buf).ok();
        String::from_utf8(buf).ok().unwrap_or_default()
    }

    #[test]
    fn header_row() {
        let output = render(&series(&[100]));
        let first_line = output.lines().next().unwrap_or("");
        assert_eq!(first_line, "timestamp,hour_label,carbon_intensity,clean");
    }

    #[test]
    fn row_count_matches_hours() {
        let output = render(&series(&[100; 24]));
        // 1 header + 24 data rows
        assert_eq!(output.lines().count(), 25);
    }

    #[test]
    fn rows_carry_label_and_clean_flag() {
        let output = render(&series(&[120, 180, 250]));
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[1], "2024-05-01T00:00,0:00,120,true");
        assert_eq!(lines[2], "2024-05-01T01:00,1:00,180,false");
        assert_eq!(lines[3], "2024-05-01T02:00,2:00,250,false");
    }

    #[test]
    fn empty_series_writes_header_only() {
        let output = render(&[]);
        assert_eq!(output.lines().count(), 1);
    }

    #[test]
    fn export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forecast.csv");
        export_csv(&series(&[90, 95]), 180.0, &path).unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = rdr.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][2], "95");
    }

    #[test]
    fn export_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("forecast.csv");
        assert!(export_csv(&series(&[90]), 180.0, &path).is_err());
    }
}
