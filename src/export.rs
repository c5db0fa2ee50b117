//! CSV export for forecast results.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::core::ForecastResult;
use crate::error::{ForecastError, Result};

const HEADER: [&str; 4] = ["date", "forecast", "ci_lower", "ci_upper"];

/// Exports a forecast to a CSV file at the given path.
///
/// # Errors
///
/// Returns `ForecastError::Export` if file creation or writing fails.
pub fn export_csv(result: &ForecastResult, path: &Path) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| ForecastError::Export(format!("cannot create \"{}\": {e}", path.display())))?;
    write_forecast_csv(result, io::BufWriter::new(file))
}

/// Writes a forecast as CSV to any writer.
///
/// One row per forecast day with `date,forecast,ci_lower,ci_upper`, values
/// to two decimals. Output is deterministic for identical inputs.
///
/// # Errors
///
/// Returns `ForecastError::Export` if writing fails.
pub fn write_forecast_csv(result: &ForecastResult, writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HEADER)?;

    let rows = result
        .forecast()
        .iter()
        .zip(result.ci_lower().values())
        .zip(result.ci_upper().values());
    for (((date, point), lower), upper) in rows {
        wtr.write_record(&[
            date.format("%Y-%m-%d").to_string(),
            format!("{point:.2}"),
            format!("{lower:.2}"),
            format!("{upper:.2}"),
        ])?;
    }

    wtr.flush()
        .map_err(|e| ForecastError::Export(e.to_string()))?;
    Ok(())
}

/// Renders a forecast as a CSV string.
pub fn forecast_csv_string(result: &ForecastResult) -> Result<String> {
    let mut buf = Vec::new();
    write_forecast_csv(result, &mut buf)?;
    String::from_utf8(buf).map_err(|e| ForecastError::Export(e.to_string()))
}
