use crate::error::{CliError, Result};
use metabolon::core::models::network::Network;
use metabolon::engine::history::History;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Writes the rolling history as CSV: a `time` column followed by one column per
/// molecule. Molecules discovered mid-run have empty cells before their first sample.
/// Returns the number of data rows written.
pub fn write_history<W: Write>(history: &History, writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(history.molecules.len() + 1);
    header.push("time");
    header.extend(history.molecules.keys().map(String::as_str));
    csv_writer.write_record(&header)?;

    for (row, time) in history.time.iter().enumerate() {
        let mut record = Vec::with_capacity(header.len());
        record.push(time.to_string());
        for series in history.molecules.values() {
            record.push(
                history
                    .aligned(series, row)
                    .map(|value| value.to_string())
                    .unwrap_or_default(),
            );
        }
        csv_writer.write_record(&record)?;
    }
    csv_writer.flush()?;
    Ok(history.len())
}

pub fn write_history_csv(history: &History, path: &Path) -> Result<usize> {
    let file = File::create(path)?;
    let rows = write_history(history, file)?;
    info!(rows, path = %path.display(), "History written.");
    Ok(rows)
}

pub fn write_network_toml(network: &Network, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(network).map_err(|e| CliError::Output {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    std::fs::write(path, content)?;
    info!(path = %path.display(), "Network written.");
    Ok(())
}
