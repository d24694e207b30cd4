//! Period view handoff file for the downstream persistence layer.

use std::io::Write;
use std::path::{Path, PathBuf};

use period_core::error::{PeriodError, Result};
use period_core::models::PeriodView;
use period_core::settings::OutputFormat;
use tracing::debug;

/// Write `views` to `path`, replacing it only once the whole file is written.
///
/// On failure the temporary sibling is removed and `path` is left untouched.
pub fn write_period_views(path: &Path, views: &[PeriodView], format: OutputFormat) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| write_error(path, e))?;
    }

    let tmp = temp_path(path);
    let written = write_temp(&tmp, path, views, format)
        .and_then(|()| std::fs::rename(&tmp, path).map_err(|e| write_error(path, e)));
    if let Err(err) = written {
        if let Err(cleanup) = std::fs::remove_file(&tmp) {
            debug!("Could not remove {}: {}", tmp.display(), cleanup);
        }
        return Err(err);
    }

    debug!("Wrote {} periods to {}", views.len(), path.display());
    Ok(())
}

fn write_temp(tmp: &Path, path: &Path, views: &[PeriodView], format: OutputFormat) -> Result<()> {
    let file = std::fs::File::create(tmp).map_err(|e| write_error(path, e))?;
    let mut out = std::io::BufWriter::new(file);
    write_period_views_to(&mut out, views, format).map_err(|e| match e {
        PeriodError::Csv { source, .. } => PeriodError::Csv {
            path: path.to_path_buf(),
            source,
        },
        PeriodError::Io(source) => write_error(path, source),
        other => other,
    })?;
    out.flush().map_err(|e| write_error(path, e))
}

fn write_error(path: &Path, source: std::io::Error) -> PeriodError {
    PeriodError::FileWrite {
        path: path.to_path_buf(),
        source,
    }
}

/// Serialize `views` into any writer.
///
/// CSV output is semicolon-separated with a header row of field names;
/// timestamps are RFC 3339 with their original offset.
pub fn write_period_views_to<W: Write>(
    writer: W,
    views: &[PeriodView],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Csv => {
            let csv_error = |source: csv::Error| PeriodError::Csv {
                path: PathBuf::from("<output>"),
                source,
            };
            let mut csv_writer = csv::WriterBuilder::new()
                .delimiter(b';')
                .has_headers(true)
                .from_writer(writer);
            if views.is_empty() {
                csv_writer.write_record(HEADER).map_err(csv_error)?;
            }
            for view in views {
                csv_writer.serialize(view).map_err(csv_error)?;
            }
            csv_writer.flush()?;
        }
        OutputFormat::Json => {
            let mut writer = writer;
            serde_json::to_writer_pretty(&mut writer, views)?;
            writer.write_all(b"\n")?;
        }
    }
    Ok(())
}

/// Column order of the CSV output.
const HEADER: [&str; 8] = [
    "endpoint_id",
    "mode_start",
    "mode_end",
    "mode_duration",
    "label",
    "reason",
    "operator_name",
    "energy_sum",
];

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
