use std::path::PathBuf;
use thiserror::Error;

/// All errors produced while building the period view.
#[derive(Error, Debug)]
pub enum PeriodError {
    /// A file could not be opened or read.
    #[error("Failed to access file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An output file could not be created, written or moved into place.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV reader or writer rejected a file.
    #[error("Malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A timestamp string did not match any recognised format.
    #[error("Invalid timestamp format: {0}")]
    TimestampParse(String),

    /// A cell parsed but holds a value the record does not accept.
    #[error("Invalid value {value:?} in {file}, line {line}, column {column}: {reason}")]
    InvalidValue {
        file: String,
        line: u64,
        column: String,
        value: String,
        reason: String,
    },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A JSON document could not be parsed or produced.
    #[error("Failed to process JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the period crates.
pub type Result<T> = std::result::Result<T, PeriodError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = PeriodError::FileRead {
            path: PathBuf::from("/data/energy.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to access file"));
        assert!(msg.contains("/data/energy.csv"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_file_write() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = PeriodError::FileWrite {
            path: PathBuf::from("/out/period_view.csv"),
            source: io_err,
        };
        assert_eq!(
            err.to_string(),
            "Failed to write file /out/period_view.csv: disk full"
        );
    }

    #[test]
    fn test_error_display_timestamp_parse() {
        let err = PeriodError::TimestampParse("31.02.2021 25:00".to_string());
        assert_eq!(err.to_string(), "Invalid timestamp format: 31.02.2021 25:00");
    }

    #[test]
    fn test_error_display_invalid_value() {
        let err = PeriodError::InvalidValue {
            file: "energy.csv".to_string(),
            line: 4,
            column: "kwh".to_string(),
            value: "abc".to_string(),
            reason: "not a number".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value \"abc\" in energy.csv, line 4, column kwh: not a number"
        );
    }

    #[test]
    fn test_error_display_config() {
        let err = PeriodError::Config("bad utc offset".to_string());
        assert_eq!(err.to_string(), "Configuration error: bad utc offset");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: PeriodError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: PeriodError = json_err.into();
        assert!(err.to_string().contains("Failed to process JSON"));
    }
}
