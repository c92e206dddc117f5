use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("file extension is not found: {0}")]
    MissingExtension(PathBuf),
    #[error("unsupported extension: {0}")]
    UnsupportedExtension(String),
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read LAS file {path}: {source}")]
    Las { path: PathBuf, source: las::Error },
    #[error("failed to read delimited text {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("required attribute '{0}' is missing in the header")]
    MissingField(String),
    #[error("failed to parse '{field}' from {value:?}")]
    InvalidValue { field: String, value: String },
}
