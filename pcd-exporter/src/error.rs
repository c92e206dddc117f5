use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("file extension is not found: {0}")]
    MissingExtension(PathBuf),
    #[error("unsupported output extension: {0}")]
    UnsupportedExtension(String),
    #[error("failed to write LAS file {path}: {source}")]
    Las { path: PathBuf, source: las::Error },
    #[error("failed to write delimited text {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
