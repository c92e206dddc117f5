use pcd_exporter::ExportError;
use pcd_parser::ParseError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to parse pipeline: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid pipeline: {0}")]
    InvalidPipeline(String),
    #[error(transparent)]
    Read(#[from] ParseError),
    #[error(transparent)]
    Write(#[from] ExportError),
}
