use pcd_pipeline::PipelineError;

#[derive(Debug, thiserror::Error)]
pub enum PointCloudError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("no points found")]
    Empty,
}
