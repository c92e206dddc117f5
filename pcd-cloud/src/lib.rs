pub mod cloud;
pub mod error;

pub use cloud::PointCloud;
pub use error::PointCloudError;
