pub mod error;
pub mod writers;

pub use error::ExportError;
pub use writers::{exporter_for, Exporter};
