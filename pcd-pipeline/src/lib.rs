//! Declarative pipeline descriptions and the engine that executes them.
//!
//! A description is an ordered list of stages (read, filter, write) serialized as JSON:
//!
//! ```json
//! {
//!   "pipeline": [
//!     "input.las",
//!     { "type": "filters.transformation", "matrix": "..." },
//!     "output.las"
//!   ]
//! }
//! ```
//!
//! [`description`] builds these documents; [`manager::PipelineManager`] parses and runs them.

pub mod description;
pub mod error;
pub mod manager;

pub use description::{read_description, transform_description, PipelineDescription, Stage};
pub use error::PipelineError;
pub use manager::{Executor, PipelineManager};
