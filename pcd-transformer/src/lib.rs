pub mod builder;
pub mod runner;
pub mod transform;

pub use builder::TransformBuilder;
pub use runner::Transformer;
