use crate::transform::{affine::AffineTransform, CompositeTransform, Transform};

pub trait TransformBuilder {
    fn build(&self) -> Box<dyn Transform>;
}

/// Filter stages understood by the transformer, in pipeline order.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterSpec {
    /// Row-major 4x4 matrix.
    Transformation([f64; 16]),
}

pub struct FilterChainBuilder {
    filters: Vec<FilterSpec>,
}

impl FilterChainBuilder {
    pub fn new(filters: Vec<FilterSpec>) -> Self {
        Self { filters }
    }
}

impl TransformBuilder for FilterChainBuilder {
    fn build(&self) -> Box<dyn Transform> {
        let transforms = self
            .filters
            .iter()
            .map(|filter| match filter {
                FilterSpec::Transformation(matrix) => {
                    Box::new(AffineTransform::new(*matrix)) as Box<dyn Transform>
                }
            })
            .collect();

        Box::new(CompositeTransform::new(transforms))
    }
}
