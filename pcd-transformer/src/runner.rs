use pcd_core::pointcloud::view::PointView;

use crate::{transform::Transform, TransformBuilder};

pub trait Transformer {
    fn execute(&self, views: Vec<PointView>) -> Vec<PointView>;
}

pub struct PointViewTransformer {
    transform: Box<dyn Transform>,
}

impl PointViewTransformer {
    pub fn new(builder: &dyn TransformBuilder) -> Self {
        Self {
            transform: builder.build(),
        }
    }
}

impl Transformer for PointViewTransformer {
    fn execute(&self, views: Vec<PointView>) -> Vec<PointView> {
        let start = std::time::Instant::now();
        let transformed: Vec<PointView> = views
            .into_iter()
            .flat_map(|view| self.transform.transform(view))
            .collect();
        log::debug!(
            "transformed {} views in {:?}",
            transformed.len(),
            start.elapsed()
        );
        transformed
    }
}
