use pcd_core::pointcloud::view::PointView;

pub mod affine;

pub trait Transform {
    fn transform(&self, view: PointView) -> Vec<PointView>;
}

/// Runs each transform over every view produced by the previous one.
pub struct CompositeTransform {
    transforms: Vec<Box<dyn Transform>>,
}

impl CompositeTransform {
    pub fn new(transforms: Vec<Box<dyn Transform>>) -> Self {
        Self { transforms }
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl Transform for CompositeTransform {
    fn transform(&self, view: PointView) -> Vec<PointView> {
        let mut intermediate = vec![view];

        for transform in &self.transforms {
            let mut next_stage = Vec::new();
            for v in intermediate {
                let transformed = transform.transform(v);
                next_stage.extend(transformed);
            }
            intermediate = next_stage;
        }

        intermediate
    }
}

#[cfg(test)]
mod tests {
    use pcd_core::pointcloud::point::Point;

    use super::*;

    struct Split;

    impl Transform for Split {
        fn transform(&self, view: PointView) -> Vec<PointView> {
            let mut first = view.make_new();
            let mut second = view.make_new();
            for (i, point) in view.iter().enumerate() {
                if i % 2 == 0 {
                    first.push(*point);
                } else {
                    second.push(*point);
                }
            }
            vec![first, second]
        }
    }

    #[test]
    fn test_composite_feeds_every_view_to_next_stage() {
        let view: PointView = (0..4).map(|i| Point::new(i as f64, 0.0, 0.0)).collect();
        let composite = CompositeTransform::new(vec![Box::new(Split), Box::new(Split)]);

        let views = composite.transform(view);
        assert_eq!(views.len(), 4);
        assert_eq!(views.iter().map(PointView::len).sum::<usize>(), 4);
        assert_eq!(views[0].point(0).x, 0.0);
        assert_eq!(views[1].point(0).x, 2.0);
    }

    #[test]
    fn test_empty_composite_is_identity() {
        let view: PointView = (0..3).map(|i| Point::new(i as f64, 1.0, 2.0)).collect();
        let composite = CompositeTransform::new(vec![]);
        assert!(composite.is_empty());

        let views = composite.transform(view.clone());
        assert_eq!(views, vec![view]);
    }
}
