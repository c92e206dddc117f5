use super::{
    point::{BoundingVolume, Point},
    srs::SpatialReference,
};

/// An ordered collection of points produced by one reader, together with the spatial
/// reference it was read with.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointView {
    points: Vec<Point>,
    spatial_reference: SpatialReference,
}

impl PointView {
    pub fn new(points: Vec<Point>, spatial_reference: SpatialReference) -> Self {
        Self {
            points,
            spatial_reference,
        }
    }

    /// Creates an empty view that shares this view's spatial reference.
    pub fn make_new(&self) -> Self {
        Self {
            points: Vec::new(),
            spatial_reference: self.spatial_reference.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut [Point] {
        &mut self.points
    }

    pub fn spatial_reference(&self) -> &SpatialReference {
        &self.spatial_reference
    }

    pub fn set_spatial_reference(&mut self, spatial_reference: SpatialReference) {
        self.spatial_reference = spatial_reference;
    }

    pub fn point(&self, idx: usize) -> &Point {
        &self.points[idx]
    }

    pub fn classification(&self, idx: usize) -> u8 {
        self.points[idx].attributes.classification
    }

    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Copies the point at `idx` of `source` to the end of this view.
    ///
    /// Panics if `idx` is out of range for `source`.
    pub fn append_point(&mut self, source: &PointView, idx: usize) {
        self.points.push(source.points[idx]);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.points.iter()
    }

    /// Bounds over all points, `None` for an empty view.
    pub fn calculate_bounds(&self) -> Option<BoundingVolume> {
        if self.points.is_empty() {
            return None;
        }
        let mut bounds = BoundingVolume::empty();
        for point in &self.points {
            bounds.expand(point);
        }
        Some(bounds)
    }
}

impl FromIterator<Point> for PointView {
    fn from_iter<T: IntoIterator<Item = Point>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect(), SpatialReference::default())
    }
}
