use std::path::Path;

use pcd_core::pointcloud::{point::BoundingVolume, srs::EpsgCode, view::PointView};
use pcd_pipeline::{
    description::{FileStage, PipelineDescription, Stage},
    read_description, transform_description, Executor, PipelineManager,
};

use crate::PointCloudError;

/// One loaded point cloud: the point view it owns plus the metadata derived from it when it
/// was read.
///
/// A cloud starts out empty and becomes usable after a successful `read*` call. Every read
/// first releases whatever the cloud held before, so a failed read leaves it empty rather
/// than half-populated.
#[derive(Debug, Default)]
pub struct PointCloud {
    geodetic_zone: i32,
    point_count: usize,
    offset: [i64; 3],
    bounds: BoundingVolume,
    points: Option<PointView>,
}

impl PointCloud {
    pub fn new() -> Self {
        Self::default()
    }

    /// UTM zone of the source (negative south of the equator), 0 when unknown.
    pub fn geodetic_zone(&self) -> i32 {
        self.geodetic_zone
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    /// Floor of the minimum bound on each axis.
    pub fn offset(&self) -> [i64; 3] {
        self.offset
    }

    pub fn bounds(&self) -> &BoundingVolume {
        &self.bounds
    }

    pub fn points(&self) -> Option<&PointView> {
        self.points.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.points.is_some()
    }

    /// Coordinates of point `idx` relative to [`offset`](Self::offset).
    pub fn local_xyz(&self, idx: usize) -> Option<[f64; 3]> {
        let point = self.points.as_ref()?.points().get(idx)?;
        Some([
            point.x - self.offset[0] as f64,
            point.y - self.offset[1] as f64,
            point.z - self.offset[2] as f64,
        ])
    }

    pub fn classification(&self, idx: usize) -> Option<u8> {
        let point = self.points.as_ref()?.points().get(idx)?;
        Some(point.attributes.classification)
    }

    /// Reads any format the pipeline engine understands.
    pub fn read(&mut self, path: impl AsRef<Path>) -> Result<(), PointCloudError> {
        self.read_with(PipelineManager::new(), &read_description(path))
    }

    /// Reads `path`, taking `epsg` as its spatial reference regardless of what the file says.
    pub fn read_as(
        &mut self,
        path: impl AsRef<Path>,
        epsg: EpsgCode,
    ) -> Result<(), PointCloudError> {
        let description = PipelineDescription::new(vec![Stage::Reader(
            FileStage::new(path).with_spatial_reference(epsg),
        )]);
        self.read_with(PipelineManager::new(), &description)
    }

    /// Runs `description` on `executor` and adopts the first view it produces.
    ///
    /// The executor is consumed and dropped before this returns, on success or failure.
    pub fn read_with<E: Executor>(
        &mut self,
        mut executor: E,
        description: &PipelineDescription,
    ) -> Result<(), PointCloudError> {
        self.reset();

        let views = executor.execute(&description.to_json()).map_err(|e| {
            log::error!("{e}");
            PointCloudError::from(e)
        })?;

        let mut views = views.into_iter();
        let Some(view) = views.next() else {
            log::warn!("pipeline produced no point views");
            return Err(PointCloudError::Empty);
        };
        if views.len() > 0 {
            log::warn!(
                "source contains {} additional point sets which are not read",
                views.len()
            );
        }

        self.read_view(view)
    }

    /// Adopts an already decoded view and derives bounds, offset, zone and count from it.
    pub fn read_view(&mut self, view: PointView) -> Result<(), PointCloudError> {
        self.reset();

        let Some(bounds) = view.calculate_bounds() else {
            log::warn!("no points found");
            return Err(PointCloudError::Empty);
        };

        self.point_count = view.len();
        self.geodetic_zone = view.spatial_reference().utm_zone();
        self.offset = bounds.floor_min();
        self.bounds = bounds;
        self.points = Some(view);
        Ok(())
    }

    /// Translates the file at `input` by `translate` and writes the result to `output`.
    ///
    /// Nothing is loaded: read `output` afterwards to get the moved cloud.
    pub fn transform_point_cloud(
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        translate: [f64; 3],
    ) -> Result<(), PointCloudError> {
        let description = transform_description(input, output, translate);
        let mut executor = PipelineManager::new();
        executor.execute(&description.to_json()).map_err(|e| {
            log::error!("{e}");
            PointCloudError::from(e)
        })?;
        Ok(())
    }

    /// New cloud holding copies of the points whose classification is `keep_class`, in their
    /// original order.
    ///
    /// When nothing matches, the returned cloud is empty (`point_count() == 0`).
    pub fn crop_to_class(&self, keep_class: u8) -> PointCloud {
        let mut cropped = PointCloud::new();
        let Some(source) = &self.points else {
            log::warn!("crop to class {keep_class} requested on a cloud with no points");
            return cropped;
        };

        let mut view = source.make_new();
        for idx in 0..source.len() {
            if source.classification(idx) == keep_class {
                view.append_point(source, idx);
            }
        }

        if let Err(e) = cropped.read_view(view) {
            log::debug!("crop to class {keep_class}: {e}");
        }
        cropped
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}
