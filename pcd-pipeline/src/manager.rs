use std::path::Path;

use pcd_core::pointcloud::{srs::SpatialReference, view::PointView};
use pcd_exporter::exporter_for;
use pcd_parser::parsers::provider_for;
use pcd_transformer::{
    builder::{FilterChainBuilder, FilterSpec},
    runner::PointViewTransformer,
    Transformer as _,
};

use crate::{
    description::{PipelineDescription, Stage},
    PipelineError,
};

/// Something that can run a serialized pipeline description and hand back the resulting
/// views.
pub trait Executor {
    fn execute(&mut self, pipeline: &str) -> Result<Vec<PointView>, PipelineError>;
}

impl<E: Executor + ?Sized> Executor for &mut E {
    fn execute(&mut self, pipeline: &str) -> Result<Vec<PointView>, PipelineError> {
        (**self).execute(pipeline)
    }
}

/// Runs pipelines in order, stage by stage:
///
/// - a reader appends one view,
/// - a filter is applied to every view read so far,
/// - a writer writes every view read so far, concatenated, to one file.
///
/// The views are returned in the order their readers appear.
#[derive(Debug, Default)]
pub struct PipelineManager;

impl PipelineManager {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, description: &PipelineDescription) -> Result<Vec<PointView>, PipelineError> {
        let stages = description.stages();
        if !matches!(stages.first(), Some(Stage::Reader(_))) {
            return Err(PipelineError::InvalidPipeline(
                "pipeline must start with a reader".to_string(),
            ));
        }

        let start = std::time::Instant::now();
        let mut views = Vec::new();
        for stage in stages {
            views = self.run_stage(stage, views)?;
        }
        log::info!(
            "executed {} stages into {} views in {:?}",
            stages.len(),
            views.len(),
            start.elapsed()
        );

        Ok(views)
    }

    fn run_stage(
        &self,
        stage: &Stage,
        mut views: Vec<PointView>,
    ) -> Result<Vec<PointView>, PipelineError> {
        match stage {
            Stage::Reader(file) => {
                log::debug!("reading {}", file.filename);
                let provider = provider_for(
                    Path::new(&file.filename),
                    file.spatial_reference.map(SpatialReference::from_epsg),
                )?;
                views.push(provider.get_parser().parse()?);
                Ok(views)
            }
            Stage::Transformation(matrix) => {
                let builder = FilterChainBuilder::new(vec![FilterSpec::Transformation(
                    matrix.values(),
                )]);
                Ok(PointViewTransformer::new(&builder).execute(views))
            }
            Stage::Writer(file) => {
                log::debug!("writing {}", file.filename);
                exporter_for(Path::new(&file.filename))?.export(&views)?;
                Ok(views)
            }
        }
    }
}

impl Executor for PipelineManager {
    fn execute(&mut self, pipeline: &str) -> Result<Vec<PointView>, PipelineError> {
        let description = PipelineDescription::from_json(pipeline)?;
        self.run(&description)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::description::{read_description, transform_description, FileStage};

    fn write_csv(dir: &Path, name: &str, contents: &str) -> String {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_read_pipeline_yields_one_view() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_csv(dir.path(), "in.csv", "x,y,z,classification\n1,2,3,2\n4,5,6,3\n");

        let views = PipelineManager::new()
            .execute(&read_description(&input).to_json())
            .unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].len(), 2);
    }

    #[test]
    fn test_every_reader_adds_a_view() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_csv(dir.path(), "a.csv", "x,y,z\n1,2,3\n");
        let b = write_csv(dir.path(), "b.csv", "x,y,z\n4,5,6\n7,8,9\n");

        let description = PipelineDescription::new(vec![
            Stage::Reader(FileStage::new(&a)),
            Stage::Reader(FileStage::new(&b).with_spatial_reference(32618)),
        ]);
        let views = PipelineManager::new()
            .execute(&description.to_json())
            .unwrap();

        assert_eq!(views.len(), 2);
        assert_eq!(views[0].len(), 1);
        assert_eq!(views[1].len(), 2);
        assert_eq!(views[1].spatial_reference().utm_zone(), 18);
    }

    #[test]
    fn test_transform_pipeline_writes_translated_points() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_csv(dir.path(), "in.csv", "x,y,z\n1,2,3\n-1,0,0.5\n");
        let output = dir.path().join("out.csv");

        let description = transform_description(&input, &output, [10.0, 20.0, -1.0]);
        let views = PipelineManager::new()
            .execute(&description.to_json())
            .unwrap();
        assert_eq!(views[0].point(0).xyz(), [11.0, 22.0, 2.0]);

        let written = PipelineManager::new()
            .execute(&read_description(&output).to_json())
            .unwrap();
        assert_eq!(written[0].point(1).xyz(), [9.0, 20.0, -0.5]);
    }

    #[test]
    fn test_engine_errors() {
        let mut manager = PipelineManager::new();

        assert!(matches!(
            manager.execute("not json"),
            Err(PipelineError::Json(_))
        ));
        assert!(matches!(
            manager.execute(r#"{ "pipeline": [] }"#),
            Err(PipelineError::InvalidPipeline(_))
        ));
        assert!(matches!(
            manager.execute(&read_description("/nonexistent/cloud.las").to_json()),
            Err(PipelineError::Read(_))
        ));
        assert!(matches!(
            manager.execute(&read_description("/nonexistent/cloud.ply").to_json()),
            Err(PipelineError::Read(_))
        ));
    }

    #[test]
    fn test_unwritable_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_csv(dir.path(), "in.csv", "x,y,z\n1,2,3\n");
        let output = dir.path().join("missing-dir").join("out.las");

        let description = transform_description(&input, &output, [0.0; 3]);
        assert!(matches!(
            PipelineManager::new().execute(&description.to_json()),
            Err(PipelineError::Write(_))
        ));
    }
}
