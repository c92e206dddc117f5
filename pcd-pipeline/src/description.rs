use std::{fmt, path::Path, str::FromStr};

use serde::Deserialize;
use serde_json::{json, Map, Value};

use pcd_core::pointcloud::srs::{EpsgCode, SpatialReference};

use crate::PipelineError;

pub const TRANSFORMATION_FILTER: &str = "filters.transformation";

/// Row-major 4x4 matrix of a `filters.transformation` stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformationMatrix(pub [f64; 16]);

impl TransformationMatrix {
    pub fn identity() -> Self {
        Self::translation(0.0, 0.0, 0.0)
    }

    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        Self([
            1.0, 0.0, 0.0, dx, //
            0.0, 1.0, 0.0, dy, //
            0.0, 0.0, 1.0, dz, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    pub fn values(&self) -> [f64; 16] {
        self.0
    }
}

impl fmt::Display for TransformationMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

impl FromStr for TransformationMatrix {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PipelineError::InvalidPipeline(format!("invalid matrix: {s:?}"));

        let values = s
            .split_whitespace()
            .map(|v| v.parse::<f64>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;
        let matrix: [f64; 16] = values.try_into().map_err(|_| invalid())?;
        Ok(Self(matrix))
    }
}

/// A file read or written by a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct FileStage {
    pub filename: String,
    /// Replaces the spatial reference found in the file (readers only).
    pub spatial_reference: Option<EpsgCode>,
}

impl FileStage {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            filename: path.as_ref().to_string_lossy().into_owned(),
            spatial_reference: None,
        }
    }

    pub fn with_spatial_reference(mut self, epsg: EpsgCode) -> Self {
        self.spatial_reference = Some(epsg);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Reader(FileStage),
    Transformation(TransformationMatrix),
    Writer(FileStage),
}

/// An ordered list of stages, serialized as `{"pipeline": [...]}`.
///
/// File stages are written as bare path strings where their role is clear from their
/// position: the last stage of a multi-stage pipeline is a writer, every other one a reader.
/// Stages that break that rule get an explicit `readers.*` / `writers.*` type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineDescription {
    stages: Vec<Stage>,
}

impl PipelineDescription {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn to_value(&self) -> Value {
        let count = self.stages.len();
        let stages: Vec<Value> = self
            .stages
            .iter()
            .enumerate()
            .map(|(index, stage)| {
                let positional_writer = count > 1 && index + 1 == count;
                match stage {
                    Stage::Reader(file) => file_stage_value(
                        file,
                        positional_writer.then(|| stage_type("readers", file)),
                    ),
                    Stage::Writer(file) => file_stage_value(
                        file,
                        (!positional_writer).then(|| stage_type("writers", file)),
                    ),
                    Stage::Transformation(matrix) => json!({
                        "type": TRANSFORMATION_FILTER,
                        "matrix": matrix.to_string(),
                    }),
                }
            })
            .collect();
        json!({ "pipeline": stages })
    }

    pub fn to_json(&self) -> String {
        format!("{:#}", self.to_value())
    }

    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        let raw: RawPipeline = serde_json::from_str(json)?;
        let count = raw.pipeline.len();

        let stages = raw
            .pipeline
            .into_iter()
            .enumerate()
            .map(|(index, raw_stage)| {
                let positional_writer = count > 1 && index + 1 == count;
                raw_stage.into_stage(positional_writer)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { stages })
    }
}

impl fmt::Display for PipelineDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// Pipeline that reads `path` and nothing else.
pub fn read_description(path: impl AsRef<Path>) -> PipelineDescription {
    PipelineDescription::new(vec![Stage::Reader(FileStage::new(path))])
}

/// Pipeline that reads `input`, translates every point by `translate` and writes `output`.
pub fn transform_description(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    translate: [f64; 3],
) -> PipelineDescription {
    let [dx, dy, dz] = translate;
    PipelineDescription::new(vec![
        Stage::Reader(FileStage::new(input)),
        Stage::Transformation(TransformationMatrix::translation(dx, dy, dz)),
        Stage::Writer(FileStage::new(output)),
    ])
}

fn stage_type(kind: &str, file: &FileStage) -> String {
    let extension = Path::new(&file.filename)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let driver = match extension.as_str() {
        "las" | "laz" => "las",
        "csv" | "txt" => "text",
        other => other,
    };
    format!("{kind}.{driver}")
}

fn file_stage_value(file: &FileStage, explicit_type: Option<String>) -> Value {
    if explicit_type.is_none() && file.spatial_reference.is_none() {
        return Value::String(file.filename.clone());
    }
    let mut object = Map::new();
    if let Some(kind) = explicit_type {
        object.insert("type".to_string(), Value::String(kind));
    }
    object.insert("filename".to_string(), Value::String(file.filename.clone()));
    if let Some(epsg) = file.spatial_reference {
        object.insert(
            "spatialreference".to_string(),
            Value::String(SpatialReference::from_epsg(epsg).to_string()),
        );
    }
    Value::Object(object)
}

#[derive(Deserialize)]
struct RawPipeline {
    pipeline: Vec<RawStage>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawStage {
    Path(String),
    Object(RawStageObject),
}

#[derive(Deserialize)]
struct RawStageObject {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    matrix: Option<String>,
    #[serde(rename = "spatialreference", default)]
    spatial_reference: Option<String>,
}

impl RawStage {
    fn into_stage(self, positional_writer: bool) -> Result<Stage, PipelineError> {
        let object = match self {
            RawStage::Path(filename) => {
                let file = FileStage {
                    filename,
                    spatial_reference: None,
                };
                return Ok(if positional_writer {
                    Stage::Writer(file)
                } else {
                    Stage::Reader(file)
                });
            }
            RawStage::Object(object) => object,
        };

        match object.kind.as_deref() {
            Some(TRANSFORMATION_FILTER) => {
                let matrix = object.matrix.as_deref().ok_or_else(|| {
                    PipelineError::InvalidPipeline(format!(
                        "{TRANSFORMATION_FILTER} requires a matrix"
                    ))
                })?;
                Ok(Stage::Transformation(matrix.parse()?))
            }
            Some(kind) if kind.starts_with("readers.") => Ok(Stage::Reader(object.into_file()?)),
            Some(kind) if kind.starts_with("writers.") => Ok(Stage::Writer(object.into_file()?)),
            Some(kind) => Err(PipelineError::InvalidPipeline(format!(
                "unsupported stage type: {kind}"
            ))),
            None if positional_writer => Ok(Stage::Writer(object.into_file()?)),
            None => Ok(Stage::Reader(object.into_file()?)),
        }
    }
}

impl RawStageObject {
    fn into_file(self) -> Result<FileStage, PipelineError> {
        let filename = self.filename.ok_or_else(|| {
            PipelineError::InvalidPipeline("file stage requires a filename".to_string())
        })?;
        let spatial_reference = self
            .spatial_reference
            .map(|srs| {
                srs.parse::<SpatialReference>()
                    .ok()
                    .and_then(|srs| srs.epsg)
                    .ok_or_else(|| {
                        PipelineError::InvalidPipeline(format!(
                            "unsupported spatial reference: {srs:?}"
                        ))
                    })
            })
            .transpose()?;
        Ok(FileStage {
            filename,
            spatial_reference,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_description_is_a_single_path() {
        let description = read_description("/data/tile_01.las");
        assert_eq!(
            description.to_value(),
            json!({ "pipeline": ["/data/tile_01.las"] })
        );
    }

    #[test]
    fn test_transform_description_has_three_stages() {
        let description = transform_description("in.las", "out.laz", [10.5, -2.0, 0.0]);
        assert_eq!(
            description.to_value(),
            json!({
                "pipeline": [
                    "in.las",
                    {
                        "type": "filters.transformation",
                        "matrix": "1 0 0 10.5 0 1 0 -2 0 0 1 0 0 0 0 1"
                    },
                    "out.laz"
                ]
            })
        );
    }

    #[test]
    fn test_default_translation_is_identity() {
        let description = transform_description("in.las", "out.las", [0.0; 3]);
        assert_eq!(
            description.stages()[1],
            Stage::Transformation(TransformationMatrix::identity())
        );
    }

    #[test]
    fn test_paths_with_quotes_are_escaped() {
        let description = read_description(r#"C:\scans\"odd" name.las"#);
        let json = description.to_json();
        let parsed = PipelineDescription::from_json(&json).unwrap();
        assert_eq!(parsed, description);
    }

    #[test]
    fn test_descriptions_survive_json() {
        for description in [
            read_description("a.las"),
            transform_description("a.las", "b.csv", [1.25, 2.0, -3.0]),
            PipelineDescription::default()
                .with_stage(Stage::Reader(FileStage::new("a.las")))
                .with_stage(Stage::Reader(
                    FileStage::new("b.txt").with_spatial_reference(32618),
                )),
            PipelineDescription::default().with_stage(Stage::Writer(FileStage::new("x.las"))),
        ] {
            let parsed = PipelineDescription::from_json(&description.to_json()).unwrap();
            assert_eq!(parsed, description);
        }
    }

    #[test]
    fn test_trailing_reader_gets_explicit_type() {
        let description = PipelineDescription::new(vec![
            Stage::Reader(FileStage::new("a.las")),
            Stage::Reader(FileStage::new("b.csv")),
        ]);
        assert_eq!(
            description.to_value(),
            json!({ "pipeline": ["a.las", { "type": "readers.text", "filename": "b.csv" }] })
        );
    }

    #[test]
    fn test_positional_inference() {
        let parsed = PipelineDescription::from_json(
            r#"{ "pipeline": [ "in.las", { "filename": "out.las" } ] }"#,
        )
        .unwrap();
        assert_eq!(
            parsed.stages(),
            &[
                Stage::Reader(FileStage::new("in.las")),
                Stage::Writer(FileStage::new("out.las")),
            ]
        );
    }

    #[test]
    fn test_malformed_descriptions() {
        assert!(matches!(
            PipelineDescription::from_json("{ \"pipeline\": "),
            Err(PipelineError::Json(_))
        ));
        assert!(matches!(
            PipelineDescription::from_json(r#"{ "pipeline": [ { "type": "filters.crop" } ] }"#),
            Err(PipelineError::InvalidPipeline(_))
        ));
        assert!(matches!(
            PipelineDescription::from_json(
                r#"{ "pipeline": [
                    "a.las",
                    { "type": "filters.transformation", "matrix": "1 0 0" }
                ] }"#
            ),
            Err(PipelineError::InvalidPipeline(_))
        ));
        assert!(matches!(
            PipelineDescription::from_json(
                r#"{ "pipeline": [ { "filename": "a.las", "spatialreference": "+proj=utm" } ] }"#
            ),
            Err(PipelineError::InvalidPipeline(_))
        ));
    }

    #[test]
    fn test_matrix_text() {
        let matrix = TransformationMatrix::translation(0.5, 0.0, -1.0);
        assert_eq!(matrix.to_string(), "1 0 0 0.5 0 1 0 0 0 0 1 -1 0 0 0 1");
        assert_eq!(matrix.to_string().parse::<TransformationMatrix>().unwrap(), matrix);
    }
}
