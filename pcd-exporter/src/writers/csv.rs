use std::path::PathBuf;

use pcd_core::pointcloud::{
    point::{Point, ATTRIBUTE_NAMES},
    view::PointView,
};

use super::Exporter;
use crate::ExportError;

pub struct CsvExporter {
    pub filename: PathBuf,
}

impl Exporter for CsvExporter {
    fn export(&self, views: &[PointView]) -> Result<(), ExportError> {
        let csv_error = |source| ExportError::Csv {
            path: self.filename.clone(),
            source,
        };

        let mut writer = csv::Writer::from_path(&self.filename).map_err(csv_error)?;
        writer.write_record(ATTRIBUTE_NAMES).map_err(csv_error)?;

        for point in views.iter().flat_map(PointView::iter) {
            writer.write_record(to_record(point)).map_err(csv_error)?;
        }

        writer.flush().map_err(|source| ExportError::Io {
            path: self.filename.clone(),
            source,
        })?;
        Ok(())
    }
}

fn to_record(point: &Point) -> [String; 14] {
    let attributes = &point.attributes;
    [
        point.x.to_string(),
        point.y.to_string(),
        point.z.to_string(),
        attributes.intensity.to_string(),
        attributes.return_number.to_string(),
        attributes.number_of_returns.to_string(),
        attributes.classification.to_string(),
        attributes.scan_angle.to_string(),
        attributes.user_data.to_string(),
        attributes.point_source_id.to_string(),
        attributes.gps_time.map(|t| t.to_string()).unwrap_or_default(),
        point.color.r.to_string(),
        point.color.g.to_string(),
        point.color.b.to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use pcd_core::pointcloud::point::{Color, PointAttributes};
    use pcd_parser::parsers::{csv::CsvParser, Parser as _};

    use super::*;

    #[test]
    fn test_written_text_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let filename = dir.path().join("out.csv");

        let point = Point {
            x: 612345.125,
            y: 4123456.75,
            z: -3.5,
            color: Color { r: 1, g: 2, b: 3 },
            attributes: PointAttributes {
                intensity: 900,
                return_number: 1,
                number_of_returns: 2,
                classification: 6,
                scan_angle: -12.5,
                user_data: 4,
                point_source_id: 17,
                gps_time: Some(123.25),
            },
        };
        let views = vec![
            [point].into_iter().collect::<PointView>(),
            [Point::new(1.0, 2.0, 3.0)].into_iter().collect::<PointView>(),
        ];
        CsvExporter {
            filename: filename.clone(),
        }
        .export(&views)
        .unwrap();

        let parser = CsvParser {
            filenames: vec![filename],
            spatial_reference: None,
        };
        let read = parser.parse().unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(*read.point(0), point);
        assert_eq!(read.point(1).xyz(), [1.0, 2.0, 3.0]);
        assert_eq!(read.point(1).attributes.gps_time, None);
    }
}
