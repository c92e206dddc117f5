use std::path::PathBuf;

use las::{Header, Reader};

use pcd_core::pointcloud::{
    geokeys::{spatial_reference_from_records, PROJECTION_USER_ID},
    point::{Color, Point, PointAttributes, OVERLAP_CLASSIFICATION},
    srs::SpatialReference,
    view::PointView,
};

use super::{Parser, ParserProvider};
use crate::ParseError;

pub struct LasParserProvider {
    pub filenames: Vec<PathBuf>,
    pub spatial_reference: Option<SpatialReference>,
}

impl ParserProvider for LasParserProvider {
    fn get_parser(&self) -> Box<dyn Parser> {
        Box::new(LasParser {
            filenames: self.filenames.clone(),
            spatial_reference: self.spatial_reference.clone(),
        })
    }
}

/// Reads LAS/LAZ files into a single view, files concatenated in order.
///
/// The spatial reference comes from the projection VLRs of the first file that has one,
/// unless `spatial_reference` overrides it.
pub struct LasParser {
    pub filenames: Vec<PathBuf>,
    pub spatial_reference: Option<SpatialReference>,
}

impl Parser for LasParser {
    fn parse(&self) -> Result<PointView, ParseError> {
        let mut view = PointView::default();

        for filename in &self.filenames {
            let start = std::time::Instant::now();
            let mut reader = Reader::from_path(filename).map_err(|source| ParseError::Las {
                path: filename.clone(),
                source,
            })?;

            if view.spatial_reference().is_empty() {
                view.set_spatial_reference(spatial_reference_from_header(reader.header()));
            }

            let mut count = 0;
            for las_point in reader.points() {
                let las_point = las_point.map_err(|source| ParseError::Las {
                    path: filename.clone(),
                    source,
                })?;
                view.push(convert_las_point(las_point));
                count += 1;
            }
            log::debug!(
                "read {} points from {:?} in {:?}",
                count,
                filename,
                start.elapsed()
            );
        }

        if let Some(spatial_reference) = &self.spatial_reference {
            view.set_spatial_reference(spatial_reference.clone());
        }

        Ok(view)
    }
}

fn spatial_reference_from_header(header: &Header) -> SpatialReference {
    let records = header
        .vlrs()
        .iter()
        .chain(header.evlrs().iter())
        .filter(|vlr| vlr.user_id == PROJECTION_USER_ID)
        .map(|vlr| (vlr.record_id, vlr.data.as_slice()));
    spatial_reference_from_records(records)
}

fn convert_las_point(las_point: las::Point) -> Point {
    let color = las_point
        .color
        .map(|c| Color {
            r: c.red,
            g: c.green,
            b: c.blue,
        })
        .unwrap_or_default();

    let attributes = PointAttributes {
        intensity: las_point.intensity,
        return_number: las_point.return_number,
        number_of_returns: las_point.number_of_returns,
        classification: classification_code(&las_point),
        scan_angle: las_point.scan_angle,
        user_data: las_point.user_data,
        point_source_id: las_point.point_source_id,
        gps_time: las_point.gps_time,
    };

    Point {
        x: las_point.x,
        y: las_point.y,
        z: las_point.z,
        color,
        attributes,
    }
}

/// LAS 1.4 flags overlap points separately; they read back as class 12.
fn classification_code(las_point: &las::Point) -> u8 {
    if las_point.is_overlap {
        OVERLAP_CLASSIFICATION
    } else {
        u8::from(las_point.classification)
    }
}
