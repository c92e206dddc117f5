use std::path::PathBuf;

use las::{point::Classification, point::Format, Builder, Transform, Vector, Vlr, Writer};

use pcd_core::pointcloud::{
    geokeys::{encode_geo_key_directory, GEO_KEY_DIRECTORY_RECORD_ID, PROJECTION_USER_ID},
    point::{BoundingVolume, Point, OVERLAP_CLASSIFICATION},
    view::PointView,
};

use super::Exporter;
use crate::ExportError;

pub static SCALE_FACTOR: f64 = 0.001;

/// Writes LAS 1.4, point format 7 (GPS time and color, 8-bit classes). A `.laz` filename
/// produces a compressed file.
///
/// Class 12 is written as an unclassified point with the overlap flag set.
///
/// The header offsets are the floored minimum of the data so that coordinates far from the
/// origin still fit the 32-bit integer storage at [`SCALE_FACTOR`].
pub struct LasExporter {
    pub filename: PathBuf,
}

impl Exporter for LasExporter {
    fn export(&self, views: &[PointView]) -> Result<(), ExportError> {
        let las_error = |source| ExportError::Las {
            path: self.filename.clone(),
            source,
        };
        let start = std::time::Instant::now();

        let offset = views
            .iter()
            .filter_map(PointView::calculate_bounds)
            .reduce(|a, b| a.merge(&b))
            .map(|bounds: BoundingVolume| bounds.floor_min())
            .unwrap_or([0, 0, 0]);

        let mut builder = Builder::from((1, 4));
        builder.point_format = Format::new(7).map_err(las_error)?;
        builder.generating_software = format!("pcd-exporter {}", env!("CARGO_PKG_VERSION"));
        builder.transforms = Vector {
            x: Transform {
                scale: SCALE_FACTOR,
                offset: offset[0] as f64,
            },
            y: Transform {
                scale: SCALE_FACTOR,
                offset: offset[1] as f64,
            },
            z: Transform {
                scale: SCALE_FACTOR,
                offset: offset[2] as f64,
            },
        };

        let epsg = views
            .iter()
            .find_map(|view| view.spatial_reference().epsg);
        if let Some(epsg) = epsg {
            builder.vlrs.push(Vlr {
                user_id: PROJECTION_USER_ID.to_string(),
                record_id: GEO_KEY_DIRECTORY_RECORD_ID,
                description: "GeoTiff GeoKeyDirectoryTag".to_string(),
                data: encode_geo_key_directory(epsg),
            });
        }

        let header = builder.into_header().map_err(las_error)?;
        let mut writer = Writer::from_path(&self.filename, header).map_err(las_error)?;

        let mut count = 0usize;
        for point in views.iter().flat_map(PointView::iter) {
            writer
                .write_point(to_las_point(point).map_err(las_error)?)
                .map_err(las_error)?;
            count += 1;
        }
        writer.close().map_err(las_error)?;

        log::debug!(
            "wrote {} points to {:?} in {:?}",
            count,
            self.filename,
            start.elapsed()
        );
        Ok(())
    }
}

fn to_las_point(point: &Point) -> las::Result<las::Point> {
    let attributes = &point.attributes;
    let is_overlap = attributes.classification == OVERLAP_CLASSIFICATION;
    let classification = if is_overlap {
        Classification::CreatedNeverClassified
    } else {
        Classification::new(attributes.classification)?
    };
    Ok(las::Point {
        x: point.x,
        y: point.y,
        z: point.z,
        intensity: attributes.intensity,
        return_number: attributes.return_number,
        number_of_returns: attributes.number_of_returns,
        classification,
        is_overlap,
        scan_angle: attributes.scan_angle,
        user_data: attributes.user_data,
        point_source_id: attributes.point_source_id,
        gps_time: Some(attributes.gps_time.unwrap_or(0.0)),
        color: Some(las::Color {
            red: point.color.r,
            green: point.color.g,
            blue: point.color.b,
        }),
        ..Default::default()
    })
}
