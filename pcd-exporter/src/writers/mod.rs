use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

use pcd_core::pointcloud::view::PointView;

use crate::ExportError;

pub mod csv;
pub mod las;

pub trait Exporter {
    /// Writes all views, concatenated in order, to one output.
    fn export(&self, views: &[PointView]) -> Result<(), ExportError>;
}

/// Picks a writer from the file extension of `filename`.
pub fn exporter_for(filename: &Path) -> Result<Box<dyn Exporter>, ExportError> {
    let extension = filename
        .extension()
        .and_then(OsStr::to_str)
        .ok_or_else(|| ExportError::MissingExtension(filename.to_path_buf()))?;
    let filename = PathBuf::from(filename);

    let exporter: Box<dyn Exporter> = match extension.to_ascii_lowercase().as_str() {
        "las" | "laz" => Box::new(las::LasExporter { filename }),
        "csv" | "txt" => Box::new(csv::CsvExporter { filename }),
        _ => return Err(ExportError::UnsupportedExtension(extension.to_string())),
    };
    Ok(exporter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exporter_for_rejects_unknown_formats() {
        assert!(exporter_for(Path::new("out.las")).is_ok());
        assert!(exporter_for(Path::new("out.TXT")).is_ok());
        assert!(matches!(
            exporter_for(Path::new("out.ply")),
            Err(ExportError::UnsupportedExtension(_))
        ));
        assert!(matches!(
            exporter_for(Path::new("out")),
            Err(ExportError::MissingExtension(_))
        ));
    }
}
