use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

use pcd_core::pointcloud::{srs::SpatialReference, view::PointView};

use crate::ParseError;

pub mod csv;
pub mod las;

pub trait ParserProvider {
    fn get_parser(&self) -> Box<dyn Parser>;
}

pub trait Parser {
    fn parse(&self) -> Result<PointView, ParseError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    Las,
    Laz,
    Csv,
    Txt,
}

pub fn get_extension(extension: &str) -> Result<Extension, ParseError> {
    match extension.to_ascii_lowercase().as_str() {
        "las" => Ok(Extension::Las),
        "laz" => Ok(Extension::Laz),
        "csv" => Ok(Extension::Csv),
        "txt" => Ok(Extension::Txt),
        _ => Err(ParseError::UnsupportedExtension(extension.to_string())),
    }
}

pub fn extension_of(path: &Path) -> Result<Extension, ParseError> {
    let extension = path
        .extension()
        .and_then(OsStr::to_str)
        .ok_or_else(|| ParseError::MissingExtension(path.to_path_buf()))?;
    get_extension(extension)
}

/// Picks a provider from the file extension of `filename`.
pub fn provider_for(
    filename: &Path,
    spatial_reference: Option<SpatialReference>,
) -> Result<Box<dyn ParserProvider>, ParseError> {
    let filenames = vec![PathBuf::from(filename)];
    let provider: Box<dyn ParserProvider> = match extension_of(filename)? {
        Extension::Las | Extension::Laz => Box::new(las::LasParserProvider {
            filenames,
            spatial_reference,
        }),
        Extension::Csv | Extension::Txt => Box::new(csv::CsvParserProvider {
            filenames,
            spatial_reference,
        }),
    };
    Ok(provider)
}
