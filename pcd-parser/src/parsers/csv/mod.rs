use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead as _, BufReader},
    path::{Path, PathBuf},
};

use csv::{ReaderBuilder, StringRecord};

use pcd_core::pointcloud::{
    point::{Color, Point, PointAttributes, ATTRIBUTE_NAMES},
    srs::SpatialReference,
    view::PointView,
};

use super::{Parser, ParserProvider};
use crate::ParseError;

pub struct CsvParserProvider {
    pub filenames: Vec<PathBuf>,
    pub spatial_reference: Option<SpatialReference>,
}

impl ParserProvider for CsvParserProvider {
    fn get_parser(&self) -> Box<dyn Parser> {
        Box::new(CsvParser {
            filenames: self.filenames.clone(),
            spatial_reference: self.spatial_reference.clone(),
        })
    }
}

/// Reads delimited text. The delimiter is sniffed from the first line (comma, tab,
/// semicolon, otherwise a space). Runs of spaces count as one separator, so column-aligned
/// exports read the same as single-spaced ones. A first line that parses as
/// numbers is data and the columns follow [`ATTRIBUTE_NAMES`].
pub struct CsvParser {
    pub filenames: Vec<PathBuf>,
    pub spatial_reference: Option<SpatialReference>,
}

impl Parser for CsvParser {
    fn parse(&self) -> Result<PointView, ParseError> {
        let mut points = Vec::new();
        for filename in &self.filenames {
            let start = std::time::Instant::now();
            read_points(filename, &mut points)?;
            log::debug!("read {:?} in {:?}", filename, start.elapsed());
        }
        Ok(PointView::new(
            points,
            self.spatial_reference.clone().unwrap_or_default(),
        ))
    }
}

fn read_points(path: &Path, points: &mut Vec<Point>) -> Result<(), ParseError> {
    let io_error = |source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    };
    let csv_error = |source| ParseError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut first_line = String::new();
    BufReader::new(File::open(path).map_err(io_error)?)
        .read_line(&mut first_line)
        .map_err(io_error)?;
    let delimiter = sniff_delimiter(&first_line);

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;

    let mut records = reader
        .records()
        .map(|record| record.map(|record| collapse_whitespace(record, delimiter)));
    let Some(first) = records.next() else {
        return Ok(());
    };
    let first = first.map_err(csv_error)?;

    let has_headers = first
        .iter()
        .any(|field| !field.is_empty() && field.parse::<f64>().is_err());
    let field_mapping = create_field_mapping(&first, has_headers)?;
    if !has_headers {
        points.push(parse_point(&first, &field_mapping)?);
    }

    for record in records {
        let record = record.map_err(csv_error)?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        points.push(parse_point(&record, &field_mapping)?);
    }
    Ok(())
}

fn sniff_delimiter(line: &str) -> u8 {
    [b',', b'\t', b';']
        .into_iter()
        .find(|d| line.as_bytes().contains(d))
        .unwrap_or(b' ')
}

/// Drops the empty fields left between repeated space separators.
fn collapse_whitespace(record: StringRecord, delimiter: u8) -> StringRecord {
    if delimiter != b' ' || !record.iter().any(str::is_empty) {
        return record;
    }
    record.iter().filter(|field| !field.is_empty()).collect()
}

fn normalize(name: &str) -> String {
    name.to_lowercase().replace(['_', '-'], "")
}

fn create_field_mapping(
    headers: &StringRecord,
    has_headers: bool,
) -> Result<HashMap<&'static str, usize>, ParseError> {
    let mut mapping = HashMap::new();

    if has_headers {
        for (index, header) in headers.iter().enumerate() {
            let normalized_header = normalize(header);
            let name = match normalized_header.as_str() {
                "red" => Some("r"),
                "green" => Some("g"),
                "blue" => Some("b"),
                other => ATTRIBUTE_NAMES
                    .iter()
                    .copied()
                    .find(|attr_name| normalize(attr_name) == other),
            };
            if let Some(name) = name {
                mapping.entry(name).or_insert(index);
            }
        }
    } else {
        for (index, attr_name) in ATTRIBUTE_NAMES.iter().enumerate().take(headers.len()) {
            mapping.insert(*attr_name, index);
        }
    }

    for attr_name in ["x", "y", "z"] {
        if !mapping.contains_key(attr_name) {
            return Err(ParseError::MissingField(attr_name.to_string()));
        }
    }

    Ok(mapping)
}

fn get_field_value<'a>(
    record: &'a StringRecord,
    field_mapping: &HashMap<&'static str, usize>,
    field_name: &str,
) -> Option<&'a str> {
    field_mapping
        .get(field_name)
        .and_then(|&index| record.get(index))
        .filter(|value| !value.is_empty())
}

fn parse_optional_field(
    record: &StringRecord,
    field_mapping: &HashMap<&'static str, usize>,
    field_name: &str,
) -> Result<Option<f64>, ParseError> {
    get_field_value(record, field_mapping, field_name)
        .map(|value| {
            value.parse::<f64>().map_err(|_| ParseError::InvalidValue {
                field: field_name.to_string(),
                value: value.to_string(),
            })
        })
        .transpose()
}

fn parse_required_field(
    record: &StringRecord,
    field_mapping: &HashMap<&'static str, usize>,
    field_name: &str,
) -> Result<f64, ParseError> {
    parse_optional_field(record, field_mapping, field_name)?
        .ok_or_else(|| ParseError::MissingField(field_name.to_string()))
}

fn parse_point(
    record: &StringRecord,
    field_mapping: &HashMap<&'static str, usize>,
) -> Result<Point, ParseError> {
    let field = |name| parse_optional_field(record, field_mapping, name);

    let color = Color {
        r: field("r")?.map_or(65535, |v| v.floor() as u16),
        g: field("g")?.map_or(65535, |v| v.floor() as u16),
        b: field("b")?.map_or(65535, |v| v.floor() as u16),
    };

    let attributes = PointAttributes {
        intensity: field("intensity")?.map_or(0, |v| v as u16),
        return_number: field("return_number")?.map_or(0, |v| v as u8),
        number_of_returns: field("number_of_returns")?.map_or(0, |v| v as u8),
        classification: field("classification")?.map_or(0, |v| v as u8),
        scan_angle: field("scan_angle")?.map_or(0.0, |v| v as f32),
        user_data: field("user_data")?.map_or(0, |v| v as u8),
        point_source_id: field("point_source_id")?.map_or(0, |v| v as u16),
        gps_time: field("gps_time")?,
    };

    Ok(Point {
        x: parse_required_field(record, field_mapping, "x")?,
        y: parse_required_field(record, field_mapping, "y")?,
        z: parse_required_field(record, field_mapping, "z")?,
        color,
        attributes,
    })
}
