use serde::{Deserialize, Serialize};

/// Canonical attribute names, in the column order used for delimited text.
pub const ATTRIBUTE_NAMES: [&str; 14] = [
    "x",
    "y",
    "z",
    "intensity",
    "return_number",
    "number_of_returns",
    "classification",
    "scan_angle",
    "user_data",
    "point_source_id",
    "gps_time",
    "r",
    "g",
    "b",
];

/// ASPRS class for overlap points. LAS 1.4 stores it as a flag rather than a class.
pub const OVERLAP_CLASSIFICATION: u8 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointAttributes {
    pub intensity: u16,
    pub return_number: u8,
    pub number_of_returns: u8,
    pub classification: u8,
    pub scan_angle: f32,
    pub user_data: u8,
    pub point_source_id: u16,
    pub gps_time: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u16,
    pub g: u16,
    pub b: u16,
}

impl Default for Color {
    fn default() -> Self {
        Self {
            r: 65535,
            g: 65535,
            b: 65535,
        }
    }
}

// Coordinates are stored already scaled and offset, i.e. in the native units of the source
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub color: Color,
    pub attributes: PointAttributes,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            ..Default::default()
        }
    }

    pub fn with_classification(mut self, classification: u8) -> Self {
        self.attributes.classification = classification;
        self
    }

    pub fn xyz(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// Axis-aligned box in the native units of the point data, axis order x, y, z.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingVolume {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingVolume {
    /// An inverted box that any point will expand.
    pub fn empty() -> Self {
        Self {
            min: [f64::MAX, f64::MAX, f64::MAX],
            max: [f64::MIN, f64::MIN, f64::MIN],
        }
    }

    pub fn expand(&mut self, point: &Point) {
        for (axis, value) in point.xyz().into_iter().enumerate() {
            self.min[axis] = self.min[axis].min(value);
            self.max[axis] = self.max[axis].max(value);
        }
    }

    pub fn merge(mut self, other: &BoundingVolume) -> Self {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(other.min[axis]);
            self.max[axis] = self.max[axis].max(other.max[axis]);
        }
        self
    }

    pub fn translated(&self, translation: [f64; 3]) -> Self {
        let mut moved = *self;
        for axis in 0..3 {
            moved.min[axis] += translation[axis];
            moved.max[axis] += translation[axis];
        }
        moved
    }

    /// Integer offset that moves the box minimum close to the origin.
    pub fn floor_min(&self) -> [i64; 3] {
        [
            self.min[0].floor() as i64,
            self.min[1].floor() as i64,
            self.min[2].floor() as i64,
        ]
    }
}
