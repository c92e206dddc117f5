pub mod geokeys;
pub mod point;
pub mod srs;
pub mod view;
