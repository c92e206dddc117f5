//! GeoTIFF key directory, as stored in the `LASF_Projection` VLRs of LAS files.

use byteorder::{ByteOrder as _, LittleEndian};

use super::srs::{EpsgCode, SpatialReference};

pub const PROJECTION_USER_ID: &str = "LASF_Projection";
pub const GEO_KEY_DIRECTORY_RECORD_ID: u16 = 34735;
pub const WKT_RECORD_ID: u16 = 2112;

const GT_MODEL_TYPE_GEO_KEY: u16 = 1024;
const GT_RASTER_TYPE_GEO_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const USER_DEFINED: u16 = 32767;

/// Reads the EPSG code from a GeoKeyDirectoryTag payload.
///
/// The projected CRS key wins over the geographic one. Keys stored outside the directory
/// (in the double or ASCII params records) and user-defined codes are ignored.
pub fn decode_geo_key_directory(data: &[u8]) -> Option<EpsgCode> {
    if data.len() < 8 {
        return None;
    }
    let words: Vec<u16> = data.chunks_exact(2).map(LittleEndian::read_u16).collect();
    let number_of_keys = words[3] as usize;

    let mut projected = None;
    let mut geographic = None;
    for entry in words[4..].chunks_exact(4).take(number_of_keys) {
        let (key_id, location, value) = (entry[0], entry[1], entry[3]);
        if location != 0 || value == 0 || value == USER_DEFINED {
            continue;
        }
        match key_id {
            PROJECTED_CS_TYPE_GEO_KEY => projected = Some(value),
            GEOGRAPHIC_TYPE_GEO_KEY => geographic = Some(value),
            _ => {}
        }
    }
    projected.or(geographic)
}

/// Builds a GeoKeyDirectoryTag payload describing `epsg`.
pub fn encode_geo_key_directory(epsg: EpsgCode) -> Vec<u8> {
    let (model_type, crs_key) = if is_geographic(epsg) {
        (MODEL_TYPE_GEOGRAPHIC, GEOGRAPHIC_TYPE_GEO_KEY)
    } else {
        (MODEL_TYPE_PROJECTED, PROJECTED_CS_TYPE_GEO_KEY)
    };

    // Keys must be sorted by id
    #[rustfmt::skip]
    let words: [u16; 16] = [
        1, 1, 0, 3,
        GT_MODEL_TYPE_GEO_KEY, 0, 1, model_type,
        GT_RASTER_TYPE_GEO_KEY, 0, 1, RASTER_PIXEL_IS_AREA,
        crs_key, 0, 1, epsg,
    ];
    let mut bytes = vec![0u8; words.len() * 2];
    LittleEndian::write_u16_into(&words, &mut bytes);
    bytes
}

/// Reads an OGC WKT payload, dropping the trailing NUL padding.
pub fn decode_wkt(data: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(data);
    let text = text.trim_end_matches('\0').trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Resolves the spatial reference described by a set of projection records, given as
/// `(record_id, data)` pairs.
pub fn spatial_reference_from_records<'a>(
    records: impl IntoIterator<Item = (u16, &'a [u8])>,
) -> SpatialReference {
    let mut srs = SpatialReference::default();
    for (record_id, data) in records {
        match record_id {
            GEO_KEY_DIRECTORY_RECORD_ID => srs.epsg = srs.epsg.or(decode_geo_key_directory(data)),
            WKT_RECORD_ID => srs.wkt = srs.wkt.take().or(decode_wkt(data)),
            _ => {}
        }
    }
    srs
}

// Geographic 2D/3D CRS codes live in the 4000 block (4326, 4269, 4979, ...)
fn is_geographic(epsg: EpsgCode) -> bool {
    (4000..5000).contains(&epsg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projected_code_survives_encoding() {
        let bytes = encode_geo_key_directory(32618);
        assert_eq!(bytes.len(), 32);
        assert_eq!(decode_geo_key_directory(&bytes), Some(32618));
    }

    #[test]
    fn test_geographic_code_uses_geographic_key() {
        let bytes = encode_geo_key_directory(4326);
        assert_eq!(LittleEndian::read_u16(&bytes[24..26]), GEOGRAPHIC_TYPE_GEO_KEY);
        assert_eq!(decode_geo_key_directory(&bytes), Some(4326));
    }

    #[test]
    fn test_projected_key_wins_over_geographic() {
        #[rustfmt::skip]
        let words: [u16; 12] = [
            1, 1, 0, 2,
            GEOGRAPHIC_TYPE_GEO_KEY, 0, 1, 4326,
            PROJECTED_CS_TYPE_GEO_KEY, 0, 1, 32633,
        ];
        let mut bytes = vec![0u8; 24];
        LittleEndian::write_u16_into(&words, &mut bytes);
        assert_eq!(decode_geo_key_directory(&bytes), Some(32633));
    }

    #[test]
    fn test_user_defined_and_truncated_directories() {
        let words: [u16; 8] = [1, 1, 0, 1, PROJECTED_CS_TYPE_GEO_KEY, 0, 1, USER_DEFINED];
        let mut bytes = vec![0u8; 16];
        LittleEndian::write_u16_into(&words, &mut bytes);
        assert_eq!(decode_geo_key_directory(&bytes), None);
        assert_eq!(decode_geo_key_directory(&bytes[..6]), None);
    }

    #[test]
    fn test_spatial_reference_from_records() {
        let keys = encode_geo_key_directory(26918);
        let wkt = b"PROJCS[\"NAD83 / UTM zone 18N\"]\0\0".to_vec();
        let srs = spatial_reference_from_records([
            (WKT_RECORD_ID, wkt.as_slice()),
            (GEO_KEY_DIRECTORY_RECORD_ID, keys.as_slice()),
        ]);
        assert_eq!(srs.epsg, Some(26918));
        assert_eq!(srs.wkt.as_deref(), Some("PROJCS[\"NAD83 / UTM zone 18N\"]"));
        assert_eq!(srs.utm_zone(), 18);
    }
}
