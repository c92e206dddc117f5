use std::{fmt, str::FromStr};

/// EPSG code type alias
pub type EpsgCode = u16;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SpatialReferenceError {
    #[error("unrecognized spatial reference: {0:?}")]
    Unrecognized(String),
    #[error("invalid EPSG code: {0:?}")]
    InvalidCode(String),
}

/// Spatial reference attached to a point view.
///
/// Only as much of the reference is kept as is needed to identify it: the EPSG code when the
/// source provides one, and the WKT text otherwise.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpatialReference {
    pub epsg: Option<EpsgCode>,
    pub wkt: Option<String>,
}

impl SpatialReference {
    pub fn from_epsg(epsg: EpsgCode) -> Self {
        Self {
            epsg: Some(epsg),
            wkt: None,
        }
    }

    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            epsg: None,
            wkt: Some(wkt.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.epsg.is_none() && self.wkt.is_none()
    }

    /// UTM zone of this reference: positive in the northern hemisphere, negative in the
    /// southern one, 0 when the reference is not a UTM projection.
    pub fn utm_zone(&self) -> i32 {
        if let Some(zone) = self.epsg.and_then(utm_zone_from_epsg) {
            return zone;
        }
        self.wkt.as_deref().and_then(utm_zone_from_wkt).unwrap_or(0)
    }
}

impl fmt::Display for SpatialReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.epsg, &self.wkt) {
            (Some(epsg), _) => write!(f, "EPSG:{epsg}"),
            (None, Some(wkt)) => write!(f, "{wkt}"),
            (None, None) => write!(f, "(none)"),
        }
    }
}

impl FromStr for SpatialReference {
    type Err = SpatialReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some((authority, code)) = s.split_once(':') else {
            return Err(SpatialReferenceError::Unrecognized(s.to_string()));
        };
        if !authority.eq_ignore_ascii_case("EPSG") {
            return Err(SpatialReferenceError::Unrecognized(s.to_string()));
        }
        let epsg = code
            .trim()
            .parse::<EpsgCode>()
            .map_err(|_| SpatialReferenceError::InvalidCode(code.to_string()))?;
        Ok(Self::from_epsg(epsg))
    }
}

fn utm_zone_from_epsg(epsg: EpsgCode) -> Option<i32> {
    let zone = match epsg {
        // WGS 84 / UTM zone N and S
        32601..=32660 => (epsg - 32600) as i32,
        32701..=32760 => -((epsg - 32700) as i32),
        // NAD83 / UTM
        26901..=26923 => (epsg - 26900) as i32,
        // NAD27 / UTM
        26703..=26722 => (epsg - 26700) as i32,
        // ETRS89 / UTM
        25828..=25838 => (epsg - 25800) as i32,
        _ => return None,
    };
    Some(zone)
}

// Matches the projection name in WKT, e.g. `PROJCS["WGS 84 / UTM zone 18N", ...`
fn utm_zone_from_wkt(wkt: &str) -> Option<i32> {
    const MARKER: &str = "UTM zone ";
    let start = wkt.find(MARKER)? + MARKER.len();
    let rest = &wkt[start..];
    let digits_len = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits_len == 0 {
        return None;
    }
    let zone: i32 = rest[..digits_len].parse().ok()?;
    if !(1..=60).contains(&zone) {
        return None;
    }
    match rest[digits_len..].chars().next() {
        Some('S') | Some('s') => Some(-zone),
        _ => Some(zone),
    }
}
