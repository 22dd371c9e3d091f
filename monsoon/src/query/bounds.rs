//! Geographic bounding boxes parsed from request parameters.

use std::fmt;

/// Region used when no usable bounds are supplied (San Francisco Bay Area).
pub const DEFAULT_BOUNDS: Bounds = Bounds {
    sw_lat: 36.0,
    sw_lon: -123.0,
    ne_lat: 38.0,
    ne_lon: -121.0,
};

/// A rectangle given by its south-west and north-east corners, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub sw_lat: f64,
    pub sw_lon: f64,
    pub ne_lat: f64,
    pub ne_lon: f64,
}

impl Bounds {
    pub fn new(sw_lat: f64, sw_lon: f64, ne_lat: f64, ne_lon: f64) -> Self {
        Self {
            sw_lat,
            sw_lon,
            ne_lat,
            ne_lon,
        }
    }

    /// Parses `"swLat,swLon,neLat,neLon"`.
    ///
    /// Anything other than exactly four finite numbers yields
    /// [`DEFAULT_BOUNDS`]; malformed input is never an error.
    pub fn parse(raw: &str) -> Self {
        Self::try_parse(raw).unwrap_or(DEFAULT_BOUNDS)
    }

    /// Like [`Bounds::parse`], with absent input also mapping to the default.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        raw.map(Self::parse).unwrap_or(DEFAULT_BOUNDS)
    }

    fn try_parse(raw: &str) -> Option<Self> {
        let values = raw
            .split(',')
            .map(|token| token.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
            .collect::<Option<Vec<f64>>>()?;

        match values.as_slice() {
            [sw_lat, sw_lon, ne_lat, ne_lon] => Some(Self::new(*sw_lat, *sw_lon, *ne_lat, *ne_lon)),
            _ => None,
        }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        DEFAULT_BOUNDS
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.sw_lat, self.sw_lon, self.ne_lat, self.ne_lon
        )
    }
}
