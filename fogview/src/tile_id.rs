//! SRTM tile identifiers.
//!
//! Tiles are named after the **south-west** (lower-left) corner of the
//! 1° × 1° area they cover: `{N|S}{lat}{E|W}{lon}`.
//!
//! - Latitude: 2 digits with N/S prefix (e.g., N35, S12)
//! - Longitude: 3 digits with E/W prefix (e.g., E138, W077)
//!
//! On disk the name carries a `.hgt` extension, optionally zipped (`.hgt.zip`).

use std::fmt;
use std::str::FromStr;

use crate::bbox::{BoundingBox, Coordinate};
use crate::error::{FogError, Result};

/// Offset from the lower-left corner to the tile centre, in degrees.
pub const CENTER_OFFSET: f64 = 0.5;

/// Identifier of a 1° × 1° SRTM tile, i.e. its lower-left corner.
///
/// # Examples
///
/// ```
/// use fogview::TileId;
///
/// let id: TileId = "S37W105".parse()?;
/// assert_eq!((id.lat(), id.lon()), (-37, -105));
/// assert_eq!(id.to_string(), "S37W105");
/// assert_eq!(id.filename(), "S37W105.hgt");
/// # Ok::<(), fogview::FogError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId {
    lat: i32,
    lon: i32,
}

impl TileId {
    /// Create an identifier from the integer lower-left corner.
    pub const fn new(lat: i32, lon: i32) -> Self {
        Self { lat, lon }
    }

    /// Parse a bare 7-character identifier such as `N37W105`.
    ///
    /// Hemisphere letters are case-insensitive. Both numeric fields must be
    /// plain ASCII digits.
    ///
    /// # Errors
    ///
    /// Returns [`FogError::InvalidTileId`] if `name` does not match the pattern.
    pub fn parse(name: &str) -> Result<Self> {
        let invalid = || FogError::InvalidTileId {
            name: name.to_string(),
        };

        let bytes = name.as_bytes();
        if bytes.len() != 7 {
            return Err(invalid());
        }

        let lat_sign = match bytes[0].to_ascii_uppercase() {
            b'N' => 1,
            b'S' => -1,
            _ => return Err(invalid()),
        };
        let lon_sign = match bytes[3].to_ascii_uppercase() {
            b'E' => 1,
            b'W' => -1,
            _ => return Err(invalid()),
        };

        let lat = parse_digits(&bytes[1..3]).ok_or_else(invalid)?;
        let lon = parse_digits(&bytes[4..7]).ok_or_else(invalid)?;

        Ok(Self {
            lat: lat * lat_sign,
            lon: lon * lon_sign,
        })
    }

    /// Parse an identifier out of a file name or path.
    ///
    /// Directory components and a trailing `.hgt` or `.hgt.zip` are ignored.
    ///
    /// ```
    /// use fogview::TileId;
    ///
    /// let id = TileId::from_filename("/data/srtm/N35E138.hgt.zip")?;
    /// assert_eq!(id, TileId::new(35, 138));
    /// # Ok::<(), fogview::FogError>(())
    /// ```
    pub fn from_filename(filename: &str) -> Result<Self> {
        let name = filename
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(filename);

        let lower = name.to_ascii_lowercase();
        let stem_len = if lower.ends_with(".hgt.zip") {
            name.len() - ".hgt.zip".len()
        } else if lower.ends_with(".hgt") {
            name.len() - ".hgt".len()
        } else {
            name.len()
        };

        Self::parse(&name[..stem_len]).map_err(|_| FogError::InvalidTileId {
            name: filename.to_string(),
        })
    }

    /// The tile covering the given coordinates.
    ///
    /// ```
    /// use fogview::TileId;
    ///
    /// assert_eq!(TileId::containing(35.5, 138.7).to_string(), "N35E138");
    /// assert_eq!(TileId::containing(-12.3, -77.1).to_string(), "S13W078");
    /// assert_eq!(TileId::containing(0.5, -0.5).to_string(), "N00W001");
    /// ```
    pub fn containing(lat: f64, lon: f64) -> Self {
        Self {
            lat: lat.floor() as i32,
            lon: lon.floor() as i32,
        }
    }

    /// Latitude of the lower-left corner.
    pub fn lat(&self) -> i32 {
        self.lat
    }

    /// Longitude of the lower-left corner.
    pub fn lon(&self) -> i32 {
        self.lon
    }

    /// File name of the uncompressed tile, e.g. `N35E138.hgt`.
    pub fn filename(&self) -> String {
        format!("{}.hgt", self)
    }

    /// Lower-left corner of the tile.
    pub fn geocode(&self) -> Coordinate {
        Coordinate::new(self.lat as f64, self.lon as f64)
    }

    /// Centre of the tile, used to centre a map on it.
    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            self.lat as f64 + CENTER_OFFSET,
            self.lon as f64 + CENTER_OFFSET,
        )
    }

    /// The one-degree area covered by the tile.
    pub fn footprint(&self) -> BoundingBox {
        BoundingBox::from_ordered(
            self.geocode(),
            Coordinate::new(self.lat as f64 + 1.0, self.lon as f64 + 1.0),
        )
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lat_prefix = if self.lat >= 0 { 'N' } else { 'S' };
        let lon_prefix = if self.lon >= 0 { 'E' } else { 'W' };
        write!(
            f,
            "{}{:02}{}{:03}",
            lat_prefix,
            self.lat.abs(),
            lon_prefix,
            self.lon.abs()
        )
    }
}

impl FromStr for TileId {
    type Err = FogError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn parse_digits(digits: &[u8]) -> Option<i32> {
    digits.iter().try_fold(0i32, |acc, &b| {
        b.is_ascii_digit().then(|| acc * 10 + (b - b'0') as i32)
    })
}

/// Validate that coordinates are within SRTM coverage.
///
/// SRTM data covers latitudes from -60° to +60° and all longitudes.
pub fn is_valid_srtm_coord(lat: f64, lon: f64) -> bool {
    (-60.0..=60.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hemispheres() {
        assert_eq!(TileId::parse("S37W105").unwrap(), TileId::new(-37, -105));
        assert_eq!(TileId::parse("N37E105").unwrap(), TileId::new(37, 105));
        assert_eq!(TileId::parse("N00E000").unwrap(), TileId::new(0, 0));
        assert_eq!(TileId::parse("S00W000").unwrap(), TileId::new(0, 0));
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(TileId::parse("n35e138").unwrap(), TileId::new(35, 138));
        assert_eq!(TileId::parse("s12w077").unwrap(), TileId::new(-12, -77));
    }

    #[test]
    fn test_parse_invalid() {
        for name in [
            "invalid", "N35E13", "N35E1380", "X35E138", "N35X138", "NAAE138", "N+5E138",
            "N35E-38", "", "N35É13",
        ] {
            assert!(
                matches!(TileId::parse(name), Err(FogError::InvalidTileId { .. })),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_from_filename() {
        assert_eq!(
            TileId::from_filename("N35E138.hgt").unwrap(),
            TileId::new(35, 138)
        );
        assert_eq!(
            TileId::from_filename("/path/to/data/S12W077.HGT").unwrap(),
            TileId::new(-12, -77)
        );
        assert_eq!(
            TileId::from_filename("C:\\data\\S12W077.hgt.zip").unwrap(),
            TileId::new(-12, -77)
        );
        assert!(TileId::from_filename("N35E138.tif").is_err());
    }

    #[test]
    fn test_display_and_filename() {
        assert_eq!(TileId::new(39, -75).to_string(), "N39W075");
        assert_eq!(TileId::new(-1, 1).to_string(), "S01E001");
        assert_eq!(TileId::new(35, 138).filename(), "N35E138.hgt");
    }

    #[test]
    fn test_containing() {
        assert_eq!(TileId::containing(35.0, 138.0), TileId::new(35, 138));
        assert_eq!(TileId::containing(-0.1, -0.1), TileId::new(-1, -1));
        // floor(-59.9) = -60, floor(-179.9) = -180
        assert_eq!(
            TileId::containing(-59.9, -179.9).to_string(),
            "S60W180"
        );
    }

    #[test]
    fn test_geocode_center_footprint() {
        let id = TileId::parse("N39W075").unwrap();
        assert_eq!(id.geocode(), Coordinate::new(39.0, -75.0));
        assert_eq!(id.center(), Coordinate::new(39.5, -74.5));

        let fp = id.footprint();
        assert_eq!(fp.lower_left(), Coordinate::new(39.0, -75.0));
        assert_eq!(fp.upper_right(), Coordinate::new(40.0, -74.0));
        assert_eq!(fp.centroid(), id.center());
    }

    #[test]
    fn test_is_valid_srtm_coord() {
        assert!(is_valid_srtm_coord(0.0, 0.0));
        assert!(is_valid_srtm_coord(60.0, 180.0));
        assert!(is_valid_srtm_coord(-60.0, -180.0));
        assert!(!is_valid_srtm_coord(61.0, 0.0));
        assert!(!is_valid_srtm_coord(0.0, -181.0));
    }
}
