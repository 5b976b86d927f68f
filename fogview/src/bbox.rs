//! Axis-aligned bounding boxes in latitude/longitude space.
//!
//! A [`BoundingBox`] is stored as its lower-left and upper-right corners; the
//! other two corners and the centroid are derived. Boxes are plain values:
//! operations such as [`BoundingBox::intersection_region`] return a new box
//! rather than modifying either operand.
//!
//! Boxes spanning the ±180° meridian are not supported. Construction does not
//! detect them; such a box is simply rejected if its longitudes are inverted.

use std::fmt;

use crate::error::{FogError, Result};

/// Current version byte written by [`BoundingBox::encode`].
pub const ENCODING_VERSION: u8 = 1;

/// Size in bytes of an encoded bounding box: version + 4 × f64.
pub const ENCODED_LEN: usize = 1 + 4 * 8;

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in degrees, positive north.
    pub lat: f64,
    /// Longitude in degrees, positive east.
    pub lon: f64,
}

impl Coordinate {
    /// Create a new coordinate.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}

/// A bounding box aligned with the (lat, lon) axes.
///
/// # Example
///
/// ```
/// use fogview::{BoundingBox, Coordinate};
///
/// let a = BoundingBox::new(Coordinate::new(0.0, 0.0), Coordinate::new(2.0, 2.0))?;
/// let b = BoundingBox::new(Coordinate::new(1.0, 1.0), Coordinate::new(3.0, 3.0))?;
///
/// assert!(a.intersects(&b));
/// let overlap = a.intersection_region(&b)?;
/// assert_eq!(overlap.lower_left(), Coordinate::new(1.0, 1.0));
/// assert_eq!(overlap.upper_right(), Coordinate::new(2.0, 2.0));
/// # Ok::<(), fogview::FogError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    lower_left: Coordinate,
    upper_right: Coordinate,
}

impl BoundingBox {
    /// Create a bounding box from its lower-left and upper-right corners.
    ///
    /// # Errors
    ///
    /// Returns [`FogError::InvalidBoundingBox`] if any coordinate is not
    /// finite, or if the lower-left corner lies north or east of the
    /// upper-right corner. Degenerate (zero-width) boxes are accepted.
    pub fn new(lower_left: Coordinate, upper_right: Coordinate) -> Result<Self> {
        let finite = [
            lower_left.lat,
            lower_left.lon,
            upper_right.lat,
            upper_right.lon,
        ]
        .iter()
        .all(|v| v.is_finite());

        if !finite || lower_left.lat > upper_right.lat || lower_left.lon > upper_right.lon {
            return Err(FogError::InvalidBoundingBox {
                ll_lat: lower_left.lat,
                ll_lon: lower_left.lon,
                ur_lat: upper_right.lat,
                ur_lon: upper_right.lon,
            });
        }

        Ok(Self {
            lower_left,
            upper_right,
        })
    }

    /// Build a box from corners already known to be ordered.
    pub(crate) fn from_ordered(lower_left: Coordinate, upper_right: Coordinate) -> Self {
        debug_assert!(lower_left.lat <= upper_right.lat && lower_left.lon <= upper_right.lon);
        Self {
            lower_left,
            upper_right,
        }
    }

    pub fn lower_left(&self) -> Coordinate {
        self.lower_left
    }

    pub fn upper_right(&self) -> Coordinate {
        self.upper_right
    }

    pub fn lower_right(&self) -> Coordinate {
        Coordinate::new(self.lower_left.lat, self.upper_right.lon)
    }

    pub fn upper_left(&self) -> Coordinate {
        Coordinate::new(self.upper_right.lat, self.lower_left.lon)
    }

    /// Planar midpoint of the two stored corners.
    ///
    /// Only meaningful for small boxes (a tile or less), where the error of
    /// averaging degrees is negligible.
    pub fn centroid(&self) -> Coordinate {
        Coordinate::new(
            (self.lower_left.lat + self.upper_right.lat) / 2.0,
            (self.lower_left.lon + self.upper_right.lon) / 2.0,
        )
    }

    /// The four corners in rendering order: lower-left, upper-left,
    /// upper-right, lower-right.
    pub fn corners(&self) -> [Coordinate; 4] {
        [
            self.lower_left,
            self.upper_left(),
            self.upper_right,
            self.lower_right(),
        ]
    }

    /// Strict overlap test.
    ///
    /// Boxes that only share an edge or a corner do NOT intersect.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        other.lower_left.lat < self.upper_right.lat
            && other.lower_left.lon < self.upper_right.lon
            && self.lower_left.lat < other.upper_right.lat
            && self.lower_left.lon < other.upper_right.lon
    }

    /// Overlapping region of two boxes, or `None` if they do not intersect.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        if !self.intersects(other) {
            return None;
        }

        Some(BoundingBox {
            lower_left: Coordinate::new(
                self.lower_left.lat.max(other.lower_left.lat),
                self.lower_left.lon.max(other.lower_left.lon),
            ),
            upper_right: Coordinate::new(
                self.upper_right.lat.min(other.upper_right.lat),
                self.upper_right.lon.min(other.upper_right.lon),
            ),
        })
    }

    /// Overlapping region of two boxes.
    ///
    /// # Errors
    ///
    /// Returns [`FogError::NoIntersection`] when [`Self::intersects`] is false.
    pub fn intersection_region(&self, other: &BoundingBox) -> Result<BoundingBox> {
        self.intersection(other)
            .ok_or(FogError::NoIntersection { a: *self, b: *other })
    }

    /// Whether `coord` lies inside the box.
    ///
    /// The south and west edges are inclusive, the north and east edges
    /// exclusive, so adjacent tiles never both claim a point.
    pub fn contains(&self, coord: Coordinate) -> bool {
        coord.lat >= self.lower_left.lat
            && coord.lat < self.upper_right.lat
            && coord.lon >= self.lower_left.lon
            && coord.lon < self.upper_right.lon
    }

    /// Encode the box as a version byte followed by the lower-left latitude,
    /// lower-left longitude, upper-right latitude and upper-right longitude,
    /// each a big-endian `f64`.
    pub fn encode(&self) -> [u8; ENCODED_LEN] {
        let mut out = [0u8; ENCODED_LEN];
        out[0] = ENCODING_VERSION;

        let values = [
            self.lower_left.lat,
            self.lower_left.lon,
            self.upper_right.lat,
            self.upper_right.lon,
        ];
        for (chunk, value) in out[1..].chunks_exact_mut(8).zip(values) {
            chunk.copy_from_slice(&value.to_be_bytes());
        }

        out
    }

    /// Decode a box written by [`Self::encode`].
    ///
    /// # Errors
    ///
    /// - [`FogError::InvalidEncoding`] if the buffer is empty or has the wrong length
    /// - [`FogError::UnsupportedEncodingVersion`] for an unknown version byte
    /// - [`FogError::InvalidBoundingBox`] if the decoded corners are out of order
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let (&version, body) = bytes.split_first().ok_or_else(|| FogError::InvalidEncoding {
            reason: "empty buffer".to_string(),
        })?;

        if version != ENCODING_VERSION {
            return Err(FogError::UnsupportedEncodingVersion { version });
        }

        if bytes.len() != ENCODED_LEN {
            return Err(FogError::InvalidEncoding {
                reason: format!("expected {} bytes, got {}", ENCODED_LEN, bytes.len()),
            });
        }

        let mut values = [0f64; 4];
        for (value, chunk) in values.iter_mut().zip(body.chunks_exact(8)) {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            *value = f64::from_be_bytes(raw);
        }

        Self::new(
            Coordinate::new(values[0], values[1]),
            Coordinate::new(values[2], values[3]),
        )
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}), ({}, {})",
            self.lower_left.lat, self.lower_left.lon, self.upper_right.lat, self.upper_right.lon
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(ll: (f64, f64), ur: (f64, f64)) -> BoundingBox {
        BoundingBox::new(Coordinate::new(ll.0, ll.1), Coordinate::new(ur.0, ur.1)).unwrap()
    }

    #[test]
    fn test_overlapping_boxes_intersect() {
        let a = bbox((0.0, 0.0), (2.0, 2.0));
        let b = bbox((1.0, 1.0), (3.0, 3.0));
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn test_touching_boxes_do_not_intersect() {
        // Shared corner
        let a = bbox((0.0, 0.0), (1.0, 1.0));
        let b = bbox((1.0, 1.0), (2.0, 2.0));
        assert!(!a.intersects(&b));

        // Shared edge
        let c = bbox((0.0, 1.0), (1.0, 2.0));
        assert!(!a.intersects(&c));
        assert!(a.intersection(&c).is_none());
    }

    #[test]
    fn test_disjoint_boxes() {
        let a = bbox((0.0, 0.0), (1.0, 1.0));
        let b = bbox((5.0, 5.0), (6.0, 6.0));
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_contained_box_intersects() {
        let outer = bbox((0.0, 0.0), (10.0, 10.0));
        let inner = bbox((2.0, 2.0), (3.0, 3.0));
        assert!(outer.intersects(&inner));
        assert_eq!(outer.intersection_region(&inner).unwrap(), inner);
    }

    #[test]
    fn test_intersection_region() {
        let a = bbox((0.0, 0.0), (2.0, 2.0));
        let b = bbox((1.0, 1.0), (3.0, 3.0));
        assert_eq!(a.intersection_region(&b).unwrap(), bbox((1.0, 1.0), (2.0, 2.0)));
        // Operands are untouched
        assert_eq!(a, bbox((0.0, 0.0), (2.0, 2.0)));
    }

    #[test]
    fn test_intersection_region_requires_overlap() {
        let a = bbox((0.0, 0.0), (1.0, 1.0));
        let b = bbox((1.0, 1.0), (2.0, 2.0));
        let err = a.intersection_region(&b).unwrap_err();
        assert!(matches!(err, FogError::NoIntersection { .. }));
    }

    #[test]
    fn test_derived_corners_and_centroid() {
        let b = bbox((37.0, -105.0), (38.0, -104.0));
        assert_eq!(b.lower_right(), Coordinate::new(37.0, -104.0));
        assert_eq!(b.upper_left(), Coordinate::new(38.0, -105.0));
        assert_eq!(b.centroid(), Coordinate::new(37.5, -104.5));
        assert_eq!(
            b.corners(),
            [
                Coordinate::new(37.0, -105.0),
                Coordinate::new(38.0, -105.0),
                Coordinate::new(38.0, -104.0),
                Coordinate::new(37.0, -104.0),
            ]
        );
    }

    #[test]
    fn test_inverted_box_rejected() {
        let err = BoundingBox::new(Coordinate::new(2.0, 0.0), Coordinate::new(1.0, 1.0));
        assert!(matches!(err, Err(FogError::InvalidBoundingBox { .. })));

        let err = BoundingBox::new(Coordinate::new(0.0, 179.0), Coordinate::new(1.0, -179.0));
        assert!(matches!(err, Err(FogError::InvalidBoundingBox { .. })));

        let err = BoundingBox::new(Coordinate::new(f64::NAN, 0.0), Coordinate::new(1.0, 1.0));
        assert!(err.is_err());
    }

    #[test]
    fn test_contains_half_open() {
        let b = bbox((35.0, 138.0), (36.0, 139.0));
        assert!(b.contains(Coordinate::new(35.0, 138.0)));
        assert!(b.contains(Coordinate::new(35.5, 138.5)));
        assert!(!b.contains(Coordinate::new(36.0, 138.5)));
        assert!(!b.contains(Coordinate::new(35.5, 139.0)));
    }

    #[test]
    fn test_encode_layout() {
        let b = bbox((-37.0, -105.0), (-36.0, -104.5));
        let bytes = b.encode();
        assert_eq!(bytes.len(), ENCODED_LEN);
        assert_eq!(bytes[0], ENCODING_VERSION);
        assert_eq!(&bytes[1..9], &(-37.0f64).to_be_bytes());
        assert_eq!(&bytes[25..33], &(-104.5f64).to_be_bytes());
        assert_eq!(BoundingBox::decode(&bytes).unwrap(), b);
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        assert!(matches!(
            BoundingBox::decode(&[]),
            Err(FogError::InvalidEncoding { .. })
        ));

        let mut bytes = bbox((0.0, 0.0), (1.0, 1.0)).encode();
        bytes[0] = 7;
        assert!(matches!(
            BoundingBox::decode(&bytes),
            Err(FogError::UnsupportedEncodingVersion { version: 7 })
        ));

        let bytes = bbox((0.0, 0.0), (1.0, 1.0)).encode();
        assert!(matches!(
            BoundingBox::decode(&bytes[..20]),
            Err(FogError::InvalidEncoding { .. })
        ));

        // Corners swapped on the wire
        let mut bytes = [0u8; ENCODED_LEN];
        bytes[0] = ENCODING_VERSION;
        bytes[1..9].copy_from_slice(&5.0f64.to_be_bytes());
        assert!(matches!(
            BoundingBox::decode(&bytes),
            Err(FogError::InvalidBoundingBox { .. })
        ));
    }

    #[test]
    fn test_display() {
        let b = bbox((0.0, 0.0), (2.0, 2.5));
        assert_eq!(b.to_string(), "(0, 0), (2, 2.5)");
    }
}
