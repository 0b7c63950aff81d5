use crate::errors::MapFileError;

#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub min_longitude: f64,
    pub max_latitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    pub fn new(
        min_latitude: f64,
        min_longitude: f64,
        max_latitude: f64,
        max_longitude: f64,
    ) -> Result<Self, MapFileError> {
        if min_latitude > max_latitude || min_longitude > max_longitude {
            return Err(MapFileError::InvalidBoundingBox(format!(
                "min ({min_latitude}, {min_longitude}) exceeds max ({max_latitude}, {max_longitude})"
            )));
        }
        Ok(Self {
            min_latitude,
            min_longitude,
            max_latitude,
            max_longitude,
        })
    }

    pub fn get_center_point(&self) -> LatLong {
        LatLong {
            latitude: (self.min_latitude + self.max_latitude) / 2.0,
            longitude: (self.min_longitude + self.max_longitude) / 2.0,
        }
    }

    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.min_latitude
            && latitude <= self.max_latitude
            && longitude >= self.min_longitude
            && longitude <= self.max_longitude
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        !(other.min_latitude > self.max_latitude
            || other.max_latitude < self.min_latitude
            || other.min_longitude > self.max_longitude
            || other.max_longitude < self.min_longitude)
    }

    pub fn extend_meters(&self, meters: i32) -> BoundingBox {
        // Rough approximation: 1 degree = 111km at equator
        let degree_delta = (meters as f64) / 111_000.0;
        BoundingBox {
            min_latitude: self.min_latitude - degree_delta,
            min_longitude: self.min_longitude - degree_delta,
            max_latitude: self.max_latitude + degree_delta,
            max_longitude: self.max_longitude + degree_delta,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]

pub struct LatLong {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLong {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: String, value: String) -> Self {
        Self { key, value }
    }

    /// Parses a tag encoded as `"key=value"`, the format the tag vocabulary strings in
    /// the map file header are stored in.
    pub fn from_string(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        match tag.split_once('=') {
            Some((key, value)) => Self {
                key: key.to_string(),
                value: value.to_string(),
            },
            None => Self {
                key: tag,
                value: String::new(),
            },
        }
    }
}

pub struct LatLongUtils;

impl LatLongUtils {
    pub const LONGITUDE_MAX: f64 = 180.0;
    pub const LONGITUDE_MIN: f64 = -180.0;
    pub const LATITUDE_MAX_MICRODEGREES: i32 = 90_000_000;
    pub const LATITUDE_MIN_MICRODEGREES: i32 = -90_000_000;
    pub const LONGITUDE_MAX_MICRODEGREES: i32 = 180_000_000;
    pub const LONGITUDE_MIN_MICRODEGREES: i32 = -180_000_000;
    const CONVERSION_FACTOR: f64 = 1_000_000.0;

    pub fn microdegrees_to_degrees(microdegrees: i32) -> f64 {
        microdegrees as f64 / Self::CONVERSION_FACTOR
    }

    pub fn degrees_to_microdegrees(degrees: f64) -> i32 {
        (degrees * Self::CONVERSION_FACTOR).round() as i32
    }

    pub fn is_valid_latitude(microdegrees: i32) -> bool {
        (Self::LATITUDE_MIN_MICRODEGREES..=Self::LATITUDE_MAX_MICRODEGREES).contains(&microdegrees)
    }

    pub fn is_valid_longitude(microdegrees: i32) -> bool {
        (Self::LONGITUDE_MIN_MICRODEGREES..=Self::LONGITUDE_MAX_MICRODEGREES)
            .contains(&microdegrees)
    }

    pub fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_rejects_inverted_coordinates() {
        assert!(BoundingBox::new(10.0, 10.0, 5.0, 20.0).is_err());
    }

    #[test]
    fn tag_from_string_splits_key_value() {
        let tag = Tag::from_string("highway=primary");
        assert_eq!(tag.key, "highway");
        assert_eq!(tag.value, "primary");
    }

    #[test]
    fn latitude_range_validation() {
        assert!(LatLongUtils::is_valid_latitude(90_000_000));
        assert!(!LatLongUtils::is_valid_latitude(90_000_001));
        assert!(!LatLongUtils::is_valid_latitude(-90_000_001));
    }
}
