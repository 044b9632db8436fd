//! Validated scalar types shared across the PharmaStackX workspace.
//!
//! These newtypes guarantee their invariant at construction time so the rest
//! of the codebase never re-validates medicine names, quantities, or
//! coordinates after the trust boundary.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// Errors that can occur when creating validated numeric types.
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    /// A quantity was zero; requested and quoted quantities must be at least one
    #[error("Quantity must be at least 1")]
    ZeroQuantity,
    /// A latitude was outside [-90, 90]
    #[error("Latitude out of range: {0}")]
    LatitudeOutOfRange(f64),
    /// A longitude was outside [-180, 180]
    #[error("Longitude out of range: {0}")]
    LongitudeOutOfRange(f64),
    /// A coordinate was NaN or infinite
    #[error("Coordinate is not a finite number")]
    NonFiniteCoordinate,
}

/// A string type that guarantees non-empty content.
///
/// Wraps a `String` and ensures it contains at least one non-whitespace
/// character. Input is trimmed during construction. Used for medicine names,
/// pharmacy names, and addresses where an empty value would make a record
/// meaningless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A quantity that is guaranteed to be at least one.
///
/// Requested items carry a patient-side quantity; cart lines carry the
/// pharmacy-quoted quantity. Neither may be zero, so both go through this
/// type at the trust boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PositiveQuantity(u32);

impl PositiveQuantity {
    /// Creates a new `PositiveQuantity`.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::ZeroQuantity` if `value` is zero.
    pub fn new(value: u32) -> Result<Self, ValueError> {
        if value == 0 {
            return Err(ValueError::ZeroQuantity);
        }
        Ok(Self(value))
    }

    /// Returns the quantity as a plain `u32`.
    pub fn get(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for PositiveQuantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for PositiveQuantity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u32(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for PositiveQuantity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let v = u32::deserialize(deserializer)?;
        PositiveQuantity::new(v).map_err(serde::de::Error::custom)
    }
}

/// A validated WGS84 coordinate pair.
///
/// Patient geolocation and pharmacy locations both use this type, so
/// distance computation never sees out-of-range or non-finite coordinates.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "RawGeoPoint", into = "RawGeoPoint")]
pub struct GeoPoint {
    lat: f64,
    lon: f64,
}

/// Unvalidated serde carrier for [`GeoPoint`].
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
struct RawGeoPoint {
    lat: f64,
    lon: f64,
}

impl GeoPoint {
    /// Creates a new `GeoPoint`.
    ///
    /// # Errors
    ///
    /// Returns a `ValueError` if either coordinate is non-finite or out of
    /// range.
    pub fn new(lat: f64, lon: f64) -> Result<Self, ValueError> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(ValueError::NonFiniteCoordinate);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ValueError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(ValueError::LongitudeOutOfRange(lon));
        }
        Ok(Self { lat, lon })
    }

    /// Returns the latitude in degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Returns the longitude in degrees.
    pub fn lon(&self) -> f64 {
        self.lon
    }
}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = ValueError;

    fn try_from(raw: RawGeoPoint) -> Result<Self, Self::Error> {
        GeoPoint::new(raw.lat, raw.lon)
    }
}

impl From<GeoPoint> for RawGeoPoint {
    fn from(p: GeoPoint) -> Self {
        RawGeoPoint {
            lat: p.lat,
            lon: p.lon,
        }
    }
}
