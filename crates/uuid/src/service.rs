//! Internal implementation of the identifier types.
//!
//! Contains the canonical record identifier and the timestamp-prefixed quote
//! identifier used throughout the PharmaStackX marketplace.

use crate::{UuidError, UuidResult};
use chrono::{DateTime, Duration, Utc};
use std::path::{Path, PathBuf};
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// PharmaStackX's canonical record identifier (32 lowercase hex characters,
/// no hyphens).
///
/// This wrapper type guarantees that once constructed, the contained UUID is
/// in canonical format. It provides type safety for identifier operations and
/// ensures consistent path derivation across the system.
///
/// # When to use this type
/// Use this wrapper whenever you are:
/// - Accepting an identifier string from *outside* the core (CLI input, API
///   request, etc), or
/// - Deriving a sharded storage path for a request, pharmacy, or cart record.
/// - Generating new record identifiers.
///
/// # Construction
/// - [`RecordUuid::new`] generates a new canonical UUID (for new records).
/// - [`RecordUuid::parse`] validates an externally supplied identifier.
///
/// # Display format
/// When displayed or converted to string, `RecordUuid` always produces the
/// canonical 32-character lowercase hex format without hyphens.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordUuid(Uuid);

impl Default for RecordUuid {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordUuid {
    /// Generates a new identifier in canonical form.
    ///
    /// Suitable for allocating a fresh identifier during request, pharmacy,
    /// or cart creation. RFC 4122 version 4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses an identifier string that must already be in
    /// canonical form.
    ///
    /// This does **not** normalise other common UUID forms (for example,
    /// hyphenated or uppercase). Callers must provide the canonical
    /// representation.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not canonical.
    pub fn parse(input: &str) -> UuidResult<Self> {
        if Self::is_canonical(input) {
            // SAFETY: is_canonical guarantees valid hex, so parse_str will succeed
            let uuid = Uuid::parse_str(input).expect("is_canonical guarantees valid UUID");
            return Ok(Self(uuid));
        }
        Err(UuidError::InvalidInput(format!(
            "Identifier must be 32 lowercase hex characters without hyphens, got: '{}'",
            input
        )))
    }

    /// Returns the identifier as a `uuid::Uuid`.
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Wraps an existing `uuid::Uuid` (already valid by construction).
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns true if `input` is in canonical form.
    ///
    /// Purely syntactic check:
    /// - Exactly 32 bytes long
    /// - Only lowercase hex characters (`0-9` and `a-f`)
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// Returns `parent_dir/<s1>/<s2>/<uuid>/` where `s1`/`s2` are derived
    /// from this identifier.
    ///
    /// Sharding scheme:
    /// - `s1` is the first two hex characters of the identifier
    /// - `s2` is the next two hex characters
    /// - The full identifier forms the leaf directory
    ///
    /// This prevents filesystem performance issues with large numbers of
    /// record directories in a single location.
    pub fn sharded_dir(&self, parent_dir: &Path) -> PathBuf {
        let canonical = self.0.simple().to_string();
        let s1 = &canonical[0..2];
        let s2 = &canonical[2..4];
        parent_dir.join(s1).join(s2).join(&canonical)
    }
}

impl fmt::Display for RecordUuid {
    /// Formats the identifier in canonical form (32 lowercase hex characters,
    /// no hyphens).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Display in canonical (simple) form
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for RecordUuid {
    type Err = UuidError;

    /// Parses a string into a `RecordUuid`, requiring canonical form.
    ///
    /// Equivalent to calling [`RecordUuid::parse`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordUuid::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for RecordUuid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for RecordUuid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RecordUuid::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A time-prefixed quote identifier.
///
/// Format:
/// `YYYYMMDDTHHMMSS.mmmZ-<canonical_uuid>`
///
/// Example:
/// `20260111T143522.045Z-550e8400e29b41d4a716446655440000`
///
/// This identifier is:
/// - Globally unique (UUID)
/// - Human-readable
/// - Monotonic per request when generated against the previous quote id
///
/// # Monotonicity Guarantee
///
/// When calling [`TimestampUuid::generate`] with the previous quote id, the
/// timestamp is guaranteed to be strictly greater than the previous one
/// (incremented by at least 1ms if necessary). This keeps quote ids ordered
/// by submission time within a request even when two pharmacies quote inside
/// the same millisecond.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TimestampUuid {
    timestamp: DateTime<Utc>,
    uuid: RecordUuid,
}

impl TimestampUuid {
    /// Returns the timestamp component of this identifier.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns a reference to the UUID component of this identifier.
    pub fn uuid(&self) -> &RecordUuid {
        &self.uuid
    }

    /// Generate a new quote identifier.
    ///
    /// If `last_id` is provided, the timestamp is guaranteed to be strictly
    /// greater than the last one (by at least 1 ms).
    ///
    /// Designed to be called while holding the owning request record, so two
    /// quotes on the same request never share a timestamp.
    pub fn generate(last_id: Option<&TimestampUuid>) -> Self {
        let now = Utc::now();

        let timestamp = match last_id {
            Some(prev) if now <= prev.timestamp => prev.timestamp + Duration::milliseconds(1),
            _ => now,
        };

        Self {
            timestamp,
            uuid: RecordUuid::new(),
        }
    }
}

impl FromStr for TimestampUuid {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ts_str, uuid_str) = s.split_once('-').ok_or_else(|| {
            UuidError::InvalidInput(format!("Invalid quote id format: '{}'", s))
        })?;

        // Parse the timestamp portion (without the Z suffix)
        if !ts_str.ends_with('Z') {
            return Err(UuidError::InvalidInput(format!(
                "Timestamp must end with 'Z': '{}'",
                ts_str
            )));
        }

        let ts_no_z = &ts_str[..ts_str.len() - 1];
        let naive =
            chrono::NaiveDateTime::parse_from_str(ts_no_z, "%Y%m%dT%H%M%S%.3f").map_err(|e| {
                UuidError::InvalidInput(format!("Invalid timestamp format '{}': {}", ts_str, e))
            })?;

        let timestamp = DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc);

        let uuid = RecordUuid::parse(uuid_str)?;

        Ok(Self { timestamp, uuid })
    }
}

impl fmt::Display for TimestampUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.timestamp.format("%Y%m%dT%H%M%S%.3fZ"),
            self.uuid
        )
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for TimestampUuid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for TimestampUuid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        TimestampUuid::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_generates_canonical_id() {
        let id = RecordUuid::new();
        let canonical = id.to_string();

        assert_eq!(canonical.len(), 32);
        assert!(RecordUuid::is_canonical(&canonical));
    }

    #[test]
    fn test_parse_valid_canonical_id() {
        let canonical = "550e8400e29b41d4a716446655440000";
        let result = RecordUuid::parse(canonical);

        assert!(result.is_ok());
        assert_eq!(result.unwrap().to_string(), canonical);
    }

    #[test]
    fn test_parse_rejects_hyphenated_id() {
        let hyphenated = "550e8400-e29b-41d4-a716-446655440000";
        let result = RecordUuid::parse(hyphenated);

        assert!(result.is_err());
        match result {
            Err(UuidError::InvalidInput(msg)) => {
                assert!(msg.contains("32 lowercase hex characters"));
            }
            _ => panic!("Expected InvalidInput error"),
        }
    }

    #[test]
    fn test_parse_rejects_uppercase_and_wrong_length() {
        assert!(RecordUuid::parse("550E8400E29B41D4A716446655440000").is_err());
        assert!(RecordUuid::parse("550e8400e29b41d4a71644665544000").is_err());
        assert!(RecordUuid::parse("550e8400e29b41d4a7164466554400000").is_err());
        assert!(RecordUuid::parse("550e8400e29b41d4a716446655440zzz").is_err());
        assert!(RecordUuid::parse("").is_err());
    }

    #[test]
    fn test_sharded_dir_structure() {
        let id = RecordUuid::parse("550e8400e29b41d4a716446655440000").unwrap();
        let parent = Path::new("/market_data/requests");
        let sharded = id.sharded_dir(parent);

        assert_eq!(
            sharded,
            PathBuf::from("/market_data/requests/55/0e/550e8400e29b41d4a716446655440000")
        );
    }

    #[test]
    fn test_sharded_dir_different_ids() {
        let id1 = RecordUuid::parse("00112233445566778899aabbccddeeff").unwrap();
        let id2 = RecordUuid::parse("aabbccddeeff00112233445566778899").unwrap();

        let parent = Path::new("/data");

        assert_eq!(
            id1.sharded_dir(parent),
            PathBuf::from("/data/00/11/00112233445566778899aabbccddeeff")
        );
        assert_eq!(
            id2.sharded_dir(parent),
            PathBuf::from("/data/aa/bb/aabbccddeeff00112233445566778899")
        );
    }

    #[test]
    fn test_round_trip_new_to_string_to_parse() {
        let original = RecordUuid::new();
        let as_string = original.to_string();
        let parsed = RecordUuid::parse(&as_string).unwrap();

        assert_eq!(original, parsed);
    }

    #[test]
    fn test_serde_round_trip() {
        let id = RecordUuid::parse("550e8400e29b41d4a716446655440000").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"550e8400e29b41d4a716446655440000\"");

        let back: RecordUuid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_serde_rejects_non_canonical() {
        let result: Result<RecordUuid, _> =
            serde_json::from_str("\"550e8400-e29b-41d4-a716-446655440000\"");
        assert!(result.is_err());
    }

    // TimestampUuid tests

    #[test]
    fn test_quote_id_generate_new() {
        let id = TimestampUuid::generate(None);

        let uuid_str = id.uuid().to_string();
        assert_eq!(uuid_str.len(), 32);
        assert!(RecordUuid::is_canonical(&uuid_str));
    }

    #[test]
    fn test_quote_id_generate_monotonic_same_instant() {
        let id1 = TimestampUuid::generate(None);
        // Don't sleep - force the monotonic increment logic
        let id2 = TimestampUuid::generate(Some(&id1));

        // Even with no elapsed time, second should be strictly later
        assert!(id2.timestamp() > id1.timestamp());
    }

    #[test]
    fn test_quote_id_display_format() {
        let id = TimestampUuid::generate(None);
        let displayed = id.to_string();

        let parts: Vec<&str> = displayed.splitn(2, '-').collect();
        assert_eq!(parts.len(), 2);
        assert!(parts[0].ends_with('Z'));
        assert!(RecordUuid::is_canonical(parts[1]));
    }

    #[test]
    fn test_quote_id_parse_valid() {
        let valid = "20260111T143522.045Z-550e8400e29b41d4a716446655440000";
        let result = TimestampUuid::from_str(valid);

        assert!(result.is_ok());
        let id = result.unwrap();
        assert_eq!(id.uuid().to_string(), "550e8400e29b41d4a716446655440000");
    }

    #[test]
    fn test_quote_id_parse_missing_hyphen() {
        let invalid = "20260111T143522.045Z550e8400e29b41d4a716446655440000";
        assert!(TimestampUuid::from_str(invalid).is_err());
    }

    #[test]
    fn test_quote_id_parse_missing_z_suffix() {
        let invalid = "20260111T143522.045-550e8400e29b41d4a716446655440000";
        assert!(TimestampUuid::from_str(invalid).is_err());
    }

    #[test]
    fn test_quote_id_parse_invalid_timestamp() {
        let invalid = "20260199T143522.045Z-550e8400e29b41d4a716446655440000";
        assert!(TimestampUuid::from_str(invalid).is_err());
    }

    #[test]
    fn test_quote_id_round_trip() {
        // Use a timestamp with exactly millisecond precision so the %.3f
        // format round-trips cleanly
        let original_str = "20260111T143522.045Z-550e8400e29b41d4a716446655440000";
        let original = TimestampUuid::from_str(original_str).unwrap();
        let as_string = original.to_string();
        let parsed = TimestampUuid::from_str(&as_string).unwrap();

        assert_eq!(as_string, original_str);
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_quote_id_serde_round_trip() {
        let original = TimestampUuid::from_str(
            "20260111T143522.045Z-550e8400e29b41d4a716446655440000",
        )
        .unwrap();
        let json = serde_json::to_string(&original).unwrap();
        let back: TimestampUuid = serde_json::from_str(&json).unwrap();

        assert_eq!(original, back);
    }
}
