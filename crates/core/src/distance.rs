//! Distance enrichment for quoted requests.
//!
//! Distances are ephemeral, request-scoped annotations: they are computed on
//! demand from the patient's live location and the registry locations of the
//! quoting pharmacies, and never persisted.
//!
//! A distance is a tagged value, not a string: [`Distance::Known`] carries
//! the computed kilometres, [`Distance::Unknown`] carries the reason it could
//! not be computed. The legacy wire format (a display string per pharmacy,
//! with three fixed sentinel messages for the error cases) is produced by
//! `Display` and re-parsed by [`Distance::parse_display`], so no other code
//! matches on message strings.
//!
//! Failures here are deliberately non-fatal: ranking and acceptance remain
//! available, and unknown distances sort after every known one.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use psx_types::GeoPoint;
use psx_uuid::RecordUuid;

use crate::config::CoreConfig;
use crate::constants::{
    EARTH_RADIUS_KM, MSG_DISTANCE_CALCULATION_FAILED, MSG_PHARMACY_LOCATION_NOT_RECORDED,
    MSG_USER_LOCATION_NOT_TAKEN,
};
use crate::repositories::pharmacies::PharmacyService;
use crate::request::MedicineRequest;

/// Why a distance could not be computed.
///
/// This enum is deliberately *closed*: the three variants correspond to the
/// three messages the legacy client renders and sorts on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceUnknown {
    /// The quoting pharmacy has no location in the registry.
    PharmacyLocationNotRecorded,
    /// The computation itself failed (corrupt registry entry, non-finite
    /// result, or an absent per-pharmacy value).
    CalculationFailed,
    /// The patient's geolocation was not provided.
    UserLocationNotTaken,
}

impl DistanceUnknown {
    /// The exact message the legacy client expects for this reason.
    pub fn message(&self) -> &'static str {
        match self {
            DistanceUnknown::PharmacyLocationNotRecorded => MSG_PHARMACY_LOCATION_NOT_RECORDED,
            DistanceUnknown::CalculationFailed => MSG_DISTANCE_CALCULATION_FAILED,
            DistanceUnknown::UserLocationNotTaken => MSG_USER_LOCATION_NOT_TAKEN,
        }
    }
}

/// A per-pharmacy distance annotation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Distance {
    /// Computed distance in kilometres.
    Known { km: f64 },
    /// Not computable, with the reason.
    Unknown(DistanceUnknown),
}

impl Distance {
    /// Kilometre value used as the sort key. Unknown distances sort after
    /// every known distance.
    pub fn sort_km(&self) -> f64 {
        match self {
            Distance::Known { km } => *km,
            Distance::Unknown(_) => f64::INFINITY,
        }
    }

    /// Parses the legacy display form back into a tagged value.
    ///
    /// An exact sentinel message maps to its reason; otherwise the first
    /// numeric token is taken as kilometres; a string with no numeric token
    /// maps to [`DistanceUnknown::CalculationFailed`].
    pub fn parse_display(input: &str) -> Distance {
        match input {
            MSG_PHARMACY_LOCATION_NOT_RECORDED => {
                return Distance::Unknown(DistanceUnknown::PharmacyLocationNotRecorded)
            }
            MSG_DISTANCE_CALCULATION_FAILED => {
                return Distance::Unknown(DistanceUnknown::CalculationFailed)
            }
            MSG_USER_LOCATION_NOT_TAKEN => {
                return Distance::Unknown(DistanceUnknown::UserLocationNotTaken)
            }
            _ => {}
        }

        match first_numeric_token(input) {
            Some(km) if km.is_finite() => Distance::Known { km },
            _ => Distance::Unknown(DistanceUnknown::CalculationFailed),
        }
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distance::Known { km } => write!(f, "{:.1} km", km),
            Distance::Unknown(reason) => write!(f, "{}", reason.message()),
        }
    }
}

/// Extracts the first numeric token from a display string ("2.4 km" -> 2.4).
fn first_numeric_token(input: &str) -> Option<f64> {
    let start = input.find(|c: char| c.is_ascii_digit())?;
    let rest = &input[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(rest.len());
    rest[..end].parse::<f64>().ok()
}

/// Great-circle distance between two points in kilometres.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.lat().to_radians();
    let lat_b = b.lat().to_radians();
    let d_lat = (b.lat() - a.lat()).to_radians();
    let d_lon = (b.lon() - a.lon()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// The outcome of enriching one request.
///
/// Either a single overarching reason (patient location absent: no
/// per-pharmacy values are computed at all), or a per-pharmacy map. A
/// pharmacy absent from the map resolves to
/// [`DistanceUnknown::CalculationFailed`].
#[derive(Clone, Debug, Default)]
pub struct DistanceReport {
    overall: Option<DistanceUnknown>,
    by_pharmacy: HashMap<RecordUuid, Distance>,
}

impl DistanceReport {
    /// A report where nothing was computed, for a request-level reason.
    pub fn unavailable(reason: DistanceUnknown) -> Self {
        Self {
            overall: Some(reason),
            by_pharmacy: HashMap::new(),
        }
    }

    /// The request-level reason, if the whole report is degraded.
    pub fn overall(&self) -> Option<DistanceUnknown> {
        self.overall
    }

    /// Inserts a per-pharmacy distance.
    pub fn insert(&mut self, pharmacy_id: RecordUuid, distance: Distance) {
        self.by_pharmacy.insert(pharmacy_id, distance);
    }

    /// Resolves the distance for one pharmacy, degrading to the overall
    /// reason or to `CalculationFailed` when absent.
    pub fn distance_for(&self, pharmacy_id: &RecordUuid) -> Distance {
        if let Some(reason) = self.overall {
            return Distance::Unknown(reason);
        }
        self.by_pharmacy
            .get(pharmacy_id)
            .copied()
            .unwrap_or(Distance::Unknown(DistanceUnknown::CalculationFailed))
    }

    /// Iterates the computed per-pharmacy entries.
    pub fn iter(&self) -> impl Iterator<Item = (&RecordUuid, &Distance)> {
        self.by_pharmacy.iter()
    }
}

/// Computes distance reports from the pharmacy registry.
#[derive(Clone, Debug)]
pub struct DistanceService {
    cfg: Arc<CoreConfig>,
}

impl DistanceService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Enriches a request's quotes with distances from the patient's
    /// location.
    ///
    /// - `user_location == None` (geolocation denied or unavailable on the
    ///   client) yields a report carrying only
    ///   [`DistanceUnknown::UserLocationNotTaken`].
    /// - A quoting pharmacy without a registry location yields
    ///   [`DistanceUnknown::PharmacyLocationNotRecorded`] for that pharmacy.
    /// - A non-finite computation yields
    ///   [`DistanceUnknown::CalculationFailed`] for that pharmacy.
    pub fn report(
        &self,
        request: &MedicineRequest,
        user_location: Option<GeoPoint>,
    ) -> DistanceReport {
        let Some(origin) = user_location else {
            return DistanceReport::unavailable(DistanceUnknown::UserLocationNotTaken);
        };

        let mut report = DistanceReport::default();
        for quote in &request.quotes {
            let pharmacy_id = quote.pharmacy.id.clone();
            if report.by_pharmacy.contains_key(&pharmacy_id) {
                continue;
            }

            let distance = match PharmacyService::with_id(self.cfg.clone(), pharmacy_id.clone())
                .load()
            {
                Ok(pharmacy) => match pharmacy.location {
                    Some(location) => {
                        let km = haversine_km(origin, location);
                        if km.is_finite() {
                            Distance::Known { km }
                        } else {
                            Distance::Unknown(DistanceUnknown::CalculationFailed)
                        }
                    }
                    None => Distance::Unknown(DistanceUnknown::PharmacyLocationNotRecorded),
                },
                Err(e) => {
                    tracing::warn!(
                        "failed to load pharmacy {} for distance enrichment: {}",
                        pharmacy_id,
                        e
                    );
                    Distance::Unknown(DistanceUnknown::PharmacyLocationNotRecorded)
                }
            };

            report.insert(pharmacy_id, distance);
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_known_distance() {
        let d = Distance::Known { km: 2.4 };
        assert_eq!(d.to_string(), "2.4 km");

        let d = Distance::Known { km: 2.0 };
        assert_eq!(d.to_string(), "2.0 km");
    }

    #[test]
    fn test_display_unknown_distances_are_exact_sentinels() {
        assert_eq!(
            Distance::Unknown(DistanceUnknown::UserLocationNotTaken).to_string(),
            "User location not taken."
        );
        assert_eq!(
            Distance::Unknown(DistanceUnknown::PharmacyLocationNotRecorded).to_string(),
            "Pharmacist location not recorded."
        );
        assert_eq!(
            Distance::Unknown(DistanceUnknown::CalculationFailed).to_string(),
            "Distance calculation failed."
        );
    }

    #[test]
    fn test_parse_display_round_trips_sentinels() {
        for reason in [
            DistanceUnknown::PharmacyLocationNotRecorded,
            DistanceUnknown::CalculationFailed,
            DistanceUnknown::UserLocationNotTaken,
        ] {
            let parsed = Distance::parse_display(reason.message());
            assert_eq!(parsed, Distance::Unknown(reason));
        }
    }

    #[test]
    fn test_parse_display_extracts_first_numeric_token() {
        assert_eq!(Distance::parse_display("2.4 km"), Distance::Known { km: 2.4 });
        assert_eq!(
            Distance::parse_display("about 12 km away"),
            Distance::Known { km: 12.0 }
        );
    }

    #[test]
    fn test_parse_display_non_numeric_is_failure() {
        assert_eq!(
            Distance::parse_display("very far"),
            Distance::Unknown(DistanceUnknown::CalculationFailed)
        );
    }

    #[test]
    fn test_unknown_sorts_as_infinity() {
        assert_eq!(
            Distance::Unknown(DistanceUnknown::CalculationFailed).sort_km(),
            f64::INFINITY
        );
        assert_eq!(Distance::Known { km: 3.5 }.sort_km(), 3.5);
    }

    #[test]
    fn test_haversine_known_pair() {
        // Dhaka city centre to Gulshan, roughly 7.5 km
        let a = GeoPoint::new(23.7104, 90.4074).unwrap();
        let b = GeoPoint::new(23.7806, 90.4193).unwrap();
        let km = haversine_km(a, b);
        assert!(km > 7.0 && km < 9.0, "got {}", km);
    }

    #[test]
    fn test_haversine_zero_distance() {
        let a = GeoPoint::new(23.7104, 90.4074).unwrap();
        assert!(haversine_km(a, a) < 1e-9);
    }

    #[test]
    fn test_report_overall_reason_wins() {
        let report = DistanceReport::unavailable(DistanceUnknown::UserLocationNotTaken);
        let id = RecordUuid::new();
        assert_eq!(
            report.distance_for(&id),
            Distance::Unknown(DistanceUnknown::UserLocationNotTaken)
        );
    }

    #[test]
    fn test_report_absent_pharmacy_is_failure() {
        let mut report = DistanceReport::default();
        let known = RecordUuid::new();
        report.insert(known.clone(), Distance::Known { km: 1.0 });

        assert_eq!(report.distance_for(&known), Distance::Known { km: 1.0 });
        assert_eq!(
            report.distance_for(&RecordUuid::new()),
            Distance::Unknown(DistanceUnknown::CalculationFailed)
        );
    }
}
