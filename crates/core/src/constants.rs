//! Constants used throughout the PharmaStackX core crate.
//!
//! This module contains all path and filename constants to ensure
//! consistency across the codebase and make maintenance easier.

/// Directory name for medicine request records storage.
pub const REQUESTS_DIR_NAME: &str = "requests";

/// Directory name for pharmacy registry records storage.
pub const PHARMACIES_DIR_NAME: &str = "pharmacies";

/// Directory name for patient cart records storage.
pub const CARTS_DIR_NAME: &str = "carts";

/// Default directory for marketplace data storage when no explicit directory
/// is configured.
pub const DEFAULT_MARKET_DATA_DIR: &str = "market_data";

/// Filename for request JSON records.
pub const REQUEST_JSON_FILENAME: &str = "request.json";

/// Filename for pharmacy JSON records.
pub const PHARMACY_JSON_FILENAME: &str = "pharmacy.json";

/// Filename for cart JSON records.
pub const CART_JSON_FILENAME: &str = "cart.json";

/// Filename for the append-only request status audit trail.
pub const HISTORY_FILENAME: &str = "history.jsonl";

/// Legacy client message when a quoting pharmacy has no stored location.
pub const MSG_PHARMACY_LOCATION_NOT_RECORDED: &str = "Pharmacist location not recorded.";

/// Legacy client message when the distance computation itself fails.
pub const MSG_DISTANCE_CALCULATION_FAILED: &str = "Distance calculation failed.";

/// Legacy client message when the patient's geolocation was not provided.
pub const MSG_USER_LOCATION_NOT_TAKEN: &str = "User location not taken.";

/// Mean Earth radius in kilometres, used by the haversine computation.
pub const EARTH_RADIUS_KM: f64 = 6371.0;
