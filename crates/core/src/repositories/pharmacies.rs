//! Pharmacy registry.
//!
//! Pharmacies are registered once and then referenced by quotes. Each quote
//! carries a denormalised copy of the pharmacy's name and address, so the
//! registry's authoritative role is the optional location used by distance
//! enrichment.
//!
//! Uses the same type-state pattern as the request store: `Uninitialised`
//! services can only register, `Initialised` services operate on a known
//! record.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use psx_types::{GeoPoint, NonEmptyText};
use psx_uuid::RecordUuid;
use serde::{Deserialize, Serialize};

use crate::config::CoreConfig;
use crate::constants::PHARMACY_JSON_FILENAME;
use crate::error::{RequestError, RequestResult};
use crate::repositories::shared::{create_uuid_and_shard_dir, read_json, walk_record_dirs, write_json_atomic};

/// A registered pharmacy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Pharmacy {
    pub id: RecordUuid,
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    pub registered_at: DateTime<Utc>,
}

// ============================================================================
// TYPE-STATE MARKERS
// ============================================================================

/// Marker type: no pharmacy record yet. Only `register()` is available.
#[derive(Clone, Copy, Debug)]
pub struct Uninitialised;

/// Marker type: an existing pharmacy record with a known identifier.
#[derive(Clone, Debug)]
pub struct Initialised {
    pharmacy_id: RecordUuid,
}

// ============================================================================
// PHARMACY SERVICE
// ============================================================================

/// Service for pharmacy registry operations.
#[derive(Clone, Debug)]
pub struct PharmacyService<S> {
    cfg: Arc<CoreConfig>,
    state: S,
}

impl PharmacyService<Uninitialised> {
    /// Creates a new registry service in uninitialised state.
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            cfg,
            state: Uninitialised,
        }
    }

    /// Registers a pharmacy, allocating its sharded record directory.
    ///
    /// A location may be omitted; quotes from such a pharmacy then render
    /// the "location not recorded" distance state until one is set.
    ///
    /// Consumes self and returns `PharmacyService<Initialised>`.
    pub fn register(
        self,
        name: NonEmptyText,
        address: NonEmptyText,
        location: Option<GeoPoint>,
    ) -> RequestResult<PharmacyService<Initialised>> {
        let (pharmacy_id, record_dir) = create_uuid_and_shard_dir(&self.cfg.pharmacies_dir())?;

        let pharmacy = Pharmacy {
            id: pharmacy_id.clone(),
            name: name.into_inner(),
            address: address.into_inner(),
            location,
            registered_at: Utc::now(),
        };

        write_json_atomic(&record_dir, PHARMACY_JSON_FILENAME, &pharmacy)?;

        Ok(PharmacyService {
            cfg: self.cfg,
            state: Initialised { pharmacy_id },
        })
    }
}

impl PharmacyService<Initialised> {
    /// Creates a registry service for an existing pharmacy.
    pub fn with_id(cfg: Arc<CoreConfig>, pharmacy_id: RecordUuid) -> Self {
        Self {
            cfg,
            state: Initialised { pharmacy_id },
        }
    }

    /// Returns the pharmacy identifier.
    pub fn pharmacy_id(&self) -> &RecordUuid {
        &self.state.pharmacy_id
    }

    /// Loads the pharmacy record.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::PharmacyNotFound`] when the record directory
    /// or file does not exist.
    pub fn load(&self) -> RequestResult<Pharmacy> {
        let record_dir = self
            .state
            .pharmacy_id
            .sharded_dir(&self.cfg.pharmacies_dir());
        let path = record_dir.join(PHARMACY_JSON_FILENAME);
        if !path.is_file() {
            return Err(RequestError::PharmacyNotFound(
                self.state.pharmacy_id.to_string(),
            ));
        }
        read_json(&path)
    }

    /// Sets or replaces the pharmacy's location.
    pub fn set_location(&self, location: Option<GeoPoint>) -> RequestResult<()> {
        let mut pharmacy = self.load()?;
        pharmacy.location = location;

        let record_dir = self
            .state
            .pharmacy_id
            .sharded_dir(&self.cfg.pharmacies_dir());
        write_json_atomic(&record_dir, PHARMACY_JSON_FILENAME, &pharmacy)
    }
}

/// Lists all registered pharmacies.
///
/// Unreadable or unparseable records are skipped with a warning.
pub fn list_pharmacies(cfg: &CoreConfig) -> Vec<Pharmacy> {
    let mut pharmacies = Vec::new();

    for record_dir in walk_record_dirs(&cfg.pharmacies_dir()) {
        let path = record_dir.join(PHARMACY_JSON_FILENAME);
        if !path.is_file() {
            continue;
        }
        match read_json::<Pharmacy>(&path) {
            Ok(pharmacy) => pharmacies.push(pharmacy),
            Err(e) => {
                tracing::warn!("failed to parse pharmacy record {}: {}", path.display(), e);
            }
        }
    }

    pharmacies
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_env() -> (TempDir, Arc<CoreConfig>) {
        let temp_dir = TempDir::new().unwrap();
        let cfg = Arc::new(CoreConfig::new(temp_dir.path().to_path_buf()).unwrap());
        (temp_dir, cfg)
    }

    fn register(cfg: Arc<CoreConfig>, name: &str, location: Option<GeoPoint>) -> RecordUuid {
        PharmacyService::new(cfg)
            .register(
                NonEmptyText::new(name).unwrap(),
                NonEmptyText::new("12 Green Rd, Dhaka").unwrap(),
                location,
            )
            .unwrap()
            .pharmacy_id()
            .clone()
    }

    #[test]
    fn test_register_and_load() {
        let (_temp, cfg) = setup_test_env();
        let location = GeoPoint::new(23.78, 90.41).unwrap();
        let id = register(cfg.clone(), "Lazz Pharma", Some(location));

        let pharmacy = PharmacyService::with_id(cfg, id.clone()).load().unwrap();
        assert_eq!(pharmacy.id, id);
        assert_eq!(pharmacy.name, "Lazz Pharma");
        assert_eq!(pharmacy.location, Some(location));
    }

    #[test]
    fn test_load_missing_pharmacy() {
        let (_temp, cfg) = setup_test_env();
        let result = PharmacyService::with_id(cfg, RecordUuid::new()).load();
        assert!(matches!(result, Err(RequestError::PharmacyNotFound(_))));
    }

    #[test]
    fn test_register_without_location() {
        let (_temp, cfg) = setup_test_env();
        let id = register(cfg.clone(), "Corner Chemist", None);

        let pharmacy = PharmacyService::with_id(cfg, id).load().unwrap();
        assert!(pharmacy.location.is_none());
    }

    #[test]
    fn test_set_location_later() {
        let (_temp, cfg) = setup_test_env();
        let id = register(cfg.clone(), "Corner Chemist", None);

        let service = PharmacyService::with_id(cfg, id);
        let location = GeoPoint::new(23.7, 90.4).unwrap();
        service.set_location(Some(location)).unwrap();

        assert_eq!(service.load().unwrap().location, Some(location));
    }

    #[test]
    fn test_list_pharmacies_skips_nothing_when_all_valid() {
        let (_temp, cfg) = setup_test_env();
        register(cfg.clone(), "One", None);
        register(cfg.clone(), "Two", None);

        let listed = list_pharmacies(&cfg);
        assert_eq!(listed.len(), 2);
    }

    #[test]
    fn test_list_pharmacies_empty_registry() {
        let (_temp, cfg) = setup_test_env();
        assert!(list_pharmacies(&cfg).is_empty());
    }
}
