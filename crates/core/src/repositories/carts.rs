//! Patient cart store.
//!
//! One cart per patient, stored under the patient's sharded directory in
//! the carts tree. The cart is created lazily on first write; loading a
//! missing cart yields an empty one. The cart's mutation rules live on
//! [`crate::cart::Cart`]; this service only persists them.

use std::sync::Arc;

use psx_uuid::RecordUuid;

use crate::cart::Cart;
use crate::config::CoreConfig;
use crate::constants::CART_JSON_FILENAME;
use crate::error::RequestResult;
use crate::quote::Quote;
use crate::repositories::shared::{read_json, write_json_atomic};
use crate::request::MedicineRequest;

/// Service for cart persistence.
#[derive(Clone, Debug)]
pub struct CartService {
    cfg: Arc<CoreConfig>,
}

impl CartService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Loads a patient's cart, or an empty cart if none has been written.
    pub fn load(&self, patient_id: &RecordUuid) -> RequestResult<Cart> {
        let path = self.cart_dir(patient_id).join(CART_JSON_FILENAME);
        if !path.is_file() {
            return Ok(Cart::empty(patient_id.clone()));
        }
        read_json(&path)
    }

    /// Persists a cart atomically, creating its directory if needed.
    pub fn save(&self, cart: &Cart) -> RequestResult<()> {
        let dir = self.cart_dir(&cart.patient_id);
        std::fs::create_dir_all(&dir).map_err(crate::RequestError::StorageDirCreation)?;
        write_json_atomic(&dir, CART_JSON_FILENAME, cart)
    }

    /// Loads the patient's cart, materialises an accepted quote into it,
    /// and saves it back. Returns the updated cart.
    pub fn apply_accepted(
        &self,
        request: &MedicineRequest,
        quote: &Quote,
    ) -> RequestResult<Cart> {
        let mut cart = self.load(&request.patient_id)?;
        cart.materialize_accepted(request, quote);
        self.save(&cart)?;
        Ok(cart)
    }

    fn cart_dir(&self, patient_id: &RecordUuid) -> std::path::PathBuf {
        patient_id.sharded_dir(&self.cfg.carts_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::{PharmacyRef, QuoteStatus, QuotedItem};
    use crate::request::{build_items, NewRequestItem, RequestKind, RequestStatus};
    use chrono::Utc;
    use psx_uuid::TimestampUuid;
    use tempfile::TempDir;

    fn setup_test_env() -> (TempDir, Arc<CoreConfig>) {
        let temp_dir = TempDir::new().unwrap();
        let cfg = Arc::new(CoreConfig::new(temp_dir.path().to_path_buf()).unwrap());
        (temp_dir, cfg)
    }

    #[test]
    fn test_load_missing_cart_is_empty() {
        let (_temp, cfg) = setup_test_env();
        let service = CartService::new(cfg);
        let patient = RecordUuid::new();

        let cart = service.load(&patient).unwrap();
        assert_eq!(cart.patient_id, patient);
        assert!(cart.lines.is_empty());
    }

    #[test]
    fn test_save_and_reload() {
        let (_temp, cfg) = setup_test_env();
        let service = CartService::new(cfg);
        let patient = RecordUuid::new();

        let mut cart = service.load(&patient).unwrap();
        cart.add_to_cart(crate::cart::CartLine {
            item_id: uuid::Uuid::new_v4(),
            name: "Paracetamol".to_string(),
            price: 500.0,
            quantity: 1,
            pharmacy_name: "Lazz Pharma".to_string(),
            image: None,
            form: None,
            strength: None,
        });
        service.save(&cart).unwrap();

        let reloaded = service.load(&patient).unwrap();
        assert_eq!(reloaded.lines.len(), 1);
        assert_eq!(reloaded.lines[0].name, "Paracetamol");
    }

    #[test]
    fn test_apply_accepted_persists_materialised_lines() {
        let (_temp, cfg) = setup_test_env();
        let service = CartService::new(cfg);

        let items = build_items(
            RequestKind::FreeTextList,
            vec![NewRequestItem {
                name: "Paracetamol".to_string(),
                quantity: 1,
                ..Default::default()
            }],
        )
        .unwrap();

        let quote = Quote {
            id: TimestampUuid::generate(None),
            pharmacy: PharmacyRef {
                id: RecordUuid::new(),
                name: "Lazz Pharma".to_string(),
                address: "12 Green Rd".to_string(),
            },
            items: vec![QuotedItem {
                name: "Paracetamol".to_string(),
                price: Some(500.0),
                quantity: Some(2),
                available: true,
            }],
            notes: None,
            status: QuoteStatus::Accepted,
            quoted_at: Utc::now(),
        };

        let request = MedicineRequest {
            id: RecordUuid::new(),
            patient_id: RecordUuid::new(),
            kind: RequestKind::FreeTextList,
            status: RequestStatus::AwaitingConfirmation,
            items,
            quotes: vec![quote.clone()],
            created_at: Utc::now(),
        };

        let cart = service.apply_accepted(&request, &quote).unwrap();
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity, 2);

        let reloaded = service.load(&request.patient_id).unwrap();
        assert_eq!(reloaded.lines, cart.lines);
    }
}
