//! Patient cart.
//!
//! The cart is session-scoped, single-writer state owned by the patient.
//! Its mutation surface is deliberately narrow:
//!
//! - [`Cart::add_to_cart`] only ever increments by one (or inserts at one);
//! - [`Cart::update_quantity`] sets a quantity exactly, removing the line at
//!   zero or below.
//!
//! Accepting a quote therefore materialises each valid quoted item by
//! calling `add_to_cart` *followed by* `update_quantity` with the exact
//! pharmacy-quoted quantity; the add alone would only ever produce unit
//! increments.

use chrono::{DateTime, Utc};
use psx_uuid::RecordUuid;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::quote::Quote;
use crate::request::MedicineRequest;

/// One line of a patient's cart, populated from an accepted quote item
/// joined back to the originating request item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Identifier of the originating request item.
    pub item_id: Uuid,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
    pub pharmacy_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<String>,
}

/// A patient's cart.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cart {
    pub patient_id: RecordUuid,
    #[serde(default)]
    pub lines: Vec<CartLine>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// An empty cart for a patient.
    pub fn empty(patient_id: RecordUuid) -> Self {
        Self {
            patient_id,
            lines: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Adds an item to the cart.
    ///
    /// If a line with the same `item_id` already exists, its quantity is
    /// incremented by one and the incoming line is otherwise ignored;
    /// otherwise the line is inserted with quantity one.
    pub fn add_to_cart(&mut self, line: CartLine) {
        self.updated_at = Utc::now();
        if let Some(existing) = self.lines.iter_mut().find(|l| l.item_id == line.item_id) {
            existing.quantity += 1;
            return;
        }
        self.lines.push(CartLine { quantity: 1, ..line });
    }

    /// Sets a line's quantity exactly, removing the line when `quantity` is
    /// zero or negative. Unknown ids are ignored.
    pub fn update_quantity(&mut self, item_id: Uuid, quantity: i64) {
        self.updated_at = Utc::now();
        if quantity <= 0 {
            self.lines.retain(|l| l.item_id != item_id);
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.item_id == item_id) {
            line.quantity = quantity as u32;
        }
    }

    /// Materialises an accepted quote's valid items into this cart.
    ///
    /// Each valid quoted item is joined back by name to the originating
    /// request item for id, image, form, and strength; price comes from the
    /// quote line and the pharmacy name from the accepted quote. Per the
    /// cart contract, each line is added (increment-or-insert) and then set
    /// to the exact pharmacy-quoted quantity. Quoted items with no matching
    /// request item are skipped with a warning.
    ///
    /// Returns the number of lines materialised.
    pub fn materialize_accepted(&mut self, request: &MedicineRequest, quote: &Quote) -> usize {
        let mut count = 0;
        for quoted in quote.valid_items() {
            let Some(origin) = request.item_by_name(&quoted.name) else {
                tracing::warn!(
                    "accepted quote line '{}' has no matching request item; skipped",
                    quoted.name
                );
                continue;
            };

            // is_valid guarantees price and quantity are present
            let price = quoted.price.unwrap_or(0.0);
            let quantity = quoted.quantity.unwrap_or(0);

            self.add_to_cart(CartLine {
                item_id: origin.id,
                name: origin.name.clone(),
                price,
                quantity: 1,
                pharmacy_name: quote.pharmacy.name.clone(),
                image: origin.image.clone(),
                form: origin.form.clone(),
                strength: origin.strength.clone(),
            });
            self.update_quantity(origin.id, i64::from(quantity));
            count += 1;
        }
        count
    }
}
