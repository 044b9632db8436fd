//! Medicine request domain model and lifecycle state machine.
//!
//! A request is the patient-owned record that pharmacies quote against. It
//! moves through an explicit status lifecycle:
//!
//! ```text
//! pending -> quoted -> awaiting-confirmation -> confirmed -> dispatched
//!    |          |                |
//!    |          |                +-> rejected
//!    +----------+-> cancelled
//! ```
//!
//! Status transitions are validated here; the repository layer persists them
//! and records every transition in the request's audit trail.

use chrono::{DateTime, Utc};
use psx_types::PositiveQuantity;
use psx_uuid::RecordUuid;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::quote::Quote;
use crate::{RequestError, RequestResult};

/// How the patient described what they need.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestKind {
    /// A typed list of medicine names.
    FreeTextList,
    /// A photographed prescription; item names may be filled in later.
    PrescriptionImage,
    /// A photograph of a product or packaging.
    ProductImage,
}

impl RequestKind {
    /// Returns true when items of this request may carry an empty name,
    /// relying on the attached image instead.
    pub fn allows_unnamed_items(&self) -> bool {
        !matches!(self, RequestKind::FreeTextList)
    }
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RequestKind::FreeTextList => "free-text-list",
            RequestKind::PrescriptionImage => "prescription-image",
            RequestKind::ProductImage => "product-image",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for RequestKind {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free-text-list" => Ok(RequestKind::FreeTextList),
            "prescription-image" => Ok(RequestKind::PrescriptionImage),
            "product-image" => Ok(RequestKind::ProductImage),
            other => Err(RequestError::InvalidInput(format!(
                "unknown request kind: '{}'",
                other
            ))),
        }
    }
}

/// Lifecycle status of a medicine request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestStatus {
    /// Submitted, no quotes yet.
    Pending,
    /// At least one pharmacy quote has been received.
    Quoted,
    /// The patient accepted a quote; the pharmacy has not yet confirmed.
    AwaitingConfirmation,
    /// The pharmacy confirmed the accepted quote.
    Confirmed,
    /// The pharmacy declined after acceptance.
    Rejected,
    /// The patient cancelled the request or stopped the search.
    Cancelled,
    /// The confirmed order was handed to delivery.
    Dispatched,
}

impl RequestStatus {
    /// Terminal statuses admit no further lifecycle transitions apart from
    /// refill (which creates a *new* request).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestStatus::Confirmed
                | RequestStatus::Rejected
                | RequestStatus::Cancelled
                | RequestStatus::Dispatched
        )
    }

    /// Pharmacies may attach quotes while the request is open.
    pub fn can_receive_quotes(&self) -> bool {
        matches!(self, RequestStatus::Pending | RequestStatus::Quoted)
    }

    /// The patient may accept a quote only once quotes exist and nothing has
    /// been accepted yet.
    pub fn can_accept(&self) -> bool {
        matches!(self, RequestStatus::Quoted)
    }

    /// The patient may cancel (or stop the search) before acceptance.
    pub fn can_cancel(&self) -> bool {
        matches!(self, RequestStatus::Pending | RequestStatus::Quoted)
    }

    /// Refill copies the items of a finished request into a new one.
    pub fn allows_refill(&self) -> bool {
        self.is_terminal()
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Quoted => "quoted",
            RequestStatus::AwaitingConfirmation => "awaiting-confirmation",
            RequestStatus::Confirmed => "confirmed",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Cancelled => "cancelled",
            RequestStatus::Dispatched => "dispatched",
        };
        write!(f, "{}", s)
    }
}

/// One line of a patient's request.
///
/// Items are immutable from the patient's perspective after submission; a
/// refill copies them (with fresh ids) into a new request instead of editing
/// in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequestedItem {
    pub id: Uuid,
    /// May be empty only for image-backed request kinds.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<String>,
    pub quantity: PositiveQuantity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Opaque reference to an uploaded image; upload mechanics live outside
    /// this subsystem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Input shape for a requested item, validated by
/// [`crate::repositories::requests::RequestService`] at submission.
#[derive(Clone, Debug, Default)]
pub struct NewRequestItem {
    pub name: String,
    pub form: Option<String>,
    pub strength: Option<String>,
    pub quantity: u32,
    pub notes: Option<String>,
    pub image: Option<String>,
}

/// A patient's medicine request with its embedded pharmacy quotes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MedicineRequest {
    pub id: RecordUuid,
    pub patient_id: RecordUuid,
    pub kind: RequestKind,
    pub status: RequestStatus,
    pub items: Vec<RequestedItem>,
    #[serde(default)]
    pub quotes: Vec<Quote>,
    pub created_at: DateTime<Utc>,
}

impl MedicineRequest {
    /// Looks up a requested item by its (case-insensitive) name.
    ///
    /// Quoted items reference request items by name on the wire, so cart
    /// materialisation resolves the originating item through this lookup.
    pub fn item_by_name(&self, name: &str) -> Option<&RequestedItem> {
        self.items
            .iter()
            .find(|item| item.name.eq_ignore_ascii_case(name))
    }

    /// Returns the accepted quote, if any.
    pub fn accepted_quote(&self) -> Option<&Quote> {
        self.quotes.iter().find(|q| q.is_accepted())
    }

    /// Validates that a status transition is allowed, returning the error a
    /// caller should surface when it is not.
    pub fn ensure(&self, allowed: bool, action: &'static str) -> RequestResult<()> {
        if allowed {
            Ok(())
        } else {
            Err(RequestError::InvalidTransition {
                from: self.status,
                action,
            })
        }
    }
}

/// Validates submission input and builds the stored item list.
///
/// # Errors
///
/// - [`RequestError::EmptyItemList`] if `items` is empty.
/// - [`RequestError::InvalidInput`] if an item of a free-text request has an
///   empty name, or an unnamed item has no image.
/// - [`RequestError::Value`] if a quantity is zero.
pub fn build_items(kind: RequestKind, items: Vec<NewRequestItem>) -> RequestResult<Vec<RequestedItem>> {
    if items.is_empty() {
        return Err(RequestError::EmptyItemList);
    }

    let mut built = Vec::with_capacity(items.len());
    for item in items {
        let name = item.name.trim().to_owned();
        if name.is_empty() {
            if !kind.allows_unnamed_items() {
                return Err(RequestError::InvalidInput(
                    "items of a free-text request must be named".into(),
                ));
            }
            if item.image.is_none() {
                return Err(RequestError::InvalidInput(
                    "an unnamed item must carry an image".into(),
                ));
            }
        }

        built.push(RequestedItem {
            id: Uuid::new_v4(),
            name,
            form: item.form,
            strength: item.strength,
            quantity: PositiveQuantity::new(item.quantity)?,
            notes: item.notes,
            image: item.image,
        });
    }

    Ok(built)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str, quantity: u32) -> NewRequestItem {
        NewRequestItem {
            name: name.to_string(),
            quantity,
            ..Default::default()
        }
    }

    #[test]
    fn test_status_terminality() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(!RequestStatus::Quoted.is_terminal());
        assert!(!RequestStatus::AwaitingConfirmation.is_terminal());
        assert!(RequestStatus::Confirmed.is_terminal());
        assert!(RequestStatus::Rejected.is_terminal());
        assert!(RequestStatus::Cancelled.is_terminal());
        assert!(RequestStatus::Dispatched.is_terminal());
    }

    #[test]
    fn test_accept_only_from_quoted() {
        assert!(RequestStatus::Quoted.can_accept());
        assert!(!RequestStatus::Pending.can_accept());
        assert!(!RequestStatus::AwaitingConfirmation.can_accept());
        assert!(!RequestStatus::Cancelled.can_accept());
    }

    #[test]
    fn test_cancel_only_before_acceptance() {
        assert!(RequestStatus::Pending.can_cancel());
        assert!(RequestStatus::Quoted.can_cancel());
        assert!(!RequestStatus::AwaitingConfirmation.can_cancel());
        assert!(!RequestStatus::Confirmed.can_cancel());
    }

    #[test]
    fn test_refill_only_from_terminal() {
        assert!(RequestStatus::Cancelled.allows_refill());
        assert!(RequestStatus::Dispatched.allows_refill());
        assert!(!RequestStatus::Quoted.allows_refill());
        assert!(!RequestStatus::AwaitingConfirmation.allows_refill());
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_string(&RequestStatus::AwaitingConfirmation).unwrap();
        assert_eq!(json, "\"awaiting-confirmation\"");

        let back: RequestStatus = serde_json::from_str("\"quoted\"").unwrap();
        assert_eq!(back, RequestStatus::Quoted);
    }

    #[test]
    fn test_build_items_rejects_empty_list() {
        let result = build_items(RequestKind::FreeTextList, vec![]);
        assert!(matches!(result, Err(RequestError::EmptyItemList)));
    }

    #[test]
    fn test_build_items_rejects_unnamed_free_text_item() {
        let result = build_items(RequestKind::FreeTextList, vec![named("   ", 1)]);
        assert!(matches!(result, Err(RequestError::InvalidInput(_))));
    }

    #[test]
    fn test_build_items_allows_unnamed_item_with_image() {
        let item = NewRequestItem {
            image: Some("uploads/rx-123.jpg".into()),
            quantity: 1,
            ..Default::default()
        };
        let built = build_items(RequestKind::PrescriptionImage, vec![item]).unwrap();
        assert_eq!(built.len(), 1);
        assert!(built[0].name.is_empty());
    }

    #[test]
    fn test_build_items_rejects_unnamed_item_without_image() {
        let item = NewRequestItem {
            quantity: 1,
            ..Default::default()
        };
        let result = build_items(RequestKind::PrescriptionImage, vec![item]);
        assert!(matches!(result, Err(RequestError::InvalidInput(_))));
    }

    #[test]
    fn test_build_items_rejects_zero_quantity() {
        let result = build_items(RequestKind::FreeTextList, vec![named("Paracetamol", 0)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_build_items_assigns_distinct_ids() {
        let built = build_items(
            RequestKind::FreeTextList,
            vec![named("Paracetamol", 2), named("Ibuprofen", 1)],
        )
        .unwrap();
        assert_ne!(built[0].id, built[1].id);
        assert_eq!(built[0].quantity.get(), 2);
    }
}
