//! Wire DTOs shared by the REST API and its clients.
//!
//! Statuses, kinds, actions, and sort strategies travel as their kebab-case
//! strings (`"awaiting-confirmation"`, `"accept-quote"`, ...); distances
//! travel as display strings, with the three fixed sentinel messages for
//! the error states. Identifiers are canonical 32-hex strings (requests,
//! pharmacies, patients) or timestamp-prefixed quote ids.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health check response.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Error payload for any failed call.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub message: String,
}

/// One requested item as stored on a request.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RequestItemRes {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<String>,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// One requested item in a submission body.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct NewItemReq {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<String>,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Request body for `POST /requests`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitRequestReq {
    pub patient_id: String,
    /// One of `free-text-list`, `prescription-image`, `product-image`.
    pub kind: String,
    pub items: Vec<NewItemReq>,
}

/// Pharmacy details carried on a quote.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PharmacyRefRes {
    pub id: String,
    pub name: String,
    pub address: String,
}

/// One line of a quote.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct QuoteItemRes {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    pub available: bool,
    /// Whether this line counts towards the total and the cart.
    pub valid: bool,
}

/// One pharmacy quote on a request.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct QuoteRes {
    pub id: String,
    pub pharmacy: PharmacyRefRes,
    pub items: Vec<QuoteItemRes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// One of `offered`, `accepted`, `rejected`.
    pub status: String,
    pub quoted_at: String,
    /// Sum of price x quantity over the valid lines.
    pub total: f64,
    /// False when the quote has no valid lines; such quotes cannot be
    /// accepted and are flagged in the UI.
    pub acceptable: bool,
    /// Display distance when enrichment was requested; absent otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<String>,
}

/// Full request snapshot.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RequestRes {
    pub id: String,
    pub patient_id: String,
    pub kind: String,
    pub status: String,
    pub created_at: String,
    pub items: Vec<RequestItemRes>,
    pub quotes: Vec<QuoteRes>,
}

/// Summary row in a patient's request listing.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RequestSummaryRes {
    pub id: String,
    pub kind: String,
    pub status: String,
    pub item_count: usize,
    pub quote_count: usize,
    pub created_at: String,
}

/// Response for `GET /requests?patient_id=`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ListRequestsRes {
    pub requests: Vec<RequestSummaryRes>,
}

/// One line of a quote submission body.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct QuoteItemReq {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    pub available: bool,
}

/// Request body for `POST /requests/{id}/quotes`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitQuoteReq {
    pub pharmacy_id: String,
    pub items: Vec<QuoteItemReq>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Request body for `PATCH /requests/{id}`.
///
/// The `action` discriminator is one of `accept-quote` (with `quoteId`),
/// `cancel-request`, `stop-search`, `confirm-order`, `decline-order`,
/// `dispatch-order`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PatchRequestReq {
    pub action: String,
    #[serde(
        default,
        rename = "quoteId",
        skip_serializing_if = "Option::is_none"
    )]
    pub quote_id: Option<String>,
}

/// Response for `GET /distance`.
///
/// Maps pharmacy id to a display string: either `"<km> km"` or one of the
/// three fixed messages ("Pharmacist location not recorded.", "Distance
/// calculation failed.", "User location not taken.").
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DistanceRes {
    pub distances: BTreeMap<String, String>,
}

/// Response for `GET /requests/{id}/watch`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct WatchRes {
    /// True when the request has reached `quoted`.
    pub quote_ready: bool,
    pub request: RequestRes,
}

/// One line of a patient's cart.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CartLineRes {
    pub item_id: String,
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

/// Response for `GET /carts/{patient_id}`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct CartRes {
    pub patient_id: String,
    pub lines: Vec<CartLineRes>,
    pub updated_at: String,
}

/// Request body for `POST /pharmacies`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterPharmacyReq {
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
}

/// A registered pharmacy.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PharmacyRes {
    pub id: String,
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    pub registered_at: String,
}

/// Response for `GET /pharmacies`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ListPharmaciesRes {
    pub pharmacies: Vec<PharmacyRes>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_request_uses_legacy_quote_id_key() {
        let req: PatchRequestReq =
            serde_json::from_str(r#"{"action": "accept-quote", "quoteId": "x"}"#).unwrap();
        assert_eq!(req.action, "accept-quote");
        assert_eq!(req.quote_id.as_deref(), Some("x"));

        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("quoteId"));
    }

    #[test]
    fn test_patch_request_quote_id_is_optional() {
        let req: PatchRequestReq =
            serde_json::from_str(r#"{"action": "cancel-request"}"#).unwrap();
        assert!(req.quote_id.is_none());
    }

    #[test]
    fn test_new_item_name_defaults_empty() {
        let item: NewItemReq =
            serde_json::from_str(r#"{"quantity": 1, "image": "uploads/rx.jpg"}"#).unwrap();
        assert!(item.name.is_empty());
        assert_eq!(item.quantity, 1);
    }
}
