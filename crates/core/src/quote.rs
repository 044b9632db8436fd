//! Pharmacy quote model.
//!
//! A quote is one pharmacy's priced response to a medicine request. It may
//! cover only a subset of the requested items, and individual quoted items
//! may be unavailable or incompletely priced; those lines are retained for
//! display but excluded from totals and cart materialisation.

use chrono::{DateTime, Utc};
use psx_uuid::{RecordUuid, TimestampUuid};
use serde::{Deserialize, Serialize};

/// Status of a quote within its owning request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuoteStatus {
    /// Submitted, awaiting the patient's decision.
    Offered,
    /// Chosen by the patient. At most one quote per request.
    Accepted,
    /// Declined (explicitly or because another quote was accepted).
    Rejected,
}

impl std::fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            QuoteStatus::Offered => "offered",
            QuoteStatus::Accepted => "accepted",
            QuoteStatus::Rejected => "rejected",
        };
        write!(f, "{}", s)
    }
}

/// Denormalised pharmacy details carried on each quote so the record stays
/// readable even if the registry entry later changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PharmacyRef {
    pub id: RecordUuid,
    pub name: String,
    pub address: String,
}

/// One line of a pharmacy quote, overlaying a requested item by name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuotedItem {
    /// Name of the requested item this line answers.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    pub available: bool,
}

impl QuotedItem {
    /// A quoted item is valid for totals and cart materialisation only when
    /// it is available, carries a finite non-negative price, and a positive
    /// quantity. Anything else is display-only.
    pub fn is_valid(&self) -> bool {
        self.available
            && self
                .price
                .is_some_and(|p| p.is_finite() && p >= 0.0)
            && self.quantity.is_some_and(|q| q > 0)
    }

    /// Price times quantity for a valid item, zero otherwise.
    pub fn line_total(&self) -> f64 {
        if self.is_valid() {
            // is_valid guarantees both fields are present
            self.price.unwrap_or(0.0) * f64::from(self.quantity.unwrap_or(0))
        } else {
            0.0
        }
    }
}

/// Input shape for a quoted item, validated against the request's item names
/// on submission.
#[derive(Clone, Debug)]
pub struct NewQuoteItem {
    pub name: String,
    pub price: Option<f64>,
    pub quantity: Option<u32>,
    pub available: bool,
}

/// One pharmacy's quote against a request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Quote {
    /// Timestamp-prefixed identifier; orders by submission time within the
    /// request.
    pub id: TimestampUuid,
    pub pharmacy: PharmacyRef,
    pub items: Vec<QuotedItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: QuoteStatus,
    pub quoted_at: DateTime<Utc>,
}

impl Quote {
    pub fn is_accepted(&self) -> bool {
        self.status == QuoteStatus::Accepted
    }

    /// Iterator over the lines that count towards totals and the cart.
    pub fn valid_items(&self) -> impl Iterator<Item = &QuotedItem> {
        self.items.iter().filter(|item| item.is_valid())
    }

    /// Returns true when the quote has at least one valid line and can be
    /// accepted.
    pub fn is_acceptable(&self) -> bool {
        self.items.iter().any(QuotedItem::is_valid)
    }

    /// Sum of `price * quantity` over the valid lines. A quote with no valid
    /// lines totals 0.0 and still participates in sorting.
    pub fn valid_total(&self) -> f64 {
        self.valid_items().map(QuotedItem::line_total).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: Option<f64>, quantity: Option<u32>, available: bool) -> QuotedItem {
        QuotedItem {
            name: "Paracetamol".to_string(),
            price,
            quantity,
            available,
        }
    }

    fn quote_with(items: Vec<QuotedItem>) -> Quote {
        Quote {
            id: TimestampUuid::generate(None),
            pharmacy: PharmacyRef {
                id: RecordUuid::new(),
                name: "Lazz Pharma".to_string(),
                address: "12 Green Rd".to_string(),
            },
            items,
            notes: None,
            status: QuoteStatus::Offered,
            quoted_at: Utc::now(),
        }
    }

    #[test]
    fn test_item_valid_requires_all_conditions() {
        assert!(item(Some(500.0), Some(2), true).is_valid());
        assert!(!item(Some(500.0), Some(2), false).is_valid());
        assert!(!item(None, Some(2), true).is_valid());
        assert!(!item(Some(500.0), None, true).is_valid());
        assert!(!item(Some(500.0), Some(0), true).is_valid());
        assert!(!item(Some(f64::NAN), Some(2), true).is_valid());
        assert!(!item(Some(-1.0), Some(2), true).is_valid());
    }

    #[test]
    fn test_valid_total_sums_only_valid_lines() {
        let quote = quote_with(vec![
            item(Some(500.0), Some(2), true),  // 1000
            item(Some(120.0), Some(1), true),  // 120
            item(Some(999.0), Some(3), false), // unavailable, excluded
            item(None, Some(5), true),         // unpriced, excluded
        ]);

        assert_eq!(quote.valid_total(), 1120.0);
    }

    #[test]
    fn test_zero_valid_items_total_is_zero() {
        let quote = quote_with(vec![item(None, None, false)]);
        assert_eq!(quote.valid_total(), 0.0);
        assert!(!quote.is_acceptable());
    }

    #[test]
    fn test_invalid_lines_are_retained_for_display() {
        let quote = quote_with(vec![
            item(Some(500.0), Some(2), true),
            item(None, None, false),
        ]);

        assert_eq!(quote.items.len(), 2);
        assert_eq!(quote.valid_items().count(), 1);
    }

    #[test]
    fn test_quote_serde_round_trip() {
        let quote = quote_with(vec![item(Some(500.0), Some(2), true)]);
        let json = serde_json::to_string(&quote).unwrap();
        let back: Quote = serde_json::from_str(&json).unwrap();

        assert_eq!(back.items, quote.items);
        assert_eq!(back.status, QuoteStatus::Offered);
        assert_eq!(back.id, quote.id);
    }
}
