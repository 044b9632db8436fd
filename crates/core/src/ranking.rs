//! Quote ranking.
//!
//! Pure ordering over an enriched quote list. Re-ranking is recomputed on
//! every change to quotes, distances, or strategy; it never mutates its
//! inputs, and the underlying sort is stable, so quotes that compare equal
//! keep their submission order.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::distance::DistanceReport;
use crate::quote::Quote;

/// How the patient wants the quote list ordered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortStrategy {
    /// "Best match": ascending distance, ties broken by ascending total
    /// price. A lexicographic two-key sort, not a weighted score.
    #[default]
    Efficiency,
    /// Ascending valid total price.
    Price,
    /// Ascending distance; unknown distances last.
    Distance,
    /// Most recent quote first.
    Date,
}

impl FromStr for SortStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "efficiency" => Ok(SortStrategy::Efficiency),
            "price" => Ok(SortStrategy::Price),
            "distance" => Ok(SortStrategy::Distance),
            "date" => Ok(SortStrategy::Date),
            other => Err(format!("unknown sort strategy: '{}'", other)),
        }
    }
}

/// Returns the quotes ranked under `strategy`.
///
/// Distances come from the enrichment report; a degraded report (overall
/// reason set, or per-pharmacy entries missing) makes the affected quotes
/// sort as infinitely far, after every quote with a known distance.
pub fn rank_quotes(
    quotes: &[Quote],
    distances: &DistanceReport,
    strategy: SortStrategy,
) -> Vec<Quote> {
    let mut ranked: Vec<Quote> = quotes.to_vec();

    match strategy {
        SortStrategy::Efficiency => ranked.sort_by(|a, b| {
            let by_distance = distance_key(a, distances).total_cmp(&distance_key(b, distances));
            match by_distance {
                Ordering::Equal => a.valid_total().total_cmp(&b.valid_total()),
                other => other,
            }
        }),
        SortStrategy::Price => {
            ranked.sort_by(|a, b| a.valid_total().total_cmp(&b.valid_total()));
        }
        SortStrategy::Distance => {
            ranked.sort_by(|a, b| {
                distance_key(a, distances).total_cmp(&distance_key(b, distances))
            });
        }
        SortStrategy::Date => {
            ranked.sort_by(|a, b| b.quoted_at.cmp(&a.quoted_at));
        }
    }

    ranked
}

fn distance_key(quote: &Quote, distances: &DistanceReport) -> f64 {
    distances.distance_for(&quote.pharmacy.id).sort_km()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::{Distance, DistanceReport, DistanceUnknown};
    use crate::quote::{PharmacyRef, QuoteStatus, QuotedItem};
    use chrono::{Duration, Utc};
    use psx_uuid::{RecordUuid, TimestampUuid};

    fn quote(pharmacy_name: &str, price: f64, quantity: u32, age_minutes: i64) -> Quote {
        Quote {
            id: TimestampUuid::generate(None),
            pharmacy: PharmacyRef {
                id: RecordUuid::new(),
                name: pharmacy_name.to_string(),
                address: "somewhere".to_string(),
            },
            items: vec![QuotedItem {
                name: "Paracetamol".to_string(),
                price: Some(price),
                quantity: Some(quantity),
                available: true,
            }],
            notes: None,
            status: QuoteStatus::Offered,
            quoted_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    fn report_for(quotes: &[Quote], kms: &[Option<f64>]) -> DistanceReport {
        let mut report = DistanceReport::default();
        for (q, km) in quotes.iter().zip(kms) {
            let d = match km {
                Some(km) => Distance::Known { km: *km },
                None => Distance::Unknown(DistanceUnknown::PharmacyLocationNotRecorded),
            };
            report.insert(q.pharmacy.id.clone(), d);
        }
        report
    }

    fn names(ranked: &[Quote]) -> Vec<&str> {
        ranked.iter().map(|q| q.pharmacy.name.as_str()).collect()
    }

    #[test]
    fn test_price_sort_is_ascending_regardless_of_input_order() {
        let quotes = vec![
            quote("fifteen-hundred", 1500.0, 1, 0),
            quote("five-hundred", 500.0, 1, 0),
            quote("one-thousand", 1000.0, 1, 0),
        ];
        let report = DistanceReport::default();

        let ranked = rank_quotes(&quotes, &report, SortStrategy::Price);
        assert_eq!(
            names(&ranked),
            vec!["five-hundred", "one-thousand", "fifteen-hundred"]
        );

        let mut reversed = quotes.clone();
        reversed.reverse();
        let ranked = rank_quotes(&reversed, &report, SortStrategy::Price);
        assert_eq!(
            names(&ranked),
            vec!["five-hundred", "one-thousand", "fifteen-hundred"]
        );
    }

    #[test]
    fn test_distance_sort_places_unknown_last() {
        let quotes = vec![
            quote("no-location", 100.0, 1, 0),
            quote("far", 100.0, 1, 0),
            quote("near", 100.0, 1, 0),
        ];
        let report = report_for(&quotes, &[None, Some(8.2), Some(1.1)]);

        let ranked = rank_quotes(&quotes, &report, SortStrategy::Distance);
        assert_eq!(names(&ranked), vec!["near", "far", "no-location"]);
    }

    #[test]
    fn test_efficiency_breaks_distance_ties_by_price() {
        let quotes = vec![
            quote("pricey", 1000.0, 1, 0),
            quote("cheap", 800.0, 1, 0),
        ];
        let report = report_for(&quotes, &[Some(2.0), Some(2.0)]);

        let ranked = rank_quotes(&quotes, &report, SortStrategy::Efficiency);
        assert_eq!(names(&ranked), vec!["cheap", "pricey"]);
    }

    #[test]
    fn test_efficiency_distance_dominates_price() {
        let quotes = vec![
            quote("near-expensive", 5000.0, 1, 0),
            quote("far-cheap", 100.0, 1, 0),
        ];
        let report = report_for(&quotes, &[Some(1.0), Some(9.0)]);

        let ranked = rank_quotes(&quotes, &report, SortStrategy::Efficiency);
        assert_eq!(names(&ranked), vec!["near-expensive", "far-cheap"]);
    }

    #[test]
    fn test_all_unknown_distances_keep_original_order() {
        // Stable sort: with every key infinite, submission order is preserved
        let quotes = vec![
            quote("first", 300.0, 1, 0),
            quote("second", 100.0, 1, 0),
            quote("third", 200.0, 1, 0),
        ];
        let report = DistanceReport::unavailable(DistanceUnknown::UserLocationNotTaken);

        let ranked = rank_quotes(&quotes, &report, SortStrategy::Distance);
        assert_eq!(names(&ranked), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_date_sort_is_most_recent_first() {
        let quotes = vec![
            quote("older", 100.0, 1, 30),
            quote("newest", 100.0, 1, 1),
            quote("oldest", 100.0, 1, 90),
        ];
        let report = DistanceReport::default();

        let ranked = rank_quotes(&quotes, &report, SortStrategy::Date);
        assert_eq!(names(&ranked), vec!["newest", "older", "oldest"]);
    }

    #[test]
    fn test_sorting_is_idempotent() {
        let quotes = vec![
            quote("b", 900.0, 1, 5),
            quote("a", 200.0, 2, 10),
            quote("c", 400.0, 1, 1),
        ];
        let report = report_for(&quotes, &[Some(3.0), Some(1.0), None]);

        for strategy in [
            SortStrategy::Efficiency,
            SortStrategy::Price,
            SortStrategy::Distance,
            SortStrategy::Date,
        ] {
            let once = rank_quotes(&quotes, &report, strategy);
            let twice = rank_quotes(&once, &report, strategy);
            assert_eq!(names(&once), names(&twice));
        }
    }

    #[test]
    fn test_rank_does_not_mutate_input() {
        let quotes = vec![quote("b", 900.0, 1, 0), quote("a", 200.0, 1, 0)];
        let report = DistanceReport::default();

        let _ = rank_quotes(&quotes, &report, SortStrategy::Price);
        assert_eq!(names(&quotes), vec!["b", "a"]);
    }

    #[test]
    fn test_zero_valid_item_quote_participates_with_zero_total() {
        let mut empty = quote("empty", 0.0, 1, 0);
        empty.items[0].available = false;
        let quotes = vec![quote("real", 500.0, 1, 0), empty];
        let report = DistanceReport::default();

        let ranked = rank_quotes(&quotes, &report, SortStrategy::Price);
        assert_eq!(names(&ranked), vec!["empty", "real"]);
        assert!(!ranked[0].is_acceptable());
    }

    #[test]
    fn test_sort_strategy_parses_from_str() {
        assert_eq!(
            "efficiency".parse::<SortStrategy>().unwrap(),
            SortStrategy::Efficiency
        );
        assert_eq!("price".parse::<SortStrategy>().unwrap(), SortStrategy::Price);
        assert!("best".parse::<SortStrategy>().is_err());
        assert_eq!(SortStrategy::default(), SortStrategy::Efficiency);
    }
}
