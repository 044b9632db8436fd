//! PharmaStackX operations CLI.
//!
//! Drives the core stores directly (no running server needed): submitting
//! and inspecting requests patient-side, attaching quotes pharmacy-side,
//! and walking records through the lifecycle. Useful for development and
//! for operating on a data directory in place.

use std::str::FromStr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use psx_core::constants::DEFAULT_MARKET_DATA_DIR;
use psx_core::distance::DistanceService;
use psx_core::quote::NewQuoteItem;
use psx_core::ranking::{rank_quotes, SortStrategy};
use psx_core::repositories::carts::CartService;
use psx_core::repositories::pharmacies::{list_pharmacies, PharmacyService};
use psx_core::repositories::requests::{
    list_requests_for_patient, CancelKind, RequestService,
};
use psx_core::request::{NewRequestItem, RequestKind};
use psx_core::{CoreConfig, RecordUuid, TimestampUuid};
use psx_types::{GeoPoint, NonEmptyText};

#[derive(Parser)]
#[command(name = "psx")]
#[command(about = "PharmaStackX medicine-request marketplace CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List a patient's requests
    List {
        /// Patient UUID (canonical 32-hex)
        patient_uuid: String,
    },
    /// Submit a new medicine request
    Submit {
        /// Patient UUID (canonical 32-hex)
        patient_uuid: String,
        /// Items as name=quantity pairs (comma-separated), e.g.
        /// "Paracetamol=2,Ibuprofen=1"
        items: String,
        /// Request kind: free-text-list | prescription-image | product-image
        #[arg(long, default_value = "free-text-list")]
        kind: String,
    },
    /// Show a request with its quotes ranked
    Show {
        /// Request UUID
        request_uuid: String,
        /// Sort strategy: efficiency | price | distance | date
        #[arg(long, default_value = "efficiency")]
        sort: String,
        /// Patient latitude (omit to leave location untaken)
        #[arg(long)]
        lat: Option<f64>,
        /// Patient longitude
        #[arg(long)]
        lon: Option<f64>,
    },
    /// Show a request's audit trail
    History {
        /// Request UUID
        request_uuid: String,
    },
    /// Accept one quote and materialise it into the patient's cart
    Accept {
        /// Request UUID
        request_uuid: String,
        /// Quote id (timestamp-prefixed)
        quote_id: String,
    },
    /// Cancel a request
    Cancel {
        /// Request UUID
        request_uuid: String,
    },
    /// Stop the search for a request (same transition as cancel)
    StopSearch {
        /// Request UUID
        request_uuid: String,
    },
    /// Pharmacy confirms an accepted quote
    Confirm {
        /// Request UUID
        request_uuid: String,
    },
    /// Pharmacy declines after acceptance
    Decline {
        /// Request UUID
        request_uuid: String,
    },
    /// Hand a confirmed order to delivery
    Dispatch {
        /// Request UUID
        request_uuid: String,
    },
    /// Copy a finished request's items into a new pending request
    Refill {
        /// Request UUID
        request_uuid: String,
    },
    /// Register a pharmacy
    RegisterPharmacy {
        /// Pharmacy display name
        name: String,
        /// Street address
        address: String,
        /// Latitude (optional; distances degrade without it)
        #[arg(long)]
        lat: Option<f64>,
        /// Longitude
        #[arg(long)]
        lon: Option<f64>,
    },
    /// List registered pharmacies
    Pharmacies,
    /// Attach a pharmacy quote to a request
    SubmitQuote {
        /// Request UUID
        request_uuid: String,
        /// Pharmacy UUID
        pharmacy_uuid: String,
        /// Lines as name=price:quantity pairs (comma-separated); use
        /// name=unavailable for an out-of-stock line, e.g.
        /// "Paracetamol=500:2,Ibuprofen=unavailable"
        items: String,
        /// Free-text notes for the patient
        #[arg(long)]
        notes: Option<String>,
    },
    /// Show a patient's cart
    Cart {
        /// Patient UUID
        patient_uuid: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'psx --help' for commands");
        return Ok(());
    };

    let market_data_dir =
        std::env::var("MARKET_DATA_DIR").unwrap_or_else(|_| DEFAULT_MARKET_DATA_DIR.into());
    std::fs::create_dir_all(&market_data_dir)?;
    let cfg = Arc::new(CoreConfig::new(market_data_dir.into())?);

    match command {
        Commands::List { patient_uuid } => {
            let patient_id = RecordUuid::parse(&patient_uuid)?;
            let requests = list_requests_for_patient(&cfg, &patient_id);
            if requests.is_empty() {
                println!("No requests found.");
            } else {
                for request in requests {
                    println!(
                        "ID: {}, Status: {}, Items: {}, Quotes: {}, Created: {}",
                        request.id,
                        request.status,
                        request.item_count,
                        request.quote_count,
                        request.created_at.to_rfc3339()
                    );
                }
            }
        }
        Commands::Submit {
            patient_uuid,
            items,
            kind,
        } => {
            let patient_id = RecordUuid::parse(&patient_uuid)?;
            let kind = RequestKind::from_str(&kind)?;
            let items = parse_request_items(&items)?;

            match RequestService::new(cfg).submit(patient_id, kind, items) {
                Ok(service) => println!("Submitted request with UUID: {}", service.request_id()),
                Err(e) => eprintln!("Error submitting request: {}", e),
            }
        }
        Commands::Show {
            request_uuid,
            sort,
            lat,
            lon,
        } => {
            let request_id = RecordUuid::parse(&request_uuid)?;
            let strategy = SortStrategy::from_str(&sort)?;
            let location = match (lat, lon) {
                (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)?),
                _ => None,
            };

            let request = RequestService::with_id(cfg.clone(), request_id).load()?;
            println!(
                "Request {} [{}] status: {}",
                request.id, request.kind, request.status
            );
            for item in &request.items {
                println!(
                    "  item: {} x{}{}",
                    if item.name.is_empty() { "(image)" } else { &item.name },
                    item.quantity,
                    item.strength
                        .as_deref()
                        .map(|s| format!(" ({})", s))
                        .unwrap_or_default()
                );
            }

            if request.quotes.is_empty() {
                println!("No quotes yet.");
            } else {
                let report = DistanceService::new(cfg).report(&request, location);
                let ranked = rank_quotes(&request.quotes, &report, strategy);
                println!("Quotes ({} sort):", sort);
                for quote in &ranked {
                    println!(
                        "  {} | {} | total {:.2} | {} | {}{}",
                        quote.id,
                        quote.pharmacy.name,
                        quote.valid_total(),
                        report.distance_for(&quote.pharmacy.id),
                        quote.status,
                        if quote.is_acceptable() { "" } else { " | no valid items" }
                    );
                }
            }
        }
        Commands::History { request_uuid } => {
            let request_id = RecordUuid::parse(&request_uuid)?;
            let events = RequestService::with_id(cfg, request_id).history()?;
            if events.is_empty() {
                println!("No history recorded.");
            } else {
                for event in events {
                    println!(
                        "{} {:?} -> {}{}",
                        event.at.to_rfc3339(),
                        event.action,
                        event.to,
                        event
                            .quote_id
                            .map(|id| format!(" (quote {})", id))
                            .unwrap_or_default()
                    );
                }
            }
        }
        Commands::Accept {
            request_uuid,
            quote_id,
        } => {
            let request_id = RecordUuid::parse(&request_uuid)?;
            let quote_id = TimestampUuid::from_str(&quote_id)?;
            let service = RequestService::with_id(cfg.clone(), request_id);

            match service.accept_quote(&quote_id) {
                Ok((request, accepted)) => {
                    let cart = CartService::new(cfg).apply_accepted(&request, &accepted)?;
                    println!(
                        "Accepted quote from {}; cart now has {} line(s)",
                        accepted.pharmacy.name,
                        cart.lines.len()
                    );
                }
                Err(e) => eprintln!("Error accepting quote: {}", e),
            }
        }
        Commands::Cancel { request_uuid } => {
            let request_id = RecordUuid::parse(&request_uuid)?;
            match RequestService::with_id(cfg, request_id).cancel(CancelKind::CancelRequest) {
                Ok(request) => println!("Request {} is now {}", request.id, request.status),
                Err(e) => eprintln!("Error cancelling request: {}", e),
            }
        }
        Commands::StopSearch { request_uuid } => {
            let request_id = RecordUuid::parse(&request_uuid)?;
            match RequestService::with_id(cfg, request_id).cancel(CancelKind::StopSearch) {
                Ok(request) => println!("Request {} is now {}", request.id, request.status),
                Err(e) => eprintln!("Error stopping search: {}", e),
            }
        }
        Commands::Confirm { request_uuid } => {
            let request_id = RecordUuid::parse(&request_uuid)?;
            match RequestService::with_id(cfg, request_id).confirm_order() {
                Ok(request) => println!("Request {} is now {}", request.id, request.status),
                Err(e) => eprintln!("Error confirming order: {}", e),
            }
        }
        Commands::Decline { request_uuid } => {
            let request_id = RecordUuid::parse(&request_uuid)?;
            match RequestService::with_id(cfg, request_id).decline_order() {
                Ok(request) => println!("Request {} is now {}", request.id, request.status),
                Err(e) => eprintln!("Error declining order: {}", e),
            }
        }
        Commands::Dispatch { request_uuid } => {
            let request_id = RecordUuid::parse(&request_uuid)?;
            match RequestService::with_id(cfg, request_id).dispatch_order() {
                Ok(request) => println!("Request {} is now {}", request.id, request.status),
                Err(e) => eprintln!("Error dispatching order: {}", e),
            }
        }
        Commands::Refill { request_uuid } => {
            let request_id = RecordUuid::parse(&request_uuid)?;
            match RequestService::with_id(cfg, request_id).refill() {
                Ok(service) => println!("Refilled into new request: {}", service.request_id()),
                Err(e) => eprintln!("Error refilling request: {}", e),
            }
        }
        Commands::RegisterPharmacy {
            name,
            address,
            lat,
            lon,
        } => {
            let location = match (lat, lon) {
                (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)?),
                (None, None) => None,
                _ => return Err("--lat and --lon must be given together".into()),
            };

            match PharmacyService::new(cfg).register(
                NonEmptyText::new(&name)?,
                NonEmptyText::new(&address)?,
                location,
            ) {
                Ok(service) => {
                    println!("Registered pharmacy with UUID: {}", service.pharmacy_id())
                }
                Err(e) => eprintln!("Error registering pharmacy: {}", e),
            }
        }
        Commands::Pharmacies => {
            let pharmacies = list_pharmacies(&cfg);
            if pharmacies.is_empty() {
                println!("No pharmacies registered.");
            } else {
                for pharmacy in pharmacies {
                    println!(
                        "ID: {}, Name: {}, Address: {}{}",
                        pharmacy.id,
                        pharmacy.name,
                        pharmacy.address,
                        pharmacy
                            .location
                            .map(|l| format!(", Location: {:.4},{:.4}", l.lat(), l.lon()))
                            .unwrap_or_else(|| ", Location: not recorded".to_string())
                    );
                }
            }
        }
        Commands::SubmitQuote {
            request_uuid,
            pharmacy_uuid,
            items,
            notes,
        } => {
            let request_id = RecordUuid::parse(&request_uuid)?;
            let pharmacy_id = RecordUuid::parse(&pharmacy_uuid)?;
            let items = parse_quote_items(&items)?;

            match RequestService::with_id(cfg, request_id).submit_quote(pharmacy_id, items, notes)
            {
                Ok(request) => println!(
                    "Quote attached; request {} now has {} quote(s)",
                    request.id,
                    request.quotes.len()
                ),
                Err(e) => eprintln!("Error submitting quote: {}", e),
            }
        }
        Commands::Cart { patient_uuid } => {
            let patient_id = RecordUuid::parse(&patient_uuid)?;
            let cart = CartService::new(cfg).load(&patient_id)?;
            if cart.lines.is_empty() {
                println!("Cart is empty.");
            } else {
                for line in &cart.lines {
                    println!(
                        "{} x{} @ {:.2} from {}",
                        line.name, line.quantity, line.price, line.pharmacy_name
                    );
                }
            }
        }
    }

    Ok(())
}

/// Parses "name=quantity,name=quantity" into request items.
fn parse_request_items(input: &str) -> Result<Vec<NewRequestItem>, String> {
    let mut items = Vec::new();
    for entry in input.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (name, quantity) = entry
            .split_once('=')
            .ok_or_else(|| format!("expected name=quantity, got '{}'", entry))?;
        let quantity: u32 = quantity
            .trim()
            .parse()
            .map_err(|_| format!("invalid quantity in '{}'", entry))?;
        items.push(NewRequestItem {
            name: name.trim().to_string(),
            quantity,
            ..Default::default()
        });
    }
    Ok(items)
}

/// Parses "name=price:quantity,name=unavailable" into quote lines.
fn parse_quote_items(input: &str) -> Result<Vec<NewQuoteItem>, String> {
    let mut items = Vec::new();
    for entry in input.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (name, value) = entry
            .split_once('=')
            .ok_or_else(|| format!("expected name=price:quantity, got '{}'", entry))?;
        let name = name.trim().to_string();

        if value.trim() == "unavailable" {
            items.push(NewQuoteItem {
                name,
                price: None,
                quantity: None,
                available: false,
            });
            continue;
        }

        let (price, quantity) = value
            .split_once(':')
            .ok_or_else(|| format!("expected price:quantity in '{}'", entry))?;
        let price: f64 = price
            .trim()
            .parse()
            .map_err(|_| format!("invalid price in '{}'", entry))?;
        let quantity: u32 = quantity
            .trim()
            .parse()
            .map_err(|_| format!("invalid quantity in '{}'", entry))?;

        items.push(NewQuoteItem {
            name,
            price: Some(price),
            quantity: Some(quantity),
            available: true,
        });
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_items() {
        let items = parse_request_items("Paracetamol=2, Ibuprofen=1").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Paracetamol");
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[1].name, "Ibuprofen");
    }

    #[test]
    fn test_parse_request_items_rejects_bad_quantity() {
        assert!(parse_request_items("Paracetamol=two").is_err());
        assert!(parse_request_items("Paracetamol").is_err());
    }

    #[test]
    fn test_parse_quote_items() {
        let items = parse_quote_items("Paracetamol=500:2,Ibuprofen=unavailable").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].price, Some(500.0));
        assert_eq!(items[0].quantity, Some(2));
        assert!(items[0].available);
        assert!(!items[1].available);
        assert_eq!(items[1].price, None);
    }

    #[test]
    fn test_parse_quote_items_rejects_missing_quantity() {
        assert!(parse_quote_items("Paracetamol=500").is_err());
    }
}
