//! Medicine request store.
//!
//! Manages the full lifecycle of a medicine request: submission, pharmacy
//! quote intake, patient acceptance or cancellation, the pharmacy-side
//! confirmation steps, and refill (copy-forward into a new request).
//!
//! ## Architecture
//!
//! Like the pharmacy registry, the request store uses:
//! - **Type-state pattern** for compile-time safety (Uninitialised/Initialised)
//! - **UUID-based sharded storage** for scalability
//! - **Atomic JSON persistence** (temp file + rename) per record
//! - **Append-only audit trail** recording every status transition
//!
//! Every mutation loads the record, validates the transition against the
//! state machine in [`crate::request`], applies it, and persists the whole
//! record atomically. Single-accept is enforced here as a load-check-swap:
//! an accept fails with [`RequestError::QuoteAlreadyAccepted`] whenever any
//! quote on the loaded record already holds accepted status, so the
//! invariant does not depend on clients disabling their buttons.

use std::sync::Arc;

use chrono::Utc;
use psx_uuid::{RecordUuid, TimestampUuid};

use crate::config::CoreConfig;
use crate::constants::REQUEST_JSON_FILENAME;
use crate::error::{RequestError, RequestResult};
use crate::history::{append_event, read_events, HistoryAction, StatusEvent};
use crate::quote::{NewQuoteItem, Quote, QuoteStatus, QuotedItem, PharmacyRef};
use crate::repositories::pharmacies::PharmacyService;
use crate::repositories::shared::{create_uuid_and_shard_dir, read_json, walk_record_dirs, write_json_atomic};
use crate::request::{build_items, MedicineRequest, NewRequestItem, RequestKind, RequestStatus};

// ============================================================================
// TYPE-STATE MARKERS
// ============================================================================

/// Marker type: request record does not yet exist. Only `submit()` can be
/// called in this state.
#[derive(Clone, Copy, Debug)]
pub struct Uninitialised;

/// Marker type: request record exists, identified by its UUID.
#[derive(Clone, Debug)]
pub struct Initialised {
    request_id: RecordUuid,
}

/// Which patient entry point asked for the cancellation. Both have the same
/// transition; they differ only in the audit trail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelKind {
    /// The explicit cancel action on the request view.
    CancelRequest,
    /// The "stop search" action in the history view.
    StopSearch,
}

/// Summary row for a patient's request listing.
#[derive(Clone, Debug)]
pub struct RequestSummary {
    pub id: RecordUuid,
    pub kind: RequestKind,
    pub status: RequestStatus,
    pub item_count: usize,
    pub quote_count: usize,
    pub created_at: chrono::DateTime<Utc>,
}

// ============================================================================
// REQUEST SERVICE
// ============================================================================

/// Service for request store operations.
///
/// Uses the type-state pattern to enforce correct usage at compile time.
/// Generic parameter `S` is either `Uninitialised` or `Initialised`.
#[derive(Clone, Debug)]
pub struct RequestService<S> {
    cfg: Arc<CoreConfig>,
    state: S,
}

impl RequestService<Uninitialised> {
    /// Creates a new request service in uninitialised state.
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            cfg,
            state: Uninitialised,
        }
    }

    /// Submits a new medicine request.
    ///
    /// Validates the item list (non-empty; named unless image-backed;
    /// positive quantities), allocates the sharded record directory, writes
    /// the pending record, and opens its audit trail.
    ///
    /// Consumes self and returns `RequestService<Initialised>`.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::EmptyItemList`] / [`RequestError::InvalidInput`]
    /// for invalid item lists, or a storage error.
    pub fn submit(
        self,
        patient_id: RecordUuid,
        kind: RequestKind,
        items: Vec<NewRequestItem>,
    ) -> RequestResult<RequestService<Initialised>> {
        let items = build_items(kind, items)?;

        let (request_id, record_dir) = create_uuid_and_shard_dir(&self.cfg.requests_dir())?;

        let request = MedicineRequest {
            id: request_id.clone(),
            patient_id,
            kind,
            status: RequestStatus::Pending,
            items,
            quotes: Vec::new(),
            created_at: Utc::now(),
        };

        write_json_atomic(&record_dir, REQUEST_JSON_FILENAME, &request)?;
        append_event(
            &record_dir,
            &StatusEvent::now(HistoryAction::Submitted, None, RequestStatus::Pending, None),
        )?;

        Ok(RequestService {
            cfg: self.cfg,
            state: Initialised { request_id },
        })
    }
}

impl RequestService<Initialised> {
    /// Creates a request service for an existing record.
    pub fn with_id(cfg: Arc<CoreConfig>, request_id: RecordUuid) -> Self {
        Self {
            cfg,
            state: Initialised { request_id },
        }
    }

    /// Returns the request identifier.
    pub fn request_id(&self) -> &RecordUuid {
        &self.state.request_id
    }

    /// Loads the request record as a full authoritative snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::RequestNotFound`] when the record does not
    /// exist.
    pub fn load(&self) -> RequestResult<MedicineRequest> {
        let path = self.record_dir().join(REQUEST_JSON_FILENAME);
        if !path.is_file() {
            return Err(RequestError::RequestNotFound(
                self.state.request_id.to_string(),
            ));
        }
        read_json(&path)
    }

    /// Reads the request's audit trail, oldest first.
    pub fn history(&self) -> RequestResult<Vec<StatusEvent>> {
        read_events(&self.record_dir())
    }
}

// ============================================================================
// QUOTE INTAKE
// ============================================================================

impl RequestService<Initialised> {
    /// Attaches a pharmacy quote to the request.
    ///
    /// The pharmacy is resolved from the registry and denormalised into the
    /// quote. Quoted item names must match requested items; each pharmacy
    /// may quote a request once. The first quote moves the request from
    /// `pending` to `quoted`.
    ///
    /// # Errors
    ///
    /// - [`RequestError::InvalidTransition`] if the request no longer
    ///   receives quotes.
    /// - [`RequestError::PharmacyNotFound`] for an unregistered pharmacy.
    /// - [`RequestError::UnknownQuotedItem`] for a line naming nothing the
    ///   patient asked for.
    /// - [`RequestError::InvalidInput`] for an empty line list or a repeat
    ///   quote from the same pharmacy.
    pub fn submit_quote(
        &self,
        pharmacy_id: RecordUuid,
        items: Vec<NewQuoteItem>,
        notes: Option<String>,
    ) -> RequestResult<MedicineRequest> {
        let mut request = self.load()?;
        request.ensure(request.status.can_receive_quotes(), "submit-quote")?;

        if items.is_empty() {
            return Err(RequestError::InvalidInput(
                "a quote must contain at least one line".into(),
            ));
        }
        if request
            .quotes
            .iter()
            .any(|q| q.pharmacy.id == pharmacy_id)
        {
            return Err(RequestError::InvalidInput(
                "this pharmacy has already quoted the request".into(),
            ));
        }
        for item in &items {
            if request.item_by_name(&item.name).is_none() {
                return Err(RequestError::UnknownQuotedItem(item.name.clone()));
            }
        }

        let pharmacy = PharmacyService::with_id(self.cfg.clone(), pharmacy_id).load()?;

        let last_quote_id = request
            .quotes
            .iter()
            .map(|q| &q.id)
            .max_by_key(|id| id.timestamp())
            .cloned();
        let quote_id = TimestampUuid::generate(last_quote_id.as_ref());
        let quoted_at = quote_id.timestamp();

        let quote = Quote {
            id: quote_id.clone(),
            pharmacy: PharmacyRef {
                id: pharmacy.id,
                name: pharmacy.name,
                address: pharmacy.address,
            },
            items: items
                .into_iter()
                .map(|item| QuotedItem {
                    name: item.name,
                    price: item.price,
                    quantity: item.quantity,
                    available: item.available,
                })
                .collect(),
            notes,
            status: QuoteStatus::Offered,
            quoted_at,
        };

        let from = request.status;
        request.quotes.push(quote);
        request.status = RequestStatus::Quoted;

        self.persist(&request)?;
        append_event(
            &self.record_dir(),
            &StatusEvent::now(
                HistoryAction::QuoteReceived,
                Some(from),
                request.status,
                Some(quote_id),
            ),
        )?;

        Ok(request)
    }
}

// ============================================================================
// PATIENT ACTIONS
// ============================================================================

impl RequestService<Initialised> {
    /// Accepts one quote on a quoted request.
    ///
    /// Enforces the single-accept invariant at the store: if any quote on
    /// the loaded record is already accepted the call fails, regardless of
    /// what the client believed when it sent the action. The accepted
    /// quote's valid items are the caller's input for cart materialisation
    /// (see [`crate::cart::Cart::materialize_accepted`]).
    ///
    /// Returns the updated request and a copy of the accepted quote.
    ///
    /// # Errors
    ///
    /// - [`RequestError::InvalidTransition`] unless the request is `quoted`.
    /// - [`RequestError::QuoteAlreadyAccepted`] if an accept already won.
    /// - [`RequestError::QuoteNotFound`] for an unknown quote id.
    /// - [`RequestError::NoValidItems`] for a quote with nothing
    ///   materialisable.
    pub fn accept_quote(
        &self,
        quote_id: &TimestampUuid,
    ) -> RequestResult<(MedicineRequest, Quote)> {
        let mut request = self.load()?;
        request.ensure(request.status.can_accept(), "accept-quote")?;

        if request.quotes.iter().any(Quote::is_accepted) {
            return Err(RequestError::QuoteAlreadyAccepted);
        }

        let index = request
            .quotes
            .iter()
            .position(|q| &q.id == quote_id)
            .ok_or_else(|| RequestError::QuoteNotFound(quote_id.to_string()))?;

        if !request.quotes[index].is_acceptable() {
            return Err(RequestError::NoValidItems);
        }

        let from = request.status;
        request.quotes[index].status = QuoteStatus::Accepted;
        request.status = RequestStatus::AwaitingConfirmation;

        self.persist(&request)?;
        append_event(
            &self.record_dir(),
            &StatusEvent::now(
                HistoryAction::AcceptQuote,
                Some(from),
                request.status,
                Some(quote_id.clone()),
            ),
        )?;

        let accepted = request.quotes[index].clone();
        Ok((request, accepted))
    }

    /// Cancels the request (or stops the search; same transition, different
    /// audit entry). No cart effects.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::InvalidTransition`] once a quote has been
    /// accepted or the request is terminal.
    pub fn cancel(&self, kind: CancelKind) -> RequestResult<MedicineRequest> {
        let (action, action_name) = match kind {
            CancelKind::CancelRequest => (HistoryAction::CancelRequest, "cancel-request"),
            CancelKind::StopSearch => (HistoryAction::StopSearch, "stop-search"),
        };

        let mut request = self.load()?;
        request.ensure(request.status.can_cancel(), action_name)?;

        let from = request.status;
        request.status = RequestStatus::Cancelled;

        self.persist(&request)?;
        append_event(
            &self.record_dir(),
            &StatusEvent::now(action, Some(from), request.status, None),
        )?;

        Ok(request)
    }

    /// Copies this request's items forward into a new pending request for
    /// the same patient. Available only once the request is terminal.
    ///
    /// Returns the service for the new request.
    pub fn refill(&self) -> RequestResult<RequestService<Initialised>> {
        let request = self.load()?;
        request.ensure(request.status.allows_refill(), "refill")?;

        let items: Vec<NewRequestItem> = request
            .items
            .iter()
            .map(|item| NewRequestItem {
                name: item.name.clone(),
                form: item.form.clone(),
                strength: item.strength.clone(),
                quantity: item.quantity.get(),
                notes: item.notes.clone(),
                image: item.image.clone(),
            })
            .collect();

        let new_service =
            RequestService::new(self.cfg.clone()).submit(request.patient_id.clone(), request.kind, items)?;

        append_event(
            &self.record_dir(),
            &StatusEvent::now(HistoryAction::Refill, Some(request.status), request.status, None),
        )?;

        Ok(new_service)
    }
}

// ============================================================================
// PHARMACY-SIDE ORDER STEPS
// ============================================================================

impl RequestService<Initialised> {
    /// Pharmacy confirms the accepted quote.
    pub fn confirm_order(&self) -> RequestResult<MedicineRequest> {
        self.step(
            RequestStatus::AwaitingConfirmation,
            RequestStatus::Confirmed,
            HistoryAction::ConfirmOrder,
            "confirm-order",
        )
    }

    /// Pharmacy declines after acceptance.
    pub fn decline_order(&self) -> RequestResult<MedicineRequest> {
        self.step(
            RequestStatus::AwaitingConfirmation,
            RequestStatus::Rejected,
            HistoryAction::DeclineOrder,
            "decline-order",
        )
    }

    /// Confirmed order handed to delivery.
    pub fn dispatch_order(&self) -> RequestResult<MedicineRequest> {
        self.step(
            RequestStatus::Confirmed,
            RequestStatus::Dispatched,
            HistoryAction::DispatchOrder,
            "dispatch-order",
        )
    }

    fn step(
        &self,
        from: RequestStatus,
        to: RequestStatus,
        action: HistoryAction,
        action_name: &'static str,
    ) -> RequestResult<MedicineRequest> {
        let mut request = self.load()?;
        request.ensure(request.status == from, action_name)?;

        request.status = to;

        self.persist(&request)?;
        append_event(
            &self.record_dir(),
            &StatusEvent::now(action, Some(from), to, None),
        )?;

        Ok(request)
    }
}

// ============================================================================
// PATHS & PERSISTENCE
// ============================================================================

impl RequestService<Initialised> {
    fn record_dir(&self) -> std::path::PathBuf {
        self.state.request_id.sharded_dir(&self.cfg.requests_dir())
    }

    fn persist(&self, request: &MedicineRequest) -> RequestResult<()> {
        write_json_atomic(&self.record_dir(), REQUEST_JSON_FILENAME, request)
    }
}

/// Lists a patient's requests as summary rows.
///
/// Unreadable or unparseable records are skipped with a warning.
pub fn list_requests_for_patient(cfg: &CoreConfig, patient_id: &RecordUuid) -> Vec<RequestSummary> {
    let mut summaries = Vec::new();

    for record_dir in walk_record_dirs(&cfg.requests_dir()) {
        let path = record_dir.join(REQUEST_JSON_FILENAME);
        if !path.is_file() {
            continue;
        }
        match read_json::<MedicineRequest>(&path) {
            Ok(request) => {
                if &request.patient_id == patient_id {
                    summaries.push(RequestSummary {
                        id: request.id,
                        kind: request.kind,
                        status: request.status,
                        item_count: request.items.len(),
                        quote_count: request.quotes.len(),
                        created_at: request.created_at,
                    });
                }
            }
            Err(e) => {
                tracing::warn!("failed to parse request record {}: {}", path.display(), e);
            }
        }
    }

    summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    summaries
}
