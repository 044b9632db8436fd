//! # API REST
//!
//! REST API implementation for PharmaStackX.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS)
//! - Quote-ready push via per-request watch channels (`notify` module)
//!
//! Uses `api-shared` for wire DTOs and `psx-core` for all domain logic.
//! Every handler treats the store as the authority: it loads a full
//! snapshot, applies one action, and returns the updated snapshot; errors
//! are logged and mapped to status codes, never allowed to panic the
//! server.

#![warn(rust_2018_idioms)]

pub mod notify;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::dto;
use api_shared::HealthService;
use psx_core::cart::Cart;
use psx_core::distance::{DistanceReport, DistanceService};
use psx_core::quote::{NewQuoteItem, Quote};
use psx_core::ranking::{rank_quotes, SortStrategy};
use psx_core::repositories::carts::CartService;
use psx_core::repositories::pharmacies::{list_pharmacies, Pharmacy, PharmacyService};
use psx_core::repositories::requests::{
    list_requests_for_patient, CancelKind, RequestService, RequestSummary,
};
use psx_core::request::{MedicineRequest, NewRequestItem, RequestKind, RequestStatus};
use psx_core::{CoreConfig, RecordUuid, RequestError, TimestampUuid};
use psx_types::{GeoPoint, NonEmptyText};

use crate::notify::QuoteReadyHub;

/// Application state shared across REST API handlers.
///
/// Contains the startup-resolved core configuration and the quote-ready
/// push hub.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    pub hub: Arc<QuoteReadyHub>,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            cfg,
            hub: Arc::new(QuoteReadyHub::new()),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        create_request,
        get_request,
        list_requests,
        patch_request,
        submit_quote,
        get_distance,
        watch_request,
        get_cart,
        register_pharmacy,
        get_pharmacies,
    ),
    components(schemas(
        dto::HealthRes,
        dto::ErrorRes,
        dto::RequestItemRes,
        dto::NewItemReq,
        dto::SubmitRequestReq,
        dto::PharmacyRefRes,
        dto::QuoteItemRes,
        dto::QuoteRes,
        dto::RequestRes,
        dto::RequestSummaryRes,
        dto::ListRequestsRes,
        dto::QuoteItemReq,
        dto::SubmitQuoteReq,
        dto::PatchRequestReq,
        dto::DistanceRes,
        dto::WatchRes,
        dto::CartLineRes,
        dto::CartRes,
        dto::RegisterPharmacyReq,
        dto::PharmacyRes,
        dto::ListPharmaciesRes,
    ))
)]
struct ApiDoc;

/// Builds the full application router, including the Swagger UI.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/requests", post(create_request))
        .route("/requests", get(list_requests))
        .route("/requests/:id", get(get_request))
        .route("/requests/:id", patch(patch_request))
        .route("/requests/:id/quotes", post(submit_quote))
        .route("/requests/:id/watch", get(watch_request))
        .route("/distance", get(get_distance))
        .route("/carts/:patient_id", get(get_cart))
        .route("/pharmacies", post(register_pharmacy))
        .route("/pharmacies", get(get_pharmacies))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// ERROR MAPPING
// ============================================================================

type ApiError = (StatusCode, Json<dto::ErrorRes>);

fn status_for(e: &RequestError) -> StatusCode {
    match e {
        RequestError::RequestNotFound(_)
        | RequestError::PharmacyNotFound(_)
        | RequestError::QuoteNotFound(_) => StatusCode::NOT_FOUND,
        RequestError::InvalidInput(_)
        | RequestError::EmptyItemList
        | RequestError::UnknownQuotedItem(_)
        | RequestError::Uuid(_)
        | RequestError::Text(_)
        | RequestError::Value(_) => StatusCode::BAD_REQUEST,
        RequestError::InvalidTransition { .. } | RequestError::QuoteAlreadyAccepted => {
            StatusCode::CONFLICT
        }
        RequestError::NoValidItems => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn fail(context: &'static str, e: RequestError) -> ApiError {
    let status = status_for(&e);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!("{} error: {:?}", context, e);
    } else {
        tracing::debug!("{} rejected: {}", context, e);
    }
    (
        status,
        Json(dto::ErrorRes {
            message: e.to_string(),
        }),
    )
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(dto::ErrorRes {
            message: message.into(),
        }),
    )
}

fn parse_record_id(input: &str) -> Result<RecordUuid, ApiError> {
    RecordUuid::parse(input).map_err(|e| bad_request(e.to_string()))
}

// ============================================================================
// DTO MAPPING
// ============================================================================

fn quote_res(quote: &Quote, distance: Option<String>) -> dto::QuoteRes {
    dto::QuoteRes {
        id: quote.id.to_string(),
        pharmacy: dto::PharmacyRefRes {
            id: quote.pharmacy.id.to_string(),
            name: quote.pharmacy.name.clone(),
            address: quote.pharmacy.address.clone(),
        },
        items: quote
            .items
            .iter()
            .map(|item| dto::QuoteItemRes {
                name: item.name.clone(),
                price: item.price,
                quantity: item.quantity,
                available: item.available,
                valid: item.is_valid(),
            })
            .collect(),
        notes: quote.notes.clone(),
        status: quote.status.to_string(),
        quoted_at: quote.quoted_at.to_rfc3339(),
        total: quote.valid_total(),
        acceptable: quote.is_acceptable(),
        distance,
    }
}

/// Builds the request snapshot DTO. When a distance report is supplied the
/// quotes are ranked under `strategy` and carry display distances;
/// otherwise they appear in submission order without distances.
fn request_res(
    request: &MedicineRequest,
    enrichment: Option<(&DistanceReport, SortStrategy)>,
) -> dto::RequestRes {
    let quotes = match enrichment {
        Some((report, strategy)) => rank_quotes(&request.quotes, report, strategy)
            .iter()
            .map(|q| {
                let distance = report.distance_for(&q.pharmacy.id).to_string();
                quote_res(q, Some(distance))
            })
            .collect(),
        None => request.quotes.iter().map(|q| quote_res(q, None)).collect(),
    };

    dto::RequestRes {
        id: request.id.to_string(),
        patient_id: request.patient_id.to_string(),
        kind: request.kind.to_string(),
        status: request.status.to_string(),
        created_at: request.created_at.to_rfc3339(),
        items: request
            .items
            .iter()
            .map(|item| dto::RequestItemRes {
                id: item.id.to_string(),
                name: item.name.clone(),
                form: item.form.clone(),
                strength: item.strength.clone(),
                quantity: item.quantity.get(),
                notes: item.notes.clone(),
                image: item.image.clone(),
            })
            .collect(),
        quotes,
    }
}

fn summary_res(summary: &RequestSummary) -> dto::RequestSummaryRes {
    dto::RequestSummaryRes {
        id: summary.id.to_string(),
        kind: summary.kind.to_string(),
        status: summary.status.to_string(),
        item_count: summary.item_count,
        quote_count: summary.quote_count,
        created_at: summary.created_at.to_rfc3339(),
    }
}

fn cart_res(cart: &Cart) -> dto::CartRes {
    dto::CartRes {
        patient_id: cart.patient_id.to_string(),
        lines: cart
            .lines
            .iter()
            .map(|line| dto::CartLineRes {
                item_id: line.item_id.to_string(),
                name: line.name.clone(),
                price: line.price,
                quantity: line.quantity,
                pharmacy_name: line.pharmacy_name.clone(),
                image: line.image.clone(),
                form: line.form.clone(),
                strength: line.strength.clone(),
            })
            .collect(),
        updated_at: cart.updated_at.to_rfc3339(),
    }
}

fn pharmacy_res(pharmacy: &Pharmacy) -> dto::PharmacyRes {
    dto::PharmacyRes {
        id: pharmacy.id.to_string(),
        name: pharmacy.name.clone(),
        address: pharmacy.address.clone(),
        lat: pharmacy.location.map(|l| l.lat()),
        lon: pharmacy.location.map(|l| l.lon()),
        registered_at: pharmacy.registered_at.to_rfc3339(),
    }
}

/// Resolves an optional coordinate pair into a patient location.
///
/// Both coordinates absent means geolocation was not taken on the client;
/// a half-given or out-of-range pair is a caller error.
fn parse_location(lat: Option<f64>, lon: Option<f64>) -> Result<Option<GeoPoint>, ApiError> {
    match (lat, lon) {
        (None, None) => Ok(None),
        (Some(lat), Some(lon)) => GeoPoint::new(lat, lon)
            .map(Some)
            .map_err(|e| bad_request(e.to_string())),
        _ => Err(bad_request("lat and lon must be given together")),
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = dto::HealthRes)
    )
)]
/// Health check endpoint for the REST API
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<dto::HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/requests",
    request_body = dto::SubmitRequestReq,
    responses(
        (status = 201, description = "Request created", body = dto::RequestRes),
        (status = 400, description = "Bad request", body = dto::ErrorRes),
        (status = 500, description = "Internal server error", body = dto::ErrorRes)
    )
)]
/// Submit a new medicine request
///
/// Creates a pending request from the patient's item list. The item list
/// must be non-empty; items of a free-text request must be named, and
/// unnamed items must carry an image reference.
#[axum::debug_handler]
async fn create_request(
    State(state): State<AppState>,
    Json(req): Json<dto::SubmitRequestReq>,
) -> Result<Json<dto::RequestRes>, ApiError> {
    let patient_id = parse_record_id(&req.patient_id)?;
    let kind =
        RequestKind::from_str(&req.kind).map_err(|e| fail("Create request", e))?;

    let items: Vec<NewRequestItem> = req
        .items
        .into_iter()
        .map(|item| NewRequestItem {
            name: item.name,
            form: item.form,
            strength: item.strength,
            quantity: item.quantity,
            notes: item.notes,
            image: item.image,
        })
        .collect();

    let service = RequestService::new(state.cfg.clone())
        .submit(patient_id, kind, items)
        .map_err(|e| fail("Create request", e))?;
    let request = service.load().map_err(|e| fail("Create request", e))?;

    Ok(Json(request_res(&request, None)))
}

/// Query parameters for the request view.
#[derive(Debug, Deserialize)]
struct GetRequestQuery {
    /// Ranking strategy; enables enrichment when present.
    sort: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

#[utoipa::path(
    get,
    path = "/requests/{id}",
    params(
        ("id" = String, Path, description = "Request identifier"),
        ("sort" = Option<String>, Query, description = "efficiency | price | distance | date"),
        ("lat" = Option<f64>, Query, description = "Patient latitude"),
        ("lon" = Option<f64>, Query, description = "Patient longitude")
    ),
    responses(
        (status = 200, description = "Request snapshot", body = dto::RequestRes),
        (status = 400, description = "Bad request", body = dto::ErrorRes),
        (status = 404, description = "Not found", body = dto::ErrorRes)
    )
)]
/// Fetch a request snapshot
///
/// Returns the full authoritative snapshot. When `sort` is given the
/// quotes are distance-enriched and ranked server-side: omitted
/// coordinates degrade to the "User location not taken." state, and
/// unknown distances rank last.
#[axum::debug_handler]
async fn get_request(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Query(query): Query<GetRequestQuery>,
) -> Result<Json<dto::RequestRes>, ApiError> {
    let request_id = parse_record_id(&id)?;
    let request = RequestService::with_id(state.cfg.clone(), request_id)
        .load()
        .map_err(|e| fail("Get request", e))?;

    let enrichment = match &query.sort {
        Some(sort) => {
            let strategy = SortStrategy::from_str(sort).map_err(|e| bad_request(e))?;
            let location = parse_location(query.lat, query.lon)?;
            let report = DistanceService::new(state.cfg.clone()).report(&request, location);
            Some((report, strategy))
        }
        None => None,
    };

    let res = match &enrichment {
        Some((report, strategy)) => request_res(&request, Some((report, *strategy))),
        None => request_res(&request, None),
    };
    Ok(Json(res))
}

/// Query parameters for the request listing.
#[derive(Debug, Deserialize)]
struct ListRequestsQuery {
    patient_id: String,
}

#[utoipa::path(
    get,
    path = "/requests",
    params(
        ("patient_id" = String, Query, description = "Patient identifier")
    ),
    responses(
        (status = 200, description = "Request summaries, newest first", body = dto::ListRequestsRes),
        (status = 400, description = "Bad request", body = dto::ErrorRes)
    )
)]
/// List a patient's requests
#[axum::debug_handler]
async fn list_requests(
    State(state): State<AppState>,
    Query(query): Query<ListRequestsQuery>,
) -> Result<Json<dto::ListRequestsRes>, ApiError> {
    let patient_id = parse_record_id(&query.patient_id)?;
    let summaries = list_requests_for_patient(&state.cfg, &patient_id);

    Ok(Json(dto::ListRequestsRes {
        requests: summaries.iter().map(summary_res).collect(),
    }))
}

#[utoipa::path(
    patch,
    path = "/requests/{id}",
    request_body = dto::PatchRequestReq,
    params(("id" = String, Path, description = "Request identifier")),
    responses(
        (status = 200, description = "Updated request", body = dto::RequestRes),
        (status = 400, description = "Bad request", body = dto::ErrorRes),
        (status = 404, description = "Not found", body = dto::ErrorRes),
        (status = 409, description = "Invalid transition or already accepted", body = dto::ErrorRes),
        (status = 422, description = "Quote has no valid items", body = dto::ErrorRes)
    )
)]
/// Drive the request lifecycle
///
/// Dispatches on the `action` discriminator:
/// - `accept-quote` (with `quoteId`): accepts exactly one quote and
///   materialises its valid items into the patient's cart at the exact
///   pharmacy-quoted quantities.
/// - `cancel-request` / `stop-search`: cancels; no cart effects.
/// - `confirm-order` / `decline-order` / `dispatch-order`: pharmacy-side
///   order steps.
///
/// The accept path enforces single-accept at the store; a second accept
/// returns 409 no matter what the client believed.
#[axum::debug_handler]
async fn patch_request(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<dto::PatchRequestReq>,
) -> Result<Json<dto::RequestRes>, ApiError> {
    let request_id = parse_record_id(&id)?;
    let service = RequestService::with_id(state.cfg.clone(), request_id);

    let updated = match req.action.as_str() {
        "accept-quote" => {
            let quote_id = req
                .quote_id
                .as_deref()
                .ok_or_else(|| bad_request("accept-quote requires quoteId"))?;
            let quote_id =
                TimestampUuid::from_str(quote_id).map_err(|e| bad_request(e.to_string()))?;

            let (request, accepted) = service
                .accept_quote(&quote_id)
                .map_err(|e| fail("Accept quote", e))?;

            CartService::new(state.cfg.clone())
                .apply_accepted(&request, &accepted)
                .map_err(|e| fail("Accept quote", e))?;

            request
        }
        "cancel-request" => service
            .cancel(CancelKind::CancelRequest)
            .map_err(|e| fail("Cancel request", e))?,
        "stop-search" => service
            .cancel(CancelKind::StopSearch)
            .map_err(|e| fail("Stop search", e))?,
        "confirm-order" => service
            .confirm_order()
            .map_err(|e| fail("Confirm order", e))?,
        "decline-order" => service
            .decline_order()
            .map_err(|e| fail("Decline order", e))?,
        "dispatch-order" => service
            .dispatch_order()
            .map_err(|e| fail("Dispatch order", e))?,
        other => return Err(bad_request(format!("unknown action: '{}'", other))),
    };

    Ok(Json(request_res(&updated, None)))
}

#[utoipa::path(
    post,
    path = "/requests/{id}/quotes",
    request_body = dto::SubmitQuoteReq,
    params(("id" = String, Path, description = "Request identifier")),
    responses(
        (status = 201, description = "Quote attached", body = dto::RequestRes),
        (status = 400, description = "Bad request", body = dto::ErrorRes),
        (status = 401, description = "Invalid API key", body = dto::ErrorRes),
        (status = 404, description = "Not found", body = dto::ErrorRes),
        (status = 409, description = "Request no longer receives quotes", body = dto::ErrorRes)
    )
)]
/// Attach a pharmacy quote (pharmacy write path)
///
/// Requires the `x-api-key` header. The first quote moves the request to
/// `quoted` and wakes every watcher of the request.
#[axum::debug_handler]
async fn submit_quote(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    headers: HeaderMap,
    Json(req): Json<dto::SubmitQuoteReq>,
) -> Result<Json<dto::RequestRes>, ApiError> {
    let provided_key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    api_shared::auth::validate_api_key(provided_key).map_err(|(status, message)| {
        (
            status,
            Json(dto::ErrorRes {
                message: message.to_string(),
            }),
        )
    })?;

    let request_id = parse_record_id(&id)?;
    let pharmacy_id = parse_record_id(&req.pharmacy_id)?;

    let items: Vec<NewQuoteItem> = req
        .items
        .into_iter()
        .map(|item| NewQuoteItem {
            name: item.name,
            price: item.price,
            quantity: item.quantity,
            available: item.available,
        })
        .collect();

    let updated = RequestService::with_id(state.cfg.clone(), request_id.clone())
        .submit_quote(pharmacy_id, items, req.notes)
        .map_err(|e| fail("Submit quote", e))?;

    state.hub.notify(&request_id);

    Ok(Json(request_res(&updated, None)))
}

/// Query parameters for distance enrichment.
#[derive(Debug, Deserialize)]
struct DistanceQuery {
    request_id: String,
    lat: Option<f64>,
    lon: Option<f64>,
}

#[utoipa::path(
    get,
    path = "/distance",
    params(
        ("request_id" = String, Query, description = "Request identifier"),
        ("lat" = Option<f64>, Query, description = "Patient latitude"),
        ("lon" = Option<f64>, Query, description = "Patient longitude")
    ),
    responses(
        (status = 200, description = "Per-pharmacy distance strings", body = dto::DistanceRes),
        (status = 400, description = "Bad request", body = dto::ErrorRes),
        (status = 404, description = "Not found", body = dto::ErrorRes)
    )
)]
/// Compute per-pharmacy distances for a quoted request
///
/// Returns a pharmacy-id to display-string map. With no coordinates, every
/// entry carries "User location not taken."; a pharmacy without a
/// registered location carries "Pharmacist location not recorded.".
/// Distance failures never make the request view unavailable.
#[axum::debug_handler]
async fn get_distance(
    State(state): State<AppState>,
    Query(query): Query<DistanceQuery>,
) -> Result<Json<dto::DistanceRes>, ApiError> {
    let request_id = parse_record_id(&query.request_id)?;
    let request = RequestService::with_id(state.cfg.clone(), request_id)
        .load()
        .map_err(|e| fail("Distance", e))?;

    let location = parse_location(query.lat, query.lon)?;
    let report = DistanceService::new(state.cfg.clone()).report(&request, location);

    let mut distances = std::collections::BTreeMap::new();
    for quote in &request.quotes {
        distances.insert(
            quote.pharmacy.id.to_string(),
            report.distance_for(&quote.pharmacy.id).to_string(),
        );
    }

    Ok(Json(dto::DistanceRes { distances }))
}

/// Query parameters for the watch endpoint.
#[derive(Debug, Deserialize)]
struct WatchQuery {
    /// How long to hold the request open waiting for a quote; 0 degrades to
    /// a plain poll.
    timeout_secs: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/requests/{id}/watch",
    params(
        ("id" = String, Path, description = "Request identifier"),
        ("timeout_secs" = Option<u64>, Query, description = "Long-poll timeout (default 25, max 60; 0 = immediate)")
    ),
    responses(
        (status = 200, description = "Quote-ready signal plus snapshot", body = dto::WatchRes),
        (status = 400, description = "Bad request", body = dto::ErrorRes),
        (status = 404, description = "Not found", body = dto::ErrorRes)
    )
)]
/// Wait for the request to reach `quoted`
///
/// Server-push replacement for the legacy fixed-interval poll, preserving
/// its client-visible contract: the response always carries a boolean
/// `quote_ready` and the full request snapshot. The call returns
/// immediately when the request is already quoted, otherwise it waits for
/// a quote submission to wake it or for the timeout to lapse.
#[axum::debug_handler]
async fn watch_request(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Query(query): Query<WatchQuery>,
) -> Result<Json<dto::WatchRes>, ApiError> {
    let request_id = parse_record_id(&id)?;
    let service = RequestService::with_id(state.cfg.clone(), request_id.clone());
    let mut request = service.load().map_err(|e| fail("Watch request", e))?;

    let timeout_secs = query.timeout_secs.unwrap_or(25).min(60);
    let deadline = tokio::time::Instant::now() + Duration::from_secs(timeout_secs);

    let mut quote_ready = request.status == RequestStatus::Quoted;
    if !quote_ready && timeout_secs > 0 {
        let mut rx = state.hub.subscribe(&request_id);
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                break;
            }
            match tokio::time::timeout(remaining, rx.changed()).await {
                Ok(Ok(())) => {
                    request = service.load().map_err(|e| fail("Watch request", e))?;
                    quote_ready = request.status == RequestStatus::Quoted;
                    if quote_ready {
                        break;
                    }
                }
                // Hub side dropped or the timeout lapsed; answer with the
                // latest snapshot either way.
                Ok(Err(_)) | Err(_) => break,
            }
        }
    }

    Ok(Json(dto::WatchRes {
        quote_ready,
        request: request_res(&request, None),
    }))
}

#[utoipa::path(
    get,
    path = "/carts/{patient_id}",
    params(("patient_id" = String, Path, description = "Patient identifier")),
    responses(
        (status = 200, description = "The patient's cart", body = dto::CartRes),
        (status = 400, description = "Bad request", body = dto::ErrorRes)
    )
)]
/// Fetch a patient's cart
#[axum::debug_handler]
async fn get_cart(
    State(state): State<AppState>,
    AxumPath(patient_id): AxumPath<String>,
) -> Result<Json<dto::CartRes>, ApiError> {
    let patient_id = parse_record_id(&patient_id)?;
    let cart = CartService::new(state.cfg.clone())
        .load(&patient_id)
        .map_err(|e| fail("Get cart", e))?;

    Ok(Json(cart_res(&cart)))
}

#[utoipa::path(
    post,
    path = "/pharmacies",
    request_body = dto::RegisterPharmacyReq,
    responses(
        (status = 201, description = "Pharmacy registered", body = dto::PharmacyRes),
        (status = 400, description = "Bad request", body = dto::ErrorRes),
        (status = 500, description = "Internal server error", body = dto::ErrorRes)
    )
)]
/// Register a pharmacy
///
/// Location is optional; quotes from a location-less pharmacy render the
/// "location not recorded" distance state until one is set.
#[axum::debug_handler]
async fn register_pharmacy(
    State(state): State<AppState>,
    Json(req): Json<dto::RegisterPharmacyReq>,
) -> Result<Json<dto::PharmacyRes>, ApiError> {
    let name = NonEmptyText::new(&req.name).map_err(|e| bad_request(e.to_string()))?;
    let address = NonEmptyText::new(&req.address).map_err(|e| bad_request(e.to_string()))?;
    let location = parse_location(req.lat, req.lon)?;

    let service = PharmacyService::new(state.cfg.clone())
        .register(name, address, location)
        .map_err(|e| fail("Register pharmacy", e))?;
    let pharmacy = service.load().map_err(|e| fail("Register pharmacy", e))?;

    Ok(Json(pharmacy_res(&pharmacy)))
}

#[utoipa::path(
    get,
    path = "/pharmacies",
    responses(
        (status = 200, description = "Registered pharmacies", body = dto::ListPharmaciesRes)
    )
)]
/// List the pharmacy registry
#[axum::debug_handler]
async fn get_pharmacies(State(state): State<AppState>) -> Json<dto::ListPharmaciesRes> {
    let pharmacies = list_pharmacies(&state.cfg);
    Json(dto::ListPharmaciesRes {
        pharmacies: pharmacies.iter().map(pharmacy_res).collect(),
    })
}
