//! Admin API handlers.
//!
//! These endpoints are called by the protocol admin dashboard and require
//! the `Susu-Admin-Authorization` header with the plaintext admin secret.
//!
//! # Endpoints
//!
//! - `POST /hubs`     – register a hub in the directory
//! - `GET  /treasury` – accrued protocol fees and accrual entries

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use kanau::processor::Processor;
use susu_core::engine::{ListHubGraduates, RegisterHub};
use susu_sdk::objects::{RegisterHubRequest, TreasuryResponse};

use super::{ApiError, hub_to_response, treasury_balance_to_response, treasury_entry_to_response};
use crate::api::extractors::AdminAuth;
use crate::state::AppState;

/// Build the Admin API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/hubs", post(register_hub))
        .route("/treasury", get(treasury))
}

/// `POST /hubs` — register a hub.
///
/// Idempotent on the hub id: re-registering an existing hub returns it
/// unchanged.
async fn register_hub(
    state: State<AppState>,
    _auth: AdminAuth,
    Json(payload): Json<RegisterHubRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let hub = state
        .engine
        .process(RegisterHub {
            hub_id: payload.hub_id,
            name: payload.name,
            kind: payload.kind.into(),
            description: payload.description,
        })
        .await?;

    let graduates = state
        .engine
        .process(ListHubGraduates {
            hub_id: hub.hub_id.clone(),
        })
        .await?;

    Ok(Json(hub_to_response(&hub, graduates.len() as u32)))
}

/// `GET /treasury` — per-token fee balances and every accrual entry.
async fn treasury(state: State<AppState>, _auth: AdminAuth) -> impl IntoResponse {
    let treasury = state.engine.treasury();
    let balances = treasury.balances().await;
    let entries = treasury.entries().await;

    Json(TreasuryResponse {
        balances: balances.iter().map(treasury_balance_to_response).collect(),
        entries: entries.iter().map(treasury_entry_to_response).collect(),
    })
}
