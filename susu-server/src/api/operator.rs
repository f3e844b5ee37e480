//! Operator API handlers.
//!
//! These endpoints are called by the application backend and require
//! a signed body verified via the `Susu-Signature` header.
//!
//! # Endpoints
//!
//! - `POST /pools`            – create a new pool
//! - `POST /pools/invite`     – invite a wallet into an invite-mode pool
//! - `POST /pools/join`       – admit a wallet
//! - `POST /pools/exit`       – remove a wallet from an open pool
//! - `POST /pools/activate`   – start a full pool
//! - `POST /pools/contribute` – record a cycle contribution
//! - `POST /pools/settle`     – settle the current cycle
//! - `POST /pools/dissolve`   – dissolve a pool and issue refunds
//! - `POST /graduations`      – record a graduation into a hub

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use kanau::processor::Processor;
use susu_core::engine::{
    ActivatePool, Contribute, CreatePool, DissolvePool, ExitPool, GetPool, Graduate,
    InviteMember, JoinPool, SettleCycle,
};
use susu_sdk::objects::{
    ActivatePoolRequest, ActivationResponse, ContributeRequest, ContributionRecordedResponse,
    CreatePoolRequest, DissolutionResponse, DissolvePoolRequest, ExitPoolRequest,
    GraduateRequest, InviteMemberRequest, JoinPoolRequest, SettleCycleRequest,
};
use time::{Duration, OffsetDateTime};

use super::{
    ApiError, contribution_to_response, encode_seed, graduation_to_response, member_to_response,
    pool_to_response, refund_to_response, settlement_to_response, snapshot_to_response,
};
use crate::api::extractors::SignedBody;
use crate::state::AppState;

/// Build the Operator API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pools", post(create_pool))
        .route("/pools/invite", post(invite_member))
        .route("/pools/join", post(join_pool))
        .route("/pools/exit", post(exit_pool))
        .route("/pools/activate", post(activate_pool))
        .route("/pools/contribute", post(contribute))
        .route("/pools/settle", post(settle_cycle))
        .route("/pools/dissolve", post(dissolve_pool))
        .route("/graduations", post(graduate))
}

/// `POST /pools` — create a new pool.
///
/// The pool is created in `open` state with no members; the creator joins
/// through `POST /pools/join` like everyone else.
async fn create_pool(
    state: State<AppState>,
    SignedBody(payload): SignedBody<CreatePoolRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let starts_at = parse_timestamp(payload.starts_at)?;

    let pool = state
        .engine
        .process(CreatePool {
            creator: payload.creator,
            token: payload.token,
            capacity: payload.capacity,
            contribution_amount: payload.contribution_amount,
            cycle_duration: Duration::seconds(payload.cycle_duration_secs as i64),
            grace_period: payload
                .grace_period_secs
                .map(|secs| Duration::seconds(secs as i64)),
            starts_at,
            rotation_mode: payload.rotation_mode.into(),
            admission_mode: payload.admission_mode.into(),
            fee_bps: payload.fee_bps,
            late_fee_bps: payload.late_fee_bps,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(pool_to_response(&pool, 0))))
}

/// `POST /pools/invite` — invite a wallet into an invite-mode pool.
///
/// Only the pool creator may invite. Returns the pool so the caller sees
/// current membership.
async fn invite_member(
    state: State<AppState>,
    SignedBody(payload): SignedBody<InviteMemberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .engine
        .process(InviteMember {
            pool_id: payload.pool_id,
            creator: payload.creator,
            wallet: payload.wallet,
        })
        .await?;

    let snapshot = state
        .engine
        .process(GetPool {
            pool_id: payload.pool_id,
        })
        .await?;

    Ok(Json(snapshot_to_response(&snapshot)))
}

/// `POST /pools/join` — admit a wallet into an open pool.
async fn join_pool(
    state: State<AppState>,
    SignedBody(payload): SignedBody<JoinPoolRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let member = state
        .engine
        .process(JoinPool {
            pool_id: payload.pool_id,
            wallet: payload.wallet,
        })
        .await?;

    Ok(Json(member_to_response(&member)))
}

/// `POST /pools/exit` — leave a pool that has not activated yet.
async fn exit_pool(
    state: State<AppState>,
    SignedBody(payload): SignedBody<ExitPoolRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let member = state
        .engine
        .process(ExitPool {
            pool_id: payload.pool_id,
            wallet: payload.wallet,
        })
        .await?;

    Ok(Json(member_to_response(&member)))
}

/// `POST /pools/activate` — start a full pool.
///
/// Fixes the payout order (and, for randomized rotation, the audit seed)
/// and opens the first cycle.
async fn activate_pool(
    state: State<AppState>,
    SignedBody(payload): SignedBody<ActivatePoolRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .engine
        .process(ActivatePool {
            pool_id: payload.pool_id,
        })
        .await?;

    let member_count = outcome.payout_order.len() as u32;
    Ok(Json(ActivationResponse {
        pool: pool_to_response(&outcome.pool, member_count),
        payout_order: outcome.payout_order,
        seed_base64: outcome.seed.as_ref().map(encode_seed),
    }))
}

/// `POST /pools/contribute` — record a contribution to the current cycle.
async fn contribute(
    state: State<AppState>,
    SignedBody(payload): SignedBody<ContributeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .engine
        .process(Contribute {
            pool_id: payload.pool_id,
            cycle: payload.cycle,
            wallet: payload.wallet,
            amount: payload.amount,
        })
        .await?;

    Ok(Json(ContributionRecordedResponse {
        pool_id: payload.pool_id,
        cycle: payload.cycle,
        contribution: contribution_to_response(&outcome.entry),
        pot: outcome.pot,
        cycle_ready: outcome.cycle_ready,
    }))
}

/// `POST /pools/settle` — settle the current cycle.
///
/// Idempotent: replaying a settled cycle returns the stored receipt.
async fn settle_cycle(
    state: State<AppState>,
    SignedBody(payload): SignedBody<SettleCycleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = state
        .engine
        .process(SettleCycle {
            pool_id: payload.pool_id,
            cycle: payload.cycle,
        })
        .await?;

    Ok(Json(settlement_to_response(&receipt)))
}

/// `POST /pools/dissolve` — dissolve a pool and issue escrow refunds.
///
/// Re-invoking retries any refund legs that failed at the ledger.
async fn dissolve_pool(
    state: State<AppState>,
    SignedBody(payload): SignedBody<DissolvePoolRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .engine
        .process(DissolvePool {
            pool_id: payload.pool_id,
            initiator: payload.initiator,
            reason: payload.reason,
        })
        .await?;

    let snapshot = state
        .engine
        .process(GetPool {
            pool_id: payload.pool_id,
        })
        .await?;

    Ok(Json(DissolutionResponse {
        pool: snapshot_to_response(&snapshot),
        refunds: outcome.refunds.iter().map(refund_to_response).collect(),
    }))
}

/// `POST /graduations` — record a member's graduation from a completed
/// pool into a hub.
async fn graduate(
    state: State<AppState>,
    SignedBody(payload): SignedBody<GraduateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .engine
        .process(Graduate {
            pool_id: payload.pool_id,
            wallet: payload.wallet,
            hub_id: payload.hub_id,
        })
        .await?;

    Ok(Json(graduation_to_response(&record)))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a request-supplied unix timestamp.
fn parse_timestamp(ts: i64) -> Result<OffsetDateTime, ApiError> {
    OffsetDateTime::from_unix_timestamp(ts).map_err(|_| ApiError::InvalidTimestamp(ts))
}
