//! Public read API handlers.
//!
//! Unauthenticated read-only views over pools, members, cycles, and the
//! hub directory.
//!
//! # Endpoints
//!
//! - `GET /pools`                              – list all pools
//! - `GET /pools/{pool_id}`                    – one pool
//! - `GET /pools/{pool_id}/members`            – members in join order
//! - `GET /pools/{pool_id}/members/{wallet}`   – one member
//! - `GET /pools/{pool_id}/payout-order`       – payout order and audit seed
//! - `GET /pools/{pool_id}/expected-payout`    – projected full-pot payout
//! - `GET /pools/{pool_id}/cycles/{cycle}`     – one cycle
//! - `GET /wallets/{wallet}/pools`             – pools a wallet belongs to
//! - `GET /hubs`                               – hub directory
//! - `GET /hubs/{hub_id}/graduates`            – graduations into one hub
//! - `GET /limits`                             – engine validation limits

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use kanau::processor::Processor;
use susu_core::engine::{
    GetCycle, GetExpectedPayout, GetMember, GetMemberPools, GetPayoutOrder, GetPool,
    ListHubGraduates, ListHubs, ListMembers, ListPools,
};
use susu_core::entities::{MAX_CAPACITY, MIN_CAPACITY};
use susu_sdk::objects::{
    EngineLimitsResponse, ExpectedPayoutResponse, GraduationResponse, HubId, HubResponse,
    MemberPoolsResponse, MemberResponse, PoolId, PoolResponse, WalletAddress,
};

use super::{
    ApiError, cycle_to_response, graduation_to_response, hub_view_to_response,
    member_to_response, payout_order_to_response, snapshot_to_response, whole_secs,
};
use crate::state::AppState;

/// Build the Public API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pools", get(list_pools))
        .route("/pools/{pool_id}", get(get_pool))
        .route("/pools/{pool_id}/members", get(list_members))
        .route("/pools/{pool_id}/members/{wallet}", get(get_member))
        .route("/pools/{pool_id}/payout-order", get(get_payout_order))
        .route("/pools/{pool_id}/expected-payout", get(get_expected_payout))
        .route("/pools/{pool_id}/cycles/{cycle}", get(get_cycle))
        .route("/wallets/{wallet}/pools", get(get_member_pools))
        .route("/hubs", get(list_hubs))
        .route("/hubs/{hub_id}/graduates", get(list_hub_graduates))
        .route("/limits", get(get_limits))
}

/// `GET /pools` — all pools, ordered by id.
async fn list_pools(state: State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let snapshots = state.engine.process(ListPools).await?;
    let pools: Vec<PoolResponse> = snapshots.iter().map(snapshot_to_response).collect();
    Ok(Json(pools))
}

/// `GET /pools/{pool_id}` — one pool.
async fn get_pool(
    state: State<AppState>,
    Path(pool_id): Path<PoolId>,
) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state.engine.process(GetPool { pool_id }).await?;
    Ok(Json(snapshot_to_response(&snapshot)))
}

/// `GET /pools/{pool_id}/members` — members in join order.
async fn list_members(
    state: State<AppState>,
    Path(pool_id): Path<PoolId>,
) -> Result<impl IntoResponse, ApiError> {
    let members = state.engine.process(ListMembers { pool_id }).await?;
    let members: Vec<MemberResponse> = members.iter().map(member_to_response).collect();
    Ok(Json(members))
}

/// `GET /pools/{pool_id}/members/{wallet}` — one member.
async fn get_member(
    state: State<AppState>,
    Path((pool_id, wallet)): Path<(PoolId, WalletAddress)>,
) -> Result<impl IntoResponse, ApiError> {
    let member = state.engine.process(GetMember { pool_id, wallet }).await?;
    Ok(Json(member_to_response(&member)))
}

/// `GET /pools/{pool_id}/payout-order` — the payout order fixed at
/// activation, with the audit seed for randomized pools.
async fn get_payout_order(
    state: State<AppState>,
    Path(pool_id): Path<PoolId>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state.engine.process(GetPayoutOrder { pool_id }).await?;
    Ok(Json(payout_order_to_response(&view)))
}

/// `GET /pools/{pool_id}/expected-payout` — projected full-pot payout
/// under the pool's terms.
async fn get_expected_payout(
    state: State<AppState>,
    Path(pool_id): Path<PoolId>,
) -> Result<impl IntoResponse, ApiError> {
    let expected = state.engine.process(GetExpectedPayout { pool_id }).await?;
    Ok(Json(ExpectedPayoutResponse {
        pool_id,
        projected_pot: expected.projected_pot,
        fee: expected.fee,
        net: expected.net,
    }))
}

/// `GET /pools/{pool_id}/cycles/{cycle}` — one cycle.
async fn get_cycle(
    state: State<AppState>,
    Path((pool_id, cycle)): Path<(PoolId, u32)>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state.engine.process(GetCycle { pool_id, cycle }).await?;
    Ok(Json(cycle_to_response(&record)))
}

/// `GET /wallets/{wallet}/pools` — pools a wallet belongs to, in pool-id
/// order.
async fn get_member_pools(
    state: State<AppState>,
    Path(wallet): Path<WalletAddress>,
) -> Result<impl IntoResponse, ApiError> {
    let pool_ids = state
        .engine
        .process(GetMemberPools {
            wallet: wallet.clone(),
        })
        .await?;
    Ok(Json(MemberPoolsResponse { wallet, pool_ids }))
}

/// `GET /hubs` — the hub directory with graduate counts, ordered by id.
async fn list_hubs(state: State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let hubs = state.engine.process(ListHubs).await?;
    let hubs: Vec<HubResponse> = hubs.iter().map(hub_view_to_response).collect();
    Ok(Json(hubs))
}

/// `GET /hubs/{hub_id}/graduates` — graduations recorded into one hub.
async fn list_hub_graduates(
    state: State<AppState>,
    Path(hub_id): Path<HubId>,
) -> Result<impl IntoResponse, ApiError> {
    let graduates = state.engine.process(ListHubGraduates { hub_id }).await?;
    let graduates: Vec<GraduationResponse> =
        graduates.iter().map(graduation_to_response).collect();
    Ok(Json(graduates))
}

/// `GET /limits` — engine validation limits, for frontend-side checks.
async fn get_limits(state: State<AppState>) -> Json<EngineLimitsResponse> {
    let config = state.engine.config();
    Json(EngineLimitsResponse {
        min_capacity: MIN_CAPACITY,
        max_capacity: MAX_CAPACITY,
        max_fee_bps: config.max_fee_bps,
        max_late_fee_bps: config.max_late_fee_bps,
        default_grace_period_secs: whole_secs(config.default_grace_period),
        missed_cycle_threshold: config.missed_cycle_threshold,
    })
}
