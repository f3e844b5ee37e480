//! HTTP API modules.
//!
//! Three surfaces share one engine:
//!
//! - `public`   – unauthenticated read API
//! - `operator` – pool transitions, signed bodies via `Susu-Signature`
//! - `admin`    – hub registry and treasury, `Susu-Admin-Authorization` header
//!
//! Engine records are converted to SDK wire objects here; the converter
//! functions are shared by all three surfaces.

use axum::{Json, http::StatusCode, response::IntoResponse};
use susu_core::engine::{HubView, PayoutOrderView, PoolSnapshot, RefundEntry};
use susu_core::entities::{
    ContributionEntry, CycleRecord, GraduationRecord, HubRecord, MemberRecord, PoolRecord,
    SettlementReceipt,
};
use susu_core::errors::{
    AdmissionError, ContributionError, EngineError, GraduationError, LifecycleError,
};
use susu_core::framework::LedgerError;
use susu_core::treasury::{TreasuryBalance, TreasuryEntry};
use susu_sdk::objects::{
    ApiErrorPayload, ContributionResponse, CycleResponse, GraduationResponse, HubResponse,
    MemberResponse, PayoutOrderResponse, PoolResponse, RefundResponse, SettlementResponse,
    TreasuryBalanceResponse, TreasuryEntryResponse,
};
use time::Duration;

pub mod admin;
pub mod extractors;
pub mod operator;
pub mod public;

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

/// Errors surfaced by API handlers.
///
/// Engine errors keep their stable `code()` string in the response body;
/// the HTTP status is derived from the error area.
#[derive(Debug)]
pub enum ApiError {
    /// The engine refused the operation.
    Engine(EngineError),
    /// A request carried a unix timestamp outside the representable range.
    InvalidTimestamp(i64),
}

impl From<EngineError> for ApiError {
    fn from(error: EngineError) -> Self {
        ApiError::Engine(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::Engine(e) => {
                let status = engine_error_status(&e);
                if status.is_server_error() {
                    tracing::error!(error = %e, "Engine error");
                }
                (status, Json(ApiErrorPayload::new(e.code(), e.to_string()))).into_response()
            }
            ApiError::InvalidTimestamp(ts) => (
                StatusCode::BAD_REQUEST,
                Json(ApiErrorPayload::new(
                    "invalid_timestamp",
                    format!("{ts} is not a valid unix timestamp"),
                )),
            )
                .into_response(),
        }
    }
}

/// HTTP status for an engine error.
///
/// Missing records map to 404, rejected input to 400, authorization
/// refusals to 403, ledger-side payment failures to 422, and everything
/// else (state-machine refusals) to 409.
fn engine_error_status(error: &EngineError) -> StatusCode {
    match error {
        EngineError::UnknownPool(_) | EngineError::UnknownCycle(_, _) => StatusCode::NOT_FOUND,
        EngineError::Validation(_) => StatusCode::BAD_REQUEST,
        EngineError::Admission(AdmissionError::NotInvited { .. }) => StatusCode::FORBIDDEN,
        EngineError::Admission(_) => StatusCode::CONFLICT,
        EngineError::Contribution(ContributionError::NotAMember { .. }) => StatusCode::NOT_FOUND,
        EngineError::Contribution(ContributionError::AmountMismatch { .. }) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        EngineError::Contribution(_) => StatusCode::CONFLICT,
        EngineError::Settlement(_) => StatusCode::CONFLICT,
        EngineError::Graduation(GraduationError::UnknownHub { .. }) => StatusCode::NOT_FOUND,
        EngineError::Graduation(_) => StatusCode::CONFLICT,
        EngineError::Lifecycle(LifecycleError::NotCreator { .. }) => StatusCode::FORBIDDEN,
        EngineError::Lifecycle(LifecycleError::NotAMember { .. }) => StatusCode::NOT_FOUND,
        EngineError::Lifecycle(_) => StatusCode::CONFLICT,
        EngineError::Ledger(LedgerError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::Ledger(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

// ---------------------------------------------------------------------------
// Wire conversions
// ---------------------------------------------------------------------------

/// Duration as whole seconds on the wire. Engine durations are never
/// negative.
fn whole_secs(duration: Duration) -> u64 {
    u64::try_from(duration.whole_seconds()).unwrap_or(0)
}

/// Base64 (unpadded) encoding of an activation seed.
fn encode_seed(seed: &[u8; 32]) -> String {
    fast32::base64::RFC4648_NOPAD.encode(seed)
}

/// Convert a `PoolRecord` (engine model) into a `PoolResponse` (API model).
fn pool_to_response(pool: &PoolRecord, member_count: u32) -> PoolResponse {
    PoolResponse {
        pool_id: pool.pool_id,
        creator: pool.creator.clone(),
        token: pool.token.clone(),
        capacity: pool.capacity,
        member_count,
        contribution_amount: pool.contribution_amount,
        cycle_duration_secs: whole_secs(pool.cycle_duration),
        grace_period_secs: whole_secs(pool.grace_period),
        starts_at: pool.starts_at.unix_timestamp(),
        rotation_mode: pool.rotation_mode.into(),
        admission_mode: pool.admission_mode.into(),
        fee_bps: pool.fee_bps,
        late_fee_bps: pool.late_fee_bps,
        status: pool.status.into(),
        current_cycle: pool.current_cycle,
        total_contributed: pool.total_contributed,
        total_disbursed: pool.total_disbursed,
        total_fees_accrued: pool.total_fees_accrued,
        created_at: pool.created_at.unix_timestamp(),
        activated_at: pool.activated_at.map(|t| t.unix_timestamp()),
        dissolution_reason: pool.dissolution_reason.as_ref().map(|r| r.to_string()),
    }
}

fn snapshot_to_response(snapshot: &PoolSnapshot) -> PoolResponse {
    pool_to_response(&snapshot.pool, snapshot.member_count)
}

fn member_to_response(member: &MemberRecord) -> MemberResponse {
    MemberResponse {
        pool_id: member.pool_id,
        wallet: member.wallet.clone(),
        join_sequence: member.join_sequence,
        status: member.status.into(),
        joined_at: member.joined_at.unix_timestamp(),
        cycles_contributed: member.cycles_contributed,
        cycles_missed: member.cycles_missed,
        total_contributed: member.total_contributed,
        total_received: member.total_received,
        late_fees_paid: member.late_fees_paid,
        has_received_payout: member.has_received_payout,
    }
}

fn contribution_to_response(entry: &ContributionEntry) -> ContributionResponse {
    ContributionResponse {
        wallet: entry.wallet.clone(),
        amount: entry.amount,
        late_fee: entry.late_fee,
        paid_at: entry.paid_at.unix_timestamp(),
    }
}

fn settlement_to_response(receipt: &SettlementReceipt) -> SettlementResponse {
    SettlementResponse {
        receipt_id: receipt.receipt_id,
        pool_id: receipt.pool_id,
        cycle_index: receipt.cycle_index,
        payee: receipt.payee.clone(),
        pot: receipt.pot,
        fee: receipt.fee,
        disbursed: receipt.disbursed,
        settled_at: receipt.settled_at.unix_timestamp(),
    }
}

fn cycle_to_response(cycle: &CycleRecord) -> CycleResponse {
    CycleResponse {
        pool_id: cycle.pool_id,
        cycle_index: cycle.cycle_index,
        opened_at: cycle.opened_at.unix_timestamp(),
        deadline: cycle.deadline.unix_timestamp(),
        grace_deadline: cycle.grace_deadline.unix_timestamp(),
        payee: cycle.payee.clone(),
        pot: cycle.pot,
        contributions: cycle.contributions.iter().map(contribution_to_response).collect(),
        missed: cycle.missed.clone(),
        settlement: cycle.settlement.as_ref().map(settlement_to_response),
    }
}

fn payout_order_to_response(view: &PayoutOrderView) -> PayoutOrderResponse {
    PayoutOrderResponse {
        pool_id: view.pool_id,
        payout_order: view.wallets.clone(),
        seed_base64: view.seed.as_ref().map(encode_seed),
        next_payee: view.next_payee.clone(),
    }
}

fn hub_to_response(hub: &HubRecord, graduate_count: u32) -> HubResponse {
    HubResponse {
        hub_id: hub.hub_id.clone(),
        name: hub.name.clone(),
        kind: hub.kind.into(),
        description: hub.description.clone(),
        active: hub.active,
        created_at: hub.created_at.unix_timestamp(),
        graduate_count,
    }
}

fn hub_view_to_response(view: &HubView) -> HubResponse {
    hub_to_response(&view.hub, view.graduate_count)
}

fn graduation_to_response(graduation: &GraduationRecord) -> GraduationResponse {
    GraduationResponse {
        wallet: graduation.wallet.clone(),
        source_pool: graduation.source_pool,
        hub_id: graduation.hub_id.clone(),
        recorded_at: graduation.recorded_at.unix_timestamp(),
    }
}

fn refund_to_response(refund: &RefundEntry) -> RefundResponse {
    RefundResponse {
        wallet: refund.wallet.clone(),
        amount: refund.amount,
        completed: refund.completed,
    }
}

fn treasury_balance_to_response(balance: &TreasuryBalance) -> TreasuryBalanceResponse {
    TreasuryBalanceResponse {
        token: balance.token.clone(),
        accrued: balance.accrued,
    }
}

fn treasury_entry_to_response(entry: &TreasuryEntry) -> TreasuryEntryResponse {
    TreasuryEntryResponse {
        entry_id: entry.entry_id,
        pool_id: entry.pool_id,
        cycle_index: entry.cycle_index,
        token: entry.token.clone(),
        amount: entry.amount,
        recorded_at: entry.recorded_at.unix_timestamp(),
    }
}
