//! Pool creation.

use kanau::processor::Processor;
use susu_sdk::amounts::TokenAmount;
use susu_sdk::objects::{TokenRef, WalletAddress};
use time::{Duration, OffsetDateTime};

use super::{PoolAggregate, SusuEngine};
use crate::entities::{
    AdmissionMode, FEE_CAP_BPS, MAX_CAPACITY, MIN_CAPACITY, PoolRecord, PoolStatus, RotationMode,
};
use crate::errors::{EngineError, ValidationError};
use crate::events::PoolEvent;

/// Create a new pool.
///
/// Validation and the `Created -> Open` transition commit as one step:
/// a pool is never observable before it accepts members, and a rejected
/// configuration constructs nothing.
#[derive(Debug, Clone)]
pub struct CreatePool {
    pub creator: WalletAddress,
    pub token: TokenRef,
    pub capacity: u32,
    pub contribution_amount: TokenAmount,
    pub cycle_duration: Duration,
    /// Engine default applies when omitted.
    pub grace_period: Option<Duration>,
    pub starts_at: OffsetDateTime,
    pub rotation_mode: RotationMode,
    pub admission_mode: AdmissionMode,
    pub fee_bps: u16,
    /// Engine default applies when omitted.
    pub late_fee_bps: Option<u16>,
}

impl Processor<CreatePool> for SusuEngine {
    type Output = PoolRecord;
    type Error = EngineError;

    #[tracing::instrument(skip_all, err, name = "Engine:CreatePool")]
    async fn process(&self, command: CreatePool) -> Result<PoolRecord, EngineError> {
        let config = self.config();
        let now = self.now();

        if command.capacity < MIN_CAPACITY || command.capacity > MAX_CAPACITY {
            return Err(ValidationError::CapacityOutOfRange {
                requested: command.capacity,
                min: MIN_CAPACITY,
                max: MAX_CAPACITY,
            }
            .into());
        }
        if command.contribution_amount.is_zero() {
            return Err(ValidationError::ContributionAmountZero.into());
        }
        if !command.cycle_duration.is_positive() {
            return Err(ValidationError::CycleDurationNotPositive.into());
        }
        let max_fee = config.max_fee_bps.min(FEE_CAP_BPS);
        if command.fee_bps > max_fee {
            return Err(ValidationError::FeeAboveCap {
                requested_bps: command.fee_bps,
                max_bps: max_fee,
            }
            .into());
        }
        let late_fee_bps = command.late_fee_bps.unwrap_or(config.default_late_fee_bps);
        if late_fee_bps > config.max_late_fee_bps {
            return Err(ValidationError::LateFeeAboveCap {
                requested_bps: late_fee_bps,
                max_bps: config.max_late_fee_bps,
            }
            .into());
        }
        if command.starts_at <= now {
            return Err(ValidationError::StartTimeNotInFuture {
                starts_at: command.starts_at,
            }
            .into());
        }

        let pool_id = self.allocate_pool_id();
        let mut aggregate = PoolAggregate::new(PoolRecord {
            pool_id,
            creator: command.creator,
            token: command.token,
            capacity: command.capacity,
            contribution_amount: command.contribution_amount,
            cycle_duration: command.cycle_duration,
            grace_period: command.grace_period.unwrap_or(config.default_grace_period),
            starts_at: command.starts_at,
            rotation_mode: command.rotation_mode,
            admission_mode: command.admission_mode,
            fee_bps: command.fee_bps,
            late_fee_bps,
            status: PoolStatus::Created,
            current_cycle: 0,
            total_contributed: TokenAmount::ZERO,
            total_disbursed: TokenAmount::ZERO,
            total_fees_accrued: TokenAmount::ZERO,
            created_at: now,
            activated_at: None,
            dissolution_reason: None,
        });
        aggregate.transition(PoolStatus::Open)?;

        let record = aggregate.pool.clone();
        self.insert_aggregate(aggregate).await;

        tracing::info!(%pool_id, creator = %record.creator, capacity = record.capacity, "pool created");
        self.emit(PoolEvent::PoolCreated {
            pool_id,
            creator: record.creator.clone(),
        });
        Ok(record)
    }
}
