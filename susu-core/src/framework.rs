//! Capability seams the engine runs against.
//!
//! The engine consults three injected capabilities: a [`TokenLedger`] that
//! moves funds, a [`Clock`] for deadline checks, and a [`SeedProvider`] for
//! rotation entropy. Production wires real implementations; tests inject
//! deterministic ones.

use async_trait::async_trait;
use rand::RngCore;
use std::collections::{HashMap, HashSet};
use susu_sdk::amounts::TokenAmount;
use susu_sdk::objects::{PoolId, TokenRef, WalletAddress};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::Mutex;

// ---------------------------------------------------------------------------
// Token ledger
// ---------------------------------------------------------------------------

/// An account the ledger can move funds between.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AccountRef {
    /// A member wallet.
    Wallet(WalletAddress),
    /// The escrow account of one pool.
    PoolEscrow(PoolId),
}

impl std::fmt::Display for AccountRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountRef::Wallet(w) => write!(f, "wallet:{w}"),
            AccountRef::PoolEscrow(p) => write!(f, "pool-escrow:{p}"),
        }
    }
}

/// Failures reported by the ledger. Any failure aborts the invoking
/// transition before state is committed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("insufficient funds in {account}: required {required}, available {available}")]
    InsufficientFunds {
        account: String,
        required: TokenAmount,
        available: TokenAmount,
    },

    #[error("account {account} is frozen")]
    AccountFrozen { account: String },

    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// The funds-movement primitive the engine triggers but never
/// second-guesses.
#[async_trait]
pub trait TokenLedger: Send + Sync {
    /// Move `amount` of `token` between two accounts. Must be atomic: on
    /// error no funds have moved.
    async fn transfer(
        &self,
        token: &TokenRef,
        from: &AccountRef,
        to: &AccountRef,
        amount: TokenAmount,
    ) -> Result<(), LedgerError>;

    /// Current balance of an account.
    async fn balance(&self, token: &TokenRef, account: &AccountRef)
    -> Result<TokenAmount, LedgerError>;
}

/// Reference [`TokenLedger`] holding balances in memory.
///
/// Used by the server binary and by tests. `mint` funds accounts;
/// `freeze` simulates a custodian rejecting an account.
#[derive(Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

#[derive(Default)]
struct LedgerState {
    balances: HashMap<(TokenRef, AccountRef), u128>,
    frozen: HashSet<AccountRef>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit an account out of thin air.
    pub async fn mint(&self, token: &TokenRef, account: &AccountRef, amount: TokenAmount) {
        let mut state = self.state.lock().await;
        let entry = state
            .balances
            .entry((token.clone(), account.clone()))
            .or_insert(0);
        *entry = entry.saturating_add(amount.base_units());
    }

    /// Mark an account as frozen; transfers touching it fail.
    pub async fn freeze(&self, account: &AccountRef) {
        self.state.lock().await.frozen.insert(account.clone());
    }

    pub async fn unfreeze(&self, account: &AccountRef) {
        self.state.lock().await.frozen.remove(account);
    }
}

#[async_trait]
impl TokenLedger for InMemoryLedger {
    async fn transfer(
        &self,
        token: &TokenRef,
        from: &AccountRef,
        to: &AccountRef,
        amount: TokenAmount,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;

        if state.frozen.contains(from) {
            return Err(LedgerError::AccountFrozen {
                account: from.to_string(),
            });
        }
        if state.frozen.contains(to) {
            return Err(LedgerError::AccountFrozen {
                account: to.to_string(),
            });
        }

        let from_key = (token.clone(), from.clone());
        let available = state.balances.get(&from_key).copied().unwrap_or(0);
        if available < amount.base_units() {
            return Err(LedgerError::InsufficientFunds {
                account: from.to_string(),
                required: amount,
                available: TokenAmount::new(available),
            });
        }

        if let Some(balance) = state.balances.get_mut(&from_key) {
            *balance -= amount.base_units();
        }
        let to_entry = state
            .balances
            .entry((token.clone(), to.clone()))
            .or_insert(0);
        *to_entry = to_entry.saturating_add(amount.base_units());
        Ok(())
    }

    async fn balance(
        &self,
        token: &TokenRef,
        account: &AccountRef,
    ) -> Result<TokenAmount, LedgerError> {
        let state = self.state.lock().await;
        let balance = state
            .balances
            .get(&(token.clone(), account.clone()))
            .copied()
            .unwrap_or(0);
        Ok(TokenAmount::new(balance))
    }
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Time source for all deadline logic.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// Wall-clock time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Manually driven clock for deterministic runs.
pub struct ManualClock {
    now: std::sync::Mutex<OffsetDateTime>,
}

impl ManualClock {
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            now: std::sync::Mutex::new(start),
        }
    }

    pub fn advance(&self, by: time::Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }

    pub fn set(&self, to: OffsetDateTime) {
        if let Ok(mut now) = self.now.lock() {
            *now = to;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        self.now
            .lock()
            .map(|guard| *guard)
            .unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }
}

// ---------------------------------------------------------------------------
// Seed provider
// ---------------------------------------------------------------------------

/// Source of the entropy captured at pool activation for randomized
/// rotation. The captured bytes are stored on the pool so any party can
/// re-derive the permutation.
pub trait SeedProvider: Send + Sync {
    fn activation_entropy(&self) -> [u8; 32];
}

/// OS entropy, for production.
pub struct EntropySeedProvider;

impl SeedProvider for EntropySeedProvider {
    fn activation_entropy(&self) -> [u8; 32] {
        let mut entropy = [0u8; 32];
        rand::rng().fill_bytes(&mut entropy);
        entropy
    }
}

/// Fixed entropy, for deterministic runs.
pub struct FixedSeedProvider(pub [u8; 32]);

impl SeedProvider for FixedSeedProvider {
    fn activation_entropy(&self) -> [u8; 32] {
        self.0
    }
}
