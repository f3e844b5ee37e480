//! Payout rotation: order derivation and payee resolution.
//!
//! Randomized pools derive a full permutation of the join sequences once,
//! at activation, from a SHA-256 hash chain over the captured entropy. The
//! permutation and its seed are stored on the pool so any party can
//! re-derive and audit the order.

use ring::digest::{SHA256, digest};
use susu_sdk::objects::PoolId;

use crate::entities::MemberRecord;

/// Domain separation tag for rotation seed derivation.
const ROTATION_DOMAIN_TAG: &[u8] = b"susu-rotation-v1";

/// Derive the rotation seed for one pool from provider entropy.
///
/// `SHA-256(tag || entropy || pool_id)` — binding the pool id keeps two
/// pools activated with the same entropy from sharing an order.
pub fn derive_seed(entropy: &[u8; 32], pool_id: PoolId) -> [u8; 32] {
    let mut input = Vec::with_capacity(ROTATION_DOMAIN_TAG.len() + 32 + 8);
    input.extend_from_slice(ROTATION_DOMAIN_TAG);
    input.extend_from_slice(entropy);
    input.extend_from_slice(&pool_id.0.to_be_bytes());
    let d = digest(&SHA256, &input);
    let mut seed = [0u8; 32];
    seed.copy_from_slice(d.as_ref());
    seed
}

/// Infinite stream of `u64` draws from `SHA-256(seed || counter)` blocks.
struct HashChain {
    seed: [u8; 32],
    counter: u64,
    buffer: Vec<u64>,
}

impl HashChain {
    fn new(seed: [u8; 32]) -> Self {
        Self {
            seed,
            counter: 0,
            buffer: Vec::with_capacity(4),
        }
    }

    fn next_u64(&mut self) -> u64 {
        if let Some(draw) = self.buffer.pop() {
            return draw;
        }
        let mut input = [0u8; 40];
        input[..32].copy_from_slice(&self.seed);
        input[32..].copy_from_slice(&self.counter.to_be_bytes());
        self.counter += 1;

        let block = digest(&SHA256, &input);
        for chunk in block.as_ref().chunks_exact(8) {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(chunk);
            self.buffer.push(u64::from_be_bytes(bytes));
        }
        // Buffer was just refilled with four draws.
        self.buffer.pop().unwrap_or(0)
    }
}

/// Produce the randomized payout order: a Fisher–Yates shuffle of the join
/// sequences, driven by the hash chain. Deterministic for a given seed.
pub fn randomized_order(seed: &[u8; 32], join_sequences: &[u32]) -> Vec<u32> {
    let mut order: Vec<u32> = join_sequences.to_vec();
    let mut chain = HashChain::new(*seed);
    for i in (1..order.len()).rev() {
        let j = (chain.next_u64() % (i as u64 + 1)) as usize;
        order.swap(i, j);
    }
    order
}

/// Resolve the payee for the next settlement: the first member in the
/// payout order that is still eligible.
///
/// Positions of paid-out, defaulted, and exited members are skipped and
/// consumed; the relative order of everyone else never changes. Returns
/// `None` when no eligible member remains.
pub fn resolve_payee<'a>(
    order: &[u32],
    members: &'a [MemberRecord],
) -> Option<&'a MemberRecord> {
    order
        .iter()
        .filter_map(|seq| members.iter().find(|m| m.join_sequence == *seq))
        .find(|m| m.is_payee_eligible())
}
