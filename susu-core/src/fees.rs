//! Basis-point fee arithmetic.
//!
//! All splits use integer truncation: the fee rounds down and the
//! remainder stays with the pot side.

use susu_sdk::amounts::TokenAmount;

/// Denominator for basis-point math.
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Result of splitting a pot into fee and net payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSplit {
    pub fee: TokenAmount,
    pub net: TokenAmount,
}

/// Split `pot` by `fee_bps`, truncating the fee toward zero.
///
/// The computation decomposes the pot so the multiply can never overflow
/// `u128` while staying exactly equal to `pot * fee_bps / 10_000`.
pub fn split_fee(pot: TokenAmount, fee_bps: u16) -> FeeSplit {
    let bps = u128::from(fee_bps);
    let whole = pot.base_units() / BPS_DENOMINATOR;
    let remainder = pot.base_units() % BPS_DENOMINATOR;
    let fee = whole * bps + (remainder * bps) / BPS_DENOMINATOR;
    FeeSplit {
        fee: TokenAmount::new(fee),
        net: TokenAmount::new(pot.base_units() - fee),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_split() {
        let split = split_fee(TokenAmount::new(1000), 250);
        assert_eq!(split.fee, TokenAmount::new(25));
        assert_eq!(split.net, TokenAmount::new(975));
    }

    #[test]
    fn test_truncation_favors_pot() {
        let split = split_fee(TokenAmount::new(999), 250);
        assert_eq!(split.fee, TokenAmount::new(24));
        assert_eq!(split.net, TokenAmount::new(975));
    }

    #[test]
    fn test_zero_fee() {
        let split = split_fee(TokenAmount::new(12345), 0);
        assert_eq!(split.fee, TokenAmount::ZERO);
        assert_eq!(split.net, TokenAmount::new(12345));
    }

    #[test]
    fn test_fee_plus_net_is_pot() {
        for pot in [0u128, 1, 9_999, 10_000, 10_001, 123_456_789] {
            for bps in [0u16, 1, 250, 999, 1000] {
                let split = split_fee(TokenAmount::new(pot), bps);
                assert_eq!(
                    split.fee.base_units() + split.net.base_units(),
                    pot,
                    "pot={pot} bps={bps}"
                );
            }
        }
    }

    #[test]
    fn test_large_pot_does_not_overflow() {
        let pot = TokenAmount::new(u128::MAX);
        let split = split_fee(pot, 1000);
        assert_eq!(
            split.fee.base_units() + split.net.base_units(),
            u128::MAX
        );
        assert_eq!(split.fee.base_units(), u128::MAX / 10);
    }
}
