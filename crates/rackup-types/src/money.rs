//! Money helpers shared by every balance-affecting operation.
//!
//! Amounts are fixed-point [`Decimal`] values, capped at
//! [`constants::AMOUNT_PRECISION`] decimal places. Every ledger operation
//! rejects non-positive amounts before touching any state.

use rust_decimal::Decimal;

use crate::constants;

/// Reject zero and negative amounts.
///
/// # Errors
/// Returns [`EngineError::NonPositiveAmount`](crate::EngineError::NonPositiveAmount).
pub fn ensure_positive(amount: Decimal) -> crate::Result<()> {
    if amount <= Decimal::ZERO {
        return Err(crate::EngineError::NonPositiveAmount { amount });
    }
    Ok(())
}

/// Cap an amount at the system precision.
#[must_use]
pub fn normalize(amount: Decimal) -> Decimal {
    amount.round_dp(constants::AMOUNT_PRECISION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_amounts_pass() {
        assert!(ensure_positive(Decimal::new(1, 8)).is_ok());
        assert!(ensure_positive(Decimal::new(500, 2)).is_ok());
    }

    #[test]
    fn zero_and_negative_rejected() {
        assert!(ensure_positive(Decimal::ZERO).is_err());
        assert!(ensure_positive(Decimal::new(-500, 2)).is_err());
    }

    #[test]
    fn normalize_caps_precision() {
        let raw: Decimal = "0.123456789012".parse().unwrap();
        assert_eq!(normalize(raw).scale(), constants::AMOUNT_PRECISION);
        let short = Decimal::new(500, 2);
        assert_eq!(normalize(short), short);
    }
}
