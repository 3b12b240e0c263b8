use crate::error::{AppError, AppResult};

/// Largest bill accepted for one redemption, in paise (10 crore rupees).
pub const MAX_BILL_AMOUNT: i64 = 10_000_000_000;

/// Savings for a bill that already reflects the deal discount.
///
/// The undiscounted amount is `bill * 100 / (100 - pct)`, so the saving is
/// `bill * pct / (100 - pct)`, rounded half-up. When the deal lists both an
/// original and a discounted price the saving is capped at their difference.
pub fn compute_savings(
    bill_amount: i64,
    discount_percentage: i32,
    original_price: Option<i64>,
    discounted_price: Option<i64>,
) -> AppResult<i64> {
    if bill_amount > MAX_BILL_AMOUNT {
        return Err(AppError::ValidationError(format!(
            "Bill amount must not exceed {MAX_BILL_AMOUNT} paise"
        )));
    }
    if bill_amount <= 0 || !(1..=99).contains(&discount_percentage) {
        return Ok(0);
    }

    let pct = i128::from(discount_percentage);
    let numerator = i128::from(bill_amount) * pct;
    let denominator = 100 - pct;
    let savings = i64::try_from((2 * numerator + denominator) / (2 * denominator))
        .map_err(|_| AppError::ValidationError("Bill amount is out of range".to_string()))?;

    Ok(match (original_price, discounted_price) {
        (Some(original), Some(discounted)) if original >= discounted => {
            savings.min(original - discounted)
        }
        _ => savings,
    })
}

/// `part / total` as a percentage rounded to two decimals; 0 when `total` is 0.
pub fn verification_rate(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 * 10_000.0 / total as f64).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_savings_from_discounted_bill() {
        // 20% off: a bill of 800 means 1000 before the discount
        assert_eq!(compute_savings(80_000, 20, None, None).unwrap(), 20_000);
        assert_eq!(compute_savings(50_000, 50, None, None).unwrap(), 50_000);
    }

    #[test]
    fn test_savings_round_half_up() {
        // 100 * 1 / 99 = 1.0101.. -> 1
        assert_eq!(compute_savings(100, 1, None, None).unwrap(), 1);
        // 3 * 25 / 75 = 1.0
        assert_eq!(compute_savings(3, 25, None, None).unwrap(), 1);
        // 1 * 60 / 40 = 1.5 -> 2
        assert_eq!(compute_savings(1, 60, None, None).unwrap(), 2);
    }

    #[test]
    fn test_savings_capped_by_listed_prices() {
        assert_eq!(
            compute_savings(80_000, 20, Some(10_000), Some(8_000)).unwrap(),
            2_000
        );
        assert_eq!(compute_savings(800, 20, Some(10_000), Some(8_000)).unwrap(), 200);
        // inconsistent prices do not cap
        assert_eq!(compute_savings(800, 20, Some(100), Some(200)).unwrap(), 200);
    }

    #[test]
    fn test_savings_invalid_input() {
        assert_eq!(compute_savings(0, 20, None, None).unwrap(), 0);
        assert_eq!(compute_savings(-10, 20, None, None).unwrap(), 0);
        assert_eq!(compute_savings(1000, 0, None, None).unwrap(), 0);
        assert_eq!(compute_savings(1000, 100, None, None).unwrap(), 0);
    }

    #[test]
    fn test_oversized_bill_is_rejected() {
        assert!(matches!(
            compute_savings(i64::MAX, 99, None, None),
            Err(AppError::ValidationError(_))
        ));
        assert!(compute_savings(MAX_BILL_AMOUNT + 1, 10, None, None).is_err());

        // the largest accepted bill at 99% still fits in i64
        assert_eq!(
            compute_savings(MAX_BILL_AMOUNT, 99, None, None).unwrap(),
            990_000_000_000
        );
    }

    #[test]
    fn test_verification_rate() {
        assert_eq!(verification_rate(0, 0), 0.0);
        assert_eq!(verification_rate(3, 4), 75.0);
        assert_eq!(verification_rate(1, 3), 33.33);
        assert_eq!(verification_rate(2, 3), 66.67);
    }
}
