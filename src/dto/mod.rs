use rust_decimal::Decimal;
use validator::ValidationError;

pub mod auth;
pub mod categories;
pub mod companies;
pub mod customers;
pub mod dashboard;
pub mod order_details;
pub mod order_history;
pub mod orders;
pub mod posts;
pub mod products;

/// Largest amount a `NUMERIC(12, 2)` column holds: 9 999 999 999.99.
pub const MAX_MONEY: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

/// `Some(value)` when it fits a money column.
pub fn fits_money(value: Decimal) -> Option<Decimal> {
    (value <= MAX_MONEY).then_some(value)
}

/// Money amounts: non-negative, at most two decimal places and within column range.
pub(crate) fn money(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("min");
        err.message = Some("The value must be at least 0.".into());
        return Err(err);
    }
    if value.normalize().scale() > 2 {
        let mut err = ValidationError::new("decimal");
        err.message = Some("The value may not have more than 2 decimal places.".into());
        return Err(err);
    }
    if *value > MAX_MONEY {
        let mut err = ValidationError::new("max");
        err.message = Some(format!("The value may not be greater than {MAX_MONEY}.").into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{MAX_MONEY, money};
    use rust_decimal::Decimal;

    #[test]
    fn money_accepts_cents_only() {
        assert!(money(&Decimal::ZERO).is_ok());
        assert!(money(&Decimal::new(999, 2)).is_ok());
        assert!(money(&Decimal::new(99900, 4)).is_ok());
        assert!(money(&Decimal::new(-1, 2)).is_err());
        assert_eq!(MAX_MONEY.to_string(), "9999999999.99");
        assert!(money(&MAX_MONEY).is_ok());
        assert!(money(&Decimal::new(1_000_000_000_000, 2)).is_err());
        assert!(money(&Decimal::MAX.trunc()).is_err());
        assert!(money(&Decimal::new(9999, 3)).is_err());
    }
}
