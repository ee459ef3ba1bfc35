//! Pricing

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

/// Errors that can occur while calculating total price.
#[derive(Debug, Error, PartialEq)]
pub enum TotalPriceError {
    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Sums `prices`, starting from zero in `currency`.
///
/// # Errors
///
/// Returns [`TotalPriceError::Money`] if a price is in a different currency.
pub fn total_price<'a, 'p>(
    prices: impl IntoIterator<Item = &'p Money<'a, Currency>>,
    currency: &'a Currency,
) -> Result<Money<'a, Currency>, TotalPriceError>
where
    'a: 'p,
{
    let total = prices
        .into_iter()
        .try_fold(Money::from_minor(0, currency), |acc, price| acc.add(*price))?;

    Ok(total)
}

/// Convert a major-unit amount (e.g. `12.50`) into minor units of `currency`.
///
/// Returns `None` if the result does not fit in an `i64`.
pub fn minor_units(amount: Decimal, currency: &Currency) -> Option<i64> {
    (0..currency.exponent)
        .try_fold(amount, |acc, _| acc.checked_mul(Decimal::TEN))?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}
