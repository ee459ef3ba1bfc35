//! Discounts
//!
//! Turns a campaign's discount settings into a change of line price.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, iso::Currency};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    items::{LineItem, LineItemError},
    pricing::minor_units,
};

/// Errors specific to discount calculations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiscountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// Flat amount could not be represented in minor units.
    #[error("discount amount {0} cannot be represented in minor units")]
    AmountConversion(Decimal),

    /// The line item rejected the new price.
    #[error(transparent)]
    LineItem(#[from] LineItemError),
}

/// How the discount amount is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// Whole-number percentage off the line price, e.g. `10` for 10%.
    Percent,

    /// Amount off each unit, in major currency units, e.g. `30` for $30.
    #[serde(alias = "dollar")]
    Flat,
}

/// Discount settings as written in a campaign definition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiscountSpec {
    /// Percent or flat.
    #[serde(rename = "type")]
    pub kind: DiscountKind,

    /// Percentage or per-unit amount.
    pub amount: Decimal,

    /// Label recorded against every discounted line.
    pub message: String,
}

impl DiscountSpec {
    /// Create a discount spec.
    pub fn new(kind: DiscountKind, amount: Decimal, message: impl Into<String>) -> Self {
        Self {
            kind,
            amount,
            message: message.into(),
        }
    }
}

/// A discount ready to apply to line items.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum DiscountRule {
    /// Take a percentage off the whole line price.
    PercentageOff(Percentage),

    /// Take a fixed amount off every unit, flooring the line at zero.
    AmountOffEach(Decimal),
}

impl From<&DiscountSpec> for DiscountRule {
    fn from(spec: &DiscountSpec) -> Self {
        match spec.kind {
            DiscountKind::Percent => {
                Self::PercentageOff(Percentage::from(spec.amount / Decimal::ONE_HUNDRED))
            }
            DiscountKind::Flat => Self::AmountOffEach(spec.amount),
        }
    }
}

/// Applies one discount rule to line items, labelling each change.
#[derive(Debug, Clone)]
pub struct DiscountApplicator {
    rule: DiscountRule,
    message: String,
}

impl DiscountApplicator {
    /// Create an applicator from a rule and its label.
    pub fn new(rule: DiscountRule, message: impl Into<String>) -> Self {
        Self {
            rule,
            message: message.into(),
        }
    }

    /// The label recorded on discounted lines.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Calculate the discounted price for `line_item` without changing it.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] if the calculation overflows.
    pub fn discounted_price<'a>(
        &self,
        line_item: &LineItem<'a>,
    ) -> Result<Money<'a, Currency>, DiscountError> {
        let line_price = line_item.line_price();
        let line_minor = line_price.to_minor_units();

        let discounted_minor = match &self.rule {
            DiscountRule::PercentageOff(percent) => retained_minor(percent, line_minor)?,
            DiscountRule::AmountOffEach(amount) => {
                let per_unit = minor_units(*amount, line_price.currency())
                    .ok_or(DiscountError::AmountConversion(*amount))?;

                let deduction = per_unit
                    .checked_mul(i64::from(line_item.quantity()))
                    .ok_or(DiscountError::AmountConversion(*amount))?;

                line_minor.saturating_sub(deduction).max(0)
            }
        };

        Ok(Money::from_minor(discounted_minor, line_price.currency()))
    }

    /// Discount `line_item` in place.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] if the calculation overflows or the line rejects the new price.
    pub fn apply(&self, line_item: &mut LineItem<'_>) -> Result<(), DiscountError> {
        let new_price = self.discounted_price(line_item)?;

        line_item.change_line_price(new_price, &self.message)?;

        Ok(())
    }
}

impl From<&DiscountSpec> for DiscountApplicator {
    fn from(spec: &DiscountSpec) -> Self {
        Self::new(DiscountRule::from(spec), spec.message.clone())
    }
}

/// The part of `minor` left after taking `percent` off, rounded midpoint away from zero.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if the result overflows.
pub fn retained_minor(percent: &Percentage, minor: i64) -> Result<i64, DiscountError> {
    let minor = Decimal::from_i64(minor).ok_or(DiscountError::PercentConversion)?;

    // decimal_percentage doesn't expose the underlying Decimal
    Decimal::ONE
        .checked_sub((*percent) * Decimal::ONE)
        .and_then(|rate| rate.checked_mul(minor))
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::PercentConversion)
}
