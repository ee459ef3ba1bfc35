//! Line Items

use std::sync::Arc;

use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use thiserror::Error;

use crate::products::{SellingPlanId, Variant};

/// Errors raised while building or mutating a line item.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LineItemError {
    /// Line items must carry at least one unit.
    #[error("line item quantity must be greater than zero")]
    ZeroQuantity,

    /// A split must take at least one unit and leave at least one behind (requested, available).
    #[error("cannot split {0} unit(s) from a line item of {1}")]
    InvalidSplit(u32, u32),

    /// Line prices can only go down (current minor units, requested minor units).
    #[error("line price cannot increase from {0} to {1}")]
    PriceIncrease(i64, i64),

    /// The new price is not in the line's currency (line currency, price currency).
    #[error("line item has currency {0}, but the new price has currency {1}")]
    CurrencyMismatch(&'static str, &'static str),

    /// Unit price times quantity does not fit in minor units.
    #[error("line price overflowed")]
    Overflow,
}

/// A recorded change to a line item's price.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceAdjustment<'a> {
    /// Label shown to the customer, e.g. `"$30 off lenses"`.
    pub message: String,

    /// Line price before the change.
    pub before: Money<'a, Currency>,

    /// Line price after the change.
    pub after: Money<'a, Currency>,
}

/// A quantity of one variant in a cart.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem<'a> {
    variant: Arc<Variant<'a>>,
    quantity: u32,
    line_price: Money<'a, Currency>,
    original_line_price: Money<'a, Currency>,
    selling_plan_id: Option<SellingPlanId>,
    adjustments: SmallVec<[PriceAdjustment<'a>; 1]>,
}

impl<'a> LineItem<'a> {
    /// Create a line item priced at `quantity` times the variant's unit price.
    ///
    /// # Errors
    ///
    /// - [`LineItemError::ZeroQuantity`]: `quantity` is zero.
    /// - [`LineItemError::Overflow`]: the line price does not fit in minor units.
    pub fn new(variant: Arc<Variant<'a>>, quantity: u32) -> Result<Self, LineItemError> {
        let line_minor = variant
            .price()
            .to_minor_units()
            .checked_mul(i64::from(quantity))
            .ok_or(LineItemError::Overflow)?;

        let line_price = Money::from_minor(line_minor, variant.price().currency());

        Self::with_line_price(variant, quantity, line_price)
    }

    /// Create a line item with an explicit line price.
    ///
    /// # Errors
    ///
    /// Returns [`LineItemError::ZeroQuantity`] if `quantity` is zero.
    pub fn with_line_price(
        variant: Arc<Variant<'a>>,
        quantity: u32,
        line_price: Money<'a, Currency>,
    ) -> Result<Self, LineItemError> {
        if quantity == 0 {
            return Err(LineItemError::ZeroQuantity);
        }

        Ok(Self {
            variant,
            quantity,
            line_price,
            original_line_price: line_price,
            selling_plan_id: None,
            adjustments: SmallVec::new(),
        })
    }

    /// Attach a selling plan, marking the line as a subscription.
    #[must_use]
    pub fn with_selling_plan(mut self, selling_plan_id: SellingPlanId) -> Self {
        self.selling_plan_id = Some(selling_plan_id);
        self
    }

    /// The variant on this line.
    pub fn variant(&self) -> &Variant<'a> {
        &self.variant
    }

    /// Number of units.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Current price for the whole line.
    pub fn line_price(&self) -> &Money<'a, Currency> {
        &self.line_price
    }

    /// Line price before any adjustments.
    pub fn original_line_price(&self) -> &Money<'a, Currency> {
        &self.original_line_price
    }

    /// Selling plan, if this is a subscription line.
    pub fn selling_plan_id(&self) -> Option<SellingPlanId> {
        self.selling_plan_id
    }

    /// Price changes applied to this line, oldest first.
    pub fn adjustments(&self) -> &[PriceAdjustment<'a>] {
        &self.adjustments
    }

    /// Whether any price change has been applied.
    pub fn is_discounted(&self) -> bool {
        !self.adjustments.is_empty()
    }

    /// Split `take` units off into a new line item.
    ///
    /// The new line gets the floor of its proportional share of the line price (and original
    /// line price); this line keeps the rest, so totals are preserved exactly. The adjustment
    /// history is carried onto the new line.
    ///
    /// # Errors
    ///
    /// Returns [`LineItemError::InvalidSplit`] unless `0 < take < quantity`.
    pub fn split(&mut self, take: u32) -> Result<Self, LineItemError> {
        if take == 0 || take >= self.quantity {
            return Err(LineItemError::InvalidSplit(take, self.quantity));
        }

        let split_price = share_of(&self.line_price, take, self.quantity)?;
        let split_original = share_of(&self.original_line_price, take, self.quantity)?;

        self.line_price = Money::from_minor(
            self.line_price.to_minor_units() - split_price.to_minor_units(),
            self.line_price.currency(),
        );
        self.original_line_price = Money::from_minor(
            self.original_line_price.to_minor_units() - split_original.to_minor_units(),
            self.original_line_price.currency(),
        );
        self.quantity -= take;

        Ok(Self {
            variant: Arc::clone(&self.variant),
            quantity: take,
            line_price: split_price,
            original_line_price: split_original,
            selling_plan_id: self.selling_plan_id,
            adjustments: self.adjustments.clone(),
        })
    }

    /// Change the line price, recording `message` against the change.
    ///
    /// # Errors
    ///
    /// - [`LineItemError::CurrencyMismatch`]: `new_price` is in a different currency.
    /// - [`LineItemError::PriceIncrease`]: `new_price` is higher than the current line price.
    pub fn change_line_price(
        &mut self,
        new_price: Money<'a, Currency>,
        message: &str,
    ) -> Result<(), LineItemError> {
        let line_currency = self.line_price.currency();
        let price_currency = new_price.currency();

        if line_currency != price_currency {
            return Err(LineItemError::CurrencyMismatch(
                line_currency.iso_alpha_code,
                price_currency.iso_alpha_code,
            ));
        }

        let current = self.line_price.to_minor_units();
        let requested = new_price.to_minor_units();

        if requested > current {
            return Err(LineItemError::PriceIncrease(current, requested));
        }

        self.adjustments.push(PriceAdjustment {
            message: message.to_string(),
            before: self.line_price,
            after: new_price,
        });
        self.line_price = new_price;

        Ok(())
    }
}

/// Floor of `price * take / quantity`, computed without intermediate overflow.
fn share_of<'a>(
    price: &Money<'a, Currency>,
    take: u32,
    quantity: u32,
) -> Result<Money<'a, Currency>, LineItemError> {
    let share = i128::from(price.to_minor_units()) * i128::from(take) / i128::from(quantity);
    let share = i64::try_from(share).map_err(|_err| LineItemError::Overflow)?;

    Ok(Money::from_minor(share, price.currency()))
}
